//! # Market Generator
//!
//! **Weighted, duplicate-free trading post and secret stash**
//!
//! Every campaign has one market snapshot made of two lists:
//!
//! - **Trading post**: one item per category first (so every category shows
//!   up), then extra unique items drawn from the whole catalog until the
//!   target size is reached or the draw budget runs out.
//! - **Secret stash**: a few unique items drawn uniformly from the rare pool
//!   (rarity at or above the stash threshold).
//!
//! ## Weights
//!
//! ```text
//! weight(item) = 1 / (rarity + 1)
//!
//! Common (C, rarity 0)  -> 1.000
//! R7                    -> 0.125
//! I12                   -> 0.077
//! ```
//!
//! ## Bounded Sampling
//!
//! Rejection sampling for uniqueness could spin forever on a small catalog.
//! Both lists stop after a fixed number of draws and return what they have;
//! a short list is not an error.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use underhive_shared::constants::{
    MARKET_STASH_ATTEMPTS, MARKET_STASH_MIN_RARITY, MARKET_STASH_SIZE,
    MARKET_TRADING_POST_ATTEMPTS, MARKET_TRADING_POST_SIZE,
};

use crate::error::{EconomyError, EconomyResult};

// ============================================================================
// Catalog
// ============================================================================

/// One tradeable item from the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Item name, unique within a generated list.
    pub name: String,
    /// Catalog category (Basic Weapons, Armour, ...).
    pub category: String,
    /// Availability label as written in the catalog (Common, Rare, Illegal).
    pub availability: String,
    /// Raw rarity code (`C`, `R9`, `I12`).
    pub rarity_rating: String,
    /// Parsed rarity; 0 for common items.
    pub rarity: u32,
    /// Cost as written in the catalog (may be a formula like `50+2D6x10`).
    pub cost: String,
}

impl CatalogItem {
    /// Sampling weight, inversely proportional to rarity.
    #[inline]
    #[must_use]
    pub fn weight(&self) -> f64 {
        1.0 / (f64::from(self.rarity) + 1.0)
    }
}

/// Parses a rarity code: `C` is 0, `R<n>` / `I<n>` is `n`.
///
/// Anything else is `None` and the item is excluded from sampling.
#[must_use]
pub fn parse_rarity_rating(value: &str) -> Option<u32> {
    let value = value.trim().to_ascii_uppercase();
    if value == "C" {
        return Some(0);
    }
    let rest = value.strip_prefix('R').or_else(|| value.strip_prefix('I'))?;
    rest.trim().parse().ok()
}

/// Row layout of the catalog CSV.
#[derive(Debug, Deserialize)]
struct CatalogRecord {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Category")]
    category: Option<String>,
    #[serde(rename = "Rarity")]
    availability: Option<String>,
    #[serde(rename = "Rarity Rating")]
    rarity_rating: Option<String>,
    #[serde(rename = "Cost")]
    cost: Option<String>,
}

impl CatalogRecord {
    fn into_item(self) -> Option<CatalogItem> {
        fn present(field: Option<String>) -> Option<String> {
            field.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }

        let rarity_rating = present(self.rarity_rating)?;
        let rarity = parse_rarity_rating(&rarity_rating)?;
        Some(CatalogItem {
            name: present(self.name)?,
            category: present(self.category)?,
            availability: present(self.availability)?,
            rarity_rating,
            rarity,
            cost: present(self.cost)?,
        })
    }
}

/// The sampling pool, loaded once at startup and passed to the generator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarketCatalog {
    items: Vec<CatalogItem>,
    excluded: usize,
}

impl MarketCatalog {
    /// Builds a catalog from already-parsed items.
    #[must_use]
    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        Self { items, excluded: 0 }
    }

    /// Loads the catalog CSV from disk.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidCatalog`] if the file cannot be read
    /// or is not valid CSV.
    pub fn from_csv_path(path: impl AsRef<Path>) -> EconomyResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            EconomyError::InvalidCatalog(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_csv_str(&text)
    }

    /// Parses catalog CSV text (a leading byte-order mark is ignored).
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidCatalog`] on malformed CSV.
    pub fn from_csv_str(text: &str) -> EconomyResult<Self> {
        Self::from_csv_reader(text.trim_start_matches('\u{feff}').as_bytes())
    }

    /// Parses catalog CSV from any reader.
    ///
    /// Rows missing a required column, or whose rarity code does not parse,
    /// are counted in [`excluded`](Self::excluded) and left out.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidCatalog`] on malformed CSV.
    pub fn from_csv_reader(reader: impl Read) -> EconomyResult<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut items = Vec::new();
        let mut excluded = 0;
        for record in csv.deserialize::<CatalogRecord>() {
            let record = record.map_err(|e| EconomyError::InvalidCatalog(e.to_string()))?;
            match record.into_item() {
                Some(item) => items.push(item),
                None => excluded += 1,
            }
        }

        tracing::debug!(
            items = items.len(),
            excluded,
            "Loaded market catalog"
        );
        Ok(Self { items, excluded })
    }

    /// All sampleable items, in file order.
    #[must_use]
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Number of sampleable items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing can be sampled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rows dropped while loading.
    #[must_use]
    pub const fn excluded(&self) -> usize {
        self.excluded
    }

    /// Distinct categories in order of first appearance.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .map(|item| item.category.as_str())
            .filter(|category| seen.insert(*category))
            .collect()
    }
}

// ============================================================================
// Generation
// ============================================================================

/// Tuning knobs for market generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Target number of unique trading post items.
    pub trading_post_size: usize,
    /// Draw budget for the trading post fill phase.
    pub trading_post_attempts: u32,
    /// Target number of unique stash items.
    pub stash_size: usize,
    /// Draw budget for the stash.
    pub stash_attempts: u32,
    /// Minimum rarity for stash eligibility.
    pub stash_min_rarity: u32,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            trading_post_size: MARKET_TRADING_POST_SIZE,
            trading_post_attempts: MARKET_TRADING_POST_ATTEMPTS,
            stash_size: MARKET_STASH_SIZE,
            stash_attempts: MARKET_STASH_ATTEMPTS,
            stash_min_rarity: MARKET_STASH_MIN_RARITY,
        }
    }
}

/// A freshly generated market.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketData {
    /// Common pool, at least one per category when the size allows.
    pub trading_post: Vec<CatalogItem>,
    /// Rare pool.
    pub secret_stash: Vec<CatalogItem>,
}

/// Generates a trading post and secret stash from `catalog`.
#[must_use]
pub fn generate_market<R: Rng>(
    catalog: &MarketCatalog,
    config: &MarketConfig,
    rng: &mut R,
) -> MarketData {
    let trading_post = generate_trading_post(catalog, config, rng);
    let secret_stash = generate_secret_stash(catalog, config, rng);

    tracing::debug!(
        trading_post = trading_post.len(),
        secret_stash = secret_stash.len(),
        "Generated market"
    );

    MarketData {
        trading_post,
        secret_stash,
    }
}

fn generate_trading_post<R: Rng>(
    catalog: &MarketCatalog,
    config: &MarketConfig,
    rng: &mut R,
) -> Vec<CatalogItem> {
    let target = config.trading_post_size;
    let mut picked: Vec<CatalogItem> = Vec::with_capacity(target);
    let mut names: HashSet<String> = HashSet::new();

    // One per category
    for category in catalog.categories() {
        if picked.len() >= target {
            break;
        }
        let members: Vec<&CatalogItem> = catalog
            .items()
            .iter()
            .filter(|item| item.category == category)
            .collect();
        if let Some(item) = weighted_pick(&members, rng) {
            if names.insert(item.name.clone()) {
                picked.push(item.clone());
            }
        }
    }

    // Fill to target
    let all: Vec<&CatalogItem> = catalog.items().iter().collect();
    if let Some(dist) = weighted_index(&all) {
        let mut attempts = 0;
        while picked.len() < target && attempts < config.trading_post_attempts {
            attempts += 1;
            let item = all[dist.sample(rng)];
            if names.insert(item.name.clone()) {
                picked.push(item.clone());
            }
        }
        if picked.len() < target {
            tracing::warn!(
                generated = picked.len(),
                target,
                attempts,
                "Trading post fell short of its target size"
            );
        }
    }

    picked
}

fn generate_secret_stash<R: Rng>(
    catalog: &MarketCatalog,
    config: &MarketConfig,
    rng: &mut R,
) -> Vec<CatalogItem> {
    let pool: Vec<&CatalogItem> = catalog
        .items()
        .iter()
        .filter(|item| item.rarity >= config.stash_min_rarity)
        .collect();
    if pool.is_empty() {
        return Vec::new();
    }

    let mut picked: Vec<CatalogItem> = Vec::with_capacity(config.stash_size);
    let mut names: HashSet<&str> = HashSet::new();
    let mut attempts = 0;
    while picked.len() < config.stash_size && attempts < config.stash_attempts {
        attempts += 1;
        let item = pool[rng.gen_range(0..pool.len())];
        if names.insert(item.name.as_str()) {
            picked.push(item.clone());
        }
    }
    picked
}

fn weighted_index(items: &[&CatalogItem]) -> Option<WeightedIndex<f64>> {
    WeightedIndex::new(items.iter().map(|item| item.weight())).ok()
}

fn weighted_pick<'a, R: Rng>(items: &[&'a CatalogItem], rng: &mut R) -> Option<&'a CatalogItem> {
    weighted_index(items).map(|dist| items[dist.sample(rng)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn item(name: &str, category: &str, rating: &str) -> CatalogItem {
        CatalogItem {
            name: name.to_string(),
            category: category.to_string(),
            availability: "Rare".to_string(),
            rarity_rating: rating.to_string(),
            rarity: parse_rarity_rating(rating).unwrap(),
            cost: "10".to_string(),
        }
    }

    fn big_catalog() -> MarketCatalog {
        let mut items = Vec::new();
        for category in ["Pistols", "Basic Weapons", "Armour", "Grenades"] {
            for i in 0..12u32 {
                let rating = if i < 4 { "C".to_string() } else { format!("R{}", i + 4) };
                items.push(item(&format!("{category} #{i}"), category, &rating));
            }
        }
        MarketCatalog::from_items(items)
    }

    #[test]
    fn test_parse_rarity_rating() {
        assert_eq!(parse_rarity_rating("C"), Some(0));
        assert_eq!(parse_rarity_rating(" c "), Some(0));
        assert_eq!(parse_rarity_rating("R9"), Some(9));
        assert_eq!(parse_rarity_rating("i12"), Some(12));
        assert_eq!(parse_rarity_rating("R"), None);
        assert_eq!(parse_rarity_rating("E"), None);
        assert_eq!(parse_rarity_rating(""), None);
    }

    #[test]
    fn test_weights_fall_with_rarity() {
        assert!((item("a", "x", "C").weight() - 1.0).abs() < f64::EPSILON);
        assert!(item("a", "x", "R7").weight() < item("a", "x", "R2").weight());
    }

    #[test]
    fn test_csv_loading_drops_incomplete_rows() {
        let csv = "\u{feff}Name,Category,Rarity,Rarity Rating,Cost\n\
                   Lasgun,Basic Weapons,Common,C,15\n\
                   Plasma Gun,Special Weapons,Rare,R11,100\n\
                   Mystery,Special Weapons,Rare,E5,100\n\
                   ,Armour,Common,C,10\n\
                   Chem-synth,Equipment,Illegal,I10,\n";
        let catalog = MarketCatalog::from_csv_str(csv).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.excluded(), 3);
        assert_eq!(catalog.items()[1].rarity, 11);
        assert_eq!(catalog.categories(), vec!["Basic Weapons", "Special Weapons"]);
    }

    #[test]
    fn test_trading_post_covers_every_category() {
        let catalog = big_catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let market = generate_market(&catalog, &MarketConfig::default(), &mut rng);

        assert_eq!(market.trading_post.len(), 20);
        for category in catalog.categories() {
            assert!(market.trading_post.iter().any(|i| i.category == category));
        }
    }

    #[test]
    fn test_lists_have_no_duplicates() {
        let catalog = big_catalog();
        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let market = generate_market(&catalog, &MarketConfig::default(), &mut rng);

            let post: HashSet<_> = market.trading_post.iter().map(|i| &i.name).collect();
            assert_eq!(post.len(), market.trading_post.len());
            let stash: HashSet<_> = market.secret_stash.iter().map(|i| &i.name).collect();
            assert_eq!(stash.len(), market.secret_stash.len());
        }
    }

    #[test]
    fn test_stash_only_holds_rare_items() {
        let catalog = big_catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let market = generate_market(&catalog, &MarketConfig::default(), &mut rng);

        assert_eq!(market.secret_stash.len(), 5);
        assert!(market.secret_stash.iter().all(|i| i.rarity >= 10));
    }

    #[test]
    fn test_small_catalog_gives_short_lists() {
        let catalog = MarketCatalog::from_items(vec![
            item("Stub Gun", "Pistols", "C"),
            item("Autogun", "Basic Weapons", "C"),
            item("Needle Rifle", "Special Weapons", "R12"),
        ]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let market = generate_market(&catalog, &MarketConfig::default(), &mut rng);

        assert_eq!(market.trading_post.len(), 3);
        assert_eq!(market.secret_stash.len(), 1);
    }

    #[test]
    fn test_empty_catalog() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let market = generate_market(&MarketCatalog::default(), &MarketConfig::default(), &mut rng);
        assert_eq!(market, MarketData::default());
    }

    #[test]
    fn test_category_pass_respects_target() {
        let items = (0..30)
            .map(|i| item(&format!("Item {i}"), &format!("Category {i}"), "C"))
            .collect();
        let catalog = MarketCatalog::from_items(items);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let market = generate_market(&catalog, &MarketConfig::default(), &mut rng);
        assert_eq!(market.trading_post.len(), 20);
    }
}
