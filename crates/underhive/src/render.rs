//! # Message Rendering
//!
//! Pure text builders for replies and embed fields. Nothing in here talks to
//! Discord; commands turn [`EmbedField`]s into serenity embeds.
//!
//! ## Market Sections
//!
//! ```text
//! 🛒 Trading Post            <- first field
//! **--- Armour ---**
//! - **Flak Armour** (Rarity C) - Cost: 10
//! ...
//! 🛒 Trading Post (Cont. 1)  <- next field once ~1000 chars are used
//! ```
//!
//! Categories are sorted and never split across fields unless a single
//! category alone is too long, in which case the field is cut at a line
//! boundary below Discord's 1024 character limit.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use underhive_economy::{CatalogItem, HistoryPage, RollOutcome};
use underhive_shared::constants::{
    MAX_EMBED_FIELDS, MAX_EMBED_FIELD_LENGTH, MAX_EMBED_TOTAL_LENGTH, MAX_MESSAGE_LENGTH,
    PRACTICAL_EMBED_FIELD_LENGTH,
};
use underhive_shared::types::GangId;
use underhive_store::{parse_timestamp, Asset, CampaignAsset, LedgerTransaction, TradeOffer};

/// A named embed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    /// Field title.
    pub name: String,
    /// Field body.
    pub value: String,
}

impl EmbedField {
    fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Characters this field counts against the embed total.
    #[must_use]
    pub fn char_count(&self) -> usize {
        char_len(&self.name) + char_len(&self.value)
    }
}

const TRUNCATION_MARKER: &str = "\n... (section truncated)";

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// `+50` / `-20` / `+0`.
#[must_use]
pub fn signed(change: i64) -> String {
    if change >= 0 {
        format!("+{change}")
    } else {
        change.to_string()
    }
}

/// Discord timestamp markup for a stored `timestamp`, or the raw text.
#[must_use]
pub fn discord_time(timestamp: &str) -> String {
    parse_timestamp(timestamp).map_or_else(
        || timestamp.to_string(),
        |dt| format!("<t:{}:f>", dt.timestamp()),
    )
}

// ============================================================================
// Ledger
// ============================================================================

/// One field per transaction of a history page.
#[must_use]
pub fn history_fields(page: &HistoryPage<LedgerTransaction>) -> Vec<EmbedField> {
    page.entries
        .iter()
        .map(|entry| {
            let tx = &entry.row;
            let value = format!(
                "**Change:** {}\n**Total After:** {}\n**Reason:** {}\n**When:** {}",
                signed(tx.change),
                entry.balance_after,
                tx.reason.as_deref().unwrap_or("-"),
                discord_time(&tx.timestamp),
            );
            EmbedField::new(format!("Transaction #{}", tx.id), value)
        })
        .collect()
}

/// Description line above the transactions.
#[must_use]
pub fn history_description(page: &HistoryPage<LedgerTransaction>) -> String {
    if page.is_empty() {
        format!(
            "**Current Credits:** {}\n\nNo transactions recorded.",
            page.current_balance
        )
    } else {
        format!("**Current Credits:** {}", page.current_balance)
    }
}

/// `Page 2 of 5 (43 transactions)`.
#[must_use]
pub fn history_footer(page: &HistoryPage<LedgerTransaction>) -> String {
    format!(
        "Page {} of {} ({} transactions)",
        page.window.page, page.window.total_pages, page.total_count
    )
}

// ============================================================================
// Market
// ============================================================================

/// `- **Lasgun** (Rarity C) - Cost: 15`
#[must_use]
pub fn item_line(item: &CatalogItem) -> String {
    format!(
        "- **{}** (Rarity {}) - Cost: {}",
        item.name, item.rarity_rating, item.cost
    )
}

/// Splits one market list into embed fields grouped by sorted category.
///
/// `base_name` titles the first field; later ones get ` (Cont. N)`.
#[must_use]
pub fn market_section_fields(
    items: &[CatalogItem],
    base_name: &str,
    empty_label: &str,
) -> Vec<EmbedField> {
    if items.is_empty() {
        return vec![EmbedField::new(
            base_name,
            format!("No items currently in {empty_label}."),
        )];
    }

    let mut by_category: BTreeMap<&str, Vec<&CatalogItem>> = BTreeMap::new();
    for item in items {
        by_category.entry(item.category.as_str()).or_default().push(item);
    }

    let mut fields = Vec::new();
    let mut current = String::new();
    for (category, members) in by_category {
        let mut block = format!("**--- {category} ---**");
        for item in members {
            block.push('\n');
            block.push_str(&item_line(item));
        }

        let separator = usize::from(!current.is_empty());
        if !current.is_empty()
            && char_len(&current) + separator + char_len(&block) > PRACTICAL_EMBED_FIELD_LENGTH
        {
            fields.push(section_field(base_name, fields.len(), &current));
            current.clear();
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(&block);
    }
    if !current.is_empty() {
        fields.push(section_field(base_name, fields.len(), &current));
    }
    fields
}

fn section_field(base_name: &str, index: usize, body: &str) -> EmbedField {
    let name = if index == 0 {
        base_name.to_string()
    } else {
        format!("{base_name} (Cont. {index})")
    };
    EmbedField::new(name, truncate_field(body))
}

/// Cuts `value` to fit an embed field, at a line boundary when possible.
#[must_use]
pub fn truncate_field(value: &str) -> String {
    if char_len(value) <= MAX_EMBED_FIELD_LENGTH {
        return value.to_string();
    }
    let budget = MAX_EMBED_FIELD_LENGTH - char_len(TRUNCATION_MARKER);
    let head: String = value.chars().take(budget).collect();
    let cut = head.rfind('\n').unwrap_or(head.len());
    format!("{}{TRUNCATION_MARKER}", &head[..cut])
}

// ============================================================================
// Assets, Trades, Dice
// ============================================================================

/// One line describing an asset.
#[must_use]
pub fn asset_line(asset: &Asset) -> String {
    let mut line = format!("`#{}` **{}** ({})", asset.id, asset.name, asset.asset_type);
    if let Some(value) = asset.static_value {
        let _ = write!(line, ", value: {value}");
    }
    if let Some(formula) = &asset.roll_formula {
        let _ = write!(line, ", roll: `{formula}`");
    }
    if asset.should_sell {
        line.push_str(", for sale");
    }
    if asset.is_consumed {
        line.push_str(", consumed");
    }
    if let Some(note) = asset.note.as_deref().filter(|n| !n.is_empty()) {
        let _ = write!(line, ", note: {note}");
    }
    line
}

/// Asset line prefixed with its gang.
#[must_use]
pub fn campaign_asset_line(entry: &CampaignAsset) -> String {
    format!("{}: {}", entry.gang_name, asset_line(&entry.asset))
}

fn gang_label(names: &HashMap<GangId, String>, id: GangId) -> String {
    names
        .get(&id)
        .map_or_else(|| format!("Gang {id}"), |name| format!("{name} ({id})"))
}

fn bracketed(list: &str) -> String {
    if list.is_empty() {
        "nothing".to_string()
    } else {
        format!("[{list}]")
    }
}

/// One line describing a trade offer.
#[must_use]
pub fn offer_line(offer: &TradeOffer, names: &HashMap<GangId, String>) -> String {
    format!(
        "ID {}: {} offers {} + {} credits to {} for {} + {} credits ({})",
        offer.id,
        gang_label(names, offer.from_gang_id),
        bracketed(&offer.offered_assets),
        offer.offered_credits,
        gang_label(names, offer.to_gang_id),
        bracketed(&offer.requested_assets),
        offer.requested_credits,
        offer.status,
    )
}

/// Reply text for a dice roll.
#[must_use]
pub fn roll_message(outcome: &RollOutcome) -> String {
    let mut text = format!("🎲 `{}`\n", outcome.formula);
    for term in &outcome.terms {
        let rolls: Vec<String> = term.rolls.iter().map(u32::to_string).collect();
        let _ = writeln!(text, "{}: [{}] = {}", term.notation, rolls.join(", "), term.subtotal);
    }
    let _ = write!(text, "{} = **{}**", outcome.expression, outcome.total);
    text
}

/// Joins lines under a header into messages that fit Discord's limit.
///
/// A single line longer than the limit is cut.
#[must_use]
pub fn paginate_lines(header: &str, lines: &[String]) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = header.to_string();
    for line in lines {
        let line: String = line.chars().take(MAX_MESSAGE_LENGTH - 1).collect();
        if char_len(&current) + 1 + char_len(&line) > MAX_MESSAGE_LENGTH {
            messages.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(&line);
    }
    if !current.is_empty() {
        messages.push(current);
    }
    messages
}

/// Groups fields into embeds Discord will accept.
///
/// Each group holds at most [`MAX_EMBED_FIELDS`] fields and at most
/// `MAX_EMBED_TOTAL_LENGTH - reserved` characters, where `reserved` covers
/// the title, description and footer sent with it. Always returns at least
/// one (possibly empty) group.
#[must_use]
pub fn chunk_embed_fields(fields: Vec<EmbedField>, reserved: usize) -> Vec<Vec<EmbedField>> {
    let budget = MAX_EMBED_TOTAL_LENGTH.saturating_sub(reserved);
    let mut chunks = Vec::new();
    let mut current: Vec<EmbedField> = Vec::new();
    let mut used = 0;
    for field in fields {
        let len = field.char_count();
        if !current.is_empty() && (current.len() == MAX_EMBED_FIELDS || used + len > budget) {
            chunks.push(std::mem::take(&mut current));
            used = 0;
        }
        used += len;
        current.push(field);
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use underhive_economy::PageRequest;
    use underhive_shared::types::{AssetType, OfferStatus};

    fn item(name: &str, category: &str) -> CatalogItem {
        CatalogItem {
            name: name.to_string(),
            category: category.to_string(),
            availability: "Common".to_string(),
            rarity_rating: "C".to_string(),
            rarity: 0,
            cost: "10".to_string(),
        }
    }

    #[test]
    fn test_signed() {
        assert_eq!(signed(5), "+5");
        assert_eq!(signed(0), "+0");
        assert_eq!(signed(-7), "-7");
    }

    #[test]
    fn test_empty_section() {
        let fields = market_section_fields(&[], "🛒 Trading Post", "the Trading Post");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].value, "No items currently in the Trading Post.");
    }

    #[test]
    fn test_section_groups_sorted_categories() {
        let items = vec![item("Lasgun", "Basic"), item("Flak", "Armour"), item("Autogun", "Basic")];
        let fields = market_section_fields(&items, "Post", "the post");
        assert_eq!(fields.len(), 1);
        assert_eq!(
            fields[0].value,
            "**--- Armour ---**\n- **Flak** (Rarity C) - Cost: 10\n\
             **--- Basic ---**\n- **Lasgun** (Rarity C) - Cost: 10\n- **Autogun** (Rarity C) - Cost: 10"
        );
    }

    #[test]
    fn test_section_splits_into_continuations() {
        let items: Vec<CatalogItem> = (0..60)
            .map(|i| item(&format!("Item with a fairly long name {i:02}"), &format!("Category {:02}", i / 5)))
            .collect();
        let fields = market_section_fields(&items, "Post", "the post");

        assert!(fields.len() > 1);
        assert_eq!(fields[0].name, "Post");
        assert_eq!(fields[1].name, "Post (Cont. 1)");
        for field in &fields {
            assert!(field.value.chars().count() <= PRACTICAL_EMBED_FIELD_LENGTH);
        }
        let total_lines: usize = fields.iter().map(|f| f.value.lines().count()).sum();
        assert_eq!(total_lines, 60 + 12);
    }

    #[test]
    fn test_oversized_category_is_truncated() {
        let items: Vec<CatalogItem> = (0..80)
            .map(|i| item(&format!("Very long item name number {i:02}"), "Everything"))
            .collect();
        let fields = market_section_fields(&items, "Post", "the post");
        assert_eq!(fields.len(), 1);
        assert!(fields[0].value.chars().count() <= MAX_EMBED_FIELD_LENGTH);
        assert!(fields[0].value.ends_with("... (section truncated)"));
    }

    #[test]
    fn test_history_rendering() {
        let page = HistoryPage::<LedgerTransaction>::empty(PageRequest::default());
        assert!(history_fields(&page).is_empty());
        assert!(history_description(&page).contains("No transactions recorded."));
        assert_eq!(history_footer(&page), "Page 1 of 1 (0 transactions)");
    }

    #[test]
    fn test_discord_time() {
        assert_eq!(discord_time("1970-01-01 00:01:40"), "<t:100:f>");
        assert_eq!(discord_time("yesterday"), "yesterday");
    }

    #[test]
    fn test_asset_and_offer_lines() {
        let asset = Asset {
            id: 4,
            gang_id: 1,
            name: "Old Ruins".to_string(),
            asset_type: AssetType::Territory,
            static_value: None,
            roll_formula: Some("D3x10".to_string()),
            is_consumed: false,
            should_sell: true,
            note: None,
            timestamp: String::new(),
        };
        assert_eq!(
            asset_line(&asset),
            "`#4` **Old Ruins** (Territory), roll: `D3x10`, for sale"
        );

        let offer = TradeOffer {
            id: 9,
            campaign_id: 1,
            from_gang_id: 1,
            to_gang_id: 2,
            offered_assets: "Old Ruins".to_string(),
            offered_credits: 30,
            requested_assets: String::new(),
            requested_credits: 0,
            status: OfferStatus::Pending,
        };
        let names = HashMap::from([(1, "Iron Skulls".to_string())]);
        assert_eq!(
            offer_line(&offer, &names),
            "ID 9: Iron Skulls (1) offers [Old Ruins] + 30 credits to Gang 2 for nothing + 0 credits (pending)"
        );
    }

    #[test]
    fn test_paginate_lines() {
        let lines: Vec<String> = (0..300).map(|i| format!("line number {i}")).collect();
        let messages = paginate_lines("**Header**", &lines);
        assert!(messages.len() > 1);
        assert!(messages[0].starts_with("**Header**"));
        for message in &messages {
            assert!(message.chars().count() <= MAX_MESSAGE_LENGTH);
        }
        assert!(paginate_lines("", &[]).is_empty());
    }

    #[test]
    fn test_chunk_embed_fields_respects_total_length() {
        let fields: Vec<EmbedField> = (0..12)
            .map(|i| EmbedField::new(format!("Field {i}"), "x".repeat(990)))
            .collect();
        let total: usize = fields.iter().map(EmbedField::char_count).sum();
        let chunks = chunk_embed_fields(fields, 100);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            let used: usize = chunk.iter().map(EmbedField::char_count).sum();
            assert!(used + 100 <= MAX_EMBED_TOTAL_LENGTH, "chunk uses {used}");
            assert!(chunk.len() <= MAX_EMBED_FIELDS);
        }
        let rechunked: usize = chunks.iter().flatten().map(EmbedField::char_count).sum();
        assert_eq!(rechunked, total);
        assert_eq!(chunks[1][0].name, format!("Field {}", chunks[0].len()));
    }

    #[test]
    fn test_chunk_embed_fields_respects_field_count() {
        let fields: Vec<EmbedField> = (0..30).map(|i| EmbedField::new(format!("{i}"), "v")).collect();
        let chunks = chunk_embed_fields(fields, 0);
        assert_eq!(chunks.iter().map(Vec::len).collect::<Vec<_>>(), vec![25, 5]);
        assert_eq!(chunk_embed_fields(Vec::new(), 0), vec![Vec::new()]);
    }
}
