//! Market and ledger rendering against real store output.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use underhive::render::{self, EmbedField};
use underhive_economy::{generate_market, MarketCatalog, MarketConfig, PageRequest};
use underhive_shared::constants::{MAX_EMBED_FIELD_LENGTH, PRACTICAL_EMBED_FIELD_LENGTH};
use underhive_store::{NewGang, Store};

fn catalog() -> MarketCatalog {
    let mut csv = String::from("Name,Category,Rarity,Rarity Rating,Cost\n");
    let categories = ["Basic Weapons", "Armour", "Grenades", "Special Weapons", "Wargear"];
    for i in 0..120 {
        let category = categories[i % categories.len()];
        let rating = if i % 3 == 0 { "C".to_string() } else { format!("R{}", 7 + i % 8) };
        csv.push_str(&format!(
            "Catalog item with a descriptive name {i:03},{category},Rare,{rating},{}\n",
            10 + i
        ));
    }
    MarketCatalog::from_csv_str(&csv).unwrap()
}

fn assert_fits(fields: &[EmbedField]) {
    for field in fields {
        assert!(field.value.chars().count() <= MAX_EMBED_FIELD_LENGTH);
    }
}

#[test]
fn test_generated_market_renders_within_limits() {
    let catalog = catalog();
    let config = MarketConfig {
        trading_post_size: 30,
        ..MarketConfig::default()
    };
    let market = generate_market(&catalog, &config, &mut ChaCha8Rng::seed_from_u64(11));

    let post = render::market_section_fields(&market.trading_post, "Trading Post", "the trading post");
    assert_fits(&post);
    assert!(post.len() > 1, "30 long lines should need continuation fields");
    for field in &post {
        assert!(field.value.chars().count() <= PRACTICAL_EMBED_FIELD_LENGTH);
    }

    let rendered_items: usize = post
        .iter()
        .map(|f| f.value.lines().filter(|l| l.starts_with("- **")).count())
        .sum();
    assert_eq!(rendered_items, market.trading_post.len());

    let stash = render::market_section_fields(&market.secret_stash, "Secret Stash", "the secret stash");
    assert_fits(&stash);
    assert!(market.secret_stash.iter().all(|item| item.rarity >= 10));
}

#[test]
fn test_history_page_renders_running_balances() {
    let store = Store::open_in_memory().unwrap();
    let campaign = store.create_campaign("Dust Falls", "alice", "guild").unwrap();
    let gang = store
        .register_gang(NewGang {
            user_id: "alice".to_string(),
            campaign_id: campaign.id,
            name: "Iron Skulls".to_string(),
            gang_type: "Goliath".to_string(),
            ..NewGang::default()
        })
        .unwrap();
    store.adjust_credits(gang.id, 100, "start", "alice").unwrap();
    store.adjust_credits(gang.id, -30, "lasgun", "alice").unwrap();
    store.adjust_credits(gang.id, 5, "bounty", "alice").unwrap();

    let page = store.credit_history(gang.id, PageRequest::new(1, 2)).unwrap();
    let fields = render::history_fields(&page);
    assert_eq!(fields.len(), 2);
    assert!(fields[0].value.starts_with("**Change:** +5\n**Total After:** 75"));
    assert!(fields[1].value.starts_with("**Change:** -30\n**Total After:** 70"));
    assert!(fields[0].value.contains("<t:"));
    assert_eq!(render::history_description(&page), "**Current Credits:** 75");
    assert_eq!(render::history_footer(&page), "Page 1 of 2 (3 transactions)");
}
