//! Integration tests for trade offers, gang deletion and market snapshots.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use underhive_economy::{
    generate_market, parse_rarity_rating, CatalogItem, MarketCatalog, MarketConfig, PageRequest,
};
use underhive_shared::types::{AssetType, OfferStatus};
use underhive_store::{NewAsset, NewGang, NewTradeOffer, Store, StoreError};

struct Fixture {
    store: Store,
    campaign: i64,
    skulls: i64,
    rats: i64,
}

fn fixture() -> Fixture {
    let store = Store::open_in_memory().unwrap();
    let campaign = store.create_campaign("Dust Falls", "alice", "guild").unwrap().id;
    let register = |user: &str, name: &str| {
        store
            .register_gang(NewGang {
                user_id: user.to_string(),
                campaign_id: campaign,
                name: name.to_string(),
                gang_type: "Outlaw".to_string(),
                ..NewGang::default()
            })
            .unwrap()
            .id
    };
    let skulls = register("alice", "Iron Skulls");
    let rats = register("bob", "Sump Rats");
    Fixture {
        store,
        campaign,
        skulls,
        rats,
    }
}

fn offer(f: &Fixture, offered: &str, offered_credits: i64, requested: &str, requested_credits: i64) -> i64 {
    f.store
        .create_offer(NewTradeOffer {
            campaign_id: f.campaign,
            from_gang_id: f.skulls,
            to_gang_id: f.rats,
            offered_assets: offered.to_string(),
            offered_credits,
            requested_assets: requested.to_string(),
            requested_credits,
        })
        .unwrap()
        .id
}

#[test]
fn test_accept_moves_assets_and_credits() {
    let f = fixture();
    f.store.adjust_credits(f.skulls, 100, "seed", "alice").unwrap();
    f.store.adjust_credits(f.rats, 20, "seed", "bob").unwrap();
    f.store
        .add_asset(f.skulls, NewAsset::new("Old Ruins", AssetType::Territory))
        .unwrap();
    f.store
        .add_asset(f.rats, NewAsset::new("Ratskin Scout", AssetType::HangerOn))
        .unwrap();

    let id = offer(&f, "Old Ruins", 30, " Ratskin Scout ", 10);
    let outcome = f.store.accept_offer(id, "bob").unwrap();

    assert_eq!(outcome.offer.status, OfferStatus::Accepted);
    assert_eq!(outcome.assets_transferred, 2);
    assert_eq!(outcome.credit_movements.len(), 2);

    assert_eq!(f.store.balance(f.skulls).unwrap(), 80);
    assert_eq!(f.store.balance(f.rats).unwrap(), 40);

    let skull_assets: Vec<String> = f
        .store
        .list_assets(f.skulls)
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(skull_assets, vec!["Ratskin Scout".to_string()]);

    let stored = f.store.offer(id).unwrap().unwrap();
    assert_eq!(stored.status, OfferStatus::Accepted);
}

#[test]
fn test_accept_twice_is_already_resolved() {
    let f = fixture();
    let id = offer(&f, "", 0, "", 0);
    f.store.accept_offer(id, "bob").unwrap();

    let err = f.store.accept_offer(id, "bob").unwrap_err();
    assert!(matches!(err, StoreError::AlreadyResolved(_)));
    assert_eq!(err.to_string(), "Trade offer has already been resolved.");
}

#[test]
fn test_only_destination_owner_accepts() {
    let f = fixture();
    let id = offer(&f, "", 0, "", 0);
    assert!(matches!(
        f.store.accept_offer(id, "alice"),
        Err(StoreError::Unauthorized(_))
    ));
    assert!(matches!(
        f.store.accept_offer(12345, "bob"),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn test_unpaid_trade_rolls_back() {
    let f = fixture();
    f.store
        .add_asset(f.skulls, NewAsset::new("Old Ruins", AssetType::Territory))
        .unwrap();
    f.store.adjust_credits(f.rats, 5, "seed", "bob").unwrap();

    // Rats cannot pay the 10 requested
    let id = offer(&f, "Old Ruins", 0, "", 10);
    assert!(matches!(
        f.store.accept_offer(id, "bob"),
        Err(StoreError::InsufficientCredits { balance: 5, requested: 10, .. })
    ));

    assert_eq!(f.store.list_assets(f.skulls).unwrap().len(), 1);
    assert!(f.store.list_assets(f.rats).unwrap().is_empty());
    assert_eq!(f.store.balance(f.rats).unwrap(), 5);
    assert_eq!(f.store.offer(id).unwrap().unwrap().status, OfferStatus::Pending);
}

#[test]
fn test_missing_assets_transfer_nothing() {
    let f = fixture();
    let id = offer(&f, "Ghost Asset", 0, "", 0);
    let outcome = f.store.accept_offer(id, "bob").unwrap();
    assert_eq!(outcome.assets_transferred, 0);
}

#[test]
fn test_asset_type_label_matches() {
    let f = fixture();
    f.store
        .add_asset(f.skulls, NewAsset::new("Old Ruins", AssetType::Territory))
        .unwrap();
    f.store
        .add_asset(f.skulls, NewAsset::new("Slag Furnace", AssetType::Territory))
        .unwrap();

    let id = offer(&f, "Territory", 0, "", 0);
    assert_eq!(f.store.accept_offer(id, "bob").unwrap().assets_transferred, 2);
}

#[test]
fn test_swap_of_same_asset_type_does_not_bounce_back() {
    let f = fixture();
    f.store
        .add_asset(f.skulls, NewAsset::new("Old Ruins", AssetType::Territory))
        .unwrap();
    f.store
        .add_asset(f.rats, NewAsset::new("Sump Pit", AssetType::Territory))
        .unwrap();

    let id = offer(&f, "Territory", 0, "Territory", 0);
    let outcome = f.store.accept_offer(id, "bob").unwrap();
    assert_eq!(outcome.assets_transferred, 2);

    let names = |gang: i64| -> Vec<String> {
        f.store
            .list_assets(gang)
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect()
    };
    assert_eq!(names(f.skulls), vec!["Sump Pit".to_string()]);
    assert_eq!(names(f.rats), vec!["Old Ruins".to_string()]);
}

#[test]
fn test_asset_named_on_both_sides_counts_once() {
    let f = fixture();
    f.store
        .add_asset(f.skulls, NewAsset::new("Old Ruins", AssetType::Territory))
        .unwrap();

    // matched by name and by type label
    let id = offer(&f, "Old Ruins, Territory", 0, "", 0);
    assert_eq!(f.store.accept_offer(id, "bob").unwrap().assets_transferred, 1);
    assert_eq!(f.store.list_assets(f.rats).unwrap().len(), 1);
}

#[test]
fn test_invalid_offers() {
    let f = fixture();
    let other = f.store.create_campaign("Hive Secundus", "carol", "guild").unwrap();
    let outsider = f
        .store
        .register_gang(NewGang {
            user_id: "carol".to_string(),
            campaign_id: other.id,
            name: "Ash Wastes Nomads".to_string(),
            gang_type: "Nomad".to_string(),
            ..NewGang::default()
        })
        .unwrap();

    let base = NewTradeOffer {
        campaign_id: f.campaign,
        from_gang_id: f.skulls,
        to_gang_id: f.rats,
        ..NewTradeOffer::default()
    };
    for bad in [
        NewTradeOffer { offered_credits: -1, ..base.clone() },
        NewTradeOffer { to_gang_id: f.skulls, ..base.clone() },
        NewTradeOffer { to_gang_id: outsider.id, ..base.clone() },
    ] {
        assert!(matches!(f.store.create_offer(bad), Err(StoreError::Invalid(_))));
    }

    let listed = f.store.list_offers(f.campaign).unwrap();
    assert!(listed.is_empty());
}

#[test]
fn test_delete_gang_cleans_up_but_keeps_ledger() {
    let f = fixture();
    f.store.adjust_credits(f.rats, 20, "seed", "bob").unwrap();
    f.store
        .add_asset(f.rats, NewAsset::new("Ratskin Scout", AssetType::HangerOn))
        .unwrap();
    f.store.set_current_gang("bob", f.rats).unwrap();
    offer(&f, "", 0, "", 0);

    assert!(matches!(
        f.store.delete_gang(f.rats, "alice"),
        Err(StoreError::Unauthorized(_))
    ));
    f.store.delete_gang(f.rats, "bob").unwrap();

    assert!(f.store.gang(f.rats).unwrap().is_none());
    assert!(f.store.list_assets(f.rats).unwrap().is_empty());
    assert!(f.store.list_offers(f.campaign).unwrap().is_empty());
    assert_eq!(f.store.preferences("bob").unwrap().current_gang_id, None);
    assert_eq!(
        f.store
            .credit_history(f.rats, PageRequest::default())
            .unwrap()
            .total_count,
        1
    );
}

#[test]
fn test_market_snapshot_upsert() {
    let f = fixture();
    assert!(f.store.load_market(f.campaign).unwrap().is_none());

    let items = (0..30)
        .map(|i| {
            let rating = if i % 2 == 0 { "C".to_string() } else { format!("R{}", 8 + i % 5) };
            CatalogItem {
                name: format!("Item {i}"),
                category: format!("Category {}", i % 4),
                availability: "Rare".to_string(),
                rarity: parse_rarity_rating(&rating).unwrap(),
                rarity_rating: rating,
                cost: "15".to_string(),
            }
        })
        .collect();
    let catalog = MarketCatalog::from_items(items);
    let mut rng = ChaCha8Rng::seed_from_u64(4);

    let first = generate_market(&catalog, &MarketConfig::default(), &mut rng);
    f.store.save_market(f.campaign, first).unwrap();
    let second = generate_market(&catalog, &MarketConfig::default(), &mut rng);
    let saved = f.store.save_market(f.campaign, second.clone()).unwrap();

    let loaded = f.store.load_market(f.campaign).unwrap().unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(loaded.trading_post, second.trading_post);
    assert_eq!(loaded.secret_stash, second.secret_stash);

    assert!(matches!(
        f.store.save_market(777, second),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn test_corrupt_rows_are_errors() {
    let f = fixture();
    let catalog = MarketCatalog::from_items(Vec::new());
    let market = generate_market(&catalog, &MarketConfig::default(), &mut ChaCha8Rng::seed_from_u64(1));
    f.store.save_market(f.campaign, market).unwrap();

    f.store
        .with_conn(|conn| {
            conn.execute(
                "UPDATE campaign_market SET generated_at = 'yesterday' WHERE campaign_id = ?1",
                [f.campaign],
            )?;
            conn.execute("UPDATE gangs SET gangers = '[not json' WHERE id = ?1", [f.rats])?;
            Ok(())
        })
        .unwrap();

    assert!(matches!(f.store.load_market(f.campaign), Err(StoreError::Invalid(_))));
    assert!(matches!(f.store.gang(f.rats), Err(StoreError::Sqlite(_))));
    assert!(f.store.gang(f.skulls).unwrap().is_some());
}
