//! # Underhive Shared
//!
//! Common types used by the economy logic, the store and the bot.
//!
//! ## Rule
//!
//! This crate must never depend on:
//! - `rusqlite`
//! - `poise` / `serenity`
//! - any async runtime
//!
//! If you need a database or Discord type, it belongs in `underhive_store`
//! or `underhive`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod types;

pub use constants::{
    MARKET_STASH_MIN_RARITY, MARKET_STASH_SIZE, MARKET_TRADING_POST_SIZE, MAX_AUTOCOMPLETE_CHOICES,
    MAX_PAGE_SIZE, MIN_PAGE_SIZE,
};
pub use types::{AssetId, AssetType, CampaignId, GangId, OfferId, OfferStatus, ParseEnumError};
