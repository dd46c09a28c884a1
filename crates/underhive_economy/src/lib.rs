//! # Underhive Economy System
//!
//! Pure Rust campaign-economy logic for the Underhive bot.
//!
//! ## Design Principles
//!
//! 1. **Ledger is the truth** - a gang's balance is the sum of its signed deltas
//! 2. **Paging without re-summing** - history pages reconstruct balances from one offset sum
//! 3. **Bounded sampling** - market generation caps its draws instead of looping forever
//! 4. **Injected randomness** - every sampler takes `&mut impl Rng`, so tests seed it
//!
//! ## Example
//!
//! ```rust,ignore
//! use underhive_economy::{MarketCatalog, MarketConfig, generate_market, roll_formula};
//!
//! let catalog = MarketCatalog::from_csv_path("Trading Post.csv")?;
//! let market = generate_market(&catalog, &MarketConfig::default(), &mut rand::thread_rng());
//!
//! let roll = roll_formula("2d6+3")?;
//! println!("{} = {}", roll.expression, roll.total);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod dice;
pub mod error;
pub mod ledger;
pub mod market;
pub mod trade;

pub use dice::{roll_formula, roll_formula_with, validate_formula, DiceError, DiceTerm, RollOutcome};
pub use error::{EconomyError, EconomyResult};
pub use ledger::{HistoryEntry, HistoryPage, LedgerRow, PageRequest, PageWindow};
pub use market::{
    generate_market, parse_rarity_rating, CatalogItem, MarketCatalog, MarketConfig, MarketData,
};
pub use trade::{normalize_asset_list, split_asset_list, CreditMovement, TransferPlan};
