//! # Campaign Constants
//!
//! Limits shared by the ledger, the market generator and the command layer.

// =============================================================================
// LEDGER PAGINATION
// =============================================================================

/// Smallest page size a history request may ask for.
pub const MIN_PAGE_SIZE: u32 = 1;

/// Largest page size a history request may ask for.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Page size used when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

// =============================================================================
// MARKETPLACE
// =============================================================================

/// Number of unique items the trading post aims for.
pub const MARKET_TRADING_POST_SIZE: usize = 20;

/// Draw budget for filling the trading post.
pub const MARKET_TRADING_POST_ATTEMPTS: u32 = 1000;

/// Number of unique items the secret stash aims for.
pub const MARKET_STASH_SIZE: usize = 5;

/// Draw budget for filling the secret stash.
pub const MARKET_STASH_ATTEMPTS: u32 = 500;

/// Minimum rarity for an item to be eligible for the secret stash.
pub const MARKET_STASH_MIN_RARITY: u32 = 10;

// =============================================================================
// DICE
// =============================================================================

/// Maximum number of dice in a single `NdM` term.
pub const MAX_DICE_PER_TERM: u32 = 100;

/// Maximum number of sides on a die.
pub const MAX_DIE_SIDES: u32 = 1000;

// =============================================================================
// DISCORD LIMITS
// =============================================================================

/// Discord caps autocomplete responses at 25 choices.
pub const MAX_AUTOCOMPLETE_CHOICES: usize = 25;

/// Hard limit on an embed field value.
pub const MAX_EMBED_FIELD_LENGTH: usize = 1024;

/// Soft limit used when packing market sections into embed fields.
pub const PRACTICAL_EMBED_FIELD_LENGTH: usize = 1000;

/// Discord caps embeds at 25 fields.
pub const MAX_EMBED_FIELDS: usize = 25;

/// Discord caps the combined text of the embeds in one message at 6000 characters.
pub const MAX_EMBED_TOTAL_LENGTH: usize = 6000;

/// Discord caps plain messages at 2000 characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Prefix every Yaktribe gang link must carry.
pub const YAKTRIBE_URL_PREFIX: &str = "https://yaktribe.games/underhive/";
