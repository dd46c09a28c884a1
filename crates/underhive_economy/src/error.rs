//! # Economy Error Types
//!
//! All errors that can occur in the economy system.

use thiserror::Error;

/// Errors that can occur in the economy system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EconomyError {
    /// A debit would take a gang below zero credits.
    #[error("insufficient credits: need {requested}, have {available}")]
    InsufficientCredits {
        /// Credits the gang currently holds.
        available: i64,
        /// Credits the operation tried to remove.
        requested: i64,
    },

    /// A credit amount that must be non-negative was negative.
    #[error("credit amount must not be negative, got {0}")]
    NegativeAmount(i64),

    /// Arithmetic overflow in a balance calculation.
    #[error("arithmetic overflow in credit calculation")]
    ArithmeticOverflow,

    /// A trade offer that cannot be carried out as written.
    #[error("invalid trade: {0}")]
    InvalidTrade(String),

    /// The item catalog could not be read.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
}

/// Result type for economy operations.
pub type EconomyResult<T> = Result<T, EconomyError>;
