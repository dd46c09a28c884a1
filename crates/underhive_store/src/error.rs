//! Error types for the store.

use thiserror::Error;
use underhive_economy::EconomyError;
use underhive_shared::types::GangId;

/// Errors that can occur while reading or writing campaign data.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A referenced row does not exist.
    #[error("{entity} {id} not found.")]
    NotFound {
        /// Kind of row ("Campaign", "Gang", ...).
        entity: &'static str,
        /// The id that was looked up.
        id: i64,
    },

    /// The caller may not perform this action.
    #[error("{0}")]
    Unauthorized(String),

    /// A debit larger than the gang's balance.
    #[error("Cannot subtract {requested} credits; gang {gang} only has {balance}.")]
    InsufficientCredits {
        /// Paying gang.
        gang: GangId,
        /// Its balance before the debit.
        balance: i64,
        /// Credits the operation tried to remove.
        requested: i64,
    },

    /// The trade offer is no longer pending.
    #[error("Trade offer has already been resolved.")]
    AlreadyResolved(i64),

    /// Input rejected before touching the database.
    #[error("{0}")]
    Invalid(String),

    /// SQLite failure.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A JSON column could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem failure while exporting.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Maps a ledger-math failure for `gang` onto a store error.
    pub(crate) fn from_economy(gang: GangId, err: EconomyError) -> Self {
        match err {
            EconomyError::InsufficientCredits {
                available,
                requested,
            } => Self::InsufficientCredits {
                gang,
                balance: available,
                requested,
            },
            other => Self::Invalid(other.to_string()),
        }
    }

    /// Whether the message is meant for the person who ran the command.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Unauthorized(_)
                | Self::InsufficientCredits { .. }
                | Self::AlreadyResolved(_)
                | Self::Invalid(_)
        )
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
