//! Command errors and how they are reported back to Discord.

use poise::serenity_prelude as serenity;
use thiserror::Error;
use underhive_economy::DiceError;
use underhive_store::StoreError;

/// Errors a command can end with.
#[derive(Error, Debug)]
pub enum BotError {
    /// The caller has not selected a campaign or gang yet.
    #[error("{0}")]
    MissingPreference(String),

    /// The caller may not run this command.
    #[error("{0}")]
    Unauthorized(String),

    /// Bad command input caught before reaching the store.
    #[error("{0}")]
    Invalid(String),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The dice formula was rejected.
    #[error("Invalid dice formula: {0}")]
    Dice(#[from] DiceError),

    /// Discord API failure.
    #[error("Discord error: {0}")]
    Serenity(#[from] serenity::Error),

    /// A blocking store task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl BotError {
    /// No current campaign set.
    #[must_use]
    pub fn no_campaign() -> Self {
        Self::MissingPreference(
            "No current campaign set. Use /profile set_campaign first.".to_string(),
        )
    }

    /// No current gang set.
    #[must_use]
    pub fn no_gang() -> Self {
        Self::MissingPreference("No current gang set. Use /profile set_gang first.".to_string())
    }

    /// Whether the error text should be shown to the invoking user.
    ///
    /// Anything else is logged and replaced by a generic message.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        match self {
            Self::MissingPreference(_) | Self::Unauthorized(_) | Self::Invalid(_) | Self::Dice(_) => {
                true
            }
            Self::Store(err) => err.is_user_facing(),
            Self::Serenity(_) | Self::Join(_) => false,
        }
    }

    /// The message to send back.
    #[must_use]
    pub fn user_message(&self) -> String {
        if self.is_user_facing() {
            self.to_string()
        } else {
            GENERIC_ERROR_MESSAGE.to_string()
        }
    }
}

/// Reply for internal failures.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred.";
