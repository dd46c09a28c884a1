//! # UNDERHIVE
//!
//! Necromunda campaign bot: the Discord surface over the store and the
//! economy logic.
//!
//! ## Layers
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Discord (poise slash commands, autocomplete)                │
//! │      commands::*  ──>  render::*   (pure text building)      │
//! │          │                                                   │
//! │          ▼  Data::run (spawn_blocking)                       │
//! │  underhive_store  (SQLite, one mutex-guarded connection)     │
//! │          │                                                   │
//! │          ▼                                                   │
//! │  underhive_economy (ledger pages, market, dice, trade plans) │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: `underhive.toml` loading
//! - `data`: shared state and preference lookups
//! - `commands`: the slash command tree
//! - `render`: message and embed text
//! - `error`: command errors and how they are replied

#![deny(unsafe_code)]

pub mod commands;
pub mod config;
pub mod data;
pub mod error;
pub mod render;

use std::collections::HashSet;

use poise::serenity_prelude as serenity;
use tracing::{error, warn};

pub use config::Config;
pub use data::{Context, Data};
pub use error::BotError;

/// Framework options with the full command tree.
#[must_use]
pub fn framework_options(owners: &[u64]) -> poise::FrameworkOptions<Data, BotError> {
    poise::FrameworkOptions {
        commands: commands::all(),
        owners: owners
            .iter()
            .copied()
            .filter(|id| *id != 0)
            .map(serenity::UserId::new)
            .collect::<HashSet<_>>(),
        initialize_owners: true,
        on_error: |err| Box::pin(on_error(err)),
        pre_command: |ctx| {
            Box::pin(async move {
                tracing::debug!(
                    command = %ctx.command().qualified_name,
                    user = %ctx.author().id,
                    "Running command"
                );
            })
        },
        ..Default::default()
    }
}

/// Replies with the error's user message; internal failures are logged.
async fn on_error(err: poise::FrameworkError<'_, Data, BotError>) {
    match err {
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_user_facing() {
                warn!(command = %ctx.command().qualified_name, "Command rejected: {error}");
            } else {
                error!(command = %ctx.command().qualified_name, "Command failed: {error}");
            }
            let reply = poise::CreateReply::default()
                .content(error.user_message())
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                error!("Failed to send error reply: {e}");
            }
        }
        poise::FrameworkError::NotAnOwner { ctx, .. } => {
            let reply = poise::CreateReply::default()
                .content("You are not authorized to use this command.")
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                error!("Failed to send error reply: {e}");
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}
