//! # Slash Commands
//!
//! One module per command group. Parent commands only carry the group name;
//! the work happens in the subcommands.
//!
//! ```text
//! /campaign     create | list | delete
//! /gang         register | list | delete | mine
//! /bank         adjust | view | history
//! /asset        add | remove | sell | list | list_campaign | roll
//! /dice         roll
//! /marketplace  generate | view | trade | list_trades | accept_trade
//! /profile      set_campaign | set_gang | my_preferences
//! /admin        export_db | adjust_credits | set_credits | credit_history
//!               add_asset | remove_asset
//! /ping
//! ```

pub mod admin;
pub mod asset;
pub mod autocomplete;
pub mod bank;
pub mod campaign;
pub mod dice;
pub mod gang;
pub mod marketplace;
pub mod profile;

use poise::serenity_prelude as serenity;
use underhive_shared::types::AssetType;

use crate::data::{CommandResult, Context, Data};
use crate::error::BotError;
use crate::render::{self, EmbedField};

/// Every top-level command, ready for the framework options.
#[must_use]
pub fn all() -> Vec<poise::Command<Data, BotError>> {
    vec![
        ping(),
        campaign::campaign(),
        gang::gang(),
        bank::bank(),
        asset::asset(),
        dice::dice(),
        marketplace::marketplace(),
        profile::profile(),
        admin::admin(),
    ]
}

/// Test the bot
#[poise::command(slash_command)]
pub async fn ping(ctx: Context<'_>) -> CommandResult {
    ctx.say("Pong!").await?;
    Ok(())
}

// ============================================================================
// Reply helpers
// ============================================================================

/// Sends a reply only the caller can see.
pub(crate) async fn say_ephemeral(ctx: Context<'_>, text: impl Into<String>) -> CommandResult {
    ctx.send(
        poise::CreateReply::default()
            .content(text)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Sends a header plus lines, split across messages as needed.
pub(crate) async fn say_lines(
    ctx: Context<'_>,
    header: &str,
    lines: &[String],
    empty: &str,
) -> CommandResult {
    if lines.is_empty() {
        ctx.say(empty).await?;
        return Ok(());
    }
    for message in render::paginate_lines(header, lines) {
        ctx.say(message).await?;
    }
    Ok(())
}

/// Builds an embed from rendered fields.
pub(crate) fn embed(
    title: impl Into<String>,
    description: impl Into<String>,
    colour: serenity::Colour,
    fields: Vec<EmbedField>,
) -> serenity::CreateEmbed {
    let description = description.into();
    let mut embed = serenity::CreateEmbed::new()
        .title(title)
        .colour(colour)
        .fields(fields.into_iter().map(|f| (f.name, f.value, false)));
    if !description.is_empty() {
        embed = embed.description(description);
    }
    embed
}

/// Parses an asset type argument.
pub(crate) fn parse_asset_type(value: &str) -> Result<AssetType, BotError> {
    value.parse().map_err(|_| {
        let known: Vec<&str> = AssetType::ALL.iter().map(|t| t.as_str()).collect();
        BotError::Invalid(format!(
            "Unknown asset type '{value}'. Choose one of: {}.",
            known.join(", ")
        ))
    })
}
