//! `/admin` commands, limited to the bot owners.
//!
//! Gang arguments must belong to the caller's current campaign.

use poise::serenity_prelude as serenity;
use tracing::info;

use super::asset::AssetArgs;
use super::autocomplete;
use super::bank::{adjustment_message, send_history};
use crate::data::{author_id, CommandResult, Context};

const ADMIN_REASON: &str = "admin adjustment";

/// Admin tools
#[poise::command(
    slash_command,
    owners_only,
    subcommands(
        "export_db",
        "adjust_credits",
        "set_credits",
        "credit_history",
        "add_asset",
        "remove_asset"
    ),
    subcommand_required
)]
pub async fn admin(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

/// Export the database file
#[poise::command(slash_command, owners_only)]
async fn export_db(ctx: Context<'_>) -> CommandResult {
    ctx.defer_ephemeral().await?;
    let bytes = ctx.data().run(|store| store.export_bytes()).await?;
    info!(user = %ctx.author().id, bytes = bytes.len(), "Database exported");
    ctx.send(
        poise::CreateReply::default()
            .content("Here is the database:")
            .attachment(serenity::CreateAttachment::bytes(bytes, "necromunda.db"))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Adjust any gang's credits in your current campaign
#[poise::command(slash_command, owners_only)]
async fn adjust_credits(
    ctx: Context<'_>,
    #[description = "Target gang"]
    #[autocomplete = "autocomplete::campaign_gangs"]
    gang_id: i64,
    #[description = "Credits (positive to add, negative to subtract)"] amount: i64,
    #[description = "Optional reason"] reason: Option<String>,
) -> CommandResult {
    let user = author_id(ctx);
    let campaign = ctx.data().current_campaign(user.clone()).await?;
    let gang = ctx.data().gang_in_campaign(gang_id, &campaign).await?;
    let reason = reason.unwrap_or_else(|| ADMIN_REASON.to_string());

    let (_, balance) = ctx
        .data()
        .run(move |store| store.adjust_credits(gang_id, amount, &reason, &user))
        .await?;
    info!(gang_id, amount, balance, "Admin adjusted credits");
    ctx.say(adjustment_message(amount, &gang.name, balance)).await?;
    Ok(())
}

/// Set a gang's credits to an exact value
#[poise::command(slash_command, owners_only)]
async fn set_credits(
    ctx: Context<'_>,
    #[description = "Target gang"]
    #[autocomplete = "autocomplete::campaign_gangs"]
    gang_id: i64,
    #[description = "New credit value"]
    #[min = 0]
    amount: i64,
    #[description = "Optional reason"] reason: Option<String>,
) -> CommandResult {
    let user = author_id(ctx);
    let campaign = ctx.data().current_campaign(user.clone()).await?;
    let gang = ctx.data().gang_in_campaign(gang_id, &campaign).await?;
    let reason = reason.unwrap_or_else(|| ADMIN_REASON.to_string());

    let (_, previous) = ctx
        .data()
        .run(move |store| store.set_credits(gang_id, amount, &reason, &user))
        .await?;
    info!(gang_id, previous, amount, "Admin set credits");
    ctx.say(format!(
        "**{}**: New balance: **{amount}** credits. Old balance: **{previous}** credits.",
        gang.name
    ))
    .await?;
    Ok(())
}

/// Show a gang's credit transaction history (paged)
#[poise::command(slash_command, owners_only)]
async fn credit_history(
    ctx: Context<'_>,
    #[description = "Target gang"]
    #[autocomplete = "autocomplete::campaign_gangs"]
    gang_id: i64,
    #[description = "Which page to view (starting at 1)"] page: Option<i64>,
    #[description = "How many entries per page"] limit: Option<i64>,
) -> CommandResult {
    let campaign = ctx.data().current_campaign(author_id(ctx)).await?;
    let gang = ctx.data().gang_in_campaign(gang_id, &campaign).await?;
    send_history(ctx, gang.id, &gang.name, page, limit, true).await
}

/// Add an asset to any gang in your current campaign
#[poise::command(slash_command, owners_only)]
#[allow(clippy::too_many_arguments)]
async fn add_asset(
    ctx: Context<'_>,
    #[description = "Target gang"]
    #[autocomplete = "autocomplete::campaign_gangs"]
    gang_id: i64,
    #[description = "Type of asset"]
    #[autocomplete = "autocomplete::asset_types"]
    asset_type: String,
    #[description = "Asset name"] name: String,
    #[description = "Credit value"] value: Option<i64>,
    #[description = "Dice formula"] roll_formula: Option<String>,
    #[description = "Additional note"] note: Option<String>,
    #[description = "Mark as to be sold on next payday"] should_sell: Option<bool>,
    #[description = "Mark as consumed"] is_consumed: Option<bool>,
) -> CommandResult {
    let new = AssetArgs {
        asset_type,
        name,
        value,
        roll_formula,
        note,
        should_sell,
        is_consumed,
    }
    .into_new_asset()?;
    let campaign = ctx.data().current_campaign(author_id(ctx)).await?;
    let gang = ctx.data().gang_in_campaign(gang_id, &campaign).await?;
    let asset = ctx
        .data()
        .run(move |store| store.add_asset(gang_id, new))
        .await?;
    info!(gang_id, asset_id = asset.id, "Admin added asset");
    ctx.say(format!(
        "{} '{}' added to **{}** (ID {}).",
        asset.asset_type, asset.name, gang.name, asset.id
    ))
    .await?;
    Ok(())
}

/// Remove an asset from any gang in your current campaign
#[poise::command(slash_command, owners_only)]
async fn remove_asset(
    ctx: Context<'_>,
    #[description = "Target gang"]
    #[autocomplete = "autocomplete::campaign_gangs"]
    gang_id: i64,
    #[description = "Asset to remove"]
    #[autocomplete = "autocomplete::assets"]
    asset_id: i64,
) -> CommandResult {
    let campaign = ctx.data().current_campaign(author_id(ctx)).await?;
    let gang = ctx.data().gang_in_campaign(gang_id, &campaign).await?;
    let asset = ctx
        .data()
        .run(move |store| store.remove_asset(gang_id, asset_id))
        .await?;
    info!(gang_id, asset_id, "Admin removed asset");
    ctx.say(format!("Asset '{}' removed from **{}**.", asset.name, gang.name))
        .await?;
    Ok(())
}
