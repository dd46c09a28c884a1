//! `/campaign` commands.

use tracing::info;

use super::autocomplete;
use crate::data::{author_id, guild_id, CommandResult, Context};

/// Campaign related commands
#[poise::command(
    slash_command,
    guild_only,
    subcommands("create", "list", "delete"),
    subcommand_required
)]
pub async fn campaign(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

/// Create a new campaign
#[poise::command(slash_command, guild_only)]
async fn create(
    ctx: Context<'_>,
    #[description = "Campaign name"] name: String,
) -> CommandResult {
    let user = author_id(ctx);
    let server = guild_id(ctx)?;
    let campaign = ctx
        .data()
        .run(move |store| store.create_campaign(&name, &user, &server))
        .await?;
    info!(campaign_id = campaign.id, "Campaign created");
    ctx.say(format!(
        "Campaign '{}' created by {} (ID {}).",
        campaign.name,
        ctx.author().name,
        campaign.id
    ))
    .await?;
    Ok(())
}

/// List all campaigns in this server
#[poise::command(slash_command, guild_only)]
async fn list(ctx: Context<'_>) -> CommandResult {
    let server = guild_id(ctx)?;
    let campaigns = ctx
        .data()
        .run(move |store| store.list_campaigns(&server))
        .await?;
    let lines: Vec<String> = campaigns
        .iter()
        .map(|c| format!("ID {}: {}", c.id, c.name))
        .collect();
    super::say_lines(ctx, "**Campaigns:**", &lines, "No campaigns found.").await
}

/// Delete a campaign you created
#[poise::command(slash_command, guild_only)]
async fn delete(
    ctx: Context<'_>,
    #[description = "Campaign to delete"]
    #[autocomplete = "autocomplete::campaigns"]
    campaign_id: i64,
) -> CommandResult {
    let user = author_id(ctx);
    let server = guild_id(ctx)?;
    let campaign = ctx
        .data()
        .run(move |store| store.delete_campaign(campaign_id, &user, &server))
        .await?;
    info!(campaign_id, "Campaign deleted");
    ctx.say(format!("Campaign '{}' deleted.", campaign.name)).await?;
    Ok(())
}
