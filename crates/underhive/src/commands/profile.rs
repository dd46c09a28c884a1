//! `/profile` commands: the caller's current campaign and gang.

use super::autocomplete;
use crate::data::{author_id, CommandResult, Context};

/// Set and view your preferences
#[poise::command(
    slash_command,
    subcommands("set_campaign", "set_gang", "my_preferences"),
    subcommand_required
)]
pub async fn profile(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

/// Set your current campaign
#[poise::command(slash_command)]
async fn set_campaign(
    ctx: Context<'_>,
    #[description = "Campaign"]
    #[autocomplete = "autocomplete::campaigns"]
    campaign_id: i64,
) -> CommandResult {
    let user = author_id(ctx);
    let campaign = ctx
        .data()
        .run(move |store| {
            store.set_current_campaign(&user, campaign_id)?;
            store.campaign(campaign_id)
        })
        .await?;
    let name = campaign.map_or_else(|| campaign_id.to_string(), |c| c.name);
    super::say_ephemeral(ctx, format!("Current campaign set to '{name}'.")).await
}

/// Set your current gang
#[poise::command(slash_command)]
async fn set_gang(
    ctx: Context<'_>,
    #[description = "One of your gangs"]
    #[autocomplete = "autocomplete::own_gangs"]
    gang_id: i64,
) -> CommandResult {
    let user = author_id(ctx);
    let gang = ctx
        .data()
        .run(move |store| store.set_current_gang(&user, gang_id))
        .await?;
    super::say_ephemeral(ctx, format!("Current gang set to '{}'.", gang.name)).await
}

/// View your current campaign and gang
#[poise::command(slash_command)]
async fn my_preferences(ctx: Context<'_>) -> CommandResult {
    let user = author_id(ctx);
    let (campaign, gang) = ctx
        .data()
        .run(move |store| {
            let prefs = store.preferences(&user)?;
            let campaign = match prefs.current_campaign_id {
                Some(id) => store.campaign(id)?,
                None => None,
            };
            let gang = match prefs.current_gang_id {
                Some(id) => store.gang(id)?,
                None => None,
            };
            Ok((campaign, gang))
        })
        .await?;

    let campaign = campaign.map_or_else(|| "None".to_string(), |c| format!("{} ({})", c.name, c.id));
    let gang = gang.map_or_else(|| "None".to_string(), |g| format!("{} ({})", g.name, g.id));
    super::say_ephemeral(
        ctx,
        format!("Current Campaign: {campaign}\nCurrent Gang: {gang}"),
    )
    .await
}
