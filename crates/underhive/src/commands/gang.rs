//! `/gang` commands.

use tracing::info;
use underhive_store::{NewGang, StoreResult};

use super::autocomplete;
use crate::data::{author_id, CommandResult, Context};

/// Gang related commands
#[poise::command(
    slash_command,
    subcommands("register", "list", "delete", "mine"),
    subcommand_required
)]
pub async fn gang(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

/// Register your gang to a campaign
#[poise::command(slash_command, guild_only)]
async fn register(
    ctx: Context<'_>,
    #[description = "Campaign to join"]
    #[autocomplete = "autocomplete::campaigns"]
    campaign_id: i64,
    #[description = "Gang name"] name: String,
    #[description = "House or gang type, e.g. Goliath"] gang_type: String,
    #[description = "Yaktribe link to the gang"] yaktribe_url: Option<String>,
) -> CommandResult {
    let new = NewGang {
        user_id: author_id(ctx),
        campaign_id,
        name,
        gang_type,
        yaktribe_url,
        ..NewGang::default()
    };
    let gang = ctx.data().run(move |store| store.register_gang(new)).await?;
    info!(gang_id = gang.id, campaign_id, "Gang registered");
    ctx.say(format!(
        "Gang '{}' ({}) registered to campaign {} with ID {}.",
        gang.name, gang.gang_type, gang.campaign_id, gang.id
    ))
    .await?;
    Ok(())
}

/// List all gangs in a campaign
#[poise::command(slash_command)]
async fn list(
    ctx: Context<'_>,
    #[description = "Campaign"]
    #[autocomplete = "autocomplete::campaigns"]
    campaign_id: i64,
) -> CommandResult {
    let gangs = ctx
        .data()
        .run(move |store| store.list_gangs(campaign_id))
        .await?;
    let lines: Vec<String> = gangs
        .iter()
        .map(|g| {
            let link = g.yaktribe_url.as_deref().unwrap_or("no link");
            format!("ID {}: '{}' ({}), owner <@{}>: {}", g.id, g.name, g.gang_type, g.user_id, link)
        })
        .collect();
    super::say_lines(
        ctx,
        &format!("**Gangs in Campaign {campaign_id}:**"),
        &lines,
        &format!("No gangs found for Campaign ID {campaign_id}."),
    )
    .await
}

/// Delete one of your gangs
#[poise::command(slash_command)]
async fn delete(
    ctx: Context<'_>,
    #[description = "Gang to delete"]
    #[autocomplete = "autocomplete::own_gangs"]
    gang_id: i64,
) -> CommandResult {
    let user = author_id(ctx);
    let gang = ctx
        .data()
        .run(move |store| store.delete_gang(gang_id, &user))
        .await?;
    info!(gang_id, "Gang deleted");
    ctx.say(format!("Gang '{}' deleted.", gang.name)).await?;
    Ok(())
}

/// List all gangs you've registered across campaigns
#[poise::command(slash_command)]
async fn mine(ctx: Context<'_>) -> CommandResult {
    let user = author_id(ctx);
    let gangs = ctx
        .data()
        .run(move |store| {
            store
                .gangs_for_user(&user)?
                .into_iter()
                .map(|entry| {
                    let balance = store.balance(entry.gang.id)?;
                    Ok((entry, balance))
                })
                .collect::<StoreResult<Vec<_>>>()
        })
        .await?;
    let lines: Vec<String> = gangs
        .iter()
        .map(|(entry, balance)| {
            let g = &entry.gang;
            format!(
                "Gang ID {}: '{}' ({}), Campaign '{}' (ID {})\nCredits: {}, Meat: {}, Rating: {}",
                g.id, g.name, g.gang_type, entry.campaign_name, g.campaign_id, balance, g.stats.meat,
                g.stats.rating
            )
        })
        .collect();
    super::say_lines(ctx, "**Your Gangs:**", &lines, "You haven't registered any gangs.").await
}
