//! `/marketplace` commands: market generation and gang-to-gang trades.

use std::collections::HashMap;

use poise::serenity_prelude as serenity;
use tracing::{debug, info};
use underhive_economy::generate_market;
use underhive_store::{MarketSnapshot, NewTradeOffer};

use super::autocomplete;
use crate::data::{author_id, CommandResult, Context};
use crate::render::{self, EmbedField};

const CONT_SUFFIX: &str = " (cont.)";

/// Marketplace management commands
#[poise::command(
    slash_command,
    subcommands("generate", "view", "trade", "list_trades", "accept_trade"),
    subcommand_required
)]
pub async fn marketplace(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

/// Generate the trading post and secret stash
#[poise::command(slash_command)]
async fn generate(ctx: Context<'_>) -> CommandResult {
    let campaign = ctx.data().current_campaign(author_id(ctx)).await?;
    let market = {
        let data = ctx.data();
        generate_market(&data.catalog, &data.market, &mut rand::thread_rng())
    };
    let campaign_id = campaign.id;
    let snapshot = ctx
        .data()
        .run(move |store| store.save_market(campaign_id, market))
        .await?;
    info!(
        campaign_id,
        trading_post = snapshot.trading_post.len(),
        secret_stash = snapshot.secret_stash.len(),
        "Market generated"
    );
    ctx.say(format!(
        "Marketplace generated for campaign '{}' with {} trading items and {} secret stash items.",
        campaign.name,
        snapshot.trading_post.len(),
        snapshot.secret_stash.len()
    ))
    .await?;
    Ok(())
}

/// View the current trading post and secret stash
#[poise::command(slash_command)]
async fn view(ctx: Context<'_>) -> CommandResult {
    let campaign = ctx.data().current_campaign(author_id(ctx)).await?;
    let campaign_id = campaign.id;
    let Some(snapshot) = ctx
        .data()
        .run(move |store| store.load_market(campaign_id))
        .await?
    else {
        return super::say_ephemeral(
            ctx,
            format!("No marketplace data found for campaign '{}'.", campaign.name),
        )
        .await;
    };

    let title = format!("Marketplace - {}", campaign.name);
    let description = last_updated(&snapshot);
    let reserved = title.chars().count() + description.chars().count() + CONT_SUFFIX.len();
    let chunks = render::chunk_embed_fields(market_fields(&snapshot), reserved);
    if chunks.len() > 1 {
        debug!(campaign_id, messages = chunks.len(), "Market view split across messages");
    }
    for (index, chunk) in chunks.into_iter().enumerate() {
        let embed = if index == 0 {
            super::embed(title.clone(), description.clone(), serenity::Colour::DARK_MAGENTA, chunk)
        } else {
            super::embed(format!("{title}{CONT_SUFFIX}"), "", serenity::Colour::DARK_MAGENTA, chunk)
        };
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
    }
    Ok(())
}

fn market_fields(snapshot: &MarketSnapshot) -> Vec<EmbedField> {
    let mut fields =
        render::market_section_fields(&snapshot.trading_post, "🛒 Trading Post", "the trading post");
    fields.extend(render::market_section_fields(
        &snapshot.secret_stash,
        "🤫 Secret Stash",
        "the secret stash",
    ));
    fields
}

fn last_updated(snapshot: &MarketSnapshot) -> String {
    let unix = snapshot.generated_at.timestamp();
    format!("Last Updated: <t:{unix}:R> (<t:{unix}:F>)")
}

/// Create a trade offer
#[poise::command(slash_command)]
async fn trade(
    ctx: Context<'_>,
    #[description = "Gang you want to trade with"]
    #[autocomplete = "autocomplete::campaign_gangs"]
    to_gang_id: i64,
    #[description = "Assets offered (comma-separated)"] offered_assets: Option<String>,
    #[description = "Credits offered"]
    #[min = 0]
    offered_credits: Option<i64>,
    #[description = "Assets requested (comma-separated)"] requested_assets: Option<String>,
    #[description = "Credits requested"]
    #[min = 0]
    requested_credits: Option<i64>,
) -> CommandResult {
    let (campaign, gang) = ctx.data().current_gang(author_id(ctx)).await?;
    let new = NewTradeOffer {
        campaign_id: campaign.id,
        from_gang_id: gang.id,
        to_gang_id,
        offered_assets: offered_assets.unwrap_or_default(),
        offered_credits: offered_credits.unwrap_or(0),
        requested_assets: requested_assets.unwrap_or_default(),
        requested_credits: requested_credits.unwrap_or(0),
    };
    let offer = ctx.data().run(move |store| store.create_offer(new)).await?;
    info!(offer_id = offer.id, from = offer.from_gang_id, to = offer.to_gang_id, "Trade offered");
    ctx.say(format!(
        "Trade offer #{} created from gang {} to gang {}.",
        offer.id, offer.from_gang_id, offer.to_gang_id
    ))
    .await?;
    Ok(())
}

/// List all trade offers in the current campaign
#[poise::command(slash_command)]
async fn list_trades(ctx: Context<'_>) -> CommandResult {
    let campaign = ctx.data().current_campaign(author_id(ctx)).await?;
    let campaign_id = campaign.id;
    let (offers, gangs) = ctx
        .data()
        .run(move |store| Ok((store.list_offers(campaign_id)?, store.list_gangs(campaign_id)?)))
        .await?;
    let names: HashMap<i64, String> = gangs.into_iter().map(|g| (g.id, g.name)).collect();
    let lines: Vec<String> = offers
        .iter()
        .map(|offer| render::offer_line(offer, &names))
        .collect();
    super::say_lines(ctx, "**Trade Offers:**", &lines, "No trade offers available.").await
}

/// Accept a trade offer made to your current gang
#[poise::command(slash_command)]
async fn accept_trade(
    ctx: Context<'_>,
    #[description = "ID of the offer to accept"] offer_id: i64,
) -> CommandResult {
    let user = author_id(ctx);
    let outcome = ctx
        .data()
        .run(move |store| store.accept_offer(offer_id, &user))
        .await?;
    info!(
        offer_id,
        assets = outcome.assets_transferred,
        payments = outcome.credit_movements.len(),
        "Trade accepted"
    );
    ctx.say(format!(
        "Trade #{} accepted. {} asset(s) changed hands.",
        outcome.offer.id, outcome.assets_transferred
    ))
    .await?;
    Ok(())
}
