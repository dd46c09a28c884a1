//! `/asset` commands on the caller's current gang.

use tracing::info;
use underhive_economy::roll_formula;
use underhive_store::{Asset, NewAsset};

use super::{autocomplete, parse_asset_type};
use crate::data::{author_id, CommandResult, Context};
use crate::error::BotError;
use crate::render;

/// Gang asset related commands
#[poise::command(
    slash_command,
    subcommands("add", "remove", "sell", "list", "list_campaign", "roll"),
    subcommand_required
)]
pub async fn asset(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

/// Options shared by `/asset add` and `/admin add_asset`.
pub(crate) struct AssetArgs {
    pub asset_type: String,
    pub name: String,
    pub value: Option<i64>,
    pub roll_formula: Option<String>,
    pub note: Option<String>,
    pub should_sell: Option<bool>,
    pub is_consumed: Option<bool>,
}

impl AssetArgs {
    pub(crate) fn into_new_asset(self) -> Result<NewAsset, BotError> {
        let asset_type = parse_asset_type(&self.asset_type)?;
        Ok(NewAsset {
            static_value: self.value,
            roll_formula: self.roll_formula.filter(|f| !f.trim().is_empty()),
            note: self.note,
            should_sell: self.should_sell.unwrap_or(false),
            is_consumed: self.is_consumed.unwrap_or(false),
            ..NewAsset::new(self.name, asset_type)
        })
    }
}

/// Add an asset to your current gang
#[poise::command(slash_command)]
#[allow(clippy::too_many_arguments)]
async fn add(
    ctx: Context<'_>,
    #[description = "Type of asset"]
    #[autocomplete = "autocomplete::asset_types"]
    asset_type: String,
    #[description = "Asset name"] name: String,
    #[description = "Credit value"] value: Option<i64>,
    #[description = "Dice formula, e.g. D3x10"] roll_formula: Option<String>,
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
    let (_, gang) = ctx.data().current_gang(author_id(ctx)).await?;
    let gang_id = gang.id;
    let asset = ctx
        .data()
        .run(move |store| store.add_asset(gang_id, new))
        .await?;
    info!(gang_id, asset_id = asset.id, "Asset added");
    ctx.say(format!(
        "{} '{}' added to **{}** (ID {}).",
        asset.asset_type, asset.name, gang.name, asset.id
    ))
    .await?;
    Ok(())
}

/// Remove an asset from your current gang
#[poise::command(slash_command)]
async fn remove(
    ctx: Context<'_>,
    #[description = "Asset to remove"]
    #[autocomplete = "autocomplete::assets"]
    asset_id: i64,
) -> CommandResult {
    let (_, gang) = ctx.data().current_gang(author_id(ctx)).await?;
    let gang_id = gang.id;
    let asset = ctx
        .data()
        .run(move |store| store.remove_asset(gang_id, asset_id))
        .await?;
    info!(gang_id, asset_id, "Asset removed");
    ctx.say(format!("Asset '{}' removed from **{}**.", asset.name, gang.name))
        .await?;
    Ok(())
}

/// Mark an asset as to be sold in the next Pay Day
#[poise::command(slash_command)]
async fn sell(
    ctx: Context<'_>,
    #[description = "Asset to sell"]
    #[autocomplete = "autocomplete::assets"]
    asset_id: i64,
) -> CommandResult {
    let (_, gang) = ctx.data().current_gang(author_id(ctx)).await?;
    let gang_id = gang.id;
    let asset = ctx
        .data()
        .run(move |store| store.mark_asset_for_sale(gang_id, asset_id))
        .await?;
    ctx.say(format!(
        "Asset '{}' will be sold in the next pay day.",
        asset.name
    ))
    .await?;
    Ok(())
}

/// List your current gang's assets
#[poise::command(slash_command)]
async fn list(ctx: Context<'_>) -> CommandResult {
    let (_, gang) = ctx.data().current_gang(author_id(ctx)).await?;
    let gang_id = gang.id;
    let assets = ctx.data().run(move |store| store.list_assets(gang_id)).await?;
    let lines: Vec<String> = assets.iter().map(render::asset_line).collect();
    super::say_lines(
        ctx,
        &format!("**Assets for {}:**", gang.name),
        &lines,
        "No assets found for this gang.",
    )
    .await
}

/// List every asset in your current campaign
#[poise::command(slash_command)]
async fn list_campaign(ctx: Context<'_>) -> CommandResult {
    let campaign = ctx.data().current_campaign(author_id(ctx)).await?;
    let campaign_id = campaign.id;
    let assets = ctx
        .data()
        .run(move |store| store.list_campaign_assets(campaign_id))
        .await?;
    let lines: Vec<String> = assets.iter().map(render::campaign_asset_line).collect();
    super::say_lines(
        ctx,
        &format!("**Assets in {}:**", campaign.name),
        &lines,
        "No assets found for this campaign.",
    )
    .await
}

/// Roll an asset's dice formula
#[poise::command(slash_command)]
async fn roll(
    ctx: Context<'_>,
    #[description = "Asset to roll for"]
    #[autocomplete = "autocomplete::assets"]
    asset_id: i64,
) -> CommandResult {
    let (_, gang) = ctx.data().current_gang(author_id(ctx)).await?;
    let asset = ctx
        .data()
        .run(move |store| store.asset(asset_id))
        .await?
        .filter(|asset| asset.gang_id == gang.id)
        .ok_or_else(|| {
            BotError::Invalid(format!("Asset {asset_id} does not belong to {}.", gang.name))
        })?;
    ctx.say(asset_roll_message(&asset)?).await?;
    Ok(())
}

fn asset_roll_message(asset: &Asset) -> Result<String, BotError> {
    match (&asset.roll_formula, asset.static_value) {
        (Some(formula), _) => {
            let outcome = roll_formula(formula)?;
            Ok(format!("**{}**\n{}", asset.name, render::roll_message(&outcome)))
        }
        (None, Some(value)) => Ok(format!(
            "**{}** has a fixed value of {value} credits.",
            asset.name
        )),
        (None, None) => Err(BotError::Invalid(format!(
            "Asset '{}' has no roll formula or value.",
            asset.name
        ))),
    }
}
