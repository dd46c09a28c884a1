//! Autocomplete callbacks.
//!
//! Each callback answers with at most 25 choices whose label contains the
//! typed text, ignoring case. Lookup failures answer with no choices.

use poise::serenity_prelude as serenity;
use underhive_shared::constants::MAX_AUTOCOMPLETE_CHOICES;
use underhive_shared::types::{AssetType, GangId};

use crate::data::{author_id, Context};

/// Keeps `(label, value)` pairs whose label contains `partial`.
pub(crate) fn filter_choices<I>(candidates: I, partial: &str) -> Vec<(String, i64)>
where
    I: IntoIterator<Item = (String, i64)>,
{
    let needle = partial.trim().to_lowercase();
    candidates
        .into_iter()
        .filter(|(label, _)| label.to_lowercase().contains(&needle))
        .take(MAX_AUTOCOMPLETE_CHOICES)
        .collect()
}

fn to_choices(pairs: Vec<(String, i64)>) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    pairs
        .into_iter()
        .map(|(label, value)| serenity::AutocompleteChoice::new(label, value))
}

fn labelled<T>(rows: Vec<T>, label: impl Fn(&T) -> (String, i64)) -> Vec<(String, i64)> {
    rows.iter().map(label).collect()
}

/// Campaigns of the current guild.
pub async fn campaigns(
    ctx: Context<'_>,
    partial: &str,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    let pairs = match ctx.guild_id() {
        Some(guild) => {
            let server = guild.to_string();
            ctx.data()
                .run(move |store| store.list_campaigns(&server))
                .await
                .map(|rows| labelled(rows, |c| (format!("{} ({})", c.name, c.id), c.id)))
                .unwrap_or_else(|e| {
                    tracing::warn!("Campaign autocomplete failed: {e}");
                    Vec::new()
                })
        }
        None => Vec::new(),
    };
    to_choices(filter_choices(pairs, partial))
}

/// Gangs of the caller's current campaign.
pub async fn campaign_gangs(
    ctx: Context<'_>,
    partial: &str,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    let user = author_id(ctx);
    let pairs = ctx
        .data()
        .run(move |store| {
            match store.preferences(&user)?.current_campaign_id {
                Some(campaign) => store.list_gangs(campaign),
                None => Ok(Vec::new()),
            }
        })
        .await
        .map(|rows| labelled(rows, |g| (format!("{} ({})", g.name, g.id), g.id)))
        .unwrap_or_else(|e| {
            tracing::warn!("Gang autocomplete failed: {e}");
            Vec::new()
        });
    to_choices(filter_choices(pairs, partial))
}

/// Gangs the caller owns, across campaigns.
pub async fn own_gangs(
    ctx: Context<'_>,
    partial: &str,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    let user = author_id(ctx);
    let pairs = ctx
        .data()
        .run(move |store| store.gangs_for_user(&user))
        .await
        .map(|rows| {
            labelled(rows, |g| {
                (
                    format!("{} ({}) - {}", g.gang.name, g.gang.id, g.campaign_name),
                    g.gang.id,
                )
            })
        })
        .unwrap_or_else(|e| {
            tracing::warn!("Gang autocomplete failed: {e}");
            Vec::new()
        });
    to_choices(filter_choices(pairs, partial))
}

/// The fixed asset type labels.
#[allow(clippy::unused_async)]
pub async fn asset_types(
    _ctx: Context<'_>,
    partial: &str,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    let needle = partial.trim().to_lowercase();
    AssetType::ALL
        .into_iter()
        .filter(move |t| t.as_str().to_lowercase().contains(&needle))
        .map(|t| serenity::AutocompleteChoice::new(t.as_str(), t.as_str()))
}

/// Assets of the gang named by a `gang_id` argument, or of the current gang.
pub async fn assets(
    ctx: Context<'_>,
    partial: &str,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    let selected = selected_gang(ctx);
    let user = author_id(ctx);
    let pairs = ctx
        .data()
        .run(move |store| {
            let gang = match selected {
                Some(id) => Some(id),
                None => store.preferences(&user)?.current_gang_id,
            };
            match gang {
                Some(id) => store.list_assets(id),
                None => Ok(Vec::new()),
            }
        })
        .await
        .map(|rows| {
            labelled(rows, |a| {
                (format!("{} [{}] (ID: {})", a.name, a.asset_type, a.id), a.id)
            })
        })
        .unwrap_or_else(|e| {
            tracing::warn!("Asset autocomplete failed: {e}");
            Vec::new()
        });
    to_choices(filter_choices(pairs, partial))
}

/// Value of an already filled `gang_id` option.
fn selected_gang(ctx: Context<'_>) -> Option<GangId> {
    let poise::Context::Application(app) = ctx else {
        return None;
    };
    app.args
        .iter()
        .find(|option| option.name == "gang_id")
        .and_then(|option| match &option.value {
            serenity::ResolvedValue::Integer(id) => Some(*id),
            serenity::ResolvedValue::String(text) => text.parse().ok(),
            _ => None,
        })
}
