//! Per-campaign market snapshots.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use tracing::debug;
use underhive_economy::{CatalogItem, MarketData};
use underhive_shared::types::CampaignId;

use crate::campaigns::require_campaign;
use crate::error::StoreResult;
use crate::Store;

/// The latest generated market of a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketSnapshot {
    /// Owning campaign.
    pub campaign_id: CampaignId,
    /// When the market was generated.
    pub generated_at: DateTime<Utc>,
    /// Trading post items.
    pub trading_post: Vec<CatalogItem>,
    /// Secret stash items.
    pub secret_stash: Vec<CatalogItem>,
}

impl Store {
    /// Replace a campaign's market with `market`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::NotFound`] for an unknown campaign.
    pub fn save_market(
        &self,
        campaign_id: CampaignId,
        market: MarketData,
    ) -> StoreResult<MarketSnapshot> {
        let generated_at = Utc::now().trunc_subsecs(0);
        let trading_post = serde_json::to_string(&market.trading_post)?;
        let secret_stash = serde_json::to_string(&market.secret_stash)?;

        self.with_conn(|conn| {
            require_campaign(conn, campaign_id)?;
            conn.execute(
                "INSERT INTO campaign_market (campaign_id, generated_at, trading_post, secret_stash)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(campaign_id) DO UPDATE SET
                    generated_at = excluded.generated_at,
                    trading_post = excluded.trading_post,
                    secret_stash = excluded.secret_stash",
                params![
                    campaign_id,
                    generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                    trading_post,
                    secret_stash,
                ],
            )?;
            debug!(
                campaign_id,
                trading_post = market.trading_post.len(),
                secret_stash = market.secret_stash.len(),
                "Saved market snapshot"
            );
            Ok(())
        })?;

        Ok(MarketSnapshot {
            campaign_id,
            generated_at,
            trading_post: market.trading_post,
            secret_stash: market.secret_stash,
        })
    }

    /// The stored market of a campaign, if one was ever generated.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Json`] if a stored list is corrupt and
    /// [`crate::StoreError::Invalid`] if the stored timestamp is.
    pub fn load_market(&self, campaign_id: CampaignId) -> StoreResult<Option<MarketSnapshot>> {
        let row: Option<(String, String, String)> = self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT generated_at, trading_post, secret_stash
                     FROM campaign_market WHERE campaign_id = ?1",
                    params![campaign_id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;
            Ok(row)
        })?;

        let Some((generated_at, trading_post, secret_stash)) = row else {
            return Ok(None);
        };

        let generated_at = DateTime::parse_from_rfc3339(&generated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                crate::StoreError::Invalid(format!(
                    "Market of campaign {campaign_id} has a corrupt timestamp '{generated_at}': {e}"
                ))
            })?;

        Ok(Some(MarketSnapshot {
            campaign_id,
            generated_at,
            trading_post: serde_json::from_str(&trading_post)?,
            secret_stash: serde_json::from_str(&secret_stash)?,
        }))
    }
}
