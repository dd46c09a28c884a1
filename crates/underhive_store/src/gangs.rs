//! Gangs: player-owned factions registered to a campaign.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;
use underhive_shared::constants::YAKTRIBE_URL_PREFIX;
use underhive_shared::types::{CampaignId, GangId};

use crate::campaigns::require_campaign;
use crate::error::{StoreError, StoreResult};
use crate::Store;

/// Stat snapshot taken at registration. Informational only; the credit
/// balance always comes from the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GangStats {
    /// Credits shown on the gang sheet.
    pub credits: i64,
    /// Meat stockpile.
    pub meat: i64,
    /// Gang rating.
    pub rating: i64,
    /// Reputation.
    pub reputation: i64,
    /// Wealth.
    pub wealth: i64,
    /// Fighter names.
    pub gangers: Vec<String>,
}

/// A gang row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gang {
    /// Row id.
    pub id: GangId,
    /// Owning user id.
    pub user_id: String,
    /// Campaign the gang plays in.
    pub campaign_id: CampaignId,
    /// Optional Yaktribe gang sheet.
    pub yaktribe_url: Option<String>,
    /// Gang name.
    pub name: String,
    /// House or faction.
    pub gang_type: String,
    /// Registration snapshot.
    pub stats: GangStats,
}

impl Gang {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let gangers: String = row.get("gangers")?;
        let gangers = serde_json::from_str(&gangers).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            campaign_id: row.get("campaign_id")?,
            yaktribe_url: row.get("yaktribe_url")?,
            name: row.get("gang_name")?,
            gang_type: row.get("gang_type")?,
            stats: GangStats {
                credits: row.get("credits")?,
                meat: row.get("meat")?,
                rating: row.get("gang_rating")?,
                reputation: row.get("reputation")?,
                wealth: row.get("wealth")?,
                gangers,
            },
        })
    }
}

/// A gang together with its campaign's name, for "my gangs" listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserGang {
    /// The gang.
    pub gang: Gang,
    /// Name of its campaign.
    pub campaign_name: String,
}

/// Registration input.
#[derive(Debug, Clone, Default)]
pub struct NewGang {
    /// Owner.
    pub user_id: String,
    /// Target campaign.
    pub campaign_id: CampaignId,
    /// Gang name.
    pub name: String,
    /// House or faction.
    pub gang_type: String,
    /// Optional gang sheet link.
    pub yaktribe_url: Option<String>,
    /// Stat snapshot.
    pub stats: GangStats,
}

const GANG_COLUMNS: &str = "g.id, g.user_id, g.campaign_id, g.yaktribe_url, g.gang_name, \
     g.gang_type, g.credits, g.meat, g.gang_rating, g.reputation, g.wealth, g.gangers";

pub(crate) fn get_gang(conn: &Connection, id: GangId) -> StoreResult<Option<Gang>> {
    let gang = conn
        .query_row(
            &format!("SELECT {GANG_COLUMNS} FROM gangs g WHERE g.id = ?1"),
            params![id],
            Gang::from_row,
        )
        .optional()?;
    Ok(gang)
}

pub(crate) fn require_gang(conn: &Connection, id: GangId) -> StoreResult<Gang> {
    get_gang(conn, id)?.ok_or_else(|| StoreError::not_found("Gang", id))
}

/// Checks the optional Yaktribe link.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] when the link is not a Yaktribe
/// Underhive page.
pub fn validate_yaktribe_url(url: &str) -> StoreResult<()> {
    if url.starts_with(YAKTRIBE_URL_PREFIX) {
        Ok(())
    } else {
        Err(StoreError::Invalid(format!(
            "Invalid Yaktribe URL. It must start with {YAKTRIBE_URL_PREFIX}"
        )))
    }
}

impl Store {
    /// Register a gang in a campaign.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] for a blank name or a bad link, and
    /// [`StoreError::NotFound`] for an unknown campaign.
    pub fn register_gang(&self, new: NewGang) -> StoreResult<Gang> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(StoreError::Invalid("Gang name cannot be empty.".to_string()));
        }
        let gang_type = new.gang_type.trim().to_string();
        let yaktribe_url = new
            .yaktribe_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if let Some(url) = &yaktribe_url {
            validate_yaktribe_url(url)?;
        }
        let gangers = serde_json::to_string(&new.stats.gangers)?;

        self.with_conn(|conn| {
            require_campaign(conn, new.campaign_id)?;
            conn.execute(
                "INSERT INTO gangs (user_id, campaign_id, yaktribe_url, gang_name, gang_type,
                                    credits, meat, gang_rating, reputation, wealth, gangers)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    new.user_id,
                    new.campaign_id,
                    yaktribe_url,
                    name,
                    gang_type,
                    new.stats.credits,
                    new.stats.meat,
                    new.stats.rating,
                    new.stats.reputation,
                    new.stats.wealth,
                    gangers,
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!(gang_id = id, campaign_id = new.campaign_id, "Registered gang");
            Ok(Gang {
                id,
                user_id: new.user_id,
                campaign_id: new.campaign_id,
                yaktribe_url,
                name,
                gang_type,
                stats: new.stats,
            })
        })
    }

    /// Look up one gang.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on database failure.
    pub fn gang(&self, id: GangId) -> StoreResult<Option<Gang>> {
        self.with_conn(|conn| get_gang(conn, id))
    }

    /// Gangs of a campaign, in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on database failure.
    pub fn list_gangs(&self, campaign_id: CampaignId) -> StoreResult<Vec<Gang>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {GANG_COLUMNS} FROM gangs g WHERE g.campaign_id = ?1 ORDER BY g.id"
            ))?;
            let gangs = stmt
                .query_map(params![campaign_id], Gang::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(gangs)
        })
    }

    /// Every gang a user owns, with its campaign name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on database failure.
    pub fn gangs_for_user(&self, user_id: &str) -> StoreResult<Vec<UserGang>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {GANG_COLUMNS}, c.name AS campaign_name
                 FROM gangs g JOIN campaigns c ON g.campaign_id = c.id
                 WHERE g.user_id = ?1 ORDER BY g.id"
            ))?;
            let gangs = stmt
                .query_map(params![user_id], |row| {
                    Ok(UserGang {
                        gang: Gang::from_row(row)?,
                        campaign_name: row.get("campaign_name")?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(gangs)
        })
    }

    /// Delete a gang owned by `user_id`.
    ///
    /// Its assets and pending offers are removed and preferences pointing at
    /// it are cleared, all in one transaction. Ledger rows stay as history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] or [`StoreError::Unauthorized`].
    pub fn delete_gang(&self, id: GangId, user_id: &str) -> StoreResult<Gang> {
        self.with_tx(|tx| {
            let gang = require_gang(tx, id)?;
            if gang.user_id != user_id {
                return Err(StoreError::Unauthorized(
                    "You are not authorized to delete this gang.".to_string(),
                ));
            }

            tx.execute("DELETE FROM gang_assets WHERE gang_id = ?1", params![id])?;
            tx.execute(
                "DELETE FROM trade_offers
                 WHERE status = 'pending' AND (from_gang_id = ?1 OR to_gang_id = ?1)",
                params![id],
            )?;
            tx.execute(
                "UPDATE user_preferences SET current_gang_id = NULL WHERE current_gang_id = ?1",
                params![id],
            )?;
            tx.execute("DELETE FROM gangs WHERE id = ?1", params![id])?;

            debug!(gang_id = id, "Deleted gang");
            Ok(gang)
        })
    }
}
