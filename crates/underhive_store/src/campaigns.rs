//! Campaigns: named containers scoped to one Discord guild.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::debug;
use underhive_shared::types::CampaignId;

use crate::error::{StoreError, StoreResult};
use crate::Store;

/// A campaign row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Campaign {
    /// Row id.
    pub id: CampaignId,
    /// Display name.
    pub name: String,
    /// User id of the creator.
    pub created_by: String,
    /// Guild the campaign lives in.
    pub server_id: String,
}

impl Campaign {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            created_by: row.get("created_by")?,
            server_id: row.get("server_id")?,
        })
    }
}

pub(crate) fn get_campaign(conn: &Connection, id: CampaignId) -> StoreResult<Option<Campaign>> {
    let campaign = conn
        .query_row(
            "SELECT id, name, created_by, server_id FROM campaigns WHERE id = ?1",
            params![id],
            Campaign::from_row,
        )
        .optional()?;
    Ok(campaign)
}

pub(crate) fn require_campaign(conn: &Connection, id: CampaignId) -> StoreResult<Campaign> {
    get_campaign(conn, id)?.ok_or_else(|| StoreError::not_found("Campaign", id))
}

impl Store {
    /// Create a campaign in `server_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] for a blank name.
    pub fn create_campaign(
        &self,
        name: &str,
        created_by: &str,
        server_id: &str,
    ) -> StoreResult<Campaign> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Invalid("Campaign name cannot be empty.".to_string()));
        }

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO campaigns (name, created_by, server_id) VALUES (?1, ?2, ?3)",
                params![name, created_by, server_id],
            )?;
            let id = conn.last_insert_rowid();
            debug!(campaign_id = id, server_id, "Created campaign");
            Ok(Campaign {
                id,
                name: name.to_string(),
                created_by: created_by.to_string(),
                server_id: server_id.to_string(),
            })
        })
    }

    /// Look up one campaign.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on database failure.
    pub fn campaign(&self, id: CampaignId) -> StoreResult<Option<Campaign>> {
        self.with_conn(|conn| get_campaign(conn, id))
    }

    /// All campaigns of a guild, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on database failure.
    pub fn list_campaigns(&self, server_id: &str) -> StoreResult<Vec<Campaign>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, created_by, server_id FROM campaigns
                 WHERE server_id = ?1 ORDER BY id",
            )?;
            let campaigns = stmt
                .query_map(params![server_id], Campaign::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(campaigns)
        })
    }

    /// Delete a campaign and everything scoped to it.
    ///
    /// Only the creator may delete, and only from the guild it lives in.
    /// Gangs, their assets, trade offers and the market snapshot go with it;
    /// preferences pointing at it are cleared. Ledger rows are kept.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] or [`StoreError::Unauthorized`].
    pub fn delete_campaign(
        &self,
        id: CampaignId,
        user_id: &str,
        server_id: &str,
    ) -> StoreResult<Campaign> {
        self.with_tx(|tx| {
            let campaign = get_campaign(tx, id)?
                .filter(|c| c.server_id == server_id)
                .ok_or_else(|| StoreError::not_found("Campaign", id))?;
            if campaign.created_by != user_id {
                return Err(StoreError::Unauthorized(
                    "You are not authorized to delete this campaign.".to_string(),
                ));
            }

            tx.execute(
                "DELETE FROM gang_assets WHERE gang_id IN
                    (SELECT id FROM gangs WHERE campaign_id = ?1)",
                params![id],
            )?;
            tx.execute(
                "UPDATE user_preferences SET current_gang_id = NULL WHERE current_gang_id IN
                    (SELECT id FROM gangs WHERE campaign_id = ?1)",
                params![id],
            )?;
            tx.execute(
                "UPDATE user_preferences SET current_campaign_id = NULL
                 WHERE current_campaign_id = ?1",
                params![id],
            )?;
            tx.execute("DELETE FROM trade_offers WHERE campaign_id = ?1", params![id])?;
            tx.execute("DELETE FROM campaign_market WHERE campaign_id = ?1", params![id])?;
            tx.execute("DELETE FROM gangs WHERE campaign_id = ?1", params![id])?;
            tx.execute("DELETE FROM campaigns WHERE id = ?1", params![id])?;

            debug!(campaign_id = id, "Deleted campaign");
            Ok(campaign)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campaigns_are_scoped_to_guild() {
        let store = Store::open_in_memory().unwrap();
        store.create_campaign("Dust Falls", "u1", "g1").unwrap();
        store.create_campaign("Hive Secundus", "u1", "g2").unwrap();

        let listed = store.list_campaigns("g1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Dust Falls");
    }

    #[test]
    fn test_blank_name_rejected() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(
            store.create_campaign("   ", "u1", "g1"),
            Err(StoreError::Invalid(_))
        ));
    }

    #[test]
    fn test_only_creator_in_same_guild_deletes() {
        let store = Store::open_in_memory().unwrap();
        let campaign = store.create_campaign("Dust Falls", "u1", "g1").unwrap();

        assert!(matches!(
            store.delete_campaign(campaign.id, "u2", "g1"),
            Err(StoreError::Unauthorized(_))
        ));
        assert!(matches!(
            store.delete_campaign(campaign.id, "u1", "g2"),
            Err(StoreError::NotFound { .. })
        ));
        store.delete_campaign(campaign.id, "u1", "g1").unwrap();
        assert!(store.campaign(campaign.id).unwrap().is_none());
    }
}
