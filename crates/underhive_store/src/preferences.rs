//! Per-user current campaign and gang.

use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use underhive_shared::types::{CampaignId, GangId};

use crate::campaigns::require_campaign;
use crate::error::{StoreError, StoreResult};
use crate::gangs::{require_gang, Gang};
use crate::Store;

/// A user's selections. Both are optional until set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserPreferences {
    /// Discord user id.
    pub user_id: String,
    /// Selected campaign.
    pub current_campaign_id: Option<CampaignId>,
    /// Selected gang.
    pub current_gang_id: Option<GangId>,
}

impl Store {
    /// A user's preferences; unset fields when nothing was ever stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on database failure.
    pub fn preferences(&self, user_id: &str) -> StoreResult<UserPreferences> {
        self.with_conn(|conn| {
            let prefs = conn
                .query_row(
                    "SELECT current_campaign_id, current_gang_id
                     FROM user_preferences WHERE user_id = ?1",
                    params![user_id],
                    |row| {
                        Ok(UserPreferences {
                            user_id: user_id.to_string(),
                            current_campaign_id: row.get(0)?,
                            current_gang_id: row.get(1)?,
                        })
                    },
                )
                .optional()?;
            Ok(prefs.unwrap_or_else(|| UserPreferences {
                user_id: user_id.to_string(),
                ..UserPreferences::default()
            }))
        })
    }

    /// Select a campaign; the gang selection is kept.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown campaign.
    pub fn set_current_campaign(
        &self,
        user_id: &str,
        campaign_id: CampaignId,
    ) -> StoreResult<UserPreferences> {
        self.with_conn(|conn| {
            require_campaign(conn, campaign_id)?;
            conn.execute(
                "INSERT INTO user_preferences (user_id, current_campaign_id) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET
                    current_campaign_id = excluded.current_campaign_id",
                params![user_id, campaign_id],
            )?;
            Ok(())
        })?;
        self.preferences(user_id)
    }

    /// Select one of the user's own gangs.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown gang and
    /// [`StoreError::Unauthorized`] for someone else's gang.
    pub fn set_current_gang(&self, user_id: &str, gang_id: GangId) -> StoreResult<Gang> {
        self.with_conn(|conn| {
            let gang = require_gang(conn, gang_id)?;
            if gang.user_id != user_id {
                return Err(StoreError::Unauthorized(
                    "You can only select a gang you own.".to_string(),
                ));
            }
            conn.execute(
                "INSERT INTO user_preferences (user_id, current_gang_id) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET
                    current_gang_id = excluded.current_gang_id",
                params![user_id, gang_id],
            )?;
            Ok(gang)
        })
    }
}
