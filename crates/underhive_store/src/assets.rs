//! Gang assets: territories, hangers-on, skills, equipment, captives.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::debug;
use underhive_economy::validate_formula;
use underhive_shared::types::{AssetId, AssetType, CampaignId, GangId};

use crate::error::{StoreError, StoreResult};
use crate::gangs::require_gang;
use crate::{now_timestamp, Store};

/// An asset row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    /// Row id.
    pub id: AssetId,
    /// Holding gang.
    pub gang_id: GangId,
    /// Asset name.
    pub name: String,
    /// Kind of asset.
    pub asset_type: AssetType,
    /// Fixed credit value.
    pub static_value: Option<i64>,
    /// Dice formula for income or value.
    pub roll_formula: Option<String>,
    /// Used up.
    pub is_consumed: bool,
    /// Marked for sale at the next pay day.
    pub should_sell: bool,
    /// Free-text note.
    pub note: Option<String>,
    /// UTC creation time.
    pub timestamp: String,
}

impl Asset {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let asset_type: String = row.get("asset_type")?;
        let asset_type = asset_type.parse::<AssetType>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;
        Ok(Self {
            id: row.get("id")?,
            gang_id: row.get("gang_id")?,
            name: row.get("name")?,
            asset_type,
            static_value: row.get("static_value")?,
            roll_formula: row.get("roll_formula")?,
            is_consumed: row.get("is_consumed")?,
            should_sell: row.get("should_sell")?,
            note: row.get("note")?,
            timestamp: row.get("timestamp")?,
        })
    }
}

/// An asset listed across a campaign, with its gang's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignAsset {
    /// The asset.
    pub asset: Asset,
    /// Name of the holding gang.
    pub gang_name: String,
}

/// Input for [`Store::add_asset`].
#[derive(Debug, Clone)]
pub struct NewAsset {
    /// Asset name.
    pub name: String,
    /// Kind of asset.
    pub asset_type: AssetType,
    /// Fixed credit value.
    pub static_value: Option<i64>,
    /// Dice formula, validated before insert.
    pub roll_formula: Option<String>,
    /// Free-text note.
    pub note: Option<String>,
    /// Marked for sale.
    pub should_sell: bool,
    /// Used up.
    pub is_consumed: bool,
}

impl NewAsset {
    /// A plain asset with no value, formula or flags.
    #[must_use]
    pub fn new(name: impl Into<String>, asset_type: AssetType) -> Self {
        Self {
            name: name.into(),
            asset_type,
            static_value: None,
            roll_formula: None,
            note: None,
            should_sell: false,
            is_consumed: false,
        }
    }
}

const ASSET_COLUMNS: &str = "a.id, a.gang_id, a.name, a.asset_type, a.static_value, \
     a.roll_formula, a.is_consumed, a.should_sell, a.note, a.timestamp";

pub(crate) fn get_asset(conn: &Connection, id: AssetId) -> StoreResult<Option<Asset>> {
    let asset = conn
        .query_row(
            &format!("SELECT {ASSET_COLUMNS} FROM gang_assets a WHERE a.id = ?1"),
            params![id],
            Asset::from_row,
        )
        .optional()?;
    Ok(asset)
}

/// The asset, if `gang_id` holds it.
fn require_gang_asset(conn: &Connection, gang_id: GangId, id: AssetId) -> StoreResult<Asset> {
    get_asset(conn, id)?
        .filter(|asset| asset.gang_id == gang_id)
        .ok_or_else(|| StoreError::not_found("Asset", id))
}

impl Store {
    /// Give a gang a new asset.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] for a blank name or a roll formula
    /// that does not parse, and [`StoreError::NotFound`] for an unknown gang.
    pub fn add_asset(&self, gang_id: GangId, new: NewAsset) -> StoreResult<Asset> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(StoreError::Invalid("Asset name cannot be empty.".to_string()));
        }
        let roll_formula = new
            .roll_formula
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        if let Some(formula) = &roll_formula {
            validate_formula(formula)
                .map_err(|e| StoreError::Invalid(format!("Invalid roll formula: {e}")))?;
        }

        self.with_conn(|conn| {
            require_gang(conn, gang_id)?;
            let timestamp = now_timestamp();
            conn.execute(
                "INSERT INTO gang_assets (gang_id, name, asset_type, static_value, roll_formula,
                                          is_consumed, should_sell, note, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    gang_id,
                    name,
                    new.asset_type.as_str(),
                    new.static_value,
                    roll_formula,
                    new.is_consumed,
                    new.should_sell,
                    new.note,
                    timestamp,
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!(asset_id = id, gang_id, "Added asset");
            Ok(Asset {
                id,
                gang_id,
                name,
                asset_type: new.asset_type,
                static_value: new.static_value,
                roll_formula,
                is_consumed: new.is_consumed,
                should_sell: new.should_sell,
                note: new.note,
                timestamp,
            })
        })
    }

    /// Look up one asset.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on database failure.
    pub fn asset(&self, id: AssetId) -> StoreResult<Option<Asset>> {
        self.with_conn(|conn| get_asset(conn, id))
    }

    /// Assets held by a gang, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on database failure.
    pub fn list_assets(&self, gang_id: GangId) -> StoreResult<Vec<Asset>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ASSET_COLUMNS} FROM gang_assets a WHERE a.gang_id = ?1 ORDER BY a.id"
            ))?;
            let assets = stmt
                .query_map(params![gang_id], Asset::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(assets)
        })
    }

    /// Every asset in a campaign, grouped by gang.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on database failure.
    pub fn list_campaign_assets(&self, campaign_id: CampaignId) -> StoreResult<Vec<CampaignAsset>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ASSET_COLUMNS}, g.gang_name
                 FROM gang_assets a JOIN gangs g ON g.id = a.gang_id
                 WHERE g.campaign_id = ?1 ORDER BY g.id, a.id"
            ))?;
            let assets = stmt
                .query_map(params![campaign_id], |row| {
                    Ok(CampaignAsset {
                        asset: Asset::from_row(row)?,
                        gang_name: row.get("gang_name")?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(assets)
        })
    }

    /// Remove an asset from the gang holding it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `gang_id` does not hold the asset.
    pub fn remove_asset(&self, gang_id: GangId, asset_id: AssetId) -> StoreResult<Asset> {
        self.with_tx(|tx| {
            let asset = require_gang_asset(tx, gang_id, asset_id)?;
            tx.execute("DELETE FROM gang_assets WHERE id = ?1", params![asset_id])?;
            debug!(asset_id, gang_id, "Removed asset");
            Ok(asset)
        })
    }

    /// Mark an asset to be sold at the next pay day.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `gang_id` does not hold the asset.
    pub fn mark_asset_for_sale(&self, gang_id: GangId, asset_id: AssetId) -> StoreResult<Asset> {
        self.with_tx(|tx| {
            let mut asset = require_gang_asset(tx, gang_id, asset_id)?;
            tx.execute(
                "UPDATE gang_assets SET should_sell = 1 WHERE id = ?1",
                params![asset_id],
            )?;
            asset.should_sell = true;
            Ok(asset)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gangs::NewGang;

    fn setup() -> (Store, CampaignId, GangId) {
        let store = Store::open_in_memory().unwrap();
        let campaign = store.create_campaign("Dust Falls", "u1", "g1").unwrap();
        let gang = store
            .register_gang(NewGang {
                user_id: "u1".to_string(),
                campaign_id: campaign.id,
                name: "Iron Skulls".to_string(),
                gang_type: "Goliath".to_string(),
                ..NewGang::default()
            })
            .unwrap();
        (store, campaign.id, gang.id)
    }

    #[test]
    fn test_add_and_list() {
        let (store, campaign_id, gang_id) = setup();
        let mut new = NewAsset::new("Old Ruins", AssetType::Territory);
        new.roll_formula = Some("D3x10".to_string());
        let asset = store.add_asset(gang_id, new).unwrap();

        assert_eq!(store.list_assets(gang_id).unwrap(), vec![asset.clone()]);
        let across = store.list_campaign_assets(campaign_id).unwrap();
        assert_eq!(across[0].gang_name, "Iron Skulls");
        assert_eq!(across[0].asset.asset_type, AssetType::Territory);
    }

    #[test]
    fn test_bad_formula_rejected() {
        let (store, _, gang_id) = setup();
        let mut new = NewAsset::new("Slag Furnace", AssetType::Territory);
        new.roll_formula = Some("2d6 ^ 2".to_string());
        assert!(matches!(store.add_asset(gang_id, new), Err(StoreError::Invalid(_))));
    }

    #[test]
    fn test_remove_checks_holder() {
        let (store, _, gang_id) = setup();
        let asset = store
            .add_asset(gang_id, NewAsset::new("Ratskin Scout", AssetType::HangerOn))
            .unwrap();

        assert!(matches!(
            store.remove_asset(gang_id + 1, asset.id),
            Err(StoreError::NotFound { .. })
        ));
        store.remove_asset(gang_id, asset.id).unwrap();
        assert!(store.asset(asset.id).unwrap().is_none());
    }

    #[test]
    fn test_mark_for_sale() {
        let (store, _, gang_id) = setup();
        let asset = store
            .add_asset(gang_id, NewAsset::new("Lasgun", AssetType::Equipment))
            .unwrap();
        let sold = store.mark_asset_for_sale(gang_id, asset.id).unwrap();
        assert!(sold.should_sell);
        assert!(store.asset(asset.id).unwrap().unwrap().should_sell);
    }
}
