//! Trade offers between two gangs of the same campaign.
//!
//! ```text
//! create_offer ──▶ pending ──accept_offer──▶ accepted
//! ```
//!
//! Acceptance runs in one `IMMEDIATE` transaction: assets change hands,
//! credits move as ledger rows on both sides, the status flips. Any failure
//! (including an overdraft on either side) rolls all of it back.

use std::collections::BTreeSet;

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, info};
use underhive_economy::{normalize_asset_list, CreditMovement, TransferPlan};
use underhive_shared::types::{AssetId, CampaignId, GangId, OfferId, OfferStatus};

use crate::error::{StoreError, StoreResult};
use crate::gangs::require_gang;
use crate::ledger::{guarded_insert, insert_transaction};
use crate::Store;

/// A trade offer row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeOffer {
    /// Row id.
    pub id: OfferId,
    /// Campaign both gangs play in.
    pub campaign_id: CampaignId,
    /// Offering gang.
    pub from_gang_id: GangId,
    /// Receiving gang.
    pub to_gang_id: GangId,
    /// Comma-joined asset names offered.
    pub offered_assets: String,
    /// Credits offered.
    pub offered_credits: i64,
    /// Comma-joined asset names requested.
    pub requested_assets: String,
    /// Credits requested.
    pub requested_credits: i64,
    /// Lifecycle state.
    pub status: OfferStatus,
}

impl TradeOffer {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let status: String = row.get("status")?;
        let status = status.parse::<OfferStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Self {
            id: row.get("id")?,
            campaign_id: row.get("campaign_id")?,
            from_gang_id: row.get("from_gang_id")?,
            to_gang_id: row.get("to_gang_id")?,
            offered_assets: row.get("offered_assets")?,
            offered_credits: row.get("offered_credits")?,
            requested_assets: row.get("requested_assets")?,
            requested_credits: row.get("requested_credits")?,
            status,
        })
    }

    /// The moves accepting this offer would make.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if the stored offer is malformed.
    pub fn plan(&self) -> StoreResult<TransferPlan> {
        TransferPlan::new(
            self.from_gang_id,
            self.to_gang_id,
            &self.offered_assets,
            self.offered_credits,
            &self.requested_assets,
            self.requested_credits,
        )
        .map_err(|e| StoreError::Invalid(e.to_string()))
    }
}

/// Input for [`Store::create_offer`].
#[derive(Debug, Clone, Default)]
pub struct NewTradeOffer {
    /// Campaign of both gangs.
    pub campaign_id: CampaignId,
    /// Offering gang.
    pub from_gang_id: GangId,
    /// Receiving gang.
    pub to_gang_id: GangId,
    /// Comma-separated asset names offered.
    pub offered_assets: String,
    /// Credits offered.
    pub offered_credits: i64,
    /// Comma-separated asset names requested.
    pub requested_assets: String,
    /// Credits requested.
    pub requested_credits: i64,
}

/// What an accepted offer actually moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeOutcome {
    /// The offer, now accepted.
    pub offer: TradeOffer,
    /// Asset rows that changed hands.
    pub assets_transferred: usize,
    /// Credits that changed hands.
    #[serde(skip)]
    pub credit_movements: Vec<CreditMovement>,
}

const OFFER_COLUMNS: &str = "id, campaign_id, from_gang_id, to_gang_id, offered_assets, \
     offered_credits, requested_assets, requested_credits, status";

fn get_offer(conn: &Connection, id: OfferId) -> StoreResult<Option<TradeOffer>> {
    let offer = conn
        .query_row(
            &format!("SELECT {OFFER_COLUMNS} FROM trade_offers WHERE id = ?1"),
            params![id],
            TradeOffer::from_row,
        )
        .optional()?;
    Ok(offer)
}

/// Ids of the assets of `gang` matching any of `names` (by trimmed name or type label).
fn matching_asset_ids(conn: &Connection, gang: GangId, names: &[String]) -> StoreResult<BTreeSet<AssetId>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM gang_assets
         WHERE gang_id = ?1 AND (TRIM(name) = ?2 OR asset_type = ?2)",
    )?;
    let mut ids = BTreeSet::new();
    for name in names {
        for id in stmt.query_map(params![gang, name], |row| row.get::<_, AssetId>(0))? {
            ids.insert(id?);
        }
    }
    Ok(ids)
}

fn reassign_assets(conn: &Connection, ids: &BTreeSet<AssetId>, to: GangId) -> StoreResult<()> {
    let mut stmt = conn.prepare("UPDATE gang_assets SET gang_id = ?1 WHERE id = ?2")?;
    for id in ids {
        stmt.execute(params![to, id])?;
    }
    Ok(())
}

impl Store {
    /// Record a pending offer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] for negative credits, a self-trade or
    /// a gang outside the campaign, and [`StoreError::NotFound`] for an
    /// unknown gang.
    pub fn create_offer(&self, new: NewTradeOffer) -> StoreResult<TradeOffer> {
        // validates amounts and distinct gangs
        TransferPlan::new(
            new.from_gang_id,
            new.to_gang_id,
            &new.offered_assets,
            new.offered_credits,
            &new.requested_assets,
            new.requested_credits,
        )
        .map_err(|e| StoreError::Invalid(e.to_string()))?;

        let offered_assets = normalize_asset_list(&new.offered_assets);
        let requested_assets = normalize_asset_list(&new.requested_assets);

        self.with_conn(|conn| {
            for gang_id in [new.from_gang_id, new.to_gang_id] {
                let gang = require_gang(conn, gang_id)?;
                if gang.campaign_id != new.campaign_id {
                    return Err(StoreError::Invalid(format!(
                        "Gang {gang_id} is not part of campaign {}.",
                        new.campaign_id
                    )));
                }
            }

            conn.execute(
                "INSERT INTO trade_offers (campaign_id, from_gang_id, to_gang_id, offered_assets,
                                           offered_credits, requested_assets, requested_credits, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    new.campaign_id,
                    new.from_gang_id,
                    new.to_gang_id,
                    offered_assets,
                    new.offered_credits,
                    requested_assets,
                    new.requested_credits,
                    OfferStatus::Pending.as_str(),
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!(offer_id = id, from = new.from_gang_id, to = new.to_gang_id, "Created trade offer");

            Ok(TradeOffer {
                id,
                campaign_id: new.campaign_id,
                from_gang_id: new.from_gang_id,
                to_gang_id: new.to_gang_id,
                offered_assets,
                offered_credits: new.offered_credits,
                requested_assets,
                requested_credits: new.requested_credits,
                status: OfferStatus::Pending,
            })
        })
    }

    /// Look up one offer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on database failure.
    pub fn offer(&self, id: OfferId) -> StoreResult<Option<TradeOffer>> {
        self.with_conn(|conn| get_offer(conn, id))
    }

    /// Every offer in a campaign, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on database failure.
    pub fn list_offers(&self, campaign_id: CampaignId) -> StoreResult<Vec<TradeOffer>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {OFFER_COLUMNS} FROM trade_offers WHERE campaign_id = ?1 ORDER BY id"
            ))?;
            let offers = stmt
                .query_map(params![campaign_id], TradeOffer::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(offers)
        })
    }

    /// Accept a pending offer on behalf of `user_id`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] for an unknown offer
    /// - [`StoreError::AlreadyResolved`] if it is no longer pending
    /// - [`StoreError::Unauthorized`] unless `user_id` owns the receiving gang
    /// - [`StoreError::InsufficientCredits`] if either side cannot pay
    ///
    /// Nothing is changed on error.
    pub fn accept_offer(&self, offer_id: OfferId, user_id: &str) -> StoreResult<TradeOutcome> {
        self.with_tx(|tx| {
            let mut offer =
                get_offer(tx, offer_id)?.ok_or_else(|| StoreError::not_found("Trade offer", offer_id))?;
            if !offer.status.is_open() {
                return Err(StoreError::AlreadyResolved(offer_id));
            }

            let to_gang = require_gang(tx, offer.to_gang_id)?;
            if to_gang.user_id != user_id {
                return Err(StoreError::Unauthorized(
                    "You do not own the target gang and cannot accept this trade.".to_string(),
                ));
            }
            let from_gang = require_gang(tx, offer.from_gang_id)?;

            let plan = offer.plan()?;
            // both sides are resolved before anything moves
            let offered = matching_asset_ids(tx, plan.from_gang, &plan.offered_assets)?;
            let requested = matching_asset_ids(tx, plan.to_gang, &plan.requested_assets)?;
            reassign_assets(tx, &offered, plan.to_gang)?;
            reassign_assets(tx, &requested, plan.from_gang)?;
            let assets_transferred = offered.len() + requested.len();

            let movements = plan.credit_movements();
            for movement in &movements {
                let (payer, payee) = if movement.from == from_gang.id {
                    (&from_gang, &to_gang)
                } else {
                    (&to_gang, &from_gang)
                };
                guarded_insert(
                    tx,
                    movement.from,
                    -movement.amount,
                    &format!("Trade #{offer_id}: paid to {}", payee.name),
                    user_id,
                )?;
                insert_transaction(
                    tx,
                    movement.to,
                    movement.amount,
                    &format!("Trade #{offer_id}: received from {}", payer.name),
                    user_id,
                )?;
            }

            tx.execute(
                "UPDATE trade_offers SET status = ?1 WHERE id = ?2",
                params![OfferStatus::Accepted.as_str(), offer_id],
            )?;
            offer.status = OfferStatus::Accepted;

            info!(offer_id, assets_transferred, "Trade offer accepted");
            Ok(TradeOutcome {
                offer,
                assets_transferred,
                credit_movements: movements,
            })
        })
    }
}
