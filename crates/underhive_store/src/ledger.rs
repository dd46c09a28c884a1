//! Gang credit ledger.
//!
//! Rows are only ever inserted. A balance is `SUM(change)`; history pages are
//! annotated through [`underhive_economy::HistoryPage::assemble`].

use rusqlite::{params, Connection, Row};
use serde::Serialize;
use tracing::debug;
use underhive_economy::ledger::{check_debit, delta_to};
use underhive_economy::{HistoryPage, LedgerRow, PageRequest};
use underhive_shared::types::GangId;

use crate::error::{StoreError, StoreResult};
use crate::gangs::require_gang;
use crate::{now_timestamp, Store};

/// One stored credit change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// Row id.
    pub id: i64,
    /// Gang whose balance changed.
    pub gang_id: GangId,
    /// Signed credit delta.
    pub change: i64,
    /// Free-text reason.
    pub reason: Option<String>,
    /// User who caused the change.
    pub actor: Option<String>,
    /// UTC, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
}

impl Transaction {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            gang_id: row.get("gang_id")?,
            change: row.get("change")?,
            reason: row.get("reason")?,
            actor: row.get("user_id")?,
            timestamp: row.get("timestamp")?,
        })
    }
}

impl LedgerRow for Transaction {
    fn change(&self) -> i64 {
        self.change
    }
}

pub(crate) fn balance_of(conn: &Connection, gang_id: GangId) -> StoreResult<i64> {
    let balance = conn.query_row(
        "SELECT COALESCE(SUM(change), 0) FROM gang_transactions WHERE gang_id = ?1",
        params![gang_id],
        |row| row.get(0),
    )?;
    Ok(balance)
}

pub(crate) fn insert_transaction(
    conn: &Connection,
    gang_id: GangId,
    change: i64,
    reason: &str,
    actor: &str,
) -> StoreResult<Transaction> {
    let timestamp = now_timestamp();
    conn.execute(
        "INSERT INTO gang_transactions (gang_id, change, reason, user_id, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![gang_id, change, reason, actor, timestamp],
    )?;
    Ok(Transaction {
        id: conn.last_insert_rowid(),
        gang_id,
        change,
        reason: Some(reason.to_string()),
        actor: Some(actor.to_string()),
        timestamp,
    })
}

/// Appends `change` only if the balance stays at or above zero.
pub(crate) fn guarded_insert(
    conn: &Connection,
    gang_id: GangId,
    change: i64,
    reason: &str,
    actor: &str,
) -> StoreResult<(Transaction, i64)> {
    let balance = balance_of(conn, gang_id)?;
    check_debit(balance, change).map_err(|e| StoreError::from_economy(gang_id, e))?;
    let tx = insert_transaction(conn, gang_id, change, reason, actor)?;
    Ok((tx, balance + change))
}

impl Store {
    /// Current balance of a gang (0 with no history).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on database failure.
    pub fn balance(&self, gang_id: GangId) -> StoreResult<i64> {
        self.with_conn(|conn| balance_of(conn, gang_id))
    }

    /// Appends a transaction without any balance check.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on database failure.
    pub fn append_transaction(
        &self,
        gang_id: GangId,
        change: i64,
        reason: &str,
        actor: &str,
    ) -> StoreResult<Transaction> {
        self.with_conn(|conn| insert_transaction(conn, gang_id, change, reason, actor))
    }

    /// Adds `change` to a gang's balance, refusing overdrafts.
    ///
    /// Returns the written row and the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown gang and
    /// [`StoreError::InsufficientCredits`] when a debit exceeds the balance.
    /// Nothing is written on error.
    pub fn adjust_credits(
        &self,
        gang_id: GangId,
        change: i64,
        reason: &str,
        actor: &str,
    ) -> StoreResult<(Transaction, i64)> {
        self.with_tx(|tx| {
            require_gang(tx, gang_id)?;
            let result = guarded_insert(tx, gang_id, change, reason, actor)?;
            debug!(gang_id, change, balance = result.1, "Adjusted credits");
            Ok(result)
        })
    }

    /// Sets a gang's balance to exactly `target` by appending the difference.
    ///
    /// A zero difference is still recorded. Returns the written row and the
    /// previous balance.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] for a negative target and
    /// [`StoreError::NotFound`] for an unknown gang.
    pub fn set_credits(
        &self,
        gang_id: GangId,
        target: i64,
        reason: &str,
        actor: &str,
    ) -> StoreResult<(Transaction, i64)> {
        self.with_tx(|tx| {
            require_gang(tx, gang_id)?;
            let previous = balance_of(tx, gang_id)?;
            let delta = delta_to(previous, target).map_err(|e| StoreError::from_economy(gang_id, e))?;
            let row = insert_transaction(tx, gang_id, delta, reason, actor)?;
            debug!(gang_id, previous, target, "Set credits");
            Ok((row, previous))
        })
    }

    /// One page of a gang's history, newest first, with running balances.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] on database failure.
    pub fn credit_history(
        &self,
        gang_id: GangId,
        request: PageRequest,
    ) -> StoreResult<HistoryPage<Transaction>> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM gang_transactions WHERE gang_id = ?1",
                params![gang_id],
                |row| row.get(0),
            )?;
            let total = u64::try_from(total).unwrap_or(0);
            if total == 0 {
                return Ok(HistoryPage::empty(request));
            }

            let window = request.window(total);
            let offset = i64::try_from(window.offset).unwrap_or(i64::MAX);
            let current = balance_of(conn, gang_id)?;

            let newer_sum: i64 = conn.query_row(
                "SELECT COALESCE(SUM(change), 0) FROM (
                    SELECT change FROM gang_transactions WHERE gang_id = ?1
                    ORDER BY timestamp DESC, id DESC LIMIT ?2
                 )",
                params![gang_id, offset],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(
                "SELECT id, gang_id, change, reason, user_id, timestamp
                 FROM gang_transactions WHERE gang_id = ?1
                 ORDER BY timestamp DESC, id DESC LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt
                .query_map(
                    params![gang_id, i64::from(window.page_size), offset],
                    Transaction::from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;

            HistoryPage::assemble(window, total, current, newer_sum, rows)
                .map_err(|e| StoreError::from_economy(gang_id, e))
        })
    }
}
