//! # Underhive Store
//!
//! SQLite persistence for campaigns, gangs, the credit ledger, assets,
//! market snapshots, trade offers and per-user preferences.
//!
//! ## Tables
//!
//! - `campaigns` - one play group per row, scoped to a Discord guild
//! - `gangs` - registered gangs with their registration stat snapshot
//! - `gang_transactions` - append-only signed credit changes
//! - `gang_assets` - territories, hangers-on, skills, equipment, captives
//! - `campaign_market` - latest trading post / secret stash per campaign
//! - `trade_offers` - pending and accepted trades
//! - `user_preferences` - current campaign and gang per user
//!
//! ## Concurrency
//!
//! The [`Store`] owns a single connection behind a mutex. Callers on an async
//! runtime run store calls on a blocking thread. Operations that read and
//! then write (guarded debits, trade acceptance, gang deletion) take an
//! `IMMEDIATE` transaction so the check and the write cannot interleave.

#![deny(unsafe_code)]

pub mod assets;
pub mod campaigns;
pub mod error;
pub mod gangs;
pub mod ledger;
pub mod market;
pub mod preferences;
pub mod schema;
pub mod trades;

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info};

pub use assets::{Asset, CampaignAsset, NewAsset};
pub use campaigns::Campaign;
pub use error::{StoreError, StoreResult};
pub use gangs::{Gang, GangStats, NewGang, UserGang};
pub use ledger::Transaction as LedgerTransaction;
pub use market::MarketSnapshot;
pub use preferences::UserPreferences;
pub use trades::{NewTradeOffer, TradeOffer, TradeOutcome};

/// SQLite database for one bot instance.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open or create the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] if the file cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        info!("Opening SQLite database at {:?}", path);

        let conn = Connection::open(path)?;
        // WAL for concurrent readers
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::with_schema(conn)
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] if the schema cannot be created.
    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("Opening in-memory SQLite database");
        Self::with_schema(Connection::open_in_memory()?)
    }

    fn with_schema(conn: Connection) -> StoreResult<Self> {
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` with shared access to the connection.
    ///
    /// # Errors
    ///
    /// Propagates whatever `f` returns.
    pub fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Run `f` inside an `IMMEDIATE` transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Propagates whatever `f` returns, or the commit failure.
    pub fn with_tx<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> StoreResult<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Snapshot the whole database into a standalone SQLite file image.
    ///
    /// Uses `VACUUM INTO`, so the copy is consistent even while the live
    /// database is in WAL mode.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] or [`StoreError::Sqlite`] on failure.
    pub fn export_bytes(&self) -> StoreResult<Vec<u8>> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("underhive-export.db");
        let target_str = target
            .to_str()
            .ok_or_else(|| StoreError::Invalid("export path is not valid UTF-8".to_string()))?;

        self.with_conn(|conn| {
            conn.execute("VACUUM INTO ?1", [target_str])?;
            Ok(())
        })?;

        let bytes = std::fs::read(&target)?;
        info!(bytes = bytes.len(), "Exported database snapshot");
        Ok(bytes)
    }
}

/// Current UTC time in SQLite's `CURRENT_TIMESTAMP` format.
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Column format for `timestamp` values.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses a stored `timestamp` column as UTC.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
