//! Database schema definitions

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::error::StoreResult;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> StoreResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new database schema v{}", SCHEMA_VERSION);
        conn.execute_batch(TABLES_SCHEMA)?;
        conn.execute_batch(INDEXES_SCHEMA)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else {
        info!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
pub fn get_schema_version(conn: &Connection) -> StoreResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        [],
    )?;

    let version: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(version.and_then(|v| v.parse().ok()).unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> StoreResult<()> {
    conn.execute(
        "REPLACE INTO meta (key, value) VALUES ('schema_version', ?1)",
        params![version.to_string()],
    )?;
    Ok(())
}

const TABLES_SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS campaigns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    created_by TEXT NOT NULL,
    server_id TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS gangs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    campaign_id INTEGER NOT NULL,
    yaktribe_url TEXT,
    gang_name TEXT NOT NULL,
    gang_type TEXT NOT NULL,
    credits INTEGER NOT NULL DEFAULT 0,
    meat INTEGER NOT NULL DEFAULT 0,
    gang_rating INTEGER NOT NULL DEFAULT 0,
    reputation INTEGER NOT NULL DEFAULT 0,
    wealth INTEGER NOT NULL DEFAULT 0,
    gangers TEXT NOT NULL DEFAULT '[]',
    FOREIGN KEY (campaign_id) REFERENCES campaigns (id)
);

CREATE TABLE IF NOT EXISTS gang_transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    gang_id INTEGER NOT NULL,
    change INTEGER NOT NULL,
    reason TEXT,
    user_id TEXT,
    timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (gang_id) REFERENCES gangs (id)
);

CREATE TABLE IF NOT EXISTS gang_assets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    gang_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    asset_type TEXT NOT NULL CHECK (asset_type IN
        ('Territory', 'Hanger-On', 'Skill', 'Equipment', 'Captive', 'Other')),
    static_value INTEGER,
    roll_formula TEXT,
    is_consumed INTEGER NOT NULL DEFAULT 0,
    should_sell INTEGER NOT NULL DEFAULT 0,
    note TEXT,
    timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (gang_id) REFERENCES gangs (id)
);

CREATE TABLE IF NOT EXISTS campaign_market (
    campaign_id INTEGER PRIMARY KEY,
    generated_at TEXT NOT NULL,
    trading_post TEXT NOT NULL,
    secret_stash TEXT NOT NULL,
    FOREIGN KEY (campaign_id) REFERENCES campaigns (id)
);

CREATE TABLE IF NOT EXISTS trade_offers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_gang_id INTEGER NOT NULL,
    to_gang_id INTEGER NOT NULL,
    campaign_id INTEGER NOT NULL,
    offered_assets TEXT NOT NULL DEFAULT '',
    offered_credits INTEGER NOT NULL DEFAULT 0,
    requested_assets TEXT NOT NULL DEFAULT '',
    requested_credits INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'accepted')),
    FOREIGN KEY (from_gang_id) REFERENCES gangs (id),
    FOREIGN KEY (to_gang_id) REFERENCES gangs (id),
    FOREIGN KEY (campaign_id) REFERENCES campaigns (id)
);

CREATE TABLE IF NOT EXISTS user_preferences (
    user_id TEXT PRIMARY KEY,
    current_campaign_id INTEGER,
    current_gang_id INTEGER,
    FOREIGN KEY (current_campaign_id) REFERENCES campaigns (id),
    FOREIGN KEY (current_gang_id) REFERENCES gangs (id)
);
";

const INDEXES_SCHEMA: &str = r"
CREATE INDEX IF NOT EXISTS idx_gang_transactions_gang_ts ON gang_transactions (gang_id, timestamp);
CREATE INDEX IF NOT EXISTS idx_gang_assets_gang_id ON gang_assets (gang_id);
CREATE INDEX IF NOT EXISTS idx_campaign_market_generated_at ON campaign_market (generated_at);
CREATE INDEX IF NOT EXISTS idx_trade_offers_campaign_id ON trade_offers (campaign_id);
CREATE INDEX IF NOT EXISTS idx_trade_offers_to_gang_id ON trade_offers (to_gang_id);
CREATE INDEX IF NOT EXISTS idx_trade_offers_from_gang_id ON trade_offers (from_gang_id);
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_reinit_keeps_existing_rows() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO campaigns (name, created_by, server_id) VALUES ('Dust Falls', 'u1', 'g1')",
            [],
        )
        .unwrap();

        init_schema(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM campaigns", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(get_schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn test_asset_type_is_checked() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let bad = conn.execute(
            "INSERT INTO gang_assets (gang_id, name, asset_type) VALUES (1, 'x', 'Vehicle')",
            [],
        );
        assert!(bad.is_err());
    }
}
