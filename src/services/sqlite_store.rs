//! SQLite persistence layer for the signal change log.
//!
//! One append-only table, `signals`. Rows are never updated or deleted; a
//! row is written only when a symbol's score, trend or breakout changes.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::services::signals::SignalRepository;
use crate::types::{ScoredSignal, SignalRecord, Trend};

const SELECT_COLUMNS: &str = "SELECT id, symbol, score, trend, rsi, macd, volatility, volume_spike, breakout, created_at
     FROM signals";

/// SQLite store for persisted signals.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SQLite store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("SQLite store initialized");
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("In-memory SQLite store initialized");
        Ok(store)
    }

    /// Lock the connection, taking over a lock poisoned by a panicking thread.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            warn!("Recovering SQLite connection after a panic in another thread");
            poisoned.into_inner()
        })
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS signals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                score INTEGER NOT NULL,
                trend TEXT NOT NULL,
                rsi REAL NOT NULL,
                macd REAL NOT NULL,
                volatility REAL NOT NULL,
                volume_spike REAL NOT NULL,
                breakout INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Latest-row lookups per symbol
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_signals_symbol_created
             ON signals(symbol, created_at DESC)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_signals_created ON signals(created_at DESC)",
            [],
        )?;

        info!("SQLite schema initialized");
        Ok(())
    }

    /// Total number of stored rows.
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM signals", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn query_records(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<SignalRecord>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, row_to_record)?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

impl SignalRepository for SqliteStore {
    fn insert(&self, signal: &ScoredSignal) -> Result<SignalRecord, StoreError> {
        let conn = self.conn();

        conn.execute(
            "INSERT INTO signals
             (symbol, score, trend, rsi, macd, volatility, volume_spike, breakout, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                signal.symbol,
                signal.score,
                signal.trend.as_str(),
                signal.rsi,
                signal.macd,
                signal.volatility,
                signal.volume_spike,
                signal.breakout,
                signal.computed_at.timestamp_millis(),
            ],
        )?;

        Ok(SignalRecord {
            id: conn.last_insert_rowid(),
            symbol: signal.symbol.clone(),
            score: signal.score,
            trend: signal.trend,
            rsi: signal.rsi,
            macd: signal.macd,
            volatility: signal.volatility,
            volume_spike: signal.volume_spike,
            breakout: signal.breakout,
            // Stored precision is milliseconds
            created_at: from_millis(signal.computed_at.timestamp_millis()),
        })
    }

    fn latest_for_symbol(&self, symbol: &str) -> Result<Option<SignalRecord>, StoreError> {
        let sql = format!(
            "{} WHERE symbol = ?1 ORDER BY created_at DESC, id DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let mut records = self.query_records(&sql, params![symbol])?;
        Ok(records.pop())
    }

    fn latest(&self, limit: usize) -> Result<Vec<SignalRecord>, StoreError> {
        let sql = format!("{} ORDER BY created_at DESC, id DESC LIMIT ?1", SELECT_COLUMNS);
        self.query_records(&sql, params![limit as i64])
    }

    fn history(&self, symbol: &str, limit: usize) -> Result<Vec<SignalRecord>, StoreError> {
        let sql = format!(
            "{} WHERE symbol = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
            SELECT_COLUMNS
        );
        self.query_records(&sql, params![symbol, limit as i64])
    }
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<SignalRecord> {
    let trend: String = row.get(3)?;
    Ok(SignalRecord {
        id: row.get(0)?,
        symbol: row.get(1)?,
        score: row.get(2)?,
        trend: Trend::from_label(&trend),
        rsi: row.get(4)?,
        macd: row.get(5)?,
        volatility: row.get(6)?,
        volume_spike: row.get(7)?,
        breakout: row.get(8)?,
        created_at: from_millis(row.get(9)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn signal(symbol: &str, score: u8, at: DateTime<Utc>) -> ScoredSignal {
        ScoredSignal {
            symbol: symbol.to_string(),
            score,
            trend: Trend::Uptrend,
            rsi: 61.25,
            macd: 0.1234,
            volatility: 0.0187,
            volume_spike: 1.73,
            breakout: true,
            computed_at: at,
        }
    }

    #[test]
    fn test_insert_and_read_back() {
        let store = SqliteStore::new_in_memory().unwrap();
        let at = Utc::now();

        let inserted = store.insert(&signal("PETR4.SA", 70, at)).unwrap();
        let loaded = store.latest_for_symbol("PETR4.SA").unwrap().unwrap();

        assert_eq!(loaded, inserted);
        assert_eq!(loaded.score, 70);
        assert_eq!(loaded.trend, Trend::Uptrend);
        assert!(loaded.breakout);
        assert_eq!(loaded.volume_spike, 1.73);
        assert_eq!(loaded.created_at.timestamp_millis(), at.timestamp_millis());
    }

    #[test]
    fn test_latest_for_unknown_symbol() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert!(store.latest_for_symbol("XXXX3.SA").unwrap().is_none());
    }

    #[test]
    fn test_latest_for_symbol_orders_by_creation_time() {
        let store = SqliteStore::new_in_memory().unwrap();
        let now = Utc::now();

        store.insert(&signal("VALE3.SA", 80, now)).unwrap();
        // Inserted later but created earlier
        store.insert(&signal("VALE3.SA", 20, now - Duration::minutes(5))).unwrap();

        let latest = store.latest_for_symbol("VALE3.SA").unwrap().unwrap();
        assert_eq!(latest.score, 80);
    }

    #[test]
    fn test_same_timestamp_prefers_last_insert() {
        let store = SqliteStore::new_in_memory().unwrap();
        let now = Utc::now();

        store.insert(&signal("BBAS3.SA", 10, now)).unwrap();
        store.insert(&signal("BBAS3.SA", 30, now)).unwrap();

        assert_eq!(store.latest_for_symbol("BBAS3.SA").unwrap().unwrap().score, 30);
    }

    #[test]
    fn test_latest_across_symbols() {
        let store = SqliteStore::new_in_memory().unwrap();
        let now = Utc::now();

        for (i, symbol) in ["PETR4.SA", "VALE3.SA", "ITUB4.SA"].iter().enumerate() {
            store
                .insert(&signal(symbol, 50, now + Duration::seconds(i as i64)))
                .unwrap();
        }

        let latest = store.latest(2).unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].symbol, "ITUB4.SA");
        assert_eq!(latest[1].symbol, "VALE3.SA");
    }

    #[test]
    fn test_history_is_per_symbol() {
        let store = SqliteStore::new_in_memory().unwrap();
        let now = Utc::now();

        for i in 0..5 {
            store
                .insert(&signal("WEGE3.SA", 10 * i, now + Duration::seconds(i as i64)))
                .unwrap();
        }
        store.insert(&signal("ABEV3.SA", 90, now)).unwrap();

        let history = store.history("WEGE3.SA", 100).unwrap();
        assert_eq!(history.len(), 5);
        assert!(history.iter().all(|r| r.symbol == "WEGE3.SA"));
        assert_eq!(history[0].score, 40);

        assert_eq!(store.history("WEGE3.SA", 2).unwrap().len(), 2);
        assert_eq!(store.count().unwrap(), 6);
    }

    #[test]
    fn test_store_usable_after_panic_while_locked() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.insert(&signal("GGBR4.SA", 35, Utc::now())).unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.conn.lock().unwrap();
            panic!("writer panicked");
        }));
        assert!(result.is_err());
        assert!(store.conn.is_poisoned());

        store.insert(&signal("GGBR4.SA", 60, Utc::now())).unwrap();
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.latest_for_symbol("GGBR4.SA").unwrap().unwrap().score, 60);
    }

    #[test]
    fn test_file_store_persists_between_opens() {
        let path = std::env::temp_dir().join(format!(
            "stockrank-test-{}-{}.db",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));

        {
            let store = SqliteStore::new(&path).unwrap();
            store.insert(&signal("SUZB3.SA", 55, Utc::now())).unwrap();
        }

        let reopened = SqliteStore::new(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);

        drop(reopened);
        let _ = std::fs::remove_file(&path);
    }
}
