// Copyright (c) 2024 The Botho Foundation

//! SQLite ledger of exchanged transactions.

use asset_bridge_core::ExchangeOutcome;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};
use uuid::Uuid;

use crate::error::LedgerError;

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedRecord {
    pub txid: String,
    pub run_id: Uuid,
    /// `None` while the claiming run has not finished
    pub outcome: Option<ExchangeOutcome>,
    pub claimed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Remembers which incoming transactions have been claimed for an exchange.
pub trait ProcessedLedger: Send + Sync {
    /// Claim `txid` for the run `run_id`.
    ///
    /// Returns `None` if the claim succeeded, or the existing record if some
    /// run already holds it.
    fn claim(&self, txid: &str, run_id: &Uuid) -> Result<Option<ProcessedRecord>, LedgerError>;

    /// Store the outcome of the run that claimed `txid`.
    fn complete(&self, txid: &str, outcome: &ExchangeOutcome) -> Result<(), LedgerError>;

    fn get(&self, txid: &str) -> Result<Option<ProcessedRecord>, LedgerError>;

    /// Most recently claimed records first.
    fn recent(&self, limit: usize) -> Result<Vec<ProcessedRecord>, LedgerError>;
}

/// Database wrapper for thread-safe access.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations.
    pub fn migrate(&self) -> Result<(), LedgerError> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS processed_transactions (
                txid TEXT PRIMARY KEY,
                run_id TEXT NOT NULL,
                outcome TEXT,
                claimed_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_processed_claimed
                ON processed_transactions(claimed_at);
            "#,
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.conn.lock().map_err(|_| LedgerError::Poisoned)
    }

    fn select(conn: &Connection, txid: &str) -> Result<Option<ProcessedRecord>, LedgerError> {
        let row = conn
            .query_row(
                r#"
                SELECT txid, run_id, outcome, claimed_at, updated_at
                FROM processed_transactions WHERE txid = ?1
                "#,
                params![txid],
                RawRecord::from_row,
            )
            .optional()?;

        row.map(RawRecord::decode).transpose()
    }
}

impl ProcessedLedger for Database {
    fn claim(&self, txid: &str, run_id: &Uuid) -> Result<Option<ProcessedRecord>, LedgerError> {
        let conn = self.lock()?;
        let now = Utc::now().timestamp();

        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO processed_transactions (txid, run_id, outcome, claimed_at, updated_at)
            VALUES (?1, ?2, NULL, ?3, ?3)
            "#,
            params![txid, run_id.to_string(), now],
        )?;

        if inserted == 1 {
            return Ok(None);
        }
        Self::select(&conn, txid)
    }

    fn complete(&self, txid: &str, outcome: &ExchangeOutcome) -> Result<(), LedgerError> {
        let conn = self.lock()?;
        let encoded = serde_json::to_string(outcome)?;

        conn.execute(
            r#"
            UPDATE processed_transactions SET outcome = ?2, updated_at = ?3
            WHERE txid = ?1
            "#,
            params![txid, encoded, Utc::now().timestamp()],
        )?;

        Ok(())
    }

    fn get(&self, txid: &str) -> Result<Option<ProcessedRecord>, LedgerError> {
        let conn = self.lock()?;
        Self::select(&conn, txid)
    }

    fn recent(&self, limit: usize) -> Result<Vec<ProcessedRecord>, LedgerError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT txid, run_id, outcome, claimed_at, updated_at
            FROM processed_transactions
            ORDER BY claimed_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![limit], RawRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(RawRecord::decode).collect()
    }
}

/// Row as stored, before decoding the text columns.
struct RawRecord {
    txid: String,
    run_id: String,
    outcome: Option<String>,
    claimed_at: i64,
    updated_at: i64,
}

impl RawRecord {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            txid: row.get(0)?,
            run_id: row.get(1)?,
            outcome: row.get(2)?,
            claimed_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    fn decode(self) -> Result<ProcessedRecord, LedgerError> {
        let corrupt = |detail: String| LedgerError::Corrupt {
            txid: self.txid.clone(),
            detail,
        };

        let run_id = Uuid::parse_str(&self.run_id).map_err(|e| corrupt(format!("run id: {}", e)))?;
        let outcome = self
            .outcome
            .as_deref()
            .map(serde_json::from_str::<ExchangeOutcome>)
            .transpose()
            .map_err(|e| corrupt(format!("outcome: {}", e)))?;
        let claimed_at = timestamp(self.claimed_at).ok_or_else(|| corrupt("claimed_at".into()))?;
        let updated_at = timestamp(self.updated_at).ok_or_else(|| corrupt("updated_at".into()))?;

        Ok(ProcessedRecord {
            txid: self.txid,
            run_id,
            outcome,
            claimed_at,
            updated_at,
        })
    }
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}
