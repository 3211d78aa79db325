//! SQLite journal. Each operation opens the file, writes, commits and closes,
//! so outside readers see a consistent table between writes.
use async_trait::async_trait;
use bitcoin::Txid;
use rusqlite::{params, Connection};
use std::path::PathBuf;
use tokio::task;

use super::{JournalRecord, Ledger};
use crate::error::LedgerError;

/// Table layout:
///   journal(id INTEGER PK AUTOINCREMENT, bloco INTEGER, txid TEXT,
///           mensagem TEXT, timestamp DATETIME DEFAULT CURRENT_TIMESTAMP)
const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS journal (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        bloco     INTEGER NOT NULL,
        txid      TEXT    NOT NULL,
        mensagem  TEXT    NOT NULL,
        timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Journal stored in a SQLite file.
pub struct SqliteLedger {
    path: PathBuf,
}

impl SqliteLedger {
    /// Creates/initializes the SQLite file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let conn = Connection::open(&path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            "#,
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { path })
    }

    /// Location of the database file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    // schema creation is idempotent, so every operation may run it
    fn open(path: &PathBuf) -> Result<Connection, LedgerError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn append(&self, height: u32, txid: Txid, message: &str) -> Result<i64, LedgerError> {
        let path = self.path.clone();
        let message = message.to_owned();
        let id = task::spawn_blocking(move || -> Result<i64, LedgerError> {
            let mut conn = Self::open(&path)?;
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO journal (bloco, txid, mensagem) VALUES (?1, ?2, ?3)",
                params![height, txid.to_string(), message],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(id)
        })
        .await??;
        tracing::debug!(id, height, %txid, "journal record stored");
        Ok(id)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<JournalRecord>, LedgerError> {
        let path = self.path.clone();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        task::spawn_blocking(move || -> Result<Vec<JournalRecord>, LedgerError> {
            let conn = Self::open(&path)?;
            let mut stmt = conn.prepare(
                "SELECT id, bloco, txid, mensagem, timestamp
                 FROM journal ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map(params![limit], |row| {
                    Ok(JournalRecord {
                        id: row.get(0)?,
                        block_height: row.get(1)?,
                        txid: row.get(2)?,
                        message: row.get(3)?,
                        recorded_at: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await?
    }
}
