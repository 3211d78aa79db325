//! Append-only journal of tracked messages.
use async_trait::async_trait;
use bitcoin::Txid;
use chrono::NaiveDateTime;

use crate::error::LedgerError;

/// One persisted journal entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalRecord {
    /// Auto-assigned, increasing.
    pub id: i64,
    /// Height of the block the message was mined in.
    pub block_height: u32,
    /// Transaction that carried the message.
    pub txid: String,
    /// Decoded message text, `/BJ` prefix included.
    pub message: String,
    /// When the row was written (UTC), not when the block was mined.
    pub recorded_at: NaiveDateTime,
}

/// Durable sink for journal messages.
///
/// `append` never deduplicates: the same `(height, txid, message)` twice gives two rows.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Store a tracked message and return its id.
    async fn append(&self, height: u32, txid: Txid, message: &str) -> Result<i64, LedgerError>;

    /// Up to `limit` records, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<JournalRecord>, LedgerError>;
}

pub mod memory;
pub use memory::MemoryLedger;

// concrete stores live here
#[cfg(feature = "store-sqlite")]
pub mod sqlite_ledger;
#[cfg(feature = "store-sqlite")]
pub use sqlite_ledger::SqliteLedger;
