//! In-process ledger, for tests and dry runs.
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use bitcoin::Txid;

use super::{JournalRecord, Ledger};
use crate::error::LedgerError;

/// Keeps records in a `Vec`; ids start at 1 like SQLite's AUTOINCREMENT.
#[derive(Default)]
pub struct MemoryLedger {
    rows: Mutex<Vec<JournalRecord>>,
}

impl MemoryLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in insertion order. Rows written before a panic in another
    /// holder of the lock are still returned.
    pub fn records(&self) -> Vec<JournalRecord> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn append(&self, height: u32, txid: Txid, message: &str) -> Result<i64, LedgerError> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
        let id = rows.len() as i64 + 1;
        rows.push(JournalRecord {
            id,
            block_height: height,
            txid: txid.to_string(),
            message: message.to_owned(),
            recorded_at: chrono::Utc::now().naive_utc(),
        });
        Ok(id)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<JournalRecord>, LedgerError> {
        let rows = self
            .rows
            .lock()
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
        Ok(rows.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash;

    #[tokio::test]
    async fn records_survive_a_poisoned_lock() {
        let ledger = MemoryLedger::new();
        ledger
            .append(7, Txid::from_byte_array([1u8; 32]), "/BJkept")
            .await
            .unwrap();

        std::thread::scope(|s| {
            let poisoner = s.spawn(|| {
                let _guard = ledger.rows.lock().unwrap();
                panic!("writer crashed");
            });
            assert!(poisoner.join().is_err());
        });
        assert!(ledger.rows.is_poisoned());

        let rows = ledger.records();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].message, "/BJkept");
        assert!(matches!(
            ledger.recent(1).await,
            Err(LedgerError::Unavailable(_))
        ));
    }
}
