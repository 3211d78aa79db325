//! Error kinds surfaced by the provider and the ledger.
//!
//! Decode failures have no error type: the decoder returns `None` for an
//! output it cannot read. Operator quits travel as [`crate::presenter::Pacing::Quit`]
//! or through the shutdown flag, never as errors.
use thiserror::Error;

/// A provider query failed. Always transient: the walker backs off and retries.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeout, body read).
    #[error("request to {url} failed: {reason}")]
    Http {
        /// Requested URL.
        url: String,
        /// Transport error text.
        reason: String,
    },

    /// The provider answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The provider answered 2xx but the body could not be understood.
    #[error("unexpected response from {url}: {reason}")]
    Parse {
        /// Requested URL.
        url: String,
        /// What could not be parsed.
        reason: String,
    },
}

impl FetchError {
    /// Build a [`FetchError::Parse`] from anything printable.
    pub fn parse(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// The journal store could not be written or read.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// SQLite refused the operation.
    #[cfg(feature = "store-sqlite")]
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The blocking storage task panicked or was cancelled.
    #[error("storage task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Any other reason the store cannot be used.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
