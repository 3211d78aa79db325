#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! btc-jornal: follow the Bitcoin chain and keep a journal of `/BJ` OP_RETURN messages.
//!
//! ## What you implement
//! - [`ChainSource`]: tip height, block hash by height, transactions of a block.
//!   [`EsploraSource`] covers any Esplora HTTP API.
//! - [`Ledger`]: append journal records. [`SqliteLedger`] and [`MemoryLedger`] ship here.
//! - [`Presenter`]: show blocks and messages, answer the per-block pacing prompt.
//!
//! ## What the walker does
//! - Replays the last `window` blocks up to the tip observed at startup.
//! - Follows the tip, polling on a fixed interval, retrying provider errors after a backoff.
//! - Decodes every OP_RETURN output, highlights and persists `/BJ` messages, shows the rest.
//!
//! ## Minimal usage
//! ```rust,ignore
//! use btc_jornal::prelude::*;
//!
//! async fn run() -> anyhow::Result<()> {
//!     let source = EsploraSource::new(btc_jornal::esplora::DEFAULT_API_BASE)?;
//!     let ledger = SqliteLedger::new("btc_jornal.db")?;
//!     let presenter = TerminalPresenter::new(Language::En, true);
//!     let mut walker = BlockWalker::new(source, ledger, presenter);
//!     walker.run().await
//! }
//! ```
/// Provider abstraction and the block/transaction types it returns.
pub mod chain_source;

/// `/BJ` prefix test.
pub mod classifier;

/// File and flag configuration.
pub mod config;

/// OP_RETURN payload decoding.
pub mod decoder;

/// Fetch and persistence error kinds.
pub mod error;

/// Esplora HTTP provider.
#[cfg(feature = "esplora")]
pub mod esplora;

/// Operator language tables.
pub mod i18n;

/// Journal persistence (trait, SQLite and in-memory implementations).
pub mod ledger;

/// Operator-facing output and pacing.
pub mod presenter;

/// Backlog replay and live-follow state machine.
pub mod walker;

// Public re-exports
pub use chain_source::{Block, ChainSource, Output, Transaction};
pub use classifier::{classify, is_tracked, MessageKind, JOURNAL_PREFIX};
pub use decoder::{extract, DecodedMessage};
pub use error::{FetchError, LedgerError};
#[cfg(feature = "esplora")]
pub use esplora::EsploraSource;
pub use ledger::{JournalRecord, Ledger, MemoryLedger};
#[cfg(feature = "store-sqlite")]
pub use ledger::SqliteLedger;
pub use presenter::{Pacing, Presenter, TerminalPresenter};
pub use walker::{BlockWalker, WalkerConfig, WalkerState};

/// Convenience prelude for end users.
pub mod prelude {
    pub use crate::i18n::Language;
    pub use crate::{
        BlockWalker, ChainSource, Ledger, MemoryLedger, Pacing, Presenter, TerminalPresenter,
        WalkerConfig,
    };
    #[cfg(feature = "esplora")]
    pub use crate::EsploraSource;
    #[cfg(feature = "store-sqlite")]
    pub use crate::SqliteLedger;
}
