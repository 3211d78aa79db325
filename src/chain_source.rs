//! Abstractions for querying block data from a remote chain provider.
use async_trait::async_trait;
use bitcoin::{BlockHash, Txid};

use crate::error::FetchError;

/// A block identified by height and hash. Only lives while its transactions are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Height in the best chain.
    pub height: u32,
    /// Hash as reported by the provider for `height`.
    pub hash: BlockHash,
}

/// One transaction output as delivered by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// Hex-encoded `scriptPubKey`. Left undecoded so a malformed script
    /// stays a per-output decode failure.
    pub scriptpubkey: String,
}

impl Output {
    /// Output carrying the given raw script bytes.
    pub fn from_script(script: &[u8]) -> Self {
        Self {
            scriptpubkey: hex::encode(script),
        }
    }
}

/// A transaction with its outputs in script order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Transaction id.
    pub txid: Txid,
    /// Outputs, in the order the provider listed them.
    pub outputs: Vec<Output>,
}

/// Provider of tip height, height → hash lookups and block transaction lists.
///
/// Implementations do not retry; the walker owns the retry policy.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Current best height.
    async fn tip_height(&self) -> Result<u32, FetchError>;

    /// Block hash at an exact height. `height` must not exceed the tip.
    async fn block_hash(&self, height: u32) -> Result<BlockHash, FetchError>;

    /// Every transaction of `block`, in provider order.
    async fn block_transactions(&self, block: BlockHash) -> Result<Vec<Transaction>, FetchError>;
}
