//! [`ChainSource`] backed by an Esplora HTTP API (blockstream.info, mempool.space, self-hosted).
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use bitcoin::{BlockHash, Txid};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};

use crate::chain_source::{ChainSource, Output, Transaction};
use crate::error::FetchError;

/// Public Blockstream mainnet endpoint.
pub const DEFAULT_API_BASE: &str = "https://blockstream.info/api";

/// Esplora serves block transactions in fixed pages of this size.
const TXS_PAGE: usize = 25;

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BlockInfo {
    tx_count: usize,
}

#[derive(Debug, Deserialize)]
struct EsploraTx {
    txid: String,
    #[serde(default)]
    vout: Vec<EsploraVout>,
}

#[derive(Debug, Deserialize)]
struct EsploraVout {
    #[serde(default)]
    scriptpubkey: String,
}

impl EsploraTx {
    fn into_transaction(self, url: &str) -> Result<Transaction, FetchError> {
        let txid = Txid::from_str(&self.txid).map_err(|e| FetchError::parse(url, e))?;
        let outputs = self
            .vout
            .into_iter()
            .map(|v| Output {
                scriptpubkey: v.scriptpubkey,
            })
            .collect();
        Ok(Transaction { txid, outputs })
    }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Esplora REST client.
pub struct EsploraSource {
    client: Client,
    base: String,
}

impl EsploraSource {
    /// Client for `base` (e.g. [`DEFAULT_API_BASE`]) with a 30 s request timeout.
    pub fn new(base: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_timeout(base, Duration::from_secs(30))
    }

    /// Client with a custom per-request timeout.
    pub fn with_timeout(base: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let base = base.into().trim_end_matches('/').to_owned();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("btc-jornal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Http {
                url: base.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { client, base })
    }

    /// Base URL without trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    async fn get(&self, path: &str) -> Result<(String, reqwest::Response), FetchError> {
        let url = format!("{}{path}", self.base);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Http {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok((url, resp))
    }

    async fn get_text(&self, path: &str) -> Result<(String, String), FetchError> {
        let (url, resp) = self.get(path).await?;
        let body = resp.text().await.map_err(|e| FetchError::Http {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        Ok((url, body))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<(String, T), FetchError> {
        let (url, body) = self.get_text(path).await?;
        let value = serde_json::from_str(&body).map_err(|e| FetchError::parse(&url, e))?;
        Ok((url, value))
    }
}

#[async_trait]
impl ChainSource for EsploraSource {
    async fn tip_height(&self) -> Result<u32, FetchError> {
        let (url, body) = self.get_text("/blocks/tip/height").await?;
        body.trim()
            .parse::<u32>()
            .map_err(|e| FetchError::parse(url, e))
    }

    async fn block_hash(&self, height: u32) -> Result<BlockHash, FetchError> {
        let (url, body) = self.get_text(&format!("/block-height/{height}")).await?;
        BlockHash::from_str(body.trim()).map_err(|e| FetchError::parse(url, e))
    }

    async fn block_transactions(&self, block: BlockHash) -> Result<Vec<Transaction>, FetchError> {
        let (_, info): (_, BlockInfo) = self.get_json(&format!("/block/{block}")).await?;
        let txs = collect_pages(info.tx_count, |start| {
            let path = txs_path(&block, start);
            async move { self.get_json(&path).await }
        })
        .await?;
        tracing::trace!(%block, count = txs.len(), "fetched block transactions");
        Ok(txs)
    }
}

/// `/block/{hash}/txs` for the first page, `/block/{hash}/txs/{start}` after it.
fn txs_path(block: &BlockHash, start: usize) -> String {
    if start == 0 {
        format!("/block/{block}/txs")
    } else {
        format!("/block/{block}/txs/{start}")
    }
}

/// Walk pages of [`TXS_PAGE`] until `tx_count` transactions arrived or a page comes back empty.
async fn collect_pages<F, Fut>(
    tx_count: usize,
    mut fetch_page: F,
) -> Result<Vec<Transaction>, FetchError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<(String, Vec<EsploraTx>), FetchError>>,
{
    let mut txs = Vec::with_capacity(tx_count);
    let mut start = 0;
    while txs.len() < tx_count {
        let (url, page) = fetch_page(start).await?;
        if page.is_empty() {
            break;
        }
        for tx in page {
            txs.push(tx.into_transaction(&url)?);
        }
        start += TXS_PAGE;
    }
    Ok(txs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash;

    const SAMPLE_PAGE: &str = r#"[
        {
            "txid": "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b",
            "version": 1,
            "vout": [
                { "scriptpubkey": "6a0a2f424a68656c6c6f", "scriptpubkey_type": "op_return", "value": 0 },
                { "scriptpubkey": "76a91462e907b15cbf27d5425399ebf6f0fb50ebb88f1888ac", "value": 5000 }
            ],
            "status": { "confirmed": true }
        }
    ]"#;

    #[test]
    fn parses_esplora_tx_page() {
        let page: Vec<EsploraTx> = serde_json::from_str(SAMPLE_PAGE).unwrap();
        let tx = page.into_iter().next().unwrap().into_transaction("test").unwrap();
        assert_eq!(
            tx.txid.to_string(),
            "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
        );
        assert_eq!(tx.outputs.len(), 2);
        assert_eq!(tx.outputs[0].scriptpubkey, "6a0a2f424a68656c6c6f");
    }

    #[test]
    fn bad_txid_is_a_parse_error() {
        let tx = EsploraTx {
            txid: "zz".into(),
            vout: vec![],
        };
        assert!(matches!(
            tx.into_transaction("u"),
            Err(FetchError::Parse { .. })
        ));
    }

    fn page(from: usize, len: usize) -> Vec<EsploraTx> {
        (from..from + len)
            .map(|i| EsploraTx {
                txid: format!("{i:064x}"),
                vout: vec![],
            })
            .collect()
    }

    #[test]
    fn first_page_has_no_offset() {
        let block = BlockHash::all_zeros();
        assert_eq!(txs_path(&block, 0), format!("/block/{block}/txs"));
        assert_eq!(txs_path(&block, 25), format!("/block/{block}/txs/25"));
    }

    #[tokio::test]
    async fn pages_are_requested_in_steps_of_25() {
        let mut requested = Vec::new();
        let txs = collect_pages(60, |start| {
            requested.push(start);
            let len = (60 - start).min(TXS_PAGE);
            async move { Ok((format!("page {start}"), page(start, len))) }
        })
        .await
        .unwrap();

        assert_eq!(requested, vec![0, 25, 50]);
        assert_eq!(txs.len(), 60);
        assert_eq!(txs[59].txid.to_string(), format!("{:064x}", 59));
    }

    #[tokio::test]
    async fn empty_page_ends_the_walk() {
        let mut requested = Vec::new();
        let txs = collect_pages(60, |start| {
            requested.push(start);
            let len = if start == 0 { TXS_PAGE } else { 0 };
            async move { Ok((format!("page {start}"), page(start, len))) }
        })
        .await
        .unwrap();

        assert_eq!(requested, vec![0, 25]);
        assert_eq!(txs.len(), 25);
    }

    #[tokio::test]
    async fn empty_block_makes_no_page_request() {
        let mut requested = Vec::new();
        let txs = collect_pages(0, |start| {
            requested.push(start);
            async move { Ok((String::new(), Vec::new())) }
        })
        .await
        .unwrap();
        assert!(requested.is_empty());
        assert!(txs.is_empty());
    }

    #[test]
    fn base_url_is_normalised() {
        let src = EsploraSource::new("https://example.org/api/").unwrap();
        assert_eq!(src.base(), "https://example.org/api");
    }
}
