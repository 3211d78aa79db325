use bitcoin::hashes::Hash;
use bitcoin::Txid;
use btc_jornal::ledger::{sqlite_ledger::SqliteLedger, Ledger}; // bring trait methods into scope
use rusqlite::Connection;

use tempfile::NamedTempFile;

#[tokio::test]
async fn sqlite_ledger_appends_and_lists() -> anyhow::Result<()> {
    // temp file for each run
    let tmp = NamedTempFile::new()?;
    let ledger = SqliteLedger::new(tmp.path())?;

    // Fresh DB has no records
    assert!(ledger.recent(10).await?.is_empty());

    let txid = Txid::from_byte_array([3u8; 32]);
    let first = ledger.append(840_000, txid, "/BJhello").await?;
    let second = ledger.append(840_001, txid, "/BJworld").await?;
    assert!(second > first, "ids increase");

    let recent = ledger.recent(10).await?;
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id, second, "newest first");
    assert_eq!(recent[0].block_height, 840_001);
    assert_eq!(recent[0].message, "/BJworld");
    assert_eq!(recent[1].txid, txid.to_string());

    assert_eq!(ledger.recent(1).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn identical_appends_are_not_deduplicated() -> anyhow::Result<()> {
    let tmp = NamedTempFile::new()?;
    let ledger = SqliteLedger::new(tmp.path())?;
    let txid = Txid::from_byte_array([7u8; 32]);

    let a = ledger.append(100, txid, "/BJsame").await?;
    let b = ledger.append(100, txid, "/BJsame").await?;

    assert_ne!(a, b, "a second, distinct record is written");
    let rows = ledger.recent(10).await?;
    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .all(|r| r.block_height == 100 && r.message == "/BJsame"));
    Ok(())
}

#[tokio::test]
async fn journal_table_uses_the_published_schema() -> anyhow::Result<()> {
    let tmp = NamedTempFile::new()?;
    let ledger = SqliteLedger::new(tmp.path())?;
    ledger
        .append(5, Txid::from_byte_array([1u8; 32]), "/BJschema")
        .await?;

    // an outside reader sees the committed row with the insertion timestamp filled in
    let conn = Connection::open(tmp.path())?;
    let (bloco, mensagem, ts): (u32, String, Option<String>) = conn.query_row(
        "SELECT bloco, mensagem, timestamp FROM journal WHERE id = 1",
        [],
        |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
    )?;
    assert_eq!(bloco, 5);
    assert_eq!(mensagem, "/BJschema");
    assert!(ts.is_some());
    Ok(())
}

#[tokio::test]
async fn reopening_keeps_records_and_schema_init_is_idempotent() -> anyhow::Result<()> {
    let tmp = NamedTempFile::new()?;
    {
        let ledger = SqliteLedger::new(tmp.path())?;
        ledger
            .append(1, Txid::from_byte_array([2u8; 32]), "/BJkeep")
            .await?;
    }

    let reopened = SqliteLedger::new(tmp.path())?;
    let rows = reopened.recent(10).await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].message, "/BJkeep");
    Ok(())
}
