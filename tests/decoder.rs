use bitcoin::hashes::Hash;
use bitcoin::Txid;
use btc_jornal::classifier::{classify, is_tracked, MessageKind};
use btc_jornal::decoder::{decode_output, decode_script, extract};
use btc_jornal::{Output, Transaction};

fn tx_with(scripts: &[&str]) -> Transaction {
    Transaction {
        txid: Txid::from_byte_array([9u8; 32]),
        outputs: scripts
            .iter()
            .map(|s| Output {
                scriptpubkey: s.to_string(),
            })
            .collect(),
    }
}

#[test]
fn journal_push_decodes_and_is_tracked() {
    let tx = tx_with(&["6a0a2f424a68656c6c6f"]);
    let msgs = extract(840_000, &tx);

    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].text, "/BJhello");
    assert_eq!(msgs[0].height, 840_000);
    assert_eq!(msgs[0].txid, tx.txid);
    assert!(is_tracked(&msgs[0].text));
}

#[test]
fn spend_script_yields_nothing() {
    let tx = tx_with(&["76a91462e907b15cbf27d5425399ebf6f0fb50ebb88f1888ac"]);
    assert!(extract(1, &tx).is_empty());
}

#[test]
fn bare_op_return_is_an_empty_message() {
    let tx = tx_with(&["6a"]);
    let msgs = extract(1, &tx);
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].text, "");
}

#[test]
fn invalid_hex_is_swallowed() {
    assert_eq!(decode_output(&Output { scriptpubkey: "6a0".into() }), None);
    assert_eq!(decode_output(&Output { scriptpubkey: "6azz".into() }), None);

    // the bad output does not hide the good one next to it
    let tx = tx_with(&["6azz", "6a03616263"]);
    let msgs = extract(5, &tx);
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].text, "abc");
    assert_eq!(msgs[0].vout, 1);
}

#[test]
fn pushdata_headers_are_stripped() {
    // OP_RETURN OP_PUSHDATA1 3 "abc"
    assert_eq!(decode_script(&hex::decode("6a4c03616263").unwrap()).as_deref(), Some("abc"));
    // OP_RETURN OP_PUSHDATA2 3 0 "abc"
    assert_eq!(decode_script(&hex::decode("6a4d0300616263").unwrap()).as_deref(), Some("abc"));
    // OP_RETURN OP_PUSHDATA4 3 0 0 0 "abc"
    assert_eq!(
        decode_script(&hex::decode("6a4e03000000616263").unwrap()).as_deref(),
        Some("abc")
    );
    // OP_PUSHDATA1 with its length byte cut off
    assert_eq!(decode_script(&hex::decode("6a4c").unwrap()).as_deref(), Some(""));
}

#[test]
fn invalid_utf8_is_skipped() {
    let text = decode_script(&hex::decode("6a04ff41fe42").unwrap());
    assert_eq!(text.as_deref(), Some("AB"));
}

#[test]
fn message_iff_first_byte_is_op_return() {
    for first in 0u8..=255 {
        let script = [first, 0x02, b'h', b'i'];
        let got = decode_script(&script);
        assert_eq!(got.is_some(), first == 0x6a, "first byte {first:#04x}");
    }
    assert_eq!(decode_script(&[]), None);
}

#[test]
fn outputs_keep_script_order() {
    let tx = tx_with(&[
        "6a032f424a",
        "0014751e76e8199196d454941c45d1b3a323f1433bd6",
        "6a026869",
        "6a052f424a2121",
    ]);
    let texts: Vec<_> = extract(7, &tx).into_iter().map(|m| (m.vout, m.text)).collect();
    assert_eq!(
        texts,
        vec![(0, "/BJ".to_string()), (2, "hi".to_string()), (3, "/BJ!!".to_string())]
    );
}

#[test]
fn prefix_match_is_exact() {
    assert!(is_tracked("/BJ"));
    assert!(is_tracked("/BJ news"));
    assert!(!is_tracked("/bj news"));
    assert!(!is_tracked(" /BJ news"));
    assert!(!is_tracked("BJ"));
    assert!(!is_tracked(""));

    assert_eq!(classify("/BJhello"), MessageKind::Journal);
    assert_eq!(classify("hello"), MessageKind::Note);
}
