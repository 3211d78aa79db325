//! OP_RETURN payload extraction.
//!
//! Decoding is best-effort: a script that cannot be read yields `None` and the
//! caller moves on to the next output. Nothing in here returns an error.
use bitcoin::opcodes::all::{OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4, OP_RETURN};
use bitcoin::Txid;

use crate::chain_source::{Output, Transaction};

/// Text recovered from one OP_RETURN output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    /// Height of the block containing the transaction.
    pub height: u32,
    /// Transaction carrying the output.
    pub txid: Txid,
    /// Output index within the transaction.
    pub vout: u32,
    /// Payload decoded as UTF-8, invalid sequences dropped.
    pub text: String,
}

/// Decode every OP_RETURN output of `tx`, in output order.
pub fn extract(height: u32, tx: &Transaction) -> Vec<DecodedMessage> {
    tx.outputs
        .iter()
        .enumerate()
        .filter_map(|(vout, out)| {
            decode_output(out).map(|text| DecodedMessage {
                height,
                txid: tx.txid,
                vout: vout as u32,
                text,
            })
        })
        .collect()
}

/// Decode a single provider output. Invalid or odd-length hex is the one
/// malformed-script case: it yields `None`.
pub fn decode_output(out: &Output) -> Option<String> {
    let script = hex::decode(&out.scriptpubkey).ok()?;
    decode_script(&script)
}

/// Decode the payload of a raw script if it starts with `OP_RETURN`.
///
/// Returns `Some` for every script whose first byte is the opcode; a bare
/// `OP_RETURN` yields an empty string. Push lengths are read leniently: a
/// push that declares more bytes than the script holds decodes what is there.
pub fn decode_script(script: &[u8]) -> Option<String> {
    let (&first, rest) = script.split_first()?;
    if first != OP_RETURN.to_u8() {
        return None;
    }
    Some(lossy_utf8(payload(rest)))
}

/// Strip the push-length encoding that follows the opcode.
///
/// `OP_PUSHBYTES_n` (and any non-push byte) is a one-byte header;
/// `OP_PUSHDATA1/2/4` carry 1, 2 or 4 extra little-endian length bytes.
fn payload(rest: &[u8]) -> &[u8] {
    let Some((&op, body)) = rest.split_first() else {
        return rest;
    };

    let len_bytes = match op {
        b if b == OP_PUSHDATA1.to_u8() => 1,
        b if b == OP_PUSHDATA2.to_u8() => 2,
        b if b == OP_PUSHDATA4.to_u8() => 4,
        _ => 0,
    };
    body.get(len_bytes..).unwrap_or_default()
}

fn lossy_utf8(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}
