//! Segregated-witness size accounting
//!
//! Weight(tx) = 3 × |Serialize(tx ∖ witness)| + |Serialize(tx)|
//!
//! Sizes are computed from the wire encoding: compact-size length prefixes,
//! and the marker/flag bytes when any input carries a witness.

use crate::constants::WITNESS_SCALE_FACTOR;
use crate::types::*;
use bitcoin_hashes::{sha256d, Hash as BitcoinHash};

/// Bytes used by a compact-size length prefix for `n`
pub fn compact_size_len(n: usize) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

fn write_compact_size(buf: &mut Vec<u8>, n: usize) {
    match n {
        0..=0xfc => buf.push(n as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&(n as u64).to_le_bytes());
        }
    }
}

fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_compact_size(buf, bytes.len());
    buf.extend_from_slice(bytes);
}

/// Serialized size of a single output
pub fn output_serialized_size(output: &TransactionOutput) -> usize {
    8 + compact_size_len(output.script_pubkey.len()) + output.script_pubkey.len()
}

fn input_serialized_size(input: &TransactionInput) -> usize {
    32 + 4 + compact_size_len(input.script_sig.len()) + input.script_sig.len() + 4
}

fn witness_serialized_size(witness: &Witness) -> usize {
    compact_size_len(witness.len())
        + witness
            .iter()
            .map(|item| compact_size_len(item.len()) + item.len())
            .sum::<usize>()
}

/// Size without witness data
pub fn stripped_size(tx: &Transaction) -> usize {
    4 + compact_size_len(tx.inputs.len())
        + tx.inputs.iter().map(input_serialized_size).sum::<usize>()
        + compact_size_len(tx.outputs.len())
        + tx.outputs.iter().map(output_serialized_size).sum::<usize>()
        + 4
}

/// Size including marker, flag and witnesses when present
pub fn total_size(tx: &Transaction) -> usize {
    let base = stripped_size(tx);
    if !tx.has_witness() {
        return base;
    }
    base + 2
        + tx.inputs
            .iter()
            .map(|input| witness_serialized_size(&input.witness))
            .sum::<usize>()
}

/// Transaction weight in weight units
pub fn get_transaction_weight(tx: &Transaction) -> Natural {
    (stripped_size(tx) as Natural) * (WITNESS_SCALE_FACTOR - 1) + total_size(tx) as Natural
}

/// Wire encoding, with or without witness data
pub fn serialize_transaction(tx: &Transaction, include_witness: bool) -> Vec<u8> {
    let with_witness = include_witness && tx.has_witness();
    let mut buf = Vec::with_capacity(if with_witness { total_size(tx) } else { stripped_size(tx) });

    buf.extend_from_slice(&(tx.version as i32).to_le_bytes());
    if with_witness {
        buf.extend_from_slice(&[0x00, 0x01]);
    }

    write_compact_size(&mut buf, tx.inputs.len());
    for input in &tx.inputs {
        buf.extend_from_slice(&input.prevout.hash);
        buf.extend_from_slice(&(input.prevout.index as u32).to_le_bytes());
        write_bytes(&mut buf, &input.script_sig);
        buf.extend_from_slice(&(input.sequence as u32).to_le_bytes());
    }

    write_compact_size(&mut buf, tx.outputs.len());
    for output in &tx.outputs {
        buf.extend_from_slice(&output.value.to_le_bytes());
        write_bytes(&mut buf, &output.script_pubkey);
    }

    if with_witness {
        for input in &tx.inputs {
            write_compact_size(&mut buf, input.witness.len());
            for item in &input.witness {
                write_bytes(&mut buf, item);
            }
        }
    }

    buf.extend_from_slice(&(tx.lock_time as u32).to_le_bytes());
    buf
}

/// Transaction id: double SHA-256 of the witness-stripped encoding
///
/// The returned hash displays byte-reversed, as txids are conventionally shown.
pub fn compute_txid(tx: &Transaction) -> sha256d::Hash {
    sha256d::Hash::hash(&serialize_transaction(tx, false))
}

/// Witness transaction id; equals the txid when no input has a witness
pub fn compute_wtxid(tx: &Transaction) -> sha256d::Hash {
    sha256d::Hash::hash(&serialize_transaction(tx, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_transaction() -> Transaction {
        Transaction {
            version: 2,
            inputs: vec![TransactionInput {
                prevout: OutPoint { hash: [1; 32], index: 0 },
                script_sig: vec![0x51; 10],
                sequence: 0xffffffff,
                witness: vec![],
            }],
            outputs: vec![TransactionOutput {
                value: 1000,
                script_pubkey: vec![0x51; 25],
            }],
            lock_time: 0,
        }
    }

    #[test]
    fn test_compact_size_len() {
        assert_eq!(compact_size_len(0), 1);
        assert_eq!(compact_size_len(252), 1);
        assert_eq!(compact_size_len(253), 3);
        assert_eq!(compact_size_len(0x10000), 5);
    }

    #[test]
    fn test_sizes_match_serialization() {
        let mut tx = create_test_transaction();
        // 4 + 1 + (32 + 4 + 1 + 10 + 4) + 1 + (8 + 1 + 25) + 4
        assert_eq!(stripped_size(&tx), 95);
        assert_eq!(serialize_transaction(&tx, true).len(), 95);
        assert_eq!(get_transaction_weight(&tx), 380);

        tx.inputs[0].witness = vec![vec![0xaa; 72], vec![0x02; 33]];
        let witness_bytes = 1 + (1 + 72) + (1 + 33);
        assert_eq!(total_size(&tx), 95 + 2 + witness_bytes);
        assert_eq!(serialize_transaction(&tx, true).len(), total_size(&tx));
        assert_eq!(serialize_transaction(&tx, false).len(), 95);
        assert_eq!(get_transaction_weight(&tx), 95 * 3 + 95 + 2 + witness_bytes as Natural);
    }

    #[test]
    fn test_output_serialized_size() {
        let p2pkh = TransactionOutput { value: 0, script_pubkey: vec![0; 25] };
        assert_eq!(output_serialized_size(&p2pkh), 34);
        let p2wpkh = TransactionOutput { value: 0, script_pubkey: vec![0; 22] };
        assert_eq!(output_serialized_size(&p2wpkh), 31);
    }

    #[test]
    fn test_txid_ignores_witness() {
        let tx = create_test_transaction();
        let mut with_witness = tx.clone();
        with_witness.inputs[0].witness = vec![vec![0x01]];

        assert_eq!(compute_txid(&tx), compute_txid(&with_witness));
        assert_eq!(compute_txid(&tx), compute_wtxid(&tx));
        assert_ne!(compute_wtxid(&tx), compute_wtxid(&with_witness));
    }
}
