//! Output script template matching
//!
//! [`solve`] recognises the standard output templates and extracts their
//! parameters. It is total: anything it cannot match comes back as
//! [`TxOutType::NonStandard`] with no solutions.

use crate::script::opcodes::*;
use crate::script::{decode_op_n, instructions, is_pay_to_script_hash, is_push_only, witness_program, Instruction};
use crate::types::ByteString;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxOutType {
    NonStandard,
    PubKey,
    PubKeyHash,
    ScriptHash,
    Multisig,
    NullData,
    WitnessV0KeyHash,
    WitnessV0ScriptHash,
    WitnessUnknown,
}

impl TxOutType {
    pub fn name(&self) -> &'static str {
        match self {
            TxOutType::NonStandard => "nonstandard",
            TxOutType::PubKey => "pubkey",
            TxOutType::PubKeyHash => "pubkeyhash",
            TxOutType::ScriptHash => "scripthash",
            TxOutType::Multisig => "multisig",
            TxOutType::NullData => "nulldata",
            TxOutType::WitnessV0KeyHash => "witness_v0_keyhash",
            TxOutType::WitnessV0ScriptHash => "witness_v0_scripthash",
            TxOutType::WitnessUnknown => "witness_unknown",
        }
    }
}

impl fmt::Display for TxOutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify `script` and extract its parameters
///
/// Solutions by type:
/// - PubKey: `[pubkey]`
/// - PubKeyHash / ScriptHash: `[hash]`
/// - Multisig: `[[m], pubkey.., [n]]`
/// - WitnessV0KeyHash / WitnessV0ScriptHash: `[program]`
/// - WitnessUnknown: `[[version], program]`
/// - NullData / NonStandard: `[]`
pub fn solve(script: &[u8]) -> (TxOutType, Vec<ByteString>) {
    // P2SH first: it is more constrained than the templates below
    if is_pay_to_script_hash(script) {
        return (TxOutType::ScriptHash, vec![script[2..22].to_vec()]);
    }

    if let Some((version, program)) = witness_program(script) {
        return match (version, program.len()) {
            (0, 20) => (TxOutType::WitnessV0KeyHash, vec![program.to_vec()]),
            (0, 32) => (TxOutType::WitnessV0ScriptHash, vec![program.to_vec()]),
            (0, _) => (TxOutType::NonStandard, vec![]),
            _ => (TxOutType::WitnessUnknown, vec![vec![version], program.to_vec()]),
        };
    }

    // OP_RETURN followed by pushes only
    if !script.is_empty() && script[0] == OP_RETURN && is_push_only(&script[1..]) {
        return (TxOutType::NullData, vec![]);
    }

    if let Some(pubkey) = match_pay_to_pubkey(script) {
        return (TxOutType::PubKey, vec![pubkey.to_vec()]);
    }

    if let Some(hash) = match_pay_to_pubkey_hash(script) {
        return (TxOutType::PubKeyHash, vec![hash.to_vec()]);
    }

    if let Some(solutions) = match_multisig(script) {
        return (TxOutType::Multisig, solutions);
    }

    (TxOutType::NonStandard, vec![])
}

/// Plausible public key encoding: 33-byte compressed or 65-byte uncompressed/hybrid
fn is_valid_pubkey_size(data: &[u8]) -> bool {
    match data.first() {
        Some(0x02) | Some(0x03) => data.len() == 33,
        Some(0x04) | Some(0x06) | Some(0x07) => data.len() == 65,
        _ => false,
    }
}

/// <pubkey> OP_CHECKSIG
fn match_pay_to_pubkey(script: &[u8]) -> Option<&[u8]> {
    let len = match script.len() {
        35 => 33,
        67 => 65,
        _ => return None,
    };
    if script[0] as usize != len || script[script.len() - 1] != OP_CHECKSIG {
        return None;
    }
    let pubkey = &script[1..=len];
    is_valid_pubkey_size(pubkey).then_some(pubkey)
}

/// OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG
fn match_pay_to_pubkey_hash(script: &[u8]) -> Option<&[u8]> {
    if script.len() == 25
        && script[0] == OP_DUP
        && script[1] == OP_HASH160
        && script[2] == 0x14
        && script[23] == OP_EQUALVERIFY
        && script[24] == OP_CHECKSIG
    {
        Some(&script[3..23])
    } else {
        None
    }
}

/// OP_m <pubkey>.. OP_n OP_CHECKMULTISIG
///
/// `m` and `n` must be OP_1..OP_16 with `m <= n`, and exactly `n` keys
/// must be present. The standard 1..=3 range is left to the classifier.
fn match_multisig(script: &[u8]) -> Option<Vec<ByteString>> {
    let parsed: Vec<Instruction> = instructions(script).collect::<Result<_, _>>().ok()?;
    let (first, rest) = parsed.split_first()?;
    let (last, rest) = rest.split_last()?;
    let (n_op, keys) = rest.split_last()?;

    if last.opcode() != OP_CHECKMULTISIG {
        return None;
    }
    let m = small_int(first)?;
    let n = small_int(n_op)?;
    if m > n {
        return None;
    }

    let mut solutions = Vec::with_capacity(keys.len() + 2);
    solutions.push(vec![m]);
    for key in keys {
        match key {
            Instruction::Push { data, .. } if is_valid_pubkey_size(data) => solutions.push(data.to_vec()),
            _ => return None,
        }
    }
    if keys.len() != n as usize {
        return None;
    }
    solutions.push(vec![n]);
    Some(solutions)
}

/// OP_1..OP_16; a zero key count never forms a multisig template
fn small_int(instruction: &Instruction) -> Option<u8> {
    match instruction {
        Instruction::Op(opcode) => decode_op_n(*opcode).filter(|n| *n > 0),
        _ => None,
    }
}
