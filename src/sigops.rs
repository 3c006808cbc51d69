//! Signature-operation cost and virtual size
//!
//! Sigop cost is measured in weight units: legacy and P2SH sigops count
//! [`WITNESS_SCALE_FACTOR`] each, witness sigops count 1.

use crate::coins::{spent_coin, CoinView};
use crate::constants::*;
use crate::error::Result;
use crate::script::{is_pay_to_script_hash, is_push_only, last_push, p2sh_sig_op_count, sig_op_count, witness_program};
use crate::segwit::get_transaction_weight;
use crate::types::*;

/// GetVirtualTransactionSize: ⌈max(weight, sigop_cost × bytes_per_sigop) / 4⌉
pub fn get_virtual_transaction_size(weight: Natural, sigop_cost: Natural, bytes_per_sigop: Natural) -> Natural {
    let floor = sigop_cost.saturating_mul(bytes_per_sigop);
    weight.max(floor).div_ceil(WITNESS_SCALE_FACTOR)
}

/// Virtual size of `tx` given its sigop cost
pub fn get_transaction_virtual_size(tx: &Transaction, sigop_cost: Natural, bytes_per_sigop: Natural) -> Natural {
    get_virtual_transaction_size(get_transaction_weight(tx), sigop_cost, bytes_per_sigop)
}

/// Sigops counted the legacy way: every scriptSig, inaccurately
pub fn get_legacy_sigop_count(tx: &Transaction) -> Natural {
    tx.inputs
        .iter()
        .map(|input| sig_op_count(&input.script_sig, false) as Natural)
        .sum()
}

/// Sigops in the redeem scripts of P2SH inputs
pub fn get_p2sh_sigop_count<V: CoinView + ?Sized>(tx: &Transaction, coins: &V) -> Result<Natural> {
    if tx.is_coinbase() {
        return Ok(0);
    }

    let mut count = 0;
    for input in &tx.inputs {
        let coin = spent_coin(coins, input)?;
        assert!(!coin.is_spent(), "sigop accounting on spent coin {}", input.prevout);
        count += p2sh_sig_op_count(&coin.output.script_pubkey, &input.script_sig) as Natural;
    }
    Ok(count)
}

fn witness_program_sigops(version: u8, program: &[u8], witness: &Witness) -> Natural {
    if version != 0 {
        return 0;
    }
    match (program.len(), witness.last()) {
        (20, _) => 1,
        (32, Some(witness_script)) => sig_op_count(witness_script, true) as Natural,
        _ => 0,
    }
}

/// CountWitnessSigOps: sigops of the witness program an input spends
///
/// The program is either the spent script itself or, for P2SH-wrapped
/// programs, the last push of a push-only scriptSig.
pub fn count_witness_sigops(script_sig: &[u8], script_pubkey: &[u8], witness: &Witness, flags: u32) -> Natural {
    if flags & SCRIPT_VERIFY_WITNESS == 0 {
        return 0;
    }

    if let Some((version, program)) = witness_program(script_pubkey) {
        return witness_program_sigops(version, program, witness);
    }

    if is_pay_to_script_hash(script_pubkey) && is_push_only(script_sig) {
        if let Some((version, program)) = last_push(script_sig).and_then(witness_program) {
            return witness_program_sigops(version, program, witness);
        }
    }

    0
}

/// GetAccurateTransactionSigOpCost
///
/// 4 × (legacy sigops + P2SH sigops when `SCRIPT_VERIFY_P2SH`) + witness
/// sigops when `SCRIPT_VERIFY_WITNESS`. Zero for a coinbase.
///
/// # Panics
///
/// If any spent coin is marked spent. That is a caller bug, not a policy
/// outcome.
pub fn get_accurate_transaction_sigop_cost<V: CoinView + ?Sized>(
    tx: &Transaction,
    coins: &V,
    flags: u32,
) -> Result<Natural> {
    if tx.is_coinbase() {
        return Ok(0);
    }

    let mut sigops = get_legacy_sigop_count(tx);
    if flags & SCRIPT_VERIFY_P2SH != 0 {
        sigops += get_p2sh_sigop_count(tx, coins)?;
    }
    sigops *= WITNESS_SCALE_FACTOR;

    if flags & SCRIPT_VERIFY_WITNESS != 0 {
        for input in &tx.inputs {
            let coin = spent_coin(coins, input)?;
            assert!(!coin.is_spent(), "sigop accounting on spent coin {}", input.prevout);
            sigops += count_witness_sigops(&input.script_sig, &coin.output.script_pubkey, &input.witness, flags);
        }
    }

    Ok(sigops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::opcodes::*;
    use crate::script::push_data;

    #[test]
    fn test_virtual_size_from_weight() {
        assert_eq!(get_virtual_transaction_size(1000, 0, DEFAULT_BYTES_PER_SIGOP), 250);
        assert_eq!(get_virtual_transaction_size(1001, 0, DEFAULT_BYTES_PER_SIGOP), 251);
        assert_eq!(get_virtual_transaction_size(0, 0, DEFAULT_BYTES_PER_SIGOP), 0);
    }

    #[test]
    fn test_virtual_size_sigop_floor() {
        // 20 sigops × 20 bytes = 400 weight → 100 vbytes
        assert_eq!(get_virtual_transaction_size(0, 20, DEFAULT_BYTES_PER_SIGOP), 100);
        assert_eq!(get_virtual_transaction_size(300, 20, DEFAULT_BYTES_PER_SIGOP), 100);
        assert_eq!(get_virtual_transaction_size(1000, 20, DEFAULT_BYTES_PER_SIGOP), 250);
    }

    #[test]
    fn test_count_witness_sigops() {
        let mut p2wpkh = vec![OP_0, 0x14];
        p2wpkh.extend_from_slice(&[1; 20]);
        assert_eq!(count_witness_sigops(&[], &p2wpkh, &vec![], SCRIPT_VERIFY_WITNESS), 1);
        assert_eq!(count_witness_sigops(&[], &p2wpkh, &vec![], SCRIPT_VERIFY_NONE), 0);

        let mut p2wsh = vec![OP_0, 0x20];
        p2wsh.extend_from_slice(&[2; 32]);
        let witness = vec![vec![], vec![OP_2, OP_CHECKMULTISIG, OP_CHECKSIG]];
        assert_eq!(count_witness_sigops(&[], &p2wsh, &witness, SCRIPT_VERIFY_WITNESS), 3);
        assert_eq!(count_witness_sigops(&[], &p2wsh, &vec![], SCRIPT_VERIFY_WITNESS), 0);

        let mut v1 = vec![OP_1, 0x20];
        v1.extend_from_slice(&[3; 32]);
        assert_eq!(count_witness_sigops(&[], &v1, &witness, SCRIPT_VERIFY_WITNESS), 0);
    }

    #[test]
    fn test_count_witness_sigops_p2sh_wrapped() {
        let mut p2sh = vec![OP_HASH160, 0x14];
        p2sh.extend_from_slice(&[4; 20]);
        p2sh.push(OP_EQUAL);

        let mut p2wpkh = vec![OP_0, 0x14];
        p2wpkh.extend_from_slice(&[1; 20]);
        let script_sig = push_data(&p2wpkh);

        assert_eq!(count_witness_sigops(&script_sig, &p2sh, &vec![vec![1]], SCRIPT_VERIFY_WITNESS), 1);
        assert_eq!(count_witness_sigops(&[OP_1], &p2sh, &vec![vec![1]], SCRIPT_VERIFY_WITNESS), 0);
    }
}
