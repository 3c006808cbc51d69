//! Witness standardness
//!
//! Witness data is discounted, so a spender could otherwise bloat it
//! cheaply. P2WSH stacks are bounded in script size, item count and item
//! size; other witness versions are left alone for future soft forks.

use crate::coins::{spent_coin, CoinView};
use crate::constants::*;
use crate::error::Result;
use crate::inputs::unwrap_p2sh;
use crate::reject::{maybe_reject, IgnoreRejects, PolicyResult, RejectReason};
use crate::script::{is_pay_to_script_hash, witness_program};
use crate::segwit::{compute_txid, compute_wtxid};
use crate::types::*;
use tracing::debug;

/// IsWitnessStandard: is the witness data of `tx` within relay limits?
///
/// Inputs with an empty witness are skipped. For the rest, the spent script
/// (unwrapped once if P2SH) must be a witness program, otherwise the input
/// fails with the non-ignorable `nonwitness-input`. P2WSH inputs are then
/// held to `script-size`, `stackitem-count` and `stackitem-size`.
pub fn is_witness_standard<V: CoinView + ?Sized>(
    tx: &Transaction,
    coins: &V,
    ignore: &IgnoreRejects,
) -> Result<PolicyResult> {
    if tx.is_coinbase() {
        return Ok(PolicyResult::Standard);
    }

    for (index, input) in tx.inputs.iter().enumerate() {
        if input.witness.is_empty() {
            continue;
        }

        let result = check_witness(input, coins, ignore)?;
        if let PolicyResult::NonStandard(reason) = result {
            debug!(
                txid = %compute_txid(tx),
                wtxid = %compute_wtxid(tx),
                input = index,
                %reason,
                "witness is not standard"
            );
            return Ok(result);
        }
    }

    Ok(PolicyResult::Standard)
}

fn check_witness<V: CoinView + ?Sized>(
    input: &TransactionInput,
    coins: &V,
    ignore: &IgnoreRejects,
) -> Result<PolicyResult> {
    let prev_script = &spent_coin(coins, input)?.output.script_pubkey;

    // Push-only and the script hash are verified later; here the redeem
    // script is only needed to find the witness program
    let redeem;
    let effective_script: &[u8] = if is_pay_to_script_hash(prev_script) {
        redeem = match unwrap_p2sh(&input.script_sig) {
            Ok(redeem) => redeem,
            Err(reason) => return Ok(PolicyResult::NonStandard(reason)),
        };
        &redeem.script
    } else {
        prev_script
    };

    let Some((version, program)) = witness_program(effective_script) else {
        return Ok(PolicyResult::NonStandard(RejectReason::NonwitnessInput));
    };

    if version == 0 && program.len() == 32 {
        let Some((witness_script, stack_items)) = input.witness.split_last() else {
            return Ok(PolicyResult::Standard);
        };

        if witness_script.len() > MAX_STANDARD_P2WSH_SCRIPT_SIZE {
            maybe_reject!(ignore, RejectReason::ScriptSize);
        }
        if stack_items.len() > MAX_STANDARD_P2WSH_STACK_ITEMS {
            maybe_reject!(ignore, RejectReason::StackitemCount);
        }
        if stack_items.iter().any(|item| item.len() > MAX_STANDARD_P2WSH_STACK_ITEM_SIZE) {
            maybe_reject!(ignore, RejectReason::StackitemSize);
        }
    }

    Ok(PolicyResult::Standard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins::{Coin, UtxoSet};
    use crate::script::opcodes::*;
    use crate::script::push_data;

    fn p2wsh() -> Vec<u8> {
        let mut script = vec![OP_0, 0x20];
        script.extend_from_slice(&[0x21; 32]);
        script
    }

    fn p2sh() -> Vec<u8> {
        let mut script = vec![OP_HASH160, 0x14];
        script.extend_from_slice(&[0x31; 20]);
        script.push(OP_EQUAL);
        script
    }

    fn spend(script_pubkey: Vec<u8>, script_sig: Vec<u8>, witness: Witness) -> (Transaction, UtxoSet) {
        let prevout = OutPoint { hash: [0x41; 32], index: 0 };
        let mut utxo_set = UtxoSet::new();
        utxo_set.insert(prevout.clone(), Coin::new(TransactionOutput { value: 50_000, script_pubkey }, 100));
        let tx = Transaction {
            version: 2,
            inputs: vec![TransactionInput { prevout, script_sig, sequence: 0xffffffff, witness }],
            outputs: vec![],
            lock_time: 0,
        };
        (tx, utxo_set)
    }

    #[test]
    fn test_p2wsh_within_limits() {
        let witness = vec![vec![0x01; MAX_STANDARD_P2WSH_STACK_ITEM_SIZE], vec![OP_1]];
        let (tx, coins) = spend(p2wsh(), vec![], witness);
        assert!(is_witness_standard(&tx, &coins, &IgnoreRejects::none()).unwrap().is_standard());
    }

    #[test]
    fn test_p2wsh_limits() {
        let oversized_script = vec![vec![OP_1; MAX_STANDARD_P2WSH_SCRIPT_SIZE + 1]];
        let too_many_items = vec![vec![]; MAX_STANDARD_P2WSH_STACK_ITEMS + 2];
        let oversized_item = vec![vec![0x01; MAX_STANDARD_P2WSH_STACK_ITEM_SIZE + 1], vec![OP_1]];

        for (witness, reason) in [
            (oversized_script, RejectReason::ScriptSize),
            (too_many_items, RejectReason::StackitemCount),
            (oversized_item, RejectReason::StackitemSize),
        ] {
            let (tx, coins) = spend(p2wsh(), vec![], witness);
            assert_eq!(
                is_witness_standard(&tx, &coins, &IgnoreRejects::none()).unwrap(),
                PolicyResult::NonStandard(reason)
            );
            let ignore = IgnoreRejects::none().with(reason);
            assert!(is_witness_standard(&tx, &coins, &ignore).unwrap().is_standard());
        }
    }

    #[test]
    fn test_witness_on_non_witness_output() {
        let mut p2pkh = vec![OP_DUP, OP_HASH160, 0x14];
        p2pkh.extend_from_slice(&[0x51; 20]);
        p2pkh.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);

        let (tx, coins) = spend(p2pkh, vec![], vec![vec![0x01]]);
        let ignore = IgnoreRejects::none().with(RejectReason::NonwitnessInput);
        assert_eq!(
            is_witness_standard(&tx, &coins, &ignore).unwrap(),
            PolicyResult::NonStandard(RejectReason::NonwitnessInput)
        );
    }

    #[test]
    fn test_empty_witness_skipped() {
        let (tx, coins) = spend(vec![OP_1], vec![], vec![]);
        assert!(is_witness_standard(&tx, &coins, &IgnoreRejects::none()).unwrap().is_standard());
    }

    #[test]
    fn test_p2sh_wrapped_p2wsh_is_unwrapped() {
        let script_sig = push_data(&p2wsh());
        let oversized_item = vec![vec![0x01; MAX_STANDARD_P2WSH_STACK_ITEM_SIZE + 1], vec![OP_1]];
        let (tx, coins) = spend(p2sh(), script_sig, oversized_item);
        assert_eq!(
            is_witness_standard(&tx, &coins, &IgnoreRejects::none()).unwrap(),
            PolicyResult::NonStandard(RejectReason::StackitemSize)
        );
    }

    #[test]
    fn test_p2sh_structural_failures() {
        let (tx, coins) = spend(p2sh(), vec![], vec![vec![0x01]]);
        assert_eq!(
            is_witness_standard(&tx, &coins, &IgnoreRejects::none()).unwrap(),
            PolicyResult::NonStandard(RejectReason::ScriptcheckMissing)
        );

        let (tx, coins) = spend(p2sh(), vec![0x05, 0x01], vec![vec![0x01]]);
        assert_eq!(
            is_witness_standard(&tx, &coins, &IgnoreRejects::none()).unwrap(),
            PolicyResult::NonStandard(RejectReason::ScriptsigFailure)
        );
    }

    #[test]
    fn test_p2sh_script_sig_evaluated_before_unwrap() {
        // The multisig leaves a false result that OP_DROP discards
        let mut script_sig = vec![OP_0, OP_0, OP_0, OP_CHECKMULTISIG, OP_DROP];
        script_sig.extend_from_slice(&push_data(&p2wsh()));
        let (tx, coins) = spend(p2sh(), script_sig.clone(), vec![vec![OP_1]]);
        assert!(is_witness_standard(&tx, &coins, &IgnoreRejects::none()).unwrap().is_standard());

        let oversized_item = vec![vec![0x01; MAX_STANDARD_P2WSH_STACK_ITEM_SIZE + 1], vec![OP_1]];
        let (tx, coins) = spend(p2sh(), script_sig, oversized_item);
        assert_eq!(
            is_witness_standard(&tx, &coins, &IgnoreRejects::none()).unwrap(),
            PolicyResult::NonStandard(RejectReason::StackitemSize)
        );
    }

    #[test]
    fn test_missing_coin_is_an_error() {
        let (tx, _) = spend(p2wsh(), vec![], vec![vec![OP_1]]);
        let empty = UtxoSet::new();
        assert!(is_witness_standard(&tx, &empty, &IgnoreRejects::none()).is_err());
    }
}
