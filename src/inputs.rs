//! Input standardness: bounding what P2SH redeem scripts may cost
//!
//! A P2SH output commits only to a hash; the redeem script is revealed by
//! the spender. Without this check a spender could reveal something like
//! `DUP CHECKSIG DROP` repeated a hundred times, valid but expensive to
//! verify.

use crate::coins::{spent_coin, CoinView};
use crate::constants::*;
use crate::error::Result;
use crate::interpreter::{eval_script, BaseSignatureChecker};
use crate::reject::{maybe_reject, IgnoreRejects, PolicyResult, RejectReason};
use crate::script::{is_push_only, sig_op_count};
use crate::segwit::compute_txid;
use crate::solver::{solve, TxOutType};
use crate::types::*;
use tracing::{debug, trace};

/// A redeem script recovered from a P2SH scriptSig
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemScript {
    /// Top stack item left by the scriptSig
    pub script: ByteString,
    /// Full stack left by the scriptSig, `script` included as the last item
    pub stack: Vec<ByteString>,
}

/// Run `script_sig` without signature checks and take its top stack item
///
/// Fails with `scriptsig-failure` if the scriptSig does not evaluate, or
/// `scriptcheck-missing` if it leaves nothing on the stack. Both are
/// structural and never ignorable.
pub fn unwrap_p2sh(script_sig: &[u8]) -> std::result::Result<RedeemScript, RejectReason> {
    let mut stack = Vec::new();
    if let Err(err) = eval_script(&mut stack, script_sig, SCRIPT_VERIFY_NONE, &BaseSignatureChecker) {
        trace!(error = %err, "scriptSig evaluation failed");
        return Err(RejectReason::ScriptsigFailure);
    }
    match stack.last() {
        Some(top) => Ok(RedeemScript { script: top.clone(), stack }),
        None => Err(RejectReason::ScriptcheckMissing),
    }
}

/// AreInputsStandard: do the inputs of `tx` spend their coins in a standard way?
///
/// - `script-unknown`: the spent output's script matches no template
/// - `scriptcheck-sigops`: a P2SH redeem script exceeds [`MAX_P2SH_SIGOPS`]
/// - `scriptsig-failure` / `scriptcheck-missing`: see [`unwrap_p2sh`]
///
/// Coinbase transactions always pass.
pub fn are_inputs_standard<V: CoinView + ?Sized>(
    tx: &Transaction,
    coins: &V,
    ignore: &IgnoreRejects,
) -> Result<PolicyResult> {
    if tx.is_coinbase() {
        return Ok(PolicyResult::Standard);
    }

    for (index, input) in tx.inputs.iter().enumerate() {
        let result = check_input(input, coins, ignore)?;
        if let PolicyResult::NonStandard(reason) = result {
            debug!(txid = %compute_txid(tx), input = index, %reason, "input is not standard");
            return Ok(result);
        }
    }

    Ok(PolicyResult::Standard)
}

fn check_input<V: CoinView + ?Sized>(
    input: &TransactionInput,
    coins: &V,
    ignore: &IgnoreRejects,
) -> Result<PolicyResult> {
    let prev_script = &spent_coin(coins, input)?.output.script_pubkey;

    let (script_type, _) = solve(prev_script);
    if script_type == TxOutType::NonStandard {
        maybe_reject!(ignore, RejectReason::ScriptUnknown);
    }

    if script_type != TxOutType::ScriptHash {
        return Ok(PolicyResult::Standard);
    }

    // Only reachable when scriptsig-not-pushonly was ignored; the input is
    // invalid anyway and is not worth evaluating here
    if !is_push_only(&input.script_sig) {
        trace!(prevout = %input.prevout, "skipping non-push-only P2SH scriptSig");
        return Ok(PolicyResult::Standard);
    }

    let redeem = match unwrap_p2sh(&input.script_sig) {
        Ok(redeem) => redeem,
        Err(reason) => return Ok(PolicyResult::NonStandard(reason)),
    };

    if sig_op_count(&redeem.script, true) > MAX_P2SH_SIGOPS {
        maybe_reject!(ignore, RejectReason::ScriptcheckSigops);
    }

    Ok(PolicyResult::Standard)
}
