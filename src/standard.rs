//! Output classification and transaction-level standardness

use crate::config::PolicyConfig;
use crate::constants::*;
use crate::dust::is_dust;
use crate::error::Result;
use crate::reject::{maybe_reject, IgnoreRejects, PolicyResult, RejectReason};
use crate::script::is_push_only;
use crate::segwit::{compute_txid, get_transaction_weight};
use crate::solver::{solve, TxOutType};
use crate::types::*;
use tracing::{debug, trace};

/// Classify an output script and decide whether it is standard
///
/// The type is always returned, even for a non-standard script, so callers
/// that ignore the `scriptpubkey` rejection can still apply the per-type
/// rules (dust, bare multisig, data-carrier count).
pub fn classify(script_pubkey: &[u8], witness_enabled: bool, config: &PolicyConfig) -> (TxOutType, bool) {
    let (script_type, solutions) = solve(script_pubkey);

    let standard = match script_type {
        TxOutType::NonStandard => false,
        TxOutType::Multisig => {
            // Up to x-of-3
            let m = solutions.first().and_then(|s| s.first()).copied().unwrap_or(0);
            let n = solutions.last().and_then(|s| s.first()).copied().unwrap_or(0);
            (1..=3).contains(&n) && (1..=n).contains(&m)
        }
        TxOutType::NullData => {
            config.accept_datacarrier && script_pubkey.len() <= config.max_datacarrier_bytes
        }
        TxOutType::WitnessV0KeyHash | TxOutType::WitnessV0ScriptHash => witness_enabled,
        _ => true,
    };

    (script_type, standard)
}

/// IsStandardTx: is `tx` acceptable for relay under `config`?
///
/// Rules, in order, each skipped when named in `ignore`:
/// 1. `version`: 1 ≤ version ≤ [`MAX_STANDARD_VERSION`]
/// 2. `tx-size`: weight < [`MAX_STANDARD_TX_WEIGHT`]
/// 3. `scriptsig-size`: each scriptSig ≤ [`MAX_STANDARD_SCRIPTSIG_SIZE`]
/// 4. `scriptsig-not-pushonly`: each scriptSig only pushes data
/// 5. `scriptpubkey`: each output passes [`classify`]
/// 6. `bare-multisig`: bare multisig only if permitted
/// 7. `dust`: no dust outputs at the dust relay fee
/// 8. `multi-op-return`: at most one null-data output
pub fn is_standard_tx(
    tx: &Transaction,
    witness_enabled: bool,
    config: &PolicyConfig,
    ignore: &IgnoreRejects,
) -> Result<PolicyResult> {
    let result = check_standard_tx(tx, witness_enabled, config, ignore)?;
    if let PolicyResult::NonStandard(reason) = result {
        debug!(txid = %compute_txid(tx), %reason, "transaction is not standard");
    }
    Ok(result)
}

fn check_standard_tx(
    tx: &Transaction,
    witness_enabled: bool,
    config: &PolicyConfig,
    ignore: &IgnoreRejects,
) -> Result<PolicyResult> {
    if tx.version > MAX_STANDARD_VERSION || tx.version < 1 {
        maybe_reject!(ignore, RejectReason::Version);
    }

    if !ignore.contains(RejectReason::TxSize) {
        let weight = get_transaction_weight(tx);
        if weight >= MAX_STANDARD_TX_WEIGHT {
            return Ok(PolicyResult::NonStandard(RejectReason::TxSize));
        }
    }

    let check_push_only = !ignore.contains(RejectReason::ScriptsigNotPushonly);
    if !ignore.contains(RejectReason::ScriptsigSize) || check_push_only {
        for input in &tx.inputs {
            if input.script_sig.len() > MAX_STANDARD_SCRIPTSIG_SIZE {
                maybe_reject!(ignore, RejectReason::ScriptsigSize);
            }
            if check_push_only && !is_push_only(&input.script_sig) {
                return Ok(PolicyResult::NonStandard(RejectReason::ScriptsigNotPushonly));
            }
        }
    }

    let output_reasons = [
        RejectReason::Scriptpubkey,
        RejectReason::BareMultisig,
        RejectReason::Dust,
        RejectReason::MultiOpReturn,
    ];
    if ignore.contains_all(&output_reasons) {
        trace!("output checks skipped");
        return Ok(PolicyResult::Standard);
    }

    let mut data_outputs = 0usize;
    for output in &tx.outputs {
        let (script_type, standard) = classify(&output.script_pubkey, witness_enabled, config);
        if !standard {
            maybe_reject!(ignore, RejectReason::Scriptpubkey);
        }

        if script_type == TxOutType::NullData {
            data_outputs += 1;
            continue;
        }

        if script_type == TxOutType::Multisig && !config.permit_bare_multisig {
            maybe_reject!(ignore, RejectReason::BareMultisig);
        }
        if is_dust(output, &config.dust_relay_fee) {
            maybe_reject!(ignore, RejectReason::Dust);
        }
    }

    // Only one OP_RETURN output is permitted
    if data_outputs > 1 {
        maybe_reject!(ignore, RejectReason::MultiOpReturn);
    }

    Ok(PolicyResult::Standard)
}
