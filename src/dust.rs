//! Dust thresholds
//!
//! An output is dust when spending it would cost more in fees, at the dust
//! relay rate, than it is worth. The cost is estimated from the size of the
//! output plus a typical input spending it:
//!
//! - non-witness: 34-byte P2PKH output + 148-byte input = 182 bytes,
//!   546 sat at the default 3000 sat/kB;
//! - witness: 31-byte P2WPKH output + 67-byte input (signature discounted)
//!   = 98 bytes, 294 sat at the default rate.

use crate::constants::WITNESS_SCALE_FACTOR;
use crate::fee::FeeRate;
use crate::script::{is_unspendable, is_witness_program};
use crate::segwit::output_serialized_size;
use crate::types::*;

/// Outpoint, scriptSig length and sequence of a spending input
const SPEND_SKELETON_SIZE: usize = 32 + 4 + 1 + 4;

/// Typical unlocking data: 72-byte signature and 33-byte key with their pushes
const SPEND_UNLOCK_SIZE: usize = 107;

/// Minimum non-dust value for `output` at `dust_relay_fee`
///
/// Zero for provably unspendable outputs.
pub fn get_dust_threshold(output: &TransactionOutput, dust_relay_fee: &FeeRate) -> Integer {
    if is_unspendable(&output.script_pubkey) {
        return 0;
    }

    let mut size = output_serialized_size(output);
    if is_witness_program(&output.script_pubkey) {
        size += SPEND_SKELETON_SIZE + SPEND_UNLOCK_SIZE / WITNESS_SCALE_FACTOR as usize;
    } else {
        size += SPEND_SKELETON_SIZE + SPEND_UNLOCK_SIZE;
    }

    dust_relay_fee.fee(size)
}

pub fn is_dust(output: &TransactionOutput, dust_relay_fee: &FeeRate) -> bool {
    output.value < get_dust_threshold(output, dust_relay_fee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DUST_RELAY_TX_FEE;

    fn p2pkh(value: Integer) -> TransactionOutput {
        let mut script_pubkey = vec![0x76, 0xa9, 0x14];
        script_pubkey.extend_from_slice(&[0x11; 20]);
        script_pubkey.extend_from_slice(&[0x88, 0xac]);
        TransactionOutput { value, script_pubkey }
    }

    fn p2wpkh(value: Integer) -> TransactionOutput {
        let mut script_pubkey = vec![0x00, 0x14];
        script_pubkey.extend_from_slice(&[0x22; 20]);
        TransactionOutput { value, script_pubkey }
    }

    #[test]
    fn test_p2pkh_threshold() {
        let rate = FeeRate::new(DUST_RELAY_TX_FEE);
        assert_eq!(get_dust_threshold(&p2pkh(0), &rate), 546);
        assert!(is_dust(&p2pkh(545), &rate));
        assert!(!is_dust(&p2pkh(546), &rate));
    }

    #[test]
    fn test_p2wpkh_threshold() {
        let rate = FeeRate::new(DUST_RELAY_TX_FEE);
        assert_eq!(get_dust_threshold(&p2wpkh(0), &rate), 294);
        assert!(is_dust(&p2wpkh(293), &rate));
        assert!(!is_dust(&p2wpkh(294), &rate));
    }

    #[test]
    fn test_threshold_scales_with_rate() {
        assert_eq!(get_dust_threshold(&p2pkh(0), &FeeRate::new(1000)), 182);
        assert_eq!(get_dust_threshold(&p2wpkh(0), &FeeRate::new(1000)), 98);
        assert_eq!(get_dust_threshold(&p2pkh(0), &FeeRate::new(0)), 0);
    }

    #[test]
    fn test_unspendable_is_never_dust() {
        let rate = FeeRate::new(DUST_RELAY_TX_FEE);
        let op_return = TransactionOutput { value: 0, script_pubkey: vec![0x6a, 0x01, 0x00] };
        assert_eq!(get_dust_threshold(&op_return, &rate), 0);
        assert!(!is_dust(&op_return, &rate));

        let oversized = TransactionOutput { value: 0, script_pubkey: vec![0x51; 10_001] };
        assert!(!is_dust(&oversized, &rate));
    }
}
