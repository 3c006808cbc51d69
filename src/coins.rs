//! Previous-output lookup
//!
//! The policy checks never own a UTXO store; they read coins through
//! [`CoinView`], which a node implements over its own cache.

use crate::error::{PolicyError, Result};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An unspent output together with where it was created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub output: TransactionOutput,
    pub height: Natural,
    pub is_coinbase: bool,
    #[serde(default)]
    pub spent: bool,
}

impl Coin {
    pub fn new(output: TransactionOutput, height: Natural) -> Self {
        Coin { output, height, is_coinbase: false, spent: false }
    }

    pub fn is_spent(&self) -> bool {
        self.spent
    }
}

/// UTXO set: outpoint → coin
pub type UtxoSet = HashMap<OutPoint, Coin>;

/// Read-only access to coins by outpoint
pub trait CoinView {
    fn access_coin(&self, outpoint: &OutPoint) -> Option<&Coin>;
}

impl CoinView for UtxoSet {
    fn access_coin(&self, outpoint: &OutPoint) -> Option<&Coin> {
        self.get(outpoint)
    }
}

impl<V: CoinView + ?Sized> CoinView for &V {
    fn access_coin(&self, outpoint: &OutPoint) -> Option<&Coin> {
        (**self).access_coin(outpoint)
    }
}

/// Look up the coin spent by `input`, treating absence as a caller error
pub(crate) fn spent_coin<'a, V: CoinView + ?Sized>(
    view: &'a V,
    input: &TransactionInput,
) -> Result<&'a Coin> {
    view.access_coin(&input.prevout)
        .ok_or_else(|| PolicyError::MissingCoin(input.prevout.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_spending(outpoint: OutPoint) -> TransactionInput {
        TransactionInput {
            prevout: outpoint,
            script_sig: vec![],
            sequence: 0xffffffff,
            witness: vec![],
        }
    }

    #[test]
    fn test_spent_coin_found() {
        let outpoint = OutPoint { hash: [7; 32], index: 1 };
        let mut utxo_set = UtxoSet::new();
        utxo_set.insert(
            outpoint.clone(),
            Coin::new(TransactionOutput { value: 500, script_pubkey: vec![0x51] }, 10),
        );

        let coin = spent_coin(&utxo_set, &input_spending(outpoint)).unwrap();
        assert_eq!(coin.output.value, 500);
        assert!(!coin.is_spent());
    }

    #[test]
    fn test_spent_coin_missing() {
        let utxo_set = UtxoSet::new();
        let outpoint = OutPoint { hash: [9; 32], index: 3 };

        let err = spent_coin(&utxo_set, &input_spending(outpoint.clone())).unwrap_err();
        assert!(matches!(err, PolicyError::MissingCoin(op) if op == outpoint));
    }
}
