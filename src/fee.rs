//! Fee rates

use crate::types::Integer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fee rate in satoshis per 1000 bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeRate {
    sat_per_k: Integer,
}

impl FeeRate {
    pub const fn new(sat_per_k: Integer) -> Self {
        FeeRate { sat_per_k }
    }

    pub fn sat_per_k(&self) -> Integer {
        self.sat_per_k
    }

    /// Fee for `size` bytes at this rate
    ///
    /// Truncates toward zero, except that a non-zero rate applied to a
    /// non-empty size never rounds down to a zero fee.
    pub fn fee(&self, size: usize) -> Integer {
        let size = size as Integer;
        let fee = self.sat_per_k.saturating_mul(size) / 1000;

        if fee == 0 && size != 0 {
            if self.sat_per_k > 0 {
                return 1;
            }
            if self.sat_per_k < 0 {
                return -1;
            }
        }
        fee
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sat/kB", self.sat_per_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_truncates() {
        let rate = FeeRate::new(3000);
        assert_eq!(rate.fee(182), 546);
        assert_eq!(rate.fee(98), 294);
        assert_eq!(FeeRate::new(1000).fee(1999), 1999);
        assert_eq!(FeeRate::new(1).fee(999), 1);
    }

    #[test]
    fn test_fee_never_rounds_to_zero() {
        assert_eq!(FeeRate::new(1).fee(1), 1);
        assert_eq!(FeeRate::new(-1).fee(1), -1);
        assert_eq!(FeeRate::new(0).fee(500), 0);
        assert_eq!(FeeRate::new(1000).fee(0), 0);
    }

    #[test]
    fn test_serde_transparent() {
        let rate: FeeRate = serde_json::from_str("3000").unwrap();
        assert_eq!(rate, FeeRate::new(3000));
        assert_eq!(serde_json::to_string(&rate).unwrap(), "3000");
    }
}
