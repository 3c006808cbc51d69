//! # Relay-Policy
//!
//! Node-local transaction standardness rules: the checks that decide
//! whether a consensus-valid transaction is relayed and kept in the memory
//! pool.
//!
//! ## Architecture
//!
//! The checks are layered, leaves first:
//! - dust model ([`dust`]) and fee rates ([`fee`])
//! - output-script solver and classifier ([`solver`], [`standard::classify`])
//! - sigop and virtual-size accounting ([`sigops`], [`segwit`])
//! - transaction-level standardness ([`standard::is_standard_tx`])
//! - input standardness for P2SH spends ([`inputs`])
//! - witness standardness ([`witness`])
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: checks read the transaction, the coin view and a
//!    [`PolicyConfig`]; nothing is mutated or cached
//! 2. **Stable Reasons**: every rejection is a [`RejectReason`] with a fixed
//!    identifier, and callers can waive individual rules per call
//! 3. **Structural Failures Stand**: malformed scriptSigs and misplaced
//!    witnesses are reported even when their reason is in the ignore set
//!
//! ## Usage
//!
//! ```rust
//! use relay_policy::*;
//!
//! let policy = RelayPolicy::new(PolicyConfig::default());
//! let tx = Transaction {
//!     version: 2,
//!     inputs: vec![TransactionInput {
//!         prevout: OutPoint { hash: [1; 32], index: 0 },
//!         script_sig: vec![],
//!         sequence: 0xffffffff,
//!         witness: vec![],
//!     }],
//!     outputs: vec![TransactionOutput {
//!         value: 1000,
//!         script_pubkey: vec![0x6a, 0x01, 0x2a], // OP_RETURN <42>
//!     }],
//!     lock_time: 0,
//! };
//! let result = policy.is_standard_tx(&tx, true, &IgnoreRejects::none()).unwrap();
//! assert_eq!(result, PolicyResult::Standard);
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod reject;
pub mod fee;
pub mod config;
pub mod coins;
pub mod script;
pub mod interpreter;
pub mod solver;
pub mod segwit;
pub mod sigops;
pub mod dust;
pub mod standard;
pub mod inputs;
pub mod witness;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use error::{PolicyError, Result, ScriptError};
pub use reject::{IgnoreRejects, PolicyResult, RejectReason};
pub use fee::FeeRate;
pub use config::PolicyConfig;
pub use coins::{Coin, CoinView, UtxoSet};
pub use solver::TxOutType;

/// Relay policy bound to one configuration
///
/// Construct once at startup and share by reference; every method is a
/// read-only check.
///
/// # Examples
///
/// ```
/// use relay_policy::*;
///
/// let policy = RelayPolicy::default();
/// assert_eq!(policy.config().dust_relay_fee, FeeRate::new(DUST_RELAY_TX_FEE));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RelayPolicy {
    config: PolicyConfig,
}

impl RelayPolicy {
    pub fn new(config: PolicyConfig) -> Self {
        RelayPolicy { config }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Check a transaction's own shape: version, weight, scriptSigs and outputs
    ///
    /// # Examples
    ///
    /// ```
    /// use relay_policy::*;
    ///
    /// let policy = RelayPolicy::default();
    /// let op_return = TransactionOutput { value: 0, script_pubkey: vec![0x6a] };
    /// let tx = Transaction {
    ///     version: 1,
    ///     inputs: vec![TransactionInput {
    ///         prevout: OutPoint { hash: [1; 32], index: 0 },
    ///         script_sig: vec![],
    ///         sequence: 0xffffffff,
    ///         witness: vec![],
    ///     }],
    ///     outputs: vec![op_return.clone(), op_return],
    ///     lock_time: 0,
    /// };
    ///
    /// let result = policy.is_standard_tx(&tx, true, &IgnoreRejects::none()).unwrap();
    /// assert_eq!(result, PolicyResult::NonStandard(RejectReason::MultiOpReturn));
    ///
    /// let ignore = IgnoreRejects::none().with(RejectReason::MultiOpReturn);
    /// assert!(policy.is_standard_tx(&tx, true, &ignore).unwrap().is_standard());
    /// ```
    pub fn is_standard_tx(
        &self,
        tx: &Transaction,
        witness_enabled: bool,
        ignore: &IgnoreRejects,
    ) -> Result<PolicyResult> {
        standard::is_standard_tx(tx, witness_enabled, &self.config, ignore)
    }

    /// Check the scripts spent by `tx`; see [`inputs::are_inputs_standard`]
    pub fn are_inputs_standard<V: CoinView + ?Sized>(
        &self,
        tx: &Transaction,
        coins: &V,
        ignore: &IgnoreRejects,
    ) -> Result<PolicyResult> {
        inputs::are_inputs_standard(tx, coins, ignore)
    }

    /// Check witness data; see [`witness::is_witness_standard`]
    pub fn is_witness_standard<V: CoinView + ?Sized>(
        &self,
        tx: &Transaction,
        coins: &V,
        ignore: &IgnoreRejects,
    ) -> Result<PolicyResult> {
        witness::is_witness_standard(tx, coins, ignore)
    }

    /// Classify an output script
    ///
    /// # Examples
    ///
    /// ```
    /// use relay_policy::*;
    ///
    /// let policy = RelayPolicy::default();
    /// let (kind, standard) = policy.classify(&[0x51], true);
    /// assert_eq!(kind, TxOutType::NonStandard);
    /// assert!(!standard);
    /// ```
    pub fn classify(&self, script_pubkey: &[u8], witness_enabled: bool) -> (TxOutType, bool) {
        standard::classify(script_pubkey, witness_enabled, &self.config)
    }

    /// Minimum non-dust value of `output` at the configured dust relay fee
    ///
    /// # Examples
    ///
    /// ```
    /// use relay_policy::*;
    ///
    /// let policy = RelayPolicy::default();
    /// let mut script_pubkey = vec![0x76, 0xa9, 0x14];
    /// script_pubkey.extend_from_slice(&[0; 20]);
    /// script_pubkey.extend_from_slice(&[0x88, 0xac]);
    /// let output = TransactionOutput { value: 545, script_pubkey };
    ///
    /// assert_eq!(policy.dust_threshold(&output), 546);
    /// assert!(policy.is_dust(&output));
    /// ```
    pub fn dust_threshold(&self, output: &TransactionOutput) -> Integer {
        dust::get_dust_threshold(output, &self.config.dust_relay_fee)
    }

    pub fn is_dust(&self, output: &TransactionOutput) -> bool {
        dust::is_dust(output, &self.config.dust_relay_fee)
    }

    /// Virtual size from weight and sigop cost
    ///
    /// # Examples
    ///
    /// ```
    /// use relay_policy::*;
    ///
    /// let policy = RelayPolicy::default();
    /// assert_eq!(policy.virtual_size(1000, 0), 250);
    /// assert_eq!(policy.virtual_size(0, 20), 100);
    /// ```
    pub fn virtual_size(&self, weight: Natural, sigop_cost: Natural) -> Natural {
        sigops::get_virtual_transaction_size(weight, sigop_cost, self.config.bytes_per_sigop)
    }

    /// Virtual size of `tx`, weight computed from its serialization
    pub fn transaction_virtual_size(&self, tx: &Transaction, sigop_cost: Natural) -> Natural {
        sigops::get_transaction_virtual_size(tx, sigop_cost, self.config.bytes_per_sigop)
    }

    /// Virtual size using the strict bytes-per-sigop tunable
    pub fn strict_virtual_size(&self, weight: Natural, sigop_cost: Natural) -> Natural {
        sigops::get_virtual_transaction_size(weight, sigop_cost, self.config.bytes_per_sigop_strict)
    }

    /// Sigop cost of `tx` in weight units
    ///
    /// # Panics
    ///
    /// If a coin spent by `tx` is marked spent in `coins`.
    pub fn accurate_sigop_cost<V: CoinView + ?Sized>(
        &self,
        tx: &Transaction,
        coins: &V,
        flags: u32,
    ) -> Result<Natural> {
        sigops::get_accurate_transaction_sigop_cost(tx, coins, flags)
    }
}
