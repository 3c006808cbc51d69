//! Relay-policy constants
//!
//! These are node-local defaults, not consensus rules. A transaction that
//! violates one of them may still be valid in a block.

/// Highest transaction version relayed by default
pub const MAX_STANDARD_VERSION: i64 = 2;

/// Maximum weight of a standard transaction
pub const MAX_STANDARD_TX_WEIGHT: u64 = 400_000;

/// Maximum scriptSig size: a 15-of-15 compressed-key P2SH multisig
/// redemption is 1627 bytes, rounded up.
pub const MAX_STANDARD_SCRIPTSIG_SIZE: usize = 1650;

/// Maximum sigops in a P2SH redeem script
pub const MAX_P2SH_SIGOPS: u32 = 15;

/// Maximum number of witness stack items (excluding the witness script)
/// for a standard P2WSH input
pub const MAX_STANDARD_P2WSH_STACK_ITEMS: usize = 100;

/// Maximum size of each P2WSH stack item
pub const MAX_STANDARD_P2WSH_STACK_ITEM_SIZE: usize = 80;

/// Maximum size of a standard witness script
pub const MAX_STANDARD_P2WSH_SCRIPT_SIZE: usize = 3600;

/// Witness discount: one non-witness byte weighs this many units
pub const WITNESS_SCALE_FACTOR: u64 = 4;

/// Default dust relay fee rate, sat per 1000 bytes
pub const DUST_RELAY_TX_FEE: i64 = 3000;

/// Default incremental relay fee rate, sat per 1000 bytes
pub const DEFAULT_INCREMENTAL_RELAY_FEE: i64 = 1000;

/// Bytes of virtual size charged per sigop
pub const DEFAULT_BYTES_PER_SIGOP: u64 = 20;

/// Bytes per sigop used for strict sizing
pub const DEFAULT_BYTES_PER_SIGOP_STRICT: u64 = 20;

/// Default maximum size of a null-data script (OP_RETURN + 80 bytes of data
/// + push overhead)
pub const MAX_OP_RETURN_RELAY: usize = 83;

/// Relay data-carrier outputs by default
pub const DEFAULT_ACCEPT_DATACARRIER: bool = true;

/// Relay bare multisig outputs by default
pub const DEFAULT_PERMIT_BAREMULTISIG: bool = true;

/// Sigops charged for an inaccurately counted CHECKMULTISIG
pub const MAX_PUBKEYS_PER_MULTISIG: u32 = 20;

/// Maximum script length
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Maximum size of a single pushed element
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Maximum combined size of the main and alt stacks
pub const MAX_STACK_SIZE: usize = 1000;

/// Maximum number of non-push operations in a script
pub const MAX_OPS_PER_SCRIPT: usize = 201;

/// No script verification flags
pub const SCRIPT_VERIFY_NONE: u32 = 0;

/// Evaluate P2SH subscripts (BIP16)
pub const SCRIPT_VERIFY_P2SH: u32 = 1 << 0;

/// Evaluate witness programs (BIP141)
pub const SCRIPT_VERIFY_WITNESS: u32 = 1 << 11;

/// Index marking the null prevout of a coinbase input
pub const COINBASE_PREVOUT_INDEX: u64 = 0xffffffff;
