//! Error types for relay-policy checks
//!
//! Policy rejections are not errors: they come back as
//! [`PolicyResult::NonStandard`](crate::reject::PolicyResult). These variants
//! cover caller mistakes and malformed inputs to the helpers.

use crate::types::OutPoint;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Coin not found in view: {0}")]
    MissingCoin(OutPoint),

    #[error("Invalid policy configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures raised by the non-verifying script evaluator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("script exceeds {0} bytes")]
    ScriptSize(usize),

    #[error("push of {0} bytes exceeds element size limit")]
    PushSize(usize),

    #[error("truncated push at offset {0}")]
    BadPush(usize),

    #[error("operation limit exceeded")]
    OpCount,

    #[error("multisig public key count out of range")]
    PubkeyCount,

    #[error("multisig signature count out of range")]
    SigCount,

    #[error("stack size limit exceeded")]
    StackSize,

    #[error("invalid stack operation")]
    InvalidStackOperation,

    #[error("script number overflow")]
    InvalidNumber,

    #[error("disabled opcode 0x{0:02x}")]
    DisabledOpcode(u8),

    #[error("unsupported opcode 0x{0:02x}")]
    BadOpcode(u8),

    #[error("unbalanced conditional")]
    UnbalancedConditional,

    #[error("OP_RETURN encountered")]
    OpReturn,

    #[error("VERIFY failed")]
    Verify,
}

pub type Result<T> = std::result::Result<T, PolicyError>;
