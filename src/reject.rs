//! Rejection reasons and the per-call ignore set
//!
//! Every policy rule has a stable identifier. A caller may pass an
//! [`IgnoreRejects`] set naming rules to skip for one call; structural
//! failures are never looked up in it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why a transaction was judged non-standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    Version,
    TxSize,
    ScriptsigSize,
    ScriptsigNotPushonly,
    Scriptpubkey,
    BareMultisig,
    Dust,
    MultiOpReturn,
    ScriptUnknown,
    ScriptsigFailure,
    ScriptcheckMissing,
    ScriptcheckSigops,
    NonwitnessInput,
    ScriptSize,
    StackitemCount,
    StackitemSize,
}

impl RejectReason {
    pub const ALL: [RejectReason; 16] = [
        RejectReason::Version,
        RejectReason::TxSize,
        RejectReason::ScriptsigSize,
        RejectReason::ScriptsigNotPushonly,
        RejectReason::Scriptpubkey,
        RejectReason::BareMultisig,
        RejectReason::Dust,
        RejectReason::MultiOpReturn,
        RejectReason::ScriptUnknown,
        RejectReason::ScriptsigFailure,
        RejectReason::ScriptcheckMissing,
        RejectReason::ScriptcheckSigops,
        RejectReason::NonwitnessInput,
        RejectReason::ScriptSize,
        RejectReason::StackitemCount,
        RejectReason::StackitemSize,
    ];

    /// Stable identifier used in logs, RPC replies and operator config
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Version => "version",
            RejectReason::TxSize => "tx-size",
            RejectReason::ScriptsigSize => "scriptsig-size",
            RejectReason::ScriptsigNotPushonly => "scriptsig-not-pushonly",
            RejectReason::Scriptpubkey => "scriptpubkey",
            RejectReason::BareMultisig => "bare-multisig",
            RejectReason::Dust => "dust",
            RejectReason::MultiOpReturn => "multi-op-return",
            RejectReason::ScriptUnknown => "script-unknown",
            RejectReason::ScriptsigFailure => "scriptsig-failure",
            RejectReason::ScriptcheckMissing => "scriptcheck-missing",
            RejectReason::ScriptcheckSigops => "scriptcheck-sigops",
            RejectReason::NonwitnessInput => "nonwitness-input",
            RejectReason::ScriptSize => "script-size",
            RejectReason::StackitemCount => "stackitem-count",
            RejectReason::StackitemSize => "stackitem-size",
        }
    }

    /// Structural failures mean the transaction is malformed relative to
    /// what it spends. They cannot be waived.
    pub fn is_ignorable(&self) -> bool {
        !matches!(
            self,
            RejectReason::ScriptsigFailure
                | RejectReason::ScriptcheckMissing
                | RejectReason::NonwitnessInput
        )
    }

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised rejection identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rejection reason: {0}")]
pub struct UnknownReason(pub String);

impl FromStr for RejectReason {
    type Err = UnknownReason;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        RejectReason::ALL
            .iter()
            .copied()
            .find(|reason| reason.as_str() == s)
            .ok_or_else(|| UnknownReason(s.to_string()))
    }
}

/// Set of rejection reasons to bypass for a single check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IgnoreRejects(u32);

impl IgnoreRejects {
    pub const fn none() -> Self {
        IgnoreRejects(0)
    }

    pub fn insert(&mut self, reason: RejectReason) {
        self.0 |= reason.bit();
    }

    pub fn remove(&mut self, reason: RejectReason) {
        self.0 &= !reason.bit();
    }

    pub fn with(mut self, reason: RejectReason) -> Self {
        self.insert(reason);
        self
    }

    pub fn contains(&self, reason: RejectReason) -> bool {
        self.0 & reason.bit() != 0
    }

    pub fn contains_all(&self, reasons: &[RejectReason]) -> bool {
        reasons.iter().all(|reason| self.contains(*reason))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = RejectReason> + '_ {
        RejectReason::ALL.iter().copied().filter(move |r| self.contains(*r))
    }
}

impl FromIterator<RejectReason> for IgnoreRejects {
    fn from_iter<I: IntoIterator<Item = RejectReason>>(iter: I) -> Self {
        let mut set = IgnoreRejects::none();
        for reason in iter {
            set.insert(reason);
        }
        set
    }
}

/// Parses a comma-separated list such as `"dust,multi-op-return"`
impl FromStr for IgnoreRejects {
    type Err = UnknownReason;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(RejectReason::from_str)
            .collect()
    }
}

impl Serialize for IgnoreRejects {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for IgnoreRejects {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let reasons = Vec::<RejectReason>::deserialize(deserializer)?;
        Ok(reasons.into_iter().collect())
    }
}

/// Outcome of a standardness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyResult {
    Standard,
    NonStandard(RejectReason),
}

impl PolicyResult {
    pub fn is_standard(&self) -> bool {
        matches!(self, PolicyResult::Standard)
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            PolicyResult::Standard => None,
            PolicyResult::NonStandard(reason) => Some(*reason),
        }
    }
}

/// Return `NonStandard(reason)` from the enclosing check unless the caller
/// ignores `reason`.
macro_rules! maybe_reject {
    ($ignore:expr, $reason:expr) => {
        if !$ignore.contains($reason) {
            return Ok($crate::reject::PolicyResult::NonStandard($reason));
        }
    };
}

pub(crate) use maybe_reject;
