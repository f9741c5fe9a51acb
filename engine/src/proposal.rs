//! Governance proposals and their lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;
use tribune_types::{Address, TxHash};

/// Lifecycle state of a proposal, derived from block timers plus the
/// strategy's verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    /// Voting window is open.
    Active,
    /// Passed; mandatory delay before execution.
    Timelocked,
    /// Passed and past timelock; may be executed.
    Executable,
    /// Every committed transaction has been executed. Terminal.
    Executed,
    /// Passed but the execution window elapsed without full execution. Terminal.
    Expired,
    /// Voting closed without meeting quorum and basis. Terminal.
    Failed,
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "active",
            Self::Timelocked => "timelocked",
            Self::Executable => "executable",
            Self::Executed => "executed",
            Self::Expired => "expired",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// A submitted proposal. Immutable after creation except for
/// `execution_counter`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    /// The strategy governing this proposal. Set once, never changed.
    pub strategy: Address,
    /// Content hashes of the committed transaction batch, in order.
    pub tx_hashes: Vec<TxHash>,
    /// Blocks between passing and becoming executable. Copied from engine
    /// config at submission; later config changes do not apply.
    pub timelock_period: u32,
    /// Blocks the proposal stays executable after the timelock.
    pub execution_period: u32,
    /// Number of committed hashes already executed. Monotonic, 0 ..= len.
    pub execution_counter: u32,
}

impl Proposal {
    /// Whether every committed transaction has been executed. Proposals
    /// with zero transactions are fully executed from the start.
    pub fn is_fully_executed(&self) -> bool {
        self.execution_counter as usize == self.tx_hashes.len()
    }
}
