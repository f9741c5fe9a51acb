//! The strategy interface consumed by the proposal engine.

use crate::error::VotingError;
use serde::{Deserialize, Serialize};
use tribune_types::{Address, BlockNumber, ProposalId};

/// Fixed denominator for all ratio-based parameters (quorum, basis).
/// Numerators must never exceed it.
pub const DENOMINATOR: u128 = 1_000_000;

/// A voter's choice on a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteChoice {
    No,
    Yes,
    Abstain,
}

impl VoteChoice {
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::No => 0,
            Self::Yes => 1,
            Self::Abstain => 2,
        }
    }
}

impl TryFrom<u8> for VoteChoice {
    type Error = VotingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::No),
            1 => Ok(Self::Yes),
            2 => Ok(Self::Abstain),
            other => Err(VotingError::InvalidVoteChoice(other)),
        }
    }
}

/// An ownership claim supplied with a non-fungible vote: "I control this
/// token of this collection". Fungible votes pass an empty claim slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaim {
    pub collection: Address,
    pub token_id: u64,
}

/// Records emitted by strategies for off-chain observers, drained by the
/// embedder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StrategyEvent {
    /// A proposal's voting window was opened.
    ProposalInitialized {
        proposal_id: ProposalId,
        voting_end_block: BlockNumber,
    },
    /// A vote was cast and tallied.
    VoteCast {
        proposal_id: ProposalId,
        voter: Address,
        choice: VoteChoice,
        weight: u128,
    },
    /// Configuration changes.
    QuorumNumeratorUpdated { numerator: u128 },
    QuorumThresholdUpdated { threshold: u128 },
    BasisNumeratorUpdated { numerator: u128 },
    ProposerWeightThresholdUpdated { threshold: u128 },
    VotingPeriodUpdated { blocks: u32 },
    CollectionRegistered { collection: Address, weight: u128 },
}

/// A pluggable vote-tallying policy.
///
/// The engine never branches on the concrete strategy type; it stores
/// strategies as trait objects and calls this interface only. Each strategy
/// instance serves exactly one engine (the address registered at setup) and
/// is the sole source of truth for its proposals' verdicts.
pub trait VotingStrategy {
    /// Open the voting window for a new proposal id. Callable only by the
    /// registered engine; fails with [`VotingError::Unauthorized`] otherwise.
    fn initialize_proposal(
        &mut self,
        caller: &Address,
        proposal_id: ProposalId,
        at: BlockNumber,
    ) -> Result<(), VotingError>;

    /// Cast a vote. `claims` carries the (collection, token id) ownership
    /// claims for non-fungible strategies; fungible strategies ignore it.
    /// Votes cast exactly at the voting-end block are the last counted.
    fn vote(
        &mut self,
        voter: &Address,
        proposal_id: ProposalId,
        choice: VoteChoice,
        claims: &[TokenClaim],
        at: BlockNumber,
    ) -> Result<(), VotingError>;

    /// Whether the proposal has passed: voting closed AND quorum met AND
    /// basis met. Always false while the voting window is open.
    fn is_passed(&self, proposal_id: ProposalId, at: BlockNumber) -> Result<bool, VotingError>;

    /// The last block at which votes are accepted for this proposal.
    fn voting_end_block(&self, proposal_id: ProposalId) -> Result<BlockNumber, VotingError>;

    /// Whether the address holds enough weight to submit proposals through
    /// this strategy.
    fn is_proposer(&self, address: &Address) -> bool;

    /// Take the pending observer records.
    fn drain_events(&mut self) -> Vec<StrategyEvent>;
}
