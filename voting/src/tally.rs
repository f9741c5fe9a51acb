//! Per-proposal vote record and the quorum/basis arithmetic shared by the
//! linear strategies.
//!
//! All arithmetic is saturating so that overflow degrades toward "not
//! passed" instead of wrapping.

use crate::strategy::{VoteChoice, DENOMINATOR};
use serde::{Deserialize, Serialize};
use tribune_types::BlockNumber;

/// Running tallies and voting window for one proposal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoteTally {
    pub no_votes: u128,
    pub yes_votes: u128,
    pub abstain_votes: u128,
    /// Block at which the proposal was submitted; fungible weight is
    /// snapshotted here.
    pub voting_start_block: BlockNumber,
    /// Last block at which votes are accepted.
    pub voting_end_block: BlockNumber,
}

impl VoteTally {
    /// Open a fresh tally at `start` with a window of `voting_period` blocks.
    pub fn open(start: BlockNumber, voting_period: u32) -> Self {
        Self {
            no_votes: 0,
            yes_votes: 0,
            abstain_votes: 0,
            voting_start_block: start,
            voting_end_block: start.advanced(voting_period as u64),
        }
    }

    /// Whether votes are still accepted at block `at`. The end block itself
    /// is the last counted one.
    pub fn is_open(&self, at: BlockNumber) -> bool {
        at <= self.voting_end_block
    }

    /// Add `weight` to the tally matching `choice`.
    pub fn record(&mut self, choice: VoteChoice, weight: u128) {
        match choice {
            VoteChoice::No => self.no_votes = self.no_votes.saturating_add(weight),
            VoteChoice::Yes => self.yes_votes = self.yes_votes.saturating_add(weight),
            VoteChoice::Abstain => self.abstain_votes = self.abstain_votes.saturating_add(weight),
        }
    }

    /// Participation counted toward quorum: yes + abstain. No-votes do not
    /// count toward quorum in the linear strategies.
    pub fn participation(&self) -> u128 {
        self.yes_votes.saturating_add(self.abstain_votes)
    }

    /// Whether participation meets the required vote count.
    pub fn meets_quorum(&self, required_votes: u128) -> bool {
        self.participation() >= required_votes
    }

    /// Whether the yes-fraction of non-abstain votes strictly exceeds the
    /// basis ratio. A 50/50 yes/no split at a basis of 500_000 does NOT pass.
    pub fn meets_basis(&self, basis_numerator: u128) -> bool {
        self.yes_votes.saturating_mul(DENOMINATOR)
            > self
                .yes_votes
                .saturating_add(self.no_votes)
                .saturating_mul(basis_numerator)
    }
}

/// Votes required for quorum given a supply and a ratio numerator.
pub fn quorum_votes(total_supply: u128, quorum_numerator: u128) -> u128 {
    total_supply.saturating_mul(quorum_numerator) / DENOMINATOR
}
