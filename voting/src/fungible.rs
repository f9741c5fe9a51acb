//! Linear fungible-token voting.
//!
//! Weight = the voter's delegated token power at the proposal's start block.
//! Snapshotting at submission rather than vote time means weight acquired
//! after a proposal is created (flash loans included) never counts toward it.

use crate::checkpoint::VotingToken;
use crate::error::VotingError;
use crate::strategy::{StrategyEvent, TokenClaim, VoteChoice, VotingStrategy, DENOMINATOR};
use crate::tally::{quorum_votes, VoteTally};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};
use tribune_types::{Address, BlockNumber, ProposalId};

/// One-time setup parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FungibleSetup {
    /// Administrator allowed to change configuration.
    pub owner: Address,
    /// The one engine allowed to initialize proposals.
    pub engine: Address,
    /// Quorum as a fraction of snapshotted total supply, over [`DENOMINATOR`].
    pub quorum_numerator: u128,
    /// Minimum yes-fraction of non-abstain votes, over [`DENOMINATOR`].
    pub basis_numerator: u128,
    /// Minimum current voting weight required to submit a proposal.
    pub proposer_weight_threshold: u128,
    /// Voting window length in blocks.
    pub voting_period: u32,
}

/// Vote record for one proposal.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct FungibleProposal {
    tally: VoteTally,
    has_voted: HashSet<Address>,
}

/// Linear voting strategy over a checkpointed fungible token.
///
/// The strategy owns its [`VotingToken`]; holdings and delegation change
/// through [`token_mut`](Self::token_mut), vote accounting only through the
/// strategy itself.
#[derive(Clone, Debug)]
pub struct LinearFungibleVoting {
    owner: Address,
    engine: Address,
    token: VotingToken,
    quorum_numerator: u128,
    basis_numerator: u128,
    proposer_weight_threshold: u128,
    voting_period: u32,
    proposals: HashMap<ProposalId, FungibleProposal>,
    pending_events: Vec<StrategyEvent>,
    initialized: bool,
}

impl Default for LinearFungibleVoting {
    fn default() -> Self {
        Self {
            owner: Address::ZERO,
            engine: Address::ZERO,
            token: VotingToken::new(),
            quorum_numerator: 0,
            basis_numerator: 0,
            proposer_weight_threshold: 0,
            voting_period: 0,
            proposals: HashMap::new(),
            pending_events: Vec::new(),
            initialized: false,
        }
    }
}

/// Serializable snapshot of the strategy's full state.
#[derive(Serialize, Deserialize)]
struct FungibleSnapshot {
    owner: Address,
    engine: Address,
    token: VotingToken,
    quorum_numerator: u128,
    basis_numerator: u128,
    proposer_weight_threshold: u128,
    voting_period: u32,
    proposals: HashMap<ProposalId, FungibleProposal>,
    initialized: bool,
}

/// Meta-store key used for persisting the strategy state.
const FUNGIBLE_VOTING_META_KEY: &str = "linear_fungible_voting_state";

impl LinearFungibleVoting {
    /// Create and set up in one step.
    pub fn new(config: FungibleSetup) -> Result<Self, VotingError> {
        let mut strategy = Self::default();
        strategy.setup(config)?;
        Ok(strategy)
    }

    /// One-time initialization. Fails with `AlreadyInitialized` on a second
    /// call.
    pub fn setup(&mut self, config: FungibleSetup) -> Result<(), VotingError> {
        if self.initialized {
            return Err(VotingError::AlreadyInitialized);
        }
        if config.quorum_numerator > DENOMINATOR {
            return Err(VotingError::InvalidQuorumNumerator(config.quorum_numerator));
        }
        if config.basis_numerator > DENOMINATOR {
            return Err(VotingError::InvalidBasisNumerator(config.basis_numerator));
        }
        self.owner = config.owner;
        self.engine = config.engine;
        self.quorum_numerator = config.quorum_numerator;
        self.basis_numerator = config.basis_numerator;
        self.proposer_weight_threshold = config.proposer_weight_threshold;
        self.voting_period = config.voting_period;
        self.initialized = true;
        Ok(())
    }

    pub fn token(&self) -> &VotingToken {
        &self.token
    }

    pub fn token_mut(&mut self) -> &mut VotingToken {
        &mut self.token
    }

    pub fn quorum_numerator(&self) -> u128 {
        self.quorum_numerator
    }

    pub fn basis_numerator(&self) -> u128 {
        self.basis_numerator
    }

    pub fn proposer_weight_threshold(&self) -> u128 {
        self.proposer_weight_threshold
    }

    pub fn voting_period(&self) -> u32 {
        self.voting_period
    }

    /// Full tally record for a proposal.
    pub fn proposal_votes(&self, proposal_id: ProposalId) -> Result<&VoteTally, VotingError> {
        self.proposals
            .get(&proposal_id)
            .map(|p| &p.tally)
            .ok_or(VotingError::ProposalNotFound(proposal_id))
    }

    /// Whether `voter` already participated on a proposal.
    pub fn has_voted(&self, proposal_id: ProposalId, voter: &Address) -> bool {
        self.proposals
            .get(&proposal_id)
            .map(|p| p.has_voted.contains(voter))
            .unwrap_or(false)
    }

    fn require_owner(&self, caller: &Address) -> Result<(), VotingError> {
        if *caller != self.owner {
            return Err(VotingError::NotOwner);
        }
        Ok(())
    }

    /// Update the quorum numerator. Administrator only.
    pub fn set_quorum_numerator(
        &mut self,
        caller: &Address,
        numerator: u128,
    ) -> Result<(), VotingError> {
        self.require_owner(caller)?;
        if numerator > DENOMINATOR {
            return Err(VotingError::InvalidQuorumNumerator(numerator));
        }
        self.quorum_numerator = numerator;
        self.pending_events
            .push(StrategyEvent::QuorumNumeratorUpdated { numerator });
        info!(numerator, "quorum numerator updated");
        Ok(())
    }

    /// Update the basis numerator. Administrator only.
    pub fn set_basis_numerator(
        &mut self,
        caller: &Address,
        numerator: u128,
    ) -> Result<(), VotingError> {
        self.require_owner(caller)?;
        if numerator > DENOMINATOR {
            return Err(VotingError::InvalidBasisNumerator(numerator));
        }
        self.basis_numerator = numerator;
        self.pending_events
            .push(StrategyEvent::BasisNumeratorUpdated { numerator });
        info!(numerator, "basis numerator updated");
        Ok(())
    }

    /// Update the proposer weight threshold. Administrator only.
    pub fn set_proposer_weight_threshold(
        &mut self,
        caller: &Address,
        threshold: u128,
    ) -> Result<(), VotingError> {
        self.require_owner(caller)?;
        self.proposer_weight_threshold = threshold;
        self.pending_events
            .push(StrategyEvent::ProposerWeightThresholdUpdated { threshold });
        info!(threshold, "proposer weight threshold updated");
        Ok(())
    }

    /// Update the voting period for subsequently initialized proposals.
    /// Administrator only.
    pub fn set_voting_period(&mut self, caller: &Address, blocks: u32) -> Result<(), VotingError> {
        self.require_owner(caller)?;
        self.voting_period = blocks;
        self.pending_events
            .push(StrategyEvent::VotingPeriodUpdated { blocks });
        info!(blocks, "voting period updated");
        Ok(())
    }

    /// Serialize the full strategy state to bytes for persistence.
    pub fn save_state(&self) -> Vec<u8> {
        let snapshot = FungibleSnapshot {
            owner: self.owner,
            engine: self.engine,
            token: self.token.clone(),
            quorum_numerator: self.quorum_numerator,
            basis_numerator: self.basis_numerator,
            proposer_weight_threshold: self.proposer_weight_threshold,
            voting_period: self.voting_period,
            proposals: self.proposals.clone(),
            initialized: self.initialized,
        };
        bincode::serialize(&snapshot).unwrap_or_default()
    }

    /// Restore the strategy from serialized bytes.
    pub fn load_state(data: &[u8]) -> Self {
        match bincode::deserialize::<FungibleSnapshot>(data) {
            Ok(snapshot) => Self {
                owner: snapshot.owner,
                engine: snapshot.engine,
                token: snapshot.token,
                quorum_numerator: snapshot.quorum_numerator,
                basis_numerator: snapshot.basis_numerator,
                proposer_weight_threshold: snapshot.proposer_weight_threshold,
                voting_period: snapshot.voting_period,
                proposals: snapshot.proposals,
                pending_events: Vec::new(),
                initialized: snapshot.initialized,
            },
            Err(_) => Self::default(),
        }
    }

    /// The meta-store key used for strategy persistence.
    pub fn meta_key() -> &'static str {
        FUNGIBLE_VOTING_META_KEY
    }
}

impl VotingStrategy for LinearFungibleVoting {
    fn initialize_proposal(
        &mut self,
        caller: &Address,
        proposal_id: ProposalId,
        at: BlockNumber,
    ) -> Result<(), VotingError> {
        if !self.initialized || *caller != self.engine {
            return Err(VotingError::Unauthorized);
        }
        let tally = VoteTally::open(at, self.voting_period);
        let voting_end_block = tally.voting_end_block;
        self.proposals.insert(
            proposal_id,
            FungibleProposal {
                tally,
                has_voted: HashSet::new(),
            },
        );
        self.pending_events.push(StrategyEvent::ProposalInitialized {
            proposal_id,
            voting_end_block,
        });
        debug!(proposal_id, %voting_end_block, "proposal initialized");
        Ok(())
    }

    fn vote(
        &mut self,
        voter: &Address,
        proposal_id: ProposalId,
        choice: VoteChoice,
        _claims: &[TokenClaim],
        at: BlockNumber,
    ) -> Result<(), VotingError> {
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(VotingError::ProposalNotFound(proposal_id))?;
        if !proposal.tally.is_open(at) {
            return Err(VotingError::VotingClosed(proposal_id));
        }
        if proposal.has_voted.contains(voter) {
            return Err(VotingError::AlreadyVoted {
                proposal_id,
                voter: *voter,
            });
        }
        let weight = self
            .token
            .votes_at(voter, proposal.tally.voting_start_block);
        proposal.has_voted.insert(*voter);
        proposal.tally.record(choice, weight);
        self.pending_events.push(StrategyEvent::VoteCast {
            proposal_id,
            voter: *voter,
            choice,
            weight,
        });
        debug!(proposal_id, %voter, ?choice, weight, "vote cast");
        Ok(())
    }

    fn is_passed(&self, proposal_id: ProposalId, at: BlockNumber) -> Result<bool, VotingError> {
        let proposal = self
            .proposals
            .get(&proposal_id)
            .ok_or(VotingError::ProposalNotFound(proposal_id))?;
        if proposal.tally.is_open(at) {
            return Ok(false);
        }
        let supply = self
            .token
            .total_supply_at(proposal.tally.voting_start_block);
        let required = quorum_votes(supply, self.quorum_numerator);
        Ok(proposal.tally.meets_quorum(required) && proposal.tally.meets_basis(self.basis_numerator))
    }

    fn voting_end_block(&self, proposal_id: ProposalId) -> Result<BlockNumber, VotingError> {
        self.proposals
            .get(&proposal_id)
            .map(|p| p.tally.voting_end_block)
            .ok_or(VotingError::ProposalNotFound(proposal_id))
    }

    fn is_proposer(&self, address: &Address) -> bool {
        self.token.current_votes(address) >= self.proposer_weight_threshold
    }

    fn drain_events(&mut self) -> Vec<StrategyEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
