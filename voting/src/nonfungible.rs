//! Linear non-fungible-token voting.
//!
//! Voters claim explicit (collection, token id) pairs; the strategy checks
//! current ownership at vote time and sums each collection's configured
//! per-token weight. A token id votes at most once per proposal for its
//! whole lifetime, independent of transfers — so passing a token around
//! cannot multiply its vote.

use crate::error::VotingError;
use crate::nft::NftLedger;
use crate::strategy::{StrategyEvent, TokenClaim, VoteChoice, VotingStrategy, DENOMINATOR};
use crate::tally::VoteTally;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};
use tribune_types::{Address, BlockNumber, ProposalId};

/// One-time setup parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NonFungibleSetup {
    /// Administrator allowed to change configuration and register collections.
    pub owner: Address,
    /// The one engine allowed to initialize proposals.
    pub engine: Address,
    /// Flat participation (weight sum) required for quorum.
    pub quorum_threshold: u128,
    /// Minimum yes-fraction of non-abstain votes, over [`DENOMINATOR`].
    pub basis_numerator: u128,
    /// Minimum owned-token weight sum required to submit a proposal.
    pub proposer_weight_threshold: u128,
    /// Voting window length in blocks.
    pub voting_period: u32,
}

/// Vote record for one proposal. Participation is tracked per token id, not
/// per address.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct NonFungibleProposal {
    tally: VoteTally,
    voted_tokens: HashSet<(Address, u64)>,
}

/// Linear voting strategy over registered NFT collections.
#[derive(Clone, Debug)]
pub struct LinearNonFungibleVoting {
    owner: Address,
    engine: Address,
    ledger: NftLedger,
    /// Registered governance collections: collection → per-token weight.
    collection_weights: HashMap<Address, u128>,
    quorum_threshold: u128,
    basis_numerator: u128,
    proposer_weight_threshold: u128,
    voting_period: u32,
    proposals: HashMap<ProposalId, NonFungibleProposal>,
    pending_events: Vec<StrategyEvent>,
    initialized: bool,
}

/// Serializable snapshot of the strategy's full state.
#[derive(Serialize, Deserialize)]
struct NonFungibleSnapshot {
    owner: Address,
    engine: Address,
    ledger: NftLedger,
    collection_weights: HashMap<Address, u128>,
    quorum_threshold: u128,
    basis_numerator: u128,
    proposer_weight_threshold: u128,
    voting_period: u32,
    proposals: HashMap<ProposalId, NonFungibleProposal>,
    initialized: bool,
}

/// Meta-store key used for persisting the strategy state.
const NONFUNGIBLE_VOTING_META_KEY: &str = "linear_nonfungible_voting_state";

impl Default for LinearNonFungibleVoting {
    fn default() -> Self {
        Self {
            owner: Address::ZERO,
            engine: Address::ZERO,
            ledger: NftLedger::new(),
            collection_weights: HashMap::new(),
            quorum_threshold: 0,
            basis_numerator: 0,
            proposer_weight_threshold: 0,
            voting_period: 0,
            proposals: HashMap::new(),
            pending_events: Vec::new(),
            initialized: false,
        }
    }
}

impl LinearNonFungibleVoting {
    /// Create and set up in one step.
    pub fn new(config: NonFungibleSetup) -> Result<Self, VotingError> {
        let mut strategy = Self::default();
        strategy.setup(config)?;
        Ok(strategy)
    }

    /// One-time initialization. Fails with `AlreadyInitialized` on a second
    /// call.
    pub fn setup(&mut self, config: NonFungibleSetup) -> Result<(), VotingError> {
        if self.initialized {
            return Err(VotingError::AlreadyInitialized);
        }
        if config.basis_numerator > DENOMINATOR {
            return Err(VotingError::InvalidBasisNumerator(config.basis_numerator));
        }
        self.owner = config.owner;
        self.engine = config.engine;
        self.quorum_threshold = config.quorum_threshold;
        self.basis_numerator = config.basis_numerator;
        self.proposer_weight_threshold = config.proposer_weight_threshold;
        self.voting_period = config.voting_period;
        self.initialized = true;
        Ok(())
    }

    pub fn ledger(&self) -> &NftLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut NftLedger {
        &mut self.ledger
    }

    pub fn quorum_threshold(&self) -> u128 {
        self.quorum_threshold
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

    /// Per-token weight of a registered collection.
    pub fn collection_weight(&self, collection: &Address) -> Option<u128> {
        self.collection_weights.get(collection).copied()
    }

    /// Full tally record for a proposal.
    pub fn proposal_votes(&self, proposal_id: ProposalId) -> Result<&VoteTally, VotingError> {
        self.proposals
            .get(&proposal_id)
            .map(|p| &p.tally)
            .ok_or(VotingError::ProposalNotFound(proposal_id))
    }

    /// Whether a token id already participated on a proposal.
    pub fn token_has_voted(
        &self,
        proposal_id: ProposalId,
        collection: &Address,
        token_id: u64,
    ) -> bool {
        self.proposals
            .get(&proposal_id)
            .map(|p| p.voted_tokens.contains(&(*collection, token_id)))
            .unwrap_or(false)
    }

    fn require_owner(&self, caller: &Address) -> Result<(), VotingError> {
        if *caller != self.owner {
            return Err(VotingError::NotOwner);
        }
        Ok(())
    }

    /// Register a collection for governance with a per-token weight.
    /// Administrator only.
    pub fn register_collection(
        &mut self,
        caller: &Address,
        collection: Address,
        weight: u128,
    ) -> Result<(), VotingError> {
        self.require_owner(caller)?;
        if weight == 0 {
            return Err(VotingError::InvalidTokenWeight);
        }
        if self.collection_weights.contains_key(&collection) {
            return Err(VotingError::CollectionAlreadyRegistered(collection));
        }
        self.collection_weights.insert(collection, weight);
        self.pending_events
            .push(StrategyEvent::CollectionRegistered { collection, weight });
        info!(%collection, weight, "governance collection registered");
        Ok(())
    }

    /// Update the flat quorum threshold. Administrator only.
    pub fn set_quorum_threshold(
        &mut self,
        caller: &Address,
        threshold: u128,
    ) -> Result<(), VotingError> {
        self.require_owner(caller)?;
        self.quorum_threshold = threshold;
        self.pending_events
            .push(StrategyEvent::QuorumThresholdUpdated { threshold });
        info!(threshold, "quorum threshold updated");
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
        let snapshot = NonFungibleSnapshot {
            owner: self.owner,
            engine: self.engine,
            ledger: self.ledger.clone(),
            collection_weights: self.collection_weights.clone(),
            quorum_threshold: self.quorum_threshold,
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
        match bincode::deserialize::<NonFungibleSnapshot>(data) {
            Ok(snapshot) => Self {
                owner: snapshot.owner,
                engine: snapshot.engine,
                ledger: snapshot.ledger,
                collection_weights: snapshot.collection_weights,
                quorum_threshold: snapshot.quorum_threshold,
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
        NONFUNGIBLE_VOTING_META_KEY
    }

    /// Validate every claim and return the total weight. No state change.
    fn check_claims(
        &self,
        proposal: &NonFungibleProposal,
        proposal_id: ProposalId,
        voter: &Address,
        claims: &[TokenClaim],
    ) -> Result<u128, VotingError> {
        let mut seen = HashSet::new();
        let mut total: u128 = 0;
        for claim in claims {
            let weight = self
                .collection_weights
                .get(&claim.collection)
                .copied()
                .ok_or(VotingError::CollectionNotRegistered(claim.collection))?;
            if self.ledger.owner_of(&claim.collection, claim.token_id) != Some(*voter) {
                return Err(VotingError::NotTokenOwner {
                    collection: claim.collection,
                    token_id: claim.token_id,
                });
            }
            let key = (claim.collection, claim.token_id);
            if proposal.voted_tokens.contains(&key) || !seen.insert(key) {
                return Err(VotingError::TokenAlreadyVoted {
                    proposal_id,
                    collection: claim.collection,
                    token_id: claim.token_id,
                });
            }
            total = total.saturating_add(weight);
        }
        Ok(total)
    }
}

impl VotingStrategy for LinearNonFungibleVoting {
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
            NonFungibleProposal {
                tally,
                voted_tokens: HashSet::new(),
            },
        );
        self.pending_events.push(StrategyEvent::ProposalInitialized {
            proposal_id,
            voting_end_block,
        });
        debug!(proposal_id, %voting_end_block, "proposal initialized");
        Ok(())
    }

    /// All-or-nothing: if any claimed token fails validation, no tally or
    /// participation changes at all.
    fn vote(
        &mut self,
        voter: &Address,
        proposal_id: ProposalId,
        choice: VoteChoice,
        claims: &[TokenClaim],
        at: BlockNumber,
    ) -> Result<(), VotingError> {
        let proposal = self
            .proposals
            .get(&proposal_id)
            .ok_or(VotingError::ProposalNotFound(proposal_id))?;
        if !proposal.tally.is_open(at) {
            return Err(VotingError::VotingClosed(proposal_id));
        }
        if claims.is_empty() {
            return Err(VotingError::NoVotingWeight);
        }
        let weight = self.check_claims(proposal, proposal_id, voter, claims)?;

        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(VotingError::ProposalNotFound(proposal_id))?;
        proposal
            .voted_tokens
            .extend(claims.iter().map(|c| (c.collection, c.token_id)));
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
        Ok(proposal.tally.meets_quorum(self.quorum_threshold)
            && proposal.tally.meets_basis(self.basis_numerator))
    }

    fn voting_end_block(&self, proposal_id: ProposalId) -> Result<BlockNumber, VotingError> {
        self.proposals
            .get(&proposal_id)
            .map(|p| p.tally.voting_end_block)
            .ok_or(VotingError::ProposalNotFound(proposal_id))
    }

    fn is_proposer(&self, address: &Address) -> bool {
        let owned: u128 = self
            .collection_weights
            .iter()
            .map(|(collection, weight)| {
                self.ledger
                    .owned_count(collection, address)
                    .saturating_mul(*weight)
            })
            .sum();
        owned >= self.proposer_weight_threshold
    }

    fn drain_events(&mut self) -> Vec<StrategyEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
