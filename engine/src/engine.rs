//! The proposal engine — registry, strategy set, state derivation, and
//! execution dispatch.

use crate::avatar::AvatarExecutor;
use crate::error::EngineError;
use crate::proposal::{Proposal, ProposalState};
use crate::strategy_set::StrategySet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;
use tribune_types::{hash_calls, Address, BlockNumber, Call, CallKind, ProposalId};
use tribune_voting::VotingStrategy;

/// One-time setup parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineSetup {
    /// Administrator allowed to manage strategies and periods.
    pub owner: Address,
    /// The engine's own identity — the caller address strategies accept
    /// `initialize_proposal` from.
    pub address: Address,
    /// The asset-holding account executions run through. Recorded for
    /// observers; dispatch goes through the [`AvatarExecutor`] passed to
    /// `execute_proposal`.
    pub avatar: Address,
    /// Blocks between a proposal passing and becoming executable.
    pub timelock_period: u32,
    /// Blocks a passed proposal stays executable after the timelock.
    pub execution_period: u32,
}

/// Records emitted for off-chain observers, drained by the embedder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GovernanceEvent {
    /// A proposal was submitted, with its full transaction batch and
    /// metadata.
    ProposalCreated {
        proposal_id: ProposalId,
        proposer: Address,
        strategy: Address,
        transactions: Vec<Call>,
        metadata: String,
    },
    /// A batch of a proposal's transactions was executed.
    ProposalExecuted {
        proposal_id: ProposalId,
        executed: u32,
    },
    StrategyEnabled { strategy: Address },
    StrategyDisabled { strategy: Address },
    TimelockPeriodUpdated { blocks: u32 },
    ExecutionPeriodUpdated { blocks: u32 },
}

/// The orchestrating authority of the governance system.
///
/// Owns the proposal registry, the linked set of enabled strategies, and
/// the strategy instances. Voters reach a strategy directly through
/// [`strategy_mut`](Self::strategy_mut); the engine itself only calls the
/// [`VotingStrategy`] interface and never branches on a concrete type.
pub struct ProposalEngine {
    owner: Address,
    address: Address,
    avatar: Address,
    timelock_period: u32,
    execution_period: u32,
    proposals: Vec<Proposal>,
    enabled: StrategySet,
    /// Instances are retained after disabling: a disabled strategy still
    /// governs the proposals it was assigned.
    instances: HashMap<Address, Box<dyn VotingStrategy>>,
    pending_events: Vec<GovernanceEvent>,
    initialized: bool,
}

impl Default for ProposalEngine {
    fn default() -> Self {
        Self {
            owner: Address::ZERO,
            address: Address::ZERO,
            avatar: Address::ZERO,
            timelock_period: 0,
            execution_period: 0,
            proposals: Vec::new(),
            enabled: StrategySet::new(),
            instances: HashMap::new(),
            pending_events: Vec::new(),
            initialized: false,
        }
    }
}

impl ProposalEngine {
    /// Create and set up in one step.
    pub fn new(config: EngineSetup) -> Result<Self, EngineError> {
        let mut engine = Self::default();
        engine.setup(config)?;
        Ok(engine)
    }

    /// One-time initialization. Fails with `AlreadyInitialized` on a second
    /// call.
    pub fn setup(&mut self, config: EngineSetup) -> Result<(), EngineError> {
        if self.initialized {
            return Err(EngineError::AlreadyInitialized);
        }
        self.owner = config.owner;
        self.address = config.address;
        self.avatar = config.avatar;
        self.timelock_period = config.timelock_period;
        self.execution_period = config.execution_period;
        self.initialized = true;
        Ok(())
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn avatar(&self) -> Address {
        self.avatar
    }

    pub fn timelock_period(&self) -> u32 {
        self.timelock_period
    }

    pub fn execution_period(&self) -> u32 {
        self.execution_period
    }

    pub fn total_proposal_count(&self) -> u32 {
        self.proposals.len() as u32
    }

    /// A submitted proposal's record.
    pub fn proposal(&self, proposal_id: ProposalId) -> Result<&Proposal, EngineError> {
        self.proposals
            .get(proposal_id as usize)
            .ok_or(EngineError::InvalidProposal(proposal_id))
    }

    /// The committed content hashes of a proposal's batch.
    pub fn proposal_tx_hashes(
        &self,
        proposal_id: ProposalId,
    ) -> Result<&[tribune_types::TxHash], EngineError> {
        self.proposal(proposal_id).map(|p| p.tx_hashes.as_slice())
    }

    /// Read access to a registered strategy (enabled or retained).
    pub fn strategy(&self, address: &Address) -> Option<&dyn VotingStrategy> {
        self.instances.get(address).map(|b| b.as_ref())
    }

    /// Mutable access to a registered strategy — this is how voters cast
    /// votes.
    pub fn strategy_mut(&mut self, address: &Address) -> Option<&mut (dyn VotingStrategy + '_)> {
        self.instances.get_mut(address).map(|b| b.as_mut() as &mut (dyn VotingStrategy + '_))
    }

    pub fn is_strategy_enabled(&self, address: &Address) -> bool {
        self.enabled.is_enabled(address)
    }

    /// Paginated read of enabled strategies, most recently enabled first.
    /// Pass [`crate::SENTINEL`] as `start` for the head of the set.
    pub fn get_strategies(&self, start: &Address, count: usize) -> Vec<Address> {
        self.enabled.page(start, count)
    }

    /// Take the pending observer records.
    pub fn drain_events(&mut self) -> Vec<GovernanceEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn require_owner(&self, caller: &Address) -> Result<(), EngineError> {
        if *caller != self.owner {
            return Err(EngineError::NotOwner);
        }
        Ok(())
    }

    /// Enable a strategy, registering its instance. Owner only.
    pub fn enable_strategy(
        &mut self,
        caller: &Address,
        address: Address,
        strategy: Box<dyn VotingStrategy>,
    ) -> Result<(), EngineError> {
        self.require_owner(caller)?;
        self.enabled.enable(address)?;
        self.instances.insert(address, strategy);
        self.pending_events
            .push(GovernanceEvent::StrategyEnabled { strategy: address });
        info!(strategy = %address, "strategy enabled");
        Ok(())
    }

    /// Disable a strategy given its predecessor in iteration order. Owner
    /// only. The instance is retained so existing proposals keep resolving.
    pub fn disable_strategy(
        &mut self,
        caller: &Address,
        prev: Address,
        address: Address,
    ) -> Result<(), EngineError> {
        self.require_owner(caller)?;
        self.enabled.disable(prev, address)?;
        self.pending_events
            .push(GovernanceEvent::StrategyDisabled { strategy: address });
        info!(strategy = %address, "strategy disabled");
        Ok(())
    }

    /// Update the timelock applied to subsequently submitted proposals.
    /// Owner only.
    pub fn update_timelock_period(
        &mut self,
        caller: &Address,
        blocks: u32,
    ) -> Result<(), EngineError> {
        self.require_owner(caller)?;
        self.timelock_period = blocks;
        self.pending_events
            .push(GovernanceEvent::TimelockPeriodUpdated { blocks });
        info!(blocks, "timelock period updated");
        Ok(())
    }

    /// Update the execution window applied to subsequently submitted
    /// proposals. Owner only.
    pub fn update_execution_period(
        &mut self,
        caller: &Address,
        blocks: u32,
    ) -> Result<(), EngineError> {
        self.require_owner(caller)?;
        self.execution_period = blocks;
        self.pending_events
            .push(GovernanceEvent::ExecutionPeriodUpdated { blocks });
        info!(blocks, "execution period updated");
        Ok(())
    }

    /// Submit a proposal through an enabled strategy.
    ///
    /// Hashes and commits the transaction batch, assigns the next
    /// sequential id, and forwards initialization to the strategy.
    pub fn submit_proposal(
        &mut self,
        proposer: &Address,
        strategy: &Address,
        transactions: &[Call],
        metadata: &str,
        at: BlockNumber,
    ) -> Result<ProposalId, EngineError> {
        if !self.enabled.is_enabled(strategy) {
            return Err(EngineError::StrategyDisabled);
        }
        let instance = self
            .instances
            .get(strategy)
            .ok_or(EngineError::StrategyDisabled)?;
        if !instance.is_proposer(proposer) {
            return Err(EngineError::InvalidProposer);
        }

        let proposal_id = self.proposals.len() as ProposalId;
        let engine_address = self.address;
        self.instances
            .get_mut(strategy)
            .ok_or(EngineError::StrategyDisabled)?
            .initialize_proposal(&engine_address, proposal_id, at)?;

        self.proposals.push(Proposal {
            strategy: *strategy,
            tx_hashes: hash_calls(transactions),
            timelock_period: self.timelock_period,
            execution_period: self.execution_period,
            execution_counter: 0,
        });
        self.pending_events.push(GovernanceEvent::ProposalCreated {
            proposal_id,
            proposer: *proposer,
            strategy: *strategy,
            transactions: transactions.to_vec(),
            metadata: metadata.to_string(),
        });
        info!(
            proposal_id,
            proposer = %proposer,
            strategy = %strategy,
            transactions = transactions.len(),
            "proposal submitted"
        );
        Ok(proposal_id)
    }

    /// Derive a proposal's lifecycle state as of block `at`. Pure: repeated
    /// calls at the same block return the same value.
    pub fn proposal_state(
        &self,
        proposal_id: ProposalId,
        at: BlockNumber,
    ) -> Result<ProposalState, EngineError> {
        let proposal = self.proposal(proposal_id)?;
        let strategy = self
            .instances
            .get(&proposal.strategy)
            .expect("strategy instance retained for the proposal's lifetime");

        let voting_end = strategy.voting_end_block(proposal_id)?;
        if at <= voting_end {
            return Ok(ProposalState::Active);
        }
        if !strategy.is_passed(proposal_id, at)? {
            return Ok(ProposalState::Failed);
        }
        if proposal.is_fully_executed() {
            // Zero-transaction proposals land here straight from passing.
            return Ok(ProposalState::Executed);
        }
        let timelock_end = voting_end.advanced(proposal.timelock_period as u64);
        if at <= timelock_end {
            return Ok(ProposalState::Timelocked);
        }
        if at <= timelock_end.advanced(proposal.execution_period as u64) {
            return Ok(ProposalState::Executable);
        }
        Ok(ProposalState::Expired)
    }

    /// Execute the next portion of a proposal's committed batch.
    ///
    /// The supplied calls are re-hashed and must exactly match the
    /// committed hashes starting at the current execution offset. Dispatch
    /// is all-or-nothing with respect to the counter: a rejected call
    /// leaves `execution_counter` untouched. Successive calls may execute
    /// the batch in portions; executed portions are permanent even if the
    /// remainder later expires.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_proposal(
        &mut self,
        proposal_id: ProposalId,
        targets: &[Address],
        values: &[u128],
        data: &[Vec<u8>],
        kinds: &[CallKind],
        avatar: &mut dyn AvatarExecutor,
        at: BlockNumber,
    ) -> Result<(), EngineError> {
        let state = self.proposal_state(proposal_id, at)?;
        let proposal = self.proposal(proposal_id)?;

        if targets.is_empty() {
            return Err(EngineError::InvalidTxs);
        }
        if targets.len() != values.len()
            || targets.len() != data.len()
            || targets.len() != kinds.len()
        {
            return Err(EngineError::InvalidArrayLengths);
        }
        let offset = proposal.execution_counter as usize;
        if offset + targets.len() > proposal.tx_hashes.len() {
            return Err(EngineError::InvalidTxs);
        }

        let calls: Vec<Call> = targets
            .iter()
            .zip(values)
            .zip(data)
            .zip(kinds)
            .map(|(((target, value), bytes), kind)| {
                Call::new(*target, *value, bytes.clone(), *kind)
            })
            .collect();
        for (index, call) in calls.iter().enumerate() {
            if call.content_hash() != proposal.tx_hashes[offset + index] {
                return Err(EngineError::InvalidTxHash { index });
            }
        }

        if state != ProposalState::Executable {
            return Err(EngineError::ProposalNotExecutable { proposal_id, state });
        }

        for (index, call) in calls.iter().enumerate() {
            if !avatar.execute(call) {
                return Err(EngineError::TxFailed { index });
            }
        }

        let executed = calls.len() as u32;
        let proposal = self
            .proposals
            .get_mut(proposal_id as usize)
            .ok_or(EngineError::InvalidProposal(proposal_id))?;
        proposal.execution_counter += executed;
        self.pending_events.push(GovernanceEvent::ProposalExecuted {
            proposal_id,
            executed,
        });
        info!(proposal_id, executed, counter = proposal.execution_counter, "proposal batch executed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy_set::SENTINEL;
    use tribune_voting::{FungibleSetup, LinearFungibleVoting, VoteChoice};

    const OWNER: u64 = 901;
    const ENGINE_ADDR: u64 = 900;
    const AVATAR: u64 = 899;
    const STRATEGY: u64 = 700;

    fn addr(low: u64) -> Address {
        Address::from_low(low)
    }

    fn block(n: u64) -> BlockNumber {
        BlockNumber::new(n)
    }

    fn engine() -> ProposalEngine {
        ProposalEngine::new(EngineSetup {
            owner: addr(OWNER),
            address: addr(ENGINE_ADDR),
            avatar: addr(AVATAR),
            timelock_period: 5,
            execution_period: 20,
        })
        .unwrap()
    }

    fn fungible_strategy() -> LinearFungibleVoting {
        let mut strategy = LinearFungibleVoting::new(FungibleSetup {
            owner: addr(OWNER),
            engine: addr(ENGINE_ADDR),
            quorum_numerator: 500_000,
            basis_numerator: 500_000,
            proposer_weight_threshold: 1,
            voting_period: 10,
        })
        .unwrap();
        strategy.token_mut().mint(&addr(1), 100, block(1));
        strategy
    }

    fn engine_with_strategy() -> ProposalEngine {
        let mut engine = engine();
        engine
            .enable_strategy(&addr(OWNER), addr(STRATEGY), Box::new(fungible_strategy()))
            .unwrap();
        engine
    }

    #[test]
    fn setup_twice_fails() {
        let mut engine = engine();
        let err = engine
            .setup(EngineSetup {
                owner: addr(OWNER),
                address: addr(ENGINE_ADDR),
                avatar: addr(AVATAR),
                timelock_period: 0,
                execution_period: 0,
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::AlreadyInitialized));
    }

    #[test]
    fn enable_disable_owner_gated() {
        let mut engine = engine();
        assert!(matches!(
            engine.enable_strategy(&addr(1), addr(STRATEGY), Box::new(fungible_strategy())),
            Err(EngineError::NotOwner)
        ));
        engine
            .enable_strategy(&addr(OWNER), addr(STRATEGY), Box::new(fungible_strategy()))
            .unwrap();
        assert!(matches!(
            engine.disable_strategy(&addr(1), SENTINEL, addr(STRATEGY)),
            Err(EngineError::NotOwner)
        ));
    }

    #[test]
    fn submit_requires_enabled_strategy() {
        let mut engine = engine();
        let err = engine
            .submit_proposal(&addr(1), &addr(STRATEGY), &[], "", block(10))
            .unwrap_err();
        assert!(matches!(err, EngineError::StrategyDisabled));
    }

    #[test]
    fn submit_requires_proposer_weight() {
        let mut engine = engine_with_strategy();
        // addr(2) holds no tokens.
        let err = engine
            .submit_proposal(&addr(2), &addr(STRATEGY), &[], "", block(10))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidProposer));
    }

    #[test]
    fn submit_assigns_sequential_ids_and_commits_hashes() {
        let mut engine = engine_with_strategy();
        let call = Call::new(addr(50), 7, vec![1, 2], CallKind::Call);
        let id0 = engine
            .submit_proposal(&addr(1), &addr(STRATEGY), &[call.clone()], "first", block(10))
            .unwrap();
        let id1 = engine
            .submit_proposal(&addr(1), &addr(STRATEGY), &[], "second", block(10))
            .unwrap();
        assert_eq!((id0, id1), (0, 1));
        assert_eq!(engine.total_proposal_count(), 2);
        assert_eq!(
            engine.proposal_tx_hashes(0).unwrap(),
            &[call.content_hash()]
        );
        assert!(engine.proposal_tx_hashes(1).unwrap().is_empty());
    }

    #[test]
    fn unknown_proposal_state_fails() {
        let engine = engine_with_strategy();
        assert!(matches!(
            engine.proposal_state(3, block(10)),
            Err(EngineError::InvalidProposal(3))
        ));
    }

    #[test]
    fn period_updates_spare_existing_proposals() {
        let mut engine = engine_with_strategy();
        let id = engine
            .submit_proposal(&addr(1), &addr(STRATEGY), &[], "", block(10))
            .unwrap();
        engine.update_timelock_period(&addr(OWNER), 100).unwrap();
        engine.update_execution_period(&addr(OWNER), 100).unwrap();

        assert_eq!(engine.proposal(id).unwrap().timelock_period, 5);
        assert_eq!(engine.proposal(id).unwrap().execution_period, 20);

        let id2 = engine
            .submit_proposal(&addr(1), &addr(STRATEGY), &[], "", block(11))
            .unwrap();
        assert_eq!(engine.proposal(id2).unwrap().timelock_period, 100);
    }

    #[test]
    fn voters_reach_strategy_through_engine() {
        let mut engine = engine_with_strategy();
        let id = engine
            .submit_proposal(&addr(1), &addr(STRATEGY), &[], "", block(10))
            .unwrap();
        let strategy = engine.strategy_mut(&addr(STRATEGY)).unwrap();
        strategy
            .vote(&addr(1), id, VoteChoice::Yes, &[], block(11))
            .unwrap();
        assert!(engine
            .strategy(&addr(STRATEGY))
            .unwrap()
            .is_passed(id, block(21))
            .unwrap());
    }

    #[test]
    fn disabled_strategy_keeps_governing_existing_proposals() {
        let mut engine = engine_with_strategy();
        let id = engine
            .submit_proposal(&addr(1), &addr(STRATEGY), &[], "", block(10))
            .unwrap();
        engine
            .disable_strategy(&addr(OWNER), SENTINEL, addr(STRATEGY))
            .unwrap();

        // New submissions are refused, the old proposal still resolves.
        assert!(matches!(
            engine.submit_proposal(&addr(1), &addr(STRATEGY), &[], "", block(11)),
            Err(EngineError::StrategyDisabled)
        ));
        assert_eq!(
            engine.proposal_state(id, block(10)).unwrap(),
            ProposalState::Active
        );
    }
}
