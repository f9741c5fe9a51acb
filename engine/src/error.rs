use crate::proposal::ProposalState;
use thiserror::Error;
use tribune_types::ProposalId;
use tribune_voting::VotingError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("caller is not the engine owner")]
    NotOwner,

    #[error("engine is already initialized")]
    AlreadyInitialized,

    #[error("proposal {0} was never submitted")]
    InvalidProposal(ProposalId),

    #[error("proposal {proposal_id} is {state}, not executable")]
    ProposalNotExecutable {
        proposal_id: ProposalId,
        state: ProposalState,
    },

    #[error("strategy is not enabled")]
    StrategyDisabled,

    #[error("strategy is already enabled")]
    StrategyEnabled,

    #[error("invalid strategy address")]
    InvalidStrategy,

    #[error("caller does not meet the strategy's proposer threshold")]
    InvalidProposer,

    #[error("transaction batch is empty or advances past the committed hashes")]
    InvalidTxs,

    #[error("target, value, data, and call-kind arrays must be equal length")]
    InvalidArrayLengths,

    #[error("supplied call {index} does not match the committed hash")]
    InvalidTxHash { index: usize },

    #[error("call {index} was rejected by the execution primitive")]
    TxFailed { index: usize },

    #[error(transparent)]
    Strategy(#[from] VotingError),
}
