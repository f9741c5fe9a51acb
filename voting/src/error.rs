use thiserror::Error;
use tribune_types::{Address, ProposalId};

#[derive(Debug, Error)]
pub enum VotingError {
    #[error("caller is not the registered proposal engine")]
    Unauthorized,

    #[error("caller is not the strategy administrator")]
    NotOwner,

    #[error("strategy is already initialized")]
    AlreadyInitialized,

    #[error("proposal {0} was never initialized on this strategy")]
    ProposalNotFound(ProposalId),

    #[error("voting on proposal {0} has closed")]
    VotingClosed(ProposalId),

    #[error("{voter} has already voted on proposal {proposal_id}")]
    AlreadyVoted {
        proposal_id: ProposalId,
        voter: Address,
    },

    #[error("token {token_id} of {collection} has already voted on proposal {proposal_id}")]
    TokenAlreadyVoted {
        proposal_id: ProposalId,
        collection: Address,
        token_id: u64,
    },

    #[error("invalid vote choice {0} (expected 0=No, 1=Yes, 2=Abstain)")]
    InvalidVoteChoice(u8),

    #[error("quorum numerator {0} exceeds the denominator")]
    InvalidQuorumNumerator(u128),

    #[error("basis numerator {0} exceeds the denominator")]
    InvalidBasisNumerator(u128),

    #[error("insufficient balance: needed {needed}, available {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("a non-fungible vote must claim at least one token")]
    NoVotingWeight,

    #[error("collection {0} is not registered for governance")]
    CollectionNotRegistered(Address),

    #[error("collection {0} is already registered")]
    CollectionAlreadyRegistered(Address),

    #[error("per-token weight must be non-zero")]
    InvalidTokenWeight,

    #[error("token {token_id} of {collection} is not owned by the caller")]
    NotTokenOwner { collection: Address, token_id: u64 },

    #[error("token {token_id} does not exist in collection {collection}")]
    UnknownToken { collection: Address, token_id: u64 },

    #[error("token {token_id} already exists in collection {collection}")]
    TokenAlreadyMinted { collection: Address, token_id: u64 },
}
