//! Proposal lifecycle engine for tribune governance.
//!
//! The engine owns the proposal registry and the set of enabled voting
//! strategies. A proposal commits to its transaction batch by content hash
//! at submission; voting is delegated entirely to the strategy; the engine
//! derives lifecycle state from its own block timers plus the strategy's
//! verdict, and at execution re-hashes the supplied batch and requires an
//! exact match before dispatching to the avatar's execution primitive.
//!
//! State machine per proposal:
//! `Active → Timelocked → Executable → Executed`, with `Active → Failed`
//! and `Executable → Expired` as the failure exits. Proposals with zero
//! transactions jump from passed voting straight to `Executed`.

pub mod avatar;
pub mod engine;
pub mod error;
pub mod proposal;
pub mod strategy_set;

pub use avatar::AvatarExecutor;
pub use engine::{EngineSetup, GovernanceEvent, ProposalEngine};
pub use error::EngineError;
pub use proposal::{Proposal, ProposalState};
pub use strategy_set::{StrategySet, SENTINEL};
