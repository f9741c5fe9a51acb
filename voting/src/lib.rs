//! Pluggable vote-tallying strategies for the tribune governance engine.
//!
//! A strategy converts a voter's holdings into weight, tallies votes per
//! proposal, and is the sole source of truth for pass/fail and the voting-end
//! block. Two reference implementations are provided:
//!
//! - [`LinearFungibleVoting`] — weight from a checkpointed fungible token,
//!   snapshotted at the proposal's start block.
//! - [`LinearNonFungibleVoting`] — weight from owned tokens across registered
//!   NFT collections, checked at vote time, one vote per token id.
//!
//! The engine only ever talks to the [`VotingStrategy`] trait; custom
//! strategies plug in the same way.

pub mod checkpoint;
pub mod error;
pub mod fungible;
pub mod nft;
pub mod nonfungible;
pub mod strategy;
pub mod tally;

pub use checkpoint::{Checkpoint, VotingToken};
pub use error::VotingError;
pub use fungible::{FungibleSetup, LinearFungibleVoting};
pub use nft::NftLedger;
pub use nonfungible::{LinearNonFungibleVoting, NonFungibleSetup};
pub use strategy::{StrategyEvent, TokenClaim, VoteChoice, VotingStrategy, DENOMINATOR};
pub use tally::VoteTally;
