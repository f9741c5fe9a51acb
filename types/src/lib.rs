//! Fundamental types for the tribune governance engine.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: addresses, hashes, block heights, proposal ids, and the call
//! payloads that proposals commit to.

pub mod address;
pub mod block;
pub mod call;
pub mod error;
pub mod hash;

pub use address::Address;
pub use block::BlockNumber;
pub use call::{hash_calls, Call, CallKind};
pub use error::TypeError;
pub use hash::TxHash;

/// Proposal ids are assigned sequentially by the engine, starting at 0.
pub type ProposalId = u32;
