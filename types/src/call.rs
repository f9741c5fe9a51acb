//! Call payloads committed to by proposals.
//!
//! A proposal commits to its transaction batch by content hash only; the
//! full calls are re-supplied (and re-hashed) at execution time. Hashes are
//! Blake2b-256 over the bincode encoding of the call fields in declaration
//! order, so any change to target, value, calldata, or call kind produces a
//! different commitment.

use crate::address::Address;
use crate::hash::TxHash;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};

type Blake2b256 = Blake2b<U32>;

/// How a call is dispatched by the execution primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    /// A regular call carrying value and calldata.
    Call,
    /// A delegate call executed in the avatar's own context.
    DelegateCall,
}

/// A single call in a proposal's transaction batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub target: Address,
    pub value: u128,
    pub data: Vec<u8>,
    pub kind: CallKind,
}

impl Call {
    pub fn new(target: Address, value: u128, data: Vec<u8>, kind: CallKind) -> Self {
        Self {
            target,
            value,
            data,
            kind,
        }
    }

    /// Compute this call's content hash: Blake2b-256 of the bincode
    /// encoding of `(target, value, data, kind)`.
    pub fn content_hash(&self) -> TxHash {
        let bytes = bincode::serialize(self).expect("call serialization is infallible");
        let mut hasher = Blake2b256::new();
        hasher.update(&bytes);
        let result = hasher.finalize();
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        TxHash::new(output)
    }
}

/// Hash an ordered batch of calls, one commitment per call.
pub fn hash_calls(calls: &[Call]) -> Vec<TxHash> {
    calls.iter().map(Call::content_hash).collect()
}
