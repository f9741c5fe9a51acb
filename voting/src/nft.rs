//! Minimal NFT ownership ledger backing the non-fungible strategy.
//!
//! Ownership is read live at vote time (no snapshot) — each token id votes
//! at most once per proposal regardless of who holds it, which is what makes
//! a vote-then-transfer replay worthless.

use crate::error::VotingError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tribune_types::Address;

/// Token ownership per collection: collection → token id → owner.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NftLedger {
    collections: HashMap<Address, HashMap<u64, Address>>,
}

impl NftLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh token id to `owner`.
    pub fn mint(
        &mut self,
        collection: &Address,
        token_id: u64,
        owner: &Address,
    ) -> Result<(), VotingError> {
        let tokens = self.collections.entry(*collection).or_default();
        if tokens.contains_key(&token_id) {
            return Err(VotingError::TokenAlreadyMinted {
                collection: *collection,
                token_id,
            });
        }
        tokens.insert(token_id, *owner);
        Ok(())
    }

    /// Transfer a token between holders.
    pub fn transfer(
        &mut self,
        collection: &Address,
        token_id: u64,
        from: &Address,
        to: &Address,
    ) -> Result<(), VotingError> {
        let owner = self
            .collections
            .get_mut(collection)
            .and_then(|tokens| tokens.get_mut(&token_id))
            .ok_or(VotingError::UnknownToken {
                collection: *collection,
                token_id,
            })?;
        if owner != from {
            return Err(VotingError::NotTokenOwner {
                collection: *collection,
                token_id,
            });
        }
        *owner = *to;
        Ok(())
    }

    /// Current owner of a token, if it exists.
    pub fn owner_of(&self, collection: &Address, token_id: u64) -> Option<Address> {
        self.collections
            .get(collection)
            .and_then(|tokens| tokens.get(&token_id))
            .copied()
    }

    /// Number of tokens in `collection` currently owned by `owner`.
    pub fn owned_count(&self, collection: &Address, owner: &Address) -> u128 {
        self.collections
            .get(collection)
            .map(|tokens| tokens.values().filter(|held_by| *held_by == owner).count() as u128)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(low: u64) -> Address {
        Address::from_low(low)
    }

    #[test]
    fn mint_and_owner_of() {
        let mut ledger = NftLedger::new();
        ledger.mint(&addr(10), 1, &addr(1)).unwrap();
        assert_eq!(ledger.owner_of(&addr(10), 1), Some(addr(1)));
        assert_eq!(ledger.owner_of(&addr(10), 2), None);
    }

    #[test]
    fn double_mint_rejected() {
        let mut ledger = NftLedger::new();
        ledger.mint(&addr(10), 1, &addr(1)).unwrap();
        assert!(matches!(
            ledger.mint(&addr(10), 1, &addr(2)),
            Err(VotingError::TokenAlreadyMinted { .. })
        ));
    }

    #[test]
    fn transfer_changes_owner() {
        let mut ledger = NftLedger::new();
        ledger.mint(&addr(10), 1, &addr(1)).unwrap();
        ledger.transfer(&addr(10), 1, &addr(1), &addr(2)).unwrap();
        assert_eq!(ledger.owner_of(&addr(10), 1), Some(addr(2)));
    }

    #[test]
    fn transfer_by_non_owner_rejected() {
        let mut ledger = NftLedger::new();
        ledger.mint(&addr(10), 1, &addr(1)).unwrap();
        assert!(matches!(
            ledger.transfer(&addr(10), 1, &addr(3), &addr(2)),
            Err(VotingError::NotTokenOwner { .. })
        ));
    }

    #[test]
    fn owned_count_per_collection() {
        let mut ledger = NftLedger::new();
        ledger.mint(&addr(10), 1, &addr(1)).unwrap();
        ledger.mint(&addr(10), 2, &addr(1)).unwrap();
        ledger.mint(&addr(10), 3, &addr(2)).unwrap();
        ledger.mint(&addr(11), 1, &addr(1)).unwrap();

        assert_eq!(ledger.owned_count(&addr(10), &addr(1)), 2);
        assert_eq!(ledger.owned_count(&addr(11), &addr(1)), 1);
        assert_eq!(ledger.owned_count(&addr(12), &addr(1)), 0);
    }
}
