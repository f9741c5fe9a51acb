//! Checkpointed fungible voting token.
//!
//! Vote weight is read at the proposal's start block, not the vote-cast
//! block, so the token keeps an explicit per-block history of delegated
//! voting power and total supply rather than only current balances. Every
//! mutation writes a checkpoint; historical queries binary-search the
//! history.
//!
//! Holders self-delegate by default; an explicit `delegate` call moves the
//! holder's full balance weight to the chosen delegate from that block on.

use crate::error::VotingError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tribune_types::{Address, BlockNumber};

/// One point in a value's block history: `value` holds from `from_block`
/// until the next checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub from_block: BlockNumber,
    pub value: u128,
}

/// A fungible token with delegation and per-block voting-power history.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VotingToken {
    /// Current balances.
    balances: HashMap<Address, u128>,
    /// Explicit delegations: holder → delegate. Absent means self-delegated.
    delegates: HashMap<Address, Address>,
    /// Voting-power history per delegate, checkpoints sorted by block.
    vote_history: HashMap<Address, Vec<Checkpoint>>,
    /// Total-supply history, checkpoints sorted by block.
    supply_history: Vec<Checkpoint>,
}

impl VotingToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// The delegate a holder's weight currently accrues to.
    pub fn delegate_of(&self, holder: &Address) -> Address {
        self.delegates.get(holder).copied().unwrap_or(*holder)
    }

    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Mint `amount` to `to` at block `at`, crediting its delegate's weight.
    pub fn mint(&mut self, to: &Address, amount: u128, at: BlockNumber) {
        let entry = self.balances.entry(*to).or_insert(0);
        *entry = entry.saturating_add(amount);
        let new_supply = Self::latest(&self.supply_history).saturating_add(amount);
        Self::write_checkpoint(&mut self.supply_history, at, new_supply);
        let delegate = self.delegate_of(to);
        self.add_votes(&delegate, amount, at);
    }

    /// Transfer between holders at block `at`, moving weight between their
    /// delegates.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u128,
        at: BlockNumber,
    ) -> Result<(), VotingError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(VotingError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        *self.balances.entry(*from).or_insert(0) -= amount;
        let entry = self.balances.entry(*to).or_insert(0);
        *entry = entry.saturating_add(amount);

        let from_delegate = self.delegate_of(from);
        let to_delegate = self.delegate_of(to);
        if from_delegate != to_delegate {
            self.remove_votes(&from_delegate, amount, at);
            self.add_votes(&to_delegate, amount, at);
        }
        Ok(())
    }

    /// Point the holder's full balance weight at a new delegate from block
    /// `at` on.
    pub fn delegate(&mut self, holder: &Address, to: &Address, at: BlockNumber) {
        let old = self.delegate_of(holder);
        if old == *to {
            return;
        }
        let balance = self.balance_of(holder);
        self.delegates.insert(*holder, *to);
        if balance > 0 {
            self.remove_votes(&old, balance, at);
            self.add_votes(to, balance, at);
        }
    }

    /// Voting power of `account` as of block `block` (inclusive).
    pub fn votes_at(&self, account: &Address, block: BlockNumber) -> u128 {
        self.vote_history
            .get(account)
            .map(|history| Self::value_at(history, block))
            .unwrap_or(0)
    }

    /// Current voting power of `account`.
    pub fn current_votes(&self, account: &Address) -> u128 {
        self.vote_history
            .get(account)
            .map(|history| Self::latest(history))
            .unwrap_or(0)
    }

    /// Total supply as of block `block` (inclusive).
    pub fn total_supply_at(&self, block: BlockNumber) -> u128 {
        Self::value_at(&self.supply_history, block)
    }

    pub fn total_supply(&self) -> u128 {
        Self::latest(&self.supply_history)
    }

    /// Add weight to a delegate's history at block `at`.
    fn add_votes(&mut self, delegate: &Address, amount: u128, at: BlockNumber) {
        let history = self.vote_history.entry(*delegate).or_default();
        let next = Self::latest(history).saturating_add(amount);
        Self::write_checkpoint(history, at, next);
    }

    /// Remove weight from a delegate's history at block `at`.
    fn remove_votes(&mut self, delegate: &Address, amount: u128, at: BlockNumber) {
        let history = self.vote_history.entry(*delegate).or_default();
        let next = Self::latest(history).saturating_sub(amount);
        Self::write_checkpoint(history, at, next);
    }

    /// Append a checkpoint, overwriting in place when the same block is
    /// written twice.
    fn write_checkpoint(history: &mut Vec<Checkpoint>, at: BlockNumber, value: u128) {
        match history.last_mut() {
            Some(last) if last.from_block == at => last.value = value,
            _ => history.push(Checkpoint {
                from_block: at,
                value,
            }),
        }
    }

    fn latest(history: &[Checkpoint]) -> u128 {
        history.last().map(|c| c.value).unwrap_or(0)
    }

    /// Latest checkpoint at or before `block`, 0 if none.
    fn value_at(history: &[Checkpoint], block: BlockNumber) -> u128 {
        let idx = history.partition_point(|c| c.from_block <= block);
        if idx == 0 {
            0
        } else {
            history[idx - 1].value
        }
    }
}
