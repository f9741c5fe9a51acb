//! The ordered set of enabled voting strategies.
//!
//! A sentinel-anchored singly-linked next-pointer map, giving O(1) enable
//! and disable (the caller supplies the predecessor, as in any intrusive
//! list) and pagination in reverse insertion order — most recently enabled
//! first. Iteration order is an observable contract, so this is not an
//! unordered set.

use crate::error::EngineError;
use std::collections::HashMap;
use tribune_types::Address;

/// Anchor entry of the linked set. Never a real strategy.
pub const SENTINEL: Address = Address::new({
    let mut bytes = [0u8; 20];
    bytes[19] = 1;
    bytes
});

/// Linked set of enabled strategy addresses.
#[derive(Clone, Debug)]
pub struct StrategySet {
    /// next-pointers: entry → the entry enabled just before it.
    next: HashMap<Address, Address>,
}

impl StrategySet {
    pub fn new() -> Self {
        let mut next = HashMap::new();
        next.insert(SENTINEL, SENTINEL);
        Self { next }
    }

    /// Link a strategy at the head of the set.
    pub fn enable(&mut self, strategy: Address) -> Result<(), EngineError> {
        if strategy.is_zero() || strategy == SENTINEL {
            return Err(EngineError::InvalidStrategy);
        }
        if self.next.contains_key(&strategy) {
            return Err(EngineError::StrategyEnabled);
        }
        let head = self.next[&SENTINEL];
        self.next.insert(strategy, head);
        self.next.insert(SENTINEL, strategy);
        Ok(())
    }

    /// Unlink a strategy given its predecessor in iteration order.
    pub fn disable(&mut self, prev: Address, strategy: Address) -> Result<(), EngineError> {
        if strategy.is_zero() || strategy == SENTINEL {
            return Err(EngineError::InvalidStrategy);
        }
        if self.next.get(&prev) != Some(&strategy) {
            return Err(EngineError::StrategyDisabled);
        }
        let after = self.next.remove(&strategy).unwrap_or(SENTINEL);
        self.next.insert(prev, after);
        Ok(())
    }

    pub fn is_enabled(&self, strategy: &Address) -> bool {
        *strategy != SENTINEL && self.next.contains_key(strategy)
    }

    /// Up to `count` enabled strategies starting after `start` (pass
    /// [`SENTINEL`] for the head), most recently enabled first.
    pub fn page(&self, start: &Address, count: usize) -> Vec<Address> {
        let mut out = Vec::new();
        let mut cursor = self.next.get(start).copied().unwrap_or(SENTINEL);
        while cursor != SENTINEL && out.len() < count {
            out.push(cursor);
            cursor = self.next.get(&cursor).copied().unwrap_or(SENTINEL);
        }
        out
    }
}

impl Default for StrategySet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(low: u64) -> Address {
        Address::from_low(low)
    }

    #[test]
    fn pagination_is_reverse_insertion_order() {
        let mut set = StrategySet::new();
        set.enable(addr(1)).unwrap();
        set.enable(addr(2)).unwrap();
        set.enable(addr(3)).unwrap();

        assert_eq!(set.page(&SENTINEL, 10), vec![addr(3), addr(2), addr(1)]);
        assert_eq!(set.page(&SENTINEL, 2), vec![addr(3), addr(2)]);
        // Resume from a cursor.
        assert_eq!(set.page(&addr(2), 10), vec![addr(1)]);
    }

    #[test]
    fn enable_rejects_zero_sentinel_and_duplicates() {
        let mut set = StrategySet::new();
        assert!(matches!(
            set.enable(Address::ZERO),
            Err(EngineError::InvalidStrategy)
        ));
        assert!(matches!(
            set.enable(SENTINEL),
            Err(EngineError::InvalidStrategy)
        ));
        set.enable(addr(1)).unwrap();
        assert!(matches!(set.enable(addr(1)), Err(EngineError::StrategyEnabled)));
    }

    #[test]
    fn disable_unlinks_with_correct_predecessor() {
        let mut set = StrategySet::new();
        set.enable(addr(1)).unwrap();
        set.enable(addr(2)).unwrap();
        set.enable(addr(3)).unwrap();

        // 2's predecessor is 3.
        set.disable(addr(3), addr(2)).unwrap();
        assert_eq!(set.page(&SENTINEL, 10), vec![addr(3), addr(1)]);
        assert!(!set.is_enabled(&addr(2)));
        assert!(set.is_enabled(&addr(1)));
    }

    #[test]
    fn disable_head_uses_sentinel_as_predecessor() {
        let mut set = StrategySet::new();
        set.enable(addr(1)).unwrap();
        set.enable(addr(2)).unwrap();
        set.disable(SENTINEL, addr(2)).unwrap();
        assert_eq!(set.page(&SENTINEL, 10), vec![addr(1)]);
    }

    #[test]
    fn disable_wrong_predecessor_or_not_enabled() {
        let mut set = StrategySet::new();
        set.enable(addr(1)).unwrap();
        set.enable(addr(2)).unwrap();
        assert!(matches!(
            set.disable(addr(1), addr(2)),
            Err(EngineError::StrategyDisabled)
        ));
        assert!(matches!(
            set.disable(SENTINEL, addr(9)),
            Err(EngineError::StrategyDisabled)
        ));
    }

    #[test]
    fn reenable_after_disable() {
        let mut set = StrategySet::new();
        set.enable(addr(1)).unwrap();
        set.enable(addr(2)).unwrap();
        set.disable(addr(2), addr(1)).unwrap();
        set.enable(addr(1)).unwrap();
        assert_eq!(set.page(&SENTINEL, 10), vec![addr(1), addr(2)]);
    }
}
