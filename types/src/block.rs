//! Block height type.
//!
//! All lifecycle timing — voting windows, timelocks, execution windows — is
//! measured in block heights of the host ledger, never wall-clock time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A block height on the host ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockNumber(u64);

impl BlockNumber {
    /// The genesis height.
    pub const GENESIS: Self = Self(0);

    pub fn new(height: u64) -> Self {
        Self(height)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// This height advanced by `blocks` (saturating).
    pub fn advanced(&self, blocks: u64) -> Self {
        Self(self.0.saturating_add(blocks))
    }

    /// Whether `duration` blocks have fully elapsed since this height,
    /// as observed at `now`.
    pub fn has_elapsed(&self, duration: u64, now: BlockNumber) -> bool {
        now.0 > self.0.saturating_add(duration)
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advanced_saturates() {
        let b = BlockNumber::new(u64::MAX);
        assert_eq!(b.advanced(10), b);
    }

    #[test]
    fn has_elapsed_is_strict() {
        let start = BlockNumber::new(100);
        assert!(!start.has_elapsed(10, BlockNumber::new(110)));
        assert!(start.has_elapsed(10, BlockNumber::new(111)));
    }
}
