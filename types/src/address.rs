//! 20-byte account address type.

use crate::error::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 20-byte account address, displayed as `0x`-prefixed hex.
///
/// Addresses identify every participant in the system: the avatar, the
/// engine, strategies, voters, and call targets.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address. Never a valid participant.
    pub const ZERO: Self = Self([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Build an address from a small integer (low bytes, big-endian).
    /// Handy for sentinels and test fixtures.
    pub fn from_low(value: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Parse a `0x`-prefixed 40-hex-digit string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let stripped = s
            .strip_prefix("0x")
            .ok_or_else(|| TypeError::InvalidAddress(s.to_string()))?;
        if stripped.len() != 40 || !stripped.is_ascii() {
            return Err(TypeError::InvalidAddress(s.to_string()));
        }
        let mut bytes = [0u8; 20];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&stripped[2 * i..2 * i + 2], 16)
                .map_err(|_| TypeError::InvalidAddress(s.to_string()))?;
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Abbreviated form for logs: `0x` plus the first 4 bytes as hex.
    pub fn short(&self) -> String {
        let mut out = String::from("0x");
        for byte in &self.0[..4] {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
