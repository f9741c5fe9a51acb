//! Boundary to the avatar's execution primitive.

use tribune_types::Call;

/// Executes verified calls with the authority of the asset-holding account.
///
/// The engine treats this as a black box: one call in, success or failure
/// out. Implementations are the multisig/treasury integration layer, not
/// part of the governance core.
pub trait AvatarExecutor {
    /// Execute one call. Returns whether the call succeeded.
    fn execute(&mut self, call: &Call) -> bool;
}
