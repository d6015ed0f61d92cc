//! The process-group trait.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{GroupError, TaskError};
use crate::reduce::ReduceOp;

/// A fixed-size group of cooperating processes with collective operations.
///
/// Exactly one rank (rank 0, the leader) performs side-effecting work such
/// as filesystem writes or primary compilation; the collectives make the
/// outcome of that work visible to every rank without duplicating it.
///
/// Both methods are collective: every rank of the group must call them, in
/// the same order, with compatible arguments. Violating that contract stalls
/// or diverges the group; it is a caller bug, not a recoverable condition.
pub trait ProcessGroup {
    /// This process's rank in `[0, size)`.
    fn rank(&self) -> usize;

    /// The number of ranks in the group.
    fn size(&self) -> usize;

    /// Returns `true` on the designated leader (rank 0).
    fn is_leader(&self) -> bool {
        self.rank() == 0
    }

    /// Runs `task` on the leader only and broadcasts its outcome.
    ///
    /// Every rank, the leader included, receives the same result: the value
    /// the task returned, or a [`GroupError::Task`] carrying the task's
    /// failure message. Non-leader ranks never execute `task`.
    fn leader_broadcast<T, F>(&self, task: F) -> Result<T, GroupError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, TaskError>;

    /// Reduces one scalar contribution per rank into a group-wide value.
    ///
    /// Every rank receives the same reduced scalar.
    fn all_reduce(&self, value: f64, op: ReduceOp) -> f64;
}
