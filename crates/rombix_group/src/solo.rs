//! Serial (single-process) group implementation.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{GroupError, TaskError};
use crate::group::ProcessGroup;
use crate::reduce::ReduceOp;

/// A group of size 1: the calling process is the leader and the only rank.
///
/// Leader tasks run inline and reductions are the identity of the operator
/// over a single contribution. This is the group used when the toolkit runs
/// without a parallel launcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoloGroup;

impl SoloGroup {
    /// Creates a size-1 group.
    pub fn new() -> Self {
        Self
    }
}

impl ProcessGroup for SoloGroup {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn leader_broadcast<T, F>(&self, task: F) -> Result<T, GroupError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, TaskError>,
    {
        task().map_err(GroupError::Task)
    }

    fn all_reduce(&self, value: f64, op: ReduceOp) -> f64 {
        op.finalize(value, 1)
    }
}
