//! Reduction operators for collective reductions.

use serde::{Deserialize, Serialize};

/// The reduction operator applied by [`ProcessGroup::all_reduce`].
///
/// Every rank contributes one scalar; the group combines them pairwise with
/// [`ReduceOp::combine`] and applies [`ReduceOp::finalize`] once to the
/// accumulated value. `Average` is the only operator with a non-trivial
/// finalize step (it divides the sum by the group size).
///
/// [`ProcessGroup::all_reduce`]: crate::ProcessGroup::all_reduce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReduceOp {
    /// The largest contribution.
    Max,
    /// The smallest contribution.
    Min,
    /// The sum of all contributions.
    Sum,
    /// The arithmetic mean of all contributions.
    Average,
}

impl ReduceOp {
    /// Combines the accumulator with one more contribution.
    pub fn combine(self, acc: f64, value: f64) -> f64 {
        match self {
            ReduceOp::Max => acc.max(value),
            ReduceOp::Min => acc.min(value),
            ReduceOp::Sum | ReduceOp::Average => acc + value,
        }
    }

    /// Finalizes the accumulated value for a group of `count` ranks.
    pub fn finalize(self, acc: f64, count: usize) -> f64 {
        match self {
            ReduceOp::Average => acc / count as f64,
            _ => acc,
        }
    }
}
