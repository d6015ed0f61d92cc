//! Process-group abstraction for collective coordination.
//!
//! The rombix toolkit runs as a fixed-size set of cooperating processes,
//! each with a distinguishable rank. All cross-process coordination goes
//! through two collective primitives on [`ProcessGroup`]:
//!
//! - [`ProcessGroup::leader_broadcast`] — run a task on rank 0 only and make
//!   its outcome (value or failure) visible to every rank;
//! - [`ProcessGroup::all_reduce`] — reduce one scalar contribution per rank
//!   into a single group-wide value delivered to every rank.
//!
//! Every rank must issue the same collectives in the same order; skipping a
//! collective on a subset of ranks deadlocks the group.
//!
//! Two implementations are provided: [`SoloGroup`] for serial runs, and
//! [`LocalCluster`] which hosts a size-N group as one thread per rank inside
//! a single process, useful for exercising multi-rank collective semantics
//! without a launcher.

#![warn(missing_docs)]

pub mod error;
pub mod group;
pub mod local;
pub mod reduce;
pub mod solo;

pub use error::{GroupError, TaskError};
pub use group::ProcessGroup;
pub use local::{LocalCluster, LocalMember};
pub use reduce::ReduceOp;
pub use solo::SoloGroup;
