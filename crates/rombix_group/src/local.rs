//! Thread-backed group for hosting a size-N group in one process.
//!
//! `LocalCluster` gives each rank its own thread and coordinates collectives
//! through a mutex-protected round table plus a condition variable. Rounds
//! are numbered by a per-member sequence counter, so the usual collective
//! contract applies: every rank must issue the same collectives in the same
//! order, or the cluster deadlocks exactly as a real process group would.
//!
//! Broadcast payloads cross rank boundaries as encoded bytes, matching what
//! a multi-process transport would carry, so leader-task results must be
//! serializable even though the ranks share an address space here.

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{GroupError, TaskError};
use crate::group::ProcessGroup;
use crate::reduce::ReduceOp;

/// One in-flight or completed collective round.
struct Round {
    phase: Phase,
    /// Ranks that have taken the round's result; the round is dropped once
    /// all of them have.
    consumed: usize,
}

enum Phase {
    Reduce {
        acc: f64,
        contributed: usize,
        result: Option<f64>,
    },
    Broadcast {
        payload: Option<Result<Vec<u8>, TaskError>>,
    },
}

impl Round {
    fn reduce() -> Self {
        Self {
            phase: Phase::Reduce {
                acc: 0.0,
                contributed: 0,
                result: None,
            },
            consumed: 0,
        }
    }

    fn broadcast() -> Self {
        Self {
            phase: Phase::Broadcast { payload: None },
            consumed: 0,
        }
    }
}

struct Shared {
    size: usize,
    state: Mutex<HashMap<u64, Round>>,
    cond: Condvar,
}

/// A process group hosted as one thread per rank inside a single process.
///
/// Useful for exercising multi-rank collective semantics without an external
/// launcher; production runs use one `LocalMember`-equivalent handle per OS
/// process instead.
pub struct LocalCluster {
    shared: Arc<Shared>,
}

impl LocalCluster {
    /// Creates a cluster for `size` ranks.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "a process group must have at least one rank");
        Self {
            shared: Arc::new(Shared {
                size,
                state: Mutex::new(HashMap::new()),
                cond: Condvar::new(),
            }),
        }
    }

    /// Returns the member handle for `rank`.
    ///
    /// # Panics
    ///
    /// Panics if `rank` is outside `[0, size)`.
    pub fn member(&self, rank: usize) -> LocalMember {
        assert!(
            rank < self.shared.size,
            "rank {rank} out of range for a group of size {}",
            self.shared.size
        );
        LocalMember {
            rank,
            seq: Cell::new(0),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Spawns one scoped thread per rank, runs `f` on each, and returns the
    /// per-rank results indexed by rank.
    pub fn run<R, F>(size: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(LocalMember) -> R + Sync,
    {
        let cluster = LocalCluster::new(size);
        let f = &f;
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..size)
                .map(|rank| {
                    let member = cluster.member(rank);
                    scope.spawn(move || f(member))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(value) => value,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        })
    }
}

/// One rank's handle onto a [`LocalCluster`].
///
/// Handles are not shareable across threads; each rank owns exactly one.
pub struct LocalMember {
    rank: usize,
    seq: Cell<u64>,
    shared: Arc<Shared>,
}

impl LocalMember {
    fn next_seq(&self) -> u64 {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        seq
    }

    /// Takes the finished round's result slot bookkeeping: marks this rank
    /// as having consumed round `seq` and drops the round once all have.
    fn consume(state: &mut HashMap<u64, Round>, seq: u64, size: usize) {
        let round = match state.get_mut(&seq) {
            Some(round) => round,
            None => panic!("collective round {seq} dropped before all ranks consumed it"),
        };
        round.consumed += 1;
        if round.consumed == size {
            state.remove(&seq);
        }
    }
}

impl ProcessGroup for LocalMember {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn leader_broadcast<T, F>(&self, task: F) -> Result<T, GroupError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, TaskError>,
    {
        let seq = self.next_seq();
        let size = self.shared.size;

        let payload: Result<Vec<u8>, TaskError> = if self.rank == 0 {
            // Run the task outside the lock; only its outcome is shared.
            let encoded = match task() {
                Ok(value) => {
                    match bincode::serde::encode_to_vec(&value, bincode::config::standard()) {
                        Ok(bytes) => Ok(bytes),
                        Err(e) => Err(TaskError::new(format!(
                            "broadcast payload encode failed: {e}"
                        ))),
                    }
                }
                Err(e) => Err(e),
            };
            let mut state = self.shared.state.lock();
            let round = state.entry(seq).or_insert_with(Round::broadcast);
            match &mut round.phase {
                Phase::Broadcast { payload } => *payload = Some(encoded.clone()),
                Phase::Reduce { .. } => {
                    panic!("collective mismatch: rank 0 broadcast in round {seq}, another rank reduced")
                }
            }
            Self::consume(&mut state, seq, size);
            self.shared.cond.notify_all();
            encoded
        } else {
            let mut state = self.shared.state.lock();
            loop {
                let ready = {
                    let round = state.entry(seq).or_insert_with(Round::broadcast);
                    match &round.phase {
                        Phase::Broadcast { payload } => payload.clone(),
                        Phase::Reduce { .. } => panic!(
                            "collective mismatch: rank {} broadcast in round {seq}, another rank reduced",
                            self.rank
                        ),
                    }
                };
                match ready {
                    Some(payload) => {
                        Self::consume(&mut state, seq, size);
                        break payload;
                    }
                    None => self.shared.cond.wait(&mut state),
                }
            }
        };

        match payload {
            Ok(bytes) => {
                let (value, _) =
                    bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                        .map_err(|e| GroupError::Codec(e.to_string()))?;
                Ok(value)
            }
            Err(task_error) => Err(GroupError::Task(task_error)),
        }
    }

    fn all_reduce(&self, value: f64, op: ReduceOp) -> f64 {
        let seq = self.next_seq();
        let size = self.shared.size;
        let mut state = self.shared.state.lock();

        {
            let round = state.entry(seq).or_insert_with(Round::reduce);
            match &mut round.phase {
                Phase::Reduce {
                    acc,
                    contributed,
                    result,
                } => {
                    *acc = if *contributed == 0 {
                        value
                    } else {
                        op.combine(*acc, value)
                    };
                    *contributed += 1;
                    if *contributed == size {
                        *result = Some(op.finalize(*acc, size));
                        self.shared.cond.notify_all();
                    }
                }
                Phase::Broadcast { .. } => panic!(
                    "collective mismatch: rank {} reduced in round {seq}, another rank broadcast",
                    self.rank
                ),
            }
        }

        loop {
            let done = {
                let round = match state.get(&seq) {
                    Some(round) => round,
                    None => panic!("collective round {seq} dropped before all ranks consumed it"),
                };
                match &round.phase {
                    Phase::Reduce { result, .. } => *result,
                    Phase::Broadcast { .. } => unreachable!(),
                }
            };
            match done {
                Some(reduced) => {
                    Self::consume(&mut state, seq, size);
                    return reduced;
                }
                None => self.shared.cond.wait(&mut state),
            }
        }
    }
}
