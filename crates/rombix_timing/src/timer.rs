//! A scoped timing region with collective reduction.

use std::time::Instant;

use rombix_group::{ProcessGroup, ReduceOp};

/// Times a region of code and stores the group-reduced elapsed time.
///
/// [`enter`](Timer::enter) records a monotonic start timestamp and
/// [`exit`](Timer::exit) reduces the elapsed seconds across the group and
/// passes the reduced scalar to the sink. The reduction is a collective:
/// every rank of the group must exit the same region with the same
/// operator, and every rank's sink receives the same reduced value.
///
/// A timer instance is reusable for sequential regions but must not be
/// shared across nested scopes; nest separate instances instead.
pub struct Timer<'g, G: ProcessGroup, S: FnMut(f64)> {
    group: &'g G,
    op: ReduceOp,
    sink: S,
    start: Option<Instant>,
}

impl<'g, G: ProcessGroup, S: FnMut(f64)> Timer<'g, G, S> {
    /// Creates a timer reducing over `group` with `op`, delivering to `sink`.
    pub fn new(group: &'g G, op: ReduceOp, sink: S) -> Self {
        Self {
            group,
            op,
            sink,
            start: None,
        }
    }

    /// Starts the timed region.
    pub fn enter(&mut self) {
        self.start = Some(Instant::now());
    }

    /// Stops the timed region, reduces the elapsed time across the group,
    /// and delivers the reduced value to the sink.
    ///
    /// # Panics
    ///
    /// Panics if the timer was never entered; exiting a region that was not
    /// opened is a caller bug, not a recoverable condition.
    pub fn exit(&mut self) {
        let start = match self.start.take() {
            Some(start) => start,
            None => panic!("Timer::exit called without a matching Timer::enter"),
        };
        let elapsed = start.elapsed().as_secs_f64();
        let reduced = self.group.all_reduce(elapsed, self.op);
        (self.sink)(reduced);
    }

    /// Runs `body` inside the timed region.
    ///
    /// The exit path runs whether the body produced an `Ok` or an `Err`
    /// value, so the sink is always called once for the region.
    pub fn time<R>(&mut self, body: impl FnOnce() -> R) -> R {
        self.enter();
        let result = body();
        self.exit();
        result
    }
}

/// Builds a sink that stores the reduced elapsed time in `storage[index]`.
///
/// Handles the frequent case of collecting the timings of successive phases
/// into a slice or array.
pub fn store_elapsed_time(storage: &mut [f64], index: usize) -> impl FnMut(f64) + '_ {
    move |elapsed| storage[index] = elapsed
}
