//! Group-reduced timing of code regions.
//!
//! A [`Timer`] wraps a timed region: entering it records a monotonic start
//! timestamp, and exiting it reduces the elapsed seconds across the process
//! group with a caller-chosen [`ReduceOp`] and hands the single reduced
//! value to a caller-supplied sink — once per completed region, on every
//! rank, with the same value.
//!
//! [`ReduceOp`]: rombix_group::ReduceOp

#![warn(missing_docs)]

pub mod timer;

pub use timer::{store_elapsed_time, Timer};
