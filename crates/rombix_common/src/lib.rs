//! Shared foundational types used across the rombix toolkit.
//!
//! This crate provides the content hashing primitive used to derive cache
//! keys for just-in-time compiled extension modules.

#![warn(missing_docs)]

pub mod hash;

pub use hash::ContentHash;
