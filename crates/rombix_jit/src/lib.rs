//! Just-in-time compiler bridge for C++ extension packages.
//!
//! Given a process group, a logical package name, and a C++ source file,
//! [`compile()`] stages the source under a content-hash-derived artifact
//! identifier, coordinates a single compilation attempt across the group
//! (leader-only side effects, group-wide failure), and returns a loadable
//! [`NativeModule`] handle on every rank.
//!
//! The bridge compiles at most once per distinct content hash per machine:
//! byte-identical source under the same package name resolves to the same
//! on-disk artifact, so repeated calls are cache hits.

#![warn(missing_docs)]

pub mod compile;
pub mod defaults;
pub mod env;
pub mod error;
pub mod options;
pub mod preamble;
pub mod search_path;
pub mod stage;
pub mod toolchain;

pub use compile::{compile, compile_with};
pub use defaults::determine_default_compiler_options;
pub use env::{CompilerEnv, MpiConfig};
pub use error::JitError;
pub use options::{keys, CompilerOptions, OptionValue};
pub use preamble::{BuildConfig, DescriptorError};
pub use search_path::SearchPath;
pub use stage::{stage_package, SIGNATURE_PLACEHOLDER};
pub use toolchain::{BuildFailure, NativeModule, SystemToolchain, Toolchain};
