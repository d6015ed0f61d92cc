//! Error types for the compiler bridge.

use std::path::PathBuf;

use rombix_group::GroupError;

/// Errors raised by the compiler bridge.
#[derive(Debug, thiserror::Error)]
pub enum JitError {
    /// A required compiler option is absent after merging defaults and
    /// caller overrides. This is a contract violation in the defaults
    /// provider or the caller, detected before any side effect.
    #[error("missing required compiler option `{0}`")]
    MissingOption(&'static str),

    /// A compiler option is present but has the wrong shape (scalar where a
    /// list is required, or vice versa).
    #[error("compiler option `{name}` must be a {expected}")]
    OptionKind {
        /// The offending option name.
        name: &'static str,
        /// The required shape, `"list"` or `"scalar"`.
        expected: &'static str,
    },

    /// An I/O error occurred while staging the package.
    #[error("failed to {action} {path}: {source}")]
    Io {
        /// What the bridge was doing, e.g. `"read"` or `"write"`.
        action: &'static str,
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The build descriptor could not be rendered into the staged source.
    #[error("build descriptor error: {0}")]
    Descriptor(String),

    /// The native toolchain reported a compilation failure. Carried to
    /// every rank of the group, with the toolchain's message embedded.
    #[error("compilation failed: {0}")]
    Build(String),

    /// A collective operation failed (leader-side staging failure as
    /// observed by the group, or a broadcast transport problem).
    #[error(transparent)]
    Group(#[from] GroupError),
}
