//! Error types for collective operations.

use serde::{Deserialize, Serialize};

/// A failure raised by a task executed on the group leader.
///
/// Only the message crosses the rank boundary: the leader's task may fail
/// with any error type, but what the other ranks can observe is its rendered
/// description, so that is what the group transports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct TaskError {
    /// Rendered description of the underlying failure.
    pub message: String,
}

impl TaskError {
    /// Creates a task error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors observed by a rank participating in a collective operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    /// The leader's task failed; every rank observes the same error.
    #[error("leader task failed: {0}")]
    Task(TaskError),

    /// A broadcast payload could not be encoded or decoded.
    #[error("collective payload codec error: {0}")]
    Codec(String),
}
