//! This module contains the errors that paths themselves can carry.
//!
//! A path carrying an error is not a failure of the path group. It is an
//! outcome of execution that the step engine classifies: unreachable paths are
//! pruned, and paths with any other error are placed into the errored stash.

use thiserror::Error;

/// The error payload carried by an errored path.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// The constraints on the path's state became unsatisfiable, and hence the
    /// path can never be taken.
    #[error("The path became unreachable: {reason}")]
    Unreachable { reason: String },

    /// The execution engine was unable to continue executing the path.
    #[error("Execution of the path failed: {reason}")]
    Execution { reason: String },

    /// Any other error, represented as a string.
    #[error("Unknown Error: {_0:?}")]
    Other(String),
}

impl Error {
    /// Constructs an unreachable error with the provided `reason`.
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::Unreachable {
            reason: reason.into(),
        }
    }

    /// Constructs an execution error with the provided `reason`.
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }

    /// Constructs an unknown error with the provided `message`.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Checks if this error says that the path became unreachable.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}
