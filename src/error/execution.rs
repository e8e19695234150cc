//! This module contains errors pertaining to unexpected failures while
//! advancing paths.
//!
//! These are distinct from the errors that a path can _carry_ (see
//! [`crate::error::path`]), which are an expected outcome of execution and are
//! classified into stashes rather than returned.

use thiserror::Error;

use crate::{error::container, path::Address};

/// Unexpected failures that occur while stepping a path.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("The execution engine failed: {message}")]
    Engine { message: String },

    #[error("The successor function failed: {message}")]
    SuccessorFunction { message: String },

    #[error("Accelerated exploration failed: {message}")]
    Accelerator { message: String },
}

impl Error {
    /// Constructs an execution engine failure with the provided `message`.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    /// Constructs a successor function failure with the provided `message`.
    pub fn successor_function(message: impl Into<String>) -> Self {
        Self::SuccessorFunction {
            message: message.into(),
        }
    }

    /// Constructs an accelerator failure with the provided `message`.
    pub fn accelerator(message: impl Into<String>) -> Self {
        Self::Accelerator {
            message: message.into(),
        }
    }
}

/// An execution error with the address of the path on which it occurred.
pub type LocatedError = container::Located<Error>;

/// A container of execution errors used for retaining failures that were
/// tolerated during stepping.
pub type Errors = container::Errors<LocatedError>;

/// The result type for methods that may have execution errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Make it possible to attach locations to these errors.
impl container::Locatable for Error {
    type Located = LocatedError;

    fn locate(self, address: Address) -> Self::Located {
        container::Located {
            location: address,
            payload:  self,
        }
    }
}
