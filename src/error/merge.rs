//! This module contains errors pertaining to the merging of paths.

use thiserror::Error;

use crate::path::Address;

/// Errors that occur when folding a group of paths into a single path.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("Paths at {addresses:x?} cannot be merged as they are at different addresses")]
    MismatchedAddresses { addresses: Vec<Address> },

    #[error("The states of the paths cannot be merged: {reason}")]
    Incompatible { reason: String },
}

impl Error {
    /// Constructs an incompatibility error with the provided `reason`.
    pub fn incompatible(reason: impl Into<String>) -> Self {
        Self::Incompatible {
            reason: reason.into(),
        }
    }
}

/// The result type for merge operations.
pub type Result<T> = std::result::Result<T, Error>;
