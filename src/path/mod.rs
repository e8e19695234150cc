//! This module contains the interface that the path group expects from the
//! execution engine whose states it schedules.
//!
//! The path group does not know how to execute anything. It only knows how to
//! ask a [`Path`] for its successors, how to classify the answer, and how to
//! shuffle paths between stashes as a result.

#[cfg(test)]
pub(crate) mod testing;

use std::fmt::Debug;

use crate::error::{execution, merge, path::Error as PathError};

/// A program location.
pub type Address = u64;

/// The interface to a single state of the execution engine and its position in
/// the program.
///
/// Cloning a path must produce an independent state, such that stepping or
/// otherwise using the clone has no effect on the original.
pub trait Path
where
    Self: Clone + Debug + 'static,
{
    /// Gets the address at which the path currently is.
    #[must_use]
    fn addr(&self) -> Address;

    /// Gets the error that the path is carrying, if any.
    ///
    /// A path that carries an error will not be stepped, and is instead
    /// classified into the pruned or errored stash.
    #[must_use]
    fn error(&self) -> Option<&PathError>;

    /// Computes the outcome of advancing the path by one step.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the execution engine fails unexpectedly. Errors that
    /// are an expected result of executing the path should instead be
    /// reported as [`StepOutcome::Unreachable`] or [`StepOutcome::Errored`].
    fn step(&self) -> execution::Result<StepOutcome<Self>>;

    /// Merges `self` with `others` to produce a single path that represents all
    /// of them.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the states of the paths cannot be merged.
    fn merge(&self, others: &[Self]) -> merge::Result<Self>;

    /// Gets the addresses that this path has visited in order, not including
    /// the current address.
    #[must_use]
    fn addr_backtrace(&self) -> &[Address];

    /// Checks whether the constraints on the path's state can be satisfied.
    #[must_use]
    fn satisfiable(&self) -> bool;

    /// Checks whether the path is carrying an error.
    #[must_use]
    fn is_errored(&self) -> bool {
        self.error().is_some()
    }
}

/// The result of advancing a path by a single step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StepOutcome<P> {
    /// The path was advanced and produced these successors.
    Successors(Successors<P>),

    /// The path was found to be unreachable.
    Unreachable,

    /// The path could not be advanced due to the provided error.
    Errored(PathError),
}

/// The successors of a path, partitioned into the normal successors and the
/// observational side channels.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Successors<P> {
    /// The successors that should continue to be explored.
    pub normal: Vec<P>,

    /// Successors whose instruction pointer is unconstrained.
    pub unconstrained: Vec<P>,

    /// Successors whose constraints cannot be satisfied.
    pub unsat: Vec<P>,
}

impl<P> Successors<P> {
    /// Creates a new set of successors containing only `normal` successors.
    #[must_use]
    pub fn new(normal: Vec<P>) -> Self {
        let unconstrained = Vec::new();
        let unsat = Vec::new();
        Self {
            normal,
            unconstrained,
            unsat,
        }
    }

    /// Creates a new set of successors that is empty.
    #[must_use]
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    /// Sets the unconstrained successors to `paths`.
    #[must_use]
    pub fn with_unconstrained(mut self, paths: Vec<P>) -> Self {
        self.unconstrained = paths;
        self
    }

    /// Sets the unsatisfiable successors to `paths`.
    #[must_use]
    pub fn with_unsat(mut self, paths: Vec<P>) -> Self {
        self.unsat = paths;
        self
    }
}

impl<P> From<Vec<P>> for Successors<P> {
    fn from(value: Vec<P>) -> Self {
        Self::new(value)
    }
}
