//! This module contains the interface to accelerated exploration techniques,
//! such as veritesting, that resolve many steps of a path in a single call.
//!
//! Any configuration of the technique belongs to the implementor. The path
//! group only decides _when_ to invoke it and how to fold its result back into
//! its own stashes.

use std::{fmt::Debug, rc::Rc};

use crate::{error::execution, path::Path, stash::Stashes};

/// A dynamically dispatched [`Accelerator`] instance.
pub type DynAccelerator<P> = Rc<dyn Accelerator<P>>;

/// The interface to a technique that explores a path through many steps at
/// once.
pub trait Accelerator<P>
where
    Self: Debug,
    P: Path,
{
    /// Explores from `path`, returning the stashes that the nested exploration
    /// ended with.
    ///
    /// The paths in the [`crate::constant::DEVIATED`] and
    /// [`crate::constant::SUCCESSFUL`] stashes (as well as any left in
    /// [`crate::constant::ACTIVE`]) become the successors of `path`. All other
    /// stashes are merged into the stashes of the same name in the calling
    /// path group.
    ///
    /// Returns [`None`] if the technique produced no usable result, in which
    /// case `path` is stepped normally.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the technique fails unexpectedly.
    fn accelerate(&self, path: &P) -> execution::Result<Option<Stashes<P>>>;
}
