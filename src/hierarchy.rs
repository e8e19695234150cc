//! This module contains the type definitions necessary to report paths that
//! have become unreachable to the rest of the analysis.
//!
//! The path group itself does nothing with this information beyond passing it
//! on. Whatever tracks the lineage of paths (and caches anything keyed on
//! them) is expected to implement [`Hierarchy`] and invalidate as it sees fit.

use std::{cell::RefCell, fmt::Debug, rc::Rc};

use crate::path::{Address, Path};

/// A dynamically dispatched [`Hierarchy`] instance.
///
/// It is shared between every path group derived from a common ancestor.
pub type DynHierarchy<P> = Rc<dyn Hierarchy<P>>;

/// The interface to an object that tracks the reachability of paths.
pub trait Hierarchy<P>
where
    Self: Debug,
    P: Path,
{
    /// Records that `path` has become unreachable.
    fn unreachable(&self, path: &P);
}

/// An implementation of the [`Hierarchy`] trait that records the address of
/// every path it is told is unreachable.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PathHierarchy {
    unreachable: RefCell<Vec<Address>>,
}

impl PathHierarchy {
    /// Constructs a new hierarchy that has not seen any unreachable paths.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `self` into an [`Rc`].
    #[must_use]
    pub fn in_rc(self) -> Rc<Self> {
        Rc::new(self)
    }

    /// Gets the addresses of the paths reported as unreachable, in the order in
    /// which they were reported.
    #[must_use]
    pub fn unreachable_addresses(&self) -> Vec<Address> {
        self.unreachable.borrow().clone()
    }

    /// Gets the number of paths that have been reported as unreachable.
    #[must_use]
    pub fn unreachable_count(&self) -> usize {
        self.unreachable.borrow().len()
    }
}

impl<P: Path> Hierarchy<P> for PathHierarchy {
    fn unreachable(&self, path: &P) {
        self.unreachable.borrow_mut().push(path.addr());
    }
}
