//! This library implements the scheduler at the heart of a symbolic execution
//! engine: a group of execution paths, sorted into named _stashes_, that can be
//! stepped forward, filtered, merged, split and searched through.
//!
//! The library does not execute anything itself. It drives any execution
//! engine whose states implement [`path::Path`], and reports paths that it
//! finds to be dead to a [`hierarchy::Hierarchy`].
//!
//! # How it Works
//!
//! From a very high level, exploration proceeds as follows:
//!
//! 1. The initial paths are placed into the [`constant::ACTIVE`] stash of a
//!    new [`PathGroup`].
//! 2. Each call to [`PathGroup::step`] advances every path in a stash by one
//!    step, replacing it with its successors. Paths that have no successors
//!    move to [`constant::DEADENDED`], and paths that fail move to
//!    [`constant::PRUNED`] or [`constant::ERRORED`].
//! 3. Between steps, the driver reorganises the stashes using operations such
//!    as [`PathGroup::stash`], [`PathGroup::merge`] and [`PathGroup::split`],
//!    or leaves this to [`PathGroup::explore`].
//!
//! Every operation returns the resulting group. By default groups are
//! immutable, so the group an operation was called on is left untouched (see
//! [`Config::immutable`]).
//!
//! # Basic Usage
//!
//! ```
//! use path_group::{
//!     error::{execution, merge, path::Error as PathError},
//!     group::explore::ExploreOptions,
//!     path::{Address, Path, StepOutcome, Successors},
//!     PathGroup,
//! };
//!
//! /// A program that counts upwards and stops at 4.
//! #[derive(Clone, Debug)]
//! struct Counter {
//!     addr:    Address,
//!     visited: Vec<Address>,
//! }
//!
//! impl Path for Counter {
//!     fn addr(&self) -> Address {
//!         self.addr
//!     }
//!
//!     fn error(&self) -> Option<&PathError> {
//!         None
//!     }
//!
//!     fn step(&self) -> execution::Result<StepOutcome<Self>> {
//!         if self.addr >= 4 {
//!             return Ok(StepOutcome::Successors(Successors::none()));
//!         }
//!         let mut visited = self.visited.clone();
//!         visited.push(self.addr);
//!         let next = Counter {
//!             addr: self.addr + 1,
//!             visited,
//!         };
//!         Ok(StepOutcome::Successors(Successors::new(vec![next])))
//!     }
//!
//!     fn merge(&self, _: &[Self]) -> merge::Result<Self> {
//!         Ok(self.clone())
//!     }
//!
//!     fn addr_backtrace(&self) -> &[Address] {
//!         &self.visited
//!     }
//!
//!     fn satisfiable(&self) -> bool {
//!         true
//!     }
//! }
//!
//! let start = Counter {
//!     addr:    0,
//!     visited: vec![],
//! };
//! let group = PathGroup::new(vec![start]);
//! let explored = group
//!     .explore(ExploreOptions::<Counter>::new().with_find(3_u64))
//!     .unwrap();
//!
//! assert_eq!(explored.count("found"), 1);
//! assert_eq!(explored.stash_paths("found")[0].addr_backtrace(), &[0, 1, 2]);
//! assert_eq!(group.active().len(), 1);
//! ```

#![warn(clippy::all, clippy::cargo, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Allows for better API naming

pub mod accelerator;
pub mod condition;
pub mod constant;
pub mod error;
pub mod group;
pub mod hierarchy;
pub mod path;
pub mod stash;

// Re-exports to provide the library interface.
pub use condition::Condition;
pub use group::{Config, PathGroup};
pub use stash::Stashes;
