//! This module contains the path group, the handle through which a driver
//! schedules the exploration of paths.

pub mod explore;
pub mod merge;
pub mod split;
pub mod stashing;
pub mod step;

use std::{
    cell::{Ref, RefCell},
    fmt::{Display, Formatter},
    rc::Rc,
};

use derivative::Derivative;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    accelerator::DynAccelerator,
    constant::{
        ACTIVE,
        DEADENDED,
        DEFAULT_IMMUTABLE,
        DEFAULT_RESILIENCE,
        DEFAULT_SAVE_UNCONSTRAINED,
        DEFAULT_SAVE_UNSAT,
        ERRORED,
        PRUNED,
        STASHED,
        UNCONSTRAINED,
        UNSAT,
    },
    error::execution::Errors,
    hierarchy::{DynHierarchy, PathHierarchy},
    path::Path,
    stash::Stashes,
};

/// The mutable contents of a path group.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
struct GroupState<P: Path> {
    /// The stashes of paths.
    stashes: Stashes<P>,

    /// The failures that were tolerated while stepping, in resilient mode.
    errors: Errors,
}

/// A group of paths, organised into named stashes, that can be stepped,
/// filtered, merged and moved around.
///
/// # Immutability
///
/// By default a path group is immutable: every operation leaves the group it
/// was called on untouched and returns a new group with the result. If
/// [`Config::immutable`] is `false`, operations instead modify the group they
/// were called on and return a handle to that same group.
///
/// Cloning a `PathGroup` produces another handle to the _same_ group. Use
/// [`PathGroup::copy`] to obtain an independent group.
///
/// # Shared Collaborators
///
/// Every group derived from another shares its hierarchy and accelerator.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub struct PathGroup<P: Path> {
    /// The stashes and tolerated failures of the group.
    state: Rc<RefCell<GroupState<P>>>,

    /// The configuration of the group.
    config: Config,

    /// The tracker that is told about paths that became unreachable.
    hierarchy: DynHierarchy<P>,

    /// The technique used to explore paths many steps at a time, if any.
    accelerator: Option<DynAccelerator<P>>,
}

impl<P: Path> PathGroup<P> {
    /// Constructs a new path group with `active` as the paths in the active
    /// stash.
    ///
    /// It uses the default configuration and a fresh [`PathHierarchy`].
    #[must_use]
    pub fn new(active: Vec<P>) -> Self {
        Self::from_stashes(Stashes::with_active(active))
    }

    /// Constructs a new path group with `stashes` as its stashes.
    ///
    /// It uses the default configuration and a fresh [`PathHierarchy`].
    #[must_use]
    pub fn from_stashes(stashes: Stashes<P>) -> Self {
        let errors = Errors::default();
        let state = Rc::new(RefCell::new(GroupState { stashes, errors }));
        let config = Config::default();
        let hierarchy = PathHierarchy::new().in_rc();
        let accelerator = None;
        Self {
            state,
            config,
            hierarchy,
            accelerator,
        }
    }

    /// Sets the configuration of the group to `config`.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets the hierarchy that is told about unreachable paths to
    /// `hierarchy`.
    #[must_use]
    pub fn with_hierarchy(mut self, hierarchy: DynHierarchy<P>) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    /// Sets the technique used to explore paths many steps at a time to
    /// `accelerator`.
    #[must_use]
    pub fn with_accelerator(mut self, accelerator: DynAccelerator<P>) -> Self {
        self.accelerator = Some(accelerator);
        self
    }

    /// Gets the configuration of the group.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gets the hierarchy shared by the group.
    #[must_use]
    pub fn hierarchy(&self) -> &DynHierarchy<P> {
        &self.hierarchy
    }

    /// Gets the accelerator used by the group, if any.
    #[must_use]
    pub fn accelerator(&self) -> Option<&DynAccelerator<P>> {
        self.accelerator.as_ref()
    }

    /// Checks whether `self` and `other` are handles to the same group.
    #[must_use]
    pub fn same_group(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Produces an independent group with copies of all of the paths in this
    /// group, sharing its configuration and collaborators.
    #[must_use]
    pub fn copy(&self) -> Self {
        let state = self.state.borrow().clone();
        self.derive(state)
    }
}

/// Access to the stashes of the group.
impl<P: Path> PathGroup<P> {
    /// Gets the stashes of the group.
    ///
    /// # Panics
    ///
    /// Panics if called from within a function that the group is currently
    /// calling as part of an in-place operation.
    #[must_use]
    pub fn stashes(&self) -> Ref<'_, Stashes<P>> {
        Ref::map(self.state.borrow(), |state| &state.stashes)
    }

    /// Gets the paths in the stash called `name`, which are empty if no such
    /// stash exists.
    #[must_use]
    pub fn stash_paths(&self, name: &str) -> Ref<'_, [P]> {
        Ref::map(self.state.borrow(), |state| state.stashes.get(name))
    }

    /// Gets the number of paths in the stash called `name`.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.state.borrow().stashes.count(name)
    }

    /// Applies `f` to every path in the stash called `name`, returning the
    /// results in stash order.
    pub fn map_stash<T>(&self, name: &str, f: impl FnMut(&P) -> T) -> Vec<T> {
        self.state.borrow().stashes.get(name).iter().map(f).collect()
    }

    /// Gets the paths in the active stash.
    #[must_use]
    pub fn active(&self) -> Ref<'_, [P]> {
        self.stash_paths(ACTIVE)
    }

    /// Gets the paths in the stashed stash.
    #[must_use]
    pub fn stashed(&self) -> Ref<'_, [P]> {
        self.stash_paths(STASHED)
    }

    /// Gets the paths in the pruned stash.
    #[must_use]
    pub fn pruned(&self) -> Ref<'_, [P]> {
        self.stash_paths(PRUNED)
    }

    /// Gets the paths in the unsat stash.
    #[must_use]
    pub fn unsat(&self) -> Ref<'_, [P]> {
        self.stash_paths(UNSAT)
    }

    /// Gets the paths in the errored stash.
    #[must_use]
    pub fn errored(&self) -> Ref<'_, [P]> {
        self.stash_paths(ERRORED)
    }

    /// Gets the paths in the deadended stash.
    #[must_use]
    pub fn deadended(&self) -> Ref<'_, [P]> {
        self.stash_paths(DEADENDED)
    }

    /// Gets the paths in the unconstrained stash.
    #[must_use]
    pub fn unconstrained(&self) -> Ref<'_, [P]> {
        self.stash_paths(UNCONSTRAINED)
    }

    /// Gets the failures that were tolerated while stepping this group and the
    /// groups it was derived from.
    #[must_use]
    pub fn errors(&self) -> Errors {
        self.state.borrow().errors.clone()
    }
}

/// The immutability wrapper used by every operation.
impl<P: Path> PathGroup<P> {
    /// Gets the stashes that an operation should work on.
    ///
    /// These are a copy of the group's stashes if the group is immutable, and
    /// the group's actual stashes otherwise. In the latter case, they must be
    /// given back via [`Self::successor`].
    fn working_stashes(&self) -> Stashes<P> {
        if self.config.immutable {
            self.state.borrow().stashes.clone()
        } else {
            std::mem::take(&mut self.state.borrow_mut().stashes)
        }
    }

    /// Commits `stashes` as the result of an operation.
    fn successor(&self, stashes: Stashes<P>) -> Self {
        self.successor_with_errors(stashes, Errors::default())
    }

    /// Commits `stashes` as the result of an operation that tolerated the
    /// failures in `errors`.
    ///
    /// If the group is immutable this creates a new group, and otherwise it
    /// overwrites the stashes of this group and returns it.
    fn successor_with_errors(&self, mut stashes: Stashes<P>, errors: Errors) -> Self {
        stashes.strip_dropped();

        if self.config.immutable {
            let mut all_errors = self.errors();
            all_errors.add_many(errors);
            self.derive(GroupState {
                stashes,
                errors: all_errors,
            })
        } else {
            let mut state = self.state.borrow_mut();
            state.stashes = stashes;
            state.errors.add_many(errors);
            drop(state);
            self.clone()
        }
    }

    /// Creates a new group with the provided `state` that shares everything
    /// else with `self`.
    fn derive(&self, state: GroupState<P>) -> Self {
        Self {
            state:       Rc::new(RefCell::new(state)),
            config:      self.config.clone(),
            hierarchy:   self.hierarchy.clone(),
            accelerator: self.accelerator.clone(),
        }
    }
}

/// Summarises the non-empty stashes of the group, such as `<PathGroup with 2
/// active, 1 deadended>`.
impl<P: Path> Display for PathGroup<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let stashes = self.stashes();
        let summary = stashes
            .iter()
            .filter(|(_, paths)| !paths.is_empty())
            .map(|(name, paths)| format!("{} {name}", paths.len()))
            .join(", ");

        if summary.is_empty() {
            write!(f, "<PathGroup with no paths>")
        } else {
            write!(f, "<PathGroup with {summary}>")
        }
    }
}

/// The configuration for the path group.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    /// Whether operations produce new groups rather than modifying the group
    /// they are called on.
    ///
    /// Defaults to [`DEFAULT_IMMUTABLE`].
    pub immutable: bool,

    /// Whether a failure while stepping a single path is logged and the path
    /// dropped, rather than aborting the step.
    ///
    /// Defaults to [`DEFAULT_RESILIENCE`].
    pub resilience: bool,

    /// Whether the unconstrained successors of paths are saved into the
    /// unconstrained stash while stepping.
    ///
    /// Defaults to [`DEFAULT_SAVE_UNCONSTRAINED`].
    pub save_unconstrained: bool,

    /// Whether the unsatisfiable successors of paths are saved into the unsat
    /// stash while stepping.
    ///
    /// Defaults to [`DEFAULT_SAVE_UNSAT`].
    pub save_unsat: bool,
}

impl Config {
    /// Sets the `immutable` config parameter to `value`.
    #[must_use]
    pub fn with_immutable(mut self, value: bool) -> Self {
        self.immutable = value;
        self
    }

    /// Sets the `resilience` config parameter to `value`.
    #[must_use]
    pub fn with_resilience(mut self, value: bool) -> Self {
        self.resilience = value;
        self
    }

    /// Sets the `save_unconstrained` config parameter to `value`.
    #[must_use]
    pub fn with_save_unconstrained(mut self, value: bool) -> Self {
        self.save_unconstrained = value;
        self
    }

    /// Sets the `save_unsat` config parameter to `value`.
    #[must_use]
    pub fn with_save_unsat(mut self, value: bool) -> Self {
        self.save_unsat = value;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        let immutable = DEFAULT_IMMUTABLE;
        let resilience = DEFAULT_RESILIENCE;
        let save_unconstrained = DEFAULT_SAVE_UNCONSTRAINED;
        let save_unsat = DEFAULT_SAVE_UNSAT;
        Self {
            immutable,
            resilience,
            save_unconstrained,
            save_unsat,
        }
    }
}
