//! This module contains the operations that move paths between stashes, drop
//! them, prune them, or transform them in place.

use derivative::Derivative;
use tracing::{debug, trace};

use crate::{
    condition::Condition,
    constant::{ACTIVE, DROP, PRUNED, STASHED},
    group::PathGroup,
    path::{Address, Path},
    stash,
};

/// The options for moving paths from one stash into another.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StashOptions {
    /// The stash to move paths out of.
    pub from: String,

    /// The stash to move paths into.
    pub to: String,
}

impl StashOptions {
    /// Creates options that move paths from the active stash into the stashed
    /// stash.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stash to move paths out of to `stash`.
    #[must_use]
    pub fn with_from(mut self, stash: impl Into<String>) -> Self {
        self.from = stash.into();
        self
    }

    /// Sets the stash to move paths into to `stash`.
    #[must_use]
    pub fn with_to(mut self, stash: impl Into<String>) -> Self {
        self.to = stash.into();
        self
    }
}

impl Default for StashOptions {
    fn default() -> Self {
        let from = ACTIVE.to_string();
        let to = STASHED.to_string();
        Self { from, to }
    }
}

/// The options for moving paths back out of stashes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnstashOptions {
    /// The stash to move paths into.
    pub to: String,

    /// The stash to move paths out of, or [`None`] to move them out of every
    /// stash other than `to` and those in `except`.
    pub from: Option<String>,

    /// The stashes to leave alone when `from` is [`None`].
    pub except: Vec<String>,
}

impl UnstashOptions {
    /// Creates options that move paths from the stashed stash into the active
    /// stash.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stash to move paths into to `stash`.
    #[must_use]
    pub fn with_to(mut self, stash: impl Into<String>) -> Self {
        self.to = stash.into();
        self
    }

    /// Sets the stash to move paths out of to `stash`.
    #[must_use]
    pub fn with_from(mut self, stash: impl Into<String>) -> Self {
        self.from = Some(stash.into());
        self
    }

    /// Moves paths out of every stash rather than a single one.
    #[must_use]
    pub fn from_all(mut self) -> Self {
        self.from = None;
        self
    }

    /// Adds `stash` to the stashes that are left alone when moving paths out
    /// of every stash.
    #[must_use]
    pub fn with_except(mut self, stash: impl Into<String>) -> Self {
        self.except.push(stash.into());
        self
    }
}

impl Default for UnstashOptions {
    fn default() -> Self {
        let to = ACTIVE.to_string();
        let from = Some(STASHED.to_string());
        let except = Vec::new();
        Self { to, from, except }
    }
}

/// The options for pruning paths.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Default(bound = ""))]
pub struct PruneOptions<P: Path> {
    /// Only paths matching this condition are considered for pruning. All
    /// paths are considered if it is [`None`].
    pub filter: Option<Condition<P>>,

    /// The stash to prune paths from.
    #[derivative(Default(value = "ACTIVE.to_string()"))]
    pub from: String,

    /// The stash to move pruned paths into.
    #[derivative(Default(value = "PRUNED.to_string()"))]
    pub to: String,
}

impl<P: Path> PruneOptions<P> {
    /// Creates the default prune options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only considers paths that match `filter` for pruning.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<Condition<P>>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Sets the stash to prune paths from to `stash`.
    #[must_use]
    pub fn with_from(mut self, stash: impl Into<String>) -> Self {
        self.from = stash.into();
        self
    }

    /// Sets the stash to move pruned paths into to `stash`.
    #[must_use]
    pub fn with_to(mut self, stash: impl Into<String>) -> Self {
        self.to = stash.into();
        self
    }
}

/// What a path function decided to do with a single path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Applied<P> {
    /// Keep the original path.
    Keep,

    /// Replace the original path with this one.
    Replace(P),

    /// Replace the original path with all of these.
    Expand(Vec<P>),
}

/// A function that decides what happens to each path in a stash.
pub type PathFunc<P> = Box<dyn Fn(&P) -> Applied<P>>;

/// A function that transforms a whole stash.
pub type StashFunc<P> = Box<dyn FnOnce(Vec<P>) -> Vec<P>>;

/// The options for transforming the paths in a stash.
#[derive(Derivative)]
#[derivative(Debug, Default(bound = ""))]
pub struct ApplyOptions<P: Path> {
    /// The stash to transform.
    #[derivative(Default(value = "ACTIVE.to_string()"))]
    pub stash: String,

    /// Called on every path in the stash.
    #[derivative(Debug = "ignore")]
    pub path_func: Option<PathFunc<P>>,

    /// Called on the whole stash, after `path_func`.
    #[derivative(Debug = "ignore")]
    pub stash_func: Option<StashFunc<P>>,
}

impl<P: Path> ApplyOptions<P> {
    /// Creates options that leave the active stash unchanged.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stash to transform to `stash`.
    #[must_use]
    pub fn with_stash(mut self, stash: impl Into<String>) -> Self {
        self.stash = stash.into();
        self
    }

    /// Sets the function called on every path in the stash.
    #[must_use]
    pub fn with_path_func(mut self, f: impl Fn(&P) -> Applied<P> + 'static) -> Self {
        self.path_func = Some(Box::new(f));
        self
    }

    /// Sets the function called on the whole stash.
    #[must_use]
    pub fn with_stash_func(mut self, f: impl FnOnce(Vec<P>) -> Vec<P> + 'static) -> Self {
        self.stash_func = Some(Box::new(f));
        self
    }
}

impl<P: Path> PathGroup<P> {
    /// Moves the paths that match `filter` from one stash to the end of
    /// another, as described by `options`.
    ///
    /// Every path matches a `filter` of [`None`].
    #[must_use]
    pub fn stash(&self, filter: Option<Condition<P>>, options: StashOptions) -> Self {
        let predicate = Condition::compile(filter, true);
        let mut new_stashes = self.working_stashes();
        new_stashes.move_paths(Some(&*predicate), &options.from, &options.to);
        self.successor(new_stashes)
    }

    /// Moves the paths at `addr` between stashes, as described by `options`.
    #[must_use]
    pub fn stash_addr(&self, addr: Address, options: StashOptions) -> Self {
        self.stash(Some(Condition::Address(addr)), options)
    }

    /// Moves the paths that are not at `addr` between stashes, as described by
    /// `options`.
    #[must_use]
    pub fn stash_not_addr(&self, addr: Address, options: StashOptions) -> Self {
        self.stash(Some(not_at(addr)), options)
    }

    /// Moves the paths that have previously visited `addr` between stashes, as
    /// described by `options`.
    #[must_use]
    pub fn stash_addr_past(&self, addr: Address, options: StashOptions) -> Self {
        self.stash(Some(visited(addr)), options)
    }

    /// Moves the paths that have never visited `addr` between stashes, as
    /// described by `options`.
    #[must_use]
    pub fn stash_not_addr_past(&self, addr: Address, options: StashOptions) -> Self {
        self.stash(Some(not_visited(addr)), options)
    }

    /// Moves every path between stashes, as described by `options`.
    #[must_use]
    pub fn stash_all(&self, options: StashOptions) -> Self {
        self.stash(None, options)
    }

    /// Moves the paths that match `filter` back out of one or more stashes, as
    /// described by `options`.
    ///
    /// When moving out of every stash, the stashes are visited in iteration
    /// order so the moved paths keep their relative order within each source.
    #[must_use]
    pub fn unstash(&self, filter: Option<Condition<P>>, options: UnstashOptions) -> Self {
        let predicate = Condition::compile(filter, true);
        let UnstashOptions { to, from, except } = options;

        let mut new_stashes = self.working_stashes();
        let sources = match from {
            Some(from) => vec![from],
            None => new_stashes
                .names()
                .into_iter()
                .filter(|name| *name != to && !except.contains(name))
                .collect(),
        };
        for source in sources {
            trace!(from = source.as_str(), to = to.as_str(), "Unstashing paths");
            new_stashes.move_paths(Some(&*predicate), &source, &to);
        }

        self.successor(new_stashes)
    }

    /// Moves the paths at `addr` back out of stashes, as described by
    /// `options`.
    #[must_use]
    pub fn unstash_addr(&self, addr: Address, options: UnstashOptions) -> Self {
        self.unstash(Some(Condition::Address(addr)), options)
    }

    /// Moves the paths not at `addr` back out of stashes, as described by
    /// `options`.
    #[must_use]
    pub fn unstash_not_addr(&self, addr: Address, options: UnstashOptions) -> Self {
        self.unstash(Some(not_at(addr)), options)
    }

    /// Moves the paths that have previously visited `addr` back out of
    /// stashes, as described by `options`.
    #[must_use]
    pub fn unstash_addr_past(&self, addr: Address, options: UnstashOptions) -> Self {
        self.unstash(Some(visited(addr)), options)
    }

    /// Moves the paths that have never visited `addr` back out of stashes, as
    /// described by `options`.
    #[must_use]
    pub fn unstash_not_addr_past(&self, addr: Address, options: UnstashOptions) -> Self {
        self.unstash(Some(not_visited(addr)), options)
    }

    /// Moves every path out of every stash other than the destination and the
    /// excepted stashes in `options`, and into the destination.
    #[must_use]
    pub fn unstash_all(&self, options: UnstashOptions) -> Self {
        self.unstash(None, options.from_all())
    }

    /// Discards the paths in `stash` that match `filter`.
    ///
    /// Every path matches a `filter` of [`None`].
    #[must_use]
    pub fn drop(&self, filter: Option<Condition<P>>, stash: &str) -> Self {
        let predicate = Condition::compile(filter, true);
        let mut new_stashes = self.working_stashes();
        new_stashes.move_paths(Some(&*predicate), stash, DROP);
        self.successor(new_stashes)
    }

    /// Moves the paths that carry an error or are unsatisfiable from one stash
    /// to another, as described by `options`, reporting each of them to the
    /// hierarchy as unreachable.
    ///
    /// All other paths stay where they are, in their original order.
    #[must_use]
    pub fn prune(&self, options: PruneOptions<P>) -> Self {
        let PruneOptions { filter, from, to } = options;
        let predicate = Condition::compile(filter, true);
        let prunable =
            move |path: &P| predicate(path) && (path.is_errored() || !path.satisfiable());

        let mut new_stashes = self.working_stashes();
        let (pruned, kept) = stash::filter(Some(&prunable), new_stashes.take(&from));
        debug!(count = pruned.len(), from = from.as_str(), "Pruning paths");
        new_stashes.set(&from, kept);

        for path in &pruned {
            trace!(addr = path.addr(), "Reporting pruned path as unreachable");
            self.hierarchy.unreachable(path);
        }
        new_stashes.extend(&to, pruned);

        self.successor(new_stashes)
    }

    /// Transforms the paths in a stash, as described by `options`.
    ///
    /// The path function is applied to every path first, followed by the
    /// stash function on the result.
    #[must_use]
    pub fn apply(&self, options: ApplyOptions<P>) -> Self {
        let ApplyOptions {
            stash,
            path_func,
            stash_func,
        } = options;

        let mut new_stashes = self.working_stashes();
        let mut paths = new_stashes.take(&stash);

        if let Some(path_func) = path_func {
            paths = paths
                .into_iter()
                .flat_map(|path| match path_func(&path) {
                    Applied::Keep => vec![path],
                    Applied::Replace(new_path) => vec![new_path],
                    Applied::Expand(new_paths) => new_paths,
                })
                .collect();
        }
        if let Some(stash_func) = stash_func {
            paths = stash_func(paths);
        }

        new_stashes.set(&stash, paths);
        self.successor(new_stashes)
    }
}

/// Selects paths that are not at `addr`.
fn not_at<P: Path>(addr: Address) -> Condition<P> {
    Condition::predicate(move |path: &P| path.addr() != addr)
}

/// Selects paths that have previously visited `addr`.
fn visited<P: Path>(addr: Address) -> Condition<P> {
    Condition::predicate(move |path: &P| path.addr_backtrace().contains(&addr))
}

/// Selects paths that have never visited `addr`.
fn not_visited<P: Path>(addr: Address) -> Condition<P> {
    Condition::predicate(move |path: &P| !path.addr_backtrace().contains(&addr))
}
