//! This module contains the definition of the stash store, the named and
//! ordered collections of paths that a path group operates on.

use derivative::Derivative;
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::{
    constant::{ACTIVE, DEFAULT_STASHES, DROP},
    path::Path,
};

/// Partitions `paths` by `predicate`, returning the paths that matched and the
/// paths that did not, in that order.
///
/// The partition is stable, so the relative order of the paths is retained in
/// each of the outputs. A `predicate` of [`None`] matches every path.
pub fn filter<P: Path>(
    predicate: Option<&dyn Fn(&P) -> bool>,
    paths: Vec<P>,
) -> (Vec<P>, Vec<P>) {
    debug!(count = paths.len(), "Filtering paths");
    let (matched, unmatched): (Vec<P>, Vec<P>) = paths.into_iter().partition(|path| {
        let is_match = predicate.map_or(true, |predicate| predicate(path));
        trace!(addr = path.addr(), is_match, "Filtered path");
        is_match
    });
    debug!(
        matched = matched.len(),
        unmatched = unmatched.len(),
        "Filtered paths"
    );

    (matched, unmatched)
}

/// A mapping from stash names to the paths in those stashes.
///
/// # Missing Stashes
///
/// Reading a stash that does not exist produces an empty stash, while writing
/// to a stash that does not exist creates it. The store never treats a missing
/// stash as an error.
///
/// # Ordering
///
/// Stashes are iterated in the order in which they were created, and the paths
/// within each stash are kept in the order in which they were added.
#[derive(Derivative)]
#[derivative(
    Clone(bound = "P: Clone"),
    Debug(bound = "P: std::fmt::Debug"),
    Default(bound = ""),
    PartialEq(bound = "P: PartialEq")
)]
pub struct Stashes<P> {
    stashes: IndexMap<String, Vec<P>>,
}

impl<P> Stashes<P> {
    /// Creates a new store containing the default stashes, all empty.
    #[must_use]
    pub fn new() -> Self {
        let stashes = DEFAULT_STASHES
            .iter()
            .map(|name| ((*name).to_string(), Vec::new()))
            .collect();
        Self { stashes }
    }

    /// Creates a new store containing no stashes at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a new store containing the default stashes, with `paths` in the
    /// active stash.
    #[must_use]
    pub fn with_active(paths: Vec<P>) -> Self {
        let mut stashes = Self::new();
        stashes.set(ACTIVE, paths);
        stashes
    }

    /// Gets the paths in the stash called `name`, or an empty slice if no such
    /// stash exists.
    #[must_use]
    pub fn get(&self, name: &str) -> &[P] {
        self.stashes.get(name).map_or(&[], Vec::as_slice)
    }

    /// Gets the stash called `name`, creating it if it does not exist.
    pub fn get_or_create(&mut self, name: &str) -> &mut Vec<P> {
        self.stashes.entry(name.to_string()).or_default()
    }

    /// Checks if a stash called `name` exists, regardless of whether it is
    /// empty.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.stashes.contains_key(name)
    }

    /// Gets the number of paths in the stash called `name`.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.get(name).len()
    }

    /// Gets the total number of paths across all stashes.
    #[must_use]
    pub fn total(&self) -> usize {
        self.stashes.values().map(Vec::len).sum()
    }

    /// Takes all of the paths out of the stash called `name`, leaving it empty.
    ///
    /// The stash is created if it does not exist.
    pub fn take(&mut self, name: &str) -> Vec<P> {
        std::mem::take(self.get_or_create(name))
    }

    /// Replaces the contents of the stash called `name` with `paths`.
    pub fn set(&mut self, name: &str, paths: Vec<P>) {
        *self.get_or_create(name) = paths;
    }

    /// Appends `paths` to the end of the stash called `name`.
    pub fn extend(&mut self, name: &str, paths: impl IntoIterator<Item = P>) {
        self.get_or_create(name).extend(paths);
    }

    /// Removes the stash called `name` entirely, returning its paths if it
    /// existed.
    pub fn remove(&mut self, name: &str) -> Option<Vec<P>> {
        self.stashes.shift_remove(name)
    }

    /// Gets the names of the stashes in the store in iteration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.stashes.keys().cloned().collect()
    }

    /// Iterates over the stashes in the store.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[P])> {
        self.stashes
            .iter()
            .map(|(name, paths)| (name.as_str(), paths.as_slice()))
    }

    /// Appends the paths in each of the stashes in `other` to the stash of the
    /// same name in `self`.
    pub fn absorb(&mut self, other: Self) {
        for (name, paths) in other.stashes {
            self.extend(&name, paths);
        }
    }

    /// Removes the stash reserved for dropping paths, discarding its contents.
    pub fn strip_dropped(&mut self) {
        if let Some(dropped) = self.remove(DROP) {
            debug!(count = dropped.len(), "Dropping paths");
        }
    }
}

impl<P: Path> Stashes<P> {
    /// Moves the paths in `from` that match `predicate` to the end of `to`.
    ///
    /// The paths that do not match remain in `from` in their original order. A
    /// `predicate` of [`None`] moves every path. Moving paths from a stash into
    /// itself leaves it unchanged.
    pub fn move_paths(
        &mut self,
        predicate: Option<&dyn Fn(&P) -> bool>,
        from: &str,
        to: &str,
    ) -> &mut Self {
        if from == to {
            return self;
        }
        let paths = self.take(from);
        let (to_move, to_keep) = filter(predicate, paths);
        self.extend(to, to_move);
        self.set(from, to_keep);
        self
    }
}

impl<P> IntoIterator for Stashes<P> {
    type IntoIter = indexmap::map::IntoIter<String, Vec<P>>;
    type Item = (String, Vec<P>);

    fn into_iter(self) -> Self::IntoIter {
        self.stashes.into_iter()
    }
}

impl<P> FromIterator<(String, Vec<P>)> for Stashes<P> {
    fn from_iter<T: IntoIterator<Item = (String, Vec<P>)>>(iter: T) -> Self {
        let mut stashes = Self::empty();
        for (name, paths) in iter {
            stashes.extend(&name, paths);
        }
        stashes
    }
}
