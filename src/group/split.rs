//! This module contains the split engine, which bounds the size of a stash by
//! moving the excess paths elsewhere.

use derivative::Derivative;
use tracing::debug;

use crate::{
    constant::{ACTIVE, DEFAULT_SPLIT_LIMIT, STASHED},
    group::PathGroup,
    path::Path,
};

/// A function that splits a stash into the paths to keep and the paths to
/// split off, in that order.
pub type StashSplitter<P> = Box<dyn FnOnce(Vec<P>) -> (Vec<P>, Vec<P>)>;

/// A function that orders a stash from the most to the least important path.
pub type StashRanker<P> = Box<dyn FnOnce(Vec<P>) -> Vec<P>>;

/// A function that computes a ranking key for a path, where paths with lower
/// keys are kept first.
pub type PathRanker<P> = Box<dyn Fn(&P) -> i64>;

/// The options for splitting a stash.
///
/// At most one of the strategies is used, with the splitter taking priority
/// over the stash ranker, and the stash ranker over the path ranker. If none
/// are given, the paths are kept in their existing order.
#[derive(Derivative)]
#[derivative(Debug, Default(bound = ""))]
pub struct SplitOptions<P: Path> {
    /// Splits the stash directly, ignoring `limit`.
    #[derivative(Debug = "ignore")]
    pub stash_splitter: Option<StashSplitter<P>>,

    /// Orders the whole stash before it is cut at `limit`.
    #[derivative(Debug = "ignore")]
    pub stash_ranker: Option<StashRanker<P>>,

    /// Orders the paths by ascending key before the stash is cut at `limit`.
    #[derivative(Debug = "ignore")]
    pub path_ranker: Option<PathRanker<P>>,

    /// The number of paths to keep in the source stash.
    #[derivative(Default(value = "DEFAULT_SPLIT_LIMIT"))]
    pub limit: usize,

    /// The stash to split.
    #[derivative(Default(value = "ACTIVE.to_string()"))]
    pub from: String,

    /// The stash that receives the paths that are split off.
    #[derivative(Default(value = "STASHED.to_string()"))]
    pub to: String,
}

impl<P: Path> SplitOptions<P> {
    /// Creates the default split options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the function used to split the stash directly.
    #[must_use]
    pub fn with_stash_splitter(
        mut self,
        f: impl FnOnce(Vec<P>) -> (Vec<P>, Vec<P>) + 'static,
    ) -> Self {
        self.stash_splitter = Some(Box::new(f));
        self
    }

    /// Sets the function used to order the whole stash.
    #[must_use]
    pub fn with_stash_ranker(mut self, f: impl FnOnce(Vec<P>) -> Vec<P> + 'static) -> Self {
        self.stash_ranker = Some(Box::new(f));
        self
    }

    /// Sets the function used to compute a ranking key for each path.
    #[must_use]
    pub fn with_path_ranker(mut self, f: impl Fn(&P) -> i64 + 'static) -> Self {
        self.path_ranker = Some(Box::new(f));
        self
    }

    /// Sets the number of paths to keep to `limit`.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the stash to split to `stash`.
    #[must_use]
    pub fn with_from(mut self, stash: impl Into<String>) -> Self {
        self.from = stash.into();
        self
    }

    /// Sets the stash that receives the split off paths to `stash`.
    #[must_use]
    pub fn with_to(mut self, stash: impl Into<String>) -> Self {
        self.to = stash.into();
        self
    }
}

impl<P: Path> PathGroup<P> {
    /// Splits a stash into the paths to keep in it and the paths to move to
    /// the end of another stash, as described by `options`.
    #[must_use]
    pub fn split(&self, options: SplitOptions<P>) -> Self {
        let SplitOptions {
            stash_splitter,
            stash_ranker,
            path_ranker,
            limit,
            from,
            to,
        } = options;

        let mut new_stashes = self.working_stashes();
        let paths = new_stashes.take(&from);

        let (keep, split) = if let Some(splitter) = stash_splitter {
            splitter(paths)
        } else {
            let mut ranked = if let Some(ranker) = stash_ranker {
                ranker(paths)
            } else if let Some(ranker) = path_ranker {
                let mut paths = paths;
                paths.sort_by_cached_key(|path| ranker(path));
                paths
            } else {
                paths
            };
            let split = ranked.split_off(limit.min(ranked.len()));
            (ranked, split)
        };
        debug!(
            kept = keep.len(),
            split = split.len(),
            from = from.as_str(),
            to = to.as_str(),
            "Split stash"
        );

        new_stashes.set(&from, keep);
        new_stashes.extend(&to, split);
        self.successor(new_stashes)
    }
}
