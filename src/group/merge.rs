//! This module contains the merge engine, which folds paths at the same
//! address into single paths.

use derivative::Derivative;
use tracing::{debug, warn};

use crate::{
    constant::ACTIVE,
    error::merge,
    group::PathGroup,
    path::Path,
    stash::filter,
};

/// A function that merges a group of paths at the same address into one path.
pub type MergeFunc<P> = Box<dyn Fn(&[P]) -> merge::Result<P>>;

/// The options for merging the paths in a stash.
#[derive(Derivative)]
#[derivative(Debug, Default(bound = ""))]
pub struct MergeOptions<P: Path> {
    /// The stash whose paths should be merged.
    #[derivative(Default(value = "ACTIVE.to_string()"))]
    pub stash: String,

    /// Used to merge each group of paths instead of [`Path::merge`].
    #[derivative(Debug = "ignore")]
    pub merge_func: Option<MergeFunc<P>>,
}

impl<P: Path> MergeOptions<P> {
    /// Creates the default merge options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stash whose paths should be merged to `stash`.
    #[must_use]
    pub fn with_stash(mut self, stash: impl Into<String>) -> Self {
        self.stash = stash.into();
        self
    }

    /// Sets the function used to merge each group of paths.
    #[must_use]
    pub fn with_merge_func(mut self, f: impl Fn(&[P]) -> merge::Result<P> + 'static) -> Self {
        self.merge_func = Some(Box::new(f));
        self
    }
}

impl<P: Path> PathGroup<P> {
    /// Merges the paths in a stash that are at the same address, as described
    /// by `options`.
    ///
    /// Paths that are alone at their address are kept as they are. If a group
    /// of paths cannot be merged, the paths in it are kept unmerged.
    #[must_use]
    pub fn merge(&self, options: MergeOptions<P>) -> Self {
        let MergeOptions { stash, merge_func } = options;

        let mut new_stashes = self.working_stashes();
        let mut to_merge = new_stashes.take(&stash);
        let mut merged = Vec::with_capacity(to_merge.len());

        while let Some(address) = to_merge.first().map(Path::addr) {
            let same_address = move |path: &P| path.addr() == address;
            let (group, rest) = filter(Some(&same_address), to_merge);
            to_merge = rest;

            if group.len() == 1 {
                merged.extend(group);
                continue;
            }

            let result = match &merge_func {
                Some(merge_func) => merge_func(&group),
                None => group[0].merge(&group[1..]),
            };
            match result {
                Ok(path) => {
                    debug!(addr = address, count = group.len(), "Merged paths");
                    merged.push(path);
                }
                Err(error) => {
                    warn!(
                        addr = address,
                        count = group.len(),
                        %error,
                        "Unable to merge paths"
                    );
                    merged.extend(group);
                }
            }
        }

        new_stashes.set(&stash, merged);
        self.successor(new_stashes)
    }
}
