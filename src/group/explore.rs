//! This module contains the explorer, which steps a stash until enough paths
//! reach the addresses being searched for.

use derivative::Derivative;
use tracing::debug;

use crate::{
    condition::Condition,
    constant::{ACTIVE, AVOID, DEFAULT_NUM_FIND, FOUND},
    error,
    group::{stashing::StashOptions, step::StepOptions, PathGroup},
    path::Path,
};

/// The options for exploring from a stash.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Default(bound = ""))]
pub struct ExploreOptions<P: Path> {
    /// The stash to explore from.
    #[derivative(Default(value = "ACTIVE.to_string()"))]
    pub stash: String,

    /// The maximum number of rounds to step for, if any.
    pub n: Option<usize>,

    /// The paths that are being searched for.
    pub find: Option<Condition<P>>,

    /// The paths that should not be explored any further.
    pub avoid: Option<Condition<P>>,

    /// The number of paths to find before stopping.
    #[derivative(Default(value = "DEFAULT_NUM_FIND"))]
    pub num_find: usize,

    /// The stash that found paths are moved into.
    #[derivative(Default(value = "FOUND.to_string()"))]
    pub found_stash: String,

    /// The stash that avoided paths are moved into.
    #[derivative(Default(value = "AVOID.to_string()"))]
    pub avoid_stash: String,
}

impl<P: Path> ExploreOptions<P> {
    /// Creates the default explore options, which find nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stash to explore from to `stash`.
    #[must_use]
    pub fn with_stash(mut self, stash: impl Into<String>) -> Self {
        self.stash = stash.into();
        self
    }

    /// Sets the maximum number of rounds to step for to `n`.
    #[must_use]
    pub fn with_n(mut self, n: usize) -> Self {
        self.n = Some(n);
        self
    }

    /// Searches for the paths matching `find`.
    #[must_use]
    pub fn with_find(mut self, find: impl Into<Condition<P>>) -> Self {
        self.find = Some(find.into());
        self
    }

    /// Stops exploring the paths matching `avoid`.
    #[must_use]
    pub fn with_avoid(mut self, avoid: impl Into<Condition<P>>) -> Self {
        self.avoid = Some(avoid.into());
        self
    }

    /// Sets the number of paths to find before stopping to `num_find`.
    #[must_use]
    pub fn with_num_find(mut self, num_find: usize) -> Self {
        self.num_find = num_find;
        self
    }

    /// Sets the stash that found paths are moved into to `stash`.
    #[must_use]
    pub fn with_found_stash(mut self, stash: impl Into<String>) -> Self {
        self.found_stash = stash.into();
        self
    }

    /// Sets the stash that avoided paths are moved into to `stash`.
    #[must_use]
    pub fn with_avoid_stash(mut self, stash: impl Into<String>) -> Self {
        self.avoid_stash = stash.into();
        self
    }
}

impl<P: Path> PathGroup<P> {
    /// Steps a stash forward, as described by `options`, moving the paths that
    /// match the find condition into the found stash and those matching the
    /// avoid condition into the avoid stash after every round.
    ///
    /// Exploration stops once the found stash has grown by the requested
    /// number of paths, the stash being explored is empty, or the round limit
    /// is reached.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if stepping fails, as described by [`Self::step`].
    pub fn explore(&self, options: ExploreOptions<P>) -> error::Result<Self> {
        let ExploreOptions {
            stash,
            n,
            find,
            avoid,
            num_find,
            found_stash,
            avoid_stash,
        } = options;

        let find = Condition::compile(find, false);
        let avoid = Condition::compile(avoid, false);
        let baseline = self.count(&found_stash);
        let target = baseline + num_find;
        debug!(
            stash = stash.as_str(),
            found = baseline,
            target,
            "Exploring {self}"
        );

        let to_found = StashOptions::new()
            .with_from(stash.as_str())
            .with_to(found_stash.as_str());
        let to_avoid = StashOptions::new()
            .with_from(stash.as_str())
            .with_to(avoid_stash);
        let step_func = move |group: &Self| {
            group
                .stash(Some(Condition::Predicate(find.clone())), to_found.clone())
                .stash(Some(Condition::Predicate(avoid.clone())), to_avoid.clone())
        };
        let until = move |group: &Self| group.count(&found_stash) >= target;

        let mut step_options = StepOptions::new()
            .with_stash(stash)
            .with_step_func(step_func)
            .with_until(until);
        if let Some(n) = n {
            step_options = step_options.with_n(n);
        }

        self.step(step_options)
    }
}
