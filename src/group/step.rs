//! This module contains the step engine, which advances the paths in a stash
//! by one generation and classifies the outcome for each of them.

use derivative::Derivative;
use tracing::{debug, trace, warn};

use crate::{
    constant::{
        ACTIVE,
        DEADENDED,
        DEFAULT_UNTIL_STEP_LIMIT,
        DEVIATED,
        ERRORED,
        PRUNED,
        SUCCESSFUL,
        UNCONSTRAINED,
        UNSAT,
    },
    error::{
        self,
        container::Locatable,
        execution::{self as execution_error, Errors},
        path::Error as PathError,
    },
    group::PathGroup,
    path::{Path, StepOutcome},
    stash::Stashes,
};

/// A function that transforms the group after every round of stepping.
pub type StepFunc<P> = Box<dyn Fn(&PathGroup<P>) -> PathGroup<P>>;

/// A function that says when stepping should stop.
pub type UntilFunc<P> = Box<dyn Fn(&PathGroup<P>) -> bool>;

/// A function that computes the successors of a path instead of the path
/// itself.
pub type SuccessorFunc<P> = Box<dyn Fn(&P) -> execution_error::Result<Vec<P>>>;

/// A function that decides whether a path is errored instead of the path
/// itself.
pub type CheckFunc<P> = Box<dyn Fn(&P) -> bool>;

/// The options for stepping a stash of paths.
#[derive(Derivative)]
#[derivative(Debug, Default(bound = ""))]
pub struct StepOptions<P: Path> {
    /// The number of rounds to step for.
    ///
    /// Defaults to one round, or to [`DEFAULT_UNTIL_STEP_LIMIT`] rounds if
    /// `until` is provided.
    pub n: Option<usize>,

    /// The stash to step.
    #[derivative(Default(value = "ACTIVE.to_string()"))]
    pub stash: String,

    /// Called with the group after every round, returning the group to
    /// continue with.
    #[derivative(Debug = "ignore")]
    pub step_func: Option<StepFunc<P>>,

    /// Called with the group after every round, stopping stepping once it
    /// returns `true`.
    #[derivative(Debug = "ignore")]
    pub until: Option<UntilFunc<P>>,

    /// Used to compute the successors of each path instead of
    /// [`Path::step`].
    #[derivative(Debug = "ignore")]
    pub successor_func: Option<SuccessorFunc<P>>,

    /// Used to decide whether each path is errored instead of
    /// [`Path::error`].
    #[derivative(Debug = "ignore")]
    pub check_func: Option<CheckFunc<P>>,
}

impl<P: Path> StepOptions<P> {
    /// Creates the default step options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of rounds to step for to `n`.
    #[must_use]
    pub fn with_n(mut self, n: usize) -> Self {
        self.n = Some(n);
        self
    }

    /// Sets the stash to step to `stash`.
    #[must_use]
    pub fn with_stash(mut self, stash: impl Into<String>) -> Self {
        self.stash = stash.into();
        self
    }

    /// Sets the function called with the group after every round.
    #[must_use]
    pub fn with_step_func(mut self, f: impl Fn(&PathGroup<P>) -> PathGroup<P> + 'static) -> Self {
        self.step_func = Some(Box::new(f));
        self
    }

    /// Sets the condition under which stepping stops.
    #[must_use]
    pub fn with_until(mut self, f: impl Fn(&PathGroup<P>) -> bool + 'static) -> Self {
        self.until = Some(Box::new(f));
        self
    }

    /// Sets the function used to compute the successors of each path.
    #[must_use]
    pub fn with_successor_func(
        mut self,
        f: impl Fn(&P) -> execution_error::Result<Vec<P>> + 'static,
    ) -> Self {
        self.successor_func = Some(Box::new(f));
        self
    }

    /// Sets the function used to decide whether each path is errored.
    #[must_use]
    pub fn with_check_func(mut self, f: impl Fn(&P) -> bool + 'static) -> Self {
        self.check_func = Some(Box::new(f));
        self
    }
}

/// What happened to a single path during a round of stepping.
#[derive(Debug)]
enum Advance<P> {
    /// The path is unreachable and goes to the pruned stash.
    Pruned,

    /// The path carries an error and goes to the errored stash.
    Errored(Option<PathError>),

    /// The path was stepped, producing `successors`. If there are none, the
    /// path goes to the deadended stash.
    Stepped {
        successors:    Vec<P>,
        unconstrained: Vec<P>,
        unsat:         Vec<P>,
    },

    /// The path was explored by the accelerator, producing `successors` and
    /// the remaining `stashes` of the nested exploration.
    Accelerated {
        successors: Vec<P>,
        stashes:    Stashes<P>,
    },

    /// Stepping the path failed and the failure was tolerated, so the path is
    /// dropped.
    Dropped,
}

impl<P: Path> PathGroup<P> {
    /// Steps the paths in a stash forward, as described by `options`.
    ///
    /// Each round advances every path in the stash by one step, and stepping
    /// stops early once the stash is empty or the `until` condition holds.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if stepping a path fails unexpectedly and the group is
    /// not resilient. In this case the round in which the failure occurred has
    /// no effect.
    pub fn step(&self, options: StepOptions<P>) -> error::Result<Self> {
        let StepOptions {
            n,
            stash,
            step_func,
            until,
            successor_func,
            check_func,
        } = options;
        let rounds = n.unwrap_or(if until.is_some() {
            DEFAULT_UNTIL_STEP_LIMIT
        } else {
            1
        });

        let mut group = self.clone();
        for round in 0..rounds {
            debug!(round, stash = stash.as_str(), "Stepping {group}");

            group = group.one_step(&stash, successor_func.as_deref(), check_func.as_deref())?;
            if let Some(step_func) = &step_func {
                group = step_func(&group);
            }

            if group.count(&stash) == 0 {
                debug!(stash = stash.as_str(), "Out of paths in stash");
                break;
            }

            if until.as_ref().is_some_and(|until| until(&group)) {
                debug!("Until condition returned true");
                break;
            }
        }

        Ok(group)
    }

    /// Advances every path in `stash` by a single step.
    ///
    /// The round is computed in full before anything is committed, so a
    /// failure leaves the group untouched.
    fn one_step(
        &self,
        stash: &str,
        successor_func: Option<&dyn Fn(&P) -> execution_error::Result<Vec<P>>>,
        check_func: Option<&dyn Fn(&P) -> bool>,
    ) -> error::Result<Self> {
        let mut errors = Errors::default();
        let advances = {
            let stashes = self.stashes();
            let mut advances = Vec::with_capacity(stashes.count(stash));
            for path in stashes.get(stash) {
                match self.advance(path, successor_func, check_func) {
                    Ok(advance) => advances.push(advance),
                    Err(payload) if self.config.resilience => {
                        warn!(
                            addr = path.addr(),
                            error = %payload,
                            "Resilience squashed a failure while stepping a path"
                        );
                        errors.add_located(path.addr(), payload);
                        advances.push(Advance::Dropped);
                    }
                    Err(payload) => return Err(payload.locate(path.addr()).into()),
                }
            }
            advances
        };

        let mut new_stashes = self.working_stashes();
        let paths = new_stashes.take(stash);
        let mut next_generation = Vec::new();

        for (path, advance) in paths.into_iter().zip(advances) {
            match advance {
                Advance::Pruned => {
                    trace!(addr = path.addr(), "Path pruned");
                    new_stashes.extend(PRUNED, [path]);
                }
                Advance::Errored(error) => {
                    trace!(addr = path.addr(), ?error, "Path errored");
                    self.hierarchy.unreachable(&path);
                    new_stashes.extend(ERRORED, [path]);
                }
                Advance::Stepped {
                    successors,
                    unconstrained,
                    unsat,
                } => {
                    if self.config.save_unconstrained {
                        new_stashes.extend(UNCONSTRAINED, unconstrained);
                    }
                    if self.config.save_unsat {
                        new_stashes.extend(UNSAT, unsat);
                    }
                    Self::accumulate(&mut new_stashes, &mut next_generation, path, successors);
                }
                Advance::Accelerated {
                    successors,
                    stashes,
                } => {
                    new_stashes.absorb(stashes);
                    Self::accumulate(&mut new_stashes, &mut next_generation, path, successors);
                }
                Advance::Dropped => {
                    trace!(addr = path.addr(), "Path dropped");
                }
            }
        }

        new_stashes.set(stash, next_generation);
        Ok(self.successor_with_errors(new_stashes, errors))
    }

    /// Adds `successors` to the next generation, or places `path` into the
    /// deadended stash if there are none.
    fn accumulate(
        stashes: &mut Stashes<P>,
        next_generation: &mut Vec<P>,
        path: P,
        successors: Vec<P>,
    ) {
        if successors.is_empty() {
            trace!(addr = path.addr(), "Path deadended");
            stashes.extend(DEADENDED, [path]);
        } else {
            trace!(addr = path.addr(), count = successors.len(), "Path advanced");
            next_generation.extend(successors);
        }
    }

    /// Works out what happens to `path` in this round, without modifying any
    /// stashes.
    fn advance(
        &self,
        path: &P,
        successor_func: Option<&dyn Fn(&P) -> execution_error::Result<Vec<P>>>,
        check_func: Option<&dyn Fn(&P) -> bool>,
    ) -> execution_error::Result<Advance<P>> {
        if let Some(accelerator) = &self.accelerator {
            if let Some(mut stashes) = accelerator.accelerate(path)? {
                stashes.move_paths(None, DEVIATED, ACTIVE);
                stashes.move_paths(None, SUCCESSFUL, ACTIVE);
                let successors = stashes.take(ACTIVE);
                return Ok(Advance::Accelerated {
                    successors,
                    stashes,
                });
            }
        }

        let is_errored = match check_func {
            Some(check_func) => check_func(path),
            None => path.is_errored(),
        };
        if is_errored {
            return Ok(Self::classify_error(path.error().cloned()));
        }

        let advance = match successor_func {
            Some(successor_func) => Advance::Stepped {
                successors:    successor_func(path)?,
                unconstrained: Vec::new(),
                unsat:         Vec::new(),
            },
            None => match path.step()? {
                StepOutcome::Successors(successors) => Advance::Stepped {
                    successors:    successors.normal,
                    unconstrained: successors.unconstrained,
                    unsat:         successors.unsat,
                },
                StepOutcome::Unreachable => Advance::Pruned,
                StepOutcome::Errored(error) => Self::classify_error(Some(error)),
            },
        };

        Ok(advance)
    }

    /// Decides where a path carrying `error` should go.
    fn classify_error(error: Option<PathError>) -> Advance<P> {
        match error {
            Some(error) if error.is_unreachable() => Advance::Pruned,
            error => Advance::Errored(error),
        }
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use crate::{
        accelerator::Accelerator,
        constant::{ACTIVE, DEADENDED, DEVIATED, ERRORED, PRUNED, SUCCESSFUL, UNCONSTRAINED, UNSAT},
        error::{
            execution::{self, Error},
            path::Error as PathError,
        },
        group::{step::StepOptions, Config, PathGroup},
        hierarchy::PathHierarchy,
        path::{
            testing::{Graph, GraphPath},
            Path,
        },
        stash::Stashes,
    };

    fn addrs(paths: &[GraphPath]) -> Vec<u64> {
        paths.iter().map(Path::addr).collect()
    }

    #[test]
    fn single_step_advances_paths_in_order() -> anyhow::Result<()> {
        let graph = Graph::new()
            .edge(0x10, 0x11)
            .edge(0x10, 0x12)
            .edge(0x20, 0x21)
            .in_rc();
        let group = PathGroup::new(vec![graph.path_at(0x10), graph.path_at(0x20)]);

        let stepped = group.step(StepOptions::<GraphPath>::new())?;
        assert_eq!(addrs(&stepped.active()), vec![0x11, 0x12, 0x21]);
        assert_eq!(stepped.active()[2].addr_backtrace(), &[0x20]);

        Ok(())
    }

    #[test]
    fn paths_without_successors_are_deadended() -> anyhow::Result<()> {
        let graph = Graph::new().edge(0x10, 0x11).in_rc();
        let group = PathGroup::new(vec![graph.path_at(0x10), graph.path_at(0x99)]);

        let stepped = group.step(StepOptions::<GraphPath>::new())?;
        assert_eq!(addrs(&stepped.active()), vec![0x11]);
        assert_eq!(addrs(&stepped.deadended()), vec![0x99]);

        Ok(())
    }

    #[test]
    fn unreachable_paths_are_pruned_without_notification() -> anyhow::Result<()> {
        let graph = Graph::new().unreachable_at(0x10).in_rc();
        let hierarchy = PathHierarchy::new().in_rc();
        let carrying = graph.path_at(0x30).with_error(PathError::unreachable("x != x"));
        let group = PathGroup::new(vec![graph.path_at(0x10), carrying])
            .with_hierarchy(hierarchy.clone());

        let stepped = group.step(StepOptions::<GraphPath>::new())?;
        assert_eq!(addrs(&stepped.pruned()), vec![0x10, 0x30]);
        assert!(stepped.active().is_empty());
        assert!(stepped.deadended().is_empty());
        assert_eq!(hierarchy.unreachable_count(), 0);

        Ok(())
    }

    #[test]
    fn errored_paths_notify_the_hierarchy_once() -> anyhow::Result<()> {
        let graph = Graph::new().errored_at(0x10, "bad decode").in_rc();
        let hierarchy = PathHierarchy::new().in_rc();
        let carrying = graph.path_at(0x30).with_error(PathError::other("symbolic jump"));
        let group = PathGroup::new(vec![graph.path_at(0x10), carrying])
            .with_hierarchy(hierarchy.clone());

        let stepped = group.step(StepOptions::<GraphPath>::new())?;
        assert_eq!(addrs(&stepped.errored()), vec![0x10, 0x30]);
        assert!(stepped.deadended().is_empty());
        assert_eq!(hierarchy.unreachable_addresses(), vec![0x10, 0x30]);

        Ok(())
    }

    #[test]
    fn check_func_overrides_the_error_marker() -> anyhow::Result<()> {
        let graph = Graph::new().edge(0x10, 0x11).edge(0x20, 0x21).in_rc();
        let carrying = graph.path_at(0x20).with_error(PathError::other("ignored"));
        let group = PathGroup::new(vec![graph.path_at(0x10), carrying]);

        let options =
            StepOptions::<GraphPath>::new().with_check_func(|p: &GraphPath| p.addr() == 0x10);
        let stepped = group.step(options)?;
        assert_eq!(addrs(&stepped.errored()), vec![0x10]);
        assert_eq!(addrs(&stepped.active()), vec![0x21]);

        Ok(())
    }

    #[test]
    fn successor_func_overrides_stepping() -> anyhow::Result<()> {
        let graph = Graph::new().edge(0x10, 0x11).in_rc();
        let group = PathGroup::new(vec![graph.path_at(0x10)]);
        let target = graph.path_at(0x77);

        let options = StepOptions::<GraphPath>::new()
            .with_successor_func(move |_| Ok(vec![target.clone()]));
        let stepped = group.step(options)?;
        assert_eq!(addrs(&stepped.active()), vec![0x77]);

        Ok(())
    }

    #[test]
    fn side_channels_are_saved_only_when_enabled() -> anyhow::Result<()> {
        let graph = Graph::new()
            .edge(0x10, 0x11)
            .unconstrained_edge(0x10, 0xdead)
            .unsat_edge(0x10, 0xbeef)
            .in_rc();

        let plain =
            PathGroup::new(vec![graph.path_at(0x10)]).step(StepOptions::<GraphPath>::new())?;
        assert!(plain.unconstrained().is_empty());
        assert!(plain.unsat().is_empty());

        let config = Config::default()
            .with_save_unconstrained(true)
            .with_save_unsat(true);
        let saving = PathGroup::new(vec![graph.path_at(0x10)])
            .with_config(config)
            .step(StepOptions::<GraphPath>::new())?;
        assert_eq!(addrs(&saving.active()), vec![0x11]);
        assert_eq!(addrs(&saving.stash_paths(UNCONSTRAINED)), vec![0xdead]);
        assert_eq!(addrs(&saving.stash_paths(UNSAT)), vec![0xbeef]);

        Ok(())
    }

    #[test]
    fn zero_rounds_is_a_no_op() -> anyhow::Result<()> {
        let graph = Graph::new().edge(0x10, 0x11).in_rc();
        let group = PathGroup::new(vec![graph.path_at(0x10)]);

        let stepped = group.step(StepOptions::<GraphPath>::new().with_n(0))?;
        assert_eq!(*stepped.stashes(), *group.stashes());

        Ok(())
    }

    #[test]
    fn stepping_an_empty_stash_is_a_no_op() -> anyhow::Result<()> {
        let group = PathGroup::<GraphPath>::new(Vec::new());

        let stepped = group.step(StepOptions::<GraphPath>::new().with_n(5))?;
        assert_eq!(*stepped.stashes(), *group.stashes());

        Ok(())
    }

    #[test]
    fn stepping_stops_when_the_stash_empties() -> anyhow::Result<()> {
        let graph = Graph::new().edge(0x10, 0x11).in_rc();
        let group = PathGroup::new(vec![graph.path_at(0x10)]);
        let rounds = Rc::new(std::cell::Cell::new(0));
        let counter = rounds.clone();

        let options = StepOptions::<GraphPath>::new()
            .with_n(10)
            .with_step_func(move |g| {
                counter.set(counter.get() + 1);
                g.clone()
            });
        let stepped = group.step(options)?;
        assert_eq!(rounds.get(), 2);
        assert_eq!(addrs(&stepped.deadended()), vec![0x11]);

        Ok(())
    }

    #[test]
    fn until_stops_stepping() -> anyhow::Result<()> {
        let graph = Graph::new()
            .edge(0x10, 0x20)
            .edge(0x20, 0x30)
            .edge(0x30, 0x40)
            .in_rc();
        let group = PathGroup::new(vec![graph.path_at(0x10)]);

        let options =
            StepOptions::<GraphPath>::new().with_until(|g| g.active()[0].addr() == 0x30);
        let stepped = group.step(options)?;
        assert_eq!(addrs(&stepped.active()), vec![0x30]);

        Ok(())
    }

    #[test]
    fn failures_abort_the_round_by_default() {
        let graph = Graph::new()
            .edge(0x10, 0x11)
            .errored_at(0x20, "bad")
            .failing_at(0x30, "solver crashed")
            .in_rc();
        let hierarchy = PathHierarchy::new().in_rc();
        let group = PathGroup::new(vec![
            graph.path_at(0x10),
            graph.path_at(0x20),
            graph.path_at(0x30),
        ])
        .with_hierarchy(hierarchy.clone())
        .with_config(Config::default().with_immutable(false));

        let error = group.step(StepOptions::<GraphPath>::new()).unwrap_err();
        assert_eq!(error.location, 0x30);
        assert!(matches!(
            error.payload,
            crate::error::Error::Execution(Error::Engine { .. })
        ));

        // Nothing from the failed round was committed.
        assert_eq!(addrs(&group.active()), vec![0x10, 0x20, 0x30]);
        assert!(group.errored().is_empty());
        assert_eq!(hierarchy.unreachable_count(), 0);
    }

    #[test]
    fn resilience_drops_failing_paths() -> anyhow::Result<()> {
        let graph = Graph::new()
            .edge(0x10, 0x11)
            .failing_at(0x30, "solver crashed")
            .in_rc();
        let group = PathGroup::new(vec![graph.path_at(0x10), graph.path_at(0x30)])
            .with_config(Config::default().with_resilience(true));

        let stepped = group.step(StepOptions::<GraphPath>::new())?;
        assert_eq!(addrs(&stepped.active()), vec![0x11]);
        assert!(stepped.deadended().is_empty());
        assert!(stepped.errored().is_empty());
        assert_eq!(stepped.errors().len(), 1);
        assert_eq!(stepped.errors().payloads()[0].location, 0x30);
        assert!(group.errors().is_empty());

        Ok(())
    }

    #[test]
    fn immutable_step_leaves_the_original_untouched() -> anyhow::Result<()> {
        let graph = Graph::new().edge(0x10, 0x11).in_rc();
        let group = PathGroup::new(vec![graph.path_at(0x10)]);
        let before = group.stashes().clone();

        let stepped = group.step(StepOptions::<GraphPath>::new())?;
        assert!(!stepped.same_group(&group));
        assert_eq!(*group.stashes(), before);

        Ok(())
    }

    #[test]
    fn in_place_step_modifies_the_group() -> anyhow::Result<()> {
        let graph = Graph::new().edge(0x10, 0x11).in_rc();
        let group = PathGroup::new(vec![graph.path_at(0x10)])
            .with_config(Config::default().with_immutable(false));

        let stepped = group.step(StepOptions::<GraphPath>::new())?;
        assert!(stepped.same_group(&group));
        assert_eq!(addrs(&group.active()), vec![0x11]);

        Ok(())
    }

    #[derive(Debug)]
    struct FixedAccelerator {
        graph: Rc<Graph>,
    }

    impl Accelerator<GraphPath> for FixedAccelerator {
        fn accelerate(&self, path: &GraphPath) -> execution::Result<Option<Stashes<GraphPath>>> {
            match path.addr() {
                0x10 => {
                    let mut stashes = Stashes::empty();
                    stashes.set(DEVIATED, vec![self.graph.path_at(0x100)]);
                    stashes.set(SUCCESSFUL, vec![self.graph.path_at(0x200)]);
                    stashes.set(DEADENDED, vec![self.graph.path_at(0x300)]);
                    stashes.set("looping", vec![self.graph.path_at(0x400)]);
                    Ok(Some(stashes))
                }
                0x20 => Err(Error::accelerator("ran out of budget")),
                _ => Ok(None),
            }
        }
    }

    #[test]
    fn accelerated_paths_fold_nested_stashes() -> anyhow::Result<()> {
        let graph = Graph::new().edge(0x30, 0x31).in_rc();
        let accelerator = Rc::new(FixedAccelerator {
            graph: graph.clone(),
        });
        let errored = graph.path_at(0x40).with_error(PathError::other("skipped"));
        let group = PathGroup::new(vec![graph.path_at(0x10), graph.path_at(0x30), errored])
            .with_accelerator(accelerator);

        let stepped = group.step(StepOptions::<GraphPath>::new())?;
        assert_eq!(addrs(&stepped.active()), vec![0x100, 0x200, 0x31]);
        assert_eq!(addrs(&stepped.deadended()), vec![0x300]);
        assert_eq!(addrs(&stepped.stash_paths("looping")), vec![0x400]);
        assert_eq!(addrs(&stepped.errored()), vec![0x40]);
        assert!(stepped.stash_paths(DEVIATED).is_empty());
        assert_eq!(stepped.count(ERRORED) + stepped.count(PRUNED), 1);
        assert_eq!(stepped.count(ACTIVE), 3);

        Ok(())
    }

    #[test]
    fn accelerator_failures_abort_the_round() {
        let graph = Graph::new().in_rc();
        let accelerator = Rc::new(FixedAccelerator {
            graph: graph.clone(),
        });
        let group = PathGroup::new(vec![graph.path_at(0x20)]).with_accelerator(accelerator);

        assert!(group.step(StepOptions::<GraphPath>::new()).is_err());
    }
}
