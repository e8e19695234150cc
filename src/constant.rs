//! This module contains constants that are needed throughout the codebase.

/// The stash that holds the paths currently being explored.
pub const ACTIVE: &str = "active";

/// The stash that paths are split or stashed away into by default.
pub const STASHED: &str = "stashed";

/// The stash for paths that were found to be unreachable.
pub const PRUNED: &str = "pruned";

/// The stash for the unsatisfiable successors of paths, when these are being
/// saved.
pub const UNSAT: &str = "unsat";

/// The stash for paths whose execution produced an error.
pub const ERRORED: &str = "errored";

/// The stash for paths that have no successors.
pub const DEADENDED: &str = "deadended";

/// The stash for the unconstrained successors of paths, when these are being
/// saved.
pub const UNCONSTRAINED: &str = "unconstrained";

/// The stash that the explorer places found paths into by default.
pub const FOUND: &str = "found";

/// The stash that the explorer places avoided paths into by default.
pub const AVOID: &str = "avoid";

/// The sub-stash of an accelerated exploration containing paths that left the
/// accelerated region.
pub const DEVIATED: &str = "deviated";

/// The sub-stash of an accelerated exploration containing paths that
/// completed the accelerated region.
pub const SUCCESSFUL: &str = "successful";

/// A stash that is reserved for dropping paths. Anything placed in it is
/// discarded whenever a path group commits a new set of stashes.
pub const DROP: &str = "_DROP";

/// The stashes that every new path group starts with, in the order in which
/// they are iterated.
pub const DEFAULT_STASHES: [&str; 7] = [
    ACTIVE,
    STASHED,
    PRUNED,
    UNSAT,
    ERRORED,
    DEADENDED,
    UNCONSTRAINED,
];

/// The default number of paths kept in the source stash when splitting.
pub const DEFAULT_SPLIT_LIMIT: usize = 8;

/// The number of rounds that stepping runs for when only a termination
/// condition is provided.
pub const DEFAULT_UNTIL_STEP_LIMIT: usize = 100_000;

/// The default number of paths that exploration will look for.
pub const DEFAULT_NUM_FIND: usize = 1;

/// The default value for whether path groups are immutable.
///
/// Immutable path groups produce new groups from every operation, rather than
/// modifying the group that the operation was called on.
pub const DEFAULT_IMMUTABLE: bool = true;

/// The default value for whether failures while stepping a single path are
/// tolerated.
pub const DEFAULT_RESILIENCE: bool = false;

/// The default value for whether unconstrained successors are saved.
pub const DEFAULT_SAVE_UNCONSTRAINED: bool = false;

/// The default value for whether unsatisfiable successors are saved.
pub const DEFAULT_SAVE_UNSAT: bool = false;
