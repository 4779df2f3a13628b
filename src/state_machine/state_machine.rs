use std::fmt;
use std::io;

/// CommandIndex is the position of a command in the replicated log. The log driver hands
/// commands to state machines in increasing index order, possibly re-delivering ones that were
/// already applied, but never skipping one.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct CommandIndex(u64);

impl CommandIndex {
    pub fn new(index: u64) -> Self {
        CommandIndex(index)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for CommandIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CommandIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// StateMachine is a deterministic consumer of replicated commands of type `C`.
///
/// Every member applies the same commands in the same order, so every member ends up with the
/// same state. Application is idempotent with respect to the command index: a command whose index
/// is at or below `last_applied_index()` is ignored, and its callback is dropped without being
/// invoked, because the outcome was already reported the first time around.
///
/// Implementations serialize `apply_command`, `flush`, `snapshot` and `install_snapshot` against
/// each other. `last_applied_index` must be cheap and must only ever report an index whose effects
/// are visible.
pub trait StateMachine<C> {
    /// What the state machine reports back to the proposer of a command.
    type Output;
    /// The full state, as captured by `snapshot` and replaced by `install_snapshot`.
    type State;

    fn apply_command<F>(&self, command: C, index: CommandIndex, callback: F)
    where
        F: FnOnce(Self::Output);

    /// Durably persists the current state.
    fn flush(&self) -> io::Result<()>;

    fn last_applied_index(&self) -> Option<CommandIndex>;

    /// Returns an independent copy of the current state. Later commands do not affect it.
    fn snapshot(&self) -> Self::State;

    /// Replaces the state wholesale. The last applied index becomes the snapshot's.
    fn install_snapshot(&self, state: Self::State);
}
