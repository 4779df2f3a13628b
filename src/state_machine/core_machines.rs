use crate::state_machine::{
    CommandIndex, LockTokenRequest, LockTokenState, LockTokenStateMachine, StateMachine, StateStorage,
};
use std::io;
use std::sync::Mutex;

/// CoreCommand is every command the replicated log carries for the core state machines. Each
/// variant is routed to the state machine that owns it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CoreCommand {
    LockToken(LockTokenRequest),
    /// Appended by a freshly elected leader. It carries no state change, but it does advance
    /// the applied index.
    NewLeaderBarrier,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CoreCommandResult {
    LockToken { accepted: bool },
    Barrier,
}

/// The state a core member serves to peers that need to catch up: the last applied index of the
/// whole command stream plus the state of each state machine.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CoreSnapshot {
    prev_index: Option<CommandIndex>,
    lock_token_state: LockTokenState,
}

impl CoreSnapshot {
    pub fn new(prev_index: Option<CommandIndex>, lock_token_state: LockTokenState) -> Self {
        CoreSnapshot {
            prev_index,
            lock_token_state,
        }
    }

    pub fn prev_index(&self) -> Option<CommandIndex> {
        self.prev_index
    }

    pub fn lock_token_state(&self) -> &LockTokenState {
        &self.lock_token_state
    }
}

/// CoreSnapshotService is how the catchup server and the state downloader reach the local core
/// state. Read replicas have no core state and therefore no such service.
pub trait CoreSnapshotService: Send + Sync {
    fn snapshot(&self) -> CoreSnapshot;
    fn install_snapshot(&self, snapshot: CoreSnapshot);
}

/// CoreStateMachines dispatches core commands to the state machine responsible for them and
/// tracks the index of the last command applied across all of them.
pub struct CoreStateMachines {
    lock_token: LockTokenStateMachine,
    last_applied: Mutex<Option<CommandIndex>>,
}

impl CoreStateMachines {
    pub fn new(lock_token_storage: impl StateStorage<LockTokenState> + 'static) -> io::Result<Self> {
        let lock_token = LockTokenStateMachine::new(lock_token_storage)?;
        let last_applied = lock_token.last_applied_index();

        Ok(CoreStateMachines {
            lock_token,
            last_applied: Mutex::new(last_applied),
        })
    }

    pub fn lock_token(&self) -> &LockTokenStateMachine {
        &self.lock_token
    }

    /// Commands at or below the last applied index are ignored and their callback dropped.
    pub fn apply_command<F>(&self, command: CoreCommand, index: CommandIndex, callback: F)
    where
        F: FnOnce(CoreCommandResult),
    {
        let mut last_applied = self.last_applied.lock().expect("CoreStateMachines mutex guard poison");
        if Some(index) <= *last_applied {
            return;
        }

        let mut result = None;
        match command {
            CoreCommand::LockToken(request) => {
                self.lock_token.apply_command(request, index, |accepted| {
                    result = Some(CoreCommandResult::LockToken { accepted });
                });
            }
            CoreCommand::NewLeaderBarrier => {
                result = Some(CoreCommandResult::Barrier);
            }
        }
        last_applied.replace(index);
        drop(last_applied);

        if let Some(result) = result {
            callback(result);
        }
    }

    pub fn flush(&self) -> io::Result<()> {
        let _last_applied = self.last_applied.lock().expect("CoreStateMachines mutex guard poison");
        self.lock_token.flush()
    }

    pub fn last_applied_index(&self) -> Option<CommandIndex> {
        *self.last_applied.lock().expect("CoreStateMachines mutex guard poison")
    }
}

impl CoreSnapshotService for CoreStateMachines {
    fn snapshot(&self) -> CoreSnapshot {
        let last_applied = self.last_applied.lock().expect("CoreStateMachines mutex guard poison");
        CoreSnapshot::new(*last_applied, self.lock_token.snapshot())
    }

    fn install_snapshot(&self, snapshot: CoreSnapshot) {
        let mut last_applied = self.last_applied.lock().expect("CoreStateMachines mutex guard poison");
        self.lock_token.install_snapshot(snapshot.lock_token_state);
        *last_applied = snapshot.prev_index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemberId;
    use crate::state_machine::{InMemoryStateStorage, LockToken};

    fn lock_request(owner: &str, id: i64) -> CoreCommand {
        CoreCommand::LockToken(LockTokenRequest::new(MemberId::new(owner), id))
    }

    fn apply(machines: &CoreStateMachines, command: CoreCommand, index: u64) -> Option<CoreCommandResult> {
        let mut outcome = None;
        machines.apply_command(command, CommandIndex::new(index), |r| outcome = Some(r));
        outcome
    }

    #[test]
    fn dispatches_to_lock_token_state_machine() {
        let machines = CoreStateMachines::new(InMemoryStateStorage::new()).unwrap();

        assert_eq!(
            apply(&machines, lock_request("a", 0), 0),
            Some(CoreCommandResult::LockToken { accepted: true })
        );
        assert_eq!(
            apply(&machines, lock_request("b", 5), 1),
            Some(CoreCommandResult::LockToken { accepted: false })
        );
        assert_eq!(apply(&machines, CoreCommand::NewLeaderBarrier, 2), Some(CoreCommandResult::Barrier));

        assert_eq!(machines.lock_token().current_token(), LockToken::new(0, MemberId::new("a")));
        assert_eq!(machines.last_applied_index(), Some(CommandIndex::new(2)));
        assert_eq!(machines.lock_token().last_applied_index(), Some(CommandIndex::new(0)));
    }

    #[test]
    fn redelivery_is_ignored() {
        let machines = CoreStateMachines::new(InMemoryStateStorage::new()).unwrap();
        apply(&machines, CoreCommand::NewLeaderBarrier, 3);

        assert_eq!(apply(&machines, lock_request("a", 0), 3), None);
        assert_eq!(machines.lock_token().current_token(), LockToken::invalid());
    }

    #[test]
    fn snapshot_moves_state_between_members() {
        let leader = CoreStateMachines::new(InMemoryStateStorage::new()).unwrap();
        apply(&leader, lock_request("a", 0), 0);
        apply(&leader, CoreCommand::NewLeaderBarrier, 1);

        let snapshot = leader.snapshot();
        assert_eq!(snapshot.prev_index(), Some(CommandIndex::new(1)));
        assert_eq!(snapshot.lock_token_state().ordinal(), Some(CommandIndex::new(0)));

        let follower = CoreStateMachines::new(InMemoryStateStorage::new()).unwrap();
        follower.install_snapshot(snapshot.clone());
        assert_eq!(follower.snapshot(), snapshot);
        assert_eq!(
            apply(&follower, lock_request("b", 1), 2),
            Some(CoreCommandResult::LockToken { accepted: true })
        );
    }
}
