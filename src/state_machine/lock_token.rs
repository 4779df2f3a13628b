use crate::identity::MemberId;
use crate::state_machine::{CommandIndex, PersistentState, StateMachine, StateStorage};
use crate::wire;
use prost::Message;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// LockToken is the cluster-wide token whose holder may act as leader for replicated locking.
/// Tokens are totally ordered by id; the next valid token id is always the current one plus one.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct LockToken {
    id: i64,
    owner: Option<MemberId>,
}

impl LockToken {
    pub const INVALID_ID: i64 = -1;

    pub fn new(id: i64, owner: MemberId) -> Self {
        LockToken { id, owner: Some(owner) }
    }

    pub fn invalid() -> Self {
        LockToken {
            id: Self::INVALID_ID,
            owner: None,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn owner(&self) -> Option<&MemberId> {
        self.owner.as_ref()
    }

    /// `None` once the id space is exhausted, after which no request can be accepted.
    pub fn next_candidate_id(&self) -> Option<i64> {
        self.id.checked_add(1)
    }
}

impl Default for LockToken {
    fn default() -> Self {
        LockToken::invalid()
    }
}

/// A member's request to take over the token with the given candidate id.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct LockTokenRequest {
    pub owner: MemberId,
    pub candidate_id: i64,
}

impl LockTokenRequest {
    pub fn new(owner: MemberId, candidate_id: i64) -> Self {
        LockTokenRequest { owner, candidate_id }
    }
}

/// The lock-token state machine's whole state: the current token and the index of the command
/// that installed it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LockTokenState {
    token: LockToken,
    ordinal: Option<CommandIndex>,
}

impl LockTokenState {
    pub fn new(token: LockToken, ordinal: Option<CommandIndex>) -> Self {
        LockTokenState { token, ordinal }
    }

    pub fn token(&self) -> &LockToken {
        &self.token
    }

    pub fn ordinal(&self) -> Option<CommandIndex> {
        self.ordinal
    }

    fn set(&mut self, request: LockTokenRequest, index: CommandIndex) {
        self.token = LockToken::new(request.candidate_id, request.owner);
        self.ordinal = Some(index);
    }
}

impl PersistentState for LockTokenState {
    fn encode_state(&self) -> io::Result<Vec<u8>> {
        wire::encode_message(&wire::lock_token_state_to_proto(self))
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    fn decode_state(bytes: &[u8]) -> io::Result<Self> {
        let proto =
            wire::ProtoLockTokenState::decode(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        wire::lock_token_state_from_proto(proto).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// LockTokenStateMachine hands out the lock token in strict id order. A request is accepted iff
/// its candidate id is exactly one past the current token's id. Rejected requests leave the state
/// untouched, including its ordinal.
pub struct LockTokenStateMachine {
    inner: Mutex<Inner>,
    // 0 means nothing applied, n + 1 means index n.
    last_applied: AtomicU64,
}

struct Inner {
    state: LockTokenState,
    storage: Box<dyn StateStorage<LockTokenState>>,
}

impl LockTokenStateMachine {
    pub fn new(mut storage: impl StateStorage<LockTokenState> + 'static) -> io::Result<Self> {
        let state = storage.initial_state()?;
        let last_applied = AtomicU64::new(encode_index(state.ordinal()));

        Ok(LockTokenStateMachine {
            inner: Mutex::new(Inner {
                state,
                storage: Box::new(storage),
            }),
            last_applied,
        })
    }

    pub fn current_token(&self) -> LockToken {
        self.lock_inner().state.token.clone()
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("LockTokenStateMachine mutex guard poison")
    }
}

impl StateMachine<LockTokenRequest> for LockTokenStateMachine {
    /// Whether the request was accepted.
    type Output = bool;
    type State = LockTokenState;

    fn apply_command<F>(&self, request: LockTokenRequest, index: CommandIndex, callback: F)
    where
        F: FnOnce(bool),
    {
        let accepted = {
            let mut inner = self.lock_inner();
            if Some(index) <= inner.state.ordinal {
                return;
            }

            let accepted = inner.state.token.next_candidate_id() == Some(request.candidate_id);
            if accepted {
                inner.state.set(request, index);
                self.last_applied.store(encode_index(Some(index)), Ordering::Release);
            }
            accepted
        };

        callback(accepted);
    }

    fn flush(&self) -> io::Result<()> {
        let mut inner = self.lock_inner();
        let Inner { state, storage } = &mut *inner;
        storage.persist_store_data(state)
    }

    fn last_applied_index(&self) -> Option<CommandIndex> {
        decode_index(self.last_applied.load(Ordering::Acquire))
    }

    fn snapshot(&self) -> LockTokenState {
        self.lock_inner().state.clone()
    }

    fn install_snapshot(&self, state: LockTokenState) {
        let mut inner = self.lock_inner();
        let ordinal = state.ordinal;
        inner.state = state;
        self.last_applied.store(encode_index(ordinal), Ordering::Release);
    }
}

fn encode_index(index: Option<CommandIndex>) -> u64 {
    index.map(|i| i.as_u64() + 1).unwrap_or(0)
}

fn decode_index(raw: u64) -> Option<CommandIndex> {
    raw.checked_sub(1).map(CommandIndex::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::InMemoryStateStorage;
    use std::cell::Cell;
    use std::sync::Arc;

    fn member(name: &str) -> MemberId {
        MemberId::new(name)
    }

    fn new_state_machine() -> (LockTokenStateMachine, InMemoryStateStorage<LockTokenState>) {
        let storage = InMemoryStateStorage::new();
        let state_machine = LockTokenStateMachine::new(storage.clone()).unwrap();
        (state_machine, storage)
    }

    fn apply(state_machine: &LockTokenStateMachine, request: LockTokenRequest, index: u64) -> Option<bool> {
        let outcome = Cell::new(None);
        state_machine.apply_command(request, CommandIndex::new(index), |accepted| outcome.set(Some(accepted)));
        outcome.get()
    }

    #[test]
    fn starts_with_invalid_token() {
        let (state_machine, _) = new_state_machine();
        assert_eq!(state_machine.current_token(), LockToken::invalid());
        assert_eq!(state_machine.current_token().id(), -1);
        assert_eq!(state_machine.last_applied_index(), None);
    }

    #[test]
    fn exhausted_token_id_rejects_everything() {
        let (state_machine, _) = new_state_machine();
        state_machine.install_snapshot(LockTokenState::new(
            LockToken::new(i64::MAX, member("a")),
            Some(CommandIndex::new(4)),
        ));

        assert_eq!(state_machine.current_token().next_candidate_id(), None);
        assert_eq!(
            apply(&state_machine, LockTokenRequest::new(member("b"), i64::MIN), 5),
            Some(false)
        );
        assert_eq!(state_machine.current_token(), LockToken::new(i64::MAX, member("a")));
    }

    #[test]
    fn accepts_consecutive_ids() {
        let (state_machine, _) = new_state_machine();

        assert_eq!(apply(&state_machine, LockTokenRequest::new(member("a"), 0), 0), Some(true));
        assert_eq!(apply(&state_machine, LockTokenRequest::new(member("b"), 1), 1), Some(true));
        assert_eq!(apply(&state_machine, LockTokenRequest::new(member("a"), 2), 2), Some(true));

        assert_eq!(state_machine.current_token(), LockToken::new(2, member("a")));
        assert_eq!(state_machine.last_applied_index(), Some(CommandIndex::new(2)));
    }

    #[test]
    fn rejects_skipped_id_without_consuming_index() {
        let (state_machine, _) = new_state_machine();

        assert_eq!(apply(&state_machine, LockTokenRequest::new(member("a"), 0), 0), Some(true));
        assert_eq!(apply(&state_machine, LockTokenRequest::new(member("b"), 2), 1), Some(false));

        assert_eq!(state_machine.current_token(), LockToken::new(0, member("a")));
        assert_eq!(state_machine.last_applied_index(), Some(CommandIndex::new(0)));
        assert_eq!(state_machine.snapshot().ordinal(), Some(CommandIndex::new(0)));
    }

    #[test]
    fn rejects_stale_id() {
        let (state_machine, _) = new_state_machine();

        assert_eq!(apply(&state_machine, LockTokenRequest::new(member("a"), 0), 0), Some(true));
        assert_eq!(apply(&state_machine, LockTokenRequest::new(member("b"), 0), 1), Some(false));
        assert_eq!(state_machine.current_token().owner(), Some(&member("a")));
    }

    #[test]
    fn redelivered_command_is_a_no_op() {
        let (state_machine, _) = new_state_machine();

        assert_eq!(apply(&state_machine, LockTokenRequest::new(member("a"), 0), 5), Some(true));
        let before = state_machine.snapshot();

        // A different request at an already applied index must not be looked at.
        assert_eq!(apply(&state_machine, LockTokenRequest::new(member("b"), 1), 5), None);
        assert_eq!(apply(&state_machine, LockTokenRequest::new(member("b"), 1), 3), None);

        assert_eq!(state_machine.snapshot(), before);
        assert_eq!(state_machine.last_applied_index(), Some(CommandIndex::new(5)));
    }

    #[test]
    fn snapshot_is_independent_and_installable() {
        let (source, _) = new_state_machine();
        apply(&source, LockTokenRequest::new(member("a"), 0), 0);
        apply(&source, LockTokenRequest::new(member("b"), 1), 1);

        let snapshot = source.snapshot();
        apply(&source, LockTokenRequest::new(member("c"), 2), 2);
        assert_eq!(snapshot.token(), &LockToken::new(1, member("b")));

        let (target, _) = new_state_machine();
        target.install_snapshot(snapshot.clone());
        assert_eq!(target.snapshot(), snapshot);
        assert_eq!(target.current_token(), LockToken::new(1, member("b")));
        assert_eq!(target.last_applied_index(), Some(CommandIndex::new(1)));

        // Commands at or below the installed ordinal are ignored.
        assert_eq!(apply(&target, LockTokenRequest::new(member("c"), 2), 1), None);
        assert_eq!(apply(&target, LockTokenRequest::new(member("c"), 2), 2), Some(true));
    }

    #[test]
    fn flush_persists_and_restart_resumes() {
        let (state_machine, storage) = new_state_machine();
        apply(&state_machine, LockTokenRequest::new(member("a"), 0), 0);
        assert_eq!(storage.stored(), None);

        state_machine.flush().unwrap();
        let flushed = storage.stored().unwrap();
        assert_eq!(flushed.token(), &LockToken::new(0, member("a")));

        let restarted = LockTokenStateMachine::new(storage).unwrap();
        assert_eq!(restarted.current_token(), LockToken::new(0, member("a")));
        assert_eq!(restarted.last_applied_index(), Some(CommandIndex::new(0)));
    }

    #[test]
    fn concurrent_flush_never_sees_torn_state() {
        let storage = InMemoryStateStorage::new();
        let state_machine = Arc::new(LockTokenStateMachine::new(storage.clone()).unwrap());

        let applier = {
            let state_machine = state_machine.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    let owner = MemberId::new(format!("member-{}", i));
                    state_machine.apply_command(LockTokenRequest::new(owner, i), CommandIndex::new(i as u64), |_| {});
                }
            })
        };

        for _ in 0..50 {
            state_machine.flush().unwrap();
            if let Some(state) = storage.stored() {
                let token = state.token();
                assert_eq!(token.owner(), Some(&MemberId::new(format!("member-{}", token.id()))));
                assert_eq!(state.ordinal(), Some(CommandIndex::new(token.id() as u64)));
            }
        }

        applier.join().unwrap();
        assert_eq!(state_machine.current_token().id(), 199);
    }
}
