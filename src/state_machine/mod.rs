mod core_machines;
mod lock_token;
mod state_machine;
mod storage;

pub use core_machines::CoreCommand;
pub use core_machines::CoreCommandResult;
pub use core_machines::CoreSnapshot;
pub use core_machines::CoreSnapshotService;
pub use core_machines::CoreStateMachines;
pub use lock_token::LockToken;
pub use lock_token::LockTokenRequest;
pub use lock_token::LockTokenState;
pub use lock_token::LockTokenStateMachine;
pub use state_machine::CommandIndex;
pub use state_machine::StateMachine;
pub use storage::DurableStateStorage;
pub use storage::InMemoryStateStorage;
pub use storage::PersistentState;
pub use storage::StateStorage;
