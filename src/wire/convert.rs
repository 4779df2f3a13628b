use crate::catchup::CodecError;
use crate::identity::{MemberId, StoreId};
use crate::state_machine::{CommandIndex, CoreSnapshot, LockToken, LockTokenState};
use crate::wire::proto::{ProtoCoreSnapshot, ProtoLockToken, ProtoLockTokenState, ProtoStoreId};
use prost::Message;

pub(crate) fn encode_message<M: Message>(message: &M) -> Result<Vec<u8>, prost::EncodeError> {
    let mut buf = Vec::with_capacity(message.encoded_len());
    message.encode(&mut buf)?;
    Ok(buf)
}

pub(crate) fn store_id_to_proto(store_id: StoreId) -> ProtoStoreId {
    ProtoStoreId {
        creation_time: store_id.creation_time(),
        random_id: store_id.random_id(),
        upgrade_time: store_id.upgrade_time(),
        upgrade_id: store_id.upgrade_id(),
    }
}

pub(crate) fn store_id_from_proto(proto: Option<ProtoStoreId>) -> Result<StoreId, CodecError> {
    match proto {
        Some(p) => Ok(StoreId::new(p.creation_time, p.random_id, p.upgrade_time, p.upgrade_id)),
        None => Err(CodecError::InvalidMessage("missing store id".to_string())),
    }
}

fn index_to_proto(index: Option<CommandIndex>) -> i64 {
    match index {
        Some(index) => index.as_u64() as i64,
        None => -1,
    }
}

fn index_from_proto(index: i64) -> Result<Option<CommandIndex>, CodecError> {
    match index {
        -1 => Ok(None),
        i if i >= 0 => Ok(Some(CommandIndex::new(i as u64))),
        i => Err(CodecError::InvalidMessage(format!("negative command index {}", i))),
    }
}

pub(crate) fn lock_token_state_to_proto(state: &LockTokenState) -> ProtoLockTokenState {
    let token = state.token();
    ProtoLockTokenState {
        token: Some(ProtoLockToken {
            id: token.id(),
            owner: token.owner().map(|o| o.as_str().to_string()).unwrap_or_default(),
        }),
        ordinal: index_to_proto(state.ordinal()),
    }
}

pub(crate) fn lock_token_state_from_proto(proto: ProtoLockTokenState) -> Result<LockTokenState, CodecError> {
    let token = match proto.token {
        Some(ProtoLockToken { id, owner }) if owner.is_empty() => {
            if id != LockToken::INVALID_ID {
                return Err(CodecError::InvalidMessage(format!("lock token {} has no owner", id)));
            }
            LockToken::invalid()
        }
        Some(ProtoLockToken { id, owner }) => LockToken::new(id, MemberId::new(owner)),
        None => LockToken::invalid(),
    };

    Ok(LockTokenState::new(token, index_from_proto(proto.ordinal)?))
}

pub(crate) fn core_snapshot_to_proto(snapshot: &CoreSnapshot) -> ProtoCoreSnapshot {
    ProtoCoreSnapshot {
        prev_index: index_to_proto(snapshot.prev_index()),
        lock_token_state: Some(lock_token_state_to_proto(snapshot.lock_token_state())),
    }
}

pub(crate) fn core_snapshot_from_proto(proto: ProtoCoreSnapshot) -> Result<CoreSnapshot, CodecError> {
    let lock_token_state = match proto.lock_token_state {
        Some(state) => lock_token_state_from_proto(state)?,
        None => LockTokenState::default(),
    };

    Ok(CoreSnapshot::new(index_from_proto(proto.prev_index)?, lock_token_state))
}
