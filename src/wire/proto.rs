//! Message bodies as they travel between members and as they sit on disk.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoStoreId {
    #[prost(int64, tag = "1")]
    pub creation_time: i64,
    #[prost(int64, tag = "2")]
    pub random_id: i64,
    #[prost(int64, tag = "3")]
    pub upgrade_time: i64,
    #[prost(int64, tag = "4")]
    pub upgrade_id: i64,
}

// ------- State --------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLockToken {
    #[prost(int64, tag = "1")]
    pub id: i64,
    /// Empty when nobody holds the token.
    #[prost(string, tag = "2")]
    pub owner: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLockTokenState {
    #[prost(message, optional, tag = "1")]
    pub token: Option<ProtoLockToken>,
    /// -1 when no command was ever accepted.
    #[prost(int64, tag = "2")]
    pub ordinal: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCoreSnapshot {
    /// -1 when nothing was ever applied.
    #[prost(int64, tag = "1")]
    pub prev_index: i64,
    #[prost(message, optional, tag = "2")]
    pub lock_token_state: Option<ProtoLockTokenState>,
}

// ------- Requests --------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPrepareStoreCopyReq {
    #[prost(message, optional, tag = "1")]
    pub store_id: Option<ProtoStoreId>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoGetStoreFileReq {
    #[prost(message, optional, tag = "1")]
    pub store_id: Option<ProtoStoreId>,
    #[prost(string, tag = "2")]
    pub file_name: String,
    #[prost(int64, tag = "3")]
    pub required_tx_id: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoTxPullReq {
    #[prost(message, optional, tag = "1")]
    pub store_id: Option<ProtoStoreId>,
    #[prost(int64, tag = "2")]
    pub previous_tx_id: i64,
}

// ------- Responses --------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoGetStoreIdResp {
    #[prost(message, optional, tag = "1")]
    pub store_id: Option<ProtoStoreId>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPrepareStoreCopyResp {
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(string, repeated, tag = "2")]
    pub files: Vec<String>,
    #[prost(int64, tag = "3")]
    pub last_tx_id: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoFileHeader {
    #[prost(string, tag = "1")]
    pub file_name: String,
    #[prost(int32, tag = "2")]
    pub required_alignment: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoStoreCopyFinished {
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(int64, tag = "2")]
    pub last_tx_id: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoTxPullResp {
    #[prost(message, optional, tag = "1")]
    pub store_id: Option<ProtoStoreId>,
    #[prost(int64, tag = "2")]
    pub tx_id: i64,
    #[prost(bytes, tag = "3")]
    pub tx_payload: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoTxStreamFinished {
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(int64, tag = "2")]
    pub latest_tx_id: i64,
}

// ------- Handshake --------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoModifierOffer {
    #[prost(string, tag = "1")]
    pub category: String,
    #[prost(string, repeated, tag = "2")]
    pub implementations: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoHandshakeReq {
    #[prost(string, tag = "1")]
    pub application_protocol: String,
    #[prost(uint32, repeated, tag = "2")]
    pub versions: Vec<u32>,
    #[prost(message, repeated, tag = "3")]
    pub modifiers: Vec<ProtoModifierOffer>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoModifierChoice {
    #[prost(string, tag = "1")]
    pub category: String,
    #[prost(string, tag = "2")]
    pub implementation: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoHandshakeResp {
    #[prost(bool, tag = "1")]
    pub accepted: bool,
    #[prost(string, tag = "2")]
    pub application_protocol: String,
    #[prost(uint32, tag = "3")]
    pub version: u32,
    #[prost(message, repeated, tag = "4")]
    pub modifiers: Vec<ProtoModifierChoice>,
}
