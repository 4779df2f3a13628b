//! Framing for the catchup protocol.
//!
//! A request is `u8 type | u32 length | body`. A response is a `u8` marker naming the response
//! type, followed by `u32 length | body`, except for file contents which follow a `FileChunk`
//! marker as a run of `u32 length | u8 last | bytes` chunks ending with the chunk flagged last.
//! Bodies are protobuf encoded. Both directions are half-duplex: one request is answered in full
//! before the next one is sent.

use crate::catchup::error::CodecError;
use crate::catchup::file_chunk::FileChunk;
use crate::catchup::messages::{
    CatchupRequest, CatchupResponse, FileHeader, GetStoreFileRequest, PrepareStoreCopyRequest,
    PrepareStoreCopyResponse, PrepareStoreCopyStatus, RequestMessageType, ResponseMessageType,
    StoreCopyFinishedResponse, StoreCopyStatus, TxPullRequest, TxPullResponse, TxStreamFinishedResponse,
    TxStreamStatus, CommittedTransaction,
};
use crate::wire;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use prost::Message;
use std::convert::TryFrom;
use tokio_util::codec::{Decoder, Encoder};

const LENGTH_BYTES: usize = 4;

/// ResponseFrame is what a server writes: a marker announcing the next response's type, or the
/// response itself.
#[derive(Debug)]
pub enum ResponseFrame {
    Marker(ResponseMessageType),
    Payload(CatchupResponse),
}

enum ServerState {
    MessageType,
    Request(RequestMessageType),
    /// A request has been handed out and is being answered.
    Handling,
}

/// ServerCodec decodes requests and encodes responses. After decoding a request it decodes
/// nothing more until `expect_message_type` is called by whoever finished answering it.
pub struct ServerCodec {
    state: ServerState,
    max_frame_bytes: usize,
}

impl ServerCodec {
    pub fn new(max_frame_bytes: usize) -> Self {
        ServerCodec {
            state: ServerState::MessageType,
            max_frame_bytes,
        }
    }

    /// Re-arms the decoder for the next request.
    pub fn expect_message_type(&mut self) {
        self.state = ServerState::MessageType;
    }

    pub fn is_handling(&self) -> bool {
        matches!(self.state, ServerState::Handling)
    }
}

impl Decoder for ServerCodec {
    type Item = CatchupRequest;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                ServerState::Handling => return Ok(None),
                ServerState::MessageType => {
                    if src.is_empty() {
                        return Ok(None);
                    }
                    let message_type = RequestMessageType::try_from(src.get_u8())?;
                    self.state = ServerState::Request(message_type);
                }
                ServerState::Request(message_type) => {
                    let body = match take_frame(src, self.max_frame_bytes)? {
                        Some(body) => body,
                        None => return Ok(None),
                    };
                    let request = decode_request(message_type, body)?;
                    self.state = ServerState::Handling;
                    return Ok(Some(request));
                }
            }
        }
    }
}

impl Encoder<ResponseFrame> for ServerCodec {
    type Error = CodecError;

    fn encode(&mut self, frame: ResponseFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match frame {
            ResponseFrame::Marker(message_type) => {
                dst.put_u8(message_type.tag());
                Ok(())
            }
            ResponseFrame::Payload(CatchupResponse::FileChunk(chunk)) => {
                check_frame_size(chunk.len(), self.max_frame_bytes)?;
                dst.reserve(LENGTH_BYTES + 1 + chunk.len());
                dst.put_u32(chunk.len() as u32);
                dst.put_u8(chunk.is_last() as u8);
                dst.put_slice(chunk.bytes());
                Ok(())
            }
            ResponseFrame::Payload(response) => {
                let body = encode_response(response)?;
                put_frame(dst, &body, self.max_frame_bytes)
            }
        }
    }
}

enum ClientState {
    MessageType,
    Response(ResponseMessageType),
    FileChunks,
}

/// ClientCodec encodes requests and decodes the responses to them.
pub struct ClientCodec {
    state: ClientState,
    max_frame_bytes: usize,
}

impl ClientCodec {
    pub fn new(max_frame_bytes: usize) -> Self {
        ClientCodec {
            state: ClientState::MessageType,
            max_frame_bytes,
        }
    }
}

impl Decoder for ClientCodec {
    type Item = CatchupResponse;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                ClientState::MessageType => {
                    if src.is_empty() {
                        return Ok(None);
                    }
                    match ResponseMessageType::try_from(src.get_u8())? {
                        ResponseMessageType::FileChunk => self.state = ClientState::FileChunks,
                        message_type => self.state = ClientState::Response(message_type),
                    }
                }
                ClientState::Response(message_type) => {
                    let body = match take_frame(src, self.max_frame_bytes)? {
                        Some(body) => body,
                        None => return Ok(None),
                    };
                    self.state = ClientState::MessageType;
                    return decode_response(message_type, body).map(Some);
                }
                ClientState::FileChunks => {
                    if src.len() < LENGTH_BYTES + 1 {
                        return Ok(None);
                    }
                    let length = peek_length(src);
                    check_frame_size(length, self.max_frame_bytes)?;
                    if src.len() < LENGTH_BYTES + 1 + length {
                        src.reserve(LENGTH_BYTES + 1 + length - src.len());
                        return Ok(None);
                    }

                    src.advance(LENGTH_BYTES);
                    let last = src.get_u8() != 0;
                    // Splitting hands out a view of the receive buffer without copying it.
                    let bytes = src.split_to(length).freeze();
                    if last {
                        self.state = ClientState::MessageType;
                    }
                    return Ok(Some(CatchupResponse::FileChunk(FileChunk::new(bytes, last))));
                }
            }
        }
    }
}

impl Encoder<CatchupRequest> for ClientCodec {
    type Error = CodecError;

    fn encode(&mut self, request: CatchupRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.put_u8(request.message_type().tag());
        let body = encode_request(request)?;
        put_frame(dst, &body, self.max_frame_bytes)
    }
}

fn check_frame_size(size: usize, max: usize) -> Result<(), CodecError> {
    if size > max {
        return Err(CodecError::FrameTooLarge { size, max });
    }
    Ok(())
}

fn peek_length(src: &BytesMut) -> usize {
    let mut length = [0u8; LENGTH_BYTES];
    length.copy_from_slice(&src[..LENGTH_BYTES]);
    u32::from_be_bytes(length) as usize
}

fn take_frame(src: &mut BytesMut, max_frame_bytes: usize) -> Result<Option<Bytes>, CodecError> {
    if src.len() < LENGTH_BYTES {
        return Ok(None);
    }
    let length = peek_length(src);
    check_frame_size(length, max_frame_bytes)?;
    if src.len() < LENGTH_BYTES + length {
        src.reserve(LENGTH_BYTES + length - src.len());
        return Ok(None);
    }

    src.advance(LENGTH_BYTES);
    Ok(Some(src.split_to(length).freeze()))
}

fn put_frame(dst: &mut BytesMut, body: &[u8], max_frame_bytes: usize) -> Result<(), CodecError> {
    check_frame_size(body.len(), max_frame_bytes)?;
    dst.reserve(LENGTH_BYTES + body.len());
    dst.put_u32(body.len() as u32);
    dst.put_slice(body);
    Ok(())
}

fn encode_request(request: CatchupRequest) -> Result<Vec<u8>, CodecError> {
    let body = match request {
        CatchupRequest::GetStoreId | CatchupRequest::CoreSnapshot => vec![],
        CatchupRequest::PrepareStoreCopy(r) => wire::encode_message(&wire::ProtoPrepareStoreCopyReq {
            store_id: Some(wire::store_id_to_proto(r.store_id())),
        })?,
        CatchupRequest::GetStoreFile(r) => wire::encode_message(&wire::ProtoGetStoreFileReq {
            store_id: Some(wire::store_id_to_proto(r.store_id)),
            file_name: r.file_name,
            required_tx_id: r.required_tx_id,
        })?,
        CatchupRequest::TxPull(r) => wire::encode_message(&wire::ProtoTxPullReq {
            store_id: Some(wire::store_id_to_proto(r.store_id)),
            previous_tx_id: r.previous_tx_id,
        })?,
    };
    Ok(body)
}

fn decode_request(message_type: RequestMessageType, body: Bytes) -> Result<CatchupRequest, CodecError> {
    let request = match message_type {
        RequestMessageType::GetStoreId => CatchupRequest::GetStoreId,
        RequestMessageType::CoreSnapshot => CatchupRequest::CoreSnapshot,
        RequestMessageType::PrepareStoreCopy => {
            let proto = wire::ProtoPrepareStoreCopyReq::decode(body)?;
            CatchupRequest::PrepareStoreCopy(PrepareStoreCopyRequest::new(wire::store_id_from_proto(
                proto.store_id,
            )?))
        }
        RequestMessageType::GetStoreFile => {
            let proto = wire::ProtoGetStoreFileReq::decode(body)?;
            CatchupRequest::GetStoreFile(GetStoreFileRequest {
                store_id: wire::store_id_from_proto(proto.store_id)?,
                file_name: proto.file_name,
                required_tx_id: proto.required_tx_id,
            })
        }
        RequestMessageType::TxPull => {
            let proto = wire::ProtoTxPullReq::decode(body)?;
            CatchupRequest::TxPull(TxPullRequest {
                store_id: wire::store_id_from_proto(proto.store_id)?,
                previous_tx_id: proto.previous_tx_id,
            })
        }
    };
    Ok(request)
}

fn encode_response(response: CatchupResponse) -> Result<Vec<u8>, CodecError> {
    let body = match response {
        CatchupResponse::StoreId(store_id) => wire::encode_message(&wire::ProtoGetStoreIdResp {
            store_id: Some(wire::store_id_to_proto(store_id)),
        })?,
        CatchupResponse::CoreSnapshot(snapshot) => wire::encode_message(&wire::core_snapshot_to_proto(&snapshot))?,
        CatchupResponse::PrepareStoreCopy(r) => wire::encode_message(&wire::ProtoPrepareStoreCopyResp {
            status: r.status.code(),
            files: r.files,
            last_tx_id: r.last_tx_id,
        })?,
        CatchupResponse::FileHeader(header) => wire::encode_message(&wire::ProtoFileHeader {
            file_name: header.file_name,
            required_alignment: header.required_alignment,
        })?,
        CatchupResponse::StoreCopyFinished(r) => wire::encode_message(&wire::ProtoStoreCopyFinished {
            status: r.status.code(),
            last_tx_id: r.last_tx_id,
        })?,
        CatchupResponse::TxPull(r) => {
            let store_id = r.store_id();
            let tx = r.into_tx();
            wire::encode_message(&wire::ProtoTxPullResp {
                store_id: Some(wire::store_id_to_proto(store_id)),
                tx_id: tx.tx_id,
                tx_payload: tx.payload.to_vec(),
            })?
        }
        CatchupResponse::TxStreamFinished(r) => wire::encode_message(&wire::ProtoTxStreamFinished {
            status: r.status.code(),
            latest_tx_id: r.latest_tx_id,
        })?,
        CatchupResponse::FileChunk(_) => {
            return Err(CodecError::InvalidMessage(
                "file chunks are not framed as messages".to_string(),
            ))
        }
    };
    Ok(body)
}

fn decode_response(message_type: ResponseMessageType, body: Bytes) -> Result<CatchupResponse, CodecError> {
    let response = match message_type {
        ResponseMessageType::StoreId => {
            let proto = wire::ProtoGetStoreIdResp::decode(body)?;
            CatchupResponse::StoreId(wire::store_id_from_proto(proto.store_id)?)
        }
        ResponseMessageType::CoreSnapshot => {
            let proto = wire::ProtoCoreSnapshot::decode(body)?;
            CatchupResponse::CoreSnapshot(wire::core_snapshot_from_proto(proto)?)
        }
        ResponseMessageType::PrepareStoreCopyResponse => {
            let proto = wire::ProtoPrepareStoreCopyResp::decode(body)?;
            CatchupResponse::PrepareStoreCopy(PrepareStoreCopyResponse {
                status: PrepareStoreCopyStatus::try_from(proto.status)?,
                files: proto.files,
                last_tx_id: proto.last_tx_id,
            })
        }
        ResponseMessageType::File => {
            let proto = wire::ProtoFileHeader::decode(body)?;
            CatchupResponse::FileHeader(FileHeader {
                file_name: proto.file_name,
                required_alignment: proto.required_alignment,
            })
        }
        ResponseMessageType::StoreCopyFinished => {
            let proto = wire::ProtoStoreCopyFinished::decode(body)?;
            CatchupResponse::StoreCopyFinished(StoreCopyFinishedResponse {
                status: StoreCopyStatus::try_from(proto.status)?,
                last_tx_id: proto.last_tx_id,
            })
        }
        ResponseMessageType::Tx => {
            let proto = wire::ProtoTxPullResp::decode(body)?;
            let tx = CommittedTransaction {
                tx_id: proto.tx_id,
                payload: Bytes::from(proto.tx_payload),
            };
            CatchupResponse::TxPull(TxPullResponse::new(wire::store_id_from_proto(proto.store_id)?, tx))
        }
        ResponseMessageType::TxStreamFinished => {
            let proto = wire::ProtoTxStreamFinished::decode(body)?;
            CatchupResponse::TxStreamFinished(TxStreamFinishedResponse {
                status: TxStreamStatus::try_from(proto.status)?,
                latest_tx_id: proto.latest_tx_id,
            })
        }
        ResponseMessageType::FileChunk => {
            return Err(CodecError::InvalidMessage(
                "file chunks are not framed as messages".to_string(),
            ))
        }
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StoreId;

    const MAX: usize = 1024;

    fn store_id() -> StoreId {
        StoreId::new(10, 20, 30, 40)
    }

    fn server_encode(frames: Vec<ResponseFrame>) -> BytesMut {
        let mut codec = ServerCodec::new(MAX);
        let mut buf = BytesMut::new();
        for frame in frames {
            codec.encode(frame, &mut buf).unwrap();
        }
        buf
    }

    #[test]
    fn server_decodes_one_request_at_a_time() {
        let mut client = ClientCodec::new(MAX);
        let mut buf = BytesMut::new();
        client.encode(CatchupRequest::GetStoreId, &mut buf).unwrap();
        client
            .encode(
                CatchupRequest::TxPull(TxPullRequest {
                    store_id: store_id(),
                    previous_tx_id: 17,
                }),
                &mut buf,
            )
            .unwrap();

        let mut server = ServerCodec::new(MAX);
        assert_eq!(server.decode(&mut buf).unwrap(), Some(CatchupRequest::GetStoreId));
        assert!(server.is_handling());

        // Second request is buffered but not handed out until the first one is answered.
        assert_eq!(server.decode(&mut buf).unwrap(), None);
        server.expect_message_type();
        assert_eq!(
            server.decode(&mut buf).unwrap(),
            Some(CatchupRequest::TxPull(TxPullRequest {
                store_id: store_id(),
                previous_tx_id: 17,
            }))
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_request_waits_for_more_bytes() {
        let mut client = ClientCodec::new(MAX);
        let mut full = BytesMut::new();
        let request = CatchupRequest::GetStoreFile(GetStoreFileRequest {
            store_id: store_id(),
            file_name: "neostore.nodestore.db".to_string(),
            required_tx_id: 3,
        });
        client.encode(request.clone(), &mut full).unwrap();

        let mut server = ServerCodec::new(MAX);
        let mut buf = BytesMut::new();
        let split = full.len() - 3;
        buf.extend_from_slice(&full[..split]);
        assert_eq!(server.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(&full[split..]);
        assert_eq!(server.decode(&mut buf).unwrap(), Some(request));
    }

    #[test]
    fn unknown_request_type_is_an_error() {
        let mut server = ServerCodec::new(MAX);
        let mut buf = BytesMut::from(&[99u8, 0, 0, 0, 0][..]);
        assert!(matches!(
            server.decode(&mut buf),
            Err(CodecError::UnknownMessageType(99))
        ));
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let mut server = ServerCodec::new(8);
        let mut buf = BytesMut::new();
        buf.put_u8(RequestMessageType::TxPull.tag());
        buf.put_u32(9);
        assert!(matches!(
            server.decode(&mut buf),
            Err(CodecError::FrameTooLarge { size: 9, max: 8 })
        ));
    }

    #[test]
    fn client_decodes_marked_responses() {
        let mut buf = server_encode(vec![
            ResponseFrame::Marker(ResponseMessageType::StoreId),
            ResponseFrame::Payload(CatchupResponse::StoreId(store_id())),
            ResponseFrame::Marker(ResponseMessageType::TxStreamFinished),
            ResponseFrame::Payload(CatchupResponse::TxStreamFinished(TxStreamFinishedResponse {
                status: TxStreamStatus::TransactionPruned,
                latest_tx_id: 5,
            })),
        ]);

        let mut client = ClientCodec::new(MAX);
        match client.decode(&mut buf).unwrap() {
            Some(CatchupResponse::StoreId(id)) => assert_eq!(id, store_id()),
            other => panic!("unexpected {:?}", other),
        }
        match client.decode(&mut buf).unwrap() {
            Some(CatchupResponse::TxStreamFinished(finished)) => {
                assert_eq!(finished.status, TxStreamStatus::TransactionPruned);
                assert_eq!(finished.latest_tx_id, 5);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(client.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn file_chunks_share_the_receive_buffer() {
        let mut buf = server_encode(vec![
            ResponseFrame::Marker(ResponseMessageType::FileChunk),
            ResponseFrame::Payload(CatchupResponse::FileChunk(FileChunk::new(Bytes::from_static(b"abc"), false))),
            ResponseFrame::Payload(CatchupResponse::FileChunk(FileChunk::new(Bytes::from_static(b"de"), true))),
            ResponseFrame::Marker(ResponseMessageType::StoreCopyFinished),
            ResponseFrame::Payload(CatchupResponse::StoreCopyFinished(StoreCopyFinishedResponse {
                status: StoreCopyStatus::Success,
                last_tx_id: 9,
            })),
        ]);
        let buffer_start = buf.as_ptr() as usize;
        let buffer_end = buffer_start + buf.len();

        let mut client = ClientCodec::new(MAX);
        let first = match client.decode(&mut buf).unwrap() {
            Some(CatchupResponse::FileChunk(chunk)) => chunk,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(first.bytes(), b"abc");
        assert!(!first.is_last());
        let address = first.bytes().as_ptr() as usize;
        assert!(address >= buffer_start && address < buffer_end);

        let second = match client.decode(&mut buf).unwrap() {
            Some(CatchupResponse::FileChunk(chunk)) => chunk,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(second.into_bytes(), Bytes::from_static(b"de"));

        match client.decode(&mut buf).unwrap() {
            Some(CatchupResponse::StoreCopyFinished(finished)) => assert_eq!(finished.last_tx_id, 9),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn empty_last_chunk_ends_the_file() {
        let mut buf = server_encode(vec![
            ResponseFrame::Marker(ResponseMessageType::FileChunk),
            ResponseFrame::Payload(CatchupResponse::FileChunk(FileChunk::new(Bytes::new(), true))),
        ]);

        let mut client = ClientCodec::new(MAX);
        match client.decode(&mut buf).unwrap() {
            Some(CatchupResponse::FileChunk(chunk)) => {
                assert!(chunk.is_empty());
                assert!(chunk.is_last());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(buf.is_empty());
    }
}
