//! Protocol negotiation, run once on every new connection before any application traffic.
//!
//! The initiator sends its offer, the responder answers with its selection or a rejection. Both
//! messages are a `u32` length followed by a protobuf body.

use crate::protocol::{ApplicationProtocol, ModifierProtocol, ProtocolStack, SupportedProtocols};
use crate::wire::{self, ProtoHandshakeReq, ProtoHandshakeResp, ProtoModifierChoice, ProtoModifierOffer};
use prost::Message;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const MAX_HANDSHAKE_BYTES: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("I/O error during handshake: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed handshake message: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("Failed to encode handshake message: {0}")]
    Encode(#[from] prost::EncodeError),
    #[error("Handshake message of {0} bytes is too large")]
    TooLarge(usize),
    #[error("No common version of application protocol '{0}'")]
    NoCommonVersion(String),
    #[error("Remote rejected application protocol '{0}'")]
    Rejected(String),
}

/// Offers `supported` to the remote and returns the stack it selected.
pub async fn initiate_handshake<S>(stream: &mut S, supported: &SupportedProtocols) -> Result<ProtocolStack, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = ProtoHandshakeReq {
        application_protocol: supported.application.identifier().to_string(),
        versions: supported.application.versions().iter().copied().collect(),
        modifiers: supported
            .modifiers
            .iter()
            .map(|m| ProtoModifierOffer {
                category: m.identifier().to_string(),
                implementations: m.versions().iter().cloned().collect(),
            })
            .collect(),
    };
    write_message(stream, &request).await?;

    let response: ProtoHandshakeResp = read_message(stream).await?;
    if !response.accepted {
        return Err(HandshakeError::Rejected(request.application_protocol));
    }

    Ok(ProtocolStack {
        application: ApplicationProtocol {
            identifier: response.application_protocol,
            version: response.version,
        },
        modifiers: response
            .modifiers
            .into_iter()
            .map(|m| ModifierProtocol {
                category: m.category,
                implementation: m.implementation,
            })
            .collect(),
    })
}

/// Reads the remote's offer and answers with the highest application version both sides speak,
/// plus the highest common implementation of every modifier category both sides know.
/// Categories without a common implementation are left out.
pub async fn respond_to_handshake<S>(
    stream: &mut S,
    supported: &SupportedProtocols,
) -> Result<ProtocolStack, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request: ProtoHandshakeReq = read_message(stream).await?;

    let version = if request.application_protocol == supported.application.identifier() {
        supported.application.highest_common(&request.versions)
    } else {
        None
    };
    let version = match version {
        Some(version) => version,
        None => {
            let rejection = ProtoHandshakeResp {
                accepted: false,
                application_protocol: request.application_protocol.clone(),
                version: 0,
                modifiers: vec![],
            };
            write_message(stream, &rejection).await?;
            return Err(HandshakeError::NoCommonVersion(request.application_protocol));
        }
    };

    let modifiers: Vec<ModifierProtocol> = request
        .modifiers
        .iter()
        .filter_map(|offer| {
            let local = supported.modifier(&offer.category)?;
            let implementation = local.highest_common(&offer.implementations)?;
            Some(ModifierProtocol {
                category: offer.category.clone(),
                implementation,
            })
        })
        .collect();

    let response = ProtoHandshakeResp {
        accepted: true,
        application_protocol: request.application_protocol.clone(),
        version,
        modifiers: modifiers
            .iter()
            .map(|m| ProtoModifierChoice {
                category: m.category.clone(),
                implementation: m.implementation.clone(),
            })
            .collect(),
    };
    write_message(stream, &response).await?;

    Ok(ProtocolStack {
        application: ApplicationProtocol {
            identifier: request.application_protocol,
            version,
        },
        modifiers,
    })
}

async fn write_message<S, M>(stream: &mut S, message: &M) -> Result<(), HandshakeError>
where
    S: AsyncWrite + Unpin,
    M: Message,
{
    let body = wire::encode_message(message)?;
    stream.write_u32(body.len() as u32).await?;
    stream.write_all(&body).await?;
    stream.flush().await?;
    Ok(())
}

async fn read_message<S, M>(stream: &mut S) -> Result<M, HandshakeError>
where
    S: AsyncRead + Unpin,
    M: Message + Default,
{
    let length = stream.read_u32().await? as usize;
    if length > MAX_HANDSHAKE_BYTES {
        return Err(HandshakeError::TooLarge(length));
    }
    let mut body = vec![0u8; length];
    stream.read_exact(&mut body).await?;
    Ok(M::decode(&body[..])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProtocolSelection;

    fn supported(versions: Vec<u32>, compression: Vec<&str>) -> SupportedProtocols {
        let modifiers = if compression.is_empty() {
            vec![]
        } else {
            vec![ProtocolSelection::new(
                "compression",
                compression.into_iter().map(String::from),
            )]
        };
        SupportedProtocols::new(ProtocolSelection::new("catchup", versions), modifiers)
    }

    #[tokio::test]
    async fn both_sides_agree_on_highest_common_stack() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let server_supported = supported(vec![1, 2], vec!["gzip", "lz4"]);
        let server_task = tokio::spawn(async move { respond_to_handshake(&mut server, &server_supported).await });

        let client_stack = initiate_handshake(&mut client, &supported(vec![1, 2, 3], vec!["lz4", "snappy"]))
            .await
            .unwrap();
        let server_stack = server_task.await.unwrap().unwrap();

        assert_eq!(client_stack, server_stack);
        assert_eq!(client_stack.application.version, 2);
        assert_eq!(
            client_stack.modifiers,
            vec![ModifierProtocol {
                category: "compression".to_string(),
                implementation: "lz4".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn disjoint_versions_are_rejected_on_both_sides() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let server_supported = supported(vec![3], vec![]);
        let server_task = tokio::spawn(async move { respond_to_handshake(&mut server, &server_supported).await });

        let client_result = initiate_handshake(&mut client, &supported(vec![1, 2], vec![])).await;
        assert!(matches!(client_result, Err(HandshakeError::Rejected(_))));
        assert!(matches!(
            server_task.await.unwrap(),
            Err(HandshakeError::NoCommonVersion(_))
        ));
    }

    #[tokio::test]
    async fn unknown_modifier_category_is_dropped() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let server_task = tokio::spawn(async move { respond_to_handshake(&mut server, &SupportedProtocols::catchup()).await });

        let stack = initiate_handshake(&mut client, &supported(vec![1], vec!["lz4"]))
            .await
            .unwrap();
        assert!(stack.modifiers.is_empty());
        assert_eq!(server_task.await.unwrap().unwrap(), stack);
    }
}
