//! Message encoding and decoding for the peer transport.
//!
//! # Wire Format
//!
//! ```text
//! [version: u8][payload: SBOR-encoded ConsensusMessage]
//! ```
//!
//! - Version is currently `1`
//! - The payload is the SBOR encoding of [`ConsensusMessage`]; the enum tag
//!   carries the message type, so no separate routing field is needed
//!
//! Frames on the socket are additionally length-prefixed by the transport.

use pbft_core::Event;
use pbft_types::ConsensusMessage;
use sbor::prelude::{basic_decode, basic_encode};
use thiserror::Error;

/// Current wire format version.
pub const WIRE_VERSION: u8 = 1;

/// Upper bound on a decoded frame. Consensus messages are small; anything
/// near this size is garbage or abuse.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Errors that can occur during message encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The version byte is not one we speak.
    #[error("unknown wire version: {0}")]
    UnknownVersion(u8),

    /// The frame is too short to carry a version byte.
    #[error("message too short")]
    MessageTooShort,

    /// SBOR decoding failed.
    #[error("SBOR decode error: {0}")]
    Decode(String),

    /// SBOR encoding failed.
    #[error("SBOR encode error: {0}")]
    Encode(String),
}

/// Encode an outbound message to wire format.
pub fn encode_message(message: &ConsensusMessage) -> Result<Vec<u8>, CodecError> {
    let payload = basic_encode(message).map_err(|e| CodecError::Encode(format!("{e:?}")))?;

    let mut bytes = Vec::with_capacity(1 + payload.len());
    bytes.push(WIRE_VERSION);
    bytes.extend(payload);
    Ok(bytes)
}

/// Decode a frame into the event the receiving node should handle.
pub fn decode_message(data: &[u8]) -> Result<Event, CodecError> {
    let Some((&version, payload)) = data.split_first() else {
        return Err(CodecError::MessageTooShort);
    };
    if version != WIRE_VERSION {
        return Err(CodecError::UnknownVersion(version));
    }

    let message: ConsensusMessage =
        basic_decode(payload).map_err(|e| CodecError::Decode(format!("{e:?}")))?;
    Ok(Event::from(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbft_types::{Hash, NodeId, PrepareMsg, SequenceNumber, ViewNumber};

    fn prepare() -> ConsensusMessage {
        ConsensusMessage::Prepare(PrepareMsg {
            view: ViewNumber(0),
            sequence: SequenceNumber(4),
            digest: Hash::from_bytes(b"digest"),
            sender: NodeId::from("node2"),
        })
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let message = prepare();
        let bytes = encode_message(&message).unwrap();
        assert_eq!(bytes[0], WIRE_VERSION);

        match decode_message(&bytes).unwrap() {
            Event::PrepareReceived { vote } => {
                assert_eq!(vote.sequence, SequenceNumber(4));
                assert_eq!(vote.sender, NodeId::from("node2"));
            }
            other => panic!("unexpected event {}", other.type_name()),
        }
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut bytes = encode_message(&prepare()).unwrap();
        bytes[0] = 99;
        assert!(matches!(
            decode_message(&bytes),
            Err(CodecError::UnknownVersion(99))
        ));
    }

    #[test]
    fn test_empty_frame_rejected() {
        assert!(matches!(
            decode_message(&[]),
            Err(CodecError::MessageTooShort)
        ));
    }

    #[test]
    fn test_garbage_payload_rejected() {
        let bytes = [WIRE_VERSION, 0xde, 0xad, 0xbe, 0xef];
        assert!(matches!(decode_message(&bytes), Err(CodecError::Decode(_))));
    }
}
