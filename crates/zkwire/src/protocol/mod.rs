// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary wire protocol.
//!
//! # Wire Format
//!
//! Every message travels in a length-prefixed frame (see [`frame_codec`]).
//! The frame body starts with the message type id, followed by the
//! type-specific payload. All integers are big-endian:
//!
//! ```text
//! +----------------+-------------------+------------------------+
//! | Length (4B BE) | Type id (i32 BE)  | Payload                |
//! +----------------+-------------------+------------------------+
//!                  |<------- Protocol::encode / decode ------->|
//! ```
//!
//! # Registry
//!
//! A [`Protocol`] is a dense table indexed by [`MessageTypeId`]. Ids that
//! were never registered hold an invalid-type sentinel, so decoding them
//! fails with [`ProtocolError::InvalidMessageType`], while ids past the end
//! of the table fail with [`ProtocolError::NoSuchMessageType`].
//!
//! ```
//! use zkwire::protocol::{Message, Protocol};
//!
//! let protocol = Protocol::standard();
//! let bytes = protocol.encode(&Message::Ping).unwrap();
//! assert_eq!(protocol.decode(&bytes).unwrap(), Message::Ping);
//! ```

pub mod buffer;
pub mod frame_codec;
pub mod message;
pub mod registry;

pub use buffer::{Buffer, BufferWriter};
pub use frame_codec::{FrameCodec, DEFAULT_MAX_MESSAGE_SIZE, FRAME_HEADER_SIZE};
pub use message::{
    AuthRequest, AuthResponse, ConnectRequest, ConnectResponse, ErrorResponse, Message,
    MessageKind, MessageType, MessageTypeId, MessageVisitor, SetWatch, WatchNotification,
};
pub use registry::{Builder, Protocol};

use std::fmt;

/// Codec error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A read would move the cursor past the end of the buffer.
    BoundsViolation {
        offset: usize,
        requested: usize,
        available: usize,
    },
    /// The type id lies outside the registry.
    NoSuchMessageType(i32),
    /// The type id is inside the registry but no type was registered for it.
    InvalidMessageType(MessageTypeId),
    /// The message kind has no registered type in this protocol.
    UnregisteredKind(MessageKind),
    /// The payload does not match the layout of its message type.
    Malformed { reason: String },
    /// A frame header announced more bytes than the configured limit.
    FrameTooLarge { len: usize, max: usize },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::BoundsViolation {
                offset,
                requested,
                available,
            } => write!(
                f,
                "read of {} byte(s) at offset {} exceeds buffer ({} available)",
                requested, offset, available
            ),
            ProtocolError::NoSuchMessageType(id) => {
                write!(f, "protocol does not know any message with id: {}", id)
            }
            ProtocolError::InvalidMessageType(id) => {
                write!(f, "message type {} is invalid", id)
            }
            ProtocolError::UnregisteredKind(kind) => {
                write!(f, "message kind {} is not registered", kind)
            }
            ProtocolError::Malformed { reason } => write!(f, "malformed message: {}", reason),
            ProtocolError::FrameTooLarge { len, max } => {
                write!(f, "frame too large: {} bytes (max {})", len, max)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

pub type ProtocolResult<T> = core::result::Result<T, ProtocolError>;

pub(crate) fn malformed(reason: impl Into<String>) -> ProtocolError {
    ProtocolError::Malformed {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::BoundsViolation {
            offset: 2,
            requested: 4,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "read of 4 byte(s) at offset 2 exceeds buffer (1 available)"
        );

        assert_eq!(
            ProtocolError::NoSuchMessageType(42).to_string(),
            "protocol does not know any message with id: 42"
        );
        assert_eq!(
            ProtocolError::InvalidMessageType(MessageTypeId::new(3)).to_string(),
            "message type 3 is invalid"
        );
        assert_eq!(
            ProtocolError::UnregisteredKind(MessageKind::Ping).to_string(),
            "message kind Ping is not registered"
        );
    }
}
