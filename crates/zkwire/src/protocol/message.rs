// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message kinds, their payloads, and the per-type codec entry.
//!
//! The set of kinds is closed: a [`Message`] is a tagged union and callers
//! dispatch on it either with `match` or through a [`MessageVisitor`].

use std::fmt;

use super::buffer::{Buffer, BufferWriter, INT32_SIZE};
use super::{malformed, ProtocolResult};
use crate::watch::WatchEventKind;

/// Numeric identifier of a message type; a dense index into the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageTypeId(u16);

impl MessageTypeId {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Interpret a type id read from the wire. Negative or oversized ids
    /// have no representation.
    pub fn from_wire(raw: i32) -> Option<Self> {
        u16::try_from(raw).ok().map(Self)
    }

    pub fn to_wire(self) -> i32 {
        i32::from(self.0)
    }
}

impl From<u16> for MessageTypeId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl fmt::Display for MessageTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of message kinds understood by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    ConnectRequest,
    ConnectResponse,
    AuthRequest,
    AuthResponse,
    Ping,
    Pong,
    SetWatch,
    WatchNotification,
    CloseSession,
    ErrorResponse,
}

impl MessageKind {
    /// Every kind, in standard id order.
    pub const ALL: [MessageKind; 10] = [
        MessageKind::ConnectRequest,
        MessageKind::ConnectResponse,
        MessageKind::AuthRequest,
        MessageKind::AuthResponse,
        MessageKind::Ping,
        MessageKind::Pong,
        MessageKind::SetWatch,
        MessageKind::WatchNotification,
        MessageKind::CloseSession,
        MessageKind::ErrorResponse,
    ];

    /// Id assigned to this kind by [`Protocol::standard`](super::Protocol::standard).
    pub const fn standard_id(self) -> MessageTypeId {
        MessageTypeId(match self {
            MessageKind::ConnectRequest => 0,
            MessageKind::ConnectResponse => 1,
            MessageKind::AuthRequest => 2,
            MessageKind::AuthResponse => 3,
            MessageKind::Ping => 4,
            MessageKind::Pong => 5,
            MessageKind::SetWatch => 6,
            MessageKind::WatchNotification => 7,
            MessageKind::CloseSession => 8,
            MessageKind::ErrorResponse => 9,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            MessageKind::ConnectRequest => "ConnectRequest",
            MessageKind::ConnectResponse => "ConnectResponse",
            MessageKind::AuthRequest => "AuthRequest",
            MessageKind::AuthResponse => "AuthResponse",
            MessageKind::Ping => "Ping",
            MessageKind::Pong => "Pong",
            MessageKind::SetWatch => "SetWatch",
            MessageKind::WatchNotification => "WatchNotification",
            MessageKind::CloseSession => "CloseSession",
            MessageKind::ErrorResponse => "ErrorResponse",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Session request sent right after the transport opens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectRequest {
    pub protocol_version: i32,
    pub last_zxid_seen: i64,
    pub timeout_ms: i32,
    /// Zero asks the server for a new session.
    pub session_id: i64,
    pub password: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectResponse {
    pub protocol_version: i32,
    /// Session timeout granted by the server.
    pub timeout_ms: i32,
    pub session_id: i64,
    pub password: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthRequest {
    pub scheme: String,
    pub credentials: Vec<u8>,
}

/// Zero means the credentials were accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthResponse {
    pub code: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SetWatch {
    pub path: String,
}

/// Server-pushed change on a watched path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchNotification {
    pub kind: WatchEventKind,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorResponse {
    pub code: i32,
    pub message: String,
}

/// Encoding of one payload layout.
trait Payload: Sized {
    fn encode_into(&self, writer: &mut BufferWriter) -> ProtocolResult<()>;
    fn decode_from(buffer: &mut Buffer<'_>) -> ProtocolResult<Self>;
}

impl Payload for ConnectRequest {
    fn encode_into(&self, writer: &mut BufferWriter) -> ProtocolResult<()> {
        writer.write_i32(self.protocol_version);
        writer.write_i64(self.last_zxid_seen);
        writer.write_i32(self.timeout_ms);
        writer.write_i64(self.session_id);
        writer.write_length_prefixed(&self.password)
    }

    fn decode_from(buffer: &mut Buffer<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            protocol_version: buffer.read_i32()?,
            last_zxid_seen: buffer.read_i64()?,
            timeout_ms: buffer.read_i32()?,
            session_id: buffer.read_i64()?,
            password: buffer.read_length_prefixed()?.to_vec(),
        })
    }
}

impl Payload for ConnectResponse {
    fn encode_into(&self, writer: &mut BufferWriter) -> ProtocolResult<()> {
        writer.write_i32(self.protocol_version);
        writer.write_i32(self.timeout_ms);
        writer.write_i64(self.session_id);
        writer.write_length_prefixed(&self.password)
    }

    fn decode_from(buffer: &mut Buffer<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            protocol_version: buffer.read_i32()?,
            timeout_ms: buffer.read_i32()?,
            session_id: buffer.read_i64()?,
            password: buffer.read_length_prefixed()?.to_vec(),
        })
    }
}

impl Payload for AuthRequest {
    fn encode_into(&self, writer: &mut BufferWriter) -> ProtocolResult<()> {
        writer.write_string(&self.scheme)?;
        writer.write_length_prefixed(&self.credentials)
    }

    fn decode_from(buffer: &mut Buffer<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            scheme: buffer.read_string()?,
            credentials: buffer.read_length_prefixed()?.to_vec(),
        })
    }
}

impl Payload for AuthResponse {
    fn encode_into(&self, writer: &mut BufferWriter) -> ProtocolResult<()> {
        writer.write_i32(self.code);
        Ok(())
    }

    fn decode_from(buffer: &mut Buffer<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            code: buffer.read_i32()?,
        })
    }
}

impl Payload for SetWatch {
    fn encode_into(&self, writer: &mut BufferWriter) -> ProtocolResult<()> {
        writer.write_string(&self.path)
    }

    fn decode_from(buffer: &mut Buffer<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            path: buffer.read_string()?,
        })
    }
}

impl Payload for WatchNotification {
    fn encode_into(&self, writer: &mut BufferWriter) -> ProtocolResult<()> {
        writer.write_i32(self.kind.to_wire());
        writer.write_string(&self.path)
    }

    fn decode_from(buffer: &mut Buffer<'_>) -> ProtocolResult<Self> {
        let code = buffer.read_i32()?;
        let kind = WatchEventKind::from_wire(code)
            .ok_or_else(|| malformed(format!("unknown watch event kind {}", code)))?;
        Ok(Self {
            kind,
            path: buffer.read_string()?,
        })
    }
}

impl Payload for ErrorResponse {
    fn encode_into(&self, writer: &mut BufferWriter) -> ProtocolResult<()> {
        writer.write_i32(self.code);
        writer.write_string(&self.message)
    }

    fn decode_from(buffer: &mut Buffer<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            code: buffer.read_i32()?,
            message: buffer.read_string()?,
        })
    }
}

// ============================================================================
// Message
// ============================================================================

/// A decoded wire message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    ConnectRequest(ConnectRequest),
    ConnectResponse(ConnectResponse),
    AuthRequest(AuthRequest),
    AuthResponse(AuthResponse),
    Ping,
    Pong,
    SetWatch(SetWatch),
    WatchNotification(WatchNotification),
    CloseSession,
    ErrorResponse(ErrorResponse),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::ConnectRequest(_) => MessageKind::ConnectRequest,
            Message::ConnectResponse(_) => MessageKind::ConnectResponse,
            Message::AuthRequest(_) => MessageKind::AuthRequest,
            Message::AuthResponse(_) => MessageKind::AuthResponse,
            Message::Ping => MessageKind::Ping,
            Message::Pong => MessageKind::Pong,
            Message::SetWatch(_) => MessageKind::SetWatch,
            Message::WatchNotification(_) => MessageKind::WatchNotification,
            Message::CloseSession => MessageKind::CloseSession,
            Message::ErrorResponse(_) => MessageKind::ErrorResponse,
        }
    }

    /// Dispatch to the visitor method matching this message.
    pub fn accept<V: MessageVisitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            Message::ConnectRequest(m) => visitor.visit_connect_request(m),
            Message::ConnectResponse(m) => visitor.visit_connect_response(m),
            Message::AuthRequest(m) => visitor.visit_auth_request(m),
            Message::AuthResponse(m) => visitor.visit_auth_response(m),
            Message::Ping => visitor.visit_ping(),
            Message::Pong => visitor.visit_pong(),
            Message::SetWatch(m) => visitor.visit_set_watch(m),
            Message::WatchNotification(m) => visitor.visit_watch_notification(m),
            Message::CloseSession => visitor.visit_close_session(),
            Message::ErrorResponse(m) => visitor.visit_error_response(m),
        }
    }

    fn encode_payload(&self, writer: &mut BufferWriter) -> ProtocolResult<()> {
        match self {
            Message::ConnectRequest(m) => m.encode_into(writer),
            Message::ConnectResponse(m) => m.encode_into(writer),
            Message::AuthRequest(m) => m.encode_into(writer),
            Message::AuthResponse(m) => m.encode_into(writer),
            Message::SetWatch(m) => m.encode_into(writer),
            Message::WatchNotification(m) => m.encode_into(writer),
            Message::ErrorResponse(m) => m.encode_into(writer),
            Message::Ping | Message::Pong | Message::CloseSession => Ok(()),
        }
    }
}

/// Type-safe dispatch over [`Message`].
///
/// Every method defaults to [`visit_unhandled`](Self::visit_unhandled), so
/// implementors only override the kinds they care about.
pub trait MessageVisitor {
    fn visit_unhandled(&mut self, _kind: MessageKind) {}

    fn visit_connect_request(&mut self, _msg: &ConnectRequest) {
        self.visit_unhandled(MessageKind::ConnectRequest);
    }

    fn visit_connect_response(&mut self, _msg: &ConnectResponse) {
        self.visit_unhandled(MessageKind::ConnectResponse);
    }

    fn visit_auth_request(&mut self, _msg: &AuthRequest) {
        self.visit_unhandled(MessageKind::AuthRequest);
    }

    fn visit_auth_response(&mut self, _msg: &AuthResponse) {
        self.visit_unhandled(MessageKind::AuthResponse);
    }

    fn visit_ping(&mut self) {
        self.visit_unhandled(MessageKind::Ping);
    }

    fn visit_pong(&mut self) {
        self.visit_unhandled(MessageKind::Pong);
    }

    fn visit_set_watch(&mut self, _msg: &SetWatch) {
        self.visit_unhandled(MessageKind::SetWatch);
    }

    fn visit_watch_notification(&mut self, _msg: &WatchNotification) {
        self.visit_unhandled(MessageKind::WatchNotification);
    }

    fn visit_close_session(&mut self) {
        self.visit_unhandled(MessageKind::CloseSession);
    }

    fn visit_error_response(&mut self, _msg: &ErrorResponse) {
        self.visit_unhandled(MessageKind::ErrorResponse);
    }
}

// ============================================================================
// MessageType
// ============================================================================

/// A registered codec entry: one kind bound to one wire id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageType {
    id: MessageTypeId,
    kind: MessageKind,
}

impl MessageType {
    pub fn new(id: impl Into<MessageTypeId>, kind: MessageKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// The entry for `kind` at its standard id.
    pub fn standard(kind: MessageKind) -> Self {
        Self::new(kind.standard_id(), kind)
    }

    pub fn id(&self) -> MessageTypeId {
        self.id
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Encode `message` as `[type id: i32 BE][payload]`.
    pub fn encode(&self, message: &Message) -> ProtocolResult<Vec<u8>> {
        if message.kind() != self.kind {
            return Err(malformed(format!(
                "{} message cannot be encoded as type {} ({})",
                message.kind(),
                self.id,
                self.kind
            )));
        }
        let mut writer = BufferWriter::with_capacity(INT32_SIZE + 32);
        writer.write_i32(self.id.to_wire());
        message.encode_payload(&mut writer)?;
        Ok(writer.into_inner())
    }

    /// Decode a payload whose type id has already been stripped.
    ///
    /// The payload must be consumed exactly.
    pub fn decode(&self, payload: &[u8]) -> ProtocolResult<Message> {
        let mut buffer = Buffer::new(payload);
        let message = match self.kind {
            MessageKind::ConnectRequest => {
                Message::ConnectRequest(ConnectRequest::decode_from(&mut buffer)?)
            }
            MessageKind::ConnectResponse => {
                Message::ConnectResponse(ConnectResponse::decode_from(&mut buffer)?)
            }
            MessageKind::AuthRequest => {
                Message::AuthRequest(AuthRequest::decode_from(&mut buffer)?)
            }
            MessageKind::AuthResponse => {
                Message::AuthResponse(AuthResponse::decode_from(&mut buffer)?)
            }
            MessageKind::Ping => Message::Ping,
            MessageKind::Pong => Message::Pong,
            MessageKind::SetWatch => Message::SetWatch(SetWatch::decode_from(&mut buffer)?),
            MessageKind::WatchNotification => {
                Message::WatchNotification(WatchNotification::decode_from(&mut buffer)?)
            }
            MessageKind::CloseSession => Message::CloseSession,
            MessageKind::ErrorResponse => {
                Message::ErrorResponse(ErrorResponse::decode_from(&mut buffer)?)
            }
        };
        buffer.expect_exhausted()?;
        Ok(message)
    }
}
