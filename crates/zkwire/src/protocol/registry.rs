// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dense, id-indexed message type registry.

use std::collections::HashMap;

use super::buffer::Buffer;
use super::message::{Message, MessageKind, MessageType, MessageTypeId};
use super::{ProtocolError, ProtocolResult};

/// One registry slot. Gaps between registered ids hold `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Registered(MessageType),
    Invalid(MessageTypeId),
}

impl Slot {
    fn message_type(&self) -> ProtocolResult<&MessageType> {
        match self {
            Slot::Registered(ty) => Ok(ty),
            Slot::Invalid(id) => Err(ProtocolError::InvalidMessageType(*id)),
        }
    }
}

/// Accumulates registrations before freezing them into a [`Protocol`].
///
/// ```
/// use zkwire::protocol::{Builder, MessageKind, MessageType};
///
/// let protocol = Builder::new()
///     .register_message_type(MessageType::new(0u16, MessageKind::Ping))
///     .register_message_type(MessageType::new(2u16, MessageKind::Pong))
///     .create_protocol();
/// assert_eq!(protocol.len(), 3);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Builder {
    message_types: HashMap<MessageTypeId, MessageType>,
    highest_type_id: Option<MessageTypeId>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ty` at its id. A later registration for the same id
    /// replaces the earlier one.
    #[must_use]
    pub fn register_message_type(mut self, ty: MessageType) -> Self {
        let id = ty.id();
        if self.highest_type_id.map_or(true, |highest| id > highest) {
            self.highest_type_id = Some(id);
        }
        if let Some(previous) = self.message_types.insert(id, ty) {
            log::debug!(
                "[protocol] id {} re-registered: {} replaced by {}",
                id,
                previous.kind(),
                ty.kind()
            );
        }
        self
    }

    /// Register every [`MessageKind`] at its standard id.
    #[must_use]
    pub fn register_standard_types(self) -> Self {
        MessageKind::ALL
            .iter()
            .fold(self, |builder, kind| {
                builder.register_message_type(MessageType::standard(*kind))
            })
    }

    /// Freeze into a table of `highest id + 1` slots.
    pub fn create_protocol(mut self) -> Protocol {
        let len = self.highest_type_id.map_or(0, |id| id.index() + 1);
        let mut message_types = Vec::with_capacity(len);
        for index in 0..len {
            // index < len <= u16::MAX + 1
            let id = MessageTypeId::new(index as u16);
            let slot = match self.message_types.remove(&id) {
                Some(ty) => Slot::Registered(ty),
                None => Slot::Invalid(id),
            };
            message_types.push(slot);
        }

        let mut ids_by_kind = HashMap::new();
        for slot in &message_types {
            if let Slot::Registered(ty) = slot {
                ids_by_kind.entry(ty.kind()).or_insert(ty.id());
            }
        }

        Protocol {
            message_types,
            ids_by_kind,
        }
    }
}

/// Frozen registry; immutable and shareable across threads.
#[derive(Debug, Clone)]
pub struct Protocol {
    message_types: Vec<Slot>,
    /// Kind to id for encoding; the lowest id wins when a kind is
    /// registered more than once.
    ids_by_kind: HashMap<MessageKind, MessageTypeId>,
}

impl Protocol {
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Protocol with every kind at its standard id.
    pub fn standard() -> Self {
        Builder::new().register_standard_types().create_protocol()
    }

    /// Number of slots, registered or not.
    pub fn len(&self) -> usize {
        self.message_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.message_types.is_empty()
    }

    /// Look up the entry at `id`.
    pub fn message_type(&self, id: MessageTypeId) -> ProtocolResult<&MessageType> {
        self.message_types
            .get(id.index())
            .ok_or(ProtocolError::NoSuchMessageType(id.to_wire()))?
            .message_type()
    }

    /// The entry used to encode `message`.
    pub fn message_type_of(&self, message: &Message) -> ProtocolResult<&MessageType> {
        let kind = message.kind();
        let id = self
            .ids_by_kind
            .get(&kind)
            .ok_or(ProtocolError::UnregisteredKind(kind))?;
        self.message_type(*id)
    }

    /// Decode `[type id: i32 BE][payload]`.
    pub fn decode(&self, packet: &[u8]) -> ProtocolResult<Message> {
        let mut buffer = Buffer::new(packet);
        let raw = buffer.read_i32()?;
        let ty = match MessageTypeId::from_wire(raw) {
            Some(id) if id.index() < self.message_types.len() => self.message_type(id)?,
            _ => return Err(ProtocolError::NoSuchMessageType(raw)),
        };
        ty.decode(buffer.read_remaining_bytes())
    }

    /// Encode `message` with its type id prefix; the output is a valid
    /// input to [`decode`](Self::decode).
    pub fn encode(&self, message: &Message) -> ProtocolResult<Vec<u8>> {
        self.message_type_of(message)?.encode(message)
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Self::standard()
    }
}
