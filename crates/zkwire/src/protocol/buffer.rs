// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read/write cursors for wire payloads.
//!
//! [`Buffer`] borrows the received bytes and only moves forward. Every read
//! is all-or-nothing: a read that would pass the end returns
//! [`ProtocolError::BoundsViolation`] and leaves the cursor where it was.

use super::{malformed, ProtocolError, ProtocolResult};

/// Size of an `i32` on the wire.
pub const INT32_SIZE: usize = 4;

/// Size of an `i64` on the wire.
pub const INT64_SIZE: usize = 8;

/// Length marker for an absent byte sequence.
const NULL_LENGTH: i32 = -1;

/// Generate big-endian read methods for primitive types.
macro_rules! impl_read_be {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> ProtocolResult<$type> {
            let mut raw = [0u8; $size];
            raw.copy_from_slice(self.read_bytes($size)?);
            Ok(<$type>::from_be_bytes(raw))
        }
    };
}

/// Generate big-endian write methods for primitive types.
macro_rules! impl_write_be {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) {
            self.bytes.extend_from_slice(&value.to_be_bytes());
        }
    };
}

/// Immutable cursor for reading (bounds-checked, zero-copy)
#[derive(Debug, Clone)]
pub struct Buffer<'a> {
    bytes: &'a [u8],
    index: usize,
}

impl<'a> Buffer<'a> {
    /// Wrap `bytes` without copying.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, index: 0 }
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.index
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.bytes.len()
    }

    /// Return the next `length` bytes and advance past them.
    pub fn read_bytes(&mut self, length: usize) -> ProtocolResult<&'a [u8]> {
        let end = self
            .index
            .checked_add(length)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(ProtocolError::BoundsViolation {
                offset: self.index,
                requested: length,
                available: self.remaining(),
            })?;
        let slice = &self.bytes[self.index..end];
        self.index = end;
        Ok(slice)
    }

    /// Return everything after the cursor and move the cursor to the end.
    ///
    /// A second call returns an empty slice.
    pub fn read_remaining_bytes(&mut self) -> &'a [u8] {
        let remaining = &self.bytes[self.index..];
        self.index = self.bytes.len();
        remaining
    }

    impl_read_be!(read_u8, u8, 1);
    impl_read_be!(read_i32, i32, INT32_SIZE);
    impl_read_be!(read_i64, i64, INT64_SIZE);

    pub fn read_bool(&mut self) -> ProtocolResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(malformed(format!("invalid boolean byte {:#04x}", other))),
        }
    }

    /// Read an `i32` length followed by that many bytes.
    ///
    /// A length of -1 denotes an absent sequence and reads as empty.
    pub fn read_length_prefixed(&mut self) -> ProtocolResult<&'a [u8]> {
        let start = self.index;
        let length = self.read_i32()?;
        if length == NULL_LENGTH {
            return Ok(&[]);
        }
        let length = usize::try_from(length).map_err(|_| {
            self.index = start;
            malformed(format!("negative length {}", length))
        })?;
        self.read_bytes(length).map_err(|e| {
            self.index = start;
            e
        })
    }

    pub fn read_string(&mut self) -> ProtocolResult<String> {
        let bytes = self.read_length_prefixed()?;
        String::from_utf8(bytes.to_vec()).map_err(|e| malformed(format!("invalid UTF-8: {}", e)))
    }

    /// Fail if any byte is left unread.
    pub fn expect_exhausted(&self) -> ProtocolResult<()> {
        if self.is_exhausted() {
            Ok(())
        } else {
            Err(malformed(format!(
                "{} trailing byte(s) after payload",
                self.remaining()
            )))
        }
    }
}

/// Growable writer producing wire payloads.
#[derive(Debug, Default, Clone)]
pub struct BufferWriter {
    bytes: Vec<u8>,
}

impl BufferWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    impl_write_be!(write_u8, u8);
    impl_write_be!(write_i32, i32);
    impl_write_be!(write_i64, i64);

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    /// Append raw bytes with no length prefix.
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// Append an `i32` length followed by `data`.
    pub fn write_length_prefixed(&mut self, data: &[u8]) -> ProtocolResult<()> {
        let length = i32::try_from(data.len())
            .map_err(|_| malformed(format!("{} bytes exceed the i32 length field", data.len())))?;
        self.write_i32(length);
        self.write_bytes(data);
        Ok(())
    }

    pub fn write_string(&mut self, value: &str) -> ProtocolResult<()> {
        self.write_length_prefixed(value.as_bytes())
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}
