// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Length-prefix framing for protocol messages on a byte stream.
//!
//! ```text
//! +----------------+-----------------------------------+
//! | Length (4B BE) | Message body (type id + payload)  |
//! +----------------+-----------------------------------+
//! ```
//!
//! The length excludes the 4-byte header. Decoding is incremental: a read
//! timeout in the middle of a frame keeps the partial state, and the next
//! call resumes where the previous one stopped.
//!
//! ```
//! use zkwire::protocol::FrameCodec;
//!
//! let frame = FrameCodec::encode(b"\x00\x00\x00\x04").unwrap();
//! let mut codec = FrameCodec::with_default_max();
//! let body = codec.decode(&mut &frame[..]).unwrap();
//! assert_eq!(body.as_deref(), Some(&b"\x00\x00\x00\x04"[..]));
//! ```

use std::io::{self, Read, Write};

use super::{ProtocolError, ProtocolResult};

/// Frame header size (4 bytes for length).
pub const FRAME_HEADER_SIZE: usize = 4;

/// Default maximum message size (16 MB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Length-prefix frame codec.
///
/// Holds the partial header or body between calls, so it works on sockets
/// with a read timeout.
#[derive(Debug)]
pub struct FrameCodec {
    state: ReadState,
    header: [u8; FRAME_HEADER_SIZE],
    body: Vec<u8>,
    /// Upper bound on the announced body length
    max_size: usize,
    frames_decoded: u64,
    bytes_decoded: u64,
    frames_rejected: u64,
}

#[derive(Debug, Clone, Copy)]
enum ReadState {
    ReadingLength { bytes_read: usize },
    ReadingBody { expected_len: usize, bytes_read: usize },
}

impl Default for ReadState {
    fn default() -> Self {
        ReadState::ReadingLength { bytes_read: 0 }
    }
}

/// Outcome of topping up a partially filled slice.
enum Fill {
    Full,
    /// Timed out with this many bytes in place
    Partial(usize),
    /// End of stream with this many bytes in place
    Eof(usize),
}

fn fill<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8], mut filled: usize) -> io::Result<Fill> {
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Ok(Fill::Eof(filled)),
            Ok(n) => filled += n,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                return Ok(Fill::Partial(filled));
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(Fill::Full)
}

fn eof(reason: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, reason)
}

/// Big-endian length header, refusing lengths `u32` cannot describe.
fn header_for(len: usize) -> ProtocolResult<[u8; FRAME_HEADER_SIZE]> {
    u32::try_from(len)
        .map(u32::to_be_bytes)
        .map_err(|_| ProtocolError::FrameTooLarge {
            len,
            max: u32::MAX as usize,
        })
}

impl FrameCodec {
    pub fn new(max_size: usize) -> Self {
        Self {
            state: ReadState::default(),
            header: [0; FRAME_HEADER_SIZE],
            body: Vec::new(),
            max_size,
            frames_decoded: 0,
            bytes_decoded: 0,
            frames_rejected: 0,
        }
    }

    /// Create a codec with default max size (16 MB).
    pub fn with_default_max() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_SIZE)
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    pub fn bytes_decoded(&self) -> u64 {
        self.bytes_decoded
    }

    /// Frames refused because their header exceeded `max_size`.
    pub fn frames_rejected(&self) -> u64 {
        self.frames_rejected
    }

    /// Drop any partially read frame.
    pub fn reset(&mut self) {
        self.state = ReadState::default();
        self.body.clear();
    }

    /// `[length: u32 BE][body]` as a new Vec.
    pub fn encode(body: &[u8]) -> ProtocolResult<Vec<u8>> {
        let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + body.len());
        Self::encode_into(body, &mut frame)?;
        Ok(frame)
    }

    /// Append `[length: u32 BE][body]` to `buf`. Bodies longer than
    /// `u32::MAX` are refused with [`ProtocolError::FrameTooLarge`].
    pub fn encode_into(body: &[u8], buf: &mut Vec<u8>) -> ProtocolResult<()> {
        buf.extend_from_slice(&header_for(body.len())?);
        buf.extend_from_slice(body);
        Ok(())
    }

    /// Write one framed body and flush.
    pub fn write_frame<W: Write + ?Sized>(writer: &mut W, body: &[u8]) -> io::Result<()> {
        let header = header_for(body.len())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        writer.write_all(&header)?;
        writer.write_all(body)?;
        writer.flush()
    }

    /// Read as much of the next frame as is available.
    ///
    /// `Ok(None)` means the reader timed out (`WouldBlock`/`TimedOut`) and
    /// the partial frame is kept for the next call. End of stream, I/O
    /// errors and oversized headers (`InvalidData` wrapping
    /// [`ProtocolError::FrameTooLarge`]) are errors.
    pub fn decode<R: Read + ?Sized>(&mut self, reader: &mut R) -> io::Result<Option<Vec<u8>>> {
        if let ReadState::ReadingLength { bytes_read } = self.state {
            match fill(reader, &mut self.header, bytes_read)? {
                Fill::Full => {}
                Fill::Partial(n) => {
                    self.state = ReadState::ReadingLength { bytes_read: n };
                    return Ok(None);
                }
                Fill::Eof(0) => return Err(eof("connection closed")),
                Fill::Eof(_) => return Err(eof("incomplete frame header")),
            }

            let len = u32::from_be_bytes(self.header) as usize;
            if len > self.max_size {
                self.frames_rejected += 1;
                self.state = ReadState::default();
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    ProtocolError::FrameTooLarge {
                        len,
                        max: self.max_size,
                    },
                ));
            }
            self.body.clear();
            self.body.resize(len, 0);
            self.state = ReadState::ReadingBody {
                expected_len: len,
                bytes_read: 0,
            };
        }

        let ReadState::ReadingBody {
            expected_len,
            bytes_read,
        } = self.state
        else {
            return Ok(None);
        };
        match fill(reader, &mut self.body[..expected_len], bytes_read)? {
            Fill::Full => {}
            Fill::Partial(n) => {
                self.state = ReadState::ReadingBody {
                    expected_len,
                    bytes_read: n,
                };
                return Ok(None);
            }
            Fill::Eof(_) => return Err(eof("incomplete frame body")),
        }

        self.frames_decoded += 1;
        self.bytes_decoded += expected_len as u64;
        self.state = ReadState::default();
        Ok(Some(std::mem::take(&mut self.body)))
    }

    /// Whether a frame has been started but not finished.
    pub fn is_partial(&self) -> bool {
        match self.state {
            ReadState::ReadingLength { bytes_read } => bytes_read > 0,
            ReadState::ReadingBody { .. } => true,
        }
    }

    /// Bytes still missing from the current header or body.
    pub fn bytes_needed(&self) -> usize {
        match self.state {
            ReadState::ReadingLength { bytes_read } => FRAME_HEADER_SIZE - bytes_read,
            ReadState::ReadingBody {
                expected_len,
                bytes_read,
            } => expected_len - bytes_read,
        }
    }
}
