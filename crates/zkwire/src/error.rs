// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-wide error type.
//!
//! Codec failures keep their own [`ProtocolError`] and are wrapped here so
//! callers can match on the exact kind (`BoundsViolation`,
//! `NoSuchMessageType`, `InvalidMessageType`, ...).

use std::io;

use crate::protocol::ProtocolError;

/// Errors returned by the client library.
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Codec Errors
    // ========================================================================
    /// Encoding or decoding a wire message failed.
    Protocol(ProtocolError),

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Every host of the cluster snapshot failed to dial.
    NoReachableHost,
    /// Transport opened but the initialization exchange did not complete.
    Handshake(String),
    /// The server answered with an error message.
    Server { code: i32, message: String },
    /// I/O error with underlying cause.
    Io(io::Error),
    /// Operation requires a live connection.
    NotConnected,
    /// Connection was closed while the operation was in progress.
    ConnectionClosed,

    // ========================================================================
    // Usage Errors
    // ========================================================================
    /// `HostIterator::next_host` called with no hosts remaining.
    IteratorExhausted,
    /// Invalid configuration value.
    Config(String),
    /// A retry strategy gave up.
    RetriesExhausted {
        attempts: u32,
        last: Option<Box<Error>>,
    },
}

impl Error {
    /// Whether retrying the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::NoReachableHost | Error::Io(_) | Error::ConnectionClosed
        )
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
            Error::NoReachableHost => {
                write!(f, "No reachable host found in the configured cluster")
            }
            Error::Handshake(reason) => write!(f, "Handshake failed: {}", reason),
            Error::Server { code, message } => write!(f, "Server error {}: {}", code, message),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::NotConnected => write!(f, "Not connected"),
            Error::ConnectionClosed => write!(f, "Connection closed"),
            Error::IteratorExhausted => write!(f, "HostIterator has no remaining items"),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::RetriesExhausted { attempts, last } => match last {
                Some(last) => write!(f, "Gave up after {} attempt(s): {}", attempts, last),
                None => write!(f, "Gave up after {} attempt(s)", attempts),
            },
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Protocol(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::RetriesExhausted { last: Some(last), .. } => Some(last.as_ref()),
            _ => None,
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<io::Error> for Error {
    /// Codec errors travelling inside an `io::Error` (frame limits) are
    /// surfaced as `Error::Protocol`.
    fn from(e: io::Error) -> Self {
        let inner = e
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<ProtocolError>())
            .cloned();
        match inner {
            Some(protocol) => Error::Protocol(protocol),
            None => Error::Io(e),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
