// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Failover across cluster hosts, then the session handshake.

use std::fmt;
use std::net::Shutdown;
use std::sync::Arc;

use super::config::ConnectionConfig;
use super::handshake::{Handshake, Session};
use crate::cluster::{Host, HostIterator};
use crate::error::{Error, Result};
use crate::transport::BoxedByteStream;

/// A transport that completed the handshake.
pub struct Established {
    pub host: Arc<Host>,
    pub transport: BoxedByteStream,
    pub session: Session,
}

impl fmt::Debug for Established {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Established")
            .field("host", &self.host)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Failure of [`ConnectionConfig::connect_and_initialize`].
pub enum ConnectError {
    /// No transport was opened.
    Failed(Error),
    /// The transport opened but the handshake failed. The transport is
    /// still open; the caller decides whether to close it.
    Handshake {
        host: Arc<Host>,
        transport: BoxedByteStream,
        error: Error,
    },
}

impl ConnectError {
    pub fn error(&self) -> &Error {
        match self {
            ConnectError::Failed(error) | ConnectError::Handshake { error, .. } => error,
        }
    }

    /// The still-open transport of a failed handshake.
    pub fn into_transport(self) -> Option<BoxedByteStream> {
        match self {
            ConnectError::Failed(_) => None,
            ConnectError::Handshake { transport, .. } => Some(transport),
        }
    }

    /// Discard any open transport and keep the error.
    pub fn into_error(self) -> Error {
        match self {
            ConnectError::Failed(error) | ConnectError::Handshake { error, .. } => error,
        }
    }

    /// Shut the transport down (if any) and return the error.
    pub fn close(self) -> Error {
        match self {
            ConnectError::Failed(error) => error,
            ConnectError::Handshake {
                host,
                transport,
                error,
            } => {
                if let Err(e) = transport.shutdown(Shutdown::Both) {
                    log::debug!("[handshake] shutdown of {} failed: {}", host, e);
                }
                error
            }
        }
    }
}

impl fmt::Debug for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::Failed(error) => f.debug_tuple("Failed").field(error).finish(),
            ConnectError::Handshake { host, error, .. } => f
                .debug_struct("Handshake")
                .field("host", host)
                .field("error", error)
                .finish_non_exhaustive(),
        }
    }
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::Failed(error) => write!(f, "{}", error),
            ConnectError::Handshake { host, error, .. } => {
                write!(f, "connected to {} but initialization failed: {}", host, error)
            }
        }
    }
}

impl std::error::Error for ConnectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error())
    }
}

impl From<ConnectError> for Error {
    fn from(e: ConnectError) -> Self {
        e.close()
    }
}

impl ConnectionConfig {
    /// Open a transport to the first reachable host, then run the
    /// handshake on it.
    pub fn connect_and_initialize(&self) -> std::result::Result<Established, ConnectError> {
        let (host, mut transport) = self.connect().map_err(ConnectError::Failed)?;
        match Handshake::new(self).run(transport.as_mut()) {
            Ok(session) => Ok(Established {
                host,
                transport,
                session,
            }),
            Err(error) => {
                log::debug!("[handshake] {} failed: {}", host, error);
                Err(ConnectError::Handshake {
                    host,
                    transport,
                    error,
                })
            }
        }
    }

    /// Dial the hosts of a fresh cluster snapshot.
    pub fn connect(&self) -> Result<(Arc<Host>, BoxedByteStream)> {
        self.connect_to_any_host(self.cluster.iterate_hosts())
    }

    /// Dial each host in order until one answers within `connect_timeout`.
    ///
    /// Per-host failures are logged and otherwise discarded; exhausting the
    /// iterator yields [`Error::NoReachableHost`].
    pub fn connect_to_any_host(
        &self,
        mut hosts: HostIterator,
    ) -> Result<(Arc<Host>, BoxedByteStream)> {
        while hosts.has_next() {
            let host = hosts.next_host()?;
            match self.dialer.dial(&host, self.connect_timeout) {
                Ok(transport) => {
                    log::debug!("[failover] connected to {}", host);
                    return Ok((host, transport));
                }
                Err(e) => log::debug!("[failover] {} unreachable: {}", host, e),
            }
        }
        Err(Error::NoReachableHost)
    }
}
