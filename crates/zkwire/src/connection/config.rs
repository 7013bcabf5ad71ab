// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client connection configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::cluster::{Cluster, StaticCluster};
use crate::error::Result;
use crate::protocol::{Protocol, DEFAULT_MAX_MESSAGE_SIZE};
use crate::transport::{Dialer, TcpDialer};

/// Authentication sent after the session is established.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub scheme: String,
    pub secret: Vec<u8>,
}

impl Credentials {
    pub fn new(scheme: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            scheme: scheme.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("scheme", &self.scheme)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Immutable per-client configuration.
///
/// Holds no open transport; every connection attempt derives from it.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Deadline for each per-host dial.
    pub connect_timeout: Duration,

    /// Candidate hosts.
    pub cluster: Arc<dyn Cluster>,

    /// Session timeout requested in the handshake.
    pub session_timeout: Duration,

    /// Deadline for each handshake reply (`None` = wait indefinitely).
    pub handshake_timeout: Option<Duration>,

    /// Idle time after which the reader sends a ping.
    pub ping_interval: Duration,

    /// Maximum frame body size accepted from the server.
    pub max_message_size: usize,

    /// Optional authentication.
    pub credentials: Option<Credentials>,

    /// Per-watch event buffer.
    pub watch_capacity: usize,

    /// Transport factory.
    pub dialer: Arc<dyn Dialer>,

    /// Message registry used for every encode/decode.
    pub protocol: Arc<Protocol>,
}

const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30);

impl ConnectionConfig {
    pub fn new(cluster: Arc<dyn Cluster>) -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            cluster,
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            handshake_timeout: None,
            ping_interval: DEFAULT_SESSION_TIMEOUT / 3,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            credentials: None,
            watch_capacity: 64,
            dialer: Arc::new(TcpDialer::default()),
            protocol: Arc::new(Protocol::standard()),
        }
    }

    /// Static cluster from a `host:port,host:port` connect string.
    pub fn from_hosts(connect_string: &str) -> Result<Self> {
        let cluster = StaticCluster::from_connect_string(connect_string)?;
        Ok(Self::new(Arc::new(cluster)))
    }

    /// Builder: set per-host dial timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Builder: set session timeout. Also resets the ping interval to a
    /// third of it.
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self.ping_interval = timeout / 3;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = Some(timeout);
        self
    }

    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_watch_capacity(mut self, capacity: usize) -> Self {
        self.watch_capacity = capacity;
        self
    }

    pub fn with_dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.dialer = dialer;
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Arc::new(protocol);
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.connect_timeout.is_zero() {
            return Err("connect_timeout must be > 0");
        }
        if self.session_timeout.as_millis() == 0 || self.session_timeout.as_millis() > i32::MAX as u128
        {
            return Err("session_timeout must be between 1 ms and i32::MAX ms");
        }
        if self.handshake_timeout.is_some_and(|t| t.is_zero()) {
            return Err("handshake_timeout must be > 0");
        }
        if self.ping_interval.is_zero() {
            return Err("ping_interval must be > 0");
        }
        if self.max_message_size == 0 {
            return Err("max_message_size must be > 0");
        }
        if self.watch_capacity == 0 {
            return Err("watch_capacity must be > 0");
        }
        Ok(())
    }
}
