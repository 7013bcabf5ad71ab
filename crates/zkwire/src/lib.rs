// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # zkwire - coordination-service client transport
//!
//! Connection layer for clients of a replicated coordination service
//! (ZooKeeper-style ensembles): pick a reachable host, initialize a
//! session, speak a length-prefixed binary protocol, and deliver watch
//! notifications to subscribers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use zkwire::{Connection, ConnectionConfig, ExponentialBackoff, Result};
//!
//! fn main() -> Result<()> {
//!     let config = ConnectionConfig::from_hosts("zk1:2181,zk2:2181,zk3:2181")?
//!         .with_connect_timeout(Duration::from_secs(2));
//!
//!     let connection = Connection::open_with_retry(&config, &ExponentialBackoff::default())?;
//!     let watch = connection.watch("/config/app")?;
//!     for event in watch.iter() {
//!         println!("{} {}", event.kind, event.path);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------------------------------+
//! |  Connection          open / watch / send / close            |
//! +-------------------------------------------------------------+
//! |  establish           failover over HostIterator + handshake |
//! |  retry               Discontinue | FixedDelay | Backoff     |
//! +-------------------------------------------------------------+
//! |  protocol            Builder -> Protocol (id -> MessageType)|
//! |                      FrameCodec (u32 BE length prefix)      |
//! +-------------------------------------------------------------+
//! |  transport           ByteStream / Dialer (TCP, mock)        |
//! +-------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`cluster`] - host lists and failover iteration
//! - [`protocol`] - message registry, payload codecs, framing
//! - [`transport`] - byte streams and dialers
//! - [`connection`] - configuration, handshake, live connection
//! - [`watch`] - watch subscriptions and event fan-out

pub mod cluster;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod watch;

pub use cluster::{Cluster, DynamicCluster, Host, HostIterator, StaticCluster};
pub use connection::{
    ConnectError, Connection, ConnectionConfig, ConnectionStats, Credentials, Discontinue,
    Established, ExponentialBackoff, FixedDelay, RetryStrategy, Session,
};
#[cfg(feature = "config-loader")]
pub use connection::ClientSettings;
pub use error::{Error, Result};
pub use protocol::{Builder, Message, MessageKind, MessageType, MessageTypeId, Protocol};
pub use transport::{BoxedByteStream, ByteStream, Dialer, TcpDialer};
pub use watch::{Watch, WatchEvent, WatchEventKind, WatchRegistry};
