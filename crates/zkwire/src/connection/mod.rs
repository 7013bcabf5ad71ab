// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connection lifecycle: configuration, host failover, handshake, retry
//! policies and the live [`Connection`].

pub mod config;
pub mod establish;
mod handshake;
pub mod retry;

mod client;
#[cfg(feature = "config-loader")]
pub mod settings;

pub use client::{Connection, ConnectionStats};
pub use config::{ConnectionConfig, Credentials};
pub use establish::{ConnectError, Established};
pub use handshake::{Session, PROTOCOL_VERSION};
pub use retry::{retry_operation, Discontinue, ExponentialBackoff, FixedDelay, RetryStrategy};
#[cfg(feature = "config-loader")]
pub use settings::{AuthSettings, ClientSettings};
