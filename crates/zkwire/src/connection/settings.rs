// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! YAML client settings loader.
//!
//! # Example YAML
//!
//! ```yaml
//! # client.yaml
//! hosts: "zk1.internal:2181,zk2.internal:2181,zk3.internal:2181"
//! connect_timeout_ms: 2000
//! session_timeout_ms: 15000
//! handshake_timeout_ms: 5000
//! watch_capacity: 128
//! auth:
//!   scheme: digest
//!   secret: "app:s3cret"
//! ```
//!
//! Omitted fields keep the [`ConnectionConfig`] defaults.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use super::config::{ConnectionConfig, Credentials};
use crate::cluster::StaticCluster;
use crate::error::{Error, Result};

/// Root YAML document.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSettings {
    /// Comma-separated `host:port` list
    pub hosts: String,
    pub connect_timeout_ms: Option<u64>,
    pub session_timeout_ms: Option<u64>,
    pub handshake_timeout_ms: Option<u64>,
    /// Overrides the session-derived default
    pub ping_interval_ms: Option<u64>,
    pub max_message_size: Option<usize>,
    pub watch_capacity: Option<usize>,
    pub auth: Option<AuthSettings>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthSettings {
    pub scheme: String,
    pub secret: String,
}

impl ClientSettings {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("Failed to parse YAML: {}", e)))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }
}

impl ConnectionConfig {
    /// Build a validated configuration from loaded settings.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let cluster = StaticCluster::from_connect_string(&settings.hosts)?;
        let mut config = ConnectionConfig::new(Arc::new(cluster));

        if let Some(ms) = settings.connect_timeout_ms {
            config = config.with_connect_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = settings.session_timeout_ms {
            config = config.with_session_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = settings.handshake_timeout_ms {
            config = config.with_handshake_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = settings.ping_interval_ms {
            config = config.with_ping_interval(Duration::from_millis(ms));
        }
        if let Some(size) = settings.max_message_size {
            config = config.with_max_message_size(size);
        }
        if let Some(capacity) = settings.watch_capacity {
            config = config.with_watch_capacity(capacity);
        }
        if let Some(auth) = &settings.auth {
            config = config.with_credentials(Credentials::new(
                auth.scheme.clone(),
                auth.secret.as_bytes().to_vec(),
            ));
        }

        config
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(config)
    }
}
