// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

use crate::error::{Error, Result};

/// One cluster member, addressed as `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Host {
    address: String,
}

impl Host {
    /// Wrap an address without validating it. Resolution happens at dial time.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    /// Validate and wrap a `host:port` address.
    pub fn parse(address: &str) -> Result<Self> {
        let address = address.trim();
        let (name, port) = address
            .rsplit_once(':')
            .ok_or_else(|| Error::Config(format!("missing port in host address '{}'", address)))?;
        if name.is_empty() {
            return Err(Error::Config(format!(
                "missing host name in address '{}'",
                address
            )));
        }
        port.parse::<u16>()
            .map_err(|_| Error::Config(format!("invalid port in host address '{}'", address)))?;
        Ok(Self::new(address))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Resolve to socket addresses (may perform a DNS lookup).
    pub fn resolve(&self) -> io::Result<Vec<SocketAddr>> {
        Ok(self.address.to_socket_addrs()?.collect())
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

impl From<SocketAddr> for Host {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.to_string())
    }
}
