// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cluster membership and host discovery.
//!
//! A [`Cluster`] owns the authoritative host set and hands out
//! [`HostIterator`]s, each holding a point-in-time copy of that set.
//!
//! - [`StaticCluster`]: fixed at construction
//! - [`DynamicCluster`]: reconfigurable at runtime (`ArcSwap`, no lock on read)

mod host;
mod iterator;

pub use host::Host;
pub use iterator::HostIterator;

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::{Error, Result};

/// Source of candidate hosts for a connection attempt.
pub trait Cluster: Send + Sync + fmt::Debug {
    /// Snapshot the current host set. The returned iterator never observes
    /// later membership changes.
    fn iterate_hosts(&self) -> HostIterator;
}

/// Split `h1:p1,h2:p2,...` into validated hosts. Empty entries are skipped.
fn parse_connect_string(connect_string: &str) -> Result<Vec<Arc<Host>>> {
    let hosts = connect_string
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| Host::parse(entry).map(Arc::new))
        .collect::<Result<Vec<_>>>()?;
    if hosts.is_empty() {
        return Err(Error::Config(format!(
            "connect string '{}' lists no hosts",
            connect_string
        )));
    }
    Ok(hosts)
}

/// Cluster whose membership never changes.
///
/// May list hosts that are currently unreachable; failover skips them.
#[derive(Debug, Clone, Default)]
pub struct StaticCluster {
    hosts: Vec<Arc<Host>>,
}

impl StaticCluster {
    pub fn new(hosts: impl IntoIterator<Item = Host>) -> Self {
        Self {
            hosts: hosts.into_iter().map(Arc::new).collect(),
        }
    }

    /// Build from a comma-separated `host:port` list.
    ///
    /// ```
    /// use zkwire::StaticCluster;
    ///
    /// let cluster = StaticCluster::from_connect_string("zk1:2181, zk2:2181").unwrap();
    /// assert_eq!(cluster.len(), 2);
    /// ```
    pub fn from_connect_string(connect_string: &str) -> Result<Self> {
        Ok(Self {
            hosts: parse_connect_string(connect_string)?,
        })
    }

    pub fn hosts(&self) -> &[Arc<Host>] {
        &self.hosts
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl Cluster for StaticCluster {
    fn iterate_hosts(&self) -> HostIterator {
        HostIterator::from_slice(&self.hosts)
    }
}

/// Cluster whose membership can change while connections are in progress.
///
/// Writers publish a new host list atomically; iterators created before a
/// change keep traversing the list they were created from.
#[derive(Debug)]
pub struct DynamicCluster {
    hosts: ArcSwap<Vec<Arc<Host>>>,
}

impl DynamicCluster {
    pub fn new(hosts: impl IntoIterator<Item = Host>) -> Self {
        let hosts: Vec<Arc<Host>> = hosts.into_iter().map(Arc::new).collect();
        Self {
            hosts: ArcSwap::from_pointee(hosts),
        }
    }

    pub fn from_connect_string(connect_string: &str) -> Result<Self> {
        Ok(Self {
            hosts: ArcSwap::from_pointee(parse_connect_string(connect_string)?),
        })
    }

    /// Replace the whole membership.
    pub fn set_hosts(&self, hosts: impl IntoIterator<Item = Host>) {
        let hosts: Vec<Arc<Host>> = hosts.into_iter().map(Arc::new).collect();
        log::debug!("[cluster] membership replaced ({} hosts)", hosts.len());
        self.hosts.store(Arc::new(hosts));
    }

    /// Append `host` unless an equal address is already present.
    pub fn add_host(&self, host: Host) {
        let host = Arc::new(host);
        self.hosts.rcu(|current| {
            let mut next = Vec::clone(current);
            if !next.iter().any(|h| h.address() == host.address()) {
                next.push(Arc::clone(&host));
            }
            next
        });
    }

    /// Remove the host with `address`. Returns whether it was present.
    pub fn remove_host(&self, address: &str) -> bool {
        let previous = self.hosts.rcu(|current| {
            current
                .iter()
                .filter(|h| h.address() != address)
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|h| h.address() == address)
    }

    /// Current membership.
    pub fn snapshot(&self) -> Arc<Vec<Arc<Host>>> {
        self.hosts.load_full()
    }

    pub fn len(&self) -> usize {
        self.hosts.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.load().is_empty()
    }
}

impl Cluster for DynamicCluster {
    fn iterate_hosts(&self) -> HostIterator {
        HostIterator::from_slice(&self.hosts.load())
    }
}
