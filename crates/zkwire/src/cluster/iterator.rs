// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::iter::FusedIterator;
use std::sync::Arc;

use super::Host;
use crate::error::{Error, Result};

/// Single-use traversal over a private copy of a cluster's hosts.
///
/// Each slot is cleared once its host has been handed out, so visited hosts
/// are only kept alive by the caller.
#[derive(Debug, Default)]
pub struct HostIterator {
    items: Vec<Option<Arc<Host>>>,
    index: usize,
}

impl HostIterator {
    /// Copy `hosts`; later changes to the source are not observed.
    pub fn from_slice(hosts: &[Arc<Host>]) -> Self {
        Self {
            items: hosts.iter().cloned().map(Some).collect(),
            index: 0,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether [`next_host`](Self::next_host) will succeed. No side effects.
    pub fn has_next(&self) -> bool {
        self.index < self.items.len()
    }

    pub fn remaining(&self) -> usize {
        self.items.len() - self.index
    }

    /// Return the next host and advance.
    ///
    /// Calling this when [`has_next`](Self::has_next) is false is a caller
    /// bug and returns [`Error::IteratorExhausted`].
    pub fn next_host(&mut self) -> Result<Arc<Host>> {
        let slot = self
            .items
            .get_mut(self.index)
            .ok_or(Error::IteratorExhausted)?;
        self.index += 1;
        slot.take().ok_or(Error::IteratorExhausted)
    }
}

impl Iterator for HostIterator {
    type Item = Arc<Host>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_host().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl ExactSizeIterator for HostIterator {}

impl FusedIterator for HostIterator {}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(n: usize) -> Vec<Arc<Host>> {
        (0..n)
            .map(|i| Arc::new(Host::new(format!("10.0.0.{}:2181", i + 1))))
            .collect()
    }

    #[test]
    fn test_exactly_n_hosts() {
        for n in [0, 1, 3, 8] {
            let source = hosts(n);
            let mut iter = HostIterator::from_slice(&source);
            for expected in &source {
                assert!(iter.has_next());
                assert!(iter.has_next());
                assert_eq!(&iter.next_host().unwrap(), expected);
            }
            assert!(!iter.has_next());
            assert!(matches!(iter.next_host(), Err(Error::IteratorExhausted)));
            assert!(!iter.has_next());
            assert!(matches!(iter.next_host(), Err(Error::IteratorExhausted)));
        }
    }

    #[test]
    fn test_visited_slots_are_released() {
        let source = hosts(2);
        let mut iter = HostIterator::from_slice(&source);
        assert_eq!(Arc::strong_count(&source[0]), 2);

        let first = iter.next_host().unwrap();
        // source + caller, the iterator no longer holds it
        assert_eq!(Arc::strong_count(&source[0]), 2);
        drop(first);
        assert_eq!(Arc::strong_count(&source[0]), 1);
        assert_eq!(Arc::strong_count(&source[1]), 2);
    }

    #[test]
    fn test_std_iterator() {
        let source = hosts(3);
        let iter = HostIterator::from_slice(&source);
        assert_eq!(iter.len(), 3);
        let collected: Vec<_> = iter.collect();
        assert_eq!(collected, source);

        assert_eq!(HostIterator::empty().next(), None);
    }
}
