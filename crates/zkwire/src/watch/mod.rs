// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Watch subscriptions and event delivery.
//!
//! A [`Watch`] is the receiving end of a bounded per-subscription channel.
//! The [`WatchRegistry`] fans server notifications out to every watch on the
//! notified path. Delivery never blocks the reader thread: when a watch's
//! buffer is full the oldest queued event is evicted (drop-oldest), and the
//! eviction is counted.
//!
//! `ConnectionClosed` is terminal. It is delivered to every open watch when
//! the connection goes away, after which the channel yields nothing more.

mod registry;

pub use registry::WatchRegistry;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Weak;
use std::time::Duration;

use crossbeam::channel::Receiver;

/// Kind of a watch event. Wire codes: 0, 1, 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    /// The connection carrying the watch is gone (terminal).
    ConnectionClosed,
    NodeUpdated,
    NodeDeleted,
}

impl WatchEventKind {
    pub fn to_wire(self) -> i32 {
        match self {
            WatchEventKind::ConnectionClosed => 0,
            WatchEventKind::NodeUpdated => 1,
            WatchEventKind::NodeDeleted => 2,
        }
    }

    pub fn from_wire(code: i32) -> Option<Self> {
        match code {
            0 => Some(WatchEventKind::ConnectionClosed),
            1 => Some(WatchEventKind::NodeUpdated),
            2 => Some(WatchEventKind::NodeDeleted),
            _ => None,
        }
    }

    /// No event follows a terminal one.
    pub fn is_terminal(self) -> bool {
        self == WatchEventKind::ConnectionClosed
    }
}

impl fmt::Display for WatchEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WatchEventKind::ConnectionClosed => "connection-closed",
            WatchEventKind::NodeUpdated => "node-updated",
            WatchEventKind::NodeDeleted => "node-deleted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: String,
}

impl WatchEvent {
    pub fn new(kind: WatchEventKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn connection_closed(path: impl Into<String>) -> Self {
        Self::new(WatchEventKind::ConnectionClosed, path)
    }
}

/// Registry-assigned subscription id.
pub type WatchId = u64;

/// A live subscription to changes on one path.
///
/// Reads return `None` once the watch is closed, either explicitly or after
/// the terminal `ConnectionClosed` event has been received. Dropping the
/// watch closes it.
#[derive(Debug)]
pub struct Watch {
    id: WatchId,
    path: String,
    receiver: Receiver<WatchEvent>,
    registry: Weak<WatchRegistry>,
    closed: AtomicBool,
    /// Cleared once the subscriber has left the registry
    registered: AtomicBool,
}

impl Watch {
    pub(crate) fn new(
        id: WatchId,
        path: String,
        receiver: Receiver<WatchEvent>,
        registry: Weak<WatchRegistry>,
    ) -> Self {
        Self {
            id,
            path,
            receiver,
            registry,
            closed: AtomicBool::new(false),
            registered: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> WatchId {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw event channel. Disconnected once the watch is closed or the
    /// connection is gone.
    pub fn channel(&self) -> &Receiver<WatchEvent> {
        &self.receiver
    }

    /// Block until the next event. `None` once closed.
    pub fn recv(&self) -> Option<WatchEvent> {
        if self.is_closed() {
            return None;
        }
        self.receiver.recv().ok().map(|event| self.observe(event))
    }

    pub fn try_recv(&self) -> Option<WatchEvent> {
        if self.is_closed() {
            return None;
        }
        self.receiver.try_recv().ok().map(|event| self.observe(event))
    }

    /// Wait at most `timeout`. `None` on timeout or once closed.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<WatchEvent> {
        if self.is_closed() {
            return None;
        }
        self.receiver
            .recv_timeout(timeout)
            .ok()
            .map(|event| self.observe(event))
    }

    /// Blocking iterator; ends after the terminal event or on close.
    pub fn iter(&self) -> impl Iterator<Item = WatchEvent> + '_ {
        std::iter::from_fn(move || self.recv())
    }

    /// Stop receiving events. Safe to call any number of times.
    pub fn close(&self) {
        let first = !self.closed.swap(true, Ordering::AcqRel);
        self.detach();
        while self.receiver.try_recv().is_ok() {}
        if first {
            log::debug!("[watch] closed #{} on {}", self.id, self.path);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn observe(&self, event: WatchEvent) -> WatchEvent {
        if event.kind.is_terminal() {
            self.closed.store(true, Ordering::Release);
            self.detach();
        }
        event
    }

    /// Leave the registry; runs at most once however the watch ended.
    fn detach(&self) {
        if !self.registered.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(&self.path, self.id);
        }
    }
}

impl Drop for Watch {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_wire_codes() {
        for kind in [
            WatchEventKind::ConnectionClosed,
            WatchEventKind::NodeUpdated,
            WatchEventKind::NodeDeleted,
        ] {
            assert_eq!(WatchEventKind::from_wire(kind.to_wire()), Some(kind));
        }
        assert_eq!(WatchEventKind::NodeDeleted.to_wire(), 2);
        assert_eq!(WatchEventKind::from_wire(3), None);
        assert!(WatchEventKind::ConnectionClosed.is_terminal());
        assert!(!WatchEventKind::NodeDeleted.is_terminal());
    }

    #[test]
    fn test_close_is_idempotent() {
        let registry = WatchRegistry::new(4);
        let watch = registry.register("/a");
        registry.dispatch(&WatchEvent::new(WatchEventKind::NodeUpdated, "/a"));

        watch.close();
        watch.close();
        assert!(watch.is_closed());
        assert_eq!(watch.try_recv(), None);
        assert_eq!(watch.recv(), None);
        assert_eq!(registry.active_watches(), 0);

        // Events after close are not delivered
        assert_eq!(
            registry.dispatch(&WatchEvent::new(WatchEventKind::NodeDeleted, "/a")),
            0
        );
        assert!(watch.channel().try_recv().is_err());
    }

    #[test]
    fn test_terminal_event_ends_iteration() {
        let registry = WatchRegistry::new(8);
        let watch = registry.register("/cfg");
        registry.dispatch(&WatchEvent::new(WatchEventKind::NodeUpdated, "/cfg"));
        registry.dispatch(&WatchEvent::new(WatchEventKind::NodeDeleted, "/cfg"));
        registry.close_all();

        let kinds: Vec<_> = watch.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                WatchEventKind::NodeUpdated,
                WatchEventKind::NodeDeleted,
                WatchEventKind::ConnectionClosed,
            ]
        );
        assert!(watch.is_closed());
        assert_eq!(watch.recv_timeout(Duration::from_millis(10)), None);
    }

    #[test]
    fn test_drop_unregisters() {
        let registry = WatchRegistry::new(4);
        {
            let _watch = registry.register("/tmp");
            assert_eq!(registry.active_watches(), 1);
        }
        assert_eq!(registry.active_watches(), 0);
    }

    #[test]
    fn test_close_after_registry_dropped() {
        let registry = WatchRegistry::new(4);
        let watch = registry.register("/x");
        drop(registry);
        // Sender went away with the registry
        assert_eq!(watch.recv(), None);
        watch.close();
    }
}
