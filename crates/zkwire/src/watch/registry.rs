// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use dashmap::DashMap;

use super::{Watch, WatchEvent, WatchId};

#[derive(Debug)]
struct Subscriber {
    id: WatchId,
    sender: Sender<WatchEvent>,
    /// Used to evict the oldest event when the channel is full.
    evict: Receiver<WatchEvent>,
}

/// Path-keyed fan-out of watch events for one connection.
#[derive(Debug)]
pub struct WatchRegistry {
    subscribers: DashMap<String, Vec<Subscriber>>,
    next_id: AtomicU64,
    capacity: usize,
    closed: AtomicBool,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl WatchRegistry {
    /// `capacity` bounds each watch's buffer (at least 1).
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
            closed: AtomicBool::new(false),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        })
    }

    /// Subscribe to events on `path`.
    ///
    /// Registering after [`close_all`](Self::close_all) yields a watch that
    /// only receives the terminal `ConnectionClosed` event.
    pub fn register(self: &Arc<Self>, path: &str) -> Watch {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = channel::bounded(self.capacity);
        let subscriber = Subscriber {
            id,
            sender,
            evict: receiver.clone(),
        };

        let rejected = {
            let mut entry = self.subscribers.entry(path.to_string()).or_default();
            // Checked under the shard lock so close_all cannot miss it
            if self.closed.load(Ordering::SeqCst) {
                Some(subscriber)
            } else {
                entry.push(subscriber);
                None
            }
        };

        match rejected {
            None => log::debug!("[watch] registered #{} on {}", id, path),
            Some(subscriber) => {
                self.subscribers.remove_if(path, |_, subs| subs.is_empty());
                self.deliver(&subscriber, WatchEvent::connection_closed(path));
                log::debug!("[watch] #{} on {} registered after close", id, path);
            }
        }

        Watch::new(id, path.to_string(), receiver, Arc::downgrade(self))
    }

    /// Deliver `event` to every watch on its path. Returns how many
    /// watches received it.
    pub fn dispatch(&self, event: &WatchEvent) -> usize {
        let Some(subscribers) = self.subscribers.get(&event.path) else {
            return 0;
        };
        subscribers
            .iter()
            .filter(|sub| self.deliver(sub, event.clone()))
            .count()
    }

    /// Non-blocking send; evicts the oldest queued event when full.
    fn deliver(&self, subscriber: &Subscriber, mut event: WatchEvent) -> bool {
        loop {
            match subscriber.sender.try_send(event) {
                Ok(()) => {
                    self.delivered.fetch_add(1, Ordering::Relaxed);
                    return true;
                }
                Err(TrySendError::Full(rejected)) => {
                    if let Ok(evicted) = subscriber.evict.try_recv() {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        log::debug!(
                            "[watch] #{} buffer full, dropped {} on {}",
                            subscriber.id,
                            evicted.kind,
                            evicted.path
                        );
                    }
                    event = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }

    /// Remove one subscription. Its sender is dropped, so the watch's
    /// channel disconnects once drained.
    pub fn unregister(&self, path: &str, id: WatchId) {
        if let Some(mut subscribers) = self.subscribers.get_mut(path) {
            subscribers.retain(|sub| sub.id != id);
        }
        self.subscribers.remove_if(path, |_, subs| subs.is_empty());
    }

    /// Deliver `ConnectionClosed` to every open watch and drop all
    /// subscriptions. Later calls do nothing.
    pub fn close_all(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut notified = 0usize;
        self.subscribers.retain(|path, subscribers| {
            for subscriber in subscribers.iter() {
                if self.deliver(subscriber, WatchEvent::connection_closed(path.as_str())) {
                    notified += 1;
                }
            }
            false
        });
        log::debug!("[watch] connection closed, notified {} watch(es)", notified);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of open subscriptions across all paths.
    pub fn active_watches(&self) -> usize {
        self.subscribers.iter().map(|entry| entry.value().len()).sum()
    }

    /// Events evicted because a watch's buffer was full.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn delivered_events(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}
