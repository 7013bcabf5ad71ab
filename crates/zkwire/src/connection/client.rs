// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Live client connection.
//!
//! After the handshake the transport is split: callers write through a
//! mutex-guarded handle while one reader thread ("zkwire-reader") decodes
//! incoming frames and dispatches them. The reader pings the server when
//! nothing was sent for `ping_interval`, and on any transport failure it
//! marks the connection dead and closes every open watch.

use std::fmt;
use std::io;
use std::net::Shutdown;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::config::ConnectionConfig;
use super::establish::{ConnectError, Established};
use super::handshake::Session;
use super::retry::{retry_operation, RetryStrategy};
use crate::cluster::Host;
use crate::error::{Error, Result};
use crate::protocol::{
    ErrorResponse, FrameCodec, Message, MessageKind, MessageVisitor, Protocol, ProtocolError,
    SetWatch, WatchNotification,
};
use crate::transport::{BoxedByteStream, ByteStream};
use crate::watch::{Watch, WatchEvent, WatchRegistry};

/// Counters for one connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub pings_sent: u64,
    /// Frames skipped because they could not be decoded
    pub decode_errors: u64,
    pub active_watches: usize,
    pub dropped_watch_events: u64,
}

/// Bound on the farewell `CloseSession` write during `close()`.
const CLOSE_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// State shared between the caller side and the reader thread.
struct Shared {
    /// Held for the whole of one frame write
    writer: Mutex<BoxedByteStream>,
    /// Second handle for shutdown and socket options; never held across I/O
    control: Mutex<BoxedByteStream>,
    last_send: Mutex<Instant>,
    protocol: Arc<Protocol>,
    max_message_size: usize,
    watches: Arc<WatchRegistry>,
    connected: AtomicBool,
    closing: AtomicBool,
    frames_sent: AtomicU64,
    frames_received: AtomicU64,
    pings_sent: AtomicU64,
    decode_errors: AtomicU64,
}

impl Shared {
    fn send(&self, message: &Message) -> Result<()> {
        let body = self.encode(message)?;
        let mut writer = self.writer.lock();
        self.write(&mut **writer, &body)
    }

    /// Send only if no other write is in progress. `Ok(false)` when the
    /// writer was busy.
    fn try_send(&self, message: &Message) -> Result<bool> {
        let body = self.encode(message)?;
        let Some(mut writer) = self.writer.try_lock() else {
            return Ok(false);
        };
        self.write(&mut **writer, &body)?;
        Ok(true)
    }

    fn encode(&self, message: &Message) -> Result<Vec<u8>> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(Error::NotConnected);
        }
        let body = self.protocol.encode(message)?;
        if body.len() > self.max_message_size {
            return Err(Error::Protocol(ProtocolError::FrameTooLarge {
                len: body.len(),
                max: self.max_message_size,
            }));
        }
        Ok(body)
    }

    fn write(&self, writer: &mut dyn ByteStream, body: &[u8]) -> Result<()> {
        FrameCodec::write_frame(writer, body)?;
        *self.last_send.lock() = Instant::now();
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn idle_for(&self) -> Duration {
        self.last_send.lock().elapsed()
    }

    fn mark_disconnected(&self) {
        if self.connected.swap(false, Ordering::AcqRel) {
            log::debug!("[connection] disconnected");
        }
        self.watches.close_all();
    }
}

/// A connected, initialized session with one cluster host.
///
/// Dropping the connection closes it.
pub struct Connection {
    shared: Arc<Shared>,
    host: Arc<Host>,
    session: Session,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl Connection {
    /// Fail over across the cluster, run the handshake, and start the
    /// reader. A transport whose handshake failed is closed.
    pub fn open(config: &ConnectionConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        let established = config
            .connect_and_initialize()
            .map_err(ConnectError::close)?;
        Self::start(config, established)
    }

    /// [`open`](Self::open) under a retry policy.
    pub fn open_with_retry(config: &ConnectionConfig, strategy: &dyn RetryStrategy) -> Result<Self> {
        retry_operation(strategy, || Self::open(config))
    }

    /// Take over an established transport and spawn its reader.
    pub fn start(config: &ConnectionConfig, established: Established) -> Result<Self> {
        let Established {
            host,
            transport,
            session,
        } = established;

        let stream = transport.try_clone_stream()?;
        stream.set_read_timeout(Some(config.ping_interval))?;
        let control = transport.try_clone_stream()?;

        let shared = Arc::new(Shared {
            writer: Mutex::new(transport),
            control: Mutex::new(control),
            last_send: Mutex::new(Instant::now()),
            protocol: Arc::clone(&config.protocol),
            max_message_size: config.max_message_size,
            watches: WatchRegistry::new(config.watch_capacity),
            connected: AtomicBool::new(true),
            closing: AtomicBool::new(false),
            frames_sent: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            pings_sent: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
        });

        let reader = ReaderLoop {
            stream,
            codec: FrameCodec::new(config.max_message_size),
            shared: Arc::clone(&shared),
            ping_interval: config.ping_interval,
        };
        let handle = thread::Builder::new()
            .name("zkwire-reader".to_string())
            .spawn(move || reader.run())?;

        log::info!(
            "[connection] session {:#x} established with {}",
            session.session_id,
            host
        );
        Ok(Self {
            shared,
            host,
            session,
            reader: Mutex::new(Some(handle)),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn protocol(&self) -> &Protocol {
        &self.shared.protocol
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// Subscribe to changes on `path`.
    ///
    /// The watch stays open until closed or until the connection is lost;
    /// a `NodeDeleted` event does not end it.
    pub fn watch(&self, path: &str) -> Result<Watch> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        let watch = self.shared.watches.register(path);
        self.shared.send(&Message::SetWatch(SetWatch {
            path: path.to_string(),
        }))?;
        Ok(watch)
    }

    /// Encode and send one message. Blocks while another write is in
    /// progress; bodies over `max_message_size` are refused.
    pub fn send(&self, message: &Message) -> Result<()> {
        self.shared.send(message)
    }

    pub fn ping(&self) -> Result<()> {
        self.shared.send(&Message::Ping)?;
        self.shared.pings_sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            frames_sent: self.shared.frames_sent.load(Ordering::Relaxed),
            frames_received: self.shared.frames_received.load(Ordering::Relaxed),
            pings_sent: self.shared.pings_sent.load(Ordering::Relaxed),
            decode_errors: self.shared.decode_errors.load(Ordering::Relaxed),
            active_watches: self.shared.watches.active_watches(),
            dropped_watch_events: self.shared.watches.dropped_events(),
        }
    }

    /// End the session: best-effort `CloseSession`, socket shutdown, reader
    /// join. Every open watch receives `ConnectionClosed`. Idempotent.
    ///
    /// Does not wait for a write stuck in another thread: the shutdown
    /// fails that write instead.
    pub fn close(&self) -> Result<()> {
        if self.shared.closing.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if self.is_connected() {
            if let Err(e) = self
                .shared
                .control
                .lock()
                .set_write_timeout(Some(CLOSE_WRITE_TIMEOUT))
            {
                log::debug!("[connection] write timeout: {}", e);
            }
            match self.shared.try_send(&Message::CloseSession) {
                Ok(true) => {}
                Ok(false) => log::debug!("[connection] writer busy, CloseSession skipped"),
                Err(e) => log::debug!("[connection] CloseSession not sent: {}", e),
            }
        }
        if let Err(e) = self.shared.control.lock().shutdown(Shutdown::Both) {
            log::debug!("[connection] shutdown: {}", e);
        }

        let handle = self.reader.lock().take();
        let joined = match handle {
            Some(handle) => handle
                .join()
                .map_err(|_| Error::Io(io::Error::other("reader thread panicked"))),
            None => Ok(()),
        };
        self.shared.mark_disconnected();
        log::info!("[connection] session {:#x} closed", self.session.session_id);
        joined
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("session_id", &self.session.session_id)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

// ============================================================================
// Reader Thread
// ============================================================================

struct ReaderLoop {
    stream: BoxedByteStream,
    codec: FrameCodec,
    shared: Arc<Shared>,
    ping_interval: Duration,
}

impl ReaderLoop {
    fn run(mut self) {
        while !self.shared.closing.load(Ordering::Acquire) {
            match self.codec.decode(&mut *self.stream) {
                Ok(Some(body)) => {
                    self.shared.frames_received.fetch_add(1, Ordering::Relaxed);
                    self.handle_frame(&body);
                }
                Ok(None) => {}
                Err(e) => {
                    if !self.shared.closing.load(Ordering::Acquire) {
                        log::warn!("[reader] connection lost: {}", e);
                    }
                    break;
                }
            }

            // A busy writer means the connection is not idle
            if self.shared.idle_for() >= self.ping_interval {
                match self.shared.try_send(&Message::Ping) {
                    Ok(true) => {
                        self.shared.pings_sent.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(false) => {}
                    Err(e) => {
                        log::debug!("[reader] ping failed: {}", e);
                        break;
                    }
                }
            }
        }
        self.shared.mark_disconnected();
    }

    fn handle_frame(&self, body: &[u8]) {
        match self.shared.protocol.decode(body) {
            Ok(message) => message.accept(&mut Dispatcher {
                shared: &self.shared,
            }),
            Err(e) => {
                // Keep the stream: the frame boundary is intact
                self.shared.decode_errors.fetch_add(1, Ordering::Relaxed);
                log::warn!("[reader] skipping undecodable frame: {}", e);
            }
        }
    }
}

/// Routes server messages received after the handshake.
struct Dispatcher<'a> {
    shared: &'a Shared,
}

impl MessageVisitor for Dispatcher<'_> {
    fn visit_unhandled(&mut self, kind: MessageKind) {
        log::debug!("[reader] ignoring unexpected {}", kind);
    }

    fn visit_watch_notification(&mut self, msg: &WatchNotification) {
        let event = WatchEvent::new(msg.kind, msg.path.clone());
        let delivered = self.shared.watches.dispatch(&event);
        log::debug!(
            "[reader] {} on {} -> {} watch(es)",
            msg.kind,
            msg.path,
            delivered
        );
    }

    fn visit_ping(&mut self) {
        match self.shared.try_send(&Message::Pong) {
            Ok(true) => {}
            Ok(false) => log::debug!("[reader] writer busy, pong skipped"),
            Err(e) => log::debug!("[reader] pong failed: {}", e),
        }
    }

    fn visit_pong(&mut self) {
        log::debug!("[reader] pong");
    }

    fn visit_error_response(&mut self, msg: &ErrorResponse) {
        log::warn!("[reader] server error {}: {}", msg.code, msg.message);
    }

    fn visit_close_session(&mut self) {
        log::info!("[reader] server closed the session");
    }
}
