// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory [`ByteStream`] for unit tests.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{BoxedByteStream, ByteStream};

/// Mock byte stream.
///
/// Reads drain `read_data` and return `WouldBlock` when it is empty, like a
/// socket whose read timeout expired. Clones share all buffers.
#[derive(Debug, Clone)]
pub struct MockStream {
    read_data: Arc<Mutex<VecDeque<u8>>>,
    write_data: Arc<Mutex<Vec<u8>>>,
    connected: Arc<AtomicBool>,
    peer_addr: SocketAddr,
}

impl MockStream {
    pub fn new() -> Self {
        Self {
            read_data: Arc::new(Mutex::new(VecDeque::new())),
            write_data: Arc::new(Mutex::new(Vec::new())),
            connected: Arc::new(AtomicBool::new(true)),
            peer_addr: SocketAddr::from(([127, 0, 0, 1], 2181)),
        }
    }

    /// Add data to the read buffer.
    pub fn feed_read_data(&self, data: &[u8]) {
        self.read_data.lock().extend(data);
    }

    /// Get all data written to this stream.
    pub fn get_written_data(&self) -> Vec<u8> {
        self.write_data.lock().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl Default for MockStream {
    fn default() -> Self {
        Self::new()
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.is_connected() {
            return Ok(0); // EOF
        }
        let mut data = self.read_data.lock();
        if data.is_empty() {
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "would block"));
        }
        let to_read = buf.len().min(data.len());
        for (slot, byte) in buf.iter_mut().zip(data.drain(..to_read)) {
            *slot = byte;
        }
        Ok(to_read)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.is_connected() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "not connected"));
        }
        self.write_data.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteStream for MockStream {
    fn shutdown(&self, _how: Shutdown) -> io::Result<()> {
        self.connected.store(false, Ordering::Release);
        Ok(())
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(SocketAddr::from(([127, 0, 0, 1], 40_000)))
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.peer_addr)
    }

    fn set_nodelay(&self, _nodelay: bool) -> io::Result<()> {
        Ok(())
    }

    fn set_read_timeout(&self, _dur: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn set_write_timeout(&self, _dur: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn try_clone_stream(&self) -> io::Result<BoxedByteStream> {
        Ok(Box::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_stream_basic() {
        let mut stream = MockStream::new();

        stream.write_all(b"hello").unwrap();
        assert_eq!(stream.get_written_data(), b"hello");

        let mut buf = [0u8; 10];
        let err = stream.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);

        stream.feed_read_data(b"world");
        let n = stream.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"world");
    }

    #[test]
    fn test_mock_stream_shutdown_shared_by_clones() {
        let mut stream = MockStream::new();
        let clone = stream.try_clone_stream().unwrap();

        clone.shutdown(Shutdown::Both).unwrap();
        assert!(!stream.is_connected());

        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
        assert!(stream.write(b"x").is_err());
    }
}
