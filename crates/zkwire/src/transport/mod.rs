// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte-stream transport and timed dialing.
//!
//! [`ByteStream`] abstracts the connected socket so the handshake and the
//! reader loop can run over TCP or over an in-memory test double.
//! [`Dialer`] is the seam failover goes through to open one.

#[cfg(test)]
pub mod mock;

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use socket2::{Domain, Protocol, SockAddr, Socket, TcpKeepalive, Type};

use crate::cluster::Host;

/// Connected, ordered, reliable byte stream.
pub trait ByteStream: Read + Write + Send {
    /// Shut down one or both halves. Takes `&self` so another thread can
    /// unblock a pending read.
    fn shutdown(&self, how: Shutdown) -> io::Result<()>;

    fn local_addr(&self) -> io::Result<SocketAddr>;

    fn peer_addr(&self) -> io::Result<SocketAddr>;

    fn set_nodelay(&self, nodelay: bool) -> io::Result<()>;

    /// `None` blocks indefinitely.
    fn set_read_timeout(&self, dur: Option<Duration>) -> io::Result<()>;

    fn set_write_timeout(&self, dur: Option<Duration>) -> io::Result<()>;

    /// Second handle on the same connection (reader/writer split).
    fn try_clone_stream(&self) -> io::Result<BoxedByteStream>;
}

/// Type alias for a boxed ByteStream.
pub type BoxedByteStream = Box<dyn ByteStream>;

impl ByteStream for TcpStream {
    fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        TcpStream::shutdown(self, how)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::local_addr(self)
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::peer_addr(self)
    }

    fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
        TcpStream::set_nodelay(self, nodelay)
    }

    fn set_read_timeout(&self, dur: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, dur)
    }

    fn set_write_timeout(&self, dur: Option<Duration>) -> io::Result<()> {
        TcpStream::set_write_timeout(self, dur)
    }

    fn try_clone_stream(&self) -> io::Result<BoxedByteStream> {
        Ok(Box::new(self.try_clone()?))
    }
}

/// Opens a transport to one host within a deadline.
pub trait Dialer: Send + Sync + fmt::Debug {
    fn dial(&self, host: &Host, timeout: Duration) -> io::Result<BoxedByteStream>;
}

/// Plain TCP dialer.
#[derive(Debug, Clone)]
pub struct TcpDialer {
    /// TCP_NODELAY on the connected socket
    pub nodelay: bool,
    /// Idle time before keepalive probes; `None` leaves keepalive off
    pub keepalive: Option<Duration>,
}

impl Default for TcpDialer {
    fn default() -> Self {
        Self {
            nodelay: true,
            keepalive: Some(Duration::from_secs(30)),
        }
    }
}

impl TcpDialer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    pub fn with_keepalive(mut self, keepalive: Option<Duration>) -> Self {
        self.keepalive = keepalive;
        self
    }

    fn connect_addr(&self, addr: SocketAddr, timeout: Duration) -> io::Result<TcpStream> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        if let Some(idle) = self.keepalive {
            socket.set_tcp_keepalive(&TcpKeepalive::new().with_time(idle))?;
        }
        socket.connect_timeout(&SockAddr::from(addr), timeout)?;
        let stream: TcpStream = socket.into();
        stream.set_nodelay(self.nodelay)?;
        Ok(stream)
    }
}

impl Dialer for TcpDialer {
    fn dial(&self, host: &Host, timeout: Duration) -> io::Result<BoxedByteStream> {
        let mut last_err = None;
        for addr in host.resolve()? {
            match self.connect_addr(addr, timeout) {
                Ok(stream) => return Ok(Box::new(stream)),
                Err(e) => {
                    log::debug!("[dial] {} ({}) failed: {}", host, addr, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("{} resolved to no addresses", host),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_tcp_dialer_connects() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let host = Host::from(listener.local_addr().unwrap());

        let stream = TcpDialer::new()
            .dial(&host, Duration::from_secs(2))
            .unwrap();
        assert_eq!(stream.peer_addr().unwrap(), listener.local_addr().unwrap());

        let clone = stream.try_clone_stream().unwrap();
        assert_eq!(clone.local_addr().unwrap(), stream.local_addr().unwrap());
    }

    #[test]
    fn test_tcp_dialer_refused() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let result = TcpDialer::new()
            .with_keepalive(None)
            .dial(&Host::from(addr), Duration::from_millis(500));
        assert!(result.is_err());
    }

    #[test]
    fn test_tcp_dialer_unresolvable() {
        let result = TcpDialer::new().dial(
            &Host::new("no-such-host.invalid:2181"),
            Duration::from_millis(500),
        );
        assert!(result.is_err());
    }
}
