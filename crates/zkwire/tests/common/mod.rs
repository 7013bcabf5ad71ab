// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scripted loopback server shared by the integration tests.

#![allow(dead_code)]

use std::io;
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use zkwire::protocol::{ConnectRequest, ConnectResponse, FrameCodec};
use zkwire::{Message, Protocol};

/// How long the server waits for a client frame before failing the test.
pub const SERVER_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Server side of one accepted client connection.
pub struct ServerConn {
    stream: TcpStream,
    codec: FrameCodec,
    protocol: Protocol,
}

impl ServerConn {
    fn new(stream: TcpStream) -> Self {
        stream
            .set_read_timeout(Some(SERVER_READ_TIMEOUT))
            .expect("set_read_timeout");
        Self {
            stream,
            codec: FrameCodec::with_default_max(),
            protocol: Protocol::standard(),
        }
    }

    /// Next message from the client; panics on timeout or EOF.
    pub fn recv(&mut self) -> Message {
        let body = self
            .codec
            .decode(&mut self.stream)
            .expect("server read failed")
            .expect("server timed out waiting for a client frame");
        self.protocol.decode(&body).expect("client sent garbage")
    }

    pub fn send(&mut self, message: &Message) {
        let body = self.protocol.encode(message).expect("encode");
        self.send_raw(&body);
    }

    /// Frame and write an arbitrary body.
    pub fn send_raw(&mut self, body: &[u8]) {
        FrameCodec::write_frame(&mut self.stream, body).expect("server write failed");
    }

    /// Read the ConnectRequest and grant `session_id`.
    pub fn accept_session(&mut self, session_id: i64) -> ConnectRequest {
        let request = match self.recv() {
            Message::ConnectRequest(request) => request,
            other => panic!("expected ConnectRequest, got {:?}", other),
        };
        self.send(&Message::ConnectResponse(ConnectResponse {
            protocol_version: request.protocol_version,
            timeout_ms: request.timeout_ms,
            session_id,
            password: vec![1; 16],
        }));
        request
    }

    /// Read until the client sends CloseSession; returns what came before.
    pub fn recv_until_close(&mut self) -> Vec<Message> {
        let mut seen = Vec::new();
        loop {
            match self.recv() {
                Message::CloseSession => return seen,
                other => seen.push(other),
            }
        }
    }

    /// True once the client closed its end.
    pub fn peer_closed(&mut self) -> bool {
        match self.codec.decode(&mut self.stream) {
            Err(e) => matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset
            ),
            Ok(_) => false,
        }
    }
}

/// Listen on an ephemeral loopback port and run `handler` on the first
/// accepted connection.
pub fn spawn_server<F, T>(handler: F) -> (String, JoinHandle<T>)
where
    F: FnOnce(ServerConn) -> T + Send + 'static,
    T: Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("local_addr").to_string();
    let handle = thread::Builder::new()
        .name("test-server".to_string())
        .spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            handler(ServerConn::new(stream))
        })
        .expect("spawn server");
    (address, handle)
}

/// A loopback address nothing listens on.
pub fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("local_addr").to_string();
    drop(listener);
    address
}
