// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Session initialization run on a freshly dialed transport.
//!
//! ```text
//! client                          server
//!   | ---- ConnectRequest ---------> |
//!   | <--- ConnectResponse --------- |   (or ErrorResponse)
//!   | ---- AuthRequest ------------> |   only with credentials
//!   | <--- AuthResponse ------------ |   code 0 = accepted
//! ```

use std::time::Duration;

use super::config::{ConnectionConfig, Credentials};
use crate::error::{Error, Result};
use crate::protocol::{
    AuthRequest, ConnectRequest, ConnectResponse, FrameCodec, Message, MessageKind,
};
use crate::transport::ByteStream;

/// Protocol version announced in the connect request.
pub const PROTOCOL_VERSION: i32 = 0;

/// Length of the session password a new session starts with.
const EMPTY_PASSWORD_LEN: usize = 16;

/// Session granted by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: i64,
    /// Timeout negotiated by the server (may differ from the requested one).
    pub timeout: Duration,
    pub password: Vec<u8>,
    pub protocol_version: i32,
}

impl Session {
    fn from_response(response: ConnectResponse) -> Result<Self> {
        let timeout_ms = u64::try_from(response.timeout_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .ok_or_else(|| {
                Error::Handshake(format!(
                    "server rejected the session (negotiated timeout {} ms)",
                    response.timeout_ms
                ))
            })?;
        Ok(Self {
            session_id: response.session_id,
            timeout: Duration::from_millis(timeout_ms),
            password: response.password,
            protocol_version: response.protocol_version,
        })
    }
}

pub(crate) struct Handshake<'a> {
    config: &'a ConnectionConfig,
    codec: FrameCodec,
}

impl<'a> Handshake<'a> {
    pub(crate) fn new(config: &'a ConnectionConfig) -> Self {
        Self {
            config,
            codec: FrameCodec::new(config.max_message_size),
        }
    }

    pub(crate) fn run(&mut self, stream: &mut dyn ByteStream) -> Result<Session> {
        stream.set_read_timeout(self.config.handshake_timeout)?;

        let timeout_ms = i32::try_from(self.config.session_timeout.as_millis())
            .map_err(|_| Error::Config("session_timeout exceeds i32 milliseconds".into()))?;
        let request = ConnectRequest {
            protocol_version: PROTOCOL_VERSION,
            last_zxid_seen: 0,
            timeout_ms,
            session_id: 0,
            password: vec![0; EMPTY_PASSWORD_LEN],
        };
        self.send(stream, &Message::ConnectRequest(request))?;

        let session = match self.receive(stream)? {
            Message::ConnectResponse(response) => Session::from_response(response)?,
            other => return Err(unexpected(other, MessageKind::ConnectResponse)),
        };
        log::debug!(
            "[handshake] session {:#x} granted ({} ms)",
            session.session_id,
            session.timeout.as_millis()
        );

        if let Some(credentials) = &self.config.credentials {
            self.authenticate(stream, credentials)?;
        }
        Ok(session)
    }

    fn authenticate(&mut self, stream: &mut dyn ByteStream, credentials: &Credentials) -> Result<()> {
        let request = AuthRequest {
            scheme: credentials.scheme.clone(),
            credentials: credentials.secret.clone(),
        };
        self.send(stream, &Message::AuthRequest(request))?;

        match self.receive(stream)? {
            Message::AuthResponse(response) if response.code == 0 => {
                log::debug!("[handshake] authenticated ({})", credentials.scheme);
                Ok(())
            }
            Message::AuthResponse(response) => Err(Error::Handshake(format!(
                "authentication with scheme '{}' rejected (code {})",
                credentials.scheme, response.code
            ))),
            other => Err(unexpected(other, MessageKind::AuthResponse)),
        }
    }

    fn send(&self, stream: &mut dyn ByteStream, message: &Message) -> Result<()> {
        let body = self.config.protocol.encode(message)?;
        FrameCodec::write_frame(stream, &body)?;
        Ok(())
    }

    fn receive(&mut self, stream: &mut dyn ByteStream) -> Result<Message> {
        match self.codec.decode(stream)? {
            Some(body) => Ok(self.config.protocol.decode(&body)?),
            None => Err(Error::Handshake("timed out waiting for server reply".into())),
        }
    }
}

/// An `ErrorResponse` becomes `Error::Server`; anything else is a
/// handshake failure.
fn unexpected(message: Message, expected: MessageKind) -> Error {
    match message {
        Message::ErrorResponse(e) => Error::Server {
            code: e.code,
            message: e.message,
        },
        other => Error::Handshake(format!("expected {}, got {}", expected, other.kind())),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::protocol::{AuthResponse, ErrorResponse, Protocol};
    use crate::transport::mock::MockStream;

    pub(crate) fn frame(message: &Message) -> Vec<u8> {
        let body = Protocol::standard().encode(message).unwrap();
        FrameCodec::encode(&body).unwrap()
    }

    pub(crate) fn accept(session_id: i64) -> Message {
        Message::ConnectResponse(ConnectResponse {
            protocol_version: PROTOCOL_VERSION,
            timeout_ms: 10_000,
            session_id,
            password: vec![7; 16],
        })
    }

    /// Decode every frame the client wrote.
    pub(crate) fn written(stream: &MockStream) -> Vec<Message> {
        let data = stream.get_written_data();
        let mut reader = &data[..];
        let mut codec = FrameCodec::with_default_max();
        let protocol = Protocol::standard();
        let mut messages = Vec::new();
        while !reader.is_empty() {
            let body = codec.decode(&mut reader).unwrap().unwrap();
            messages.push(protocol.decode(&body).unwrap());
        }
        messages
    }

    fn config() -> ConnectionConfig {
        ConnectionConfig::from_hosts("127.0.0.1:2181")
            .unwrap()
            .with_session_timeout(Duration::from_secs(12))
    }

    #[test]
    fn test_handshake_success() {
        let config = config();
        let mut stream = MockStream::new();
        stream.feed_read_data(&frame(&accept(0x1234)));

        let session = Handshake::new(&config).run(&mut stream).unwrap();
        assert_eq!(session.session_id, 0x1234);
        assert_eq!(session.timeout, Duration::from_secs(10));
        assert_eq!(session.password, vec![7; 16]);

        let sent = written(&stream);
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            Message::ConnectRequest(request) => {
                assert_eq!(request.timeout_ms, 12_000);
                assert_eq!(request.session_id, 0);
                assert_eq!(request.protocol_version, PROTOCOL_VERSION);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_handshake_with_auth() {
        let config = config().with_credentials(Credentials::new("digest", b"u:p".to_vec()));
        let mut stream = MockStream::new();
        stream.feed_read_data(&frame(&accept(1)));
        stream.feed_read_data(&frame(&Message::AuthResponse(AuthResponse { code: 0 })));

        assert!(Handshake::new(&config).run(&mut stream).is_ok());
        let sent = written(&stream);
        assert_eq!(
            sent[1],
            Message::AuthRequest(AuthRequest {
                scheme: "digest".into(),
                credentials: b"u:p".to_vec(),
            })
        );
    }

    #[test]
    fn test_auth_rejected() {
        let config = config().with_credentials(Credentials::new("digest", b"u:bad".to_vec()));
        let mut stream = MockStream::new();
        stream.feed_read_data(&frame(&accept(1)));
        stream.feed_read_data(&frame(&Message::AuthResponse(AuthResponse { code: -115 })));

        let err = Handshake::new(&config).run(&mut stream).unwrap_err();
        assert!(matches!(err, Error::Handshake(ref m) if m.contains("-115")));
    }

    #[test]
    fn test_server_error_response() {
        let config = config();
        let mut stream = MockStream::new();
        stream.feed_read_data(&frame(&Message::ErrorResponse(ErrorResponse {
            code: -4,
            message: "connection loss".into(),
        })));

        match Handshake::new(&config).run(&mut stream) {
            Err(Error::Server { code, message }) => {
                assert_eq!(code, -4);
                assert_eq!(message, "connection loss");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_expired_session_rejected() {
        let config = config();
        let mut stream = MockStream::new();
        stream.feed_read_data(&frame(&Message::ConnectResponse(ConnectResponse {
            timeout_ms: 0,
            ..ConnectResponse::default()
        })));

        assert!(matches!(
            Handshake::new(&config).run(&mut stream),
            Err(Error::Handshake(_))
        ));
    }

    #[test]
    fn test_no_reply_times_out() {
        let config = config();
        let mut stream = MockStream::new();
        assert!(matches!(
            Handshake::new(&config).run(&mut stream),
            Err(Error::Handshake(ref m)) if m.contains("timed out")
        ));
    }

    #[test]
    fn test_unexpected_reply() {
        let config = config();
        let mut stream = MockStream::new();
        stream.feed_read_data(&frame(&Message::Pong));
        assert!(matches!(
            Handshake::new(&config).run(&mut stream),
            Err(Error::Handshake(ref m)) if m.contains("got Pong")
        ));
    }

    #[test]
    fn test_garbage_reply_is_protocol_error() {
        let config = config();
        let mut stream = MockStream::new();
        stream.feed_read_data(&FrameCodec::encode(&99i32.to_be_bytes()).unwrap());
        assert!(matches!(
            Handshake::new(&config).run(&mut stream),
            Err(Error::Protocol(_))
        ));
    }
}
