//! Non-blocking TCP link between the two players
//!
//! Connection setup blocks (it happens before the terminal goes raw); once
//! paired, the stream switches to non-blocking and the tick loop polls it.
//! Sends are fire-and-forget: a byte that cannot be written this instant is
//! dropped, matching the best-effort nature of the protocol.

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};

use anyhow::{Context, Result};

use crate::net::wire;
use crate::types::PeerMessage;

/// Listening side of the pairing handshake.
pub struct NetListener {
    listener: TcpListener,
}

impl NetListener {
    /// Bind on all interfaces. Port 0 asks the OS for a free one.
    pub fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .with_context(|| format!("failed to listen on port {port}"))?;
        Ok(Self { listener })
    }

    pub fn local_port(&self) -> Result<u16> {
        Ok(self.listener.local_addr()?.port())
    }

    /// Block until the peer connects.
    pub fn accept(self) -> Result<NetLink> {
        let (stream, addr) = self
            .listener
            .accept()
            .context("failed to accept peer connection")?;
        NetLink::from_stream(stream).with_context(|| format!("peer {addr}"))
    }
}

/// An established peer connection carrying one-byte protocol messages.
pub struct NetLink {
    stream: TcpStream,
    /// Undecodable bytes received and skipped
    protocol_errors: u32,
}

impl NetLink {
    /// Block until connected to a listening peer.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port))
            .with_context(|| format!("failed to connect to {host}:{port}"))?;
        Self::from_stream(stream)
    }

    fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            protocol_errors: 0,
        })
    }

    /// Send a message, best effort. A transient full buffer drops the byte;
    /// a dead connection reports the error so the caller can end the session.
    pub fn send(&mut self, msg: PeerMessage) -> std::io::Result<()> {
        match self.stream.write(&[wire::encode(msg)]) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Poll for one message. `Ok(None)` when nothing is pending; an error
    /// means the connection is gone (EOF included). Unknown bytes are counted
    /// and skipped.
    pub fn poll(&mut self) -> std::io::Result<Option<PeerMessage>> {
        let mut byte = [0u8; 1];
        loop {
            match self.stream.read(&mut byte) {
                Ok(0) => {
                    return Err(std::io::Error::new(
                        ErrorKind::UnexpectedEof,
                        "peer closed the connection",
                    ));
                }
                Ok(_) => match wire::decode(byte[0]) {
                    Some(msg) => return Ok(Some(msg)),
                    None => {
                        self.protocol_errors += 1;
                        continue;
                    }
                },
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(None),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    pub fn protocol_errors(&self) -> u32 {
        self.protocol_errors
    }
}
