//! A single peer connection: transport, liveness flag and read buffer.

use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use bytes::{BufMut, BytesMut};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{P2pError, P2pResult};
use crate::peer::{ConnectionDirection, ConnectionSnapshot, HeartbeatState};
use crate::protocol::{Envelope, EnvelopeCodec};

/// Outcome of one non-blocking read attempt.
#[derive(Debug)]
pub enum ReadOutcome {
    /// Nothing to read right now (would block, or the peer has closed).
    Idle,
    /// Bytes arrived. Holds every complete line they finished, in order,
    /// along with any framing errors hit on the way.
    Frames(Vec<P2pResult<String>>),
}

/// A registered peer connection.
///
/// Owned by the registry. Nothing outside the registry keeps a reference
/// across lock acquisitions.
#[derive(Debug)]
pub struct Connection {
    /// Registry key.
    addr: SocketAddr,
    /// Transport.
    stream: TcpStream,
    /// Who dialed whom.
    direction: ConnectionDirection,
    /// Heartbeat state.
    state: HeartbeatState,
    /// When the connection was registered.
    connected_at: Instant,
    /// Bytes read but not yet split into lines.
    read_buf: BytesMut,
    /// Line codec, stateful across reads.
    codec: EnvelopeCodec,
    /// Number of bytes received.
    bytes_recv: u64,
    /// Number of bytes sent.
    bytes_sent: u64,
}

impl Connection {
    /// Wrap a connected stream. New connections start alive.
    pub fn new(
        addr: SocketAddr,
        stream: TcpStream,
        direction: ConnectionDirection,
        max_frame_size: usize,
    ) -> Self {
        Self {
            addr,
            stream,
            direction,
            state: HeartbeatState::Alive,
            connected_at: Instant::now(),
            read_buf: BytesMut::new(),
            codec: EnvelopeCodec::new(max_frame_size),
            bytes_recv: 0,
            bytes_sent: 0,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn direction(&self) -> ConnectionDirection {
        self.direction
    }

    pub fn state(&self) -> HeartbeatState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        self.state.is_alive()
    }

    /// Mark the connection alive. Returns `true` if it was awaiting a reply.
    pub fn mark_alive(&mut self) -> bool {
        let was_waiting = self.state.is_awaiting_reply();
        self.transition_to(HeartbeatState::Alive);
        was_waiting
    }

    /// Start a heartbeat round for this connection.
    pub fn mark_awaiting_reply(&mut self) {
        self.transition_to(HeartbeatState::AwaitingReply);
    }

    fn transition_to(&mut self, new_state: HeartbeatState) {
        if self.state != new_state {
            tracing::trace!(
                peer = %self.addr,
                from = %self.state,
                to = %new_state,
                "Heartbeat state transition"
            );
            self.state = new_state;
        }
    }

    /// Read at most `max_read_size` bytes without blocking and split off
    /// every complete line.
    pub fn try_read_frames(&mut self, max_read_size: usize) -> io::Result<ReadOutcome> {
        self.read_buf.reserve(max_read_size);

        let n = match self
            .stream
            .try_read_buf(&mut (&mut self.read_buf).limit(max_read_size))
        {
            Ok(0) => return Ok(ReadOutcome::Idle),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(ReadOutcome::Idle),
            Err(e) => return Err(e),
        };
        self.bytes_recv += n as u64;

        let mut frames = Vec::new();
        loop {
            match self.codec.decode(&mut self.read_buf) {
                Ok(Some(line)) => frames.push(Ok(line)),
                Ok(None) => break,
                Err(e) => frames.push(Err(e)),
            }
        }
        Ok(ReadOutcome::Frames(frames))
    }

    /// Encode and send one envelope.
    pub async fn send(&mut self, envelope: &Envelope, write_timeout: Duration) -> P2pResult<usize> {
        let mut frame = BytesMut::new();
        self.codec.encode(envelope, &mut frame)?;
        self.write_frame(&frame, write_timeout).await
    }

    /// Write an already encoded frame.
    pub async fn write_frame(&mut self, frame: &[u8], write_timeout: Duration) -> P2pResult<usize> {
        match timeout(write_timeout, self.stream.write_all(frame)).await {
            Ok(Ok(())) => {
                self.bytes_sent += frame.len() as u64;
                Ok(frame.len())
            }
            Ok(Err(e)) => Err(P2pError::Io(e)),
            Err(_) => Err(P2pError::WriteTimeout { addr: self.addr }),
        }
    }

    /// Shut the transport down for writing, then drop (close) it.
    pub async fn shutdown(mut self) -> P2pResult<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    /// Read-only view for display.
    pub fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            addr: self.addr,
            direction: self.direction,
            state: self.state,
            connected_for: self.connected_at.elapsed(),
            bytes_recv: self.bytes_recv,
            bytes_sent: self.bytes_sent,
        }
    }
}
