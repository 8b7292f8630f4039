//! Networking primitives.
//!
//! Goals:
//! - One persistent, ordered, bidirectional channel (TCP).
//! - Length-prefixed frames; each frame is one JSON event envelope.
//! - Keep serialization explicit: typed events convert to and from
//!   [`Envelope`] at the edges, handlers see typed payloads only.

use anyhow::Context;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpListener, TcpStream,
    },
};
use tracing::trace;

/// Upper bound on a single frame payload.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("frame of {0} bytes exceeds the frame size limit")]
    FrameTooLarge(usize),
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),
}

/// A named event as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn new(event: &str, data: Value) -> Self {
        Self {
            event: event.to_string(),
            data,
        }
    }

    /// Wraps a typed, adjacently tagged event enum.
    pub fn from_event<E: Serialize>(event: &E) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_value(serde_json::to_value(event)?)?)
    }

    /// Reads the envelope back as a typed event enum.
    pub fn to_event<E: DeserializeOwned>(&self) -> Result<E, ProtocolError> {
        Ok(serde_json::from_value(serde_json::to_value(self)?)?)
    }
}

/// Encodes one envelope into a length-prefixed frame.
pub fn encode_frame(env: &Envelope) -> Result<Bytes, ProtocolError> {
    let payload = serde_json::to_vec(env)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(payload.len()));
    }
    let mut buf = BytesMut::with_capacity(4 + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.extend_from_slice(&payload);
    Ok(buf.freeze())
}

/// Decodes a frame payload (without the length prefix).
pub fn decode_payload(b: &[u8]) -> Result<Envelope, ProtocolError> {
    Ok(serde_json::from_slice(b)?)
}

/// Writes one frame.
pub async fn write_frame<W>(w: &mut W, env: &Envelope) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(env)?;
    w.write_all(&frame).await.context("tcp write")?;
    Ok(())
}

/// Reads one raw frame payload. `Ok(None)` means the peer closed the stream
/// cleanly between frames.
pub async fn read_raw_frame<R>(r: &mut R) -> anyhow::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match r.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e).context("tcp read len"),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    trace!(len, "frame header");
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len).into());
    }
    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload)
        .await
        .context("tcp read payload")?;
    Ok(Some(payload))
}

/// Reads and decodes one frame. A payload that is not a valid envelope is
/// an error here; use [`read_raw_frame`] to skip bad frames instead.
pub async fn read_frame<R>(r: &mut R) -> anyhow::Result<Option<Envelope>>
where
    R: AsyncRead + Unpin,
{
    match read_raw_frame(r).await? {
        Some(payload) => Ok(Some(decode_payload(&payload)?)),
        None => Ok(None),
    }
}

/// Reliable connection over TCP with length-prefixed frames.
#[derive(Debug)]
pub struct ReliableConn {
    stream: TcpStream,
}

impl ReliableConn {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    pub async fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await.context("tcp connect")?;
        stream.set_nodelay(true).context("tcp nodelay")?;
        Ok(Self { stream })
    }

    pub async fn send(&mut self, env: &Envelope) -> anyhow::Result<()> {
        write_frame(&mut self.stream, env).await
    }

    pub async fn recv(&mut self) -> anyhow::Result<Option<Envelope>> {
        read_frame(&mut self.stream).await
    }

    pub fn peer_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.stream.peer_addr()?)
    }

    /// Splits into independently owned read and write halves.
    pub fn into_split(self) -> (FrameReader, FrameWriter) {
        let (r, w) = self.stream.into_split();
        (FrameReader { inner: r }, FrameWriter { inner: w })
    }
}

/// Read half of a [`ReliableConn`].
#[derive(Debug)]
pub struct FrameReader {
    inner: OwnedReadHalf,
}

impl FrameReader {
    pub async fn recv(&mut self) -> anyhow::Result<Option<Envelope>> {
        read_frame(&mut self.inner).await
    }

    /// Next frame payload, undecoded. Framing stays in sync even when a
    /// payload turns out to be malformed.
    pub async fn recv_raw(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        read_raw_frame(&mut self.inner).await
    }
}

/// Write half of a [`ReliableConn`].
#[derive(Debug)]
pub struct FrameWriter {
    inner: OwnedWriteHalf,
}

impl FrameWriter {
    pub async fn send(&mut self, env: &Envelope) -> anyhow::Result<()> {
        write_frame(&mut self.inner, env).await
    }
}

/// TCP server listener.
pub struct ReliableListener {
    listener: TcpListener,
}

impl ReliableListener {
    pub async fn bind(addr: SocketAddr) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await.context("tcp bind")?;
        Ok(Self { listener })
    }

    pub async fn accept(&self) -> anyhow::Result<(ReliableConn, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await.context("tcp accept")?;
        Ok((ReliableConn::new(stream), addr))
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ClientEvent, PlayerUpdate};

    #[test]
    fn typed_event_goes_through_envelope() {
        let ev = ClientEvent::PlayerUpdate(PlayerUpdate {
            x: 1.0,
            y: 2.0,
            angle: 0.0,
        });
        let env = Envelope::from_event(&ev).unwrap();
        assert_eq!(env.event, "player_update");
        assert_eq!(env.data["x"], 1.0);
        assert_eq!(env.to_event::<ClientEvent>().unwrap(), ev);
    }

    #[tokio::test]
    async fn frames_stream_in_order_then_eof() {
        let a = Envelope::new("chat", serde_json::json!({"message": "hi"}));
        let b = Envelope::new("chat", serde_json::json!({"message": "there"}));
        let mut buf = Vec::new();
        write_frame(&mut buf, &a).await.unwrap();
        write_frame(&mut buf, &b).await.unwrap();

        let mut rd = buf.as_slice();
        assert_eq!(read_frame(&mut rd).await.unwrap(), Some(a));
        assert_eq!(read_frame(&mut rd).await.unwrap(), Some(b));
        assert_eq!(read_frame(&mut rd).await.unwrap(), None);
    }

    #[tokio::test]
    async fn bad_payload_does_not_desync_framing() {
        let good = Envelope::new("game_over", serde_json::json!({"winner": "red"}));
        let mut buf = Vec::new();
        buf.extend_from_slice(&3u32.to_be_bytes());
        buf.extend_from_slice(b"{{{");
        write_frame(&mut buf, &good).await.unwrap();

        let mut rd = buf.as_slice();
        let raw = read_raw_frame(&mut rd).await.unwrap().unwrap();
        assert!(decode_payload(&raw).is_err());
        assert_eq!(read_frame(&mut rd).await.unwrap(), Some(good));
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&((MAX_FRAME_LEN as u32) + 1).to_be_bytes());
        let mut rd = buf.as_slice();
        assert!(read_frame(&mut rd).await.is_err());
    }
}
