//! Connection channel.
//!
//! One TCP connection split into a reader task and a writer task. The owner
//! never awaits the socket: outbound events are queued to the writer, and
//! inbound envelopes arrive on a channel in wire order. There is no
//! reconnect; once either side fails the channel reports itself closed.

use std::net::SocketAddr;

use anyhow::Context;
use arena_shared::{
    net::{decode_payload, Envelope, FrameReader, FrameWriter, ReliableConn},
    protocol::ClientEvent,
};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::commands::EventSink;

/// What the reader task hands to the owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Message(Envelope),
    /// Sent once; nothing follows it.
    Closed { reason: String },
}

#[derive(Debug)]
pub struct ConnectionChannel {
    tx: mpsc::UnboundedSender<Envelope>,
    peer: SocketAddr,
    reader: JoinHandle<()>,
}

impl ConnectionChannel {
    pub async fn connect(
        addr: &str,
    ) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<ChannelEvent>)> {
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("parse server address '{addr}'"))?;
        info!(server = %addr, "Connecting to server");
        let conn = ReliableConn::connect(addr).await?;
        Self::from_conn(conn)
    }

    /// Takes over an established connection and starts its tasks.
    pub fn from_conn(
        conn: ReliableConn,
    ) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<ChannelEvent>)> {
        let peer = conn.peer_addr().context("peer addr")?;
        let (reader, writer) = conn.into_split();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        let reader = tokio::spawn(read_loop(reader, in_tx, peer));
        tokio::spawn(write_loop(writer, out_rx, peer));

        Ok((
            Self {
                tx: out_tx,
                peer,
                reader,
            },
            in_rx,
        ))
    }

    /// Queues one event. Returns `false` if the event could not be queued,
    /// either because it failed to encode or the writer is gone.
    pub fn send_event(&self, event: &ClientEvent) -> bool {
        let env = match Envelope::from_event(event) {
            Ok(env) => env,
            Err(e) => {
                warn!(event = event.name(), error = %e, "Dropping unencodable event");
                return false;
            }
        };
        if self.tx.send(env).is_err() {
            debug!(event = event.name(), "Channel closed; event dropped");
            return false;
        }
        true
    }

    /// Whether the writer is still accepting events.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl EventSink for ConnectionChannel {
    fn send(&mut self, event: ClientEvent) {
        self.send_event(&event);
    }
}

impl Drop for ConnectionChannel {
    fn drop(&mut self) {
        // Writer drains and exits on its own once `tx` is dropped.
        self.reader.abort();
    }
}

async fn read_loop(
    mut reader: FrameReader,
    tx: mpsc::UnboundedSender<ChannelEvent>,
    peer: SocketAddr,
) {
    let reason = loop {
        match reader.recv_raw().await {
            Ok(Some(payload)) => match decode_payload(&payload) {
                Ok(env) => {
                    if tx.send(ChannelEvent::Message(env)).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!(
                        peer = %peer,
                        error = %e,
                        len = payload.len(),
                        "Skipping malformed frame"
                    );
                }
            },
            Ok(None) => break "server closed the connection".to_string(),
            Err(e) => break format!("{e:#}"),
        }
    };
    info!(peer = %peer, reason = %reason, "Connection closed");
    let _ = tx.send(ChannelEvent::Closed { reason });
}

async fn write_loop(
    mut writer: FrameWriter,
    mut rx: mpsc::UnboundedReceiver<Envelope>,
    peer: SocketAddr,
) {
    while let Some(env) = rx.recv().await {
        if let Err(e) = writer.send(&env).await {
            warn!(peer = %peer, event = %env.event, error = %format!("{e:#}"), "Write failed");
            break;
        }
    }
    debug!(peer = %peer, "Writer finished");
}
