//! Scripted fake server for end-to-end client tests.
//!
//! Speaks the same framed transport as a real server but has no game logic:
//! each test decides exactly which events go out and asserts on what the
//! client sends back.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use anyhow::{bail, Context};
use arena_shared::{
    config::ClientConfig,
    math::Vec2,
    net::{read_frame, write_frame, Envelope, MAX_FRAME_LEN},
    protocol::{ClientEvent, JoinRequest, PlayerUpdate, ServerEvent},
    world::{Actor, Team, ACTOR_SIZE},
};
use rand::Rng;
use tokio::{
    io::AsyncWriteExt,
    net::{tcp::OwnedWriteHalf, TcpListener, TcpStream},
    sync::mpsc,
    time::{timeout, timeout_at, Instant},
};
use tracing::{debug, warn};

/// How long a peer waits for the client before failing the test.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Arena size the fake server pretends to run.
pub const ARENA: Vec2 = Vec2::new(800.0, 600.0);

/// Installs a test-writer subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Binds a fake server to an ephemeral localhost port and returns it with a
/// client config pointing at it.
pub async fn bind_ephemeral(tick_hz: u32) -> anyhow::Result<(FakeServer, ClientConfig)> {
    let bind = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
    let listener = TcpListener::bind(bind).await.context("tcp bind")?;
    let addr = listener.local_addr()?;
    let cfg = ClientConfig {
        server_addr: addr.to_string(),
        tick_hz,
        ..Default::default()
    };
    Ok((FakeServer { listener }, cfg))
}

/// A spawn point that keeps the whole actor box inside the arena.
pub fn random_spawn(sid: &str, name: &str, team: Team) -> Actor {
    let mut rng = rand::thread_rng();
    let pos = Vec2::new(
        rng.gen_range(0.0..ARENA.x - ACTOR_SIZE),
        rng.gen_range(0.0..ARENA.y - ACTOR_SIZE),
    );
    Actor::new(sid, name, team, pos)
}

pub struct FakeServer {
    listener: TcpListener,
}

impl FakeServer {
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Waits for one client connection.
    pub async fn accept(&self) -> anyhow::Result<FakePeer> {
        let (stream, peer) = timeout(RECV_TIMEOUT, self.listener.accept())
            .await
            .context("accept timed out")?
            .context("tcp accept")?;
        debug!(%peer, "Fake server accepted client");
        Ok(FakePeer::new(stream, peer))
    }
}

/// Server side of one client connection. A reader task decodes whatever
/// the client sends so waits can time out without tearing a frame.
pub struct FakePeer {
    writer: OwnedWriteHalf,
    events: mpsc::UnboundedReceiver<ClientEvent>,
    peer: SocketAddr,
}

impl FakePeer {
    fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        let (mut reader, writer) = stream.into_split();
        let (tx, events) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Ok(Some(env)) = read_frame(&mut reader).await {
                match env.to_event::<ClientEvent>() {
                    Ok(ev) => {
                        if tx.send(ev).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "Client sent an unknown event"),
                }
            }
        });
        Self {
            writer,
            events,
            peer,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub async fn send(&mut self, event: &ServerEvent) -> anyhow::Result<()> {
        let env = Envelope::from_event(event)?;
        self.send_envelope(&env).await
    }

    /// Sends an arbitrary envelope, e.g. one whose payload is invalid.
    pub async fn send_envelope(&mut self, env: &Envelope) -> anyhow::Result<()> {
        write_frame(&mut self.writer, env).await
    }

    /// Sends a correctly framed payload that need not be JSON.
    pub async fn send_raw(&mut self, payload: &[u8]) -> anyhow::Result<()> {
        if payload.len() > MAX_FRAME_LEN {
            bail!("raw payload too large");
        }
        self.writer
            .write_all(&(payload.len() as u32).to_be_bytes())
            .await?;
        self.writer.write_all(payload).await?;
        Ok(())
    }

    /// Next client event, whatever it is.
    pub async fn recv(&mut self) -> anyhow::Result<ClientEvent> {
        timeout(RECV_TIMEOUT, self.events.recv())
            .await
            .context("recv timed out")?
            .context("client closed the connection")
    }

    /// Next event that is not a per-tick `player_update`.
    pub async fn recv_action(&mut self) -> anyhow::Result<ClientEvent> {
        loop {
            match self.recv().await? {
                ClientEvent::PlayerUpdate(_) => continue,
                other => return Ok(other),
            }
        }
    }

    pub async fn recv_update(&mut self) -> anyhow::Result<PlayerUpdate> {
        loop {
            if let ClientEvent::PlayerUpdate(u) = self.recv().await? {
                return Ok(u);
            }
        }
    }

    /// Everything except updates that arrives within `window`.
    pub async fn actions_within(&mut self, window: Duration) -> Vec<ClientEvent> {
        let deadline = Instant::now() + window;
        let mut out = Vec::new();
        while let Ok(Some(ev)) = timeout_at(deadline, self.events.recv()).await {
            if !matches!(ev, ClientEvent::PlayerUpdate(_)) {
                out.push(ev);
            }
        }
        out
    }

    /// Expects `join`, answers with `joined` for a freshly spawned actor.
    pub async fn accept_join(&mut self, team: Team) -> anyhow::Result<(JoinRequest, Actor)> {
        let join = match self.recv_action().await? {
            ClientEvent::Join(join) => join,
            other => bail!("expected join, got {other:?}"),
        };
        let actor = random_spawn(&format!("sid-{}", self.peer.port()), &join.name, team);
        self.send(&ServerEvent::Joined(actor.clone())).await?;
        Ok((join, actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawns_stay_inside_arena() {
        for _ in 0..200 {
            let a = random_spawn("s", "n", Team::Red);
            assert!(a.x >= 0.0 && a.x <= ARENA.x - ACTOR_SIZE);
            assert!(a.y >= 0.0 && a.y <= ARENA.y - ACTOR_SIZE);
        }
    }
}
