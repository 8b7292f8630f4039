//! End-to-end tests: real client driver against a scripted fake server over
//! localhost TCP.

use std::time::Duration;

use arena_client::{ClientInput, GameClient, SessionPhase};
use arena_shared::{
    input::InputSignal,
    net::Envelope,
    protocol::{ChatSend, ClientEvent, GameMode, GameOver, ServerEvent},
    world::{Actor, ChatLine, Snapshot, Team},
};
use arena_tests::{bind_ephemeral, init_tracing, FakePeer};
use serde_json::json;
use tokio::{sync::mpsc, task::JoinHandle};

/// Lets the client task catch up with events sent from both sides.
const SETTLE: Duration = Duration::from_millis(200);

struct Harness {
    peer: FakePeer,
    input: mpsc::Sender<ClientInput>,
    client: JoinHandle<anyhow::Result<GameClient>>,
}

impl Harness {
    async fn start() -> anyhow::Result<Self> {
        init_tracing();
        let (server, cfg) = bind_ephemeral(60).await?;
        let mut client = GameClient::connect(&cfg).await?;
        let peer = server.accept().await?;

        let (input, rx) = mpsc::channel(32);
        let client = tokio::spawn(async move {
            client.run(rx).await?;
            Ok(client)
        });
        Ok(Self {
            peer,
            input,
            client,
        })
    }

    async fn input(&self, cmd: ClientInput) -> anyhow::Result<()> {
        self.input.send(cmd).await?;
        Ok(())
    }

    async fn signal(&self, signal: InputSignal) -> anyhow::Result<()> {
        self.input(ClientInput::Signal(signal)).await
    }

    /// Menu -> Playing as `name` in pvp. Returns once the client is playing.
    async fn join(&mut self, name: &str) -> anyhow::Result<Actor> {
        self.input(ClientInput::SelectMode {
            mode: GameMode::Pvp,
            name: Some(name.to_string()),
        })
        .await?;
        let (join, actor) = self.peer.accept_join(Team::Blue).await?;
        assert_eq!(join.name, name);
        assert_eq!(join.mode, GameMode::Pvp);
        // Updates only flow once `joined` has been applied.
        self.peer.recv_update().await?;
        Ok(actor)
    }

    async fn quit(self) -> anyhow::Result<(GameClient, FakePeer)> {
        tokio::time::sleep(SETTLE).await;
        self.input.send(ClientInput::Quit).await?;
        let client = self.client.await??;
        Ok((client, self.peer))
    }
}

fn snapshot(actor: &Actor, time_left: f32) -> Snapshot {
    Snapshot {
        players: vec![actor.clone()],
        time_left: Some(time_left),
        ..Snapshot::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn join_play_and_game_over() -> anyhow::Result<()> {
    let mut h = Harness::start().await?;
    let me = h.join("Tester").await?;

    // The client reports its position every tick once playing.
    let first = h.peer.recv_update().await?;
    assert_eq!((first.x, first.y), (me.x, me.y));

    h.peer.send(&ServerEvent::GameState(snapshot(&me, 45.5))).await?;
    h.peer
        .send(&ServerEvent::GameOver(GameOver {
            winner: "blue".into(),
        }))
        .await?;
    // Arrives after game over; must not replace the frozen scene.
    h.peer.send(&ServerEvent::GameState(snapshot(&me, 3.0))).await?;

    let (client, _peer) = h.quit().await?;
    let session = client.session();
    assert_eq!(
        *session.phase(),
        SessionPhase::GameOver {
            winner: "blue".into()
        }
    );
    assert_eq!(session.store().current().unwrap().time_left, Some(45.5));
    let texts: Vec<_> = session
        .surface()
        .texts()
        .iter()
        .map(|t| t.text.as_str())
        .collect();
    assert!(texts.contains(&"Winner: blue"), "{texts:?}");
    assert!(texts.contains(&"Time: 45s"), "{texts:?}");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn held_keys_move_the_reported_position() -> anyhow::Result<()> {
    let mut h = Harness::start().await?;
    let me = h.join("Mover").await?;

    h.signal(InputSignal::KeyDown("d".into())).await?;
    h.signal(InputSignal::KeyDown("s".into())).await?;

    let mut moved = None;
    for _ in 0..120 {
        let u = h.peer.recv_update().await?;
        if u.x > me.x || u.y > me.y {
            moved = Some(u);
            break;
        }
    }
    let u = moved.expect("position never changed");
    let (dx, dy) = (u.x - me.x, u.y - me.y);
    assert!(dx >= 0.0 && dy >= 0.0);
    assert!(u.x <= 760.0 && u.y <= 560.0);

    let (client, _) = h.quit().await?;
    let local = client.session().local().unwrap();
    assert!(local.x >= u.x && local.y >= u.y);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shots_respect_cooldown_over_the_wire() -> anyhow::Result<()> {
    let mut h = Harness::start().await?;
    h.join("Gunner").await?;

    for _ in 0..3 {
        h.signal(InputSignal::SecondaryClick { x: 400.0, y: 300.0 })
            .await?;
    }
    let burst = h.peer.actions_within(Duration::from_millis(300)).await;
    let shots = burst
        .iter()
        .filter(|e| matches!(e, ClientEvent::Shoot(_)))
        .count();
    assert_eq!(shots, 1, "{burst:?}");

    tokio::time::sleep(Duration::from_millis(300)).await;
    h.signal(InputSignal::SecondaryClick { x: 400.0, y: 300.0 })
        .await?;
    assert!(matches!(h.peer.recv_action().await?, ClientEvent::Shoot(_)));

    h.quit().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn skill_key_fires_along_stored_facing() -> anyhow::Result<()> {
    let mut h = Harness::start().await?;
    let me = h.join("Caster").await?;

    // Pointer straight below the actor's center.
    let center = me.center();
    h.signal(InputSignal::PointerMove {
        x: center.x,
        y: center.y + 100.0,
    })
    .await?;
    h.signal(InputSignal::KeyDown("q".into())).await?;

    match h.peer.recv_action().await? {
        ClientEvent::Skill(cmd) => {
            assert!((cmd.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
            assert_eq!((cmd.x, cmd.y), (center.x, center.y));
        }
        other => panic!("expected skill, got {other:?}"),
    }

    h.quit().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_inbound_is_dropped() -> anyhow::Result<()> {
    let mut h = Harness::start().await?;
    let me = h.join("Sturdy").await?;

    h.peer.send_raw(b"{ not json").await?;
    h.peer
        .send_envelope(&Envelope::new("game_state", json!({"players": 7})))
        .await?;
    h.peer
        .send_envelope(&Envelope::new("no_such_event", json!({})))
        .await?;
    h.peer.send(&ServerEvent::GameState(snapshot(&me, 9.0))).await?;

    let (client, _) = h.quit().await?;
    let session = client.session();
    assert_eq!(*session.phase(), SessionPhase::Playing);
    assert_eq!(session.store().received(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chat_goes_out_and_lands_in_sidebar() -> anyhow::Result<()> {
    let mut h = Harness::start().await?;

    h.input(ClientInput::Chat("hello all".into())).await?;
    assert_eq!(
        h.peer.recv_action().await?,
        ClientEvent::Chat(ChatSend {
            message: "hello all".into()
        })
    );

    h.peer
        .send(&ServerEvent::Chat(ChatLine {
            name: "ann".into(),
            message: "hey".into(),
            timestamp: 61,
        }))
        .await?;

    let (client, _) = h.quit().await?;
    let lines: Vec<_> = client.session().sidebar().chat().collect();
    assert_eq!(lines, vec!["[00:01:01] ann: hey"]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lost_connection_keeps_last_state() -> anyhow::Result<()> {
    let mut h = Harness::start().await?;
    let me = h.join("Lonely").await?;
    h.peer.send(&ServerEvent::GameState(snapshot(&me, 20.0))).await?;

    let Harness {
        peer,
        input,
        client,
    } = h;
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(peer);
    tokio::time::sleep(Duration::from_millis(200)).await;

    input.send(ClientInput::Quit).await?;
    let client = client.await??;
    assert!(!client.is_connected());
    assert_eq!(*client.session().phase(), SessionPhase::Playing);
    assert!(client.session().store().current().is_some());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn return_to_menu_allows_a_new_join() -> anyhow::Result<()> {
    let mut h = Harness::start().await?;
    h.join("Again").await?;
    h.peer
        .send(&ServerEvent::GameOver(GameOver {
            winner: "red".into(),
        }))
        .await?;
    tokio::time::sleep(SETTLE).await;

    h.input(ClientInput::ReturnToMenu).await?;
    h.join("Again").await?;

    let (client, _) = h.quit().await?;
    assert_eq!(*client.session().phase(), SessionPhase::Playing);
    Ok(())
}
