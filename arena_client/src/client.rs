//! Client driver.
//!
//! One task owns the session and multiplexes three sources:
//! - the frame tick (prediction + `player_update`)
//! - inbound envelopes from the channel's reader task
//! - local input (console lines in the binary, a channel in tests)
//!
//! The socket is never awaited here; outbound events are queued.

use std::{ops::ControlFlow, path::PathBuf, time::Instant};

use anyhow::{bail, Context};
use arena_shared::{config::ClientConfig, input::InputSignal, protocol::GameMode};
use tokio::{
    sync::mpsc,
    time::{interval, MissedTickBehavior},
};
use tracing::{info, warn};

use crate::{
    channel::{ChannelEvent, ConnectionChannel},
    framebuffer::Framebuffer,
    session::SessionController,
};

/// Everything the owner task accepts from outside the network.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientInput {
    Signal(InputSignal),
    SelectMode { mode: GameMode, name: Option<String> },
    Chat(String),
    ReturnToMenu,
    /// Write the current frame as a PPM image.
    SaveFrame(PathBuf),
    Status,
    Quit,
}

/// Parses one console line.
///
/// ```text
/// pvp [name]        pve [name]
/// down <key>        up <key>
/// move <x> <y>      rclick <x> <y>
/// say <message>     status
/// frame <path.ppm>  menu
/// quit
/// ```
pub fn parse_command(line: &str) -> anyhow::Result<ClientInput> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&cmd, args)) = tokens.split_first() else {
        bail!("empty command");
    };

    let point = |args: &[&str]| -> anyhow::Result<(f32, f32)> {
        let [x, y] = args else {
            bail!("usage: {cmd} <x> <y>");
        };
        let x = x.parse().with_context(|| format!("bad x '{x}'"))?;
        let y = y.parse().with_context(|| format!("bad y '{y}'"))?;
        Ok((x, y))
    };
    let key = |args: &[&str]| -> anyhow::Result<String> {
        match args {
            [k] => Ok(k.to_lowercase()),
            _ => bail!("usage: {cmd} <key>"),
        }
    };

    Ok(match cmd {
        "pvp" | "pve" => ClientInput::SelectMode {
            mode: cmd.parse().map_err(anyhow::Error::msg)?,
            name: (!args.is_empty()).then(|| args.join(" ")),
        },
        "down" => ClientInput::Signal(InputSignal::KeyDown(key(args)?)),
        "up" => ClientInput::Signal(InputSignal::KeyUp(key(args)?)),
        "move" => {
            let (x, y) = point(args)?;
            ClientInput::Signal(InputSignal::PointerMove { x, y })
        }
        "rclick" => {
            let (x, y) = point(args)?;
            ClientInput::Signal(InputSignal::SecondaryClick { x, y })
        }
        "say" => {
            if args.is_empty() {
                bail!("usage: say <message>");
            }
            ClientInput::Chat(args.join(" "))
        }
        "frame" => match args {
            [path] => ClientInput::SaveFrame(PathBuf::from(*path)),
            _ => bail!("usage: frame <path.ppm>"),
        },
        "status" => ClientInput::Status,
        "menu" => ClientInput::ReturnToMenu,
        "quit" | "exit" => ClientInput::Quit,
        other => bail!("unknown command '{other}'"),
    })
}

/// High-level game client.
pub struct GameClient {
    session: SessionController<Framebuffer>,
    channel: ConnectionChannel,
    inbound: mpsc::UnboundedReceiver<ChannelEvent>,
    cfg: ClientConfig,
    connected: bool,
}

impl GameClient {
    /// Connects to `cfg.server_addr` and sets up a fresh session in the menu.
    pub async fn connect(cfg: &ClientConfig) -> anyhow::Result<Self> {
        let (channel, inbound) = ConnectionChannel::connect(&cfg.server_addr)
            .await
            .context("connect")?;
        let surface = Framebuffer::new(cfg.surface_width, cfg.surface_height);
        let session = SessionController::new(cfg, surface).context("session setup")?;
        info!(server = %channel.peer(), "Connected to server");
        Ok(Self {
            session,
            channel,
            inbound,
            cfg: cfg.clone(),
            connected: true,
        })
    }

    /// Runs until `Quit` or until the input side goes away. A closed
    /// network channel does not end the loop; the last frame stays up.
    pub async fn run(&mut self, mut input: mpsc::Receiver<ClientInput>) -> anyhow::Result<()> {
        let mut ticker = interval(self.cfg.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.session.tick(&mut self.channel);
                }
                ev = self.inbound.recv(), if self.connected => match ev {
                    Some(ChannelEvent::Message(env)) => self.session.handle_envelope(env),
                    Some(ChannelEvent::Closed { reason }) => {
                        warn!(reason = %reason, "Lost connection; keeping last state");
                        self.connected = false;
                    }
                    None => self.connected = false,
                },
                cmd = input.recv() => {
                    let Some(cmd) = cmd else {
                        info!("Input closed");
                        break;
                    };
                    if self.apply(cmd).is_break() {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Applies one input. Failures are reported, never fatal.
    pub fn apply(&mut self, input: ClientInput) -> ControlFlow<()> {
        match input {
            ClientInput::Signal(signal) => {
                self.session
                    .handle_input(&mut self.channel, signal, Instant::now());
            }
            ClientInput::SelectMode { mode, name } => {
                if let Err(e) = self
                    .session
                    .select_mode(&mut self.channel, mode, name.as_deref())
                {
                    warn!(error = %e, "Cannot join");
                }
            }
            ClientInput::Chat(message) => {
                self.session.send_chat(&mut self.channel, &message);
            }
            ClientInput::ReturnToMenu => {
                if let Err(e) = self.session.return_to_menu() {
                    warn!(error = %e, "Cannot leave");
                }
            }
            ClientInput::SaveFrame(path) => match self.session.surface().save_ppm(&path) {
                Ok(()) => info!(path = %path.display(), "Frame saved"),
                Err(e) => warn!(error = %format!("{e:#}"), "Frame not saved"),
            },
            ClientInput::Status => {
                for line in self.status_lines() {
                    info!("{line}");
                }
            }
            ClientInput::Quit => {
                info!("Quitting");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    pub fn status_lines(&self) -> Vec<String> {
        let s = &self.session;
        let mut out = vec![
            format!("Phase: {}", s.phase().name()),
            format!(
                "Server: {} ({})",
                self.channel.peer(),
                if self.connected { "connected" } else { "closed" }
            ),
            format!("Snapshots received: {}", s.store().received()),
            format!("Frames drawn: {}", s.frames()),
        ];
        if let Some(me) = s.local() {
            out.push(format!(
                "Local: {} [{}] at ({:.1}, {:.1}) angle {:.2} health {}",
                me.name, me.team, me.x, me.y, me.angle, me.health
            ));
        }
        if let Some(snap) = s.store().current() {
            out.push(format!("Entities: {}", snap.entity_count()));
        }
        out.push(format!("Lobby: {} players", s.sidebar().roster().len()));
        for line in s.sidebar().chat() {
            out.push(format!("  {line}"));
        }
        out
    }

    pub fn session(&self) -> &SessionController<Framebuffer> {
        &self.session
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_commands_take_optional_name() {
        assert_eq!(
            parse_command("pvp").unwrap(),
            ClientInput::SelectMode {
                mode: GameMode::Pvp,
                name: None
            }
        );
        assert_eq!(
            parse_command("pve Big Bob").unwrap(),
            ClientInput::SelectMode {
                mode: GameMode::Pve,
                name: Some("Big Bob".into())
            }
        );
    }

    #[test]
    fn input_commands() {
        assert_eq!(
            parse_command("down W").unwrap(),
            ClientInput::Signal(InputSignal::KeyDown("w".into()))
        );
        assert_eq!(
            parse_command("rclick 10 20.5").unwrap(),
            ClientInput::Signal(InputSignal::SecondaryClick { x: 10.0, y: 20.5 })
        );
        assert_eq!(
            parse_command("say  good   game ").unwrap(),
            ClientInput::Chat("good game".into())
        );
        assert_eq!(
            parse_command("frame out.ppm").unwrap(),
            ClientInput::SaveFrame(PathBuf::from("out.ppm"))
        );
        assert_eq!(parse_command("menu").unwrap(), ClientInput::ReturnToMenu);
    }

    #[test]
    fn bad_commands_are_rejected() {
        assert!(parse_command("").is_err());
        assert!(parse_command("move 1").is_err());
        assert!(parse_command("move x 1").is_err());
        assert!(parse_command("down").is_err());
        assert!(parse_command("say").is_err());
        assert!(parse_command("dance").is_err());
    }
}
