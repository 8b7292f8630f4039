//! Headless client binary.
//!
//! Usage:
//!   cargo run -p arena_client -- [--config client.json] [--addr 127.0.0.1:5000]
//!       [--name NAME] [--mode pvp|pve] [--tick-hz 60] [--join]
//!
//! Connects to the server and waits in the menu. `--join` picks the
//! configured mode right away. Frames are drawn into an in-memory
//! framebuffer; `frame <path>` dumps one.
//!
//! Console commands:
//!   pvp [name] / pve [name] - Join a match
//!   down <key> / up <key>   - Press or release a key (w a s d, q e r)
//!   move <x> <y>            - Move the pointer
//!   rclick <x> <y>          - Secondary click (shoot)
//!   say <message>           - Send chat message
//!   status                  - Show client status
//!   frame <path.ppm>        - Save the current frame
//!   menu                    - Back to the menu after a game
//!   quit                    - Exit client

use std::env;
use std::io::{BufRead, Write};

use anyhow::Context;
use arena_client::client::{parse_command, ClientInput, GameClient};
use arena_shared::config::ClientConfig;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug)]
struct Args {
    cfg: ClientConfig,
    join: bool,
}

fn parse_args(args: &[String]) -> anyhow::Result<Args> {
    // The file is the base layer; flags override it regardless of order.
    let mut cfg = match args.iter().position(|a| a == "--config") {
        Some(i) if i + 1 < args.len() => {
            let path = &args[i + 1];
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read config {path}"))?;
            ClientConfig::from_json_str(&text).with_context(|| format!("parse config {path}"))?
        }
        _ => ClientConfig::default(),
    };

    let mut join = false;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.server_addr = args[i + 1].clone();
                i += 2;
            }
            "--name" if i + 1 < args.len() => {
                cfg.player_name = args[i + 1].clone();
                i += 2;
            }
            "--mode" if i + 1 < args.len() => {
                cfg.mode = args[i + 1].parse().map_err(anyhow::Error::msg)?;
                i += 2;
            }
            "--tick-hz" if i + 1 < args.len() => {
                cfg.tick_hz = args[i + 1]
                    .parse()
                    .with_context(|| format!("bad --tick-hz '{}'", args[i + 1]))?;
                i += 2;
            }
            "--join" => {
                join = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    Ok(Args { cfg, join })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let Args { cfg, join } = parse_args(&args)?;
    info!(server = %cfg.server_addr, mode = %cfg.mode, tick_hz = cfg.tick_hz, "Starting client");

    let mut client = GameClient::connect(&cfg).await.context("connect")?;

    let (input_tx, input_rx) = mpsc::channel::<ClientInput>(32);

    if join {
        input_tx
            .send(ClientInput::SelectMode {
                mode: cfg.mode,
                name: Some(cfg.player_name.clone()),
            })
            .await
            .context("queue join")?;
    }

    // Spawn stdin reader thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_command(line) {
                Ok(cmd) => {
                    if input_tx.blocking_send(cmd).is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Bad command"),
            }
        }
    });

    println!("Client connected. Type 'pvp' or 'pve' to join, 'quit' to exit.");
    println!();

    client.run(input_rx).await
}
