//! Skirmish headless demo.
//!
//! Runs two sessions of the same game in one process: an authoritative host
//! and a replica client, wired back to back through a loopback transport
//! thread. The host player is driven by a scripted input pattern; everything
//! else (enemies, projectiles, pickups) is simulated by the host and
//! replicated to the client.
//!
//! # Main Loop
//!
//! 1. Load `config.ini` (defaults if missing) and the level layout
//! 2. Build both sessions, start the loopback threads
//! 3. Each frame: feed scripted input, advance host and client
//! 4. Tear both sessions down and report scores
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run --release -- --ticks 1200
//! ```

use clap::Parser;
use crossbeam_channel::Receiver;
use log::{error, info};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use skirmish::components::entityid::PlayerId;
use skirmish::events::packet::Packet;
use skirmish::resources::input::Action;
use skirmish::resources::levellayout::LevelLayout;
use skirmish::resources::netbridge::ChannelSink;
use skirmish::resources::sessionconfig::SessionConfig;
use skirmish::session::{Session, SessionHandle};

const HOST_ID: PlayerId = PlayerId(0);
const CLIENT_ID: PlayerId = PlayerId(1);
const CLIENT_ID_BASE: i64 = 1 << 32;

const DEFAULT_LEVEL: &str = r#"{
  "cell_width": 1.0,
  "cell_height": 1.0,
  "grid": [
    "=..................=",
    "=..S....c....g..S..=",
    "=.....=====........=",
    "=..t......c....B...=",
    "===================="
  ],
  "legend": {
    "=": { "type": "entity", "kind": "Static" },
    "S": { "type": "spawn_point" },
    "c": { "type": "entity", "kind": { "Item": "Coin" } },
    "g": { "type": "entity", "kind": { "Enemy": "Grunt" }, "flip_x": true },
    "t": { "type": "entity", "kind": { "Enemy": "Thrower" } },
    "B": { "type": "entity", "kind": { "Enemy": "Boss" }, "flip_x": true },
    ".": null
  }
}"#;

/// Skirmish headless host/client demo
#[derive(Parser)]
#[command(version, about = "Runs a host and a replica session over a loopback transport.")]
struct Cli {
    /// Configuration file for the host session.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Level layout (JSON). A small built-in arena is used when omitted.
    #[arg(long, value_name = "PATH")]
    level: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u32,
}

/// Forward every packet one session emits to the other session.
fn spawn_loopback(name: &str, rx: Receiver<Packet>, peer: SessionHandle) -> JoinHandle<()> {
    let name = name.to_string();
    thread::spawn(move || {
        let mut forwarded = 0usize;
        // Ends when the sending session drops its sink
        for packet in rx.iter() {
            peer.deliver(packet);
            forwarded += 1;
        }
        info!("loopback {} closed after {} packets", name, forwarded);
    })
}

/// Host player input: walk back and forth, jump and swing now and then.
fn scripted_input(session: &mut Session, frame: u32) {
    let phase = (frame / 120) % 2;
    let mut input = session.input_mut();
    input.set(Action::Right, phase == 0);
    input.set(Action::Left, phase == 1);
    input.set(Action::Jump, frame % 90 < 2);
    input.set(Action::Attack, frame % 40 < 2);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut host_config = SessionConfig::with_path(&cli.config);
    if let Err(e) = host_config.load_from_file() {
        info!("{}; using defaults", e);
    }
    host_config.authoritative = true;
    host_config.player_id = HOST_ID;
    host_config.player_name = "host".to_string();

    let mut client_config = host_config.clone();
    client_config.authoritative = false;
    client_config.player_id = CLIENT_ID;
    client_config.player_name = "client".to_string();
    client_config.id_base = host_config.id_base + CLIENT_ID_BASE;

    let layout = match &cli.level {
        Some(path) => LevelLayout::load_from_file(path),
        None => LevelLayout::from_json(DEFAULT_LEVEL),
    };
    let layout = match layout {
        Ok(layout) => layout,
        Err(e) => {
            error!("Failed to load level: {}", e);
            std::process::exit(1);
        }
    };

    let (host_sink, host_rx) = ChannelSink::new();
    let (client_sink, client_rx) = ChannelSink::new();
    let mut host = Session::with_simple_physics(host_config, host_sink);
    let mut client = Session::with_simple_physics(client_config, client_sink);
    host.add_participant(CLIENT_ID, "client");
    client.add_participant(HOST_ID, "host");

    let loopbacks = [
        spawn_loopback("host->client", host_rx, client.handle()),
        spawn_loopback("client->host", client_rx, host.handle()),
    ];

    host.load_level(&layout);
    client.load_level(&layout);
    // Build the level before the players drop in
    host.tick(0.0);
    client.tick(0.0);
    for (name, session) in [("host", &mut host), ("client", &mut client)] {
        if let Err(e) = session.spawn_local_player() {
            error!("{} could not spawn its player: {}", name, e);
        }
    }
    host.send_chat("glhf");

    let frame_dt = host.config().fixed_delta.unwrap_or(1.0 / 60.0);
    for frame in 0..cli.ticks {
        scripted_input(&mut host, frame);
        host.advance(frame_dt);
        client.advance(frame_dt);
    }

    info!(
        "after {} frames: host sees {} entities, client sees {} ({} mutations pending)",
        cli.ticks,
        host.entity_count(),
        client.entity_count(),
        client.pending_count()
    );
    for player in host.scores().players() {
        info!("score {:>8} {}", player.name, player.score);
    }
    if let Some(leader) = host.scores().leader() {
        info!("leader: {}", leader);
    }
    for line in client.chat().lines() {
        info!("client chat log: <{}> {}", line.sender, line.text);
    }

    host.shutdown();
    client.shutdown();
    // Dropping the sessions drops their sinks, which ends the loopback threads
    drop(host);
    drop(client);
    for handle in loopbacks {
        if handle.join().is_err() {
            error!("loopback thread panicked");
        }
    }
}
