//! Entry point for the **edgetile** daemon.
//!
//! Spawns all command sources on background threads and drives the
//! [`EdgeTiler`](edgetile::engine::EdgeTiler) on the main thread.  The loop
//! sleeps until the next command or the engine's next deadline, whichever
//! comes first, so deferred checks run on time without busy polling.

use edgetile::command::Command;
use edgetile::config::Config;
use edgetile::engine::EdgeTiler;
use edgetile::hyprland::events::HyprlandEventSource;
use edgetile::hyprland::wm::HyprlandWm;
use edgetile::ipc::listener::UnixSocketListener;
use edgetile::layout::PassiveLayout;
use edgetile::traits::{CommandSource, LayoutEngine, TileEvent, WindowServer};
use log::{debug, error, info};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Default socket path for the command listener.
fn default_socket_path() -> String {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    format!("{}/edgetile.sock", runtime)
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/edgetile`).
fn config_dir() -> std::path::PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    std::path::PathBuf::from(base).join("edgetile")
}

/// Try to load the config from `$XDG_CONFIG_HOME/edgetile/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let config = load_config();
    let mut tiler = EdgeTiler::new(HyprlandWm::new(), PassiveLayout::new(), config);
    spawn_event_logger(&mut tiler);

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    spawn_command_sources(cmd_tx);

    run(tiler, cmd_rx);
}

/// Idle wake-up when nothing is scheduled.
const IDLE: Duration = Duration::from_secs(60);

fn run<W: WindowServer, L: LayoutEngine>(
    mut tiler: EdgeTiler<W, L>,
    cmd_rx: mpsc::Receiver<Command>,
) {
    info!("edgetile running");
    loop {
        let timeout = tiler
            .next_deadline()
            .map(|due| due.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE);
        match cmd_rx.recv_timeout(timeout) {
            Ok(cmd) => {
                debug!("command {:?}", cmd);
                tiler.handle(cmd);
                tiler.tick();
            }
            Err(RecvTimeoutError::Timeout) => {
                tiler.tick();
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tiler.teardown();
    info!("all command sources closed, exiting");
}

//  Helpers

fn spawn_event_logger<W: WindowServer, L: LayoutEngine>(tiler: &mut EdgeTiler<W, L>) {
    let (tx, rx) = mpsc::channel::<TileEvent>();
    tiler.set_event_sink(tx);
    std::thread::spawn(move || {
        for event in rx {
            debug!("event {:?}", event);
        }
    });
}

fn spawn_command_sources(tx: mpsc::Sender<Command>) {
    {
        let tx = tx.clone();
        let path = default_socket_path();
        std::thread::spawn(move || {
            let mut source = UnixSocketListener::new(&path);
            if let Err(e) = source.run(tx) {
                error!("socket listener error: {}", e);
            }
        });
    }

    // Window open/close arrive from Hyprland itself; grab and resize
    // notifications come from the compositor plugin over the socket above.
    {
        let tx = tx.clone();
        std::thread::spawn(move || {
            let mut source = HyprlandEventSource::new();
            if let Err(e) = source.run(tx) {
                error!("hyprland event source error: {}", e);
            }
        });
    }

    drop(tx);
}
