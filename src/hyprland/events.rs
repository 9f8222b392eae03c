//! Translates Hyprland's event stream into edgetile [`Command`]s.
//!
//! Hyprland emits events on its event socket (`socket2`) at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket2.sock`, one
//! per line in the `EVENT>>DATA` format.  The ones edgetile cares about:
//!
//! | Event           | Payload                          | Command            |
//! |-----------------|----------------------------------|--------------------|
//! | `openwindow`    | `<addr>,<ws>,<class>,<title>`    | `WindowAdded`      |
//! | `movewindowv2`  | `<addr>,<wsid>,<wsname>`         | `WindowAdded`      |
//! | `closewindow`   | `<addr>`                         | `WindowDestroyed`  |
//!
//! Hyprland writes addresses without the `0x` prefix on this socket.
//! Grab and resize gestures are not reported here; a compositor plugin
//! forwards those over the command socket.

use crate::command::{Command, WindowId};
use crate::traits::CommandSource;
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::sync::mpsc;

/// A [`CommandSource`] that follows Hyprland's window life cycle.
#[derive(Debug, Default)]
pub struct HyprlandEventSource;

impl HyprlandEventSource {
    pub fn new() -> Self {
        Self
    }
}

/// Error from the Hyprland event source.
#[derive(Debug, thiserror::Error)]
#[error("hyprland event error: {0}")]
pub struct HyprlandEventError(String);

fn socket2_path() -> Result<PathBuf, HyprlandEventError> {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map_err(|_| HyprlandEventError("XDG_RUNTIME_DIR not set".into()))?;
    let his = std::env::var("HYPRLAND_INSTANCE_SIGNATURE")
        .map_err(|_| HyprlandEventError("HYPRLAND_INSTANCE_SIGNATURE not set".into()))?;
    Ok(PathBuf::from(format!(
        "{}/hypr/{}/.socket2.sock",
        runtime_dir, his
    )))
}

/// Split `EVENT>>DATA`.
fn parse_event_line(line: &str) -> Option<(&str, &str)> {
    let sep = line.find(">>")?;
    Some((&line[..sep], &line[sep + 2..]))
}

/// Address as written on socket2 (bare hex).
fn parse_address(field: &str) -> Option<WindowId> {
    let field = field.trim();
    let hex = field.strip_prefix("0x").unwrap_or(field);
    u64::from_str_radix(hex, 16).ok().map(WindowId)
}

/// Map one event to the command it implies, if any.
fn translate(event: &str, data: &str) -> Option<Command> {
    let first = data.split(',').next()?;
    match event {
        "openwindow" | "movewindowv2" => parse_address(first).map(|window| Command::WindowAdded { window }),
        "closewindow" => parse_address(first).map(|window| Command::WindowDestroyed { window }),
        _ => None,
    }
}

impl CommandSource for HyprlandEventSource {
    type Error = HyprlandEventError;

    /// Connect to Hyprland's event socket and forward window life-cycle
    /// events.
    ///
    /// This method **blocks** until the socket is closed.  Run it on a
    /// dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error> {
        let path = socket2_path()?;
        let stream = UnixStream::connect(&path)
            .map_err(|e| HyprlandEventError(format!("connect to {}: {}", path.display(), e)))?;
        info!("event source connected to {}", path.display());

        for line in BufReader::new(stream).lines() {
            match line {
                Ok(line) if line.is_empty() => continue,
                Ok(line) => {
                    let Some(cmd) = parse_event_line(&line).and_then(|(e, d)| translate(e, d)) else {
                        continue;
                    };
                    debug!("event {:?}", cmd);
                    if sink.send(cmd).is_err() {
                        info!("sink closed, shutting down");
                        return Ok(());
                    }
                }
                Err(e) => {
                    error!("socket2 read error: {}", e);
                    return Err(HyprlandEventError(format!("read error: {}", e)));
                }
            }
        }

        warn!("socket2 stream ended");
        Ok(())
    }
}
