//! [`WindowServer`] implementation backed by Hyprland IPC.
//!
//! Communicates directly with Hyprland through its Unix socket at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`,
//! avoiding any shell command invocation or third-party crate for socket
//! discovery.
//!
//! Edge tiles are floating windows positioned with `movewindowpixel` /
//! `resizewindowpixel`; only floating windows count as resizable.
//! Hyprland does not expose the pointer button state, so
//! [`pointer`](WindowServer::pointer) reports the button as held and a drag
//! ends on the explicit grab-end notification.

use crate::command::WindowId;
use crate::geometry::{Point, Rect};
use crate::traits::{PointerState, WindowLocation, WindowServer};
use serde::Deserialize;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

/// Hyprland-backed window server.
///
/// All communication happens over Hyprland's IPC socket
/// (`$XDG_RUNTIME_DIR/hypr/<instance>/.socket.sock`).  No child processes
/// are spawned.
#[derive(Debug, Default)]
pub struct HyprlandWm;

/// Errors that can occur when talking to Hyprland.
#[derive(Debug, thiserror::Error)]
#[error("hyprland IPC error: {0}")]
pub struct HyprlandWmError(String);

impl HyprlandWm {
    /// Create a new handle.
    ///
    /// No connection is opened eagerly; each method call opens a short-lived
    /// IPC request.
    pub fn new() -> Self {
        Self
    }
}

//  Direct Hyprland IPC helpers

fn socket_path() -> Result<PathBuf, HyprlandWmError> {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map_err(|_| HyprlandWmError("XDG_RUNTIME_DIR not set".into()))?;
    let his = std::env::var("HYPRLAND_INSTANCE_SIGNATURE")
        .map_err(|_| HyprlandWmError("HYPRLAND_INSTANCE_SIGNATURE not set".into()))?;
    Ok(PathBuf::from(format!(
        "{}/hypr/{}/.socket.sock",
        runtime_dir, his
    )))
}

fn ipc_request(command: &str) -> Result<String, HyprlandWmError> {
    let path = socket_path()?;
    let mut stream = UnixStream::connect(&path)
        .map_err(|e| HyprlandWmError(format!("connect to {}: {}", path.display(), e)))?;

    stream
        .write_all(command.as_bytes())
        .map_err(|e| HyprlandWmError(format!("write: {}", e)))?;

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .map_err(|e| HyprlandWmError(format!("read: {}", e)))?;

    String::from_utf8(response).map_err(|e| HyprlandWmError(format!("utf-8: {}", e)))
}

/// Send a JSON data query (`j/<command>`) and parse the reply.
fn ipc_json<T: for<'de> Deserialize<'de>>(data_command: &str) -> Result<T, HyprlandWmError> {
    let json = ipc_request(&format!("j/{}", data_command))?;
    serde_json::from_str(&json).map_err(|e| HyprlandWmError(format!("parse {}: {}", data_command, e)))
}

fn ipc_dispatch(args: &str) -> Result<(), HyprlandWmError> {
    let response = ipc_request(&format!("/dispatch {}", args))?;
    if response.trim() == "ok" {
        Ok(())
    } else {
        Err(HyprlandWmError(format!("dispatch error: {}", response)))
    }
}

/// Run several dispatches in one round trip.
fn ipc_batch(dispatches: &[String]) -> Result<(), HyprlandWmError> {
    let body: Vec<String> = dispatches
        .iter()
        .map(|d| format!("dispatch {}", d))
        .collect();
    let response = ipc_request(&format!("[[BATCH]]{}", body.join(";")))?;
    if batch_ok(&response) {
        Ok(())
    } else {
        Err(HyprlandWmError(format!("batch error: {}", response)))
    }
}

/// A batch reply is one `ok` per command, with or without separators.
fn batch_ok(response: &str) -> bool {
    let trimmed = response.trim();
    !trimmed.is_empty() && trimmed.replace("ok", "").trim().is_empty()
}

//  Minimal serde structs for the JSON we care about

#[derive(Debug, Deserialize)]
struct WorkspaceRef {
    id: i32,
}

/// Subset of the JSON object returned by `j/clients`.
#[derive(Debug, Deserialize)]
struct ClientJson {
    address: String,
    at: [i32; 2],
    size: [i32; 2],
    workspace: WorkspaceRef,
    monitor: i32,
    #[serde(default)]
    floating: bool,
    #[serde(default = "default_mapped")]
    mapped: bool,
    /// `0`/`1`/`2` on recent Hyprland, a boolean on older releases.
    #[serde(default)]
    fullscreen: serde_json::Value,
}

fn default_mapped() -> bool {
    true
}

impl ClientJson {
    fn id(&self) -> Option<WindowId> {
        WindowId::parse(&self.address)
    }

    fn rect(&self) -> Rect {
        Rect::new(self.at[0], self.at[1], self.size[0], self.size[1])
    }

    fn is_maximized(&self) -> bool {
        match &self.fullscreen {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
            _ => false,
        }
    }
}

/// Subset of the JSON object returned by `j/monitors`.
#[derive(Debug, Deserialize)]
struct MonitorJson {
    id: i32,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    #[serde(default = "default_scale")]
    scale: f64,
    /// Left, top, right, bottom space taken by bars and panels.
    #[serde(default)]
    reserved: [i32; 4],
}

fn default_scale() -> f64 {
    1.0
}

impl MonitorJson {
    /// Logical rectangle minus reserved space.
    fn work_area(&self) -> Rect {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        let width = (self.width as f64 / scale).round() as i32;
        let height = (self.height as f64 / scale).round() as i32;
        let [left, top, right, bottom] = self.reserved;
        Rect::new(
            self.x + left,
            self.y + top,
            (width - left - right).max(0),
            (height - top - bottom).max(0),
        )
    }
}

#[derive(Debug, Deserialize)]
struct CursorJson {
    x: i32,
    y: i32,
}

#[derive(Debug, Deserialize)]
struct ActiveWindowJson {
    #[serde(default)]
    address: Option<String>,
}

/// Smallest positive workspace id not in `taken`.
fn first_free_workspace(taken: &[i32]) -> i32 {
    (1..).find(|id| !taken.contains(id)).unwrap_or(1)
}

impl HyprlandWm {
    fn clients(&self) -> Result<Vec<ClientJson>, HyprlandWmError> {
        ipc_json("clients")
    }

    fn client(&self, window: WindowId) -> Result<ClientJson, HyprlandWmError> {
        self.clients()?
            .into_iter()
            .find(|c| c.id() == Some(window))
            .ok_or_else(|| HyprlandWmError(format!("unknown window {}", window)))
    }

    /// Toggle the maximized state of `window` if it is not already `on`.
    fn set_maximized(&self, window: WindowId, on: bool) -> Result<(), HyprlandWmError> {
        if self.client(window)?.is_maximized() == on {
            return Ok(());
        }
        ipc_batch(&[
            format!("focuswindow address:{}", window),
            "fullscreen 1".to_string(),
        ])
    }
}

//  WindowServer implementation

impl WindowServer for HyprlandWm {
    type Error = HyprlandWmError;

    fn frame_rect(&self, window: WindowId) -> Result<Rect, Self::Error> {
        Ok(self.client(window)?.rect())
    }

    fn move_resize_frame(&self, window: WindowId, rect: Rect) -> Result<(), Self::Error> {
        ipc_batch(&[
            format!(
                "resizewindowpixel exact {} {},address:{}",
                rect.width, rect.height, window
            ),
            format!(
                "movewindowpixel exact {} {},address:{}",
                rect.x, rect.y, window
            ),
        ])
    }

    fn maximize(&self, window: WindowId) -> Result<(), Self::Error> {
        self.set_maximized(window, true)
    }

    fn unmaximize(&self, window: WindowId) -> Result<(), Self::Error> {
        self.set_maximized(window, false)
    }

    fn is_resizable(&self, window: WindowId) -> Result<bool, Self::Error> {
        Ok(self.client(window)?.floating)
    }

    fn work_area(&self, workspace: i32, monitor: i32) -> Result<Option<Rect>, Self::Error> {
        if workspace < 1 {
            return Ok(None);
        }
        let monitors: Vec<MonitorJson> = ipc_json("monitors")?;
        Ok(monitors
            .iter()
            .find(|m| m.id == monitor)
            .map(MonitorJson::work_area))
    }

    fn windows(&self, workspace: i32) -> Result<Vec<WindowId>, Self::Error> {
        Ok(self
            .clients()?
            .iter()
            .filter(|c| c.mapped && c.workspace.id == workspace)
            .filter_map(ClientJson::id)
            .collect())
    }

    fn window_location(&self, window: WindowId) -> Result<Option<WindowLocation>, Self::Error> {
        Ok(self
            .clients()?
            .into_iter()
            .find(|c| c.id() == Some(window))
            .map(|c| WindowLocation {
                workspace: c.workspace.id,
                monitor: c.monitor,
            }))
    }

    fn active_window(&self) -> Result<Option<WindowId>, Self::Error> {
        // Hyprland returns an empty object `{}` when no window is focused.
        let active: ActiveWindowJson = ipc_json("activewindow")?;
        Ok(active.address.as_deref().and_then(WindowId::parse))
    }

    fn pointer(&self) -> Result<PointerState, Self::Error> {
        let cursor: CursorJson = ipc_json("cursorpos")?;
        Ok(PointerState {
            position: Point::new(cursor.x, cursor.y),
            pressed: true,
        })
    }

    fn create_workspace(&self, _monitor: i32) -> Result<i32, Self::Error> {
        // Hyprland creates workspaces on first use; picking an unused id is
        // enough.
        let taken: Vec<WorkspaceRef> = ipc_json("workspaces")?;
        let ids: Vec<i32> = taken.iter().map(|w| w.id).collect();
        Ok(first_free_workspace(&ids))
    }

    fn activate_workspace(&self, workspace: i32) -> Result<(), Self::Error> {
        ipc_dispatch(&format!("workspace {}", workspace))
    }

    fn move_to_workspace(&self, window: WindowId, workspace: i32) -> Result<(), Self::Error> {
        ipc_dispatch(&format!(
            "movetoworkspacesilent {},address:{}",
            workspace, window
        ))
    }
}
