//! Core traits that decouple edgetile from any specific compositor,
//! layout algorithm or transport mechanism.
//!
//! Every concrete backend (Hyprland, a Unix-socket listener, a test
//! harness, …) implements one of these traits.  The
//! [`EdgeTiler`](crate::engine::EdgeTiler) only depends on these
//! abstractions.

use crate::command::{Command, WindowId};
use crate::geometry::{Point, Rect, Size, Zone};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Workspace and monitor a window currently lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowLocation {
    pub workspace: i32,
    pub monitor: i32,
}

/// Pointer position and primary button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerState {
    pub position: Point,
    /// Whether the button driving the current grab is still held.
    pub pressed: bool,
}

/// Abstraction over the window server the engine arranges windows on.
///
/// An implementation might talk to Hyprland via IPC, or it might be an
/// in-memory fake used in tests.  Every method is a short synchronous
/// request; geometry writes may be applied (or clamped) by the host later,
/// which is why the engine re-reads geometry in deferred checks.
pub trait WindowServer {
    /// The error type produced by this window server.
    type Error: std::error::Error + Send + 'static;

    /// Current outer frame of `window`.
    fn frame_rect(&self, window: WindowId) -> Result<Rect, Self::Error>;

    /// Move and resize the outer frame of `window`.
    fn move_resize_frame(&self, window: WindowId, rect: Rect) -> Result<(), Self::Error>;

    fn maximize(&self, window: WindowId) -> Result<(), Self::Error>;

    fn unmaximize(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Whether the host allows `window` to be resized at all.
    fn is_resizable(&self, window: WindowId) -> Result<bool, Self::Error>;

    /// Work area of `monitor` while `workspace` is shown, or `None` when
    /// either index is out of range.
    fn work_area(&self, workspace: i32, monitor: i32) -> Result<Option<Rect>, Self::Error>;

    /// Managed windows on `workspace`, across all monitors.
    fn windows(&self, workspace: i32) -> Result<Vec<WindowId>, Self::Error>;

    /// Where `window` lives, or `None` if the host no longer knows it.
    fn window_location(&self, window: WindowId) -> Result<Option<WindowLocation>, Self::Error>;

    /// The focused window, if any.
    fn active_window(&self) -> Result<Option<WindowId>, Self::Error>;

    fn pointer(&self) -> Result<PointerState, Self::Error>;

    /// Create a new workspace on `monitor` and return its id.
    fn create_workspace(&self, monitor: i32) -> Result<i32, Self::Error>;

    fn activate_workspace(&self, workspace: i32) -> Result<(), Self::Error>;

    fn move_to_workspace(&self, window: WindowId, workspace: i32) -> Result<(), Self::Error>;

    /// Monotonic clock used for cooldowns, leases and deferred work.
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Outcome of a trial packing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackResult {
    /// The windows do not all fit into the available rectangle.
    pub overflow: bool,
    /// Proposed frames, in input order, for the windows that fit.
    pub placements: Vec<Rect>,
}

/// The external layout engine that arranges free-form ("mosaic") windows
/// in whatever space the edge tiles leave over.
pub trait LayoutEngine {
    /// Try to pack windows of the given sizes into `available` without
    /// moving anything.
    fn test_pack(&self, sizes: &[Size], available: Rect) -> PackResult;

    /// Re-arrange the free-form windows of `workspace` on `monitor`.
    /// Fire-and-forget.
    fn retile(&self, workspace: i32, exclude: Option<WindowId>, monitor: i32, live_resize: bool);

    /// Stage an exchange of the layout slots of `a` and `b`.
    fn set_temporary_swap(&self, a: WindowId, b: WindowId);

    /// Commit the staged exchange.
    fn apply_temporary_swap(&self);

    /// Drop any staged exchange.
    fn clear_temporary_swap(&self);
}

/// Animation parameters for a single move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionOptions {
    /// A small correction rather than a user-visible relocation.
    pub subtle: bool,
    pub duration: Duration,
}

/// Optional motion system that animates windows to their target frames.
///
/// The motion system owns the *visible* interpolation only: by the time
/// [`animate`](Motion::animate) returns, `target` must be the committed
/// frame of `window` as far as the window server is concerned.  When no
/// motion system is attached the engine writes frames directly.
pub trait Motion {
    fn animate(&self, window: WindowId, target: Rect, options: MotionOptions);
}

/// Events emitted by the engine over an [`mpsc`](std::sync::mpsc) channel.
#[derive(Debug, Clone, PartialEq)]
pub enum TileEvent {
    /// A window was tiled to `zone`, converted, or un-tiled (`Zone::None`).
    StateChanged { window: WindowId, zone: Zone },
    /// The zone under the pointer changed while `window` is being dragged.
    ZonePreview { window: WindowId, zone: Zone },
    /// Free-form windows were moved to a fresh workspace.
    Migrated {
        windows: Vec<WindowId>,
        workspace: i32,
    },
}

//  Command Source

/// A source of [`Command`]s.
///
/// Implementations listen on some transport (a Unix socket, a compositor
/// plugin, an in-memory channel) and forward parsed commands into the
/// provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received command must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Command`] into `sink`.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error>;
}
