//! In-memory window server and layout engine shared by the unit tests.

use crate::command::WindowId;
use crate::config::Config;
use crate::engine::EdgeTiler;
use crate::geometry::{Point, Rect, Size};
use crate::traits::{LayoutEngine, PackResult, PointerState, TileEvent, WindowLocation, WindowServer};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc;
use std::time::{Duration, Instant};

pub(crate) const WA: Rect = Rect::new(0, 0, 1920, 1080);

#[derive(Debug, Clone)]
pub(crate) struct FakeWindow {
    pub rect: Rect,
    pub workspace: i32,
    pub monitor: i32,
    pub resizable: bool,
    pub maximized: bool,
    pub min_width: i32,
    pub min_height: i32,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum FakeError {
    #[error("unknown window {0}")]
    Unknown(WindowId),
    #[error("write to {0} refused")]
    Refused(WindowId),
}

/// A window server whose host applies every write immediately, clamped to
/// per-window minimum sizes.
pub(crate) struct FakeServer {
    windows: RefCell<BTreeMap<WindowId, FakeWindow>>,
    work_area: Rect,
    clock: Cell<Instant>,
    pointer: Cell<PointerState>,
    active: Cell<Option<WindowId>>,
    next_workspace: Cell<i32>,
    refused: RefCell<BTreeSet<WindowId>>,
    pub created: RefCell<Vec<i32>>,
    pub activated: RefCell<Vec<i32>>,
    /// Every frame written through `move_resize_frame`, before clamping.
    pub writes: RefCell<Vec<(WindowId, Rect)>>,
}

impl FakeServer {
    pub fn new(work_area: Rect) -> Self {
        Self {
            windows: RefCell::new(BTreeMap::new()),
            work_area,
            clock: Cell::new(Instant::now()),
            pointer: Cell::new(PointerState {
                position: Point::new(0, 0),
                pressed: false,
            }),
            active: Cell::new(None),
            next_workspace: Cell::new(2),
            refused: RefCell::new(BTreeSet::new()),
            created: RefCell::new(Vec::new()),
            activated: RefCell::new(Vec::new()),
            writes: RefCell::new(Vec::new()),
        }
    }

    fn insert(&self, id: u64, rect: Rect, resizable: bool) -> WindowId {
        let window = WindowId(id);
        self.windows.borrow_mut().insert(
            window,
            FakeWindow {
                rect,
                workspace: 1,
                monitor: 0,
                resizable,
                maximized: false,
                min_width: 1,
                min_height: 1,
            },
        );
        window
    }

    pub fn add(&self, id: u64, rect: Rect) -> WindowId {
        self.insert(id, rect, true)
    }

    pub fn add_fixed(&self, id: u64, rect: Rect) -> WindowId {
        self.insert(id, rect, false)
    }

    fn with<R>(&self, window: WindowId, f: impl FnOnce(&mut FakeWindow) -> R) -> R {
        let mut windows = self.windows.borrow_mut();
        let w = windows
            .get_mut(&window)
            .unwrap_or_else(|| panic!("no window {}", window));
        f(w)
    }

    /// Fail every later frame write to `window`.
    pub fn refuse_writes(&self, window: WindowId) {
        self.refused.borrow_mut().insert(window);
    }

    pub fn set_min_height(&self, window: WindowId, height: i32) {
        self.with(window, |w| w.min_height = height);
    }

    /// Change a frame behind the engine's back, as a user drag would.
    pub fn set_rect(&self, window: WindowId, rect: Rect) {
        self.with(window, |w| w.rect = rect);
    }

    pub fn move_to_monitor(&self, window: WindowId, monitor: i32) {
        self.with(window, |w| w.monitor = monitor);
    }

    pub fn rect(&self, window: WindowId) -> Rect {
        self.with(window, |w| w.rect)
    }

    pub fn window(&self, window: WindowId) -> FakeWindow {
        self.with(window, |w| w.clone())
    }

    pub fn workspace_of(&self, window: WindowId) -> i32 {
        self.with(window, |w| w.workspace)
    }

    pub fn advance(&self, ms: u64) {
        self.clock.set(self.clock.get() + Duration::from_millis(ms));
    }

    pub fn press_at(&self, x: i32, y: i32) {
        self.pointer.set(PointerState {
            position: Point::new(x, y),
            pressed: true,
        });
    }

    pub fn release(&self) {
        let mut p = self.pointer.get();
        p.pressed = false;
        self.pointer.set(p);
    }

    pub fn focus(&self, window: WindowId) {
        self.active.set(Some(window));
    }

    pub fn remove(&self, window: WindowId) {
        self.windows.borrow_mut().remove(&window);
        if self.active.get() == Some(window) {
            self.active.set(None);
        }
    }

    fn get(&self, window: WindowId) -> Result<FakeWindow, FakeError> {
        self.windows
            .borrow()
            .get(&window)
            .cloned()
            .ok_or(FakeError::Unknown(window))
    }
}

impl WindowServer for FakeServer {
    type Error = FakeError;

    fn frame_rect(&self, window: WindowId) -> Result<Rect, FakeError> {
        self.get(window).map(|w| w.rect)
    }

    fn move_resize_frame(&self, window: WindowId, rect: Rect) -> Result<(), FakeError> {
        self.get(window)?;
        if self.refused.borrow().contains(&window) {
            return Err(FakeError::Refused(window));
        }
        self.writes.borrow_mut().push((window, rect));
        self.with(window, |w| {
            w.rect = Rect::new(
                rect.x,
                rect.y,
                rect.width.max(w.min_width),
                rect.height.max(w.min_height),
            );
        });
        Ok(())
    }

    fn maximize(&self, window: WindowId) -> Result<(), FakeError> {
        self.get(window)?;
        let wa = self.work_area;
        self.with(window, |w| {
            w.maximized = true;
            w.rect = wa;
        });
        Ok(())
    }

    fn unmaximize(&self, window: WindowId) -> Result<(), FakeError> {
        self.get(window)?;
        self.with(window, |w| w.maximized = false);
        Ok(())
    }

    fn is_resizable(&self, window: WindowId) -> Result<bool, FakeError> {
        self.get(window).map(|w| w.resizable)
    }

    fn work_area(&self, workspace: i32, monitor: i32) -> Result<Option<Rect>, FakeError> {
        Ok((monitor == 0 && workspace >= 1).then_some(self.work_area))
    }

    fn windows(&self, workspace: i32) -> Result<Vec<WindowId>, FakeError> {
        Ok(self
            .windows
            .borrow()
            .iter()
            .filter(|(_, w)| w.workspace == workspace)
            .map(|(id, _)| *id)
            .collect())
    }

    fn window_location(&self, window: WindowId) -> Result<Option<WindowLocation>, FakeError> {
        Ok(self.windows.borrow().get(&window).map(|w| WindowLocation {
            workspace: w.workspace,
            monitor: w.monitor,
        }))
    }

    fn active_window(&self) -> Result<Option<WindowId>, FakeError> {
        Ok(self.active.get())
    }

    fn pointer(&self) -> Result<PointerState, FakeError> {
        Ok(self.pointer.get())
    }

    fn create_workspace(&self, _monitor: i32) -> Result<i32, FakeError> {
        let id = self.next_workspace.get();
        self.next_workspace.set(id + 1);
        self.created.borrow_mut().push(id);
        Ok(id)
    }

    fn activate_workspace(&self, workspace: i32) -> Result<(), FakeError> {
        self.activated.borrow_mut().push(workspace);
        Ok(())
    }

    fn move_to_workspace(&self, window: WindowId, workspace: i32) -> Result<(), FakeError> {
        self.get(window)?;
        self.with(window, |w| w.workspace = workspace);
        Ok(())
    }

    fn now(&self) -> Instant {
        self.clock.get()
    }
}

/// Layout engine that records every call.
#[derive(Default)]
pub(crate) struct FakeLayout {
    /// Reported by every `test_pack`.
    pub overflow: Cell<bool>,
    pub retiles: RefCell<Vec<(i32, Option<WindowId>, i32, bool)>>,
    pub packs: RefCell<Vec<(Vec<Size>, Rect)>>,
    pub swaps: RefCell<Vec<String>>,
}

impl LayoutEngine for FakeLayout {
    fn test_pack(&self, sizes: &[Size], available: Rect) -> PackResult {
        self.packs.borrow_mut().push((sizes.to_vec(), available));
        PackResult {
            overflow: self.overflow.get(),
            placements: vec![],
        }
    }

    fn retile(&self, workspace: i32, exclude: Option<WindowId>, monitor: i32, live_resize: bool) {
        self.retiles
            .borrow_mut()
            .push((workspace, exclude, monitor, live_resize));
    }

    fn set_temporary_swap(&self, a: WindowId, b: WindowId) {
        self.swaps.borrow_mut().push(format!("set {} {}", a, b));
    }

    fn apply_temporary_swap(&self) {
        self.swaps.borrow_mut().push("apply".to_string());
    }

    fn clear_temporary_swap(&self) {
        self.swaps.borrow_mut().push("clear".to_string());
    }
}

pub(crate) fn tiler(server: FakeServer) -> EdgeTiler<FakeServer, FakeLayout> {
    EdgeTiler::new(server, FakeLayout::default(), Config::default())
}

pub(crate) fn events(t: &mut EdgeTiler<FakeServer, FakeLayout>) -> mpsc::Receiver<TileEvent> {
    let (tx, rx) = mpsc::channel();
    t.set_event_sink(tx);
    rx
}
