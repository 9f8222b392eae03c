//! The orchestrator that ties tile state, zone geometry and the host
//! together.
//!
//! [`EdgeTiler`] owns every piece of engine state (tile records, auto-tile
//! links, resize tracking, deferred tasks, swap cooldowns and the active
//! drag) and reacts to [`Command`]s by issuing calls to the
//! [`WindowServer`] and [`LayoutEngine`] traits.  The component modules
//! (`conversion`, `resize`, `overflow`, `swap`, `dependency`) extend it with
//! their own `impl` blocks.
//!
//! Every public operation follows one failure contract: it returns `false`
//! (or `None`) and logs the reason; it never panics and never leaves a
//! half-committed tile record behind.

use crate::command::{Command, Direction, WindowId};
use crate::config::Config;
use crate::conversion::SplitCheck;
use crate::dependency::DependencyGraph;
use crate::geometry::{Point, Rect, Zone};
use crate::resize::{ResizeConstraintResolver, SettleCheck};
use crate::scheduler::Scheduler;
use crate::state::{TileRecord, TileStateStore};
use crate::traits::{
    LayoutEngine, Motion, MotionOptions, TileEvent, WindowLocation, WindowServer,
};
use crate::zone::{compute_rect, detect_zone, TileSlot, ZoneMap};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::mpsc;
use std::time::Instant;

/// Why a tiling step did not happen.
#[derive(Debug, thiserror::Error)]
pub enum TileError {
    /// The window server returned an error.
    #[error("window server error: {0}")]
    WindowServer(String),

    #[error("window {0} is not resizable")]
    NotResizable(WindowId),

    #[error("no work area for window {0}")]
    NoWorkArea(WindowId),

    #[error("window {0} is not tiled")]
    NotTiled(WindowId),

    #[error("zone {0} has no geometry")]
    NoGeometry(Zone),

    #[error("window {0} swapped too recently")]
    CoolingDown(WindowId),

    #[error("window {0} has no neighbour {1}")]
    NoNeighbor(WindowId, Direction),

    #[error("invalid swap: {0}")]
    InvalidSwap(String),

    #[error("no focused window")]
    NoFocus,
}

/// Map a host error into [`TileError::WindowServer`].
pub(crate) fn ws_err(e: impl Display) -> TileError {
    TileError::WindowServer(e.to_string())
}

/// Where a window lives and the work area it tiles into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub location: WindowLocation,
    pub work_area: Rect,
}

/// Geometry to give a window when it stops being tiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Restore {
    /// Back to the frame it had before it was first tiled.
    PreTile,
    /// Pre-tile size, current position (dropped after a drag).
    KeepPosition,
    /// Leave the frame alone (the window is going away).
    Skip,
}

/// Continuations queued on the [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Deferred {
    VerifySplit(SplitCheck),
    Settle(SettleCheck),
    PollDrag { window: WindowId },
    Retile { workspace: i32, monitor: i32 },
}

impl Deferred {
    pub(crate) fn involves(&self, window: WindowId) -> bool {
        match self {
            Deferred::VerifySplit(check) => check.involves(window),
            Deferred::Settle(check) => check.window == window,
            Deferred::PollDrag { window: w } => *w == window,
            Deferred::Retile { .. } => false,
        }
    }

    fn is_geometry_check(&self) -> bool {
        matches!(self, Deferred::VerifySplit(_) | Deferred::Settle(_))
    }
}

/// The window being dragged and the zone currently previewed for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DragState {
    pub window: WindowId,
    pub zone: Zone,
}

/// Zone-based edge tiling on top of a [`WindowServer`] and an external
/// [`LayoutEngine`].
///
/// The engine is single-threaded and never blocks: host notifications and
/// user commands go through [`handle`](Self::handle), and work that must
/// wait for the host is queued and run by [`tick`](Self::tick).
///
/// # Typical usage
///
/// ```ignore
/// let wm = HyprlandWm::new()?;
/// let mut tiler = EdgeTiler::new(wm, layout, Config::default());
/// tiler.handle(Command::Tile(Zone::LeftFull));
/// ```
pub struct EdgeTiler<W: WindowServer, L: LayoutEngine> {
    pub(crate) server: W,
    pub(crate) layout: L,
    pub(crate) motion: Option<Box<dyn Motion>>,
    pub(crate) config: Config,
    pub(crate) store: TileStateStore,
    pub(crate) links: DependencyGraph,
    pub(crate) resize: ResizeConstraintResolver,
    pub(crate) tasks: Scheduler<Deferred>,
    pub(crate) cooldowns: HashMap<WindowId, Instant>,
    pub(crate) drag: Option<DragState>,
    events: Option<mpsc::Sender<TileEvent>>,
}

impl<W: WindowServer, L: LayoutEngine> EdgeTiler<W, L> {
    pub fn new(server: W, layout: L, config: Config) -> Self {
        Self {
            server,
            layout,
            motion: None,
            config,
            store: TileStateStore::new(),
            links: DependencyGraph::new(),
            resize: ResizeConstraintResolver::new(),
            tasks: Scheduler::new(),
            cooldowns: HashMap::new(),
            drag: None,
            events: None,
        }
    }

    /// Animate tile moves through `motion` instead of writing frames
    /// directly.
    pub fn set_motion(&mut self, motion: Box<dyn Motion>) {
        self.motion = Some(motion);
    }

    /// Attach an event channel.
    ///
    /// The engine sends [`TileEvent::StateChanged`] for every applied,
    /// converted or removed tile, [`TileEvent::ZonePreview`] while a drag
    /// hovers a zone and [`TileEvent::Migrated`] after an overflow
    /// migration.
    pub fn set_event_sink(&mut self, tx: mpsc::Sender<TileEvent>) {
        self.events = Some(tx);
    }

    pub fn server(&self) -> &W {
        &self.server
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current zone of `window`, `Zone::None` when untiled.
    pub fn zone_of(&self, window: WindowId) -> Zone {
        self.store.zone(window)
    }

    pub fn tile_record(&self, window: WindowId) -> Option<TileRecord> {
        self.store.get(window).copied()
    }

    /// Master `window` was auto-tiled against, if any.
    pub fn master_of(&self, window: WindowId) -> Option<WindowId> {
        self.links.master_of(window)
    }

    /// Earliest deadline among queued tasks.  Hosts sleep until then and
    /// call [`tick`](Self::tick).
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.next_due()
    }

    /// Process a single [`Command`].  Returns whether it changed anything.
    pub fn handle(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Tile(zone) => {
                info!("tile focused window to {}", zone);
                self.with_focused(|t, w| t.apply_tile(w, zone))
            }
            Command::TileWindow { window, zone } => {
                info!("tile {} to {}", window, zone);
                self.apply_tile(window, zone)
            }
            Command::Untile => {
                info!("untile focused window");
                self.with_focused(|t, w| t.remove_tile(w))
            }
            Command::Swap(dir) => {
                info!("swap focused window {}", dir);
                self.with_focused(|t, w| t.swap_window(w, dir))
            }
            Command::GrabBegin { window } => self.begin_drag(window),
            Command::GrabEnd { window } => self.end_drag(window),
            Command::ResizeBegin { window } => self.resize_begin(window),
            Command::SizeChanged { window } => self.size_changed(window),
            Command::ResizeEnd { window } => self.resize_end(window),
            Command::GeometryApplied { window } => self.geometry_applied(window),
            Command::WindowAdded { window } => self.window_added(window),
            Command::WindowDestroyed { window } => self.window_destroyed(window),
            Command::Tick => self.tick() > 0,
        }
    }

    fn with_focused(&mut self, f: impl FnOnce(&mut Self, WindowId) -> bool) -> bool {
        match self.server.active_window() {
            Ok(Some(window)) => f(self, window),
            Ok(None) => {
                debug!("{}", TileError::NoFocus);
                false
            }
            Err(e) => {
                warn!("could not query the focused window: {}", e);
                false
            }
        }
    }

    //  Tile application

    /// Tile `window` to `zone`.  `Zone::None` un-tiles it.
    ///
    /// The current frame is saved as the pre-tile frame before anything is
    /// validated; if the application is then rejected, a record created by
    /// this call is dropped again.
    pub fn apply_tile(&mut self, window: WindowId, zone: Zone) -> bool {
        if zone == Zone::None {
            return self.remove_tile(window);
        }
        let current = match self.server.frame_rect(window) {
            Ok(rect) => rect,
            Err(e) => {
                warn!("cannot tile {}: {}", window, e);
                return false;
            }
        };
        let created = self.store.save(window, current);
        match self.commit_tile(window, zone) {
            Ok(()) => true,
            Err(e) => {
                debug!("tiling {} to {} rejected: {}", window, zone, e);
                if created {
                    self.store.clear(window);
                }
                false
            }
        }
    }

    fn commit_tile(&mut self, window: WindowId, zone: Zone) -> Result<(), TileError> {
        if !self.server.is_resizable(window).map_err(ws_err)? {
            return Err(TileError::NotResizable(window));
        }
        let placement = self.placement_of(window)?;
        let previous = self.store.zone(window);
        // Must precede conflict resolution, which may release the master.
        let severed = (previous.is_tiled() && previous != zone).then(|| self.sever_links(window));

        let rect = match self.move_into(window, zone, previous, placement) {
            Ok(rect) => rect,
            Err(e) => {
                if let Some(severed) = severed {
                    self.restore_links(window, severed);
                }
                return Err(e);
            }
        };
        self.store.set_zone(window, zone);
        info!("tiled {} to {} at {}", window, zone, rect);
        self.emit(TileEvent::StateChanged { window, zone });

        if previous.is_quarter() && previous != zone {
            self.expand_sibling_of(previous, window, placement);
        }
        if let Err(e) = self.after_tile_applied(window, zone, placement) {
            warn!("overflow check after tiling {} failed: {}", window, e);
        }
        Ok(())
    }

    /// Clear `zone` for `window` and write its frame there.  The record of
    /// `window` is not touched.
    fn move_into(
        &mut self,
        window: WindowId,
        zone: Zone,
        previous: Zone,
        placement: Placement,
    ) -> Result<Rect, TileError> {
        if previous == Zone::Fullscreen && zone != Zone::Fullscreen {
            self.server.unmaximize(window).map_err(ws_err)?;
        }
        let preset = self.resolve_conflicts(window, zone, placement)?;
        let rect = match preset {
            Some(rect) => rect,
            None => {
                let others = self.zone_map(placement.location).without(window);
                compute_rect(zone, placement.work_area, &others)
                    .ok_or(TileError::NoGeometry(zone))?
            }
        };
        if zone == Zone::Fullscreen {
            self.server.maximize(window).map_err(ws_err)?;
        } else {
            self.place(window, rect, false)?;
        }
        Ok(rect)
    }

    /// Make room for `window` in `zone`.
    ///
    /// A quarter on a side held by a full tile splits it; the frame for
    /// `window` is returned.  A quarter already occupied is released, and
    /// a full zone releases everything else on its side.
    fn resolve_conflicts(
        &mut self,
        window: WindowId,
        zone: Zone,
        placement: Placement,
    ) -> Result<Option<Rect>, TileError> {
        let Some(side) = zone.side() else {
            return Ok(None);
        };
        let others = self.zone_map(placement.location).without(window);

        if zone.is_quarter() {
            if let Some(full) = others.occupant(Zone::full(side)) {
                let rect = self.split_full_into_quarter(full.window, window, zone, placement)?;
                return Ok(Some(rect));
            }
            if let Some(occupant) = others.occupant(zone) {
                info!("{} replaces {} in {}", window, occupant.window, zone);
                self.detach(occupant.window, Restore::PreTile)?;
            }
        } else {
            for occupant in others.side_occupants(side) {
                info!("{} replaces {} in {}", window, occupant.window, occupant.zone);
                self.detach(occupant.window, Restore::PreTile)?;
            }
        }
        Ok(None)
    }

    /// Promote the sibling left behind in `vacated`'s vertical pair.
    fn expand_sibling_of(&mut self, vacated: Zone, leaving: WindowId, placement: Placement) {
        let Some(pair) = vacated.vertical_pair() else {
            return;
        };
        let sibling = self
            .zone_map(placement.location)
            .occupant(pair)
            .map(|s| s.window)
            .filter(|w| *w != leaving);
        if let Some(sibling) = sibling {
            if let Err(e) = self.expand_lone_quarter_to_full(sibling, placement) {
                warn!("could not expand {}: {}", sibling, e);
            }
        }
    }

    //  Tile removal

    /// Un-tile `window` and restore its pre-tile frame.
    ///
    /// Windows auto-tiled against it are un-tiled first.  A quarter sibling
    /// left alone is promoted to full and the layout engine retiles the
    /// free space.
    pub fn remove_tile(&mut self, window: WindowId) -> bool {
        match self.untile(window, Restore::PreTile) {
            Ok(()) => true,
            Err(e) => {
                debug!("cannot untile {}: {}", window, e);
                false
            }
        }
    }

    pub(crate) fn untile(&mut self, window: WindowId, restore: Restore) -> Result<(), TileError> {
        let zone = self.store.zone(window);
        if !zone.is_tiled() {
            return Err(TileError::NotTiled(window));
        }
        let placement = self.placement_of(window).ok();
        self.detach(window, restore)?;
        if let Some(placement) = placement {
            self.expand_sibling_of(zone, window, placement);
            self.layout.retile(
                placement.location.workspace,
                None,
                placement.location.monitor,
                false,
            );
        }
        Ok(())
    }

    /// Release `window` from its zone without touching its neighbours.
    ///
    /// Dependents are un-tiled first and every link involving `window` is
    /// dropped before its own record is cleared.
    pub(crate) fn detach(&mut self, window: WindowId, restore: Restore) -> Result<(), TileError> {
        let record = self
            .store
            .get(window)
            .copied()
            .ok_or(TileError::NotTiled(window))?;

        let dependents = self.links.remove_master(window);
        self.links.unlink_dependent(window);
        for dep in dependents {
            info!("untiling {} with its master {}", dep, window);
            if let Err(e) = self.untile(dep, Restore::PreTile) {
                debug!("dependent {} already gone: {}", dep, e);
            }
        }

        self.store.set_zone(window, Zone::None);
        if restore != Restore::Skip {
            if record.zone == Zone::Fullscreen {
                if let Err(e) = self.server.unmaximize(window) {
                    warn!("could not unmaximize {}: {}", window, e);
                }
            }
            let target = match restore {
                Restore::KeepPosition => self.server.frame_rect(window).ok().map(|r| {
                    Rect::new(
                        r.x,
                        r.y,
                        record.pre_tile_rect.width,
                        record.pre_tile_rect.height,
                    )
                }),
                _ => Some(record.pre_tile_rect),
            };
            if let Some(target) = target {
                if let Err(e) = self.place(window, target, false) {
                    warn!("could not restore {}: {}", window, e);
                }
            }
        }

        self.store.clear(window);
        self.resize.forget(window);
        self.tasks.cancel_matching(|t| t.involves(window));
        info!("untiled {} from {}", window, record.zone);
        self.emit(TileEvent::StateChanged {
            window,
            zone: Zone::None,
        });
        Ok(())
    }

    /// Reclaim everything known about a window that is going away.
    ///
    /// Hosts usually report the close after the window is gone, so the
    /// vacated pair is found through the sibling's own placement.
    fn window_destroyed(&mut self, window: WindowId) -> bool {
        let zone = self.store.zone(window);
        let placement = self
            .placement_of(window)
            .ok()
            .or_else(|| self.orphan_placement(zone, window));
        let had_state = self.store.has(window);
        if had_state {
            if let Err(e) = self.detach(window, Restore::Skip) {
                debug!("reclaiming {}: {}", window, e);
            }
        }
        if let Some(placement) = placement {
            self.expand_sibling_of(zone, window, placement);
        }
        self.links.forget(window);
        self.resize.forget(window);
        self.cooldowns.remove(&window);
        self.tasks.cancel_matching(|t| t.involves(window));
        if self.drag.is_some_and(|d| d.window == window) {
            self.drag = None;
        }
        had_state
    }

    /// Placement of a tile left alone in `vacated`'s vertical pair.
    fn orphan_placement(&self, vacated: Zone, leaving: WindowId) -> Option<Placement> {
        let pair = vacated.vertical_pair()?;
        self.store
            .tiled()
            .into_iter()
            .filter(|(w, z)| *z == pair && *w != leaving)
            .filter_map(|(w, _)| self.placement_of(w).ok())
            .find(|p| {
                self.zone_map(p.location)
                    .without(leaving)
                    .occupant(vacated)
                    .is_none()
            })
    }

    //  Drag

    fn begin_drag(&mut self, window: WindowId) -> bool {
        if let Some(previous) = self.drag.take() {
            debug!("drag of {} superseded by {}", previous.window, window);
            self.tasks
                .cancel_matching(|t| matches!(t, Deferred::PollDrag { .. }));
        }
        self.drag = Some(DragState {
            window,
            zone: Zone::None,
        });
        let due = self.server.now() + self.config.timing.drag_poll();
        self.tasks.schedule(due, Deferred::PollDrag { window });
        true
    }

    fn poll_drag(&mut self, window: WindowId) {
        let Some(drag) = self.drag.filter(|d| d.window == window) else {
            return;
        };
        let pointer = match self.server.pointer() {
            Ok(p) => p,
            Err(e) => {
                warn!("pointer unavailable, ending drag of {}: {}", window, e);
                self.drag = None;
                return;
            }
        };
        if !pointer.pressed {
            debug!("button released without a grab-end for {}", window);
            self.finish_drag(window, pointer.position);
            return;
        }

        let zone = self.zone_under(window, pointer.position);
        if zone != drag.zone {
            self.drag = Some(DragState { window, zone });
            self.emit(TileEvent::ZonePreview { window, zone });
        }
        let due = self.server.now() + self.config.timing.drag_poll();
        self.tasks.schedule(due, Deferred::PollDrag { window });
    }

    fn end_drag(&mut self, window: WindowId) -> bool {
        if !self.drag.is_some_and(|d| d.window == window) {
            return false;
        }
        self.tasks
            .cancel_matching(|t| matches!(t, Deferred::PollDrag { window: w } if *w == window));
        match self.server.pointer() {
            Ok(pointer) => self.finish_drag(window, pointer.position),
            Err(e) => {
                warn!("pointer unavailable at the end of the drag: {}", e);
                self.drag = None;
                false
            }
        }
    }

    /// Apply whatever zone lies under `position`; dropping a tiled window
    /// outside every zone un-tiles it where it was dropped.
    fn finish_drag(&mut self, window: WindowId, position: Point) -> bool {
        let previewed = self.drag.take().map(|d| d.zone).unwrap_or(Zone::None);
        let zone = self.zone_under(window, position);
        if previewed.is_tiled() {
            self.emit(TileEvent::ZonePreview {
                window,
                zone: Zone::None,
            });
        }
        if zone.is_tiled() {
            self.apply_tile(window, zone)
        } else if self.store.zone(window).is_tiled() {
            match self.untile(window, Restore::KeepPosition) {
                Ok(()) => true,
                Err(e) => {
                    debug!("dropping {}: {}", window, e);
                    false
                }
            }
        } else {
            false
        }
    }

    fn zone_under(&self, window: WindowId, position: Point) -> Zone {
        match self.placement_of(window) {
            Ok(placement) => {
                let others = self.zone_map(placement.location).without(window);
                detect_zone(position, placement.work_area, &others, &self.config.tiling)
            }
            Err(e) => {
                debug!("no zone for {}: {}", window, e);
                Zone::None
            }
        }
    }

    //  Deferred work

    /// Run every task that has come due.  Returns how many ran.
    pub fn tick(&mut self) -> usize {
        let now = self.server.now();
        self.resize.expire(now);
        self.cooldowns.retain(|_, until| *until > now);
        let due = self.tasks.take_due(now);
        let n = due.len();
        for task in due {
            self.run_deferred(task);
        }
        n
    }

    /// The host confirmed a geometry write for `window`: run its pending
    /// checks now rather than at their deadline.
    fn geometry_applied(&mut self, window: WindowId) -> bool {
        let ready = self
            .tasks
            .take_matching(|t| t.is_geometry_check() && t.involves(window));
        let ran = !ready.is_empty();
        for task in ready {
            self.run_deferred(task);
        }
        ran
    }

    fn run_deferred(&mut self, task: Deferred) {
        match task {
            Deferred::VerifySplit(check) => self.run_split_check(check),
            Deferred::Settle(check) => self.run_settle_check(check),
            Deferred::PollDrag { window } => self.poll_drag(window),
            Deferred::Retile { workspace, monitor } => {
                debug!("retiling workspace {} on monitor {}", workspace, monitor);
                self.layout.retile(workspace, None, monitor, false);
            }
        }
    }

    /// Drop every pending task and all per-window state.
    pub fn teardown(&mut self) {
        let dropped = self.tasks.clear();
        self.resize.clear();
        self.cooldowns.clear();
        self.drag = None;
        self.links.clear();
        self.store.clear_all();
        self.layout.clear_temporary_swap();
        info!("engine torn down ({} pending tasks dropped)", dropped);
    }

    //  Host helpers

    pub(crate) fn placement_of(&self, window: WindowId) -> Result<Placement, TileError> {
        let location = self
            .server
            .window_location(window)
            .map_err(ws_err)?
            .ok_or(TileError::NoWorkArea(window))?;
        let work_area = self
            .server
            .work_area(location.workspace, location.monitor)
            .map_err(ws_err)?
            .ok_or(TileError::NoWorkArea(window))?;
        Ok(Placement {
            location,
            work_area,
        })
    }

    /// Tiles sharing `location`, at their current frames.
    pub(crate) fn zone_map(&self, location: WindowLocation) -> ZoneMap {
        let slots = self.store.tiled().into_iter().filter_map(|(window, zone)| {
            let here = self.server.window_location(window).ok().flatten()? == location;
            if !here {
                return None;
            }
            let rect = self.server.frame_rect(window).ok()?;
            Some(TileSlot { window, zone, rect })
        });
        ZoneMap::from_slots(slots)
    }

    /// Untiled windows sharing `location`.
    pub(crate) fn mosaic_windows(&self, location: WindowLocation) -> Result<Vec<WindowId>, TileError> {
        let windows = self
            .server
            .windows(location.workspace)
            .map_err(ws_err)?;
        Ok(windows
            .into_iter()
            .filter(|w| !self.store.zone(*w).is_tiled())
            .filter(|w| {
                self.server
                    .window_location(*w)
                    .ok()
                    .flatten()
                    .is_some_and(|l| l == location)
            })
            .collect())
    }

    /// Move `window` to `rect`, animated when a motion system is attached.
    pub(crate) fn place(&self, window: WindowId, rect: Rect, subtle: bool) -> Result<(), TileError> {
        match &self.motion {
            Some(motion) => {
                motion.animate(
                    window,
                    rect,
                    MotionOptions {
                        subtle,
                        duration: self.config.timing.animation(),
                    },
                );
                Ok(())
            }
            None => self.server.move_resize_frame(window, rect).map_err(ws_err),
        }
    }

    pub(crate) fn emit(&self, event: TileEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
