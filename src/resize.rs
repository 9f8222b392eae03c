//! Live resize propagation between paired tiles.
//!
//! While the user drags the inner edge of a tile, its companion must
//! follow so the pair keeps covering the work area exactly:
//!
//! * a full tile's companions are every tile on the opposite side; their
//!   widths plus the resized width equal the work-area width;
//! * a quarter's companion is its vertical sibling; their heights add up to
//!   the work-area height and their widths are equal.
//!
//! Only windows between `ResizeBegin` and the end of their settle pass are
//! resized live; size signals of any other window are host echoes and are
//! ignored.  The first signal of a gesture only records a baseline.  Writes
//! the resolver issues to companions are echoed back by the host as new size
//! signals; a [`LeaseTable`] scoped to the `(resized, companion)` pair drops
//! those echoes.  When the gesture ends a settle pass re-reads the real
//! geometry and removes any gap or overlap the host left behind.

use crate::command::WindowId;
use crate::config::TilingConfig;
use crate::engine::{ws_err, Deferred, EdgeTiler, TileError};
use crate::geometry::{Point, Rect, Zone};
use crate::lease::LeaseTable;
use crate::scheduler::CheckState;
use crate::traits::{LayoutEngine, WindowServer};
use crate::zone::{TileSlot, ZoneMap};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Size and position of a tile when its gesture was first observed, or
/// after the resolver's last write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeTrack {
    pub width: i32,
    pub height: i32,
    pub position: Point,
}

impl ResizeTrack {
    fn of(rect: Rect) -> Self {
        Self {
            width: rect.width,
            height: rect.height,
            position: rect.position(),
        }
    }

    fn same_size(&self, rect: Rect) -> bool {
        self.width == rect.width && self.height == rect.height
    }
}

/// What to do with one live size signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizePlan {
    /// Not an edge tile, an echo of our own write, or no size change.
    Ignore,
    /// First signal of the gesture; remembered, geometry untouched.
    Baseline,
    /// The new size would break a minimum; the delta is dropped.
    Reject(&'static str),
    /// Nothing to pair with; the layout engine re-flows the free space.
    Retile,
    /// Write `resized` and every companion frame.
    Propagate {
        resized: Rect,
        companions: Vec<(WindowId, Rect)>,
    },
}

/// Per-window gesture tracking plus the pair leases.
#[derive(Debug, Default)]
pub struct ResizeConstraintResolver {
    gestures: HashSet<WindowId>,
    tracks: HashMap<WindowId, ResizeTrack>,
    leases: LeaseTable,
}

impl ResizeConstraintResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new gesture starts on `window`; any stale baseline is dropped.
    pub fn begin(&mut self, window: WindowId) {
        self.gestures.insert(window);
        self.tracks.remove(&window);
    }

    /// Whether `window` is inside a gesture that has not settled yet.
    pub fn is_tracking(&self, window: WindowId) -> bool {
        self.gestures.contains(&window)
    }

    /// Classify a size signal of `window`, tiled to `zone` and currently
    /// framed at `rect`.  `others` holds the other tiles of the work area.
    pub fn observe(
        &mut self,
        window: WindowId,
        zone: Zone,
        rect: Rect,
        work_area: Rect,
        others: &ZoneMap,
        limits: &TilingConfig,
        now: Instant,
    ) -> ResizePlan {
        if !zone.is_full() && !zone.is_quarter() {
            return ResizePlan::Ignore;
        }

        // A companion hearing our write, or a window nobody is resizing.
        if self.leases.guards(window, now) || !self.gestures.contains(&window) {
            return ResizePlan::Ignore;
        }
        let Some(track) = self.tracks.get(&window) else {
            self.tracks.insert(window, ResizeTrack::of(rect));
            return ResizePlan::Baseline;
        };
        if track.same_size(rect) {
            return ResizePlan::Ignore;
        }

        if zone.is_full() {
            plan_full(zone, rect, work_area, others, limits)
        } else {
            plan_quarter(zone, rect, track, work_area, others, limits)
        }
    }

    /// Remember `rect` as the latest frame the gesture produced.
    pub fn record(&mut self, window: WindowId, rect: Rect) {
        self.tracks.insert(window, ResizeTrack::of(rect));
    }

    /// `resized` wrote `companion`; the companion's echoes are dropped
    /// until `now + ttl`.
    pub fn guard(&mut self, resized: WindowId, companion: WindowId, now: Instant, ttl: Duration) {
        self.leases.acquire(resized, companion, now, ttl);
    }

    /// The gesture on `window` is over.
    pub fn finish(&mut self, window: WindowId) {
        self.gestures.remove(&window);
        self.tracks.remove(&window);
    }

    /// Drop everything known about `window`.
    pub fn forget(&mut self, window: WindowId) {
        self.finish(window);
        self.leases.release_window(window);
    }

    pub fn expire(&mut self, now: Instant) {
        self.leases.expire(now);
    }

    pub fn clear(&mut self) {
        self.gestures.clear();
        self.tracks.clear();
        self.leases.clear();
    }
}

fn plan_full(
    zone: Zone,
    rect: Rect,
    work_area: Rect,
    others: &ZoneMap,
    limits: &TilingConfig,
) -> ResizePlan {
    let Some(side) = zone.side() else {
        return ResizePlan::Ignore;
    };
    let opposite = others.side_occupants(side.opposite());
    if opposite.is_empty() {
        return ResizePlan::Retile;
    }

    let width = rect.width;
    let complement = work_area.width - width;
    if width < limits.min_tile_width {
        return ResizePlan::Reject("below minimum width");
    }
    if width > work_area.width - limits.min_tile_width || complement < limits.min_tile_width {
        return ResizePlan::Reject("companion below minimum width");
    }

    let resized = Rect::new(side.anchor_x(width, work_area), work_area.y, width, work_area.height);
    let cx = side.opposite().anchor_x(complement, work_area);
    let companions = opposite
        .iter()
        .map(|s| (s.window, Rect::new(cx, s.rect.y, complement, s.rect.height)))
        .collect();
    ResizePlan::Propagate { resized, companions }
}

fn plan_quarter(
    zone: Zone,
    rect: Rect,
    track: &ResizeTrack,
    work_area: Rect,
    others: &ZoneMap,
    limits: &TilingConfig,
) -> ResizePlan {
    let (Some(side), Some(slot), Some(pair)) = (zone.side(), zone.slot(), zone.vertical_pair())
    else {
        return ResizePlan::Ignore;
    };
    let Some(sibling) = others.occupant(pair).copied() else {
        return ResizePlan::Retile;
    };

    let height = rect.height;
    let complement = work_area.height - height;
    if height < limits.min_tile_height {
        return ResizePlan::Reject("below minimum height");
    }
    if height > work_area.height - limits.min_tile_height || complement < limits.min_tile_height {
        return ResizePlan::Reject("sibling below minimum height");
    }

    let width = rect.width;
    let opposite_width = work_area.width - width;
    let width_changed = width != track.width;
    if width_changed && (width < limits.min_tile_width || opposite_width < limits.min_tile_width) {
        return ResizePlan::Reject("width outside limits");
    }

    let x = side.anchor_x(width, work_area);
    let resized = Rect::new(x, slot.anchor_y(height, work_area), width, height);
    let mut companions = vec![(
        sibling.window,
        Rect::new(x, slot.opposite().anchor_y(complement, work_area), width, complement),
    )];
    if width_changed {
        let ox = side.opposite().anchor_x(opposite_width, work_area);
        companions.extend(
            others
                .side_occupants(side.opposite())
                .iter()
                .map(|s| (s.window, Rect::new(ox, s.rect.y, opposite_width, s.rect.height))),
        );
    }
    ResizePlan::Propagate { resized, companions }
}

/// Tiles that must follow `zone` when it is resized.
pub fn companions_of(zone: Zone, others: &ZoneMap) -> Vec<TileSlot> {
    if zone.is_full() {
        zone.side()
            .map(|side| others.side_occupants(side.opposite()))
            .unwrap_or_default()
    } else {
        zone.vertical_pair()
            .and_then(|pair| others.occupant(pair).copied())
            .into_iter()
            .collect()
    }
}

/// Writes that remove any gap or overlap between a resized tile and its
/// companions.  Empty when the pair already covers the work area exactly.
///
/// Companions keep their size unless it is below the minimum; the resized
/// tile absorbs the rest, but never shrinks below the minimum itself.
pub fn settle_plan(
    window: WindowId,
    zone: Zone,
    resized: Rect,
    companions: &[TileSlot],
    work_area: Rect,
    limits: &TilingConfig,
) -> Vec<(WindowId, Rect)> {
    let Some(side) = zone.side() else {
        return Vec::new();
    };
    if companions.is_empty() {
        return Vec::new();
    }

    let mut targets = Vec::with_capacity(companions.len() + 1);
    if zone.is_full() {
        let min = limits.min_tile_width;
        let widest = companions.iter().map(|s| s.rect.width).max().unwrap_or(min);
        let mut companion_width = widest.max(min);
        let mut width = work_area.width - companion_width;
        if width < min {
            width = min;
            companion_width = work_area.width - min;
        }
        targets.push((
            window,
            Rect::new(side.anchor_x(width, work_area), work_area.y, width, work_area.height),
        ));
        let cx = side.opposite().anchor_x(companion_width, work_area);
        for s in companions {
            targets.push((s.window, Rect::new(cx, s.rect.y, companion_width, s.rect.height)));
        }
    } else {
        let Some(slot) = zone.slot() else {
            return Vec::new();
        };
        let min = limits.min_tile_height;
        let sibling = companions[0];
        let mut sibling_height = sibling.rect.height.max(min);
        let mut height = work_area.height - sibling_height;
        if height < min {
            height = min;
            sibling_height = work_area.height - min;
        }
        let x = side.anchor_x(resized.width, work_area);
        targets.push((
            window,
            Rect::new(x, slot.anchor_y(height, work_area), resized.width, height),
        ));
        targets.push((
            sibling.window,
            Rect::new(
                x,
                slot.opposite().anchor_y(sibling_height, work_area),
                resized.width,
                sibling_height,
            ),
        ));
    }

    let actual = |w: WindowId| {
        if w == window {
            Some(resized)
        } else {
            companions.iter().find(|s| s.window == w).map(|s| s.rect)
        }
    };
    targets.retain(|(w, target)| actual(*w) != Some(*target));
    targets
}

/// Pending settle pass for the tile whose gesture just ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleCheck {
    pub window: WindowId,
    pub state: CheckState,
}

//  Engine integration

impl<W: WindowServer, L: LayoutEngine> EdgeTiler<W, L> {
    pub(crate) fn resize_begin(&mut self, window: WindowId) -> bool {
        if !self.store.zone(window).is_tiled() {
            return false;
        }
        self.resize.begin(window);
        self.tasks
            .cancel_matching(|t| matches!(t, Deferred::Settle(c) if c.window == window));
        true
    }

    /// React to a live size change of `window`.
    pub(crate) fn size_changed(&mut self, window: WindowId) -> bool {
        match self.propagate_resize(window) {
            Ok(applied) => applied,
            Err(e) => {
                debug!("resize of {} not propagated: {}", window, e);
                false
            }
        }
    }

    fn propagate_resize(&mut self, window: WindowId) -> Result<bool, TileError> {
        let zone = self.store.zone(window);
        if !zone.is_full() && !zone.is_quarter() {
            return Ok(false);
        }
        let placement = self.placement_of(window)?;
        let rect = self.server.frame_rect(window).map_err(ws_err)?;
        let others = self.zone_map(placement.location).without(window);
        let now = self.server.now();

        let plan = self.resize.observe(
            window,
            zone,
            rect,
            placement.work_area,
            &others,
            &self.config.tiling,
            now,
        );
        match plan {
            ResizePlan::Ignore | ResizePlan::Baseline => Ok(false),
            ResizePlan::Reject(reason) => {
                debug!("resize of {} to {} rejected: {}", window, rect, reason);
                Ok(false)
            }
            ResizePlan::Retile => {
                self.layout.retile(
                    placement.location.workspace,
                    Some(window),
                    placement.location.monitor,
                    true,
                );
                self.resize.record(window, rect);
                Ok(true)
            }
            ResizePlan::Propagate { resized, companions } => {
                let ttl = self.config.timing.resize_guard();
                for (companion, _) in &companions {
                    self.resize.guard(window, *companion, now, ttl);
                }
                self.server
                    .move_resize_frame(window, resized)
                    .map_err(ws_err)?;
                for (companion, target) in &companions {
                    self.server
                        .move_resize_frame(*companion, *target)
                        .map_err(ws_err)?;
                }
                self.resize.record(window, resized);
                Ok(true)
            }
        }
    }

    /// The gesture on `window` ended; queue the settle pass.
    pub(crate) fn resize_end(&mut self, window: WindowId) -> bool {
        if !self.resize.is_tracking(window) {
            return false;
        }
        let zone = self.store.zone(window);
        if !zone.is_full() && !zone.is_quarter() {
            self.resize.finish(window);
            return false;
        }
        let due = self.server.now() + self.config.timing.settle_delay();
        self.tasks.schedule(
            due,
            Deferred::Settle(SettleCheck {
                window,
                state: CheckState::start(self.config.timing.settle_retries),
            }),
        );
        true
    }

    pub(crate) fn run_settle_check(&mut self, check: SettleCheck) {
        let window = check.window;
        if let Err(e) = self.settle(check) {
            debug!("settle of {} abandoned: {}", window, e);
            self.resize.finish(window);
        }
    }

    fn settle(&mut self, mut check: SettleCheck) -> Result<(), TileError> {
        let window = check.window;
        let zone = self.store.zone(window);
        if !zone.is_full() && !zone.is_quarter() {
            return Err(TileError::NotTiled(window));
        }
        let placement = self.placement_of(window)?;
        let others = self.zone_map(placement.location).without(window);
        let companions = companions_of(zone, &others);
        if companions.is_empty() {
            self.resize.finish(window);
            return Ok(());
        }

        let actual = self.server.frame_rect(window).map_err(ws_err)?;
        let writes = settle_plan(
            window,
            zone,
            actual,
            &companions,
            placement.work_area,
            &self.config.tiling,
        );
        check.state = check.state.advance(writes.is_empty());
        match check.state {
            CheckState::Verified => {
                debug!("resize of {} settled at {}", window, actual);
                self.resize.finish(window);
            }
            CheckState::AwaitingGeometry { budget } => {
                info!(
                    "settling {} ({} corrections, attempt {}/{})",
                    window,
                    writes.len(),
                    budget.attempt(),
                    budget.limit()
                );
                let now = self.server.now();
                let ttl = self.config.timing.resize_guard();
                for (w, rect) in &writes {
                    if *w != window {
                        self.resize.guard(window, *w, now, ttl);
                    }
                    self.server.move_resize_frame(*w, *rect).map_err(ws_err)?;
                    if *w == window {
                        self.resize.record(window, *rect);
                    }
                }
                let due = now + self.config.timing.settle_delay();
                self.tasks.schedule(due, Deferred::Settle(check));
            }
            CheckState::TimedOut => {
                warn!("settle of {} timed out; retiling", window);
                self.layout.retile(
                    placement.location.workspace,
                    None,
                    placement.location.monitor,
                    false,
                );
                self.resize.finish(window);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::testing::{tiler, FakeServer, WA};

    fn limits() -> TilingConfig {
        TilingConfig::default()
    }

    fn slot(id: u64, zone: Zone, rect: Rect) -> TileSlot {
        TileSlot {
            window: WindowId(id),
            zone,
            rect,
        }
    }

    //  Pure planning

    #[test]
    fn first_signal_only_records_a_baseline() {
        let mut r = ResizeConstraintResolver::new();
        let others = ZoneMap::from_slots([slot(2, Zone::RightFull, Rect::new(960, 0, 960, 1080))]);
        let now = Instant::now();
        let a = WindowId(1);
        let rect = Rect::new(0, 0, 1000, 1080);
        r.begin(a);
        assert_eq!(
            r.observe(a, Zone::LeftFull, rect, WA, &others, &limits(), now),
            ResizePlan::Baseline
        );
        assert_eq!(
            r.observe(a, Zone::LeftFull, rect, WA, &others, &limits(), now),
            ResizePlan::Ignore
        );
    }

    #[test]
    fn signals_outside_a_gesture_are_ignored() {
        let mut r = ResizeConstraintResolver::new();
        let others = ZoneMap::from_slots([slot(2, Zone::RightFull, Rect::new(960, 0, 960, 1080))]);
        let now = Instant::now();
        let a = WindowId(1);
        for width in [960, 1100] {
            let rect = Rect::new(0, 0, width, 1080);
            assert_eq!(
                r.observe(a, Zone::LeftFull, rect, WA, &others, &limits(), now),
                ResizePlan::Ignore
            );
        }
        assert!(!r.is_tracking(a));
    }

    #[test]
    fn full_pair_widths_sum_to_work_area() {
        let mut r = ResizeConstraintResolver::new();
        let others = ZoneMap::from_slots([slot(2, Zone::RightFull, Rect::new(960, 0, 960, 1080))]);
        let now = Instant::now();
        let a = WindowId(1);
        r.begin(a);
        r.observe(a, Zone::LeftFull, Rect::new(0, 0, 960, 1080), WA, &others, &limits(), now);
        let plan = r.observe(a, Zone::LeftFull, Rect::new(0, 0, 1100, 1080), WA, &others, &limits(), now);
        assert_eq!(
            plan,
            ResizePlan::Propagate {
                resized: Rect::new(0, 0, 1100, 1080),
                companions: vec![(WindowId(2), Rect::new(1100, 0, 820, 1080))],
            }
        );
    }

    #[test]
    fn deltas_breaking_the_minimum_are_rejected() {
        let mut r = ResizeConstraintResolver::new();
        let others = ZoneMap::from_slots([slot(2, Zone::RightFull, Rect::new(960, 0, 960, 1080))]);
        let now = Instant::now();
        let a = WindowId(1);
        r.begin(a);
        r.observe(a, Zone::LeftFull, Rect::new(0, 0, 960, 1080), WA, &others, &limits(), now);
        for width in [1700, 250] {
            let plan = r.observe(a, Zone::LeftFull, Rect::new(0, 0, width, 1080), WA, &others, &limits(), now);
            assert!(matches!(plan, ResizePlan::Reject(_)), "width {width}: {plan:?}");
        }
    }

    #[test]
    fn unpaired_tiles_delegate_to_the_layout_engine() {
        let mut r = ResizeConstraintResolver::new();
        let now = Instant::now();
        let a = WindowId(1);
        let empty = ZoneMap::new();
        r.begin(a);
        r.observe(a, Zone::TopLeft, Rect::new(0, 0, 960, 540), WA, &empty, &limits(), now);
        let plan = r.observe(a, Zone::TopLeft, Rect::new(0, 0, 960, 600), WA, &empty, &limits(), now);
        assert_eq!(plan, ResizePlan::Retile);
    }

    #[test]
    fn companion_echo_is_ignored_while_leased() {
        let mut r = ResizeConstraintResolver::new();
        let others = ZoneMap::from_slots([slot(1, Zone::LeftFull, Rect::new(0, 0, 1100, 1080))]);
        let now = Instant::now();
        r.begin(WindowId(2));
        r.guard(WindowId(1), WindowId(2), now, Duration::from_millis(50));

        let echo = Rect::new(1100, 0, 820, 1080);
        assert_eq!(
            r.observe(WindowId(2), Zone::RightFull, echo, WA, &others, &limits(), now),
            ResizePlan::Ignore
        );
        let later = now + Duration::from_millis(60);
        assert_eq!(
            r.observe(WindowId(2), Zone::RightFull, echo, WA, &others, &limits(), later),
            ResizePlan::Baseline
        );
    }

    #[test]
    fn settle_grows_the_resized_tile_into_a_gap() {
        let companions = [slot(2, Zone::RightFull, Rect::new(1000, 0, 920, 1080))];
        let writes = settle_plan(
            WindowId(1),
            Zone::LeftFull,
            Rect::new(0, 0, 950, 1080),
            &companions,
            WA,
            &limits(),
        );
        assert_eq!(writes, vec![(WindowId(1), Rect::new(0, 0, 1000, 1080))]);
    }

    #[test]
    fn settle_forces_an_undersized_companion_to_its_minimum() {
        let companions = [slot(2, Zone::BottomLeft, Rect::new(0, 950, 960, 130))];
        let writes = settle_plan(
            WindowId(1),
            Zone::TopLeft,
            Rect::new(0, 0, 960, 950),
            &companions,
            WA,
            &limits(),
        );
        assert_eq!(
            writes,
            vec![
                (WindowId(1), Rect::new(0, 0, 960, 880)),
                (WindowId(2), Rect::new(0, 880, 960, 200)),
            ]
        );
    }

    #[test]
    fn settled_pair_needs_no_writes() {
        let companions = [slot(2, Zone::RightFull, Rect::new(1000, 0, 920, 1080))];
        assert!(settle_plan(
            WindowId(1),
            Zone::LeftFull,
            Rect::new(0, 0, 1000, 1080),
            &companions,
            WA,
            &limits()
        )
        .is_empty());
    }

    //  Through the engine

    #[test]
    fn full_pair_width_sum_holds_across_a_gesture() {
        let server = FakeServer::new(WA);
        let a = server.add(1, Rect::new(100, 100, 500, 400));
        let b = server.add(2, Rect::new(700, 100, 500, 400));
        let mut t = tiler(server);
        assert!(t.apply_tile(a, Zone::LeftFull));
        assert!(t.apply_tile(b, Zone::RightFull));

        t.handle(Command::ResizeBegin { window: a });
        t.handle(Command::SizeChanged { window: a });

        for width in [1000, 1100, 700, 1700, 900, 310] {
            t.server.set_rect(a, Rect::new(0, 0, width, 1080));
            let applied = t.handle(Command::SizeChanged { window: a });
            let sum = t.server.rect(a).width + t.server.rect(b).width;
            if applied {
                assert_eq!(sum, WA.width, "after width {width}");
                assert_eq!(t.server.rect(b).x, t.server.rect(a).right());
            } else {
                assert_eq!(width, 1700, "only the oversized delta is rejected");
            }
        }
    }

    #[test]
    fn quarter_pair_height_sum_holds_across_a_gesture() {
        let server = FakeServer::new(WA);
        let top = server.add(1, Rect::new(100, 100, 500, 400));
        let bottom = server.add(2, Rect::new(700, 100, 500, 400));
        let mut t = tiler(server);
        assert!(t.apply_tile(top, Zone::TopLeft));
        assert!(t.apply_tile(bottom, Zone::BottomLeft));

        t.handle(Command::ResizeBegin { window: bottom });
        t.handle(Command::SizeChanged { window: bottom });

        for height in [600, 700, 400, 1000, 250] {
            let wa_bottom = WA.bottom();
            let width = t.server.rect(bottom).width;
            t.server
                .set_rect(bottom, Rect::new(0, wa_bottom - height, width, height));
            let applied = t.handle(Command::SizeChanged { window: bottom });
            if applied {
                let (tr, br) = (t.server.rect(top), t.server.rect(bottom));
                assert_eq!(tr.height + br.height, WA.height, "after height {height}");
                assert_eq!(tr.width, br.width);
                assert_eq!(tr.bottom(), br.y);
            } else {
                assert_eq!(height, 1000);
            }
        }
    }

    #[test]
    fn settle_pass_corrects_a_rejected_overshoot() {
        let server = FakeServer::new(WA);
        let a = server.add(1, Rect::new(100, 100, 500, 400));
        let b = server.add(2, Rect::new(700, 100, 500, 400));
        let mut t = tiler(server);
        t.apply_tile(a, Zone::LeftFull);
        t.apply_tile(b, Zone::RightFull);

        t.handle(Command::ResizeBegin { window: a });
        t.handle(Command::SizeChanged { window: a });
        t.server.set_rect(a, Rect::new(0, 0, 1000, 1080));
        assert!(t.handle(Command::SizeChanged { window: a }));
        // The host lets the final drag overshoot past the minimum.
        t.server.set_rect(a, Rect::new(0, 0, 1750, 1080));
        assert!(!t.handle(Command::SizeChanged { window: a }));
        assert!(t.handle(Command::ResizeEnd { window: a }));

        t.server.advance(100);
        t.tick();
        assert_eq!(t.server.rect(a), Rect::new(0, 0, 1000, 1080));
        assert_eq!(t.server.rect(b), Rect::new(1000, 0, 920, 1080));
        assert!(t.resize.is_tracking(a));

        t.server.advance(100);
        t.tick();
        assert!(!t.resize.is_tracking(a));
        assert!(t.tasks.is_empty());
    }

    #[test]
    fn settle_falls_back_to_retile_when_the_host_keeps_refusing() {
        let server = FakeServer::new(WA);
        let top = server.add(1, Rect::new(100, 100, 500, 400));
        let bottom = server.add(2, Rect::new(700, 100, 500, 400));
        let mut t = tiler(server);
        t.apply_tile(top, Zone::TopLeft);
        t.apply_tile(bottom, Zone::BottomLeft);

        t.handle(Command::ResizeBegin { window: top });
        t.handle(Command::SizeChanged { window: top });
        // The host pins the top tile at 900 px no matter what is asked.
        t.server.set_min_height(top, 900);
        t.server.set_rect(top, Rect::new(0, 0, 960, 900));
        t.handle(Command::ResizeEnd { window: top });

        let retiles_before = t.layout.retiles.borrow().len();
        for _ in 0..=t.config.timing.settle_retries {
            t.server.advance(100);
            t.tick();
        }
        assert!(t.layout.retiles.borrow().len() > retiles_before);
        assert!(!t.resize.is_tracking(top));
        assert!(t.tasks.is_empty());
    }

    #[test]
    fn lone_full_tile_resize_retiles_the_mosaic() {
        let server = FakeServer::new(WA);
        let a = server.add(1, Rect::new(100, 100, 500, 400));
        let b = server.add(2, Rect::new(700, 100, 500, 400));
        let c = server.add(3, Rect::new(900, 500, 500, 400));
        let mut t = tiler(server);
        assert!(t.apply_tile(a, Zone::LeftFull));
        assert_eq!(t.zone_of(b), Zone::None);
        assert_eq!(t.zone_of(c), Zone::None);

        t.handle(Command::ResizeBegin { window: a });
        t.handle(Command::SizeChanged { window: a });
        t.server.set_rect(a, Rect::new(0, 0, 1200, 1080));
        assert!(t.handle(Command::SizeChanged { window: a }));
        assert_eq!(t.layout.retiles.borrow().last(), Some(&(1, Some(a), 0, true)));
    }

    #[test]
    fn companion_echo_never_feeds_back_into_the_resized_tile() {
        let server = FakeServer::new(WA);
        let a = server.add(1, Rect::new(100, 100, 500, 400));
        let b = server.add(2, Rect::new(700, 100, 500, 400));
        let mut t = tiler(server);
        t.apply_tile(a, Zone::LeftFull);
        t.apply_tile(b, Zone::RightFull);

        // The host reports the tile write on `b` outside any gesture.
        assert!(!t.handle(Command::SizeChanged { window: b }));
        assert!(!t.resize.is_tracking(b));

        t.handle(Command::ResizeBegin { window: a });
        t.handle(Command::SizeChanged { window: a });
        t.server.set_rect(a, Rect::new(0, 0, 1100, 1080));
        assert!(t.handle(Command::SizeChanged { window: a }));
        assert_eq!(t.server.rect(b), Rect::new(1100, 0, 820, 1080));

        let writes = t.server.writes.borrow().len();
        t.server.set_rect(b, Rect::new(1090, 0, 830, 1080));
        assert!(!t.handle(Command::SizeChanged { window: b }));
        t.server.advance(100);
        assert!(!t.handle(Command::SizeChanged { window: b }));
        assert_eq!(t.server.writes.borrow().len(), writes);
        assert_eq!(t.server.rect(a), Rect::new(0, 0, 1100, 1080));

        // The resized tile itself keeps following the pointer under its lease.
        t.server.set_rect(a, Rect::new(0, 0, 1200, 1080));
        assert!(t.handle(Command::SizeChanged { window: a }));
        assert_eq!(t.server.rect(b), Rect::new(1200, 0, 720, 1080));
    }
}
