//! Topology changes between full and quarter tiles.
//!
//! * A quarter that loses its vertical sibling is promoted back to the full
//!   zone of its side ([`expand_lone_quarter_to_full`](EdgeTiler::expand_lone_quarter_to_full)).
//! * A new tile targeting a quarter of a side held by a full tile splits
//!   that side: the full tile keeps its width and moves to the other
//!   quarter ([`split_full_into_quarter`](EdgeTiler::split_full_into_quarter)).
//!
//! The host may clamp the heights of a split asynchronously, so every
//! split queues a [`SplitCheck`] that re-reads the pair and corrects it
//! until the heights add up to the work area again.

use crate::command::WindowId;
use crate::engine::{ws_err, Deferred, EdgeTiler, Placement, TileError};
use crate::geometry::{Rect, Side, Slot, Zone};
use crate::scheduler::CheckState;
use crate::traits::{LayoutEngine, TileEvent, WindowServer};
use crate::zone::compute_rect;
use log::{debug, info, warn};

/// Pending verification of a freshly split side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitCheck {
    pub top: WindowId,
    pub bottom: WindowId,
    pub side: Side,
    pub work_area: Rect,
    /// Column shared by both quarters.
    pub x: i32,
    pub width: i32,
    /// Height the split asked the top quarter to take.
    pub planned_top: i32,
    pub state: CheckState,
}

impl SplitCheck {
    pub fn involves(&self, window: WindowId) -> bool {
        self.top == window || self.bottom == window
    }

    /// Whether the pair covers the column exactly, top to bottom.
    pub fn is_consistent(&self, top: Rect, bottom: Rect) -> bool {
        let wa = self.work_area;
        top.x == self.x
            && bottom.x == self.x
            && top.width == self.width
            && bottom.width == self.width
            && top.y == wa.y
            && top.bottom() == bottom.y
            && bottom.bottom() == wa.bottom()
    }

    /// Frames that restore the pair given what the host actually applied.
    ///
    /// Whichever quarter the host made taller than planned keeps its
    /// height; the other takes the rest.
    pub fn correction(&self, top: Rect, bottom: Rect) -> (Rect, Rect) {
        let wa = self.work_area;
        let planned_bottom = wa.height - self.planned_top;
        let (top_h, bottom_h) = if bottom.height > planned_bottom {
            (wa.height - bottom.height, bottom.height)
        } else {
            (top.height, wa.height - top.height)
        };
        (
            Rect::new(self.x, Slot::Top.anchor_y(top_h, wa), self.width, top_h),
            Rect::new(self.x, Slot::Bottom.anchor_y(bottom_h, wa), self.width, bottom_h),
        )
    }
}

impl<W: WindowServer, L: LayoutEngine> EdgeTiler<W, L> {
    /// Promote `survivor`, a quarter whose vertical sibling is gone, to the
    /// full zone of its side.
    ///
    /// The full frame comes from [`compute_rect`]; with nothing on the
    /// opposite side the survivor keeps its own width.
    pub fn expand_lone_quarter_to_full(
        &mut self,
        survivor: WindowId,
        placement: Placement,
    ) -> Result<(), TileError> {
        let zone = self.store.zone(survivor);
        let (Some(side), Some(pair)) = (zone.side(), zone.vertical_pair()) else {
            return Err(TileError::NotTiled(survivor));
        };
        let others = self.zone_map(placement.location).without(survivor);
        if others.occupant(pair).is_some() {
            debug!("{} still has a sibling in {}", survivor, pair);
            return Ok(());
        }

        let full = Zone::full(side);
        let wa = placement.work_area;
        let mut rect = compute_rect(full, wa, &others).ok_or(TileError::NoGeometry(full))?;
        if !others.side_occupied(side.opposite()) {
            let current = self.server.frame_rect(survivor).map_err(ws_err)?;
            rect.width = current.width;
            rect.x = side.anchor_x(current.width, wa);
        }

        self.place(survivor, rect, true)?;
        self.store.set_zone(survivor, full);
        info!("expanded {} from {} to {} at {}", survivor, zone, full, rect);
        self.emit(TileEvent::StateChanged {
            window: survivor,
            zone: full,
        });
        Ok(())
    }

    /// Split the side held by `existing` (a full tile) so `window` can take
    /// `zone`, one of that side's quarters.
    ///
    /// `existing` keeps its column and moves to the other quarter; both get
    /// half the work-area height.  Returns the frame for `window`, which
    /// the caller applies.
    pub fn split_full_into_quarter(
        &mut self,
        existing: WindowId,
        window: WindowId,
        zone: Zone,
        placement: Placement,
    ) -> Result<Rect, TileError> {
        let (Some(side), Some(slot), Some(pair)) = (zone.side(), zone.slot(), zone.vertical_pair())
        else {
            return Err(TileError::NoGeometry(zone));
        };
        let wa = placement.work_area;
        let column = self.server.frame_rect(existing).map_err(ws_err)?;
        let x = side.anchor_x(column.width, wa);

        let top_h = wa.height / 2;
        let bottom_h = wa.height - top_h;
        let height_of = |s: Slot| match s {
            Slot::Top => top_h,
            Slot::Bottom => bottom_h,
        };
        let existing_slot = slot.opposite();
        let existing_rect = Rect::new(
            x,
            existing_slot.anchor_y(height_of(existing_slot), wa),
            column.width,
            height_of(existing_slot),
        );
        let window_rect = Rect::new(
            x,
            slot.anchor_y(height_of(slot), wa),
            column.width,
            height_of(slot),
        );

        self.place(existing, existing_rect, true)?;
        self.store.set_zone(existing, pair);
        info!("split {}: {} moves to {}", Zone::full(side), existing, pair);
        self.emit(TileEvent::StateChanged {
            window: existing,
            zone: pair,
        });

        let (top, bottom) = match slot {
            Slot::Top => (window, existing),
            Slot::Bottom => (existing, window),
        };
        let check = SplitCheck {
            top,
            bottom,
            side,
            work_area: wa,
            x,
            width: column.width,
            planned_top: top_h,
            state: CheckState::start(self.config.timing.verify_retries),
        };
        let due = self.server.now() + self.config.timing.verify_delay();
        self.tasks.schedule(due, Deferred::VerifySplit(check));
        Ok(window_rect)
    }

    pub(crate) fn run_split_check(&mut self, check: SplitCheck) {
        if let Err(e) = self.verify_split(check) {
            debug!("split verification dropped: {}", e);
        }
    }

    fn verify_split(&mut self, mut check: SplitCheck) -> Result<(), TileError> {
        let top_zone = Zone::quarter(check.side, Slot::Top);
        let bottom_zone = Zone::quarter(check.side, Slot::Bottom);
        if self.store.zone(check.top) != top_zone {
            return Err(TileError::NotTiled(check.top));
        }
        if self.store.zone(check.bottom) != bottom_zone {
            return Err(TileError::NotTiled(check.bottom));
        }

        let top = self.server.frame_rect(check.top).map_err(ws_err)?;
        let bottom = self.server.frame_rect(check.bottom).map_err(ws_err)?;
        check.state = check.state.advance(check.is_consistent(top, bottom));
        match check.state {
            CheckState::Verified => {
                debug!("split of {} verified", Zone::full(check.side));
            }
            CheckState::AwaitingGeometry { budget } => {
                let (t, b) = check.correction(top, bottom);
                debug!(
                    "split of {} off ({} / {}), correcting to {} / {} (attempt {}/{})",
                    Zone::full(check.side),
                    top,
                    bottom,
                    t,
                    b,
                    budget.attempt(),
                    budget.limit()
                );
                self.server.move_resize_frame(check.top, t).map_err(ws_err)?;
                self.server
                    .move_resize_frame(check.bottom, b)
                    .map_err(ws_err)?;
                let due = self.server.now() + self.config.timing.verify_delay();
                self.tasks.schedule(due, Deferred::VerifySplit(check));
            }
            CheckState::TimedOut => {
                let (t, b) = check.correction(top, bottom);
                warn!(
                    "split of {} did not settle; writing {} / {} one last time",
                    Zone::full(check.side),
                    t,
                    b
                );
                self.server.move_resize_frame(check.top, t).map_err(ws_err)?;
                self.server
                    .move_resize_frame(check.bottom, b)
                    .map_err(ws_err)?;
            }
        }
        Ok(())
    }
}
