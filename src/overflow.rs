//! Deciding when free-form windows no longer fit next to the edge tiles.
//!
//! After every successful tile application the arbiter looks at the
//! free-form ("mosaic") windows left on the same workspace and monitor:
//!
//! 1. both sides tiled → the mosaic windows move to a fresh workspace;
//! 2. a full tile plus exactly one mosaic window → that window is tiled to
//!    the opposite full zone and linked to the tile that caused it;
//! 3. otherwise the layout engine test-packs the mosaic windows into the
//!    space the tiles leave; if they overflow, they migrate as in 1.

use crate::command::WindowId;
use crate::engine::{ws_err, Deferred, EdgeTiler, Placement, TileError};
use crate::geometry::{Rect, Side, Size, Zone};
use crate::traits::{LayoutEngine, TileEvent, WindowLocation, WindowServer};
use crate::zone::ZoneMap;
use log::{debug, info};

/// What the arbiter wants done with the mosaic windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverflowDecision {
    Nothing,
    Migrate,
    AutoTile { window: WindowId, zone: Zone },
    TestPack { available: Rect },
}

/// Pure classification step.
///
/// `zone` is the zone just applied (`Zone::None` when re-evaluating for a
/// window that appeared), `tiles` the tiles of the work area after the
/// application and `mosaic` the untiled windows sharing it.
pub fn decide(
    zone: Zone,
    tiles: &ZoneMap,
    mosaic: &[WindowId],
    work_area: Rect,
    allow_auto_tile: bool,
) -> OverflowDecision {
    if mosaic.is_empty() || tiles.is_empty() || zone == Zone::Fullscreen {
        return OverflowDecision::Nothing;
    }
    if tiles.side_occupied(Side::Left) && tiles.side_occupied(Side::Right) {
        return OverflowDecision::Migrate;
    }
    if let ([lone], Some(opposite), true) = (mosaic, zone.mirrored(), allow_auto_tile) {
        if zone.is_full() {
            return OverflowDecision::AutoTile {
                window: *lone,
                zone: opposite,
            };
        }
    }
    OverflowDecision::TestPack {
        available: leftover_rect(tiles, work_area),
    }
}

/// The part of the work area not covered by side tiles.
pub fn leftover_rect(tiles: &ZoneMap, work_area: Rect) -> Rect {
    let left = tiles.side_width(Side::Left).unwrap_or(0);
    let right = tiles.side_width(Side::Right).unwrap_or(0);
    Rect::new(
        work_area.x + left,
        work_area.y,
        (work_area.width - left - right).max(0),
        work_area.height,
    )
}

impl<W: WindowServer, L: LayoutEngine> EdgeTiler<W, L> {
    /// Re-evaluate the mosaic after `window` was tiled to `zone`.
    pub(crate) fn after_tile_applied(
        &mut self,
        window: WindowId,
        zone: Zone,
        placement: Placement,
    ) -> Result<(), TileError> {
        self.arbitrate(Some((window, zone)), placement)
    }

    /// A new window showed up; make room for it or move it along.  Never
    /// auto-tiles.
    pub(crate) fn window_added(&mut self, window: WindowId) -> bool {
        if self.store.zone(window).is_tiled() {
            return false;
        }
        let result = self
            .placement_of(window)
            .and_then(|placement| self.arbitrate(None, placement));
        match result {
            Ok(()) => true,
            Err(e) => {
                debug!("no overflow check for new window {}: {}", window, e);
                false
            }
        }
    }

    fn arbitrate(
        &mut self,
        applied: Option<(WindowId, Zone)>,
        placement: Placement,
    ) -> Result<(), TileError> {
        let loc = placement.location;
        let tiles = self.zone_map(loc);
        let mosaic = self.mosaic_windows(loc)?;
        let zone = applied.map(|(_, z)| z).unwrap_or(Zone::None);

        match decide(zone, &tiles, &mosaic, placement.work_area, applied.is_some()) {
            OverflowDecision::Nothing => Ok(()),
            OverflowDecision::Migrate => self.migrate(&mosaic, loc),
            OverflowDecision::AutoTile { window: lone, zone } => {
                let Some((master, _)) = applied else {
                    return Ok(());
                };
                info!("auto-tiling lone window {} to {}", lone, zone);
                if self.apply_tile(lone, zone) {
                    self.links.link(lone, master);
                }
                Ok(())
            }
            OverflowDecision::TestPack { available } => {
                let sizes: Vec<Size> = mosaic
                    .iter()
                    .filter_map(|w| self.server.frame_rect(*w).ok())
                    .map(|r| r.size())
                    .collect();
                let result = self.layout.test_pack(&sizes, available);
                if result.overflow {
                    info!(
                        "{} free windows overflow {} on workspace {}",
                        mosaic.len(),
                        available,
                        loc.workspace
                    );
                    self.migrate(&mosaic, loc)
                } else {
                    self.layout.retile(loc.workspace, None, loc.monitor, false);
                    Ok(())
                }
            }
        }
    }

    /// Move `windows` to a newly created workspace on the same monitor,
    /// show it, and retile the source workspace a little later.
    fn migrate(&mut self, windows: &[WindowId], from: WindowLocation) -> Result<(), TileError> {
        let target = self
            .server
            .create_workspace(from.monitor)
            .map_err(ws_err)?;
        for window in windows {
            self.server
                .move_to_workspace(*window, target)
                .map_err(ws_err)?;
        }
        self.server.activate_workspace(target).map_err(ws_err)?;
        info!(
            "migrated {} free windows from workspace {} to {}",
            windows.len(),
            from.workspace,
            target
        );
        self.emit(TileEvent::Migrated {
            windows: windows.to_vec(),
            workspace: target,
        });

        let due = self.server.now() + self.config.timing.retile_delay();
        self.tasks.schedule(
            due,
            Deferred::Retile {
                workspace: from.workspace,
                monitor: from.monitor,
            },
        );
        Ok(())
    }
}
