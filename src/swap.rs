//! Directional neighbour search and swapping across tiled and free-form
//! windows.
//!
//! [`find_neighbor`] is pure: given the window, its frame and zone, the
//! tiles of its work area and the free-form windows next to them, it names
//! the neighbour in a direction and what kind of swap that would be.
//! [`EdgeTiler::swap_window`] executes it.

use crate::command::{Direction, WindowId};
use crate::engine::{EdgeTiler, Restore, TileError};
use crate::geometry::{Rect, Slot, Zone};
use crate::traits::{LayoutEngine, TileEvent, WindowServer};
use crate::zone::{compute_rect, ZoneMap};
use log::{debug, info};
use std::cmp::Ordering;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborKind {
    /// Another free-form window.
    Mosaic,
    /// An occupied tile.
    Tiling,
    /// A vacant zone the window moves into.
    EmptyTiling,
    /// A vacant full zone a quarter (or free-form window) expands into.
    EmptyTilingExpand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    /// The window to trade places with; `None` for vacant zones.
    pub target: Option<WindowId>,
    /// Zone involved in the swap; `Zone::None` for mosaic neighbours.
    pub zone: Zone,
    pub kind: NeighborKind,
}

impl Neighbor {
    fn tile(window: WindowId, zone: Zone) -> Self {
        Self {
            target: Some(window),
            zone,
            kind: NeighborKind::Tiling,
        }
    }

    fn vacant(zone: Zone, kind: NeighborKind) -> Self {
        Self {
            target: None,
            zone,
            kind,
        }
    }

    fn mosaic(window: WindowId) -> Self {
        Self {
            target: Some(window),
            zone: Zone::None,
            kind: NeighborKind::Mosaic,
        }
    }
}

/// Neighbour of `window` in `direction`.
///
/// `zone` is the window's zone (`Zone::None` when free-form), `tiles` the
/// tiles of its work area and `mosaic` the free-form windows with their
/// frames.  Neither list needs to exclude `window`.
pub fn find_neighbor(
    window: WindowId,
    frame: Rect,
    zone: Zone,
    direction: Direction,
    tiles: &ZoneMap,
    mosaic: &[(WindowId, Rect)],
) -> Option<Neighbor> {
    let tiles = tiles.without(window);
    let mosaic: Vec<(WindowId, Rect)> = mosaic
        .iter()
        .filter(|(w, _)| *w != window)
        .copied()
        .collect();

    if zone.is_tiled() {
        find_from_tile(frame, zone, direction, &tiles, &mosaic)
    } else {
        find_from_mosaic(frame, direction, &tiles, &mosaic)
    }
}

fn find_from_tile(
    frame: Rect,
    zone: Zone,
    direction: Direction,
    tiles: &ZoneMap,
    mosaic: &[(WindowId, Rect)],
) -> Option<Neighbor> {
    let side = zone.side()?;

    let Some(target_side) = direction.side() else {
        // Up/down only moves a quarter into its vertical pair.
        let slot = zone.slot()?;
        let toward = match direction {
            Direction::Up => Slot::Top,
            _ => Slot::Bottom,
        };
        if slot == toward {
            return None;
        }
        let pair = zone.vertical_pair()?;
        return Some(match tiles.occupant(pair) {
            Some(s) => Neighbor::tile(s.window, pair),
            None => Neighbor::vacant(pair, NeighborKind::EmptyTiling),
        });
    };

    if target_side == side {
        return None;
    }

    let same_level = zone.mirrored().and_then(|m| tiles.occupant(m));
    let any = tiles.side_occupants(target_side).into_iter().next();
    if let Some(s) = same_level.copied().or(any) {
        return Some(Neighbor::tile(s.window, s.zone));
    }
    if zone.is_quarter() {
        return Some(Neighbor::vacant(
            Zone::full(target_side),
            NeighborKind::EmptyTilingExpand,
        ));
    }
    nearest_in_direction(frame, direction, mosaic).map(Neighbor::mosaic)
}

fn find_from_mosaic(
    frame: Rect,
    direction: Direction,
    tiles: &ZoneMap,
    mosaic: &[(WindowId, Rect)],
) -> Option<Neighbor> {
    if let Some(window) = nearest_in_direction(frame, direction, mosaic) {
        return Some(Neighbor::mosaic(window));
    }

    let side = direction.side()?;
    let (_, cy) = frame.center();
    let nearest = tiles.side_occupants(side).into_iter().min_by(|a, b| {
        let da = (a.rect.center().1 - cy).abs();
        let db = (b.rect.center().1 - cy).abs();
        da.partial_cmp(&db).unwrap_or(Ordering::Equal)
    });
    Some(match nearest {
        Some(s) => Neighbor::tile(s.window, s.zone),
        None => Neighbor::vacant(Zone::full(side), NeighborKind::EmptyTiling),
    })
}

/// Closest candidate strictly on the `direction` side of `frame` whose
/// extent overlaps `frame` on the other axis.
fn nearest_in_direction(
    frame: Rect,
    direction: Direction,
    candidates: &[(WindowId, Rect)],
) -> Option<WindowId> {
    let (cx, cy) = frame.center();
    candidates
        .iter()
        .filter(|(_, r)| {
            let (rx, ry) = r.center();
            match direction {
                Direction::Right => r.overlaps_y(&frame) && rx > cx,
                Direction::Left => r.overlaps_y(&frame) && rx < cx,
                Direction::Down => r.overlaps_x(&frame) && ry > cy,
                Direction::Up => r.overlaps_x(&frame) && ry < cy,
            }
        })
        .min_by(|(_, a), (_, b)| {
            let dist = |r: &Rect| -> f64 {
                let (rx, ry) = r.center();
                if direction.is_horizontal() {
                    (rx - cx).abs()
                } else {
                    (ry - cy).abs()
                }
            };
            dist(a).partial_cmp(&dist(b)).unwrap_or(Ordering::Equal)
        })
        .map(|(w, _)| *w)
}

impl<W: WindowServer, L: LayoutEngine> EdgeTiler<W, L> {
    /// Swap `window` with its neighbour in `direction`.
    ///
    /// Returns `false` (and changes nothing) when there is no neighbour,
    /// the swap is not valid for the pair, or either participant swapped
    /// less than the cooldown ago.
    pub fn swap_window(&mut self, window: WindowId, direction: Direction) -> bool {
        match self.try_swap(window, direction) {
            Ok(neighbor) => {
                info!(
                    "swapped {} {} ({:?} {})",
                    window,
                    direction,
                    neighbor.kind,
                    neighbor.zone
                );
                true
            }
            Err(e) => {
                debug!("swap of {} {} refused: {}", window, direction, e);
                false
            }
        }
    }

    /// Neighbour of `window` in `direction`, as the swap would see it.
    pub fn neighbor_of(&self, window: WindowId, direction: Direction) -> Option<Neighbor> {
        let placement = self.placement_of(window).ok()?;
        let frame = self.server.frame_rect(window).ok()?;
        let tiles = self.zone_map(placement.location);
        let mosaic: Vec<(WindowId, Rect)> = self
            .mosaic_windows(placement.location)
            .ok()?
            .into_iter()
            .filter_map(|w| self.server.frame_rect(w).ok().map(|r| (w, r)))
            .collect();
        find_neighbor(
            window,
            frame,
            self.store.zone(window),
            direction,
            &tiles,
            &mosaic,
        )
    }

    fn try_swap(&mut self, window: WindowId, direction: Direction) -> Result<Neighbor, TileError> {
        let now = self.server.now();
        if self.is_cooling(window, now) {
            return Err(TileError::CoolingDown(window));
        }
        let neighbor = self
            .neighbor_of(window, direction)
            .ok_or(TileError::NoNeighbor(window, direction))?;
        if let Some(target) = neighbor.target {
            if self.is_cooling(target, now) {
                return Err(TileError::CoolingDown(target));
            }
        }

        self.execute_swap(window, neighbor)?;

        let until = now + self.config.timing.swap_cooldown();
        self.cooldowns.insert(window, until);
        if let Some(target) = neighbor.target {
            self.cooldowns.insert(target, until);
        }
        Ok(neighbor)
    }

    fn is_cooling(&self, window: WindowId, now: Instant) -> bool {
        self.cooldowns.get(&window).is_some_and(|until| *until > now)
    }

    fn execute_swap(&mut self, window: WindowId, neighbor: Neighbor) -> Result<(), TileError> {
        let zone = self.store.zone(window);
        let tiled = zone.is_tiled();
        match (tiled, neighbor.kind, neighbor.target) {
            (false, NeighborKind::Mosaic, Some(target)) => {
                let placement = self.placement_of(window)?;
                self.layout.set_temporary_swap(window, target);
                self.layout.apply_temporary_swap();
                self.layout.retile(
                    placement.location.workspace,
                    None,
                    placement.location.monitor,
                    false,
                );
                Ok(())
            }
            (true, NeighborKind::Mosaic, Some(target)) => {
                self.detach(window, Restore::PreTile)?;
                if self.apply_tile(target, zone) {
                    Ok(())
                } else {
                    self.apply_tile(window, zone);
                    Err(TileError::InvalidSwap(format!("{} cannot take {}", target, zone)))
                }
            }
            (false, NeighborKind::Tiling, Some(target)) => {
                let target_zone = self.store.zone(target);
                self.detach(target, Restore::PreTile)?;
                if self.apply_tile(window, target_zone) {
                    Ok(())
                } else {
                    self.apply_tile(target, target_zone);
                    Err(TileError::InvalidSwap(format!(
                        "{} cannot take {}",
                        window, target_zone
                    )))
                }
            }
            (true, NeighborKind::Tiling, Some(target)) => self.exchange_tiles(window, target),
            (_, NeighborKind::EmptyTiling, None) if !tiled || zone.is_quarter() => {
                self.commit_swap_zone(window, neighbor.zone)
            }
            (_, NeighborKind::EmptyTilingExpand, None) if !tiled || zone.is_quarter() => {
                self.commit_swap_zone(window, neighbor.zone)
            }
            _ => Err(TileError::InvalidSwap(format!(
                "{:?} from {} is not a valid swap",
                neighbor.kind, zone
            ))),
        }
    }

    fn commit_swap_zone(&mut self, window: WindowId, zone: Zone) -> Result<(), TileError> {
        if self.apply_tile(window, zone) {
            Ok(())
        } else {
            Err(TileError::InvalidSwap(format!("{} cannot take {}", window, zone)))
        }
    }

    /// Trade the zones of two tiled windows.
    ///
    /// Both frames are computed twice: the first pass sees the partner
    /// still at its old geometry, the second lets each frame adjust to the
    /// partner's new one.
    fn exchange_tiles(&mut self, a: WindowId, b: WindowId) -> Result<(), TileError> {
        let (za, zb) = (self.store.zone(a), self.store.zone(b));
        let pa = self.placement_of(a)?;
        let pb = self.placement_of(b)?;

        self.sever_links(a);
        self.sever_links(b);
        self.store.set_zone(a, zb);
        self.store.set_zone(b, za);

        for _ in 0..2 {
            for (window, zone, placement) in [(a, zb, pb), (b, za, pa)] {
                let others = self.zone_map(placement.location).without(window);
                let rect = compute_rect(zone, placement.work_area, &others)
                    .ok_or(TileError::NoGeometry(zone))?;
                self.place(window, rect, false)?;
            }
        }

        for (window, zone) in [(a, zb), (b, za)] {
            self.emit(TileEvent::StateChanged { window, zone });
        }
        Ok(())
    }
}
