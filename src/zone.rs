//! Zone detection and zone geometry.
//!
//! Both entry points are pure functions of their inputs:
//!
//! * [`detect_zone`] maps a pointer position to the [`Zone`] a dragged
//!   window would snap to.
//! * [`compute_rect`] maps a zone to the exact frame a window should get,
//!   taking the tiles already on screen into account so neighbouring tiles
//!   butt against each other with no gap or overlap.
//!
//! The tiles already on screen are described by a [`ZoneMap`] snapshot
//! built by the engine from the tile store and the host's current frames.

use crate::command::WindowId;
use crate::config::TilingConfig;
use crate::geometry::{Point, Rect, Side, Slot, Zone};

/// One tiled window as seen by the geometry code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSlot {
    pub window: WindowId,
    pub zone: Zone,
    pub rect: Rect,
}

/// Snapshot of the tiles on one workspace/monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneMap {
    slots: Vec<TileSlot>,
}

impl ZoneMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slots(slots: impl IntoIterator<Item = TileSlot>) -> Self {
        let mut map = Self::new();
        for slot in slots {
            map.insert(slot);
        }
        map
    }

    /// Add `slot`, replacing any earlier entry for the same window.
    pub fn insert(&mut self, slot: TileSlot) {
        self.slots.retain(|s| s.window != slot.window);
        self.slots.push(slot);
    }

    /// The tile occupying `zone`, if any.
    pub fn occupant(&self, zone: Zone) -> Option<&TileSlot> {
        if !zone.is_tiled() {
            return None;
        }
        self.slots.iter().find(|s| s.zone == zone)
    }

    pub fn slot_of(&self, window: WindowId) -> Option<&TileSlot> {
        self.slots.iter().find(|s| s.window == window)
    }

    pub fn zone_of(&self, window: WindowId) -> Zone {
        self.slot_of(window).map(|s| s.zone).unwrap_or(Zone::None)
    }

    /// Tiles on `side`, full tile first, then top, then bottom quarter.
    pub fn side_occupants(&self, side: Side) -> Vec<TileSlot> {
        Zone::side_zones(side)
            .iter()
            .filter_map(|z| self.occupant(*z).copied())
            .collect()
    }

    pub fn side_occupied(&self, side: Side) -> bool {
        Zone::side_zones(side)
            .iter()
            .any(|z| self.occupant(*z).is_some())
    }

    /// Width of the tiles on `side`, if the side holds any.
    pub fn side_width(&self, side: Side) -> Option<i32> {
        self.side_occupants(side).first().map(|s| s.rect.width)
    }

    /// Copy of the map with `window` removed.
    pub fn without(&self, window: WindowId) -> ZoneMap {
        ZoneMap {
            slots: self
                .slots
                .iter()
                .filter(|s| s.window != window)
                .copied()
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileSlot> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Zone a window dragged to `cursor` would snap to.
///
/// The top edge wins over everything and yields [`Zone::Fullscreen`].  At
/// a side edge an empty side yields the full zone; an occupied side is
/// split into thirds: top third → top quarter, bottom third → bottom
/// quarter, middle → full.
pub fn detect_zone(
    cursor: Point,
    work_area: Rect,
    occupancy: &ZoneMap,
    config: &TilingConfig,
) -> Zone {
    if cursor.y < work_area.y + config.top_threshold {
        return Zone::Fullscreen;
    }

    let side = if cursor.x < work_area.x + config.edge_threshold {
        Side::Left
    } else if cursor.x >= work_area.right() - config.edge_threshold {
        Side::Right
    } else {
        return Zone::None;
    };

    if !occupancy.side_occupied(side) {
        return Zone::full(side);
    }

    let third = work_area.height / 3;
    let offset = cursor.y - work_area.y;
    if offset < third {
        Zone::quarter(side, Slot::Top)
    } else if offset >= work_area.height - third {
        Zone::quarter(side, Slot::Bottom)
    } else {
        Zone::full(side)
    }
}

/// Frame a window tiled to `zone` should get.
///
/// `adjacency` must not contain the window being placed.  Returns `None`
/// for [`Zone::None`]; callers treat that as a no-op.
pub fn compute_rect(zone: Zone, work_area: Rect, adjacency: &ZoneMap) -> Option<Rect> {
    match zone {
        Zone::None => None,
        Zone::Fullscreen => Some(work_area),
        Zone::LeftFull | Zone::RightFull => {
            let side = zone.side()?;
            let width = leftover_width(adjacency, side, work_area)
                .unwrap_or(work_area.width / 2);
            Some(Rect::new(
                side.anchor_x(width, work_area),
                work_area.y,
                width,
                work_area.height,
            ))
        }
        Zone::TopLeft | Zone::TopRight | Zone::BottomLeft | Zone::BottomRight => {
            let side = zone.side()?;
            let slot = zone.slot()?;
            let width = adjacency
                .side_width(side)
                .or_else(|| leftover_width(adjacency, side, work_area))
                .unwrap_or(work_area.width / 2);
            let height = zone
                .vertical_pair()
                .and_then(|pair| adjacency.occupant(pair))
                .map(|s| work_area.height - s.rect.height)
                .filter(|h| *h > 0)
                .unwrap_or(work_area.height / 2);
            Some(Rect::new(
                side.anchor_x(width, work_area),
                slot.anchor_y(height, work_area),
                width,
                height,
            ))
        }
    }
}

/// Width left over by the tiles on the side opposite to `side`.
fn leftover_width(adjacency: &ZoneMap, side: Side, work_area: Rect) -> Option<i32> {
    adjacency
        .side_width(side.opposite())
        .map(|w| work_area.width - w)
        .filter(|w| *w > 0)
}
