//! Per-window tile records.
//!
//! [`TileStateStore`] is the single canonical place where the engine keeps
//! what it knows about a tiled window: the geometry to restore on un-tile
//! and the zone the window currently occupies.  Records are keyed by
//! [`WindowId`]; nothing is attached to host objects.

use crate::command::WindowId;
use crate::geometry::{Rect, Zone};
use std::collections::HashMap;

/// What the engine remembers about one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRecord {
    /// Frame the window had before its first tile application.
    pub pre_tile_rect: Rect,
    /// Zone the window occupies, `Zone::None` while not (yet) tiled.
    pub zone: Zone,
}

/// Keyed store of [`TileRecord`]s, at most one per window.
///
/// No operation panics; absent records yield `None`/`false`.
#[derive(Debug, Default)]
pub struct TileStateStore {
    records: HashMap<WindowId, TileRecord>,
}

impl TileStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `current` as the pre-tile frame of `window`.
    ///
    /// Idempotent: if a record already exists it is left untouched.
    /// Returns `true` when a new record was created.
    pub fn save(&mut self, window: WindowId, current: Rect) -> bool {
        if self.records.contains_key(&window) {
            return false;
        }
        self.records.insert(
            window,
            TileRecord {
                pre_tile_rect: current,
                zone: Zone::None,
            },
        );
        true
    }

    pub fn get(&self, window: WindowId) -> Option<&TileRecord> {
        self.records.get(&window)
    }

    pub fn has(&self, window: WindowId) -> bool {
        self.records.contains_key(&window)
    }

    /// Zone of `window`, `Zone::None` when it has no record.
    pub fn zone(&self, window: WindowId) -> Zone {
        self.records
            .get(&window)
            .map(|r| r.zone)
            .unwrap_or(Zone::None)
    }

    /// Update the zone of an existing record.  Returns `false` if the
    /// window has no record.
    pub fn set_zone(&mut self, window: WindowId, zone: Zone) -> bool {
        match self.records.get_mut(&window) {
            Some(record) => {
                record.zone = zone;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self, window: WindowId) -> Option<TileRecord> {
        self.records.remove(&window)
    }

    /// Drop every record.  Used on teardown.
    pub fn clear_all(&mut self) {
        self.records.clear();
    }

    /// Windows currently holding a zone, in id order.
    pub fn tiled(&self) -> Vec<(WindowId, Zone)> {
        let mut tiled: Vec<(WindowId, Zone)> = self
            .records
            .iter()
            .filter(|(_, r)| r.zone.is_tiled())
            .map(|(w, r)| (*w, r.zone))
            .collect();
        tiled.sort_by_key(|(w, _)| *w);
        tiled
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: WindowId = WindowId(1);

    #[test]
    fn second_save_keeps_first_rect() {
        let mut store = TileStateStore::new();
        assert!(store.save(W, Rect::new(10, 10, 640, 480)));
        assert!(!store.save(W, Rect::new(0, 0, 960, 1080)));
        assert_eq!(
            store.get(W).map(|r| r.pre_tile_rect),
            Some(Rect::new(10, 10, 640, 480))
        );
    }

    #[test]
    fn save_after_clear_captures_again() {
        let mut store = TileStateStore::new();
        store.save(W, Rect::new(10, 10, 640, 480));
        store.clear(W);
        store.save(W, Rect::new(20, 20, 300, 300));
        assert_eq!(
            store.get(W).map(|r| r.pre_tile_rect),
            Some(Rect::new(20, 20, 300, 300))
        );
    }

    #[test]
    fn absent_records_are_harmless() {
        let mut store = TileStateStore::new();
        assert!(store.get(W).is_none());
        assert!(!store.has(W));
        assert_eq!(store.zone(W), Zone::None);
        assert!(!store.set_zone(W, Zone::LeftFull));
        assert!(store.clear(W).is_none());
    }

    #[test]
    fn tiled_lists_only_windows_with_a_zone() {
        let mut store = TileStateStore::new();
        store.save(WindowId(2), Rect::default());
        store.save(WindowId(1), Rect::default());
        store.save(WindowId(3), Rect::default());
        store.set_zone(WindowId(2), Zone::RightFull);
        store.set_zone(WindowId(1), Zone::LeftFull);
        assert_eq!(
            store.tiled(),
            vec![(WindowId(1), Zone::LeftFull), (WindowId(2), Zone::RightFull)]
        );
        assert_eq!(store.len(), 3);
        store.clear_all();
        assert!(store.is_empty());
    }
}
