//! Fallback [`LayoutEngine`] for hosts without a mosaic layout.
//!
//! [`PassiveLayout`] never moves anything: retiles and staged swaps are
//! logged and dropped.  Its trial packing is a plain area check, which is
//! enough for the overflow arbiter to decide when free windows should
//! migrate to a fresh workspace.

use crate::command::WindowId;
use crate::geometry::{Rect, Size};
use crate::traits::{LayoutEngine, PackResult};
use log::debug;

#[derive(Debug, Default)]
pub struct PassiveLayout;

impl PassiveLayout {
    pub fn new() -> Self {
        Self
    }
}

impl LayoutEngine for PassiveLayout {
    /// Overflows when any window is larger than `available` in either
    /// dimension, or when their combined area exceeds it.  Windows that fit
    /// are proposed at their current size, stacked at the origin of
    /// `available`.
    fn test_pack(&self, sizes: &[Size], available: Rect) -> PackResult {
        let too_big = sizes
            .iter()
            .any(|s| s.width > available.width || s.height > available.height);
        let total: i64 = sizes
            .iter()
            .map(|s| i64::from(s.width) * i64::from(s.height))
            .sum();
        let capacity = i64::from(available.width) * i64::from(available.height);
        let overflow = too_big || total > capacity;
        let placements = if overflow {
            Vec::new()
        } else {
            sizes
                .iter()
                .map(|s| Rect::new(available.x, available.y, s.width, s.height))
                .collect()
        };
        PackResult {
            overflow,
            placements,
        }
    }

    fn retile(&self, workspace: i32, exclude: Option<WindowId>, monitor: i32, live_resize: bool) {
        debug!(
            "retile requested: workspace {} monitor {} exclude {:?} live {}",
            workspace, monitor, exclude, live_resize
        );
    }

    fn set_temporary_swap(&self, a: WindowId, b: WindowId) {
        debug!("temporary swap {} <-> {} ignored", a, b);
    }

    fn apply_temporary_swap(&self) {}

    fn clear_temporary_swap(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    const AREA: Rect = Rect::new(960, 0, 960, 1080);

    fn size(width: i32, height: i32) -> Size {
        Size { width, height }
    }

    #[test]
    fn small_windows_fit() {
        let r = PassiveLayout.test_pack(&[size(400, 300), size(500, 500)], AREA);
        assert!(!r.overflow);
        assert_eq!(
            r.placements,
            vec![Rect::new(960, 0, 400, 300), Rect::new(960, 0, 500, 500)]
        );
    }

    #[test]
    fn a_window_wider_than_the_area_overflows() {
        let r = PassiveLayout.test_pack(&[size(1200, 300)], AREA);
        assert!(r.overflow);
        assert!(r.placements.is_empty());
    }

    #[test]
    fn combined_area_overflows() {
        let sizes = vec![size(900, 1000); 2];
        assert!(PassiveLayout.test_pack(&sizes, AREA).overflow);
    }

    #[test]
    fn nothing_to_pack_fits() {
        assert!(!PassiveLayout.test_pack(&[], AREA).overflow);
    }
}
