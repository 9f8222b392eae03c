//! Geometry vocabulary: rectangles and the zones a window can snap to.
//!
//! A [`Zone`] is a named region of a monitor's work area.  The two screen
//! sides each hold either one *full* tile (the whole height) or up to two
//! *quarter* tiles stacked vertically; [`Zone::Fullscreen`] covers the whole
//! work area.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A point in global compositor coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Width and height of a window, as handed to the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

/// An immutable axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Whether the horizontal extents of both rectangles intersect.
    pub fn overlaps_x(&self, other: &Rect) -> bool {
        self.x < other.right() && other.x < self.right()
    }

    /// Whether the vertical extents of both rectangles intersect.
    pub fn overlaps_y(&self, other: &Rect) -> bool {
        self.y < other.bottom() && other.y < self.bottom()
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// One of the two screen sides that hold edge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// X coordinate of a tile of `width` anchored to this side of `area`.
    pub fn anchor_x(self, width: i32, area: Rect) -> i32 {
        match self {
            Side::Left => area.x,
            Side::Right => area.right() - width,
        }
    }
}

/// Vertical slot of a quarter tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Top,
    Bottom,
}

impl Slot {
    pub fn opposite(self) -> Slot {
        match self {
            Slot::Top => Slot::Bottom,
            Slot::Bottom => Slot::Top,
        }
    }

    /// Y coordinate of a tile of `height` anchored to this slot of `area`.
    pub fn anchor_y(self, height: i32, area: Rect) -> i32 {
        match self {
            Slot::Top => area.y,
            Slot::Bottom => area.bottom() - height,
        }
    }
}

/// Named target region of a work area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Zone {
    #[default]
    None,
    LeftFull,
    RightFull,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Fullscreen,
}

impl Zone {
    pub fn full(side: Side) -> Zone {
        match side {
            Side::Left => Zone::LeftFull,
            Side::Right => Zone::RightFull,
        }
    }

    pub fn quarter(side: Side, slot: Slot) -> Zone {
        match (side, slot) {
            (Side::Left, Slot::Top) => Zone::TopLeft,
            (Side::Left, Slot::Bottom) => Zone::BottomLeft,
            (Side::Right, Slot::Top) => Zone::TopRight,
            (Side::Right, Slot::Bottom) => Zone::BottomRight,
        }
    }

    /// The zones of one side in lookup order: full first, then top, then
    /// bottom.
    pub fn side_zones(side: Side) -> [Zone; 3] {
        [
            Zone::full(side),
            Zone::quarter(side, Slot::Top),
            Zone::quarter(side, Slot::Bottom),
        ]
    }

    pub fn side(self) -> Option<Side> {
        match self {
            Zone::LeftFull | Zone::TopLeft | Zone::BottomLeft => Some(Side::Left),
            Zone::RightFull | Zone::TopRight | Zone::BottomRight => Some(Side::Right),
            Zone::None | Zone::Fullscreen => None,
        }
    }

    pub fn slot(self) -> Option<Slot> {
        match self {
            Zone::TopLeft | Zone::TopRight => Some(Slot::Top),
            Zone::BottomLeft | Zone::BottomRight => Some(Slot::Bottom),
            _ => None,
        }
    }

    pub fn is_tiled(self) -> bool {
        self != Zone::None
    }

    pub fn is_full(self) -> bool {
        matches!(self, Zone::LeftFull | Zone::RightFull)
    }

    pub fn is_quarter(self) -> bool {
        self.slot().is_some()
    }

    /// The complementary quarter on the same side (`TopLeft` ↔ `BottomLeft`).
    pub fn vertical_pair(self) -> Option<Zone> {
        Some(Zone::quarter(self.side()?, self.slot()?.opposite()))
    }

    /// The zone at the same vertical level on the other side.
    pub fn mirrored(self) -> Option<Zone> {
        let side = self.side()?.opposite();
        Some(match self.slot() {
            Some(slot) => Zone::quarter(side, slot),
            None => Zone::full(side),
        })
    }

    /// Parse a zone name (case-insensitive; `-`, `_` and whitespace are
    /// ignored, so `"left-full"`, `"LeftFull"` and `"left_full"` all work).
    pub fn parse(s: &str) -> Option<Zone> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(|c| c.to_lowercase())
            .collect();
        match normalized.as_str() {
            "none" => Some(Zone::None),
            "leftfull" | "left" => Some(Zone::LeftFull),
            "rightfull" | "right" => Some(Zone::RightFull),
            "topleft" => Some(Zone::TopLeft),
            "topright" => Some(Zone::TopRight),
            "bottomleft" => Some(Zone::BottomLeft),
            "bottomright" => Some(Zone::BottomRight),
            "fullscreen" | "maximize" | "maximized" => Some(Zone::Fullscreen),
            _ => None,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Zone::None => "none",
            Zone::LeftFull => "left-full",
            Zone::RightFull => "right-full",
            Zone::TopLeft => "top-left",
            Zone::TopRight => "top-right",
            Zone::BottomLeft => "bottom-left",
            Zone::BottomRight => "bottom-right",
            Zone::Fullscreen => "fullscreen",
        };
        f.write_str(name)
    }
}

impl<'de> Deserialize<'de> for Zone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Zone::parse(&s).ok_or_else(|| DeError::custom(format!("invalid zone: {:?}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges_and_center() {
        let r = Rect::new(10, 20, 100, 50);
        assert_eq!(r.right(), 110);
        assert_eq!(r.bottom(), 70);
        assert_eq!(r.center(), (60.0, 45.0));
    }

    #[test]
    fn touching_rects_do_not_overlap() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(100, 0, 100, 100);
        assert!(!a.overlaps_x(&b));
        assert!(a.overlaps_y(&b));
    }

    #[test]
    fn zone_relations() {
        assert_eq!(Zone::TopLeft.vertical_pair(), Some(Zone::BottomLeft));
        assert_eq!(Zone::BottomRight.vertical_pair(), Some(Zone::TopRight));
        assert_eq!(Zone::LeftFull.vertical_pair(), None);
        assert_eq!(Zone::LeftFull.mirrored(), Some(Zone::RightFull));
        assert_eq!(Zone::BottomLeft.mirrored(), Some(Zone::BottomRight));
        assert_eq!(Zone::Fullscreen.mirrored(), None);
        assert!(Zone::TopRight.is_quarter());
        assert!(!Zone::RightFull.is_quarter());
        assert!(!Zone::None.is_tiled());
    }

    #[test]
    fn anchors() {
        let area = Rect::new(0, 30, 1920, 1050);
        assert_eq!(Side::Right.anchor_x(800, area), 1120);
        assert_eq!(Slot::Bottom.anchor_y(500, area), 580);
    }

    #[test]
    fn zone_display_round_trips_through_parse() {
        for zone in [
            Zone::None,
            Zone::LeftFull,
            Zone::RightFull,
            Zone::TopLeft,
            Zone::TopRight,
            Zone::BottomLeft,
            Zone::BottomRight,
            Zone::Fullscreen,
        ] {
            assert_eq!(Zone::parse(&zone.to_string()), Some(zone));
        }
    }

    #[test]
    fn zone_deserialize_is_lenient() {
        let z: Zone = serde_json::from_str(r#""Top_Left""#).unwrap();
        assert_eq!(z, Zone::TopLeft);
        assert!(serde_json::from_str::<Zone>(r#""middle""#).is_err());
    }
}
