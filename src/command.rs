//! Commands and identifiers used throughout edgetile.
//!
//! This module defines the vocabulary shared by every component:
//! [`Command`] describes every request the engine reacts to (user intents
//! as well as raw host notifications), [`WindowId`] is the opaque window
//! identity and [`Direction`] drives neighbour search.
//!
//! Host plugins forward raw strings; the daemon parses window addresses
//! (`"0x55d4c1"`, `"42"` or `42`) and direction/zone names leniently.

use crate::geometry::{Side, Zone};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque, stable identity of a managed window.
///
/// The engine only ever *references* windows; the host owns them.  On
/// Hyprland the id is the client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WindowId(pub u64);

impl WindowId {
    /// Parse a hex address (`"0x55d4c1"`) or a decimal id (`"42"`).
    pub fn parse(s: &str) -> Option<WindowId> {
        let s = s.trim();
        match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok().map(WindowId),
            None => s.parse().ok().map(WindowId),
        }
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl<'de> Deserialize<'de> for WindowId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = WindowId;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "window address string or non-negative integer")
            }
            fn visit_u64<E>(self, n: u64) -> Result<WindowId, E> {
                Ok(WindowId(n))
            }
            fn visit_str<E>(self, s: &str) -> Result<WindowId, E>
            where
                E: DeError,
            {
                WindowId::parse(s)
                    .ok_or_else(|| DeError::custom(format!("invalid window id: {:?}", s)))
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// Direction for neighbour search and swapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// The screen side a horizontal direction points at.
    pub fn side(self) -> Option<Side> {
        match self {
            Direction::Left => Some(Side::Left),
            Direction::Right => Some(Side::Right),
            Direction::Up | Direction::Down => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Parse a direction string (case-insensitive; accepts "right", "Up", " down ").
fn parse_direction(s: &str) -> Option<Direction> {
    let normalized: String = s
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect();
    match normalized.as_str() {
        "left" => Some(Direction::Left),
        "right" => Some(Direction::Right),
        "up" => Some(Direction::Up),
        "down" => Some(Direction::Down),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_direction(&s).ok_or_else(|| DeError::custom(format!("invalid direction: {:?}", s)))
    }
}

/// Every request the tiling engine can handle.
///
/// Commands are produced by [`CommandSource`](crate::traits::CommandSource)
/// implementations and consumed by [`EdgeTiler`](crate::engine::EdgeTiler).
/// The first group are user intents acting on the focused window; the rest
/// are raw window-server notifications forwarded by the host plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Tile the focused window to `zone` (`none` un-tiles it).
    Tile(Zone),

    /// Tile an explicit window.
    TileWindow { window: WindowId, zone: Zone },

    /// Un-tile the focused window, restoring its pre-tile geometry.
    Untile,

    /// Swap the focused window with its neighbour in `direction`.
    Swap(Direction),

    //  Host notifications

    /// A pointer grab (move gesture) started on `window`.
    GrabBegin { window: WindowId },

    /// The pointer grab on `window` ended.
    GrabEnd { window: WindowId },

    /// An interactive resize gesture started on `window`.
    ResizeBegin { window: WindowId },

    /// The frame size of `window` changed (live, possibly mid-gesture).
    SizeChanged { window: WindowId },

    /// The interactive resize gesture on `window` ended.
    ResizeEnd { window: WindowId },

    /// The host confirms that the last geometry request for `window` has
    /// been applied.
    GeometryApplied { window: WindowId },

    /// A managed window appeared.
    WindowAdded { window: WindowId },

    /// A managed window is going away; its state is reclaimed.
    WindowDestroyed { window: WindowId },

    /// Run deferred work that has come due.
    Tick,
}
