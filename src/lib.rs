//! **edgetile**: zone-based edge tiling for floating window managers.
//!
//! A window dragged (or commanded) to a screen edge snaps into a *zone*:
//! the full height of the left or right side, one of the four quarters,
//! or the whole work area.  Windows not in a zone are left to an external
//! layout engine ("mosaic") that arranges them in whatever space the
//! tiles leave.
//!
//! # Architecture
//!
//! [`engine::EdgeTiler`] owns all tiling state and is driven by
//! [`command::Command`]s.  It is decoupled from the outside world by the
//! traits in [`traits`]:
//!
//! * [`traits::WindowServer`]: geometry reads and writes, workspaces and
//!   the pointer, so the engine is not coupled to any specific compositor.
//! * [`traits::LayoutEngine`]: the mosaic layout the edge tiles share the
//!   screen with.
//! * [`traits::CommandSource`]: the transport that delivers user intent
//!   and host notifications (a Unix socket, a compositor event stream, …).
//!
//! The engine's behaviour is split across component modules:
//! [`zone`] (detection and geometry), [`conversion`] (full ↔ quarter),
//! [`resize`] (keeping neighbours glued during a resize), [`overflow`]
//! (what happens to the mosaic), [`swap`] (directional exchange) and
//! [`dependency`] (auto-tile links).
//!
//! Concrete implementations live in [`hyprland`] (Hyprland IPC),
//! [`ipc`] (Unix-socket command listener) and [`layout`] (a passive
//! fallback layout engine).

pub mod command;
pub mod config;
pub mod conversion;
pub mod dependency;
pub mod engine;
pub mod geometry;
pub mod hyprland;
pub mod ipc;
pub mod layout;
pub mod lease;
pub mod overflow;
pub mod resize;
pub mod scheduler;
pub mod state;
pub mod swap;
pub mod traits;
pub mod zone;

#[cfg(test)]
mod testing;
