//! Hyprland-specific implementations.
//!
//! This module provides concrete backends for the
//! [`WindowServer`](crate::traits::WindowServer) and
//! [`CommandSource`](crate::traits::CommandSource) traits, powered by
//! Hyprland's IPC sockets.
//!
//! Nothing outside this module should reference Hyprland directly.

pub mod events;
pub mod wm;
