//! Auto-tile dependencies.
//!
//! When the overflow arbiter snaps the last free-form window opposite a
//! freshly tiled one, the two are linked: the auto-tiled window is the
//! *dependent*, the manually tiled one its *master*.  Un-tiling the master
//! un-tiles its dependents first; retiling either window by hand severs the
//! link.

use crate::command::WindowId;
use crate::engine::EdgeTiler;
use crate::traits::{LayoutEngine, WindowServer};
use log::debug;
use std::collections::HashMap;

/// Directed `dependent → master` links.  A dependent has at most one
/// master; a master may have many dependents.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    master_of: HashMap<WindowId, WindowId>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `dependent` as auto-tiled against `master`, replacing any
    /// earlier master.  Self-links and links that would close a cycle are
    /// refused.
    pub fn link(&mut self, dependent: WindowId, master: WindowId) -> bool {
        if dependent == master || self.master_of.get(&master) == Some(&dependent) {
            return false;
        }
        self.master_of.insert(dependent, master);
        true
    }

    pub fn master_of(&self, dependent: WindowId) -> Option<WindowId> {
        self.master_of.get(&dependent).copied()
    }

    /// Dependents of `master`, in id order.
    pub fn dependents_of(&self, master: WindowId) -> Vec<WindowId> {
        let mut deps: Vec<WindowId> = self
            .master_of
            .iter()
            .filter(|(_, m)| **m == master)
            .map(|(d, _)| *d)
            .collect();
        deps.sort();
        deps
    }

    /// Drop the link of `dependent`, returning its former master.
    pub fn unlink_dependent(&mut self, dependent: WindowId) -> Option<WindowId> {
        self.master_of.remove(&dependent)
    }

    /// Drop every link pointing at `master`, returning the dependents.
    pub fn remove_master(&mut self, master: WindowId) -> Vec<WindowId> {
        let deps = self.dependents_of(master);
        for dep in &deps {
            self.master_of.remove(dep);
        }
        deps
    }

    /// Drop every link `window` takes part in, on either end.
    pub fn forget(&mut self, window: WindowId) {
        self.master_of
            .retain(|dependent, master| *dependent != window && *master != window);
    }

    pub fn clear(&mut self) {
        self.master_of.clear();
    }

    pub fn len(&self) -> usize {
        self.master_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.master_of.is_empty()
    }
}

/// Links dropped by a manual retile.
#[derive(Debug, Default)]
pub(crate) struct SeveredLinks {
    master: Option<WindowId>,
    dependents: Vec<WindowId>,
}

impl<W: WindowServer, L: LayoutEngine> EdgeTiler<W, L> {
    /// A window retiled by hand stops being anybody's dependent, and its
    /// own dependents stop following it.  Dependents keep their tiles.
    pub(crate) fn sever_links(&mut self, window: WindowId) -> SeveredLinks {
        let master = self.links.unlink_dependent(window);
        if let Some(master) = master {
            debug!("{} no longer follows {}", window, master);
        }
        let dependents = self.links.remove_master(window);
        for dep in &dependents {
            debug!("{} no longer follows {}", dep, window);
        }
        SeveredLinks { master, dependents }
    }

    /// Undo [`sever_links`](Self::sever_links) after a rejected retile.
    /// Links to windows that lost their tile meanwhile stay dropped.
    pub(crate) fn restore_links(&mut self, window: WindowId, severed: SeveredLinks) {
        if let Some(master) = severed.master {
            if self.store.zone(master).is_tiled() {
                self.links.link(window, master);
            }
        }
        for dep in severed.dependents {
            if self.store.zone(dep).is_tiled() {
                self.links.link(dep, window);
            }
        }
    }
}
