//! Re-entrancy leases scoped to a pair of windows.
//!
//! When the resize resolver writes a new frame to a companion tile, the
//! host echoes that write back as another size-changed signal.  A lease on
//! the `(resized, companion)` pair suppresses those echoes until its
//! deadline passes.  The window that took the lease keeps reacting to its
//! own signals, and leases of unrelated pairs never affect each other.

use crate::command::WindowId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Unordered pair of windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey(WindowId, WindowId);

impl PairKey {
    pub fn new(a: WindowId, b: WindowId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.0 == window || self.1 == window
    }
}

#[derive(Debug, Clone, Copy)]
struct Lease {
    holder: WindowId,
    deadline: Instant,
}

#[derive(Debug, Default)]
pub struct LeaseTable {
    leases: HashMap<PairKey, Lease>,
}

impl LeaseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `holder` leases its pair with `other` until `now + ttl`, replacing
    /// an existing lease on the same pair.
    pub fn acquire(&mut self, holder: WindowId, other: WindowId, now: Instant, ttl: Duration) {
        self.leases.insert(
            PairKey::new(holder, other),
            Lease {
                holder,
                deadline: now + ttl,
            },
        );
    }

    /// Drop every lease involving `window`.
    pub fn release_window(&mut self, window: WindowId) {
        self.leases.retain(|pair, _| !pair.contains(window));
    }

    /// Whether a live lease taken by another window covers `window`.
    pub fn guards(&self, window: WindowId, now: Instant) -> bool {
        self.leases.iter().any(|(pair, lease)| {
            pair.contains(window) && lease.holder != window && lease.deadline > now
        })
    }

    /// Forget leases whose deadline has passed.
    pub fn expire(&mut self, now: Instant) {
        self.leases.retain(|_, lease| lease.deadline > now);
    }

    pub fn clear(&mut self) {
        self.leases.clear();
    }

    pub fn len(&self) -> usize {
        self.leases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: WindowId = WindowId(1);
    const B: WindowId = WindowId(2);
    const C: WindowId = WindowId(3);
    const D: WindowId = WindowId(4);

    #[test]
    fn pair_key_is_unordered() {
        assert_eq!(PairKey::new(A, B), PairKey::new(B, A));
        assert!(PairKey::new(B, A).contains(A));
        assert!(!PairKey::new(B, A).contains(C));
    }

    #[test]
    fn lease_expires_at_deadline() {
        let t0 = Instant::now();
        let mut leases = LeaseTable::new();
        leases.acquire(A, B, t0, Duration::from_millis(50));
        assert!(leases.guards(B, t0 + Duration::from_millis(49)));
        assert!(!leases.guards(B, t0 + Duration::from_millis(50)));
        leases.expire(t0 + Duration::from_millis(60));
        assert!(leases.is_empty());
    }

    #[test]
    fn independent_pairs_do_not_interfere() {
        let t0 = Instant::now();
        let mut leases = LeaseTable::new();
        leases.acquire(A, B, t0, Duration::from_millis(50));
        assert!(leases.guards(B, t0));
        assert!(!leases.guards(C, t0));
        assert!(!leases.guards(D, t0));

        leases.acquire(C, D, t0, Duration::from_millis(50));
        leases.release_window(A);
        assert!(!leases.guards(B, t0));
        assert!(leases.guards(D, t0));
    }

    #[test]
    fn holder_is_not_guarded_by_its_own_lease() {
        let t0 = Instant::now();
        let mut leases = LeaseTable::new();
        leases.acquire(A, B, t0, Duration::from_millis(50));
        assert!(!leases.guards(A, t0));
        assert!(leases.guards(B, t0));

        // The companion taking the pair over flips the direction.
        leases.acquire(B, A, t0, Duration::from_millis(50));
        assert!(leases.guards(A, t0));
        assert!(!leases.guards(B, t0));
        assert_eq!(leases.len(), 1);
    }

    #[test]
    fn release_window_drops_all_its_pairs() {
        let t0 = Instant::now();
        let mut leases = LeaseTable::new();
        leases.acquire(A, B, t0, Duration::from_secs(1));
        leases.acquire(A, C, t0, Duration::from_secs(1));
        leases.acquire(C, D, t0, Duration::from_secs(1));
        leases.release_window(A);
        assert_eq!(leases.len(), 1);
        assert!(leases.guards(D, t0));
    }
}
