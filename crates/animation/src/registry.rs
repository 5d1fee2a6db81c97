use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::domain::BarId;

/// Identities of the targets that currently have an animation running.
///
/// Cloning yields another handle onto the same set.
#[derive(Debug, Clone, Default)]
pub struct AnimationRegistry {
    active: Arc<Mutex<ActiveSet>>,
}

/// Each claim carries a token so a stale guard never releases a newer claim
/// on the same identity.
#[derive(Debug, Default)]
struct ActiveSet {
    next_token: u64,
    claims: HashMap<BarId, u64>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn active(&self) -> MutexGuard<'_, ActiveSet> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims `identity`, or returns `None` without touching the set if it is
    /// already claimed. The claim is released when the guard drops.
    pub fn try_acquire(&self, identity: BarId) -> Option<AnimationGuard> {
        let token = {
            let mut active = self.active();
            if active.claims.contains_key(&identity) {
                return None;
            }
            let token = active.next_token;
            active.next_token += 1;
            active.claims.insert(identity, token);
            token
        };
        Some(AnimationGuard {
            registry: self.clone(),
            identity,
            token,
        })
    }

    /// Removing an identity that is not present is a no-op.
    pub fn release(&self, identity: BarId) {
        self.active().claims.remove(&identity);
    }

    fn release_claim(&self, identity: BarId, token: u64) {
        let mut active = self.active();
        if active.claims.get(&identity) == Some(&token) {
            active.claims.remove(&identity);
        }
    }

    pub fn is_animating(&self, identity: BarId) -> bool {
        self.active().claims.contains_key(&identity)
    }

    pub fn len(&self) -> usize {
        self.active().claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active().claims.is_empty()
    }
}

/// Exclusive claim on one identity in an [`AnimationRegistry`].
#[derive(Debug)]
#[must_use = "the identity is released as soon as the guard is dropped"]
pub struct AnimationGuard {
    registry: AnimationRegistry,
    identity: BarId,
    token: u64,
}

impl AnimationGuard {
    pub fn identity(&self) -> BarId {
        self.identity
    }
}

impl Drop for AnimationGuard {
    fn drop(&mut self) {
        self.registry.release_claim(self.identity, self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let registry = AnimationRegistry::new();
        let guard = registry.try_acquire(BarId(1)).expect("first acquire");
        assert_eq!(guard.identity(), BarId(1));
        assert!(registry.try_acquire(BarId(1)).is_none());
        assert!(registry.is_animating(BarId(1)));

        drop(guard);
        assert!(!registry.is_animating(BarId(1)));
        assert!(registry.try_acquire(BarId(1)).is_some());
    }

    #[test]
    fn identities_are_independent() {
        let registry = AnimationRegistry::new();
        let _first = registry.try_acquire(BarId(1)).expect("first");
        let _second = registry.try_acquire(BarId(2)).expect("second");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn release_is_idempotent() {
        let registry = AnimationRegistry::new();
        registry.release(BarId(5));
        let guard = registry.try_acquire(BarId(5)).expect("acquire");
        registry.release(BarId(5));
        registry.release(BarId(5));
        drop(guard);
        assert!(registry.is_empty());
    }

    #[test]
    fn stale_guard_leaves_newer_claim_alone() {
        let registry = AnimationRegistry::new();
        let stale = registry.try_acquire(BarId(8)).expect("first claim");
        registry.release(BarId(8));
        let _current = registry.try_acquire(BarId(8)).expect("second claim");

        drop(stale);
        assert!(registry.is_animating(BarId(8)));
    }

    #[test]
    fn clones_share_state() {
        let registry = AnimationRegistry::new();
        let other = registry.clone();
        let _guard = registry.try_acquire(BarId(3)).expect("acquire");
        assert!(other.try_acquire(BarId(3)).is_none());
    }

    #[test]
    fn separate_registries_do_not_interfere() {
        let first = AnimationRegistry::new();
        let second = AnimationRegistry::new();
        let _guard = first.try_acquire(BarId(3)).expect("acquire");
        assert!(second.try_acquire(BarId(3)).is_some());
    }
}
