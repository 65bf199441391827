use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use crate::permissions::types::PermissionSet;

const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    permissions: PermissionSet,
    cached_at: Instant,
}

/// Read-through cache from user id to resolved permission set, with timed
/// expiry. Staleness within the TTL window is accepted; mutating operations
/// call `invalidate` to shorten it. The role/permission tables stay the
/// source of truth.
#[derive(Debug)]
pub struct PermissionCache {
    entries: DashMap<Uuid, CacheEntry>,
    ttl: Duration,
}

impl Default for PermissionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Fresh entry, or None. Expired entries are dropped on read.
    pub fn get(&self, user_id: Uuid) -> Option<PermissionSet> {
        {
            // the read guard must be released before the removal below
            let entry = self.entries.get(&user_id)?;
            if entry.cached_at.elapsed() < self.ttl {
                return Some(entry.permissions.clone());
            }
        }
        self.entries.remove(&user_id);
        None
    }

    pub fn put(&self, user_id: Uuid, permissions: PermissionSet) {
        self.entries.insert(
            user_id,
            CacheEntry {
                permissions,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drop one user's entry; called after any role/permission mutation
    /// affecting that user.
    pub fn invalidate(&self, user_id: Uuid) {
        self.entries.remove(&user_id);
    }

    /// Drop everything; called after global role/permission changes.
    pub fn invalidate_all(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::types::PermissionKey;

    fn set_of(module: &str, action: &str) -> PermissionSet {
        [PermissionKey::new(module, action)].into_iter().collect()
    }

    #[test]
    fn fresh_entries_are_returned() {
        let cache = PermissionCache::new();
        let user = Uuid::new_v4();
        cache.put(user, set_of("sheets", "edit"));
        let set = cache.get(user).expect("entry should be fresh");
        assert!(set.contains(&PermissionKey::new("sheets", "edit")));
    }

    #[test]
    fn expired_entries_are_dropped_on_read() {
        let cache = PermissionCache::with_ttl(Duration::ZERO);
        let user = Uuid::new_v4();
        cache.put(user, set_of("sheets", "edit"));
        assert!(cache.get(user).is_none());
        // and the stale entry is gone, not just masked
        assert!(cache.entries.get(&user).is_none());
    }

    #[test]
    fn invalidate_takes_effect_immediately() {
        let cache = PermissionCache::new();
        let user = Uuid::new_v4();
        cache.put(user, set_of("sheets", "edit"));
        cache.invalidate(user);
        assert!(cache.get(user).is_none());
    }

    #[test]
    fn invalidate_all_clears_every_user() {
        let cache = PermissionCache::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        cache.put(a, set_of("sheets", "edit"));
        cache.put(b, set_of("users", "admin"));
        cache.invalidate_all();
        assert!(cache.get(a).is_none());
        assert!(cache.get(b).is_none());
    }

    #[test]
    fn stale_value_persists_until_expiry_or_invalidation() {
        // a permission "revoked" in storage keeps being served from cache
        let cache = PermissionCache::new();
        let user = Uuid::new_v4();
        cache.put(user, set_of("sheets", "admin"));
        // storage-side revoke happens here; without invalidation the cache
        // still answers with the old set
        let set = cache.get(user).expect("still cached");
        assert!(set.contains(&PermissionKey::new("sheets", "admin")));
        cache.invalidate(user);
        assert!(cache.get(user).is_none());
    }
}
