//! Hooks keyed by a discriminant.

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::hook::Hook;

static NEXT_HOOK_MAP_ID: AtomicUsize = AtomicUsize::new(0);

/// Process-unique identifier of a hook map instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookMapId(usize);

/// A family of hooks, one per discriminant value.
///
/// Hooks are created on first access and live as long as the map. Every
/// hook in the map shares the map's name.
pub struct HookMap<A, R> {
    id: HookMapId,
    name: String,
    hooks: RwLock<HashMap<String, Arc<Hook<A, R>>>>,
}

impl<A, R> HookMap<A, R>
where
    A: Clone + Send + 'static,
    R: Send + 'static,
{
    /// Creates an empty hook map.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: HookMapId(NEXT_HOOK_MAP_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            hooks: RwLock::new(HashMap::new()),
        }
    }

    /// Returns this map's unique ID.
    #[must_use]
    pub fn id(&self) -> HookMapId {
        self.id
    }

    /// Returns the map's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the hook for `key`, creating it if needed.
    pub fn for_key(&self, key: impl AsRef<str>) -> Arc<Hook<A, R>> {
        let key = key.as_ref();
        if let Some(hook) = self.hooks.read().get(key) {
            return Arc::clone(hook);
        }

        let mut hooks = self.hooks.write();
        let hook = hooks
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(Hook::new(self.name.clone())));
        Arc::clone(hook)
    }

    /// Returns the hook for `key` without creating it.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<Hook<A, R>>> {
        self.hooks.read().get(key).cloned()
    }

    /// Returns the keys that have a hook.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.hooks.read().keys().cloned().collect()
    }
}

impl<A, R> fmt::Debug for HookMap<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookMap")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("keys", &self.hooks.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_key_returns_the_same_hook() {
        let map: HookMap<u32, ()> = HookMap::new("parser");
        let first = map.for_key("json");
        let second = map.for_key("json");

        assert_eq!(first.id(), second.id());
        assert_eq!(first.name(), "parser");
    }

    #[test]
    fn keys_get_distinct_hooks() {
        let map: HookMap<u32, ()> = HookMap::new("parser");
        let json = map.for_key("json");
        let esm = map.for_key("javascript/esm");

        assert_ne!(json.id(), esm.id());
        let mut keys = map.keys();
        keys.sort();
        assert_eq!(keys, vec!["javascript/esm", "json"]);
    }

    #[test]
    fn get_does_not_create() {
        let map: HookMap<u32, ()> = HookMap::new("parser");
        assert!(map.get("json").is_none());
        map.for_key("json");
        assert!(map.get("json").is_some());
    }
}
