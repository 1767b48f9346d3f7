//! Group Registry
//!
//! Name → group lookup shared by the HTTP layer. Groups are only ever added;
//! a name, once taken, stays bound for the life of the registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::error::{CacheError, Result};
use crate::group::Service;

#[derive(Default)]
pub struct GroupRegistry {
    groups: RwLock<HashMap<String, Arc<dyn Service>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Makes `group` reachable under its name.
    ///
    /// A second group with the same name is a configuration mistake and is
    /// rejected with `CacheError::DuplicateGroupName`; callers at startup
    /// should treat it as fatal.
    pub fn register<S: Service + 'static>(&self, group: S) -> Result<Arc<S>> {
        let mut groups = self.groups.write();
        let name = group.name().to_string();
        if groups.contains_key(&name) {
            return Err(CacheError::DuplicateGroupName(name));
        }
        let group = Arc::new(group);
        groups.insert(name.clone(), Arc::clone(&group) as Arc<dyn Service>);
        info!(group = %name, "registered group");
        Ok(group)
    }

    // == Lookup ==
    pub fn get(&self, name: &str) -> Result<Arc<dyn Service>> {
        self.groups
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CacheError::NoSuchGroup(name.to_string()))
    }

    /// Registered group names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SimulatedDb;
    use crate::group::{Group, GroupOptions};
    use std::time::Duration;

    fn group(name: &str) -> Group<SimulatedDb, SimulatedDb> {
        let db = Arc::new(SimulatedDb::seeded(5, Duration::ZERO));
        Group::new(name, Arc::clone(&db), db, GroupOptions::default()).unwrap()
    }

    #[tokio::test]
    async fn test_registry_register_and_get() {
        let registry = GroupRegistry::new();
        registry.register(group("scores")).unwrap();

        let found = registry.get("scores").unwrap();
        assert_eq!(found.name(), "scores");
        assert_eq!(&found.get("2").await.unwrap()[..], b"3");
    }

    #[test]
    fn test_registry_rejects_duplicate_name() {
        let registry = GroupRegistry::new();
        registry.register(group("scores")).unwrap();
        assert_eq!(
            registry.register(group("scores")).err(),
            Some(CacheError::DuplicateGroupName("scores".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_unknown_name() {
        let registry = GroupRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.get("nope").err(),
            Some(CacheError::NoSuchGroup("nope".to_string()))
        );
    }

    #[test]
    fn test_registry_names_sorted() {
        let registry = GroupRegistry::new();
        for name in ["b", "c", "a"] {
            registry.register(group(name)).unwrap();
        }
        assert_eq!(registry.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_registry_concurrent_registration_admits_one() {
        let registry = Arc::new(GroupRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.register(group("shared")).is_ok())
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(registry.len(), 1);
    }
}
