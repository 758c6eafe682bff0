//! Identity registry
//!
//! Allocates collision-free keys from requested display names and stores
//! registered users or channels by key.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// Display name plus the suffix that makes its key unique
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Requested display name (may collide with other identities)
    pub name: String,
    /// Disambiguating suffix, absent for the bare name
    pub suffix: Option<u32>,
    /// Unique lookup key: `name` or `name` followed by `suffix`
    pub key: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, suffix: Option<u32>) -> Self {
        let name = name.into();
        let key = match suffix {
            Some(n) => format!("{}{}", name, n),
            None => name.clone(),
        };
        Self { name, suffix, key }
    }
}

/// An entry stored in a [`Registry`]
pub trait Identified {
    /// Typed key of this entry class
    type Key: Clone + Ord + Debug + Borrow<str> + From<String>;

    fn identity(&self) -> &Identity;

    fn key(&self) -> Self::Key {
        Self::Key::from(self.identity().key.clone())
    }
}

/// Pick the identity for `name` given a predicate telling which keys are taken.
///
/// The bare name is used when free, otherwise the smallest suffix
/// `0, 1, 2, ...` whose compound key is free.
pub fn allocate(name: &str, taken: impl Fn(&str) -> bool) -> Identity {
    if !taken(name) {
        return Identity::new(name, None);
    }

    let suffix = (0u32..)
        .find(|n| !taken(&format!("{}{}", name, n)))
        .unwrap_or(u32::MAX);

    Identity::new(name, Some(suffix))
}

/// Key-ordered collection of identities of one class
#[derive(Debug, Clone)]
pub struct Registry<T: Identified> {
    entries: BTreeMap<T::Key, T>,
}

impl<T: Identified> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: Identified> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from previously persisted entries
    pub fn from_entries(entries: BTreeMap<T::Key, T>) -> Self {
        Self { entries }
    }

    /// Register a new entry under a freshly allocated identity
    ///
    /// Never fails: a taken name gets a suffix instead of being rejected.
    pub fn register(&mut self, name: &str, build: impl FnOnce(Identity) -> T) -> &T {
        let identity = allocate(name, |key| self.entries.contains_key(key));
        let key = T::Key::from(identity.key.clone());
        self.entries.entry(key).or_insert(build(identity))
    }

    pub fn find(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut T> {
        self.entries.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T::Key, &T)> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn entries(&self) -> &BTreeMap<T::Key, T> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserKey;

    #[derive(Debug)]
    struct Entry(Identity);

    impl Identified for Entry {
        type Key = UserKey;

        fn identity(&self) -> &Identity {
            &self.0
        }
    }

    #[test]
    fn test_identity_key() {
        assert_eq!(Identity::new("matt", None).key, "matt");
        assert_eq!(Identity::new("matt", Some(0)).key, "matt0");
        assert_eq!(Identity::new("matt", Some(12)).key, "matt12");
    }

    #[test]
    fn test_allocate_bare_name_when_free() {
        let identity = allocate("alice", |_| false);
        assert_eq!(identity.suffix, None);
        assert_eq!(identity.key, "alice");
    }

    #[test]
    fn test_allocate_smallest_free_suffix() {
        let taken = ["alice", "alice0", "alice2"];
        let identity = allocate("alice", |key| taken.contains(&key));
        assert_eq!(identity.suffix, Some(1));
        assert_eq!(identity.key, "alice1");
    }

    #[test]
    fn test_register_same_name_twice() {
        let mut registry: Registry<Entry> = Registry::new();

        let first = registry.register("matt", Entry).key();
        let second = registry.register("matt", Entry).key();
        let third = registry.register("matt", Entry).key();

        assert_eq!(first.as_str(), "matt");
        assert_eq!(second.as_str(), "matt0");
        assert_eq!(third.as_str(), "matt1");
        assert_eq!(registry.len(), 3);

        assert_eq!(registry.find("matt").unwrap().0.suffix, None);
        assert_eq!(registry.find("matt0").unwrap().0.suffix, Some(0));
        assert_eq!(registry.find("matt0").unwrap().0.name, "matt");
    }

    #[test]
    fn test_register_avoids_literal_compound_name() {
        let mut registry: Registry<Entry> = Registry::new();

        registry.register("bob0", Entry);
        registry.register("bob", Entry);
        let key = registry.register("bob", Entry).key();

        // "bob0" was taken by a literal registration
        assert_eq!(key.as_str(), "bob1");
    }

    #[test]
    fn test_find_missing() {
        let registry: Registry<Entry> = Registry::new();
        assert!(registry.find("nobody").is_none());
        assert!(registry.is_empty());
    }
}
