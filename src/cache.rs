//! Template cache keyed by template name.
//!
//! Each entry holds the shared, possibly still pending, load for its name.
//! Every render asking for a name while its load is in flight awaits the
//! same handle, so a name is loaded at most once until the entry is removed.

use crate::loader::LoadFuture;
use futures::future::{FutureExt, Shared};
use serde::Deserialize;
use std::collections::HashMap;

/// Shared handle to a load. Every clone resolves to the same outcome.
pub type SharedLoad = Shared<LoadFuture>;

/// What happens to a cache entry whose load failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Drop the failed entry so the next render asks the loader again.
    #[default]
    EvictOnError,
    /// Keep the failed entry; renders replay the failure until a flush.
    Retain,
}

/// Handle returned by [`TemplateCache::get_or_insert_with`].
#[derive(Clone)]
pub struct CacheLookup {
    /// Identifies the entry, so a failed load only evicts the entry it came from.
    pub generation: u64,
    pub handle: SharedLoad,
    /// Whether the entry already existed.
    pub hit: bool,
}

struct Entry {
    generation: u64,
    handle: SharedLoad,
}

/// Loads by template name, each tagged with the generation it was created in.
///
/// Not synchronized; the runtime keeps it behind a mutex and never holds that
/// lock while awaiting or while calling into a loader.
#[derive(Default)]
pub struct TemplateCache {
    entries: HashMap<String, Entry>,
    next_generation: u64,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `name`, creating it from `load` when absent.
    ///
    /// `load` runs synchronously and only on a miss.
    pub fn get_or_insert_with<F>(&mut self, name: &str, load: F) -> CacheLookup
    where
        F: FnOnce() -> LoadFuture,
    {
        match self.lookup(name) {
            Some(hit) => hit,
            None => self.insert(name, load()),
        }
    }

    fn lookup(&self, name: &str) -> Option<CacheLookup> {
        self.entries.get(name).map(|entry| CacheLookup {
            generation: entry.generation,
            handle: entry.handle.clone(),
            hit: true,
        })
    }

    fn insert(&mut self, name: &str, pending: LoadFuture) -> CacheLookup {
        let generation = self.next_generation;
        self.next_generation += 1;
        let handle = pending.shared();
        self.entries
            .insert(name.to_string(), Entry { generation, handle: handle.clone() });
        CacheLookup { generation, handle, hit: false }
    }

    /// Removes the entry for `name` if it is still the one from `generation`.
    ///
    /// # Returns
    /// * `bool` - Whether an entry was removed
    pub fn evict(&mut self, name: &str, generation: u64) -> bool {
        match self.entries.get(name) {
            Some(entry) if entry.generation == generation => {
                self.entries.remove(name);
                true
            }
            _ => false,
        }
    }

    /// Removes every entry. Handles already given out keep resolving.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateCache")
            .field("templates", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
