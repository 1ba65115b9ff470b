//! Keyed loader cache.
//!
//! List surfaces outside the main tabs (home rows, detail-page relation
//! lists) get their loaders from here, keyed by a stable string, so
//! revisiting a surface reuses its accumulated items. Invalidation resets
//! the loader in place; the entry stays keyed and the next use refetches.

use crate::loader::{PagedLoader, PageSource};
use crate::models::CatalogEntity;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Stable cache key builders. The formats are load-bearing: a surface must
/// land on the same key every visit.
pub struct CacheKey;

impl CacheKey {
    /// A home screen row, e.g. `home-row:recently-added`.
    pub fn home_row(category: &str) -> String {
        format!("home-row:{category}")
    }

    /// A relation list on a detail page, e.g. `performer-detail-scenes:42`.
    pub fn detail_relation(kind: &str, relation: &str, id: &str) -> String {
        format!("{kind}-detail-{relation}:{id}")
    }
}

/// Keyed collection of loaders for one entity type.
///
/// The map lock is a plain mutex held only for map access, never across a
/// loader await.
pub struct LoaderCache<T: CatalogEntity> {
    per_page: u32,
    loaders: Mutex<HashMap<String, Arc<PagedLoader<T>>>>,
}

impl<T: CatalogEntity> LoaderCache<T> {
    pub fn new(per_page: u32) -> Self {
        Self {
            per_page,
            loaders: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<PagedLoader<T>>> {
        self.lock().get(key).cloned()
    }

    /// The loader for `key`, building one from `make_source` on a miss.
    /// Two concurrent first visits may both build; the map keeps whichever
    /// inserts first, and the loser's loader is dropped unused.
    pub fn get_or_create<F>(&self, key: &str, make_source: F) -> Arc<PagedLoader<T>>
    where
        F: FnOnce() -> Arc<dyn PageSource<T>>,
    {
        if let Some(loader) = self.get(key) {
            return loader;
        }
        let loader = Arc::new(PagedLoader::new(make_source(), self.per_page));
        let mut map = self.lock();
        Arc::clone(map.entry(key.to_owned()).or_insert(loader))
    }

    /// Reset the loader under `key`, if any. The entry stays; the next use
    /// starts from an empty list.
    pub async fn invalidate(&self, key: &str) {
        let loader = self.get(key);
        if let Some(loader) = loader {
            debug!(key, "Invalidating cached loader");
            loader.reset().await;
        }
    }

    /// Reset every cached loader.
    pub async fn invalidate_all(&self) {
        let loaders: Vec<Arc<PagedLoader<T>>> = self.lock().values().cloned().collect();
        debug!(count = loaders.len(), "Invalidating all cached loaders");
        for loader in loaders {
            loader.reset().await;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<PagedLoader<T>>>> {
        self.loaders.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
