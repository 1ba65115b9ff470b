//! Saved filter resolution.
//!
//! Each list tab resolves its effective query parameters before its loader
//! can be built. When the tab has a configured default saved filter, the
//! resolution waits for the saved filter collection of that mode; when it
//! does not, resolution is immediate. A missing preset (deleted server-side,
//! or the collection fetch failed) degrades to no preset rather than an
//! error, so the tab still loads.

use crate::error::Result;
use crate::loader::{PagedLoader, PageSource, RepositoryPageSource};
use crate::models::{FilterMode, SavedFilter};
use crate::query::{ListRequest, SortDirection};
use crate::repositories::{EntityRepository, SavedFilterSource};
use core_runtime::{DefaultFilterSettings, FilterTab};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

/// Saved filter collection state for one entity mode.
#[derive(Debug, Clone, Default)]
pub struct SavedFilterState {
    pub filters: Vec<SavedFilter>,
    /// True once a load attempt has completed, success or failure.
    pub loaded: bool,
    pub error: Option<crate::error::CatalogError>,
}

/// Caches the saved filter collection for one mode and publishes load
/// completion, so resolutions started before the collection arrives can
/// wait on it.
pub struct SavedFilterStore {
    source: Arc<dyn SavedFilterSource>,
    mode: FilterMode,
    state_tx: watch::Sender<SavedFilterState>,
    load_lock: Mutex<()>,
}

impl SavedFilterStore {
    pub fn new(source: Arc<dyn SavedFilterSource>, mode: FilterMode) -> Self {
        let (state_tx, _) = watch::channel(SavedFilterState::default());
        Self {
            source,
            mode,
            state_tx,
            load_lock: Mutex::new(()),
        }
    }

    pub fn state(&self) -> SavedFilterState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SavedFilterState> {
        self.state_tx.subscribe()
    }

    /// Fetch the collection if no completed attempt exists yet. Concurrent
    /// callers coalesce into one fetch.
    pub async fn load(&self) {
        let _guard = self.load_lock.lock().await;
        if self.state_tx.borrow().loaded {
            return;
        }
        match self.source.list(self.mode).await {
            Ok(filters) => {
                debug!(mode = ?self.mode, count = filters.len(), "Saved filters loaded");
                let _ = self.state_tx.send(SavedFilterState {
                    filters,
                    loaded: true,
                    error: None,
                });
            }
            Err(err) => {
                warn!(mode = ?self.mode, error = %err, "Saved filter load failed");
                let _ = self.state_tx.send(SavedFilterState {
                    filters: Vec::new(),
                    loaded: true,
                    error: Some(err),
                });
            }
        }
    }

    /// Forget the collection. The next [`SavedFilterStore::load`] refetches.
    pub fn reset(&self) {
        let _ = self.state_tx.send(SavedFilterState::default());
    }

    pub fn find(&self, id: &str) -> Option<SavedFilter> {
        self.state_tx
            .borrow()
            .filters
            .iter()
            .find(|f| f.id == id)
            .cloned()
    }
}

/// Explicit list parameters a caller layers on top of the resolved preset.
#[derive(Debug, Clone, Default)]
struct ListParams {
    sort: Option<(String, SortDirection)>,
    search: Option<String>,
}

struct CoordinatorState<E: crate::models::CatalogEntity> {
    params: ListParams,
    /// `None` until resolution completes; then the resolved preset (which
    /// may itself be `None` when the tab has no usable default).
    resolved: Option<Option<SavedFilter>>,
    loader: Option<Arc<PagedLoader<E>>>,
}

/// Binds a tab's default filter setting, its saved filter collection, and
/// its repository into ready-to-use loaders.
pub struct FilterCoordinator<R: EntityRepository> {
    tab: FilterTab,
    settings: DefaultFilterSettings,
    store: Arc<SavedFilterStore>,
    repository: Arc<R>,
    page_size: u32,
    inner: Mutex<CoordinatorState<R::Entity>>,
}

impl<R: EntityRepository> FilterCoordinator<R> {
    pub fn new(
        tab: FilterTab,
        settings: DefaultFilterSettings,
        store: Arc<SavedFilterStore>,
        repository: Arc<R>,
        page_size: u32,
    ) -> Self {
        Self {
            tab,
            settings,
            store,
            repository,
            page_size,
            inner: Mutex::new(CoordinatorState {
                params: ListParams::default(),
                resolved: None,
                loader: None,
            }),
        }
    }

    /// The loader for this tab's current parameters, resolving the default
    /// saved filter first if that has not happened yet. Repeated calls
    /// return the same loader until the parameters change or the
    /// coordinator is invalidated.
    pub async fn loader(&self) -> Result<Arc<PagedLoader<R::Entity>>> {
        let preset = self.resolve().await;

        let mut state = self.inner.lock().await;
        if let Some(loader) = &state.loader {
            return Ok(Arc::clone(loader));
        }
        let request = build_request(self.page_size, &state.params, preset.as_ref());
        let source: Arc<dyn PageSource<R::Entity>> = Arc::new(RepositoryPageSource::new(
            Arc::clone(&self.repository),
            request,
        ));
        let loader = Arc::new(PagedLoader::new(source, self.page_size));
        state.loader = Some(Arc::clone(&loader));
        Ok(loader)
    }

    /// Resolve the tab's default saved filter, waiting for the collection
    /// when a default id is configured. Resolution is cached.
    pub async fn resolve(&self) -> Option<SavedFilter> {
        {
            let state = self.inner.lock().await;
            if let Some(resolved) = &state.resolved {
                return resolved.clone();
            }
        }

        let preset = match self.settings.default_filter_id(self.tab) {
            None => None,
            Some(id) => {
                self.wait_for_collection().await;
                let found = self.store.find(&id);
                if found.is_none() {
                    debug!(tab = %self.tab, filter_id = %id, "Default filter not in collection");
                }
                found
            }
        };

        let mut state = self.inner.lock().await;
        // Another resolution may have won the race; keep the first answer.
        if let Some(resolved) = &state.resolved {
            return resolved.clone();
        }
        state.resolved = Some(preset.clone());
        preset
    }

    async fn wait_for_collection(&self) {
        let mut rx = self.store.subscribe();
        if rx.borrow().loaded {
            return;
        }
        self.store.load().await;
        while !rx.borrow_and_update().loaded {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Replace the search text. Drops the current loader; the next
    /// [`FilterCoordinator::loader`] call builds one for the new query.
    pub async fn set_search(&self, search: Option<String>) {
        let mut state = self.inner.lock().await;
        if state.params.search != search {
            state.params.search = search;
            state.loader = None;
        }
    }

    /// Replace the sort key and direction.
    pub async fn set_sort(&self, sort: Option<(String, SortDirection)>) {
        let mut state = self.inner.lock().await;
        if state.params.sort != sort {
            state.params.sort = sort;
            state.loader = None;
        }
    }

    /// Throw away the resolved preset and loader, e.g. after the active
    /// server or the default filter setting changed. Explicit parameters
    /// survive.
    pub async fn invalidate(&self) {
        let mut state = self.inner.lock().await;
        state.resolved = None;
        state.loader = None;
    }
}

/// An explicit sort always wins; otherwise the preset's sort applies.
/// An active preset replaces the search clause outright.
fn build_request(
    page_size: u32,
    params: &ListParams,
    preset: Option<&SavedFilter>,
) -> ListRequest {
    let mut request = ListRequest::new(page_size);

    if let Some((key, direction)) = &params.sort {
        request = request.with_sort(key, *direction);
    } else if let Some(find) = preset.and_then(|p| p.find_filter.as_ref()) {
        if let Some(sort) = &find.sort {
            request = request.with_sort(sort, find.direction.unwrap_or_default());
        }
    }

    if let Some(preset) = preset {
        request = request.with_filter_override(preset.object_filter.clone());
    } else if let Some(search) = &params.search {
        request = request.with_search(search);
    }

    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::models::{SavedFindFilter, Scene};
    use crate::repositories::PageOf;
    use async_trait::async_trait;
    use serde_json::json;

    struct FakeFilters {
        filters: Vec<SavedFilter>,
        fail: bool,
    }

    #[async_trait]
    impl SavedFilterSource for FakeFilters {
        async fn list(&self, _mode: FilterMode) -> Result<Vec<SavedFilter>> {
            if self.fail {
                Err(CatalogError::Network("offline".into()))
            } else {
                Ok(self.filters.clone())
            }
        }
    }

    struct RecordingRepo {
        requests: std::sync::Mutex<Vec<ListRequest>>,
    }

    impl RecordingRepo {
        fn new() -> Self {
            Self {
                requests: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn recorded(&self) -> Vec<ListRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EntityRepository for RecordingRepo {
        type Entity = Scene;

        async fn find_page(&self, request: &ListRequest) -> Result<PageOf<Scene>> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(PageOf::empty())
        }

        async fn find_by_id(&self, _id: &str) -> Result<Option<Scene>> {
            Ok(None)
        }
    }

    fn preset(id: &str) -> SavedFilter {
        SavedFilter {
            id: id.to_owned(),
            name: format!("Preset {id}"),
            mode: FilterMode::Scenes,
            find_filter: Some(SavedFindFilter {
                q: None,
                sort: Some("rating".to_owned()),
                direction: Some(SortDirection::Desc),
            }),
            object_filter: Some(json!({"rating100": {"value": 80, "modifier": "GREATER_THAN"}})),
        }
    }

    fn coordinator(
        filters: Vec<SavedFilter>,
        fail: bool,
        default_id: Option<&str>,
    ) -> (FilterCoordinator<RecordingRepo>, Arc<RecordingRepo>) {
        let settings = DefaultFilterSettings::new();
        if let Some(id) = default_id {
            settings.set_default_filter(FilterTab::Scenes, Some(id.to_owned()));
        }
        let store = Arc::new(SavedFilterStore::new(
            Arc::new(FakeFilters { filters, fail }),
            FilterMode::Scenes,
        ));
        let repo = Arc::new(RecordingRepo::new());
        (
            FilterCoordinator::new(
                FilterTab::Scenes,
                settings,
                store,
                Arc::clone(&repo),
                20,
            ),
            repo,
        )
    }

    #[tokio::test]
    async fn test_no_default_resolves_immediately_without_fetch() {
        let (coordinator, repo) = coordinator(vec![preset("f1")], false, None);
        assert!(coordinator.resolve().await.is_none());

        let loader = coordinator.loader().await.unwrap();
        loader.load_initial().await;
        let request = &repo.recorded()[0];
        assert!(request.filter_override.is_none());
        assert!(request.sort.is_none());
    }

    #[tokio::test]
    async fn test_default_filter_shapes_the_request() {
        let (coordinator, repo) = coordinator(vec![preset("f1")], false, Some("f1"));
        let loader = coordinator.loader().await.unwrap();
        loader.load_initial().await;

        let request = &repo.recorded()[0];
        assert_eq!(request.sort.as_deref(), Some("rating"));
        assert_eq!(request.direction, SortDirection::Desc);
        assert_eq!(
            request.filter_override,
            Some(json!({"rating100": {"value": 80, "modifier": "GREATER_THAN"}}))
        );
    }

    #[tokio::test]
    async fn test_missing_default_degrades_to_no_preset() {
        let (coordinator, _) = coordinator(vec![preset("other")], false, Some("gone"));
        assert!(coordinator.resolve().await.is_none());
    }

    #[tokio::test]
    async fn test_collection_failure_degrades_to_no_preset() {
        let (coordinator, repo) = coordinator(vec![], true, Some("f1"));
        assert!(coordinator.resolve().await.is_none());

        let loader = coordinator.loader().await.unwrap();
        loader.load_initial().await;
        assert!(repo.recorded()[0].filter_override.is_none());
    }

    #[tokio::test]
    async fn test_preset_replaces_search_clause() {
        let (coordinator, repo) = coordinator(vec![preset("f1")], false, Some("f1"));
        coordinator.set_search(Some("ignored".to_owned())).await;

        let loader = coordinator.loader().await.unwrap();
        loader.load_initial().await;
        let request = &repo.recorded()[0];
        assert!(request.filter_override.is_some());
        assert!(request.search.is_none());
    }

    #[tokio::test]
    async fn test_explicit_sort_overrides_preset_sort() {
        let (coordinator, repo) = coordinator(vec![preset("f1")], false, Some("f1"));
        coordinator
            .set_sort(Some(("date".to_owned(), SortDirection::Asc)))
            .await;

        let loader = coordinator.loader().await.unwrap();
        loader.load_initial().await;
        assert_eq!(repo.recorded()[0].sort.as_deref(), Some("date"));
    }

    #[tokio::test]
    async fn test_loader_is_cached_until_params_change() {
        let (coordinator, _) = coordinator(vec![], false, None);
        let first = coordinator.loader().await.unwrap();
        let second = coordinator.loader().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        coordinator.set_search(Some("new".to_owned())).await;
        let third = coordinator.loader().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[tokio::test]
    async fn test_search_change_starts_at_page_one_and_keeps_the_old_loader_intact() {
        // Serves one item whose id mirrors the search text, always from
        // page 1.
        struct EchoRepo;

        #[async_trait]
        impl EntityRepository for EchoRepo {
            type Entity = Scene;

            async fn find_page(&self, request: &ListRequest) -> Result<PageOf<Scene>> {
                assert_eq!(request.page, 1);
                let id = request.search.clone().unwrap_or_else(|| "all".into());
                Ok(PageOf::new(
                    vec![Scene {
                        id,
                        ..Scene::default()
                    }],
                    1,
                ))
            }

            async fn find_by_id(&self, _id: &str) -> Result<Option<Scene>> {
                Ok(None)
            }
        }

        let store = Arc::new(SavedFilterStore::new(
            Arc::new(FakeFilters {
                filters: vec![],
                fail: false,
            }),
            FilterMode::Scenes,
        ));
        let coordinator = FilterCoordinator::new(
            FilterTab::Scenes,
            DefaultFilterSettings::new(),
            store,
            Arc::new(EchoRepo),
            20,
        );

        let old = coordinator.loader().await.unwrap();
        old.load_initial().await;
        assert_eq!(old.snapshot().items[0].id, "all");

        coordinator.set_search(Some("knight".into())).await;

        // The superseded loader keeps its items, so a screen can keep
        // showing them until the replacement delivers its first page.
        let kept = old.snapshot();
        assert_eq!(kept.items.len(), 1);
        assert_eq!(kept.page, 1);

        let new = coordinator.loader().await.unwrap();
        assert!(!Arc::ptr_eq(&old, &new));
        assert!(new.snapshot().items.is_empty());
        assert_eq!(new.snapshot().page, 0);

        new.load_initial().await;
        let snap = new.snapshot();
        assert_eq!(snap.page, 1);
        assert_eq!(snap.items[0].id, "knight");
        // The old instance is abandoned, never mutated.
        assert_eq!(old.snapshot().items[0].id, "all");
    }

    #[tokio::test]
    async fn test_invalidate_forces_re_resolution() {
        let (coordinator, _) = coordinator(vec![preset("f1")], false, None);
        assert!(coordinator.resolve().await.is_none());

        // A default appears after the first resolution.
        coordinator
            .settings
            .set_default_filter(FilterTab::Scenes, Some("f1".to_owned()));
        assert!(coordinator.resolve().await.is_none());

        coordinator.invalidate().await;
        let resolved = coordinator.resolve().await;
        assert_eq!(resolved.map(|f| f.id), Some("f1".to_owned()));
    }

    #[tokio::test]
    async fn test_resolution_waits_for_slow_collection() {
        struct SlowFilters;

        #[async_trait]
        impl SavedFilterSource for SlowFilters {
            async fn list(&self, _mode: FilterMode) -> Result<Vec<SavedFilter>> {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                Ok(vec![super::tests::preset("f1")])
            }
        }

        let settings = DefaultFilterSettings::new();
        settings.set_default_filter(FilterTab::Scenes, Some("f1".to_owned()));
        let store = Arc::new(SavedFilterStore::new(Arc::new(SlowFilters), FilterMode::Scenes));
        let coordinator = FilterCoordinator::new(
            FilterTab::Scenes,
            settings,
            store,
            Arc::new(RecordingRepo::new()),
            20,
        );
        let resolved = coordinator.resolve().await;
        assert_eq!(resolved.map(|f| f.id), Some("f1".to_owned()));
    }
}
