//! Generic paginated loader.
//!
//! A [`PagedLoader`] owns the accumulated item list for one list surface and
//! the state machine that grows it. All state mutation happens under a single
//! async mutex, so concurrent callers observe a linear history. A generation
//! counter guards against late responses: any fetch started before a
//! [`PagedLoader::reset`] lands in a dead generation and is discarded.

use crate::error::{CatalogError, Result};
use crate::models::CatalogEntity;
use crate::query::ListRequest;
use crate::repositories::{EntityRepository, PageOf};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::debug;

/// Supplies pages to a loader. The repository-backed implementation is the
/// production one; tests substitute in-memory sources.
#[async_trait::async_trait]
pub trait PageSource<T: CatalogEntity>: Send + Sync + 'static {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<PageOf<T>>;
}

/// Binds an [`EntityRepository`] and a base request into a page source.
/// The base request's page number is ignored; the loader supplies it.
pub struct RepositoryPageSource<R: EntityRepository> {
    repository: Arc<R>,
    request: ListRequest,
}

impl<R: EntityRepository> RepositoryPageSource<R> {
    pub fn new(repository: Arc<R>, request: ListRequest) -> Self {
        Self {
            repository,
            request,
        }
    }
}

#[async_trait::async_trait]
impl<R: EntityRepository> PageSource<R::Entity> for RepositoryPageSource<R> {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<PageOf<R::Entity>> {
        let request = self.request.clone().with_page(page).with_per_page(per_page);
        self.repository.find_page(&request).await
    }
}

/// Observable loader state. Cloned out on every transition.
#[derive(Debug, Clone)]
pub struct LoaderSnapshot<T> {
    pub items: Vec<T>,
    /// Highest page successfully applied. Zero before the first load.
    pub page: u32,
    /// Server-reported total matching the request, from the latest success.
    pub total: u64,
    pub is_loading_initial: bool,
    pub is_loading_more: bool,
    pub has_more: bool,
    /// Error from the most recent failed fetch. Cleared by the next success
    /// or by a reset, never by starting a fetch.
    pub error: Option<CatalogError>,
}

impl<T> LoaderSnapshot<T> {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            total: 0,
            is_loading_initial: false,
            is_loading_more: false,
            has_more: false,
            error: None,
        }
    }

    /// The primary loading indicator surfaces only the initial load;
    /// [`LoaderSnapshot::is_loading_more`] drives the append spinner.
    pub fn is_loading(&self) -> bool {
        self.is_loading_initial
    }

    /// True while any fetch is outstanding, initial or append.
    pub fn is_fetching(&self) -> bool {
        self.is_loading_initial || self.is_loading_more
    }
}

struct LoaderState<T> {
    snapshot: LoaderSnapshot<T>,
    generation: u64,
}

/// Paginated, deduplicating item loader for one list surface.
pub struct PagedLoader<T: CatalogEntity> {
    source: Arc<dyn PageSource<T>>,
    per_page: u32,
    state: Mutex<LoaderState<T>>,
    watch_tx: watch::Sender<LoaderSnapshot<T>>,
}

impl<T: CatalogEntity> PagedLoader<T> {
    pub fn new(source: Arc<dyn PageSource<T>>, per_page: u32) -> Self {
        let snapshot = LoaderSnapshot::empty();
        let (watch_tx, _) = watch::channel(snapshot.clone());
        Self {
            source,
            per_page,
            state: Mutex::new(LoaderState {
                snapshot,
                generation: 0,
            }),
            watch_tx,
        }
    }

    /// Current state. The loader is inert until the first
    /// [`PagedLoader::load_initial`]; a fresh snapshot has no items, no
    /// error, and `has_more == false`.
    pub fn snapshot(&self) -> LoaderSnapshot<T> {
        self.watch_tx.borrow().clone()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LoaderSnapshot<T>> {
        self.watch_tx.subscribe()
    }

    /// Load page one, replacing any accumulated items on success. A no-op
    /// while any fetch is outstanding. On failure the previous items stay
    /// and the error is recorded.
    pub async fn load_initial(&self) {
        let generation = {
            let mut state = self.state.lock().await;
            if state.snapshot.is_fetching() {
                return;
            }
            state.snapshot.is_loading_initial = true;
            self.publish(&state);
            state.generation
        };

        let result = self.source.fetch_page(1, self.per_page).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!("Discarding stale initial page");
            return;
        }
        state.snapshot.is_loading_initial = false;
        match result {
            Ok(page) => {
                let total = page.total;
                let items = dedup_by_id(page.items);
                state.snapshot.has_more = (items.len() as u64) < total;
                state.snapshot.items = items;
                state.snapshot.page = 1;
                state.snapshot.total = total;
                state.snapshot.error = None;
            }
            Err(err) => {
                state.snapshot.error = Some(err);
            }
        }
        self.publish(&state);
    }

    /// Load the page after the last applied one and append it. A no-op while
    /// any fetch is outstanding or when the list is exhausted. On failure the
    /// page counter does not advance, so a retry refetches the same page.
    pub async fn load_more(&self) {
        let (generation, next_page) = {
            let mut state = self.state.lock().await;
            if state.snapshot.is_fetching() || !state.snapshot.has_more {
                return;
            }
            state.snapshot.is_loading_more = true;
            self.publish(&state);
            (state.generation, state.snapshot.page + 1)
        };

        let result = self.source.fetch_page(next_page, self.per_page).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(page = next_page, "Discarding stale page");
            return;
        }
        state.snapshot.is_loading_more = false;
        match result {
            Ok(page) => {
                let total = page.total;
                append_deduped(&mut state.snapshot.items, page.items);
                state.snapshot.page = next_page;
                state.snapshot.total = total;
                state.snapshot.has_more = (state.snapshot.items.len() as u64) < total;
                state.snapshot.error = None;
            }
            Err(err) => {
                state.snapshot.error = Some(err);
            }
        }
        self.publish(&state);
    }

    /// Re-run the initial load without dropping what is already shown.
    pub async fn refresh(&self) {
        self.load_initial().await;
    }

    /// Drop all items and invalidate in-flight fetches. The loader is back
    /// in its inert pre-load state afterwards.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.snapshot = LoaderSnapshot::empty();
        self.publish(&state);
    }

    fn publish(&self, state: &LoaderState<T>) {
        let _ = self.watch_tx.send(state.snapshot.clone());
    }
}

fn dedup_by_id<T: CatalogEntity>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.entity_id().to_owned()))
        .collect()
}

fn append_deduped<T: CatalogEntity>(existing: &mut Vec<T>, incoming: Vec<T>) {
    let mut seen: HashSet<String> = existing
        .iter()
        .map(|item| item.entity_id().to_owned())
        .collect();
    for item in incoming {
        if seen.insert(item.entity_id().to_owned()) {
            existing.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Scene;

    fn scene(id: &str) -> Scene {
        Scene {
            id: id.to_owned(),
            title: Some(format!("Scene {id}")),
            ..Scene::default()
        }
    }

    fn scenes(range: std::ops::Range<u32>) -> Vec<Scene> {
        range.map(|n| scene(&n.to_string())).collect()
    }

    struct FixedSource {
        total: u64,
        pages: Vec<Vec<Scene>>,
    }

    #[async_trait::async_trait]
    impl PageSource<Scene> for FixedSource {
        async fn fetch_page(&self, page: u32, _per_page: u32) -> Result<PageOf<Scene>> {
            let items = self
                .pages
                .get((page - 1) as usize)
                .cloned()
                .unwrap_or_default();
            Ok(PageOf::new(items, self.total))
        }
    }

    struct FailingSource;

    #[async_trait::async_trait]
    impl PageSource<Scene> for FailingSource {
        async fn fetch_page(&self, _page: u32, _per_page: u32) -> Result<PageOf<Scene>> {
            Err(CatalogError::Network("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_fresh_loader_is_inert() {
        let loader = PagedLoader::new(
            Arc::new(FixedSource {
                total: 0,
                pages: vec![],
            }),
            20,
        );
        let snap = loader.snapshot();
        assert!(snap.items.is_empty());
        assert!(!snap.has_more);
        assert!(snap.error.is_none());
        assert!(!snap.is_fetching());
    }

    #[tokio::test]
    async fn test_load_initial_populates_and_flags_more() {
        let loader = PagedLoader::new(
            Arc::new(FixedSource {
                total: 57,
                pages: vec![scenes(0..20)],
            }),
            20,
        );
        loader.load_initial().await;
        let snap = loader.snapshot();
        assert_eq!(snap.items.len(), 20);
        assert_eq!(snap.page, 1);
        assert_eq!(snap.total, 57);
        assert!(snap.has_more);
    }

    #[tokio::test]
    async fn test_exhaustion_after_final_short_page() {
        let loader = PagedLoader::new(
            Arc::new(FixedSource {
                total: 57,
                pages: vec![scenes(0..20), scenes(20..40), scenes(40..57)],
            }),
            20,
        );
        loader.load_initial().await;
        loader.load_more().await;
        loader.load_more().await;
        let snap = loader.snapshot();
        assert_eq!(snap.items.len(), 57);
        assert_eq!(snap.page, 3);
        assert!(!snap.has_more);

        // Further calls are no-ops.
        loader.load_more().await;
        assert_eq!(loader.snapshot().items.len(), 57);
    }

    #[tokio::test]
    async fn test_duplicate_ids_across_pages_are_dropped() {
        let loader = PagedLoader::new(
            Arc::new(FixedSource {
                total: 40,
                // Page two re-serves item 19 (list shifted server-side).
                pages: vec![scenes(0..20), scenes(19..39)],
            }),
            20,
        );
        loader.load_initial().await;
        loader.load_more().await;
        let snap = loader.snapshot();
        assert_eq!(snap.items.len(), 39);
        let ids: HashSet<_> = snap.items.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids.len(), 39);
    }

    #[tokio::test]
    async fn test_failed_initial_keeps_nothing_but_records_error() {
        let loader = PagedLoader::new(Arc::new(FailingSource), 20);
        loader.load_initial().await;
        let snap = loader.snapshot();
        assert!(snap.items.is_empty());
        assert!(matches!(snap.error, Some(CatalogError::Network(_))));
        assert!(!snap.is_fetching());
    }

    #[tokio::test]
    async fn test_failed_load_more_keeps_items_and_page() {
        struct FirstPageOnly;

        #[async_trait::async_trait]
        impl PageSource<Scene> for FirstPageOnly {
            async fn fetch_page(&self, page: u32, _per_page: u32) -> Result<PageOf<Scene>> {
                if page == 1 {
                    Ok(PageOf::new(
                        (0..20).map(|n| super::tests::scene(&n.to_string())).collect(),
                        57,
                    ))
                } else {
                    Err(CatalogError::HttpStatus { status: 503 })
                }
            }
        }

        let loader = PagedLoader::new(Arc::new(FirstPageOnly), 20);
        loader.load_initial().await;
        loader.load_more().await;
        let snap = loader.snapshot();
        assert_eq!(snap.items.len(), 20);
        assert_eq!(snap.page, 1);
        assert_eq!(snap.error, Some(CatalogError::HttpStatus { status: 503 }));
        assert!(snap.has_more);

        // A retry refetches the same page number.
        loader.load_more().await;
        assert_eq!(loader.snapshot().page, 1);
    }

    #[tokio::test]
    async fn test_next_success_clears_error() {
        struct FlakyOnce {
            failed: std::sync::atomic::AtomicBool,
        }

        #[async_trait::async_trait]
        impl PageSource<Scene> for FlakyOnce {
            async fn fetch_page(&self, _page: u32, _per_page: u32) -> Result<PageOf<Scene>> {
                if !self.failed.swap(true, std::sync::atomic::Ordering::SeqCst) {
                    Err(CatalogError::Network("reset by peer".into()))
                } else {
                    Ok(PageOf::new(vec![super::tests::scene("1")], 1))
                }
            }
        }

        let loader = PagedLoader::new(
            Arc::new(FlakyOnce {
                failed: std::sync::atomic::AtomicBool::new(false),
            }),
            20,
        );
        loader.load_initial().await;
        assert!(loader.snapshot().error.is_some());
        loader.load_initial().await;
        let snap = loader.snapshot();
        assert!(snap.error.is_none());
        assert_eq!(snap.items.len(), 1);
    }

    #[tokio::test]
    async fn test_reset_returns_to_inert_state() {
        let loader = PagedLoader::new(
            Arc::new(FixedSource {
                total: 57,
                pages: vec![scenes(0..20)],
            }),
            20,
        );
        loader.load_initial().await;
        loader.reset().await;
        let snap = loader.snapshot();
        assert!(snap.items.is_empty());
        assert_eq!(snap.page, 0);
        assert_eq!(snap.total, 0);
        assert!(!snap.has_more);
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_current_items() {
        struct SucceedThenFail {
            calls: std::sync::atomic::AtomicU32,
        }

        #[async_trait::async_trait]
        impl PageSource<Scene> for SucceedThenFail {
            async fn fetch_page(&self, _page: u32, _per_page: u32) -> Result<PageOf<Scene>> {
                if self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                    Ok(PageOf::new(
                        (0..20).map(|n| super::tests::scene(&n.to_string())).collect(),
                        57,
                    ))
                } else {
                    Err(CatalogError::Network("offline".into()))
                }
            }
        }

        let loader = PagedLoader::new(
            Arc::new(SucceedThenFail {
                calls: std::sync::atomic::AtomicU32::new(0),
            }),
            20,
        );
        loader.load_initial().await;
        loader.refresh().await;
        let snap = loader.snapshot();
        assert_eq!(snap.items.len(), 20);
        assert!(matches!(snap.error, Some(CatalogError::Network(_))));
    }

    #[tokio::test]
    async fn test_watch_subscribers_see_transitions() {
        let loader = PagedLoader::new(
            Arc::new(FixedSource {
                total: 5,
                pages: vec![scenes(0..5)],
            }),
            20,
        );
        let mut rx = loader.subscribe();
        loader.load_initial().await;
        rx.changed().await.unwrap();
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.items.len(), 5);
        assert!(!snap.has_more);
    }
}
