//! Catalog service façade.
//!
//! This crate wires the host-provided HTTP bridge, the runtime configuration
//! handles, and the catalog's repositories, coordinators, and loader caches
//! into one service handle. It also owns the cross-cutting invalidation
//! rules: switching servers throws away every cached result before any
//! observer hears about the switch, and changing a tab's default filter
//! re-resolves just that tab.

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::http::HttpClient;
use core_catalog::filters::{FilterCoordinator, SavedFilterStore};
use core_catalog::models::FilterMode;
use core_catalog::repositories::{
    GraphQlGalleryRepository, GraphQlPerformerRepository, GraphQlSavedFilterRepository,
    GraphQlSceneRepository, GraphQlStudioRepository, GraphQlTagRepository,
};
use core_catalog::{Gallery, GraphQlClient, LoaderCache, Performer, Scene, Studio, Tag};
use core_runtime::{
    CoreConfig, CoreEvent, DefaultFilterSettings, EventBus, FilterEvent, FilterTab, ServerConfig,
    ServerEvent, ServerProfile,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Everything the catalog core needs from its host.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub server: ServerConfig,
    pub filter_settings: DefaultFilterSettings,
    pub event_bus: EventBus,
    pub page_size: u32,
}

impl CoreDependencies {
    pub fn from_config(config: CoreConfig) -> Self {
        let event_bus = EventBus::new(config.event_buffer_size);
        Self {
            http_client: config.http_client,
            server: config.server,
            filter_settings: config.filter_settings,
            event_bus,
            page_size: config.page_size,
        }
    }
}

struct TabSlot<R: core_catalog::repositories::EntityRepository> {
    repository: Arc<R>,
    store: Arc<SavedFilterStore>,
    coordinator: FilterCoordinator<R>,
    cache: LoaderCache<R::Entity>,
}

impl<R: core_catalog::repositories::EntityRepository> TabSlot<R> {
    fn new(
        tab: FilterTab,
        repository: Arc<R>,
        saved_filters: Arc<GraphQlSavedFilterRepository>,
        settings: DefaultFilterSettings,
        page_size: u32,
    ) -> Self {
        let store = Arc::new(SavedFilterStore::new(saved_filters, FilterMode::from(tab)));
        let coordinator = FilterCoordinator::new(
            tab,
            settings,
            Arc::clone(&store),
            Arc::clone(&repository),
            page_size,
        );
        Self {
            repository,
            store,
            coordinator,
            cache: LoaderCache::new(page_size),
        }
    }

    async fn invalidate(&self) {
        self.store.reset();
        self.coordinator.invalidate().await;
        self.cache.invalidate_all().await;
    }
}

struct ServiceInner {
    server: ServerConfig,
    filter_settings: DefaultFilterSettings,
    event_bus: EventBus,
    scenes: TabSlot<GraphQlSceneRepository>,
    performers: TabSlot<GraphQlPerformerRepository>,
    studios: TabSlot<GraphQlStudioRepository>,
    tags: TabSlot<GraphQlTagRepository>,
    galleries: TabSlot<GraphQlGalleryRepository>,
}

/// Primary façade exposed to host applications. Cheap to clone; all clones
/// share state.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<ServiceInner>,
}

impl CatalogService {
    pub fn new(deps: CoreDependencies) -> Self {
        let transport = Arc::new(GraphQlClient::new(
            Arc::clone(&deps.http_client),
            deps.server.clone(),
        ));
        let saved_filters = Arc::new(GraphQlSavedFilterRepository::new(Arc::clone(&transport)));

        macro_rules! slot {
            ($tab:expr, $repo:expr) => {
                TabSlot::new(
                    $tab,
                    Arc::new($repo),
                    Arc::clone(&saved_filters),
                    deps.filter_settings.clone(),
                    deps.page_size,
                )
            };
        }
        let scenes = slot!(
            FilterTab::Scenes,
            GraphQlSceneRepository::new(Arc::clone(&transport))
        );
        let performers = slot!(
            FilterTab::Performers,
            GraphQlPerformerRepository::new(Arc::clone(&transport))
        );
        let studios = slot!(
            FilterTab::Studios,
            GraphQlStudioRepository::new(Arc::clone(&transport))
        );
        let tags = slot!(
            FilterTab::Tags,
            GraphQlTagRepository::new(Arc::clone(&transport))
        );
        let galleries = slot!(
            FilterTab::Galleries,
            GraphQlGalleryRepository::new(Arc::clone(&transport))
        );

        Self {
            inner: Arc::new(ServiceInner {
                server: deps.server,
                filter_settings: deps.filter_settings,
                event_bus: deps.event_bus,
                scenes,
                performers,
                studios,
                tags,
                galleries,
            }),
        }
    }

    /// Build a service straight from a validated [`CoreConfig`].
    pub fn from_config(config: CoreConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;
        Ok(Self::new(CoreDependencies::from_config(config)))
    }

    // ---- per-tab surfaces -------------------------------------------------

    pub fn scenes(&self) -> &FilterCoordinator<GraphQlSceneRepository> {
        &self.inner.scenes.coordinator
    }

    pub fn performers(&self) -> &FilterCoordinator<GraphQlPerformerRepository> {
        &self.inner.performers.coordinator
    }

    pub fn studios(&self) -> &FilterCoordinator<GraphQlStudioRepository> {
        &self.inner.studios.coordinator
    }

    pub fn tags(&self) -> &FilterCoordinator<GraphQlTagRepository> {
        &self.inner.tags.coordinator
    }

    pub fn galleries(&self) -> &FilterCoordinator<GraphQlGalleryRepository> {
        &self.inner.galleries.coordinator
    }

    // ---- repositories (detail fetch + mutations) --------------------------

    pub fn scene_repository(&self) -> Arc<GraphQlSceneRepository> {
        Arc::clone(&self.inner.scenes.repository)
    }

    pub fn performer_repository(&self) -> Arc<GraphQlPerformerRepository> {
        Arc::clone(&self.inner.performers.repository)
    }

    pub fn studio_repository(&self) -> Arc<GraphQlStudioRepository> {
        Arc::clone(&self.inner.studios.repository)
    }

    pub fn tag_repository(&self) -> Arc<GraphQlTagRepository> {
        Arc::clone(&self.inner.tags.repository)
    }

    pub fn gallery_repository(&self) -> Arc<GraphQlGalleryRepository> {
        Arc::clone(&self.inner.galleries.repository)
    }

    // ---- keyed caches (home rows, detail relation lists) ------------------

    pub fn scene_cache(&self) -> &LoaderCache<Scene> {
        &self.inner.scenes.cache
    }

    pub fn performer_cache(&self) -> &LoaderCache<Performer> {
        &self.inner.performers.cache
    }

    pub fn studio_cache(&self) -> &LoaderCache<Studio> {
        &self.inner.studios.cache
    }

    pub fn tag_cache(&self) -> &LoaderCache<Tag> {
        &self.inner.tags.cache
    }

    pub fn gallery_cache(&self) -> &LoaderCache<Gallery> {
        &self.inner.galleries.cache
    }

    // ---- configuration ----------------------------------------------------

    pub fn server(&self) -> &ServerConfig {
        &self.inner.server
    }

    pub fn filter_settings(&self) -> &DefaultFilterSettings {
        &self.inner.filter_settings
    }

    pub fn subscribe(&self) -> core_runtime::events::Receiver<CoreEvent> {
        self.inner.event_bus.subscribe()
    }

    /// Make `profile` the active server. Everything cached from the previous
    /// server is gone before the switch event reaches any subscriber, so an
    /// observer reacting to the event can only see post-switch state.
    pub async fn switch_server(&self, profile: ServerProfile) -> Result<()> {
        profile
            .validate()
            .map_err(|e| CoreError::InvalidServer(e.to_string()))?;
        let server_id = profile.id.clone();
        let previous = self.inner.server.set_active(Some(profile));
        info!(
            server_id,
            previous = previous.map(|p| p.id).as_deref(),
            "Switching active server"
        );

        self.invalidate_all().await;
        self.emit(CoreEvent::Server(ServerEvent::Switched { server_id }));
        Ok(())
    }

    /// Drop the active server. Subsequent fetches fail fast as unconfigured.
    pub async fn clear_server(&self) {
        self.inner.server.set_active(None);
        self.invalidate_all().await;
        self.emit(CoreEvent::Server(ServerEvent::Cleared));
    }

    /// Change (or clear) a tab's default saved filter and re-resolve that
    /// tab. Other tabs keep their state.
    pub async fn set_default_filter(&self, tab: FilterTab, filter_id: Option<String>) {
        self.inner
            .filter_settings
            .set_default_filter(tab, filter_id.clone());
        self.coordinator_invalidate(tab).await;
        self.emit(CoreEvent::Filter(FilterEvent::DefaultChanged {
            tab,
            filter_id,
        }));
    }

    /// Reset every loader, coordinator, and saved filter store.
    pub async fn invalidate_all(&self) {
        debug!("Invalidating all catalog state");
        self.inner.scenes.invalidate().await;
        self.inner.performers.invalidate().await;
        self.inner.studios.invalidate().await;
        self.inner.tags.invalidate().await;
        self.inner.galleries.invalidate().await;
    }

    async fn coordinator_invalidate(&self, tab: FilterTab) {
        match tab {
            FilterTab::Scenes => self.inner.scenes.coordinator.invalidate().await,
            FilterTab::Performers => self.inner.performers.coordinator.invalidate().await,
            FilterTab::Studios => self.inner.studios.coordinator.invalidate().await,
            FilterTab::Tags => self.inner.tags.coordinator.invalidate().await,
            FilterTab::Galleries => self.inner.galleries.coordinator.invalidate().await,
        }
    }

    fn emit(&self, event: CoreEvent) {
        if self.inner.event_bus.emit(event).is_err() {
            debug!("No event subscribers");
        }
    }

    /// React to events emitted by other holders of the bus: an externally
    /// announced server switch invalidates everything, an externally changed
    /// default filter re-resolves its tab. A lagged receiver cannot know
    /// what it missed, so it also invalidates everything.
    pub fn spawn_event_listener(&self) -> JoinHandle<()> {
        let service = self.clone();
        let mut rx = self.inner.event_bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(CoreEvent::Server(event)) => {
                        debug!(?event, "Server event");
                        service.invalidate_all().await;
                    }
                    Ok(CoreEvent::Filter(FilterEvent::DefaultChanged { tab, .. })) => {
                        service.coordinator_invalidate(tab).await;
                    }
                    Err(core_runtime::events::RecvError::Lagged(missed)) => {
                        warn!(missed, "Event receiver lagged; invalidating");
                        service.invalidate_all().await;
                    }
                    Err(core_runtime::events::RecvError::Closed) => break,
                }
            }
        })
    }
}
