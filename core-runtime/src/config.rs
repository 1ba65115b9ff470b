//! # Core Configuration Module
//!
//! Configuration management for the media catalog client core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`CoreConfig`] instance holding the dependencies and settings the core
//! needs. It enforces fail-fast validation so a missing HTTP bridge is
//! reported at startup rather than on the first request.
//!
//! The active server is deliberately NOT baked into any component at
//! construction time. Components hold a [`ServerConfig`] handle and read it
//! at call time, so a server switch is reflected in the next request without
//! retroactively changing an in-flight one.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, ServerProfile};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .http_client(Arc::new(MyHttpClient))
//!     .active_server(ServerProfile::new("home", "Home", "https://stash.local:9999"))
//!     .page_size(20)
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use bridge_traits::HttpClient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Default number of items requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Browsing tabs the client exposes, one per entity kind.
///
/// Used to key default-saved-filter settings and to scope filter-change
/// notifications to a single tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterTab {
    Scenes,
    Performers,
    Studios,
    Tags,
    Galleries,
}

impl FilterTab {
    /// All tabs, in display order.
    pub const ALL: [FilterTab; 5] = [
        FilterTab::Scenes,
        FilterTab::Performers,
        FilterTab::Studios,
        FilterTab::Tags,
        FilterTab::Galleries,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterTab::Scenes => "scenes",
            FilterTab::Performers => "performers",
            FilterTab::Studios => "studios",
            FilterTab::Tags => "tags",
            FilterTab::Galleries => "galleries",
        }
    }
}

impl std::fmt::Display for FilterTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured remote catalog server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerProfile {
    /// Stable identifier for the profile.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Base URL, e.g. `https://stash.local:9999`.
    pub base_url: String,
    /// Credential attached to every request, if the server requires one.
    pub api_key: Option<String>,
}

impl ServerProfile {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_url: base_url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// The query endpoint for this server.
    pub fn graphql_url(&self) -> String {
        format!("{}/graphql", self.base_url.trim_end_matches('/'))
    }

    /// Validate the profile fields.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::Config("Server profile id must not be empty".into()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Server base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        Ok(())
    }
}

/// Process-wide active-server handle.
///
/// Single writer at a time; every transport call reads the active profile at
/// call time. The lock is never held across an await point.
#[derive(Clone, Default)]
pub struct ServerConfig {
    inner: Arc<RwLock<Option<ServerProfile>>>,
}

impl ServerConfig {
    /// Create a handle with no server configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle with an initial active profile.
    pub fn with_profile(profile: ServerProfile) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(profile))),
        }
    }

    /// Snapshot of the currently active profile, if any.
    pub fn active(&self) -> Option<ServerProfile> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Whether any server is currently configured.
    pub fn is_configured(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Replace the active profile. Returns the previous one, if any.
    pub fn set_active(&self, profile: Option<ServerProfile>) -> Option<ServerProfile> {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, profile)
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("active", &self.active().map(|p| p.id))
            .finish()
    }
}

/// Per-tab default saved-filter ids.
///
/// The coordinator consults this before constructing a loader for a tab; a
/// configured id means the loader must wait for the saved-filter collection
/// to resolve that id (or finish loading without it) first.
#[derive(Clone, Default)]
pub struct DefaultFilterSettings {
    inner: Arc<RwLock<HashMap<FilterTab, String>>>,
}

impl DefaultFilterSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default saved-filter id configured for a tab, if any.
    pub fn default_filter_id(&self, tab: FilterTab) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&tab)
            .cloned()
    }

    /// Set or clear the default saved-filter id for a tab.
    pub fn set_default_filter(&self, tab: FilterTab, filter_id: Option<String>) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match filter_id {
            Some(id) => {
                guard.insert(tab, id);
            }
            None => {
                guard.remove(&tab);
            }
        }
    }
}

impl std::fmt::Debug for DefaultFilterSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f.debug_struct("DefaultFilterSettings")
            .field("configured_tabs", &guard.len())
            .finish()
    }
}

/// Core configuration for the media catalog client.
///
/// Use [`CoreConfig::builder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// HTTP client used for all transport calls (required).
    pub http_client: Arc<dyn HttpClient>,
    /// Active-server handle, read at call time by the transport.
    pub server: ServerConfig,
    /// Per-tab default saved-filter ids.
    pub filter_settings: DefaultFilterSettings,
    /// Items requested per page by paginated loaders.
    pub page_size: u32,
    /// Event bus buffer size.
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("http_client", &"HttpClient { ... }")
            .field("server", &self.server)
            .field("page_size", &self.page_size)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validate settings that the builder could not check structurally.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be at least 1".into()));
        }
        if let Some(profile) = self.server.active() {
            profile.validate()?;
        }
        Ok(())
    }
}

/// Builder for [`CoreConfig`] with fail-fast validation.
#[derive(Default)]
pub struct CoreConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    server: Option<ServerConfig>,
    filter_settings: Option<DefaultFilterSettings>,
    page_size: Option<u32>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Set the HTTP client bridge (required).
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Provide an existing active-server handle.
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Convenience: configure an initial active server profile.
    pub fn active_server(mut self, profile: ServerProfile) -> Self {
        self.server = Some(ServerConfig::with_profile(profile));
        self
    }

    /// Provide default saved-filter settings.
    pub fn filter_settings(mut self, settings: DefaultFilterSettings) -> Self {
        self.filter_settings = Some(settings);
        self
    }

    /// Items requested per page (default [`DEFAULT_PAGE_SIZE`]).
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Event bus buffer size.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::CapabilityMissing` when no HTTP client was provided,
    /// or `Error::Config` when a setting is out of range.
    pub fn build(self) -> Result<CoreConfig> {
        let http_client = self.http_client.ok_or_else(|| Error::CapabilityMissing {
            capability: "HttpClient".to_string(),
            message: "No HTTP client implementation provided. \
                      Desktop: use bridge_desktop::ReqwestHttpClient. \
                      Tests: inject a mock."
                .to_string(),
        })?;

        let config = CoreConfig {
            http_client,
            server: self.server.unwrap_or_default(),
            filter_settings: self.filter_settings.unwrap_or_default(),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(crate::events::DEFAULT_EVENT_BUFFER_SIZE),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::http::{HttpRequest, HttpResponse};

    struct NullHttpClient;

    #[async_trait]
    impl HttpClient for NullHttpClient {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> bridge_traits::error::Result<HttpResponse> {
            Err(bridge_traits::BridgeError::NotAvailable(
                "null client".into(),
            ))
        }
    }

    #[test]
    fn test_graphql_url_trims_trailing_slash() {
        let profile = ServerProfile::new("s1", "Home", "https://stash.local:9999/");
        assert_eq!(profile.graphql_url(), "https://stash.local:9999/graphql");
    }

    #[test]
    fn test_profile_validation_rejects_bad_url() {
        let profile = ServerProfile::new("s1", "Home", "stash.local");
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_server_config_switch() {
        let config = ServerConfig::new();
        assert!(!config.is_configured());

        let previous =
            config.set_active(Some(ServerProfile::new("s1", "A", "http://a.example")));
        assert!(previous.is_none());
        assert_eq!(config.active().unwrap().id, "s1");

        let previous =
            config.set_active(Some(ServerProfile::new("s2", "B", "http://b.example")));
        assert_eq!(previous.unwrap().id, "s1");
        assert_eq!(config.active().unwrap().id, "s2");
    }

    #[test]
    fn test_default_filter_settings_roundtrip() {
        let settings = DefaultFilterSettings::new();
        assert_eq!(settings.default_filter_id(FilterTab::Tags), None);

        settings.set_default_filter(FilterTab::Tags, Some("F1".into()));
        assert_eq!(
            settings.default_filter_id(FilterTab::Tags),
            Some("F1".to_string())
        );
        // Other tabs unaffected.
        assert_eq!(settings.default_filter_id(FilterTab::Scenes), None);

        settings.set_default_filter(FilterTab::Tags, None);
        assert_eq!(settings.default_filter_id(FilterTab::Tags), None);
    }

    #[test]
    fn test_builder_requires_http_client() {
        let result = CoreConfig::builder().build();
        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { .. })
        ));
    }

    #[test]
    fn test_builder_defaults() {
        let config = CoreConfig::builder()
            .http_client(Arc::new(NullHttpClient))
            .build()
            .unwrap();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(!config.server.is_configured());
    }

    #[test]
    fn test_builder_rejects_zero_page_size() {
        let result = CoreConfig::builder()
            .http_client(Arc::new(NullHttpClient))
            .page_size(0)
            .build();
        assert!(result.is_err());
    }
}
