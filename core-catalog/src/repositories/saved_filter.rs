//! Saved filter repository.
//!
//! Saved filters are server-side named filter presets, scoped per entity
//! mode. The list query is the only read the catalog needs; presets are
//! created and edited elsewhere.

use crate::error::Result;
use crate::models::{FilterMode, SavedFilter};
use crate::transport::GraphQlClient;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const FIND_SAVED_FILTERS: &str = r#"query FindSavedFilters($mode: FilterMode) {
    findSavedFilters(mode: $mode) {
        id
        name
        mode
        find_filter { q sort direction }
        object_filter
    }
}"#;

#[derive(Deserialize)]
struct FindSavedFiltersData {
    #[serde(rename = "findSavedFilters")]
    find_saved_filters: Vec<SavedFilter>,
}

/// Fetches the saved filter collection for one entity mode.
#[async_trait]
pub trait SavedFilterSource: Send + Sync + 'static {
    async fn list(&self, mode: FilterMode) -> Result<Vec<SavedFilter>>;
}

pub struct GraphQlSavedFilterRepository {
    transport: Arc<GraphQlClient>,
}

impl GraphQlSavedFilterRepository {
    pub fn new(transport: Arc<GraphQlClient>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl SavedFilterSource for GraphQlSavedFilterRepository {
    async fn list(&self, mode: FilterMode) -> Result<Vec<SavedFilter>> {
        let data: FindSavedFiltersData = self
            .transport
            .execute(FIND_SAVED_FILTERS, json!({"mode": mode}))
            .await?;
        Ok(data.find_saved_filters)
    }
}
