//! Entity records returned by the remote catalog server.
//!
//! These types mirror the wire shape of the query protocol closely enough
//! for serde to decode them directly out of the response envelope. Fields
//! the presentation layer never reads are omitted rather than modeled.

use chrono::NaiveDate;
use core_runtime::FilterTab;
use serde::{Deserialize, Serialize};

/// An entity the paginated loader can hold.
///
/// The id is used to deduplicate appended pages; servers can return an item
/// on two adjacent pages when the underlying collection mutates between
/// requests.
pub trait CatalogEntity: Clone + Send + Sync + 'static {
    fn entity_id(&self) -> &str;
}

/// Lightweight reference to a studio embedded in other entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioRef {
    pub id: String,
    pub name: String,
}

/// Lightweight reference to a performer embedded in other entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformerRef {
    pub id: String,
    pub name: String,
}

/// Lightweight reference to a tag embedded in other entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: String,
    pub name: String,
}

/// A scene in the remote catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Rating on a 0-100 scale, if rated.
    #[serde(default)]
    pub rating100: Option<i32>,
    #[serde(default)]
    pub o_counter: Option<i32>,
    #[serde(default)]
    pub play_count: Option<i32>,
    #[serde(default)]
    pub studio: Option<StudioRef>,
    #[serde(default)]
    pub performers: Vec<PerformerRef>,
    #[serde(default)]
    pub tags: Vec<TagRef>,
}

impl Scene {
    /// Display title, falling back to the date when untitled.
    pub fn display_title(&self) -> String {
        match (&self.title, &self.date) {
            (Some(title), _) if !title.is_empty() => title.clone(),
            (_, Some(date)) => date.to_string(),
            _ => format!("Scene {}", self.id),
        }
    }
}

impl CatalogEntity for Scene {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

/// A performer in the remote catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub disambiguation: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub rating100: Option<i32>,
    #[serde(default)]
    pub scene_count: Option<i64>,
    #[serde(default)]
    pub image_path: Option<String>,
}

impl CatalogEntity for Performer {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

/// A studio in the remote catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Studio {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub rating100: Option<i32>,
    #[serde(default)]
    pub scene_count: Option<i64>,
    #[serde(default)]
    pub image_path: Option<String>,
}

impl CatalogEntity for Studio {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

/// A tag in the remote catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub scene_count: Option<i64>,
}

impl CatalogEntity for Tag {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

/// A gallery in the remote catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gallery {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub image_count: Option<i64>,
    #[serde(default)]
    pub studio: Option<StudioRef>,
    #[serde(default)]
    pub performers: Vec<PerformerRef>,
}

impl CatalogEntity for Gallery {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

/// The entity kind a saved filter applies to, as the wire protocol spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterMode {
    #[serde(rename = "SCENES")]
    Scenes,
    #[serde(rename = "PERFORMERS")]
    Performers,
    #[serde(rename = "STUDIOS")]
    Studios,
    #[serde(rename = "TAGS")]
    Tags,
    #[serde(rename = "GALLERIES")]
    Galleries,
}

impl From<FilterTab> for FilterMode {
    fn from(tab: FilterTab) -> Self {
        match tab {
            FilterTab::Scenes => FilterMode::Scenes,
            FilterTab::Performers => FilterMode::Performers,
            FilterTab::Studios => FilterMode::Studios,
            FilterTab::Tags => FilterMode::Tags,
            FilterTab::Galleries => FilterMode::Galleries,
        }
    }
}

/// Sort and search parameters stored inside a saved filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SavedFindFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<crate::query::SortDirection>,
}

/// A server-stored, named, reusable filter definition.
///
/// The structured filter payload (`object_filter`) is deliberately opaque:
/// the remote filter grammar is open-ended, so it is carried as an untyped
/// document and passed back to the server verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFilter {
    pub id: String,
    pub name: String,
    pub mode: FilterMode,
    #[serde(default)]
    pub find_filter: Option<SavedFindFilter>,
    #[serde(default)]
    pub object_filter: Option<serde_json::Value>,
}
