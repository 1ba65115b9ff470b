//! Query descriptors for paginated entity lists.
//!
//! A [`ListRequest`] is the immutable tuple of parameters identifying one
//! logical paginated query. Changing any field produces a new descriptor;
//! a live request is never mutated, which is what lets the loader discard
//! stale responses by generation instead of trying to patch them in.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Sort direction as the wire protocol spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Asc
    }
}

/// Wire-side pagination/sort/search block shared by every list query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindFilter {
    pub page: u32,
    pub per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    pub direction: SortDirection,
}

/// Immutable descriptor of one logical paginated query.
///
/// `page` is 1-indexed, matching the remote protocol. The descriptor is a
/// value: `with_*` builders return a new descriptor and leave the original
/// untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub page: u32,
    pub per_page: u32,
    pub sort: Option<String>,
    pub direction: SortDirection,
    pub search: Option<String>,
    /// A saved filter's opaque payload. When present it wins outright over
    /// `search`; the search-derived clause is replaced, not merged.
    pub filter_override: Option<Value>,
}

impl ListRequest {
    pub fn new(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page,
            sort: None,
            direction: SortDirection::default(),
            search: None,
            filter_override: None,
        }
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    pub fn with_per_page(&self, per_page: u32) -> Self {
        Self {
            per_page,
            ..self.clone()
        }
    }

    pub fn with_sort(&self, sort: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            sort: Some(sort.into()),
            direction,
            ..self.clone()
        }
    }

    pub fn with_search(&self, search: impl Into<String>) -> Self {
        let search = search.into();
        Self {
            search: if search.is_empty() { None } else { Some(search) },
            ..self.clone()
        }
    }

    pub fn with_filter_override(&self, payload: Option<Value>) -> Self {
        Self {
            filter_override: payload,
            ..self.clone()
        }
    }

    /// The pagination/sort block for the wire request.
    pub fn find_filter(&self) -> FindFilter {
        FindFilter {
            page: self.page,
            per_page: self.per_page,
            sort: self.sort.clone(),
            direction: self.direction,
        }
    }

    /// The entity-specific filter clause for the wire request.
    ///
    /// `text_field` is the entity's primary name/title field. Free-text
    /// search becomes a text-contains clause on it; a saved filter's payload
    /// replaces that clause entirely.
    pub fn entity_filter(&self, text_field: &str) -> Option<Value> {
        if let Some(payload) = &self.filter_override {
            return Some(payload.clone());
        }
        self.search.as_ref().map(|q| {
            json!({
                text_field: {
                    "value": q,
                    "modifier": "CONTAINS",
                }
            })
        })
    }
}
