//! # Catalog Core
//!
//! The data-fetching and caching core of the media catalog client. It turns
//! a declarative "give me page N of entity X, sorted/filtered/searched this
//! way" request into transport calls, manages incremental loading state,
//! deduplicates concurrent requests, and keeps cached results consistent
//! across configuration changes.
//!
//! ## Components
//!
//! - [`transport`]: executes named query/mutation documents against the
//!   active server and classifies failures.
//! - [`repositories`]: one repository per entity kind translating list
//!   requests into transport variables and decoding typed pages.
//! - [`loader`]: the generic paginated loading state machine.
//! - [`filters`]: saved-filter resolution so a tab's default filter is known
//!   before its first query is issued.
//! - [`cache`]: keyed loader reuse across screen visits.
//!
//! ## Data flow
//!
//! A screen requests a list for a key → the cache returns an existing loader
//! or the coordinator builds one bound to a repository → the loader calls
//! the transport through the repository → results update loader state → the
//! UI derives `items`, `is_loading`, `has_more` from a state snapshot.

pub mod cache;
pub mod error;
pub mod filters;
pub mod loader;
pub mod models;
pub mod query;
pub mod repositories;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::{CacheKey, LoaderCache};
pub use error::{CatalogError, Result};
pub use filters::{FilterCoordinator, SavedFilterStore};
pub use loader::{LoaderSnapshot, PagedLoader, PageSource, RepositoryPageSource};
pub use models::{CatalogEntity, FilterMode, Gallery, Performer, SavedFilter, Scene, Studio, Tag};
pub use query::{ListRequest, SortDirection};
pub use transport::GraphQlClient;
