//! Entity repositories for the remote catalog.
//!
//! One repository per entity kind. Each translates a [`ListRequest`] into
//! transport variables (pagination block plus an entity filter clause) and
//! decodes the transport result into a typed page. Reads propagate the
//! transport's error classification unchanged; mutations swallow transport
//! detail and report pass/fail (plus the new value where the server returns
//! one).

pub mod gallery;
pub mod pagination;
pub mod performer;
pub mod saved_filter;
pub mod scene;
pub mod studio;
pub mod tag;

pub use gallery::GraphQlGalleryRepository;
pub use pagination::PageOf;
pub use performer::GraphQlPerformerRepository;
pub use saved_filter::{GraphQlSavedFilterRepository, SavedFilterSource};
pub use scene::GraphQlSceneRepository;
pub use studio::GraphQlStudioRepository;
pub use tag::GraphQlTagRepository;

use crate::error::Result;
use crate::models::CatalogEntity;
use crate::query::ListRequest;
use async_trait::async_trait;

/// Common read surface every entity repository implements.
///
/// The paginated loader binds to this trait (through a page source) so it
/// stays generic over entity kinds.
#[async_trait]
pub trait EntityRepository: Send + Sync + 'static {
    type Entity: CatalogEntity;

    /// Fetch one page matching the descriptor.
    async fn find_page(&self, request: &ListRequest) -> Result<PageOf<Self::Entity>>;

    /// Fetch one entity by id. `Ok(None)` when the server has no such id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Self::Entity>>;
}
