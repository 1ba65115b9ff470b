//! Gallery repository.

use crate::error::Result;
use crate::models::Gallery;
use crate::query::ListRequest;
use crate::repositories::{EntityRepository, PageOf};
use crate::transport::GraphQlClient;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub mod sort {
    pub const TITLE: &str = "title";
    pub const DATE: &str = "date";
    pub const IMAGE_COUNT: &str = "images_count";
}

const GALLERY_FIELDS: &str = r#"
    id
    title
    date
    image_count
    studio { id name }
    performers { id name }
"#;

fn find_galleries_document() -> String {
    format!(
        r#"query FindGalleries($filter: FindFilterType, $gallery_filter: GalleryFilterType) {{
            findGalleries(filter: $filter, gallery_filter: $gallery_filter) {{
                count
                galleries {{ {fields} }}
            }}
        }}"#,
        fields = GALLERY_FIELDS
    )
}

fn find_gallery_document() -> String {
    format!(
        r#"query FindGallery($id: ID!) {{
            findGallery(id: $id) {{ {fields} }}
        }}"#,
        fields = GALLERY_FIELDS
    )
}

#[derive(Deserialize)]
struct FindGalleriesData {
    #[serde(rename = "findGalleries")]
    find_galleries: FindGalleriesResult,
}

#[derive(Deserialize)]
struct FindGalleriesResult {
    count: u64,
    galleries: Vec<Gallery>,
}

#[derive(Deserialize)]
struct FindGalleryData {
    #[serde(rename = "findGallery")]
    find_gallery: Option<Gallery>,
}

pub struct GraphQlGalleryRepository {
    transport: Arc<GraphQlClient>,
}

impl GraphQlGalleryRepository {
    pub fn new(transport: Arc<GraphQlClient>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl EntityRepository for GraphQlGalleryRepository {
    type Entity = Gallery;

    async fn find_page(&self, request: &ListRequest) -> Result<PageOf<Gallery>> {
        let variables = json!({
            "filter": request.find_filter(),
            "gallery_filter": request.entity_filter("title"),
        });
        let data: FindGalleriesData = self
            .transport
            .execute(&find_galleries_document(), variables)
            .await?;
        Ok(PageOf::new(
            data.find_galleries.galleries,
            data.find_galleries.count,
        ))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Gallery>> {
        let data: FindGalleryData = self
            .transport
            .execute(&find_gallery_document(), json!({"id": id}))
            .await?;
        Ok(data.find_gallery)
    }
}
