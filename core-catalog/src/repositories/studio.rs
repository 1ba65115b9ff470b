//! Studio repository.

use crate::error::Result;
use crate::models::Studio;
use crate::query::ListRequest;
use crate::repositories::{EntityRepository, PageOf};
use crate::transport::GraphQlClient;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub mod sort {
    pub const NAME: &str = "name";
    pub const RATING: &str = "rating";
    pub const SCENE_COUNT: &str = "scenes_count";
}

const STUDIO_FIELDS: &str = r#"
    id
    name
    details
    rating100
    scene_count
    image_path
"#;

fn find_studios_document() -> String {
    format!(
        r#"query FindStudios($filter: FindFilterType, $studio_filter: StudioFilterType) {{
            findStudios(filter: $filter, studio_filter: $studio_filter) {{
                count
                studios {{ {fields} }}
            }}
        }}"#,
        fields = STUDIO_FIELDS
    )
}

fn find_studio_document() -> String {
    format!(
        r#"query FindStudio($id: ID!) {{
            findStudio(id: $id) {{ {fields} }}
        }}"#,
        fields = STUDIO_FIELDS
    )
}

#[derive(Deserialize)]
struct FindStudiosData {
    #[serde(rename = "findStudios")]
    find_studios: FindStudiosResult,
}

#[derive(Deserialize)]
struct FindStudiosResult {
    count: u64,
    studios: Vec<Studio>,
}

#[derive(Deserialize)]
struct FindStudioData {
    #[serde(rename = "findStudio")]
    find_studio: Option<Studio>,
}

pub struct GraphQlStudioRepository {
    transport: Arc<GraphQlClient>,
}

impl GraphQlStudioRepository {
    pub fn new(transport: Arc<GraphQlClient>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl EntityRepository for GraphQlStudioRepository {
    type Entity = Studio;

    async fn find_page(&self, request: &ListRequest) -> Result<PageOf<Studio>> {
        let variables = json!({
            "filter": request.find_filter(),
            "studio_filter": request.entity_filter("name"),
        });
        let data: FindStudiosData = self
            .transport
            .execute(&find_studios_document(), variables)
            .await?;
        Ok(PageOf::new(
            data.find_studios.studios,
            data.find_studios.count,
        ))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Studio>> {
        let data: FindStudioData = self
            .transport
            .execute(&find_studio_document(), json!({"id": id}))
            .await?;
        Ok(data.find_studio)
    }
}
