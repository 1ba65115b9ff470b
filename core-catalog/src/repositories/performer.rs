//! Performer repository.

use crate::error::Result;
use crate::models::Performer;
use crate::query::ListRequest;
use crate::repositories::{EntityRepository, PageOf};
use crate::transport::GraphQlClient;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

pub mod sort {
    pub const NAME: &str = "name";
    pub const RATING: &str = "rating";
    pub const SCENE_COUNT: &str = "scenes_count";
    pub const CREATED_AT: &str = "created_at";
}

const PERFORMER_FIELDS: &str = r#"
    id
    name
    disambiguation
    favorite
    rating100
    scene_count
    image_path
"#;

fn find_performers_document() -> String {
    format!(
        r#"query FindPerformers($filter: FindFilterType, $performer_filter: PerformerFilterType) {{
            findPerformers(filter: $filter, performer_filter: $performer_filter) {{
                count
                performers {{ {fields} }}
            }}
        }}"#,
        fields = PERFORMER_FIELDS
    )
}

fn find_performer_document() -> String {
    format!(
        r#"query FindPerformer($id: ID!) {{
            findPerformer(id: $id) {{ {fields} }}
        }}"#,
        fields = PERFORMER_FIELDS
    )
}

const PERFORMER_UPDATE_FAVORITE: &str =
    r#"mutation PerformerUpdateFavorite($id: ID!, $favorite: Boolean!) {
    performerUpdate(input: { id: $id, favorite: $favorite }) { id }
}"#;

#[derive(Deserialize)]
struct FindPerformersData {
    #[serde(rename = "findPerformers")]
    find_performers: FindPerformersResult,
}

#[derive(Deserialize)]
struct FindPerformersResult {
    count: u64,
    performers: Vec<Performer>,
}

#[derive(Deserialize)]
struct FindPerformerData {
    #[serde(rename = "findPerformer")]
    find_performer: Option<Performer>,
}

#[derive(Deserialize)]
struct PerformerUpdateData {
    #[serde(rename = "performerUpdate")]
    performer_update: Option<serde_json::Value>,
}

pub struct GraphQlPerformerRepository {
    transport: Arc<GraphQlClient>,
}

impl GraphQlPerformerRepository {
    pub fn new(transport: Arc<GraphQlClient>) -> Self {
        Self { transport }
    }

    /// Toggle the favorite flag. Pass/fail only.
    pub async fn set_favorite(&self, id: &str, favorite: bool) -> bool {
        let result: Result<PerformerUpdateData> = self
            .transport
            .execute(
                PERFORMER_UPDATE_FAVORITE,
                json!({"id": id, "favorite": favorite}),
            )
            .await;
        match result {
            Ok(data) => data.performer_update.is_some(),
            Err(err) => {
                warn!(performer_id = id, error = %err, "Performer favorite update failed");
                false
            }
        }
    }
}

#[async_trait]
impl EntityRepository for GraphQlPerformerRepository {
    type Entity = Performer;

    async fn find_page(&self, request: &ListRequest) -> Result<PageOf<Performer>> {
        let variables = json!({
            "filter": request.find_filter(),
            "performer_filter": request.entity_filter("name"),
        });
        let data: FindPerformersData = self
            .transport
            .execute(&find_performers_document(), variables)
            .await?;
        Ok(PageOf::new(
            data.find_performers.performers,
            data.find_performers.count,
        ))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Performer>> {
        let data: FindPerformerData = self
            .transport
            .execute(&find_performer_document(), json!({"id": id}))
            .await?;
        Ok(data.find_performer)
    }
}
