//! Tag repository.

use crate::error::Result;
use crate::models::Tag;
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
    pub const SCENE_COUNT: &str = "scenes_count";
}

const TAG_FIELDS: &str = r#"
    id
    name
    description
    favorite
    scene_count
"#;

fn find_tags_document() -> String {
    format!(
        r#"query FindTags($filter: FindFilterType, $tag_filter: TagFilterType) {{
            findTags(filter: $filter, tag_filter: $tag_filter) {{
                count
                tags {{ {fields} }}
            }}
        }}"#,
        fields = TAG_FIELDS
    )
}

fn find_tag_document() -> String {
    format!(
        r#"query FindTag($id: ID!) {{
            findTag(id: $id) {{ {fields} }}
        }}"#,
        fields = TAG_FIELDS
    )
}

const TAG_UPDATE_FAVORITE: &str = r#"mutation TagUpdateFavorite($id: ID!, $favorite: Boolean!) {
    tagUpdate(input: { id: $id, favorite: $favorite }) { id }
}"#;

#[derive(Deserialize)]
struct FindTagsData {
    #[serde(rename = "findTags")]
    find_tags: FindTagsResult,
}

#[derive(Deserialize)]
struct FindTagsResult {
    count: u64,
    tags: Vec<Tag>,
}

#[derive(Deserialize)]
struct FindTagData {
    #[serde(rename = "findTag")]
    find_tag: Option<Tag>,
}

#[derive(Deserialize)]
struct TagUpdateData {
    #[serde(rename = "tagUpdate")]
    tag_update: Option<serde_json::Value>,
}

pub struct GraphQlTagRepository {
    transport: Arc<GraphQlClient>,
}

impl GraphQlTagRepository {
    pub fn new(transport: Arc<GraphQlClient>) -> Self {
        Self { transport }
    }

    /// Toggle the favorite flag. Pass/fail only.
    pub async fn set_favorite(&self, id: &str, favorite: bool) -> bool {
        let result: Result<TagUpdateData> = self
            .transport
            .execute(TAG_UPDATE_FAVORITE, json!({"id": id, "favorite": favorite}))
            .await;
        match result {
            Ok(data) => data.tag_update.is_some(),
            Err(err) => {
                warn!(tag_id = id, error = %err, "Tag favorite update failed");
                false
            }
        }
    }
}

#[async_trait]
impl EntityRepository for GraphQlTagRepository {
    type Entity = Tag;

    async fn find_page(&self, request: &ListRequest) -> Result<PageOf<Tag>> {
        let variables = json!({
            "filter": request.find_filter(),
            "tag_filter": request.entity_filter("name"),
        });
        let data: FindTagsData = self
            .transport
            .execute(&find_tags_document(), variables)
            .await?;
        Ok(PageOf::new(data.find_tags.tags, data.find_tags.count))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Tag>> {
        let data: FindTagData = self
            .transport
            .execute(&find_tag_document(), json!({"id": id}))
            .await?;
        Ok(data.find_tag)
    }
}
