//! Scene repository.

use crate::error::Result;
use crate::models::Scene;
use crate::query::ListRequest;
use crate::repositories::{EntityRepository, PageOf};
use crate::transport::GraphQlClient;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Sort keys the scene list understands.
pub mod sort {
    pub const TITLE: &str = "title";
    pub const DATE: &str = "date";
    pub const RATING: &str = "rating";
    pub const O_COUNTER: &str = "o_counter";
    pub const PLAY_COUNT: &str = "play_count";
    pub const CREATED_AT: &str = "created_at";
}

const SCENE_FIELDS: &str = r#"
    id
    title
    details
    date
    rating100
    o_counter
    play_count
    studio { id name }
    performers { id name }
    tags { id name }
"#;

fn find_scenes_document() -> String {
    format!(
        r#"query FindScenes($filter: FindFilterType, $scene_filter: SceneFilterType) {{
            findScenes(filter: $filter, scene_filter: $scene_filter) {{
                count
                scenes {{ {fields} }}
            }}
        }}"#,
        fields = SCENE_FIELDS
    )
}

fn find_scene_document() -> String {
    format!(
        r#"query FindScene($id: ID!) {{
            findScene(id: $id) {{ {fields} }}
        }}"#,
        fields = SCENE_FIELDS
    )
}

const SCENE_UPDATE_RATING: &str = r#"mutation SceneUpdateRating($id: ID!, $rating100: Int) {
    sceneUpdate(input: { id: $id, rating100: $rating100 }) { id }
}"#;

const SCENE_INCREMENT_O: &str = r#"mutation SceneIncrementO($id: ID!) {
    sceneIncrementO(id: $id)
}"#;

const SCENE_ADD_PLAY: &str = r#"mutation SceneAddPlay($id: ID!) {
    sceneAddPlay(id: $id) { count }
}"#;

#[derive(Deserialize)]
struct FindScenesData {
    #[serde(rename = "findScenes")]
    find_scenes: FindScenesResult,
}

#[derive(Deserialize)]
struct FindScenesResult {
    count: u64,
    scenes: Vec<Scene>,
}

#[derive(Deserialize)]
struct FindSceneData {
    #[serde(rename = "findScene")]
    find_scene: Option<Scene>,
}

#[derive(Deserialize)]
struct SceneUpdateData {
    #[serde(rename = "sceneUpdate")]
    scene_update: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct SceneIncrementOData {
    #[serde(rename = "sceneIncrementO")]
    new_value: i32,
}

#[derive(Deserialize)]
struct SceneAddPlayData {
    #[serde(rename = "sceneAddPlay")]
    result: PlayCount,
}

#[derive(Deserialize)]
struct PlayCount {
    count: i32,
}

/// GraphQL-backed scene repository.
pub struct GraphQlSceneRepository {
    transport: Arc<GraphQlClient>,
}

impl GraphQlSceneRepository {
    pub fn new(transport: Arc<GraphQlClient>) -> Self {
        Self { transport }
    }

    /// Set or clear a scene's rating. Pass/fail only; transport detail is
    /// logged, not surfaced.
    pub async fn set_rating(&self, id: &str, rating100: Option<i32>) -> bool {
        let result: Result<SceneUpdateData> = self
            .transport
            .execute(
                SCENE_UPDATE_RATING,
                json!({"id": id, "rating100": rating100}),
            )
            .await;
        match result {
            Ok(data) => data.scene_update.is_some(),
            Err(err) => {
                warn!(scene_id = id, error = %err, "Scene rating update failed");
                false
            }
        }
    }

    /// Increment the o-counter, returning the new value on success.
    pub async fn increment_o_counter(&self, id: &str) -> Option<i32> {
        let result: Result<SceneIncrementOData> = self
            .transport
            .execute(SCENE_INCREMENT_O, json!({"id": id}))
            .await;
        match result {
            Ok(data) => Some(data.new_value),
            Err(err) => {
                warn!(scene_id = id, error = %err, "O-counter increment failed");
                None
            }
        }
    }

    /// Record a play, returning the new play count on success.
    pub async fn add_play(&self, id: &str) -> Option<i32> {
        let result: Result<SceneAddPlayData> = self
            .transport
            .execute(SCENE_ADD_PLAY, json!({"id": id}))
            .await;
        match result {
            Ok(data) => Some(data.result.count),
            Err(err) => {
                warn!(scene_id = id, error = %err, "Play count increment failed");
                None
            }
        }
    }
}

#[async_trait]
impl EntityRepository for GraphQlSceneRepository {
    type Entity = Scene;

    async fn find_page(&self, request: &ListRequest) -> Result<PageOf<Scene>> {
        let variables = json!({
            "filter": request.find_filter(),
            "scene_filter": request.entity_filter("title"),
        });
        let data: FindScenesData = self
            .transport
            .execute(&find_scenes_document(), variables)
            .await?;
        Ok(PageOf::new(
            data.find_scenes.scenes,
            data.find_scenes.count,
        ))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Scene>> {
        let data: FindSceneData = self
            .transport
            .execute(&find_scene_document(), json!({"id": id}))
            .await?;
        Ok(data.find_scene)
    }
}
