//! Shared test fixtures: a mockall-backed HTTP client and canned responses.

use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_runtime::{ServerConfig, ServerProfile};
use mockall::mock;
use std::collections::HashMap;

mock! {
    pub Http {}

    #[async_trait::async_trait]
    impl HttpClient for Http {
        async fn execute(
            &self,
            request: HttpRequest,
        ) -> bridge_traits::error::Result<HttpResponse>;
    }
}

pub fn json_response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: HashMap::new(),
        body: Bytes::from(body.to_string()),
    }
}

pub fn configured_server() -> ServerConfig {
    ServerConfig::with_profile(
        ServerProfile::new("s1", "Home", "https://stash.local:9999").with_api_key("k3y"),
    )
}

/// The variables object a request body carries, for asserting on wire shape.
pub fn request_variables(request: &HttpRequest) -> serde_json::Value {
    let body = request.body.as_ref().expect("request should have a body");
    let envelope: serde_json::Value = serde_json::from_slice(body).expect("body should be JSON");
    envelope["variables"].clone()
}

/// The query document a request body carries.
pub fn request_document(request: &HttpRequest) -> String {
    let body = request.body.as_ref().expect("request should have a body");
    let envelope: serde_json::Value = serde_json::from_slice(body).expect("body should be JSON");
    envelope["query"].as_str().unwrap_or_default().to_string()
}
