//! Transport client for the remote query protocol.
//!
//! Executes a named query/mutation document with a JSON variables payload
//! against the currently active server and decodes the `{data, errors}`
//! envelope into the caller's expected shape.
//!
//! The active server is read from [`ServerConfig`] at call time, never
//! cached at construction: a server switch is reflected in the next call
//! without retroactively changing an in-flight one. When no server is
//! configured the call fails fast with [`CatalogError::NotConfigured`]
//! before any network I/O.
//!
//! Cancellation is dropping the future; a response that arrives for a
//! dropped call is simply never observed. Callers that let a stale call run
//! to completion (the loader does) discard its result by generation check.

use crate::error::{CatalogError, Result};
use bridge_traits::{
    error::BridgeError,
    http::{HttpClient, HttpMethod, HttpRequest},
};
use core_runtime::ServerConfig;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphQlEnvelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlErrorEntry>>,
}

#[derive(Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

/// Client for executing query/mutation documents against the active server.
#[derive(Clone)]
pub struct GraphQlClient {
    http: Arc<dyn HttpClient>,
    server: ServerConfig,
}

impl GraphQlClient {
    pub fn new(http: Arc<dyn HttpClient>, server: ServerConfig) -> Self {
        Self { http, server }
    }

    /// The active-server handle this client reads at call time.
    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    /// Execute a document and decode the `data` object into `T`.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotConfigured`] when no server is active
    /// - [`CatalogError::Network`] when the transport produced no response
    /// - [`CatalogError::HttpStatus`] on a non-2xx status
    /// - [`CatalogError::Protocol`] when the envelope carries an `errors`
    ///   array (even alongside partial `data`)
    /// - [`CatalogError::Decode`] when the envelope or `data` shape does
    ///   not match `T`
    pub async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        variables: Value,
    ) -> Result<T> {
        let profile = self.server.active().ok_or(CatalogError::NotConfigured)?;

        let body = GraphQlRequest {
            query: operation,
            variables,
        };
        let mut request = HttpRequest::new(HttpMethod::Post, profile.graphql_url())
            .json(&body)
            .map_err(|e| CatalogError::Decode(e.to_string()))?;
        if let Some(api_key) = &profile.api_key {
            request = request.api_key(api_key);
        }

        debug!(url = %profile.graphql_url(), "Executing catalog query");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(classify_bridge_error)?;

        if !response.is_success() {
            warn!(status = response.status, "Catalog query failed");
            return Err(CatalogError::HttpStatus {
                status: response.status,
            });
        }

        let envelope: GraphQlEnvelope = serde_json::from_slice(&response.body)
            .map_err(|e| CatalogError::Decode(format!("invalid response envelope: {}", e)))?;

        if let Some(errors) = envelope.errors {
            if !errors.is_empty() {
                let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
                warn!(count = messages.len(), "Server flagged logical errors");
                return Err(CatalogError::Protocol { messages });
            }
        }

        let data = envelope
            .data
            .ok_or_else(|| CatalogError::Decode("response envelope has no data".into()))?;
        serde_json::from_value(data)
            .map_err(|e| CatalogError::Decode(format!("unexpected data shape: {}", e)))
    }
}

fn classify_bridge_error(error: BridgeError) -> CatalogError {
    match error {
        BridgeError::Network(msg) | BridgeError::Timeout(msg) => CatalogError::Network(msg),
        BridgeError::NotAvailable(msg) => CatalogError::Network(msg),
        BridgeError::OperationFailed(msg) => CatalogError::Network(msg),
        BridgeError::Io(e) => CatalogError::Network(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{configured_server, json_response as response, MockHttp};
    use core_runtime::ServerProfile;
    use mockall::predicate::function;
    use serde_json::json;

    #[tokio::test]
    async fn test_not_configured_fails_before_io() {
        let mut http = MockHttp::new();
        http.expect_execute().times(0);

        let client = GraphQlClient::new(Arc::new(http), ServerConfig::new());
        let result: Result<Value> = client.execute("query { version }", json!({})).await;
        assert_eq!(result.unwrap_err(), CatalogError::NotConfigured);
    }

    #[tokio::test]
    async fn test_attaches_endpoint_and_api_key() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .with(function(|req: &HttpRequest| {
                req.url == "https://stash.local:9999/graphql"
                    && req.headers.get("ApiKey").map(String::as_str) == Some("k3y")
            }))
            .return_once(|_| Ok(response(200, r#"{"data":{"version":"1"}}"#)));

        let client = GraphQlClient::new(Arc::new(http), configured_server());
        let data: Value = client.execute("query { version }", json!({})).await.unwrap();
        assert_eq!(data["version"], "1");
    }

    #[tokio::test]
    async fn test_http_status_classified() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .return_once(|_| Ok(response(502, "bad gateway")));

        let client = GraphQlClient::new(Arc::new(http), configured_server());
        let result: Result<Value> = client.execute("query { version }", json!({})).await;
        assert_eq!(result.unwrap_err(), CatalogError::HttpStatus { status: 502 });
    }

    #[tokio::test]
    async fn test_protocol_errors_win_over_partial_data() {
        let mut http = MockHttp::new();
        http.expect_execute().return_once(|_| {
            Ok(response(
                200,
                r#"{"data":{"findTags":null},"errors":[{"message":"field error"}]}"#,
            ))
        });

        let client = GraphQlClient::new(Arc::new(http), configured_server());
        let result: Result<Value> = client.execute("query { findTags }", json!({})).await;
        assert_eq!(
            result.unwrap_err(),
            CatalogError::Protocol {
                messages: vec!["field error".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn test_network_failure_classified() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .return_once(|_| Err(BridgeError::Timeout("deadline elapsed".into())));

        let client = GraphQlClient::new(Arc::new(http), configured_server());
        let result: Result<Value> = client.execute("query { version }", json!({})).await;
        assert!(matches!(result.unwrap_err(), CatalogError::Network(_)));
    }

    #[tokio::test]
    async fn test_decode_failure_on_shape_mismatch() {
        #[derive(Deserialize, Debug)]
        struct Expected {
            #[allow(dead_code)]
            count: u64,
        }

        let mut http = MockHttp::new();
        http.expect_execute()
            .return_once(|_| Ok(response(200, r#"{"data":{"count":"not-a-number"}}"#)));

        let client = GraphQlClient::new(Arc::new(http), configured_server());
        let result: Result<Expected> = client.execute("query { count }", json!({})).await;
        assert!(matches!(result.unwrap_err(), CatalogError::Decode(_)));
    }

    #[tokio::test]
    async fn test_server_read_at_call_time() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .with(function(|req: &HttpRequest| {
                req.url.starts_with("https://b.example")
            }))
            .return_once(|_| Ok(response(200, r#"{"data":{}}"#)));

        let server = ServerConfig::with_profile(ServerProfile::new("a", "A", "https://a.example"));
        let client = GraphQlClient::new(Arc::new(http), server.clone());

        // Switch before the call is issued; the new target must be used.
        server.set_active(Some(ServerProfile::new("b", "B", "https://b.example")));
        let _: Value = client.execute("query { version }", json!({})).await.unwrap();
    }
}
