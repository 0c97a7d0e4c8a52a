//! The `oura_data` tool: raw health-data fetch for the host agent.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::Tool;
use crate::auth::TokenGuard;
use crate::client::{default_date_range, Collection, OuraClient, OuraEndpoint};
use crate::error::ToolError;
use crate::types::{FunctionDefinition, ToolDefinition};

/// Tool that fetches one vendor collection and returns the raw JSON page.
pub struct OuraDataTool {
    guard: Arc<TokenGuard>,
    client: OuraClient,
}

#[derive(Deserialize)]
struct Args {
    endpoint: OuraEndpoint,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl OuraDataTool {
    pub fn new(guard: Arc<TokenGuard>, client: OuraClient) -> Self {
        Self { guard, client }
    }
}

#[async_trait]
impl Tool for OuraDataTool {
    fn name(&self) -> &'static str {
        "oura_data"
    }

    fn definition(&self) -> ToolDefinition {
        let endpoints: Vec<&str> = OuraEndpoint::ALL.iter().map(OuraEndpoint::as_str).collect();
        ToolDefinition {
            tool_type: "function".into(),
            function: FunctionDefinition {
                name: self.name().into(),
                description: "Fetch health data from the user's Oura Ring. Returns raw JSON for \
                              sleep, readiness, activity, detailed sleep periods, or stress data."
                    .into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "endpoint": {
                            "type": "string",
                            "enum": endpoints,
                            "description": "Data category: daily_sleep, daily_readiness, daily_activity, sleep (detailed periods), or daily_stress"
                        },
                        "start_date": {
                            "type": "string",
                            "description": "Start date in YYYY-MM-DD format. Defaults to today if omitted."
                        },
                        "end_date": {
                            "type": "string",
                            "description": "End date in YYYY-MM-DD format. Defaults to tomorrow (to include today) if omitted."
                        }
                    },
                    "required": ["endpoint"]
                }),
            },
        }
    }

    async fn execute(&self, arguments: &str) -> Result<String, ToolError> {
        let args: Args = serde_json::from_str(arguments)
            .map_err(|err| ToolError::InvalidArguments(err.to_string()))?;

        // Every data access goes through the guard first.
        let access_token = self
            .guard
            .ensure_valid_token()
            .await
            .map_err(|err| ToolError::ExecutionFailed(err.to_string()))?;

        let (today, tomorrow) = default_date_range();
        let start_date = args.start_date.as_deref().unwrap_or(&today);
        let end_date = args.end_date.as_deref().unwrap_or(&tomorrow);

        let page: Collection<serde_json::Value> = self
            .client
            .fetch(&access_token, args.endpoint, Some(start_date), Some(end_date))
            .await
            .map_err(|err| ToolError::ExecutionFailed(err.to_string()))?;

        serde_json::to_string_pretty(&page)
            .map_err(|err| ToolError::ExecutionFailed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::OauthClient;
    use crate::store::{unix_now_millis, ConfigStore, OuraConfig, TokenPolicy};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn tool_with_live_token(data_server: &MockServer) -> (tempfile::TempDir, OuraDataTool) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = ConfigStore::new(dir.path().join("config.json"));
        store
            .update(|config| {
                *config = OuraConfig {
                    access_token: Some("live-access".into()),
                    token_expires_at: Some(unix_now_millis() + 86_400_000),
                    ..OuraConfig::default()
                }
            })
            .await
            .expect("seed store");

        let guard = Arc::new(TokenGuard::new(
            Arc::new(store),
            OauthClient::with_token_url(format!("{}/oauth/token", data_server.uri())),
            TokenPolicy::default(),
        ));
        let client = OuraClient::with_base_url(data_server.uri());
        (dir, OuraDataTool::new(guard, client))
    }

    #[tokio::test]
    async fn definition_lists_every_endpoint() {
        let server = MockServer::start().await;
        let (_dir, tool) = tool_with_live_token(&server).await;
        let definition = tool.definition();
        assert_eq!(definition.function.name, "oura_data");
        let schema = definition.function.parameters.to_string();
        for endpoint in OuraEndpoint::ALL {
            assert!(schema.contains(endpoint.as_str()), "missing {endpoint}");
        }
    }

    #[tokio::test]
    async fn rejects_unparsable_arguments() {
        let server = MockServer::start().await;
        let (_dir, tool) = tool_with_live_token(&server).await;
        let err = tool.execute("{not json").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn rejects_unknown_endpoint_name() {
        let server = MockServer::start().await;
        let (_dir, tool) = tool_with_live_token(&server).await;
        let err = tool
            .execute(r#"{"endpoint":"heart_rate"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn fetches_requested_endpoint_with_explicit_dates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/daily_readiness"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"day": "2025-06-01", "score": 82}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, tool) = tool_with_live_token(&server).await;
        let out = tool
            .execute(
                r#"{"endpoint":"daily_readiness","start_date":"2025-06-01","end_date":"2025-06-02"}"#,
            )
            .await
            .expect("tool succeeds");
        assert!(out.contains("\"score\": 82"), "got: {out}");
    }

    #[tokio::test]
    async fn missing_dates_default_to_local_today_and_tomorrow() {
        let server = MockServer::start().await;
        let (today, tomorrow) = default_date_range();
        Mock::given(method("GET"))
            .and(path("/daily_sleep"))
            .and(wiremock::matchers::query_param("start_date", &today))
            .and(wiremock::matchers::query_param("end_date", &tomorrow))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, tool) = tool_with_live_token(&server).await;
        tool.execute(r#"{"endpoint":"daily_sleep"}"#)
            .await
            .expect("tool succeeds");
    }

    #[tokio::test]
    async fn auth_failure_surfaces_as_execution_error() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = ConfigStore::new(dir.path().join("config.json"));
        let guard = Arc::new(TokenGuard::new(
            Arc::new(store),
            OauthClient::with_token_url(format!("{}/oauth/token", server.uri())),
            TokenPolicy::default(),
        ));
        let tool = OuraDataTool::new(guard, OuraClient::with_base_url(server.uri()));

        let err = tool
            .execute(r#"{"endpoint":"daily_sleep"}"#)
            .await
            .unwrap_err();
        match err {
            ToolError::ExecutionFailed(msg) => {
                assert!(msg.contains("ouralink setup"), "got: {msg}")
            }
            other => panic!("expected execution failure, got {other}"),
        }
    }
}
