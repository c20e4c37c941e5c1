//! HTTP API client.

use std::any::Any;
use std::iter;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use gott_core::{ApiError, ApiRequest, ApiResult, Bot, HttpMethod};

use crate::error::{TransportError, TransportResult};

/// Root of the public bot API.
pub const DEFAULT_API_URL: &str = "https://botapi.tamtam.chat";

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// A [`Bot`] that talks to the platform over HTTP.
///
/// Every request carries the token as the `access_token` query parameter.
#[derive(Clone)]
pub struct HttpBot {
    id: String,
    token: String,
    api_url: Url,
    client: Client,
}

impl HttpBot {
    /// Creates a bot with its own HTTP client.
    ///
    /// `timeout` bounds whole requests, so it must exceed the long-poll
    /// timeout used with [`Bot::get_updates`].
    pub fn new(token: impl Into<String>, api_url: &str, timeout: Duration) -> TransportResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Self::with_client(token, api_url, client)
    }

    /// Creates a bot on top of an existing HTTP client.
    pub fn with_client(
        token: impl Into<String>,
        api_url: &str,
        client: Client,
    ) -> TransportResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(TransportError::InvalidConfig("bot token is empty".into()));
        }
        let api_url = Url::parse(api_url)
            .map_err(|e| TransportError::InvalidConfig(format!("api url '{api_url}': {e}")))?;
        let id = api_url.host_str().unwrap_or("bot").to_string();

        debug!(bot_id = %id, url = %api_url, "HTTP bot created");
        Ok(Self {
            id,
            token,
            api_url,
            client,
        })
    }

    /// Overrides the identifier used in logs.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Returns the API root this bot talks to.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    fn endpoint(&self, request: &ApiRequest) -> ApiResult<Url> {
        let base = self.api_url.as_str().trim_end_matches('/');
        let path = request.path.trim_start_matches('/');
        let params = request
            .query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(iter::once(("access_token", self.token.as_str())));

        Url::parse_with_params(&format!("{base}/{path}"), params)
            .map_err(|e| ApiError::Transport(format!("invalid endpoint '{path}': {e}")))
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl Bot for HttpBot {
    fn id(&self) -> &str {
        &self.id
    }

    async fn call_api(&self, request: ApiRequest) -> ApiResult<Value> {
        let url = self.endpoint(&request)?;
        trace!(bot_id = %self.id, method = %request.method, path = %request.path, "API call");

        let mut builder = self.client.request(to_method(request.method), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.without_url().to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<ErrorBody>(&bytes) {
                Ok(body) => ApiError::Upstream {
                    code: body.code,
                    message: body.message,
                },
                Err(_) => ApiError::Http {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                },
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl std::fmt::Debug for HttpBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBot")
            .field("id", &self.id)
            .field("api_url", &self.api_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::{Query, RawQuery};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use gott_core::GetUpdatesOpts;
    use serde_json::json;
    use std::collections::HashMap;

    async fn mock_api() -> String {
        let router = Router::new()
            .route(
                "/updates",
                get(|RawQuery(query): RawQuery| async move {
                    axum::Json(json!({
                        "updates": [{ "update_type": "bot_started" }],
                        "marker": 9,
                        "query": query,
                    }))
                }),
            )
            .route(
                "/messages",
                post(
                    |Query(query): Query<HashMap<String, String>>, axum::Json(body): axum::Json<Value>| async move {
                        if query.get("access_token").map(String::as_str) != Some("secret") {
                            return (
                                StatusCode::UNAUTHORIZED,
                                axum::Json(json!({ "code": "verify.token", "message": "Invalid access_token" })),
                            );
                        }
                        (StatusCode::OK, axum::Json(json!({ "echo": body, "chat_id": query.get("chat_id") })))
                    },
                ),
            )
            .route("/broken", get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}")
    }

    #[test]
    fn test_rejects_bad_config() {
        let timeout = Duration::from_secs(1);
        assert!(matches!(
            HttpBot::new("  ", DEFAULT_API_URL, timeout),
            Err(TransportError::InvalidConfig(_))
        ));
        assert!(matches!(
            HttpBot::new("token", "not a url", timeout),
            Err(TransportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_endpoint_adds_token() {
        let bot = HttpBot::new("secret", "https://example.org/api/", Duration::from_secs(1)).unwrap();
        let url = bot
            .endpoint(&ApiRequest::get("/updates").query("limit", 5))
            .unwrap();
        assert_eq!(url.as_str(), "https://example.org/api/updates?limit=5&access_token=secret");
        assert_eq!(bot.id(), "example.org");
    }

    #[tokio::test]
    async fn test_get_updates_over_http() {
        let base = mock_api().await;
        let bot = HttpBot::new("secret", &base, Duration::from_secs(5)).unwrap();

        let opts = GetUpdatesOpts {
            marker: Some(3),
            ..Default::default()
        };
        let page = bot.get_updates(&opts).await.unwrap();
        assert_eq!(page.marker, Some(9));
        assert_eq!(page.updates.len(), 1);
    }

    #[tokio::test]
    async fn test_send_message_and_upstream_error() {
        let base = mock_api().await;

        let bot = HttpBot::new("secret", &base, Duration::from_secs(5)).unwrap();
        let sent = bot.send_message(42, "hello").await.unwrap();
        assert_eq!(sent["echo"]["text"], "hello");
        assert_eq!(sent["chat_id"], "42");

        let intruder = HttpBot::new("wrong", &base, Duration::from_secs(5)).unwrap();
        let err = intruder.send_message(42, "hello").await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream { ref code, .. } if code == "verify.token"));
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let base = mock_api().await;
        let bot = HttpBot::new("secret", &base, Duration::from_secs(5)).unwrap();

        let err = bot.call_api(ApiRequest::get("broken")).await.unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 502, ref body } if body == "upstream down"));
    }
}
