//! Bot trait and the request types it speaks.
//!
//! The [`Bot`] is the boundary between the dispatch engine and the platform
//! API. Only [`Bot::call_api`] has to be implemented; the typed methods the
//! engine relies on are provided on top of it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiResult;
use crate::update::UpdateType;

// =============================================================================
// Requests
// =============================================================================

/// HTTP verb of an API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        })
    }
}

/// A raw API request: a method path relative to the API root, query
/// parameters and an optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path).body(body)
    }

    /// Appends a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Options for one long-poll request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetUpdatesOpts {
    /// Maximum number of updates to return.
    pub limit: Option<u32>,
    /// Seconds the server may hold the request open.
    pub timeout: Option<u32>,
    /// Resume point; `None` asks for everything not yet committed.
    pub marker: Option<i64>,
    /// Update types to subscribe to; `None` means all.
    pub types: Option<Vec<UpdateType>>,
}

impl GetUpdatesOpts {
    /// Builds the `GET /updates` request for these options.
    pub fn to_request(&self) -> ApiRequest {
        let mut request = ApiRequest::get("updates");
        if let Some(limit) = self.limit {
            request = request.query("limit", limit);
        }
        if let Some(timeout) = self.timeout {
            request = request.query("timeout", timeout);
        }
        if let Some(marker) = self.marker {
            request = request.query("marker", marker);
        }
        if let Some(types) = self.types.as_ref().filter(|t| !t.is_empty()) {
            let types: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
            request = request.query("types", types.join(","));
        }
        request
    }
}

/// One page of updates.
///
/// Items are kept as raw JSON so that the consumer can decode them one by
/// one and drop the ones it does not understand.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateList {
    #[serde(default)]
    pub updates: Vec<Value>,
    /// Pointer to the next page.
    #[serde(default)]
    pub marker: Option<i64>,
}

// =============================================================================
// Bot
// =============================================================================

/// An authenticated connection to the platform API.
#[async_trait]
pub trait Bot: Send + Sync + 'static {
    /// Returns the bot's identifier, used in logs.
    fn id(&self) -> &str;

    /// Performs a raw API call and returns the decoded JSON response.
    async fn call_api(&self, request: ApiRequest) -> ApiResult<Value>;

    /// Fetches one page of updates.
    async fn get_updates(&self, opts: &GetUpdatesOpts) -> ApiResult<UpdateList> {
        let value = self.call_api(opts.to_request()).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Sends a plain text message to a chat.
    async fn send_message(&self, chat_id: i64, text: &str) -> ApiResult<Value> {
        let request = ApiRequest::post("messages", json!({ "text": text })).query("chat_id", chat_id);
        self.call_api(request).await
    }

    /// Returns self as an `Arc<dyn Any>` for downcasting to the concrete bot.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A shared Bot trait object.
pub type BoxedBot = Arc<dyn Bot>;

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct RecordingBot {
        requests: Mutex<Vec<ApiRequest>>,
        response: Value,
    }

    #[async_trait]
    impl Bot for RecordingBot {
        fn id(&self) -> &str {
            "recording"
        }

        async fn call_api(&self, request: ApiRequest) -> ApiResult<Value> {
            self.requests.lock().push(request);
            Ok(self.response.clone())
        }

        fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    #[test]
    fn test_get_updates_request() {
        let opts = GetUpdatesOpts {
            limit: Some(100),
            timeout: Some(30),
            marker: Some(17),
            types: Some(vec![UpdateType::MessageCreated, UpdateType::BotStarted]),
        };

        let request = opts.to_request();
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.path, "updates");
        assert_eq!(
            request.query,
            vec![
                ("limit".to_string(), "100".to_string()),
                ("timeout".to_string(), "30".to_string()),
                ("marker".to_string(), "17".to_string()),
                ("types".to_string(), "message_created,bot_started".to_string()),
            ]
        );
    }

    #[test]
    fn test_default_opts_have_no_query() {
        assert!(GetUpdatesOpts::default().to_request().query.is_empty());
    }

    #[tokio::test]
    async fn test_provided_methods() {
        let bot = Arc::new(RecordingBot {
            requests: Mutex::new(Vec::new()),
            response: json!({ "updates": [{ "update_type": "bot_started" }], "marker": 5 }),
        });

        let page = bot.get_updates(&GetUpdatesOpts::default()).await.unwrap();
        assert_eq!(page.marker, Some(5));
        assert_eq!(page.updates.len(), 1);

        bot.send_message(10, "hello").await.unwrap();
        let requests = bot.requests.lock();
        assert_eq!(requests[1].method, HttpMethod::Post);
        assert_eq!(requests[1].path, "messages");
        assert_eq!(requests[1].body, Some(json!({ "text": "hello" })));

        let boxed: BoxedBot = bot.clone();
        assert!(boxed.as_any().downcast::<RecordingBot>().is_ok());
    }
}
