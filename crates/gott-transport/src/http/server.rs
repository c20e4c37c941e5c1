//! Webhook listener.
//!
//! Each POST body is decoded into an [`Update`] and handed to the update
//! channel. The response is sent only once the dispatcher has taken the
//! update, so the platform sees delivery latency that matches dispatcher
//! throughput:
//!
//! | Delivery | Response |
//! |---|---|
//! | decoded and accepted | `200 OK` |
//! | not a valid update | `400 Bad Request` |
//! | body not read within the read timeout | `408 Request Timeout` |
//! | dispatcher gone | `503 Service Unavailable` |

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use gott_core::{Update, UpdateSender};

use crate::error::{TransportError, TransportResult};

/// Largest accepted delivery body.
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Shared state for the webhook route.
struct WebhookState {
    updates: UpdateSender,
    read_timeout: Option<Duration>,
}

/// Handle to a running webhook listener.
///
/// Dropping the handle shuts the listener down.
pub struct ListenerHandle {
    /// Unique identifier for this listener.
    pub id: String,
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signals the listener to stop accepting deliveries.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Stops the listener and waits until in-flight deliveries are answered.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.id)
            .field("local_addr", &self.local_addr)
            .finish()
    }
}

/// Starts a webhook listener on `addr` that accepts POST requests at `path`.
///
/// With a `read_timeout`, a delivery whose body is not fully received in
/// time is answered with `408 Request Timeout` and never reaches the
/// update channel. `None` waits indefinitely.
pub async fn serve_webhook(
    addr: &str,
    path: &str,
    read_timeout: Option<Duration>,
    updates: UpdateSender,
) -> TransportResult<ListenerHandle> {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    let state = Arc::new(WebhookState {
        updates,
        read_timeout,
    });
    let router = Router::new()
        .route(&path, post(webhook_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| TransportError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    let local_addr = listener.local_addr()?;

    info!(addr = %local_addr, path = %path, ?read_timeout, "Webhook listener started");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(async move {
        let server = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        if let Err(e) = server.await {
            error!(error = %e, "Webhook listener error");
        }
        info!(addr = %local_addr, "Webhook listener stopped");
    });

    Ok(ListenerHandle {
        id: format!("webhook-{local_addr}"),
        local_addr,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}

async fn read_body(body: Body, read_timeout: Option<Duration>) -> Result<Bytes, Response> {
    let read = axum::body::to_bytes(body, MAX_BODY_SIZE);
    let result = match read_timeout {
        Some(limit) => match tokio::time::timeout(limit, read).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?limit, "Webhook delivery body not received in time");
                return Err((StatusCode::REQUEST_TIMEOUT, "read timeout").into_response());
            }
        },
        None => read.await,
    };
    result.map_err(|e| {
        warn!(error = %e, "Failed to read webhook delivery body");
        (StatusCode::BAD_REQUEST, e.to_string()).into_response()
    })
}

async fn webhook_handler(State(state): State<Arc<WebhookState>>, body: Body) -> Response {
    let body = match read_body(body, state.read_timeout).await {
        Ok(body) => body,
        Err(response) => return response,
    };

    let update = match Update::decode(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, len = body.len(), "Rejected webhook delivery");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let update_type = update.update_type();
    match state.updates.send(update).await {
        Ok(()) => {
            debug!(%update_type, "Webhook delivery accepted");
            (StatusCode::OK, "ok").into_response()
        }
        Err(e) => {
            warn!(%update_type, error = %e, "Webhook delivery dropped");
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gott_core::{UpdateType, channel};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const BOT_STARTED: &str = r#"{
        "update_type": "bot_started",
        "timestamp": 1,
        "chat_id": 55,
        "user": { "user_id": 9 }
    }"#;

    #[tokio::test]
    async fn test_delivery_waits_for_dispatcher() {
        let (tx, mut rx) = channel();
        let handle = serve_webhook("127.0.0.1:0", "hook", None, tx).await.unwrap();
        let url = format!("http://{}/hook", handle.local_addr());

        let request = tokio::spawn(async move {
            reqwest::Client::new()
                .post(url)
                .body(BOT_STARTED)
                .send()
                .await
                .unwrap()
                .status()
        });

        // The response is held back until the update is taken.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!request.is_finished());

        let update = rx.recv().await.unwrap();
        assert_eq!(update.update_type(), UpdateType::BotStarted);
        assert_eq!(request.await.unwrap(), reqwest::StatusCode::OK);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_malformed_delivery_is_rejected() {
        let (tx, _rx) = channel();
        let handle = serve_webhook("127.0.0.1:0", "/", None, tx).await.unwrap();
        let url = format!("http://{}/", handle.local_addr());
        let client = reqwest::Client::new();

        let garbage = client.post(&url).body("{").send().await.unwrap();
        assert_eq!(garbage.status(), reqwest::StatusCode::BAD_REQUEST);

        let unknown = client
            .post(&url)
            .body(r#"{"update_type":"dialog_muted"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(unknown.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_closed_pipeline_answers_unavailable() {
        let (tx, rx) = channel();
        drop(rx);
        let handle = serve_webhook("127.0.0.1:0", "/", None, tx).await.unwrap();

        let response = reqwest::Client::new()
            .post(format!("http://{}/", handle.local_addr()))
            .body(BOT_STARTED)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_stalled_body_times_out() {
        let (tx, mut rx) = channel();
        let handle = serve_webhook("127.0.0.1:0", "/", Some(Duration::from_millis(100)), tx)
            .await
            .unwrap();

        // Announce more body than is ever sent.
        let mut stream = tokio::net::TcpStream::connect(handle.local_addr())
            .await
            .unwrap();
        stream
            .write_all(
                b"POST / HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"update_type\"",
            )
            .await
            .unwrap();

        let mut buf = vec![0u8; 1024];
        let n = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf))
            .await
            .expect("listener never answered")
            .unwrap();
        let response = String::from_utf8_lossy(&buf[..n]);
        assert!(response.starts_with("HTTP/1.1 408"), "{response}");

        drop(stream);
        handle.shutdown().await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_bind_failure() {
        let (tx, _rx) = channel();
        let first = serve_webhook("127.0.0.1:0", "/", None, tx.clone()).await.unwrap();
        let taken = first.local_addr().to_string();

        let err = serve_webhook(&taken, "/", None, tx).await.unwrap_err();
        assert!(matches!(err, TransportError::Bind { ref addr, .. } if *addr == taken));
    }
}
