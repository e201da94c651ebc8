//! HTTP listener for the dispatch server.
//!
//! `GET /status` and `GET /info` are answered directly and never wait on
//! the execution lock. Every other path goes to the [`Dispatcher`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Json;
use chrono::{DateTime, Utc};
use envelope::{ErrorEnvelope, ErrorKind, INFO_PATH, STATUS_PATH, ServerInfo, StatusReport};
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::dispatch::{Dispatcher, Reply};
use crate::error::{Error, Result};

pub const SERVER_NAME: &str = "Rhino Bridge Server";

struct ServerState {
    dispatcher: Dispatcher,
    started_at: DateTime<Utc>,
}

/// A running dispatch server.
pub struct BridgeServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl BridgeServer {
    /// Bind `addr` and start serving in the background.
    ///
    /// The registry inside `dispatcher` is already frozen, so no request
    /// can observe a partially populated table.
    pub async fn bind(addr: impl ToSocketAddrs, dispatcher: Dispatcher) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(ServerState {
            dispatcher,
            started_at: Utc::now(),
        });
        let endpoint_count = state.dispatcher.registry().len();
        let app = router(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!(%addr, endpoints = endpoint_count, "bridge server listening");
        Ok(Self {
            addr,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections. In-flight requests finish first.
    pub fn shutdown(&mut self) -> Result<()> {
        let sender = self.shutdown.take().ok_or(Error::NotRunning)?;
        sender.send(()).map_err(|_| Error::NotRunning)?;
        info!(addr = %self.addr, "bridge server shutting down");
        Ok(())
    }

    /// Wait until the server stops.
    pub async fn wait(mut self) -> Result<()> {
        let task = self.task.take().ok_or(Error::NotRunning)?;
        match task.await {
            Ok(result) => result.map_err(Error::from),
            Err(join) => {
                warn!(error = %join, "bridge server task ended abnormally");
                Err(Error::NotRunning)
            }
        }
    }
}

impl Drop for BridgeServer {
    fn drop(&mut self) {
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.send(());
        }
    }
}

fn router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    Router::new()
        .route(STATUS_PATH, any(status))
        .route(INFO_PATH, any(server_info))
        .fallback(dispatch_request)
        .with_state(state)
        .layer(cors)
}

async fn status(State(state): State<Arc<ServerState>>) -> Json<StatusReport> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;
    Json(StatusReport {
        success: true,
        status: "running".to_string(),
        endpoint_count: state.dispatcher.registry().len(),
        host_available: true,
        grasshopper_available: state.dispatcher.grasshopper_available(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at,
        uptime_secs,
    })
}

async fn server_info(State(state): State<Arc<ServerState>>) -> Json<ServerInfo> {
    Json(ServerInfo {
        success: true,
        name: SERVER_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: state.dispatcher.registry().endpoints(),
    })
}

async fn dispatch_request(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let endpoint = uri.path();

    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    let registered = state.dispatcher.registry().contains(endpoint);
    if method != Method::POST && registered {
        let envelope = ErrorEnvelope::new(
            ErrorKind::HttpError,
            format!("Method {method} not allowed on {endpoint}; use POST"),
        )
        .endpoint(endpoint)
        .status_code(405)
        .build();
        return into_response(Reply {
            status: 405,
            envelope,
        });
    }

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let status = rejection.status().as_u16();
            let envelope = ErrorEnvelope::new(
                ErrorKind::HttpError,
                format!("Could not read request body: {}", rejection.body_text()),
            )
            .endpoint(endpoint)
            .status_code(status)
            .build();
            return into_response(Reply { status, envelope });
        }
    };

    // Runs detached from the connection: a request queued on the execution
    // lock still executes if its client goes away.
    let dispatcher = state.dispatcher.clone();
    let path = endpoint.to_string();
    let task = tokio::spawn(async move { dispatcher.dispatch(&path, &body).await });
    match task.await {
        Ok(reply) => into_response(reply),
        Err(join) => {
            warn!(endpoint, error = %join, "dispatch task ended abnormally");
            let envelope = ErrorEnvelope::new(
                ErrorKind::HttpError,
                format!("Dispatch of {endpoint} did not complete: {join}"),
            )
            .endpoint(endpoint)
            .status_code(500)
            .build();
            into_response(Reply {
                status: 500,
                envelope,
            })
        }
    }
}

fn into_response(reply: Reply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(reply.envelope)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::ops;
    use crate::registry::discover;
    use serde_json::{Value, json};

    async fn start() -> BridgeServer {
        let registry = discover(&ops::builtin()).registry;
        BridgeServer::bind("127.0.0.1:0", Dispatcher::new(registry, Document::new()))
            .await
            .unwrap()
    }

    fn url(server: &BridgeServer, path: &str) -> String {
        format!("http://{}{path}", server.addr())
    }

    #[tokio::test]
    async fn status_reports_endpoint_count() {
        let mut server = start().await;
        let report: StatusReport = reqwest::get(url(&server, "/status"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(report.is_running());
        assert_eq!(report.endpoint_count, 10);
        assert!(report.grasshopper_available);
        server.shutdown().unwrap();
    }

    #[tokio::test]
    async fn info_lists_endpoints() {
        let server = start().await;
        let info: ServerInfo = reqwest::get(url(&server, "/info"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(info.name, SERVER_NAME);
        assert!(info.endpoints.iter().any(|e| e.path == "/draw_line" && e.method == "POST"));
    }

    #[tokio::test]
    async fn post_draw_line() {
        let server = start().await;
        let response = reqwest::Client::new()
            .post(url(&server, "/draw_line"))
            .json(&json!({"start": [0, 0, 0], "end": [10, 10, 5]}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert!(body["line_id"].is_string());
    }

    #[tokio::test]
    async fn wrong_method_and_unknown_path() {
        let server = start().await;
        let client = reqwest::Client::new();

        let response = client.get(url(&server, "/draw_line")).send().await.unwrap();
        assert_eq!(response.status(), 405);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error_type"], "HTTPError");

        let response = client
            .post(url(&server, "/no_such_thing"))
            .body("garbage")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error_type"], "UnknownEndpointError");
        assert_eq!(body["endpoint"], "/no_such_thing");
    }

    #[tokio::test]
    async fn cors_preflight() {
        let server = start().await;
        let response = reqwest::Client::new()
            .request(reqwest::Method::OPTIONS, url(&server, "/draw_line"))
            .header("Origin", "http://localhost:3000")
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn queued_request_runs_after_client_leaves() {
        fn slow(_: &mut Document, _: &envelope::Params) -> crate::registry::HandlerResult {
            std::thread::sleep(std::time::Duration::from_millis(600));
            Ok(json!({"success": true}))
        }

        let mut registry = discover(&ops::builtin()).registry;
        registry
            .register(crate::registry::HandlerEntry::new("/slow", "", slow))
            .unwrap();
        let server = BridgeServer::bind("127.0.0.1:0", Dispatcher::new(registry, Document::new()))
            .await
            .unwrap();
        let client = reqwest::Client::new();

        let holder = tokio::spawn(client.post(url(&server, "/slow")).send());
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        // Gives up while still queued behind /slow.
        let abandoned = client
            .post(url(&server, "/draw_line"))
            .json(&json!({"start": [0, 0, 0], "end": [1, 0, 0]}))
            .timeout(std::time::Duration::from_millis(100))
            .send()
            .await;
        assert!(abandoned.is_err());

        assert_eq!(holder.await.unwrap().unwrap().status(), 200);
        let info: Value = client
            .post(url(&server, "/get_rhino_info"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(info["info"]["object_count"], 1);
    }

    #[tokio::test]
    async fn shutdown_twice_is_an_error() {
        let mut server = start().await;
        server.shutdown().unwrap();
        assert!(matches!(server.shutdown(), Err(Error::NotRunning)));
        server.wait().await.unwrap();
    }
}
