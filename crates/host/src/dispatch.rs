//! Request dispatch under the single-flight lock.

use std::sync::Arc;
use std::time::Instant;

use envelope::{Envelope, ErrorEnvelope, ErrorKind, RequestEnvelope};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::diagnostics;
use crate::document::Document;
use crate::failure::{FailureKind, HandlerError};
use crate::registry::{HandlerEntry, HandlerRegistry};

/// A response ready to go on the wire.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub envelope: Envelope,
}

impl Reply {
    fn ok(envelope: Envelope) -> Self {
        Self {
            status: 200,
            envelope,
        }
    }

    fn failed(status: u16, envelope: Envelope) -> Self {
        Self { status, envelope }
    }
}

/// Resolves endpoint paths and runs their bodies one at a time.
///
/// The document mutex is the single-flight lock: it is held from the moment
/// a body starts until it returns, and waiting requests are served in
/// arrival order. The lock guard travels with the blocking task, so a
/// caller that stops waiting does not release it early.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    document: Arc<Mutex<Document>>,
    grasshopper_available: bool,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, document: Document) -> Self {
        Self {
            registry: Arc::new(registry),
            grasshopper_available: document.grasshopper_available(),
            document: Arc::new(Mutex::new(document)),
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Fixed when the document is loaded; readable without taking the lock.
    pub fn grasshopper_available(&self) -> bool {
        self.grasshopper_available
    }

    /// Handle one inbound POST. Always produces a well-formed envelope.
    pub async fn dispatch(&self, endpoint: &str, body: &[u8]) -> Reply {
        let started = Instant::now();
        info!(endpoint, bytes = body.len(), "dispatch start");

        let reply = self.dispatch_inner(endpoint, body).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let status = reply.status;
        if reply.envelope.is_success() {
            info!(endpoint, status, elapsed_ms, "dispatch done");
        } else {
            let error_type = reply
                .envelope
                .error_type()
                .map(|k| k.to_string())
                .unwrap_or_default();
            let message = reply.envelope.error().unwrap_or_default();
            error!(endpoint, status, elapsed_ms, %error_type, error = message, "dispatch failed");
            if let Some(Value::Array(tail)) = reply.envelope.get("traceback_tail") {
                debug!(endpoint, traceback_tail = ?tail, "handler traceback");
            }
        }
        reply
    }

    async fn dispatch_inner(&self, endpoint: &str, body: &[u8]) -> Reply {
        let entry = match self.registry.resolve(endpoint) {
            Ok(entry) => entry.clone(),
            Err(err) => {
                let envelope = ErrorEnvelope::new(err.kind(), err.to_string())
                    .endpoint(endpoint)
                    .status_code(404)
                    .build();
                return Reply::failed(404, envelope);
            }
        };

        let request = match RequestEnvelope::parse(endpoint, body) {
            Ok(request) => request,
            Err(err) => {
                let envelope = ErrorEnvelope::new(
                    ErrorKind::HttpError,
                    format!("Invalid JSON in request body: {err}"),
                )
                .endpoint(endpoint)
                .status_code(400)
                .field("request_body", String::from_utf8_lossy(body).into_owned())
                .build();
                return Reply::failed(400, envelope);
            }
        };

        self.invoke(entry, request).await
    }

    async fn invoke(&self, entry: HandlerEntry, request: RequestEnvelope) -> Reply {
        let queued = Instant::now();
        let mut guard = Arc::clone(&self.document).lock_owned().await;
        debug!(
            endpoint = %request.endpoint,
            waited_ms = queued.elapsed().as_millis() as u64,
            "acquired execution lock"
        );

        let body = entry.body();
        let params = request.params.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let result = diagnostics::run_caught(|| body.call(&mut guard, &params));
            drop(guard);
            result
        })
        .await
        .unwrap_or_else(|join| {
            Err(HandlerError::new(
                FailureKind::RuntimeError,
                format!("handler task did not complete: {join}"),
            ))
        });

        match outcome {
            Ok(value) => validate_return(&request.endpoint, value),
            Err(err) => Reply::failed(
                500,
                diagnostics::failure_envelope(&request.endpoint, &err, &request.params),
            ),
        }
    }
}

/// A body must return an object with a boolean `success`.
fn validate_return(endpoint: &str, value: Value) -> Reply {
    let returned = match &value {
        Value::Object(map) if !matches!(map.get("success"), Some(Value::Bool(_))) => {
            "an object without a boolean `success`"
        }
        Value::Object(_) => "object",
        Value::Null => "null",
        Value::Array(_) => "an array",
        Value::String(_) => "a string",
        Value::Number(_) => "a number",
        Value::Bool(_) => "a boolean",
    };

    match Envelope::from_value(value) {
        Ok(envelope) => Reply::ok(envelope),
        Err(_) => {
            let envelope = ErrorEnvelope::new(
                ErrorKind::InvalidHandlerReturn,
                format!("Handler for {endpoint} returned {returned} instead of a result mapping"),
            )
            .endpoint(endpoint)
            .status_code(500)
            .field("returned_type", returned)
            .build();
            Reply::failed(500, envelope)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HandlerResult;
    use envelope::Params;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn echo(_: &mut Document, params: &Params) -> HandlerResult {
        Ok(json!({"success": true, "echo": params.get("message")}))
    }

    fn raises(_: &mut Document, params: &Params) -> HandlerResult {
        let _ = crate::params::required_f64(params, "a")?;
        Ok(json!({"success": true}))
    }

    fn returns_array(_: &mut Document, _: &Params) -> HandlerResult {
        Ok(json!([1, 2, 3]))
    }

    fn returns_no_flag(_: &mut Document, _: &Params) -> HandlerResult {
        Ok(json!({"line_id": "x"}))
    }

    fn panics(_: &mut Document, _: &Params) -> HandlerResult {
        panic!("index out of bounds in truss table")
    }

    fn dispatcher() -> Dispatcher {
        let mut registry = HandlerRegistry::new();
        registry.register(HandlerEntry::new("/echo", "", echo)).unwrap();
        registry.register(HandlerEntry::new("/raises", "", raises)).unwrap();
        registry.register(HandlerEntry::new("/array", "", returns_array)).unwrap();
        registry.register(HandlerEntry::new("/no_flag", "", returns_no_flag)).unwrap();
        registry.register(HandlerEntry::new("/panics", "", panics)).unwrap();
        Dispatcher::new(registry, Document::new())
    }

    #[tokio::test]
    async fn registered_path_returns_success_envelope() {
        let reply = dispatcher().dispatch("/echo", br#"{"message": "hi"}"#).await;
        assert_eq!(reply.status, 200);
        assert!(reply.envelope.is_success());
        assert_eq!(reply.envelope.get("echo"), Some(&json!("hi")));
    }

    #[tokio::test]
    async fn unknown_path_is_404_whatever_the_body() {
        let d = dispatcher();
        for body in [&b""[..], b"{not json", br#"{"a": 1}"#] {
            let reply = d.dispatch("/missing", body).await;
            assert_eq!(reply.status, 404);
            assert!(!reply.envelope.is_success());
            assert_eq!(reply.envelope.error_type(), Some(ErrorKind::UnknownEndpoint));
            assert_eq!(reply.envelope.get("endpoint"), Some(&json!("/missing")));
        }
    }

    #[tokio::test]
    async fn malformed_body_is_400() {
        let reply = dispatcher().dispatch("/echo", b"{oops").await;
        assert_eq!(reply.status, 400);
        assert_eq!(reply.envelope.error_type(), Some(ErrorKind::HttpError));
        assert_eq!(reply.envelope.get("request_body"), Some(&json!("{oops")));
    }

    #[tokio::test]
    async fn raised_failure_keeps_native_kind() {
        let reply = dispatcher().dispatch("/raises", b"{}").await;
        assert_eq!(reply.status, 500);
        let env = &reply.envelope;
        assert_eq!(env.error_type(), Some(ErrorKind::Host("KeyError".into())));
        assert!(!env.error().unwrap().contains('\n'));
        assert!(env.get("traceback").is_some());
        let file_line = env.get("file_line").and_then(Value::as_str).unwrap();
        assert!(file_line.contains("dispatch.rs"), "{file_line}");
    }

    #[tokio::test]
    async fn non_mapping_return_is_invalid() {
        let d = dispatcher();
        for path in ["/array", "/no_flag"] {
            let reply = d.dispatch(path, b"").await;
            assert_eq!(reply.status, 500);
            assert_eq!(reply.envelope.error_type(), Some(ErrorKind::InvalidHandlerReturn));
        }
    }

    #[tokio::test]
    async fn panic_is_contained() {
        let d = dispatcher();
        let reply = d.dispatch("/panics", b"").await;
        assert_eq!(reply.status, 500);
        assert_eq!(reply.envelope.error_type(), Some(ErrorKind::Host("Panic".into())));

        // The lock and the server survive.
        let reply = d.dispatch("/echo", b"").await;
        assert!(reply.envelope.is_success());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn bodies_never_overlap() {
        static ACTIVE: AtomicUsize = AtomicUsize::new(0);
        static PEAK: AtomicUsize = AtomicUsize::new(0);

        fn slow(_: &mut Document, _: &Params) -> HandlerResult {
            let now = ACTIVE.fetch_add(1, Ordering::SeqCst) + 1;
            PEAK.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            ACTIVE.fetch_sub(1, Ordering::SeqCst);
            Ok(json!({"success": true}))
        }

        let mut registry = HandlerRegistry::new();
        registry.register(HandlerEntry::new("/slow", "", slow)).unwrap();
        let d = Dispatcher::new(registry, Document::new());

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let d = d.clone();
            tasks.spawn(async move { d.dispatch("/slow", b"").await });
        }
        while let Some(reply) = tasks.join_next().await {
            assert!(reply.unwrap().envelope.is_success());
        }
        assert_eq!(PEAK.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn abandoned_call_still_completes_under_lock() {
        static DONE: AtomicUsize = AtomicUsize::new(0);

        fn slow_write(doc: &mut Document, _: &Params) -> HandlerResult {
            std::thread::sleep(Duration::from_millis(50));
            doc.add_line([0.0; 3], [1.0, 0.0, 0.0]);
            DONE.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"success": true}))
        }

        fn count(doc: &mut Document, _: &Params) -> HandlerResult {
            Ok(json!({"success": true, "object_count": doc.object_count()}))
        }

        let mut registry = HandlerRegistry::new();
        registry.register(HandlerEntry::new("/slow_write", "", slow_write)).unwrap();
        registry.register(HandlerEntry::new("/count", "", count)).unwrap();
        let d = Dispatcher::new(registry, Document::new());

        let abandoned =
            tokio::time::timeout(Duration::from_millis(5), d.dispatch("/slow_write", b"")).await;
        assert!(abandoned.is_err());

        // The next request queues behind the abandoned body and sees its write.
        let reply = d.dispatch("/count", b"").await;
        assert_eq!(DONE.load(Ordering::SeqCst), 1);
        assert_eq!(reply.envelope.get("object_count"), Some(&json!(1)));
    }
}
