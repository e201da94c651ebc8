//! Failure capture for operation bodies.
//!
//! Turns a [`HandlerError`], or a panic caught while a body ran, into an
//! error envelope carrying the raising site, the trace, and a per-kind hint.

use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use envelope::{Envelope, ErrorEnvelope, ErrorKind, Params};
use serde_json::Value;

use crate::failure::{FailureKind, HandlerError};

/// Lines of the trace repeated in `traceback_tail`.
pub const TRACEBACK_TAIL_LINES: usize = 10;

thread_local! {
    static LAST_PANIC: RefCell<Option<(String, String)>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Install a panic hook that records the panic site for [`run_caught`].
///
/// The previous hook still runs, so panics keep showing on the console.
pub fn install_panic_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let file_line = info
                .location()
                .map(|l| format!("{}:{}", l.file(), l.line()))
                .unwrap_or_else(|| "<unknown>".to_string());
            let trace = Backtrace::force_capture().to_string();
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some((file_line, trace)));
            previous(info);
        }));
    });
}

/// Run a body, converting a panic into a [`FailureKind::Panic`] error.
pub fn run_caught<F>(body: F) -> Result<Value, HandlerError>
where
    F: FnOnce() -> Result<Value, HandlerError>,
{
    install_panic_hook();
    LAST_PANIC.with(|slot| slot.borrow_mut().take());

    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "handler panicked".to_string());
            let (file_line, trace) = LAST_PANIC
                .with(|slot| slot.borrow_mut().take())
                .unwrap_or_else(|| ("<unknown>".to_string(), String::new()));
            Err(HandlerError::captured(
                FailureKind::Panic,
                message,
                file_line,
                trace,
            ))
        }
    }
}

/// `"rust <version> (<os>/<arch>)"` of the running host.
pub fn runtime_version() -> String {
    let rust = option_env!("CARGO_PKG_RUST_VERSION")
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown");
    format!(
        "rust {rust} ({}/{}), {} {}",
        std::env::consts::OS,
        std::env::consts::ARCH,
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}

/// Build the 500 envelope for a failed body.
///
/// `error` stays a one-line human message; the trace only ever lives in
/// `traceback` and `traceback_tail`.
pub fn failure_envelope(endpoint: &str, error: &HandlerError, params: &Params) -> Envelope {
    let kind = error.kind();
    let first_line = error.message().lines().next().unwrap_or_default();
    ErrorEnvelope::new(
        ErrorKind::from(kind),
        format!("Handler for {endpoint} failed with {kind}: {first_line}"),
    )
    .endpoint(endpoint)
    .status_code(500)
    .debug_hint(kind.debug_hint())
    .field("error_message", error.message())
    .field("traceback", error.traceback())
    .field("traceback_tail", traceback_tail(error.traceback()))
    .field("file_line", error.file_line())
    .field("runtime_version", runtime_version())
    .field("request_data", Value::Object(params.clone()))
    .build()
}

/// Last [`TRACEBACK_TAIL_LINES`] non-empty lines of a trace.
pub fn traceback_tail(trace: &str) -> Vec<String> {
    let lines: Vec<&str> = trace.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(TRACEBACK_TAIL_LINES);
    lines[start..].iter().map(|l| l.to_string()).collect()
}
