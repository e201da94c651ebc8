//! Handler registry: endpoint path to operation body.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use envelope::{EndpointInfo, INFO_PATH, Params, STATUS_PATH};
use serde_json::Value;
use tracing::{info, warn};

use crate::document::Document;
use crate::error::RegistryError;
use crate::failure::HandlerError;

pub type HandlerResult = Result<Value, HandlerError>;

/// An operation body exposed on an endpoint path.
///
/// Bodies run one at a time with exclusive access to the document. The
/// returned value must be a JSON object with a boolean `success`.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, doc: &mut Document, params: &Params) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut Document, &Params) -> HandlerResult + Send + Sync + 'static,
{
    fn call(&self, doc: &mut Document, params: &Params) -> HandlerResult {
        self(doc, params)
    }
}

/// A handler tagged for remote exposure.
#[derive(Clone)]
pub struct HandlerEntry {
    pub path: String,
    pub description: String,
    body: Arc<dyn Handler>,
}

impl HandlerEntry {
    /// Entry for a plain function or closure body.
    pub fn new<F>(path: impl Into<String>, description: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Document, &Params) -> HandlerResult + Send + Sync + 'static,
    {
        Self::from_handler(path, description, body)
    }

    pub fn from_handler(
        path: impl Into<String>,
        description: impl Into<String>,
        body: impl Handler,
    ) -> Self {
        Self {
            path: path.into(),
            description: description.into(),
            body: Arc::new(body),
        }
    }

    pub fn body(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.body)
    }
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("path", &self.path)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// A group of handlers scanned at startup.
pub trait HandlerNamespace: Send + Sync {
    fn name(&self) -> &'static str;

    fn handlers(&self) -> Vec<HandlerEntry>;
}

/// Endpoint table. Populated once at startup, read-only afterwards.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, HandlerEntry>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Fails if the path is taken, reserved, or malformed.
    pub fn register(&mut self, entry: HandlerEntry) -> Result<(), RegistryError> {
        validate_path(&entry.path)?;
        if self.handlers.contains_key(&entry.path) {
            return Err(RegistryError::DuplicateEndpoint(entry.path));
        }
        self.handlers.insert(entry.path.clone(), entry);
        Ok(())
    }

    pub fn resolve(&self, path: &str) -> Result<&HandlerEntry, RegistryError> {
        self.handlers
            .get(path)
            .ok_or_else(|| RegistryError::UnknownEndpoint(path.to_string()))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.handlers.contains_key(path)
    }

    /// Registered paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn endpoints(&self) -> Vec<EndpointInfo> {
        self.handlers
            .values()
            .map(|entry| EndpointInfo {
                path: entry.path.clone(),
                method: "POST".to_string(),
                description: entry.description.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// An entry discovery refused to register.
#[derive(Debug, Clone)]
pub struct Skipped {
    pub namespace: &'static str,
    pub path: String,
    pub error: RegistryError,
}

/// Outcome of a discovery scan.
#[derive(Debug)]
pub struct Discovery {
    pub registry: HandlerRegistry,
    pub skipped: Vec<Skipped>,
}

/// Scan `namespaces` in order and register every handler found.
///
/// A bad entry is logged and skipped; it never aborts the scan.
pub fn discover(namespaces: &[Box<dyn HandlerNamespace>]) -> Discovery {
    let mut registry = HandlerRegistry::new();
    let mut skipped = Vec::new();

    for namespace in namespaces {
        let mut loaded = 0usize;
        for entry in namespace.handlers() {
            let path = entry.path.clone();
            match registry.register(entry) {
                Ok(()) => loaded += 1,
                Err(error) => {
                    warn!(
                        namespace = namespace.name(),
                        endpoint = %path,
                        error_type = %error.kind(),
                        %error,
                        "skipping handler"
                    );
                    skipped.push(Skipped {
                        namespace: namespace.name(),
                        path,
                        error,
                    });
                }
            }
        }
        info!(namespace = namespace.name(), handlers = loaded, "discovered handlers");
    }

    info!(
        endpoints = registry.len(),
        skipped = skipped.len(),
        "handler discovery complete"
    );
    Discovery { registry, skipped }
}

fn validate_path(path: &str) -> Result<(), RegistryError> {
    let reason = if path.len() < 2 || !path.starts_with('/') {
        "endpoint paths start with '/' followed by a name"
    } else if path.chars().any(|c| c.is_whitespace() || c == '?' || c == '#') {
        "endpoint paths may not contain whitespace, '?' or '#'"
    } else if path == STATUS_PATH || path == INFO_PATH {
        "path is reserved by the server"
    } else {
        return Ok(());
    };
    Err(RegistryError::InvalidEndpoint {
        path: path.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok_body(_: &mut Document, _: &Params) -> HandlerResult {
        Ok(json!({"success": true, "which": "first"}))
    }

    fn other_body(_: &mut Document, _: &Params) -> HandlerResult {
        Ok(json!({"success": true, "which": "second"}))
    }

    struct Fixed(&'static str, Vec<HandlerEntry>);

    impl HandlerNamespace for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn handlers(&self) -> Vec<HandlerEntry> {
            self.1.clone()
        }
    }

    #[test]
    fn duplicate_keeps_first() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(HandlerEntry::new("/draw_line", "first", ok_body))
            .unwrap();
        let err = registry
            .register(HandlerEntry::new("/draw_line", "second", other_body))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateEndpoint("/draw_line".into()));

        let entry = registry.resolve("/draw_line").unwrap();
        let out = entry.body().call(&mut Document::new(), &Params::new()).unwrap();
        assert_eq!(out["which"], "first");
    }

    #[test]
    fn unknown_path() {
        let registry = HandlerRegistry::new();
        let err = registry.resolve("/nope").unwrap_err();
        assert_eq!(err.kind(), envelope::ErrorKind::UnknownEndpoint);
    }

    #[test]
    fn malformed_and_reserved_paths_rejected() {
        let mut registry = HandlerRegistry::new();
        for path in ["", "/", "draw_line", "/has space", STATUS_PATH, INFO_PATH] {
            let err = registry.register(HandlerEntry::new(path, "", ok_body)).unwrap_err();
            assert!(matches!(err, RegistryError::InvalidEndpoint { .. }), "{path:?} should be rejected");
            assert_eq!(err.kind(), envelope::ErrorKind::InvalidDeclaration);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn discovery_skips_bad_entries_and_continues() {
        let namespaces: Vec<Box<dyn HandlerNamespace>> = vec![
            Box::new(Fixed(
                "geometry",
                vec![
                    HandlerEntry::new("/draw_line", "", ok_body),
                    HandlerEntry::new("bad", "", ok_body),
                ],
            )),
            Box::new(Fixed(
                "utility",
                vec![
                    HandlerEntry::new("/draw_line", "", other_body),
                    HandlerEntry::new("/quantify_volume", "", ok_body),
                ],
            )),
        ];

        let Discovery { registry, skipped } = discover(&namespaces);

        assert_eq!(registry.paths().collect::<Vec<_>>(), ["/draw_line", "/quantify_volume"]);
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[1].namespace, "utility");
        assert_eq!(skipped[1].error.kind(), envelope::ErrorKind::DuplicateEndpoint);
    }
}
