//! Request and response envelopes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, ErrorKind, Params, Result};

/// One invocation: an endpoint path plus its parameter mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub endpoint: String,
    pub params: Params,
}

impl RequestEnvelope {
    pub fn new(endpoint: impl Into<String>, params: Params) -> Self {
        Self {
            endpoint: endpoint.into(),
            params,
        }
    }

    /// Parse a raw request body. An empty body is an empty mapping.
    pub fn parse(endpoint: impl Into<String>, body: &[u8]) -> Result<Self> {
        let params = if body.iter().all(u8::is_ascii_whitespace) {
            Params::new()
        } else {
            match serde_json::from_slice::<Value>(body)? {
                Value::Object(map) => map,
                other => return Err(Error::NotAnObject(json_type_name(&other))),
            }
        };
        Ok(Self::new(endpoint, params))
    }
}

/// A response body: always a mapping with at least a boolean `success`.
///
/// Fields beyond the fixed ones are operation specific and are carried
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Envelope(Map<String, Value>);

impl Envelope {
    /// A success envelope carrying `fields`. Any `success` key in `fields`
    /// is overwritten.
    pub fn success(fields: Params) -> Self {
        let mut map = fields;
        map.insert("success".into(), Value::Bool(true));
        Self(map)
    }

    /// Validate an arbitrary JSON value as an envelope.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::try_from(map),
            other => Err(Error::NotAnObject(json_type_name(&other))),
        }
    }

    /// Parse a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Self::from_value(serde_json::from_slice(body)?)
    }

    pub fn is_success(&self) -> bool {
        self.0.get("success").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn error_type(&self) -> Option<ErrorKind> {
        self.0
            .get("error_type")
            .and_then(Value::as_str)
            .map(ErrorKind::from)
    }

    pub fn error(&self) -> Option<&str> {
        self.0.get("error").and_then(Value::as_str)
    }

    pub fn status_code(&self) -> Option<u16> {
        self.0
            .get("status_code")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert a field. The `success` flag cannot be changed this way.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if key != "success" {
            self.0.insert(key, value.into());
        }
    }

    pub fn with_status_code(mut self, status: u16) -> Self {
        self.insert("status_code", status);
        self
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl TryFrom<Map<String, Value>> for Envelope {
    type Error = Error;

    fn try_from(map: Map<String, Value>) -> Result<Self> {
        match map.get("success") {
            Some(Value::Bool(_)) => Ok(Self(map)),
            _ => Err(Error::MissingSuccess),
        }
    }
}

impl From<Envelope> for Map<String, Value> {
    fn from(envelope: Envelope) -> Self {
        envelope.0
    }
}

impl From<ErrorEnvelope> for Envelope {
    fn from(error: ErrorEnvelope) -> Self {
        error.build()
    }
}

/// Builder for failure envelopes.
///
/// Every built envelope carries `success: false`, `error`, `error_type`,
/// `endpoint` (when known) and a `debug_hint`.
#[derive(Debug, Clone)]
pub struct ErrorEnvelope {
    kind: ErrorKind,
    error: String,
    endpoint: Option<String>,
    debug_hint: Option<String>,
    fields: Params,
}

impl ErrorEnvelope {
    pub fn new(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            kind,
            error: error.into(),
            endpoint: None,
            debug_hint: None,
            fields: Params::new(),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn status_code(self, status: u16) -> Self {
        self.field("status_code", status)
    }

    /// Replace the default hint for this kind.
    pub fn debug_hint(mut self, hint: impl Into<String>) -> Self {
        self.debug_hint = Some(hint.into());
        self
    }

    /// Attach a situational field (`traceback`, `request_data`, ...).
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Envelope {
        let mut map = self.fields;
        map.insert("success".into(), Value::Bool(false));
        map.insert("error".into(), Value::String(self.error));
        let hint = self
            .debug_hint
            .unwrap_or_else(|| self.kind.default_hint().to_string());
        map.insert("error_type".into(), Value::String(self.kind.into()));
        if let Some(endpoint) = self.endpoint {
            map.insert("endpoint".into(), Value::String(endpoint));
        }
        map.insert("debug_hint".into(), Value::String(hint));
        Envelope(map)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
