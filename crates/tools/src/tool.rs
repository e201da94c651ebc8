//! The tool capability interface.

use std::fmt;

use async_trait::async_trait;
use bridge::BridgeClient;
use envelope::{Envelope, Params};

use crate::schema::ParamSpec;

/// Tool grouping, used for listing and discovery logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Rhino,
    Grasshopper,
    Utility,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rhino => "rhino",
            Self::Grasshopper => "grasshopper",
            Self::Utility => "utility",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, described, schema-bearing invocable unit.
///
/// `invoke` receives arguments already checked against `params()` with
/// defaults filled in, and always answers with an envelope.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn category(&self) -> Category;

    /// Host endpoint the tool calls.
    fn endpoint(&self) -> &str;

    fn params(&self) -> &[ParamSpec];

    async fn invoke(&self, bridge: &BridgeClient, args: Params) -> Envelope;
}

/// Rewrites tool arguments into the endpoint's request body.
pub type ArgMapper = fn(Params) -> Params;

/// A tool that forwards its arguments to one host endpoint.
#[derive(Debug, Clone)]
pub struct BridgeTool {
    name: &'static str,
    description: &'static str,
    category: Category,
    endpoint: &'static str,
    params: Vec<ParamSpec>,
    map_args: Option<ArgMapper>,
}

impl BridgeTool {
    pub fn new(
        name: &'static str,
        endpoint: &'static str,
        category: Category,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            description,
            category,
            endpoint,
            params: Vec::new(),
            map_args: None,
        }
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn map_args(mut self, mapper: ArgMapper) -> Self {
        self.map_args = Some(mapper);
        self
    }
}

#[async_trait]
impl Tool for BridgeTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn category(&self) -> Category {
        self.category
    }

    fn endpoint(&self) -> &str {
        self.endpoint
    }

    fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    async fn invoke(&self, bridge: &BridgeClient, args: Params) -> Envelope {
        let body = match self.map_args {
            Some(mapper) => mapper(args),
            None => args,
        };
        bridge.call(self.endpoint, &body).await
    }
}
