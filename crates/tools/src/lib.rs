//! Client-side tools for the Rhino MCP server.
//!
//! Tools are grouped into [`ToolNamespace`]s and scanned once at startup by
//! [`discover`]. The resulting [`ToolRegistry`] is handed to a
//! [`CapabilityPublisher`], which lists the tools for the assistant and
//! routes calls to them. Each tool forwards to one host endpoint through
//! the [`bridge::BridgeClient`].

pub mod catalog;
mod error;
mod publisher;
mod registry;
mod schema;
mod tool;

pub use error::RegistryError;
pub use publisher::{CapabilityPublisher, bind_arguments};
pub use registry::{Discovery, Skipped, ToolNamespace, ToolRegistry, discover};
pub use schema::{ParamSpec, ParamType, input_schema};
pub use tool::{ArgMapper, BridgeTool, Category, Tool};
