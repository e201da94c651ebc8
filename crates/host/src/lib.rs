//! Host side of the Rhino bridge.
//!
//! Operation bodies are grouped into [`HandlerNamespace`]s. At startup
//! [`discover`] scans the namespaces once into a [`HandlerRegistry`], which
//! is then frozen inside a [`Dispatcher`] and served by a [`BridgeServer`].
//!
//! # Example
//!
//! ```no_run
//! use host::{BridgeServer, Dispatcher, Document, discover, ops};
//!
//! # async fn example() -> host::Result<()> {
//! let discovery = discover(&ops::builtin());
//! let dispatcher = Dispatcher::new(discovery.registry, Document::new());
//! let server = BridgeServer::bind("localhost:8080", dispatcher).await?;
//! server.wait().await?;
//! # Ok(())
//! # }
//! ```

mod diagnostics;
mod dispatch;
mod document;
mod error;
mod failure;
pub mod ops;
pub mod params;
mod registry;
mod server;

pub use diagnostics::{TRACEBACK_TAIL_LINES, install_panic_hook, runtime_version, traceback_tail};
pub use dispatch::{Dispatcher, Reply};
pub use document::{Document, Point3, Slider};
pub use error::{Error, RegistryError, Result};
pub use failure::{FailureKind, HandlerError};
pub use registry::{
    Discovery, Handler, HandlerEntry, HandlerNamespace, HandlerRegistry, HandlerResult, Skipped,
    discover,
};
pub use server::{BridgeServer, SERVER_NAME};
