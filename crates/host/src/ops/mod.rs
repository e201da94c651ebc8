//! Built-in operation bodies, grouped by namespace.

mod geometry;
mod selftest;
mod sliders;
pub mod truss;
mod utility;

pub use geometry::Geometry;
pub use selftest::SelfTest;
pub use sliders::Grasshopper;
pub use utility::Utility;

use crate::registry::HandlerNamespace;

/// Every namespace the host scans at startup.
pub fn builtin() -> Vec<Box<dyn HandlerNamespace>> {
    vec![
        Box::new(Geometry),
        Box::new(Grasshopper),
        Box::new(SelfTest),
        Box::new(Utility),
    ]
}
