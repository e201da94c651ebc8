//! Utility tools.

use std::sync::Arc;

use envelope::Params;
use serde_json::Value;

use crate::registry::ToolNamespace;
use crate::schema::{ParamSpec, ParamType};
use crate::tool::{BridgeTool, Category, Tool};

pub struct UtilityTools;

impl ToolNamespace for UtilityTools {
    fn name(&self) -> &'static str {
        "utility"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![Arc::new(
            BridgeTool::new(
                "quantify_volume",
                "/quantify_volume",
                Category::Utility,
                "Calculate the volume of a material given its length and cross-sectional area. Units are assumed consistent.",
            )
            .param(ParamSpec::required("length", ParamType::Number, "The length of the material"))
            .param(ParamSpec::required(
                "cross_sectional_area",
                ParamType::Number,
                "The cross-sectional area of the material",
            ))
            .map_args(volume_body),
        )]
    }
}

/// The volume is computed here; the host only reports it.
fn volume_body(args: Params) -> Params {
    let number = |key: &str| args.get(key).and_then(Value::as_f64).unwrap_or(0.0);
    let volume = number("length") * number("cross_sectional_area");

    let mut body = Params::new();
    body.insert("volume".into(), Value::from(volume));
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplies_length_by_area() {
        let mut args = Params::new();
        args.insert("length".into(), Value::from(12));
        args.insert("cross_sectional_area".into(), Value::from(0.5));
        assert_eq!(volume_body(args).get("volume"), Some(&Value::from(6.0)));
    }
}
