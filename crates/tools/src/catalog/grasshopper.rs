//! Grasshopper tools.

use std::sync::Arc;

use crate::registry::ToolNamespace;
use crate::schema::{ParamSpec, ParamType};
use crate::tool::{BridgeTool, Category, Tool};

pub struct GrasshopperTools;

impl ToolNamespace for GrasshopperTools {
    fn name(&self) -> &'static str {
        "grasshopper"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(BridgeTool::new(
                "list_grasshopper_sliders",
                "/list_sliders",
                Category::Grasshopper,
                "List all slider components in the current Grasshopper definition",
            )),
            Arc::new(
                BridgeTool::new(
                    "set_grasshopper_slider",
                    "/set_slider",
                    Category::Grasshopper,
                    "Set the value of a Grasshopper slider by name",
                )
                .param(ParamSpec::required("slider_name", ParamType::String, "Name of the slider component"))
                .param(ParamSpec::required("new_value", ParamType::Number, "New value to set")),
            ),
            Arc::new(BridgeTool::new(
                "test_gh_available",
                "/test_gh_available",
                Category::Grasshopper,
                "Test if Grasshopper is available and get basic information",
            )),
        ]
    }
}
