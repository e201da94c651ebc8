//! Rhino tools.

use std::sync::Arc;

use envelope::Params;

use super::gather_point;
use crate::registry::ToolNamespace;
use crate::schema::{ParamSpec, ParamType};
use crate::tool::{BridgeTool, Category, Tool};

pub struct RhinoTools;

impl ToolNamespace for RhinoTools {
    fn name(&self) -> &'static str {
        "rhino"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(draw_line()),
            Arc::new(BridgeTool::new(
                "get_rhino_info",
                "/get_rhino_info",
                Category::Rhino,
                "Get information about the current Rhino session",
            )),
            Arc::new(generate_truss()),
            Arc::new(
                BridgeTool::new(
                    "test_echo",
                    "/test_echo",
                    Category::Rhino,
                    "Simple test tool that echoes back a message. Use this to verify the tool discovery system is working.",
                )
                .param(ParamSpec::optional(
                    "message",
                    ParamType::String,
                    "The message to echo back",
                    "Hello from the Rhino MCP server!",
                )),
            ),
            Arc::new(BridgeTool::new(
                "test_system_info",
                "/test_system_info",
                Category::Rhino,
                "Get runtime information from the Rhino bridge",
            )),
            Arc::new(
                BridgeTool::new(
                    "test_add_numbers",
                    "/test_add_numbers",
                    Category::Rhino,
                    "Simple test tool to add two numbers. Verifies parameter passing.",
                )
                .param(ParamSpec::required("a", ParamType::Number, "First number"))
                .param(ParamSpec::required("b", ParamType::Number, "Second number")),
            ),
        ]
    }
}

fn draw_line() -> BridgeTool {
    let mut tool = BridgeTool::new(
        "draw_line_rhino",
        "/draw_line",
        Category::Rhino,
        "Draw a line in Rhino between two 3D points",
    );
    for (name, description) in [
        ("start_x", "X-coordinate of start point"),
        ("start_y", "Y-coordinate of start point"),
        ("start_z", "Z-coordinate of start point"),
        ("end_x", "X-coordinate of end point"),
        ("end_y", "Y-coordinate of end point"),
        ("end_z", "Z-coordinate of end point"),
    ] {
        tool = tool.param(ParamSpec::required(name, ParamType::Number, description));
    }
    tool.map_args(line_body)
}

fn line_body(mut args: Params) -> Params {
    gather_point(&mut args, "start");
    gather_point(&mut args, "end");
    args
}

fn generate_truss() -> BridgeTool {
    BridgeTool::new(
        "generate_truss",
        "/generate_truss",
        Category::Rhino,
        "Generate a planar roof truss below an upper chord line. Previous trusses are replaced unless clear_previous is false.",
    )
    .param(ParamSpec::optional("upper_line_start_x", ParamType::Number, "X of the upper chord start", 0.0))
    .param(ParamSpec::optional("upper_line_start_y", ParamType::Number, "Y of the upper chord start", 0.0))
    .param(ParamSpec::optional("upper_line_start_z", ParamType::Number, "Z of the upper chord start", 0.0))
    .param(ParamSpec::optional("upper_line_end_x", ParamType::Number, "X of the upper chord end", 10.0))
    .param(ParamSpec::optional("upper_line_end_y", ParamType::Number, "Y of the upper chord end", 0.0))
    .param(ParamSpec::optional("upper_line_end_z", ParamType::Number, "Z of the upper chord end", 0.0))
    .param(ParamSpec::optional("truss_depth", ParamType::Number, "Vertical distance between chords", 2.0))
    .param(ParamSpec::optional("num_divisions", ParamType::Integer, "Number of bays, at least 1", 4))
    .param(ParamSpec::optional(
        "truss_type",
        ParamType::String,
        "Pratt, Warren, Howe, Vierendeel, Brown or Onedir",
        "Pratt",
    ))
    .param(ParamSpec::optional("clear_previous", ParamType::Boolean, "Delete earlier truss members first", true))
    .map_args(truss_body)
}

fn truss_body(mut args: Params) -> Params {
    gather_point(&mut args, "upper_line_start");
    gather_point(&mut args, "upper_line_end");
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn line_arguments_become_points() {
        let args = json!({
            "start_x": 0, "start_y": 0, "start_z": 0,
            "end_x": 10, "end_y": 10, "end_z": 5,
        });
        let Value::Object(args) = args else { unreachable!() };
        let body = line_body(args);
        assert_eq!(Value::Object(body), json!({"start": [0, 0, 0], "end": [10, 10, 5]}));
    }
}
