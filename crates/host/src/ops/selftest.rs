//! Self-test operations for checking the bridge end to end.

use envelope::Params;
use serde_json::json;

use crate::diagnostics;
use crate::document::Document;
use crate::params;
use crate::registry::{HandlerEntry, HandlerNamespace, HandlerResult};

pub struct SelfTest;

impl HandlerNamespace for SelfTest {
    fn name(&self) -> &'static str {
        "selftest"
    }

    fn handlers(&self) -> Vec<HandlerEntry> {
        vec![
            HandlerEntry::new("/test_echo", "Echo a message back", test_echo),
            HandlerEntry::new("/test_system_info", "Host runtime information", test_system_info),
            HandlerEntry::new("/test_add_numbers", "Add two numbers", test_add_numbers),
            HandlerEntry::new(
                "/test_gh_available",
                "Check whether Grasshopper is loaded",
                test_gh_available,
            ),
        ]
    }
}

fn test_echo(_: &mut Document, p: &Params) -> HandlerResult {
    let message = params::str_or(p, "message", "No message provided")?;
    Ok(json!({
        "success": true,
        "original_message": message,
        "echo": format!("Echo: {message}"),
        "message": "Test tool is working correctly!",
    }))
}

fn test_system_info(_: &mut Document, _: &Params) -> HandlerResult {
    let executable = std::env::current_exe()
        .map(|path| path.display().to_string())
        .unwrap_or_default();
    Ok(json!({
        "success": true,
        "runtime_version": diagnostics::runtime_version(),
        "executable": executable,
        "platform": format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        "message": "System info retrieved successfully",
    }))
}

fn test_add_numbers(_: &mut Document, p: &Params) -> HandlerResult {
    let a = params::f64_or(p, "a", 0.0)?;
    let b = params::f64_or(p, "b", 0.0)?;
    let sum = a + b;
    Ok(json!({
        "success": true,
        "a": a,
        "b": b,
        "sum": sum,
        "operation": format!("{a} + {b} = {sum}"),
        "message": "Addition performed successfully",
    }))
}

fn test_gh_available(doc: &mut Document, _: &Params) -> HandlerResult {
    if !doc.grasshopper_available() {
        return Ok(json!({
            "success": true,
            "grasshopper_available": false,
            "message": "Grasshopper plugin not loaded",
        }));
    }
    Ok(json!({
        "success": true,
        "grasshopper_available": true,
        "has_active_document": true,
        "document_object_count": doc.sliders().len(),
        "message": "Grasshopper is available and working",
    }))
}
