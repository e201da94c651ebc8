//! Grasshopper slider operations.

use envelope::Params;
use serde_json::json;

use crate::document::Document;
use crate::failure::HandlerError;
use crate::params;
use crate::registry::{HandlerEntry, HandlerNamespace, HandlerResult};

pub struct Grasshopper;

impl HandlerNamespace for Grasshopper {
    fn name(&self) -> &'static str {
        "grasshopper"
    }

    fn handlers(&self) -> Vec<HandlerEntry> {
        vec![
            HandlerEntry::new("/list_sliders", "List Grasshopper sliders", list_sliders),
            HandlerEntry::new("/set_slider", "Set Grasshopper slider value", set_slider),
        ]
    }
}

fn list_sliders(doc: &mut Document, _: &Params) -> HandlerResult {
    if !doc.grasshopper_available() {
        return Ok(json!({
            "success": false,
            "error": "Grasshopper is not available",
            "sliders": [],
        }));
    }

    let sliders = doc.sliders();
    Ok(json!({
        "success": true,
        "sliders": sliders,
        "count": sliders.len(),
        "message": format!("Found {} slider components", sliders.len()),
    }))
}

fn set_slider(doc: &mut Document, p: &Params) -> HandlerResult {
    let name = params::required_str(p, "slider_name")?;
    let new_value = params::required_f64(p, "new_value")?;

    if !doc.grasshopper_available() {
        return Ok(json!({
            "success": false,
            "error": "Grasshopper is not available",
            "slider_name": name,
            "new_value": new_value,
        }));
    }

    let Some(slider) = doc.slider_mut(name) else {
        return Ok(json!({
            "success": false,
            "error": format!("Slider '{name}' not found"),
            "slider_name": name,
            "new_value": new_value,
        }));
    };

    if !slider.contains(new_value) {
        return Err(HandlerError::value(format!(
            "value {new_value} is outside slider '{}' range [{}, {}]",
            slider.name, slider.min, slider.max
        )));
    }

    let old_value = std::mem::replace(&mut slider.current_value, new_value);
    Ok(json!({
        "success": true,
        "slider_name": slider.name,
        "old_value": old_value,
        "new_value": new_value,
        "message": format!("Slider '{}' updated to {new_value}", slider.name),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn set_then_list() {
        let mut doc = Document::new();
        let out = set_slider(&mut doc, &params(json!({"slider_name": "width", "new_value": 42}))).unwrap();
        assert_eq!(out["old_value"], 10.0);
        assert_eq!(out["slider_name"], "Width");

        let listed = list_sliders(&mut doc, &Params::new()).unwrap();
        assert_eq!(listed["count"], 3);
        assert_eq!(listed["sliders"][0]["current_value"], 42.0);
    }

    #[test]
    fn unknown_slider_is_domain_failure() {
        let mut doc = Document::new();
        let out = set_slider(&mut doc, &params(json!({"slider_name": "Depth", "new_value": 1}))).unwrap();
        assert_eq!(out["success"], false);
    }

    #[test]
    fn out_of_range_raises() {
        let mut doc = Document::new();
        let err = set_slider(&mut doc, &params(json!({"slider_name": "Count", "new_value": 0}))).unwrap_err();
        assert_eq!(err.kind().name(), "ValueError");
    }

    #[test]
    fn no_grasshopper() {
        let mut doc = Document::without_grasshopper();
        let out = list_sliders(&mut doc, &Params::new()).unwrap();
        assert_eq!(out["success"], false);
    }
}
