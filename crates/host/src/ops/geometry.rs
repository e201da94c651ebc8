//! Rhino geometry operations.

use envelope::Params;
use serde_json::{Value, json};

use super::truss::{self, TrussStyle};
use crate::document::Document;
use crate::failure::HandlerError;
use crate::params;
use crate::registry::{HandlerEntry, HandlerNamespace, HandlerResult};

pub struct Geometry;

impl HandlerNamespace for Geometry {
    fn name(&self) -> &'static str {
        "geometry"
    }

    fn handlers(&self) -> Vec<HandlerEntry> {
        vec![
            HandlerEntry::new("/draw_line", "Draw a line in Rhino", draw_line),
            HandlerEntry::new("/get_rhino_info", "Get Rhino session info", get_rhino_info),
            HandlerEntry::new(
                "/generate_truss",
                "Generate a planar roof truss under an upper chord",
                generate_truss,
            ),
        ]
    }
}

fn draw_line(doc: &mut Document, p: &Params) -> HandlerResult {
    let start = params::required_point(p, "start")?;
    let end = params::required_point(p, "end")?;

    let line_id = doc.add_line(start, end);
    let Some(length) = doc.curve_length(&line_id) else {
        return Err(HandlerError::attribute(format!("line {line_id} vanished after creation")));
    };

    Ok(json!({
        "success": true,
        "line_id": line_id.to_string(),
        "start_point": start,
        "end_point": end,
        "length": length,
        "message": format!("Line created successfully with length {length:.2}"),
    }))
}

fn get_rhino_info(doc: &mut Document, _: &Params) -> HandlerResult {
    Ok(json!({
        "success": true,
        "info": {
            "rhino_available": true,
            "grasshopper_available": doc.grasshopper_available(),
            "document_units": doc.units(),
            "object_count": doc.object_count(),
            "is_command_running": false,
        },
        "message": "Rhino information retrieved successfully",
    }))
}

const TRUSS_TAG_KEY: &str = "object_type";
const TRUSS_TAG: &str = "truss_member";

/// Upper bound on `num_divisions`. Bodies run under the execution lock.
pub const MAX_TRUSS_DIVISIONS: u32 = 1000;

fn generate_truss(doc: &mut Document, p: &Params) -> HandlerResult {
    let start = params::point_or(p, "upper_line_start", [0.0, 0.0, 0.0])?;
    let end = params::point_or(p, "upper_line_end", [10.0, 0.0, 0.0])?;
    let depth = params::f64_or(p, "truss_depth", 2.0)?;
    let divisions = params::u32_or(p, "num_divisions", 4)?;
    let style = TrussStyle::parse(params::str_or(p, "truss_type", "Pratt")?);
    let clear_previous = params::bool_or(p, "clear_previous", true)?;

    if divisions == 0 || divisions > MAX_TRUSS_DIVISIONS {
        return Err(HandlerError::value(format!(
            "num_divisions must be between 1 and {MAX_TRUSS_DIVISIONS}, got {divisions}"
        )));
    }
    if !depth.is_finite() || depth <= 0.0 {
        return Err(HandlerError::value(format!("truss_depth must be positive, got {depth}")));
    }

    let cleared = if clear_previous {
        let previous = doc.find_by_user_text(TRUSS_TAG_KEY, TRUSS_TAG);
        doc.delete_objects(&previous)
    } else {
        0
    };

    let members: Vec<Value> = truss::layout(start, end, depth, divisions, style)
        .into_iter()
        .map(|member| {
            let id = doc.add_line(member.start, member.end);
            doc.set_user_text(&id, TRUSS_TAG_KEY, TRUSS_TAG);
            doc.set_user_text(&id, "member_type", member.kind.as_str());
            json!({
                "id": id.to_string(),
                "type": member.kind.as_str(),
                "start": member.start,
                "end": member.end,
            })
        })
        .collect();

    let count = members.len();
    Ok(json!({
        "success": true,
        "truss_members": members,
        "num_members": count,
        "cleared_previous": cleared,
        "truss_depth": depth,
        "num_divisions": divisions,
        "truss_type": style.to_string(),
        "message": format!("{style} truss created successfully with {count} members"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::FailureKind;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn draws_line_with_length() {
        let mut doc = Document::new();
        let out = draw_line(&mut doc, &params(json!({"start": [0, 0, 0], "end": [3, 4, 0]}))).unwrap();
        assert_eq!(out["success"], true);
        assert_eq!(out["length"], 5.0);
        assert!(out["line_id"].as_str().is_some());
        assert_eq!(doc.object_count(), 1);
    }

    #[test]
    fn draw_line_needs_both_points() {
        let mut doc = Document::new();
        let err = draw_line(&mut doc, &params(json!({"start": [0, 0, 0]}))).unwrap_err();
        assert_eq!(err.kind(), &FailureKind::KeyError);
        assert!(err.file_line().contains("geometry.rs"));
    }

    #[test]
    fn truss_replaces_previous_truss() {
        let mut doc = Document::new();
        doc.add_line([0.0; 3], [0.0, 0.0, 1.0]);

        let first = generate_truss(&mut doc, &Params::new()).unwrap();
        assert_eq!(first["num_members"], 17);
        assert_eq!(doc.object_count(), 18);

        let second = generate_truss(&mut doc, &params(json!({"truss_type": "warren"}))).unwrap();
        assert_eq!(second["cleared_previous"], 17);
        assert_eq!(second["truss_type"], "Warren");
        assert_eq!(doc.object_count(), 1 + 12);
    }

    #[test]
    fn truss_rejects_out_of_range_divisions() {
        let mut doc = Document::new();
        for divisions in [0, MAX_TRUSS_DIVISIONS + 1, u32::MAX] {
            let err = generate_truss(&mut doc, &params(json!({"num_divisions": divisions})))
                .unwrap_err();
            assert_eq!(err.kind(), &FailureKind::ValueError);
        }
        assert_eq!(doc.object_count(), 0);

        let out = generate_truss(&mut doc, &params(json!({"num_divisions": MAX_TRUSS_DIVISIONS})))
            .unwrap();
        assert_eq!(out["num_divisions"], MAX_TRUSS_DIVISIONS);
    }
}
