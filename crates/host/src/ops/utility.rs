//! Utility operations that do not touch document geometry.

use envelope::Params;
use serde_json::json;

use crate::document::Document;
use crate::params;
use crate::registry::{HandlerEntry, HandlerNamespace, HandlerResult};

pub struct Utility;

impl HandlerNamespace for Utility {
    fn name(&self) -> &'static str {
        "utility"
    }

    fn handlers(&self) -> Vec<HandlerEntry> {
        vec![HandlerEntry::new(
            "/quantify_volume",
            "Report a material volume",
            quantify_volume,
        )]
    }
}

fn quantify_volume(_: &mut Document, p: &Params) -> HandlerResult {
    let volume = params::f64_or(p, "volume", 0.0)?;
    Ok(json!({
        "success": true,
        "volume": volume,
        "message": format!("Calculated volume: {volume:.2} cubic units."),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn formats_volume() {
        let mut p = Params::new();
        p.insert("volume".into(), Value::from(12.3456));
        let out = quantify_volume(&mut Document::new(), &p).unwrap();
        assert_eq!(out["message"], "Calculated volume: 12.35 cubic units.");
    }
}
