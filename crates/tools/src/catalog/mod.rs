//! Built-in tools, one namespace per category.

mod grasshopper;
mod rhino;
mod utility;

pub use grasshopper::GrasshopperTools;
pub use rhino::RhinoTools;
pub use utility::UtilityTools;

use envelope::Params;
use serde_json::Value;

use crate::registry::ToolNamespace;

/// Every namespace the server scans at startup.
pub fn builtin() -> Vec<Box<dyn ToolNamespace>> {
    vec![
        Box::new(RhinoTools),
        Box::new(GrasshopperTools),
        Box::new(UtilityTools),
    ]
}

/// Move `{prefix}_x`, `{prefix}_y`, `{prefix}_z` into one `[x, y, z]` field.
fn gather_point(args: &mut Params, prefix: &str) {
    let mut point = Vec::with_capacity(3);
    for axis in ["x", "y", "z"] {
        let value = args.remove(&format!("{prefix}_{axis}")).unwrap_or(Value::from(0.0));
        point.push(value);
    }
    args.insert(prefix.to_string(), Value::Array(point));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::discover;
    use crate::tool::Category;

    #[test]
    fn builtin_tools_register_cleanly() {
        let discovery = discover(&builtin());
        assert!(discovery.skipped.is_empty(), "{:?}", discovery.skipped);
        let registry = discovery.registry;
        assert_eq!(registry.len(), 10);
        assert_eq!(registry.by_category(Category::Grasshopper).count(), 3);
        assert_eq!(registry.by_category(Category::Utility).count(), 1);
    }

    #[test]
    fn every_tool_targets_a_host_endpoint() {
        let host = host::discover(&host::ops::builtin()).registry;
        for tool in discover(&builtin()).registry.iter() {
            assert!(host.contains(tool.endpoint()), "{} -> {}", tool.name(), tool.endpoint());
        }
    }

    #[tokio::test]
    async fn tools_drive_the_host_end_to_end() {
        use crate::publisher::CapabilityPublisher;
        use bridge::{BridgeClient, BridgeConfig};
        use serde_json::json;

        let host_registry = host::discover(&host::ops::builtin()).registry;
        let server = host::BridgeServer::bind(
            "127.0.0.1:0",
            host::Dispatcher::new(host_registry, host::Document::new()),
        )
        .await
        .unwrap();
        let addr = server.addr();
        let bridge = BridgeClient::new(BridgeConfig::new(addr.ip().to_string(), addr.port())).unwrap();
        let publisher = CapabilityPublisher::new(discover(&builtin()).registry, bridge);

        let line = publisher
            .invoke(
                "draw_line_rhino",
                json!({"start_x": 0, "start_y": 0, "start_z": 0, "end_x": 3, "end_y": 4, "end_z": 0}),
            )
            .await;
        assert!(line.is_success(), "{line:?}");
        assert_eq!(line.get("length"), Some(&json!(5.0)));

        let truss = publisher.invoke("generate_truss", json!({"truss_type": "Howe"})).await;
        assert_eq!(truss.get("num_members"), Some(&json!(17)));

        let info = publisher.invoke("get_rhino_info", Value::Null).await;
        assert_eq!(info.get("info").unwrap()["object_count"], 18);

        let volume = publisher
            .invoke("quantify_volume", json!({"length": 4, "cross_sectional_area": 2.5}))
            .await;
        assert_eq!(volume.get("volume"), Some(&json!(10.0)));

        let slider = publisher
            .invoke("set_grasshopper_slider", json!({"slider_name": "Height", "new_value": 500}))
            .await;
        assert_eq!(slider.error_type(), Some(envelope::ErrorKind::Host("ValueError".into())));
    }

    #[test]
    fn gathers_points() {
        let mut args = Params::new();
        args.insert("start_x".into(), Value::from(1.0));
        args.insert("start_z".into(), Value::from(3.0));
        args.insert("other".into(), Value::from(true));
        gather_point(&mut args, "start");
        assert_eq!(args.get("start"), Some(&serde_json::json!([1.0, 0.0, 3.0])));
        assert!(!args.contains_key("start_x"));
        assert!(args.contains_key("other"));
    }
}
