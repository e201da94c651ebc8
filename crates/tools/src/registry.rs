//! Tool registry: tool name to descriptor and thunk.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::RegistryError;
use crate::tool::{Category, Tool};

/// A group of tools scanned at startup.
pub trait ToolNamespace: Send + Sync {
    fn name(&self) -> &'static str;

    fn tools(&self) -> Vec<Arc<dyn Tool>>;
}

/// Tool table. Populated once at startup, read-only afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails if the name is taken or the declaration is malformed.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        validate(tool.as_ref())?;
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Every tool, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values().filter(move |tool| tool.category() == category)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.tools.keys()).finish()
    }
}

/// A tool discovery refused to register.
#[derive(Debug, Clone)]
pub struct Skipped {
    pub namespace: &'static str,
    pub tool: String,
    pub error: RegistryError,
}

#[derive(Debug)]
pub struct Discovery {
    pub registry: ToolRegistry,
    pub skipped: Vec<Skipped>,
}

/// Scan `namespaces` in order and register every tool found.
///
/// A bad entry is logged and skipped; the rest still load.
pub fn discover(namespaces: &[Box<dyn ToolNamespace>]) -> Discovery {
    let mut registry = ToolRegistry::new();
    let mut skipped = Vec::new();

    for namespace in namespaces {
        let mut loaded = 0usize;
        for tool in namespace.tools() {
            let name = tool.name().to_string();
            match registry.register(tool) {
                Ok(()) => loaded += 1,
                Err(error) => {
                    warn!(
                        namespace = namespace.name(),
                        tool = %name,
                        error_type = %error.kind(),
                        %error,
                        "skipping tool"
                    );
                    skipped.push(Skipped {
                        namespace: namespace.name(),
                        tool: name,
                        error,
                    });
                }
            }
        }
        info!(namespace = namespace.name(), tools = loaded, "discovered tools");
    }

    for category in [Category::Rhino, Category::Grasshopper, Category::Utility] {
        let count = registry.by_category(category).count();
        info!(%category, tools = count, "registered tools by category");
    }
    info!(tools = registry.len(), skipped = skipped.len(), "tool discovery complete");
    Discovery { registry, skipped }
}

fn validate(tool: &dyn Tool) -> Result<(), RegistryError> {
    let invalid = |reason: String| RegistryError::InvalidTool {
        name: tool.name().to_string(),
        reason,
    };

    let name = tool.name();
    if name.is_empty() {
        return Err(invalid("tool name is empty".into()));
    }
    if name.chars().any(|c| !(c.is_ascii_alphanumeric() || c == '_' || c == '-')) {
        return Err(invalid("tool names may only contain letters, digits, '_' and '-'".into()));
    }
    if !tool.endpoint().starts_with('/') {
        return Err(invalid(format!("endpoint {:?} does not start with '/'", tool.endpoint())));
    }

    let mut seen = BTreeSet::new();
    for param in tool.params() {
        if param.name.is_empty() {
            return Err(invalid("parameter with an empty name".into()));
        }
        if !seen.insert(param.name) {
            return Err(invalid(format!("parameter {:?} declared twice", param.name)));
        }
        if let Some(default) = &param.default {
            if !param.ty.accepts(default) {
                return Err(invalid(format!(
                    "default for {:?} is not a {}",
                    param.name,
                    param.ty.as_str()
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParamSpec, ParamType};
    use crate::tool::BridgeTool;
    use envelope::ErrorKind;

    struct Fixed(Vec<Arc<dyn Tool>>);

    impl ToolNamespace for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn tools(&self) -> Vec<Arc<dyn Tool>> {
            self.0.clone()
        }
    }

    fn tool(name: &'static str, description: &'static str) -> Arc<dyn Tool> {
        Arc::new(BridgeTool::new(name, "/test_echo", Category::Utility, description))
    }

    #[test]
    fn duplicate_keeps_first() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("test_echo", "first")).unwrap();
        let err = registry.register(tool("test_echo", "second")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("test_echo".into()));
        assert_eq!(registry.get("test_echo").unwrap().description(), "first");
    }

    #[test]
    fn malformed_declarations_rejected() {
        let mut registry = ToolRegistry::new();
        let repeated = BridgeTool::new("add", "/test_add_numbers", Category::Rhino, "")
            .param(ParamSpec::required("a", ParamType::Number, ""))
            .param(ParamSpec::required("a", ParamType::Number, ""));
        let bad_default = BridgeTool::new("add", "/test_add_numbers", Category::Rhino, "")
            .param(ParamSpec::optional("a", ParamType::Number, "", "zero"));

        let bad: [Arc<dyn Tool>; 5] = [
            tool("", ""),
            tool("has space", ""),
            Arc::new(BridgeTool::new("x", "no_slash", Category::Rhino, "")),
            Arc::new(repeated),
            Arc::new(bad_default),
        ];
        for bad in bad {
            assert!(matches!(
                registry.register(bad),
                Err(RegistryError::InvalidTool { .. })
            ));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn discovery_skips_and_continues() {
        let namespaces: Vec<Box<dyn ToolNamespace>> = vec![
            Box::new(Fixed(vec![tool("b_tool", ""), tool("a_tool", "")])),
            Box::new(Fixed(vec![tool("a_tool", "again"), tool("", ""), tool("c_tool", "")])),
        ];
        let discovery = discover(&namespaces);
        let names: Vec<&str> = discovery.registry.iter().map(|t| t.name()).collect();
        assert_eq!(names, ["a_tool", "b_tool", "c_tool"]);
        assert_eq!(discovery.skipped.len(), 2);
        assert_eq!(discovery.skipped[0].tool, "a_tool");
        assert_eq!(discovery.skipped[0].error.kind(), ErrorKind::DuplicateEndpoint);
        assert_eq!(discovery.skipped[1].error.kind(), ErrorKind::InvalidDeclaration);
    }
}
