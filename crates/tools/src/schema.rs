//! Parameter specifications and the JSON Schema rendered from them.

use serde_json::{Map, Value, json};

/// Semantic type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    /// Any JSON number.
    Number,
    /// A whole JSON number.
    Integer,
    Boolean,
    /// An `[x, y, z]` array of numbers.
    Point,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Point => "point",
        }
    }

    /// Whether `value` has this type.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => {
                value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|n| n.fract() == 0.0)
            }
            Self::Boolean => value.is_boolean(),
            Self::Point => value
                .as_array()
                .is_some_and(|items| items.len() == 3 && items.iter().all(Value::is_number)),
        }
    }

    fn json_schema(self) -> Map<String, Value> {
        let schema = match self {
            Self::Point => json!({
                "type": "array",
                "items": {"type": "number"},
                "minItems": 3,
                "maxItems": 3,
            }),
            other => json!({"type": other.as_str()}),
        };
        match schema {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// One parameter of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub description: &'static str,
    /// `None` makes the parameter required.
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            description,
            default: None,
        }
    }

    pub fn optional(
        name: &'static str,
        ty: ParamType,
        description: &'static str,
        default: impl Into<Value>,
    ) -> Self {
        Self {
            name,
            ty,
            description,
            default: Some(default.into()),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Render a parameter list as a JSON Schema object.
pub fn input_schema(params: &[ParamSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in params {
        let mut schema = param.ty.json_schema();
        if !param.description.is_empty() {
            schema.insert("description".into(), param.description.into());
        }
        match &param.default {
            Some(default) => {
                schema.insert("default".into(), default.clone());
            }
            None => required.push(Value::from(param.name)),
        }
        properties.insert(param.name.to_string(), Value::Object(schema));
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}
