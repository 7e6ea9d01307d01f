//! Tool abstraction and function-calling schema

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Error type returned by tool bodies
pub type ToolError = Box<dyn std::error::Error + Send + Sync>;

/// A named capability with a declared parameter schema.
///
/// Implementations are synchronous and may block; the concurrent executor
/// moves them onto worker threads. The registry calls [`Tool::run`] with the
/// argument object `{"input": <text>}`.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Vec<ToolParameter>;
    fn run(&self, args: Value) -> Result<String, ToolError>;
}

/// JSON type tag of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::Number => "number",
            ParameterType::Integer => "integer",
            ParameterType::Boolean => "boolean",
            ParameterType::Array => "array",
            ParameterType::Object => "object",
        }
    }
}

/// One declared parameter of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    pub description: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

fn default_required() -> bool {
    true
}

impl ToolParameter {
    /// Required parameter without a default
    pub fn new(
        name: impl Into<String>,
        param_type: ParameterType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
            default: None,
        }
    }

    /// Mark the parameter optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Attach a default value
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Property entry for the schema's `properties` object
    fn to_property(&self) -> Value {
        let description = match &self.default {
            Some(default) => format!(
                "{} (default: {})",
                self.description,
                render_default(default)
            ),
            None => self.description.clone(),
        };

        let mut property = json!({
            "type": self.param_type.as_str(),
            "description": description,
        });
        if self.param_type == ParameterType::Array {
            property["items"] = json!({ "type": "string" });
        }
        property
    }
}

fn render_default(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Function-calling schema for one tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub function: FunctionDef,
}

/// Function definition inside a [`FunctionSchema`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl FunctionSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            schema_type: "function".to_string(),
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    /// Build the schema from a tool's declared parameters
    pub fn from_tool(tool: &dyn Tool) -> Self {
        let params = tool.parameters();

        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &params {
            properties.insert(param.name.clone(), param.to_property());
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        Self::new(
            tool.name(),
            tool.description(),
            json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        )
    }
}
