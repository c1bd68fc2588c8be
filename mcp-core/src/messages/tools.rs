//! Tool discovery and invocation payloads.
//!
//! The client never validates call arguments against a tool's input schema;
//! descriptors are for discovery and display only.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListToolsResult {
    /// Tools offered by the server
    #[serde(default)]
    pub tools: Vec<Tool>,

    /// Cursor for the next page, when the server paginates
    #[serde(rename = "nextCursor", default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,

    /// Any other result members
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ListToolsResult {
    /// Find a tool by name.
    pub fn find(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Names of all tools, in server order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name.as_str()).collect()
    }
}

/// Tool descriptor.
///
/// The schema is accepted as either `inputSchema` or `input_schema`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Unique name of the tool
    pub name: String,

    /// Human-readable description of what the tool does
    #[serde(default)]
    pub description: String,

    /// JSON Schema for the tool's arguments
    #[serde(
        rename = "inputSchema",
        alias = "input_schema",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub input_schema: Option<Value>,

    /// Other descriptor members (annotations, title, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tool {
    /// Create a new tool definition.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: None,
            extra: Map::new(),
        }
    }

    /// Set the input schema for this tool.
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

/// Parameters of `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolParams {
    /// Name of the tool to call
    pub name: String,

    /// Arguments, forwarded opaquely
    pub arguments: Value,
}

/// Result of `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    /// Content produced by the tool
    #[serde(default)]
    pub content: Vec<ToolContent>,

    /// Whether the tool reported a failure
    #[serde(rename = "isError", default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,

    /// Any other result members (e.g. `structuredContent`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CallToolResult {
    /// Typed view of a raw `tools/call` result.
    ///
    /// Never fails: content items that do not fit [`ToolContent`] become
    /// `Unknown`, a string `content` or a string result is read as text, and
    /// any other shape yields an empty view.
    pub fn from_value(result: &Value) -> Self {
        match result {
            Value::Object(map) => {
                let content = match map.get("content") {
                    Some(Value::Array(items)) => items
                        .iter()
                        .map(|item| {
                            serde_json::from_value(item.clone()).unwrap_or(ToolContent::Unknown)
                        })
                        .collect(),
                    Some(Value::String(text)) => vec![ToolContent::Text { text: text.clone() }],
                    _ => Vec::new(),
                };
                let extra = map
                    .iter()
                    .filter(|(key, _)| !matches!(key.as_str(), "content" | "isError"))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                Self {
                    content,
                    is_error: map.get("isError").and_then(Value::as_bool),
                    extra,
                }
            }
            Value::String(text) => Self {
                content: vec![ToolContent::Text { text: text.clone() }],
                is_error: None,
                extra: Map::new(),
            },
            _ => Self {
                content: Vec::new(),
                is_error: None,
                extra: Map::new(),
            },
        }
    }

    /// Text of a raw result, or its JSON rendering when it carries no text.
    pub fn text_or_json(result: &Value) -> String {
        let text = Self::from_value(result).text();
        if text.is_empty() {
            result.to_string()
        } else {
            text
        }
    }

    /// Concatenate all text content items.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|item| match item {
                ToolContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether the tool flagged this result as an error.
    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}

/// One item of tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    /// Text content
    #[serde(rename = "text")]
    Text {
        /// The text content
        text: String,
    },

    /// Image content (base64)
    #[serde(rename = "image")]
    Image {
        /// Image data (base64 encoded)
        data: String,

        /// MIME type of the image
        #[serde(rename = "mimeType")]
        mime_type: String,
    },

    /// Embedded resource
    #[serde(rename = "resource")]
    Resource {
        /// The resource object, verbatim
        resource: Value,
    },

    /// A content type this client does not know
    #[serde(other)]
    Unknown,
}
