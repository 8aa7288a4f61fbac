//! Agent tool surface
//!
//! Presents the same catalogue as the MCP server in the function-calling
//! shape used by LLM agent frameworks: each tool is a `{"type": "function"}`
//! definition, and invocations take the model's raw JSON argument string and
//! always produce text. Failures come back as `Error: ...` strings so they
//! can be fed straight back to the model.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::ops::format_error;
use crate::ssh::CommandRunner;
use crate::tools::{catalogue, JsonObject, Toolbox};

/// A tool definition for function-calling agents
#[derive(Debug, Clone, Serialize)]
pub struct AgentToolDefinition {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: JsonObject,
}

/// The catalogue bound to a command runner, for agent frameworks
#[derive(Clone)]
pub struct AgentToolkit {
    toolbox: Toolbox,
}

impl AgentToolkit {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            toolbox: Toolbox::new(runner),
        }
    }

    /// Function definitions for every tool in the catalogue
    pub fn definitions() -> Vec<AgentToolDefinition> {
        catalogue()
            .into_iter()
            .map(|tool| AgentToolDefinition {
                kind: "function",
                function: FunctionDefinition {
                    name: tool.name,
                    description: tool.description,
                    parameters: tool.input_schema,
                },
            })
            .collect()
    }

    /// Invoke a tool with a JSON-encoded argument object
    ///
    /// An empty argument string is treated as `{}`.
    pub async fn invoke(&self, name: &str, arguments: &str) -> String {
        let arguments = match parse_arguments(arguments) {
            Ok(arguments) => arguments,
            Err(message) => return format!("Error: {}", message),
        };

        match self.toolbox.call(name, arguments).await {
            Ok(reply) => reply.text,
            Err(e) => format_error(&e),
        }
    }
}

fn parse_arguments(arguments: &str) -> std::result::Result<JsonObject, String> {
    if arguments.trim().is_empty() {
        return Ok(JsonObject::new());
    }

    match serde_json::from_str::<Value>(arguments) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(JsonObject::new()),
        Ok(_) => Err("tool arguments must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid tool arguments: {}", e)),
    }
}
