//! Locally registered tools the server may invoke by name mid-conversation.

use crate::{Error, Result};
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Type-erased tool handler: parsed arguments in, JSON-serializable result out.
pub type ToolHandler = Arc<dyn Fn(Value) -> BoxFuture<Result<Value>> + Send + Sync>;

/// Explicit tool declaration. `parameters` is a JSON-schema-shaped object
/// describing the arguments the server should supply.
#[derive(Clone, Debug)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSpec {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameters: json!({ "type": "object", "properties": {} }),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }
}

struct RegisteredTool {
    spec: ToolSpec,
    handler: ToolHandler,
}

/// Name-keyed registry of callable tools. A name, once registered, is never
/// rebound for the life of the registry.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Register a tool under an explicit schema.
    ///
    /// # Errors
    /// Returns `Error::InvalidHandler` if the spec carries no name, or
    /// `Error::DuplicateTool` if the name is already taken. A failed
    /// registration never alters the existing tool.
    pub fn register<F, Fut>(&mut self, spec: ToolSpec, handler: F) -> Result<()>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let handler: ToolHandler = Arc::new(move |value: Value| -> BoxFuture<Result<Value>> {
            Box::pin(handler(value))
        });
        self.insert(spec, handler)
    }

    /// Register a tool whose parameter schema is derived from the argument
    /// type via `schemars`. Fields without a serde default become `required`;
    /// doc comments on fields become property descriptions.
    ///
    /// # Errors
    /// Returns `Error::DuplicateTool` if the name is already taken, or
    /// `Error::Decode` if the derived schema fails to serialize.
    pub fn register_typed<TArgs, TResp, F, Fut>(
        &mut self,
        name: &str,
        description: &str,
        handler: F,
    ) -> Result<()>
    where
        TArgs: DeserializeOwned + JsonSchema + Send + 'static,
        TResp: Serialize + Send + 'static,
        F: Fn(TArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<TResp>> + Send + 'static,
    {
        let schema = schemars::schema_for!(TArgs);
        let parameters = serde_json::to_value(&schema)?;
        let spec = ToolSpec {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        };

        let user_handler = Arc::new(handler);
        let handler: ToolHandler = Arc::new(move |value: Value| -> BoxFuture<Result<Value>> {
            let user_handler = Arc::clone(&user_handler);
            Box::pin(async move {
                let args: TArgs = serde_json::from_value(value)
                    .map_err(|e| Error::ToolExecution(format!("argument decode: {e}")))?;
                let resp = user_handler(args).await?;
                serde_json::to_value(resp)
                    .map_err(|e| Error::ToolExecution(format!("result encode: {e}")))
            })
        });
        self.insert(spec, handler)
    }

    /// All registered tools in registration order, shaped for a
    /// `session.update` tool list: `{..schema, "type": "function"}`.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Value> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| {
                json!({
                    "type": "function",
                    "name": tool.spec.name,
                    "description": tool.spec.description,
                    "parameters": tool.spec.parameters,
                })
            })
            .collect()
    }

    /// Look up a handler for dispatch.
    ///
    /// # Errors
    /// Returns `Error::UnknownTool` if nothing is registered under `name`.
    pub fn lookup(&self, name: &str) -> Result<ToolHandler> {
        self.tools
            .get(name)
            .map(|tool| Arc::clone(&tool.handler))
            .ok_or_else(|| Error::UnknownTool(name.to_string()))
    }

    fn insert(&mut self, spec: ToolSpec, handler: ToolHandler) -> Result<()> {
        if spec.name.is_empty() {
            return Err(Error::InvalidHandler(
                "tool definition has no name".to_string(),
            ));
        }
        if self.tools.contains_key(&spec.name) {
            return Err(Error::DuplicateTool(spec.name));
        }
        self.order.push(spec.name.clone());
        self.tools
            .insert(spec.name.clone(), RegisteredTool { spec, handler });
        Ok(())
    }
}
