//! Tool registry
//!
//! Two namespaces share one ordered entry list: structured [`Tool`]s and raw
//! string-to-string functions. Lookup checks structured tools first.
//! Registering an existing name replaces the entry in place and logs a warning.
//!
//! Registration takes `&mut self`; execution takes `&self` and performs no
//! mutation, so a registry behind an `Arc` can serve concurrent workers.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::tool::{FunctionSchema, Tool, ToolError};
use crate::{RegistryError, Result};

type RawFunction = Arc<dyn Fn(&str) -> Result<String, ToolError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Namespace {
    Structured,
    Function,
}

/// A registered capability
#[derive(Clone)]
pub enum RegistryEntry {
    /// Structured tool with a parameter schema
    Tool(Arc<dyn Tool>),
    /// Raw function taking one string
    Function {
        name: String,
        description: String,
        func: RawFunction,
    },
}

impl RegistryEntry {
    pub fn name(&self) -> &str {
        match self {
            RegistryEntry::Tool(tool) => tool.name(),
            RegistryEntry::Function { name, .. } => name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            RegistryEntry::Tool(tool) => tool.description(),
            RegistryEntry::Function { description, .. } => description,
        }
    }

    fn namespace(&self) -> Namespace {
        match self {
            RegistryEntry::Tool(_) => Namespace::Structured,
            RegistryEntry::Function { .. } => Namespace::Function,
        }
    }

    fn invoke(&self, input: &str) -> Result<String, ToolError> {
        match self {
            RegistryEntry::Tool(tool) => tool.run(json!({ "input": input })),
            RegistryEntry::Function { func, .. } => func(input),
        }
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryEntry::Tool(tool) => f.debug_tuple("Tool").field(&tool.name()).finish(),
            RegistryEntry::Function { name, .. } => {
                f.debug_struct("Function").field("name", name).finish()
            }
        }
    }
}

/// Registry of structured tools and raw functions
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<RegistryEntry>,
    index: HashMap<(Namespace, String), usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a structured tool under its own name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    /// Register an already shared structured tool
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        self.insert(RegistryEntry::Tool(tool));
    }

    /// Register a raw function taking and returning a single string
    pub fn register_function<F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        func: F,
    ) where
        F: Fn(&str) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        self.insert(RegistryEntry::Function {
            name: name.into(),
            description: description.into(),
            func: Arc::new(func),
        });
    }

    fn insert(&mut self, entry: RegistryEntry) {
        let key = (entry.namespace(), entry.name().to_string());
        match self.index.get(&key) {
            Some(&slot) => {
                warn!("◆ TOOL '{}' ALREADY REGISTERED, OVERWRITING", key.1);
                self.entries[slot] = entry;
            }
            None => {
                info!("◆ TOOL '{}' REGISTERED", key.1);
                self.index.insert(key, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    fn lookup(&self, namespace: Namespace, name: &str) -> Option<&RegistryEntry> {
        self.index
            .get(&(namespace, name.to_string()))
            .map(|&slot| &self.entries[slot])
    }

    /// Resolve a name, structured tools first
    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.lookup(Namespace::Structured, name)
            .or_else(|| self.lookup(Namespace::Function, name))
    }

    /// Structured tool registered under `name`
    pub fn get_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        match self.lookup(Namespace::Structured, name) {
            Some(RegistryEntry::Tool(tool)) => Some(tool),
            _ => None,
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Entries in listing order: structured tools, then raw functions
    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        let structured = self
            .entries
            .iter()
            .filter(|e| e.namespace() == Namespace::Structured);
        let functions = self
            .entries
            .iter()
            .filter(|e| e.namespace() == Namespace::Function);
        structured.chain(functions)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries().map(|e| e.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Execute a tool and return its output or the failure as a typed error.
    ///
    /// Tool errors and panics are both converted into
    /// [`RegistryError::Execution`].
    pub fn try_execute(&self, name: &str, input: &str) -> Result<String> {
        let entry = self
            .get(name)
            .ok_or_else(|| RegistryError::ToolNotFound(name.to_string()))?;

        debug!("◆ EXECUTING '{}' ({} bytes of input)", name, input.len());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| entry.invoke(input)));

        let message = match outcome {
            Ok(Ok(output)) => return Ok(output),
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };
        error!("◆ TOOL '{}' FAILED: {}", name, message);
        Err(RegistryError::Execution {
            name: name.to_string(),
            message,
        })
    }

    /// Execute a tool and always return an observation string.
    ///
    /// Failures come back as text (`error executing tool '<name>': <cause>` or
    /// `error: tool '<name>' not found`) so a reasoning loop can feed them back
    /// into its prompt.
    pub fn execute(&self, name: &str, input: &str) -> String {
        self.try_execute(name, input).unwrap_or_else(|e| e.to_string())
    }

    /// Human-readable listing of every entry
    pub fn describe(&self) -> String {
        if self.entries.is_empty() {
            return "no tools available".to_string();
        }
        self.entries()
            .map(|e| format!("- {}: {}", e.name(), e.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Function-calling schema of a structured tool
    pub fn to_function_schema(&self, name: &str) -> Option<FunctionSchema> {
        self.get_tool(name).map(|tool| FunctionSchema::from_tool(tool.as_ref()))
    }

    /// Schemas of every structured tool, in registration order
    pub fn schemas(&self) -> Vec<FunctionSchema> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                RegistryEntry::Tool(tool) => Some(FunctionSchema::from_tool(tool.as_ref())),
                RegistryEntry::Function { .. } => None,
            })
            .collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}
