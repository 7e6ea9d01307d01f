//! Sequential tool chains
//!
//! Each step renders its input template against the running context, executes
//! one tool through the registry, and stores the observation under its output
//! key. A failing tool does not stop the chain; its error text is ordinary
//! data for the following steps. A template that references a missing key
//! aborts the run, and a step writing the reserved `input` key is rejected
//! before anything executes.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use tracing::{debug, info};

pub use armory_config::INPUT_KEY;

use armory_config::ChainConfig;

use crate::registry::ToolRegistry;
use crate::ChainError;

/// One step of a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainStep {
    pub tool_name: String,
    pub input_template: String,
    pub output_key: String,
}

/// Values produced during a chain run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainContext {
    values: BTreeMap<String, String>,
    last_output: Option<String>,
}

impl Serialize for ChainContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

impl ChainContext {
    fn new(input: &str) -> Self {
        let mut values = BTreeMap::new();
        values.insert(INPUT_KEY.to_string(), input.to_string());
        Self {
            values,
            last_output: None,
        }
    }

    fn store(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value.clone());
        self.last_output = Some(value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The chain's original input
    pub fn input(&self) -> &str {
        self.get(INPUT_KEY).unwrap_or_default()
    }

    /// Output of the final step; `None` for an empty chain
    pub fn last_output(&self) -> Option<&str> {
        self.last_output.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.values
    }
}

/// Ordered pipeline of tool invocations
#[derive(Debug, Clone, Default)]
pub struct ToolChain {
    name: String,
    description: String,
    steps: Vec<ChainStep>,
}

impl ToolChain {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            steps: Vec::new(),
        }
    }

    /// Build a chain from its configured definition
    pub fn from_config(config: &ChainConfig) -> Self {
        config.steps.iter().fold(
            Self::new(config.name.clone(), config.description.clone()),
            |chain, step| chain.add_step(&step.tool, &step.input, &step.output_key),
        )
    }

    /// Append a step
    pub fn add_step(
        mut self,
        tool_name: impl Into<String>,
        input_template: impl Into<String>,
        output_key: impl Into<String>,
    ) -> Self {
        self.push_step(tool_name, input_template, output_key);
        self
    }

    /// Append a step through a mutable reference
    pub fn push_step(
        &mut self,
        tool_name: impl Into<String>,
        input_template: impl Into<String>,
        output_key: impl Into<String>,
    ) {
        self.steps.push(ChainStep {
            tool_name: tool_name.into(),
            input_template: input_template.into(),
            output_key: output_key.into(),
        });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn steps(&self) -> &[ChainStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order on the calling thread
    pub fn execute(
        &self,
        registry: &ToolRegistry,
        input: &str,
    ) -> Result<ChainContext, ChainError> {
        if let Some((index, step)) = self
            .steps
            .iter()
            .enumerate()
            .find(|(_, step)| step.output_key == INPUT_KEY)
        {
            return Err(ChainError::ReservedOutputKey {
                step: index,
                tool: step.tool_name.clone(),
            });
        }

        info!(
            "◆ CHAIN '{}' STARTING ({} steps)",
            self.name,
            self.steps.len()
        );
        let mut context = ChainContext::new(input);

        for (index, step) in self.steps.iter().enumerate() {
            let rendered = render_template(&step.input_template, &context)
                .map_err(|e| match e {
                    TemplateFault::Unresolved(key) => ChainError::UnresolvedPlaceholder {
                        step: index,
                        tool: step.tool_name.clone(),
                        key,
                    },
                    TemplateFault::Malformed => ChainError::MalformedTemplate {
                        step: index,
                        tool: step.tool_name.clone(),
                        template: step.input_template.clone(),
                    },
                })?;

            debug!(
                "◆ CHAIN '{}' STEP {}: {} -> {}",
                self.name, index, step.tool_name, step.output_key
            );
            let output = registry.execute(&step.tool_name, &rendered);
            context.store(&step.output_key, output);
        }

        info!("◆ CHAIN '{}' COMPLETE", self.name);
        Ok(context)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum TemplateFault {
    Unresolved(String),
    Malformed,
}

/// Substitute `{key}` placeholders; `{{` and `}}` are literal braces
fn render_template(template: &str, context: &ChainContext) -> Result<String, TemplateFault> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => return Err(TemplateFault::Malformed),
                        Some(k) => key.push(k),
                    }
                }
                let value = context
                    .get(&key)
                    .ok_or(TemplateFault::Unresolved(key))?;
                out.push_str(value);
            }
            '}' => return Err(TemplateFault::Malformed),
            other => out.push(other),
        }
    }

    Ok(out)
}
