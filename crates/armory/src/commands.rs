//! Armory command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use armory_config::{self, Config};
use armory_tools::{register_builtin_tools, ConcurrentExecutor, Task, ToolChain, ToolRegistry};

fn resolve_config_path(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(armory_config::config_path)
}

async fn load_config(path: &Path) -> Result<Config> {
    Config::load_from(path)
        .await
        .with_context(|| format!("failed to load config from {}", path.display()))
}

fn builtin_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry);
    registry
}

/// Parse a `TOOL:INPUT` task argument; the input may itself contain colons
fn parse_task(spec: &str) -> Result<Task> {
    let (tool, input) = spec
        .split_once(':')
        .with_context(|| format!("invalid task '{}', expected TOOL:INPUT", spec))?;
    if tool.trim().is_empty() {
        anyhow::bail!("invalid task '{}', tool name is empty", spec);
    }
    Ok(Task::new(tool.trim(), input))
}

/// Write the starter config
pub async fn init_command(path: Option<PathBuf>) -> Result<()> {
    let path = resolve_config_path(path);
    println!("◆ Initializing Armory...");

    let existed = path.exists();
    let config = armory_config::init_at(&path)
        .await
        .with_context(|| format!("failed to initialize {}", path.display()))?;

    if existed {
        println!("Config already present at {}", path.display());
    } else {
        println!("✓ Config written to {}", path.display());
    }
    println!(
        "  workers: {}, chains: {}",
        config.max_workers(),
        config.chains.len()
    );
    Ok(())
}

/// List available tools
pub fn tools_command() -> Result<()> {
    println!("{}", builtin_registry().describe());
    Ok(())
}

/// Print function-calling schemas
pub fn schema_command(tool: Option<String>) -> Result<()> {
    let registry = builtin_registry();

    let output = match tool {
        Some(name) => {
            let schema = registry
                .to_function_schema(&name)
                .with_context(|| format!("no structured tool named '{}'", name))?;
            serde_json::to_string_pretty(&schema)?
        }
        None => serde_json::to_string_pretty(&registry.schemas())?,
    };

    println!("{}", output);
    Ok(())
}

/// Execute a single tool and print the observation
pub fn run_command(tool: String, input: String) -> Result<()> {
    let registry = builtin_registry();
    println!("{}", registry.execute(&tool, &input));
    Ok(())
}

/// Run a configured chain and print its context as JSON
pub async fn chain_command(path: Option<PathBuf>, name: String, input: String) -> Result<()> {
    let path = resolve_config_path(path);
    let config = load_config(&path).await?;

    let definition = config
        .chain(&name)
        .with_context(|| format!("no chain named '{}' in {}", name, path.display()))?;
    let chain = ToolChain::from_config(definition);
    debug!("Running chain '{}' with {} steps", chain.name(), chain.len());

    let registry = builtin_registry();
    let context = chain
        .execute(&registry, &input)
        .with_context(|| format!("chain '{}' failed", name))?;

    println!("{}", serde_json::to_string_pretty(&context)?);
    Ok(())
}

/// Execute tasks concurrently and print results in submission order
pub async fn batch_command(
    path: Option<PathBuf>,
    specs: Vec<String>,
    workers: Option<usize>,
) -> Result<()> {
    let tasks = specs
        .iter()
        .map(|spec| parse_task(spec))
        .collect::<Result<Vec<_>>>()?;

    let workers = match workers {
        Some(workers) => workers,
        None => load_config(&resolve_config_path(path)).await?.max_workers(),
    };

    let executor = ConcurrentExecutor::new(Arc::new(builtin_registry()), workers)?;
    let results = executor.execute_batch(&tasks).await?;
    executor.shutdown().await;

    for (index, result) in results.iter().enumerate() {
        println!("[{}] {}", index, result);
    }
    Ok(())
}
