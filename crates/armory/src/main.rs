//! Armory - tool registry, chains and concurrent execution from the terminal

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    batch_command, chain_command, init_command, run_command, schema_command, tools_command,
};

/// Armory - run agent tools from the terminal
#[derive(Parser)]
#[command(name = "armory")]
#[command(about = "◆ Tool registry, chain runner and concurrent tool executor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Config file (defaults to ~/.armory/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the starter config
    Init,
    /// List available tools
    Tools,
    /// Print function-calling schemas
    Schema {
        /// Tool name; all structured tools when omitted
        tool: Option<String>,
    },
    /// Execute a single tool
    Run {
        /// Tool name
        tool: String,
        /// Tool input
        input: String,
    },
    /// Run a configured chain
    Chain {
        /// Chain name
        name: String,
        /// Initial input, bound to {input}
        input: String,
    },
    /// Execute tools concurrently
    Batch {
        /// Task as TOOL:INPUT (repeatable)
        #[arg(short, long = "task", required = true)]
        tasks: Vec<String>,
        /// Worker budget (overrides config)
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config;
    let result = match cli.command {
        Commands::Init => init_command(config).await,
        Commands::Tools => tools_command(),
        Commands::Schema { tool } => schema_command(tool),
        Commands::Run { tool, input } => run_command(tool, input),
        Commands::Chain { name, input } => chain_command(config, name, input).await,
        Commands::Batch { tasks, workers } => batch_command(config, tasks, workers).await,
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}
