//! pii-mask CLI — mask PII in text chunks with an external model program.
//!
//! Usage:
//!   pii-mask render [--text T | --input nodes.json]
//!   pii-mask mask [--text T | --input nodes.json] [--command prog --arg ...] [--config path]

use clap::{Parser, Subcommand};
use pii_mask::predictor::DEFAULT_TIMEOUT;
use pii_mask::{
    CommandConfig, CommandPredictor, LlmPredictor, MaskConfig, Node, PiiNodePostprocessor,
    TextNode,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pii-mask",
    version,
    about = "Mask PII in text chunks using a language model"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to a YAML config file (default: <config_dir>/pii-mask/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the prompt that would be sent for each input
    Render {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Mask PII and print the resulting nodes as JSON
    Mask {
        #[command(flatten)]
        input: InputArgs,
        /// Model program; receives the prompt on stdin, prints the response
        #[arg(long)]
        command: Option<PathBuf>,
        /// Argument passed to the model program (repeatable)
        #[arg(long = "arg", allow_hyphen_values = true)]
        args: Vec<String>,
        /// Per-call timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Model calls in flight at once
        #[arg(long)]
        concurrency: Option<usize>,
        /// Keep masking after a node fails; failed nodes are reported and omitted
        #[arg(long)]
        keep_going: bool,
    },
}

#[derive(clap::Args)]
struct InputArgs {
    /// Text to mask (a single node)
    #[arg(long, conflicts_with = "input")]
    text: Option<String>,
    /// JSON file holding an array of nodes; `-` reads stdin
    #[arg(long)]
    input: Option<PathBuf>,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<MaskConfig, String> {
    match path {
        Some(path) => MaskConfig::load(path).map_err(|e| e.to_string()),
        None => match MaskConfig::default_path().filter(|p| p.is_file()) {
            Some(path) => MaskConfig::load(&path).map_err(|e| e.to_string()),
            None => Ok(MaskConfig::default()),
        },
    }
}

fn read_stdin() -> Result<String, String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| format!("failed to read stdin: {}", e))?;
    Ok(buf)
}

/// Nodes from `--text`, `--input`, or raw text on stdin.
fn read_nodes(input: &InputArgs) -> Result<Vec<Node>, String> {
    if let Some(text) = &input.text {
        return Ok(vec![Node::new(text.as_str())]);
    }
    match &input.input {
        Some(path) => {
            let json = if path.as_os_str() == "-" {
                read_stdin()?
            } else {
                std::fs::read_to_string(path)
                    .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?
            };
            serde_json::from_str(&json).map_err(|e| format!("invalid node JSON: {}", e))
        }
        None => Ok(vec![Node::new(read_stdin()?)]),
    }
}

fn cmd_render(config: &MaskConfig, input: &InputArgs) -> i32 {
    let template = match config.prompt_template() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let nodes = match read_nodes(input) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    for node in &nodes {
        println!("{}", template.render(node.text(), &config.task));
    }
    0
}

struct MaskArgs {
    command: Option<PathBuf>,
    args: Vec<String>,
    timeout: Option<u64>,
    concurrency: Option<usize>,
    keep_going: bool,
}

fn build_predictor(config: &MaskConfig, args: &MaskArgs) -> Result<CommandPredictor, String> {
    let mut command = match (&args.command, &config.command) {
        (Some(program), configured) => CommandConfig {
            program: program.clone(),
            args: args.args.clone(),
            timeout_secs: configured
                .as_ref()
                .map_or(DEFAULT_TIMEOUT.as_secs(), |c| c.timeout_secs),
        },
        (None, Some(configured)) => configured.clone(),
        (None, None) => {
            return Err(
                "no model program configured; pass --command or set 'command' in the config"
                    .to_string(),
            )
        }
    };
    if let Some(secs) = args.timeout {
        command.timeout_secs = secs;
    }
    Ok(command.predictor())
}

fn print_nodes(nodes: &[Node]) -> Result<(), String> {
    let json = serde_json::to_string_pretty(nodes).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

async fn cmd_mask(mut config: MaskConfig, input: &InputArgs, args: MaskArgs) -> i32 {
    if let Some(limit) = args.concurrency {
        config.concurrency = limit;
    }
    let predictor = match build_predictor(&config, &args) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if !predictor.is_available().await {
        eprintln!("Error: model program not found");
        return 1;
    }
    let processor = match PiiNodePostprocessor::from_config(Arc::new(predictor), &config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let nodes = match read_nodes(input) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if args.keep_going {
        let mut masked = Vec::with_capacity(nodes.len());
        let mut failed = 0;
        for result in processor.mask_each(&nodes).await {
            match result {
                Ok(node) => masked.push(node),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    failed += 1;
                }
            }
        }
        if let Err(e) = print_nodes(&masked) {
            eprintln!("Error: {}", e);
            return 1;
        }
        return if failed == 0 { 0 } else { 1 };
    }

    match processor.mask_many(&nodes).await {
        Ok(masked) => match print_nodes(&masked) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Render { input } => cmd_render(&config, &input),
        Commands::Mask {
            input,
            command,
            args,
            timeout,
            concurrency,
            keep_going,
        } => {
            let args = MaskArgs {
                command,
                args,
                timeout,
                concurrency,
                keep_going,
            };
            cmd_mask(config, &input, args).await
        }
    };
    std::process::exit(code);
}
