//! CLI definitions and entry point

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands;
use onnxport::core::models::ModelFamily;
use onnxport::output::OutputMode;

/// onnxport - Export NLP checkpoints to ONNX and certify the result
#[derive(Parser, Debug)]
#[command(
    name = "onnxport",
    version,
    about = "Export NLP checkpoints to ONNX and certify the result",
    long_about = "Export a trained checkpoint to a single ONNX artifact.\n\n\
                  Export strategies are tried in order until one produces a complete\n\
                  artifact. Split weights are inlined when they fit under the 2 GiB\n\
                  limit. The result replaces the live model (keeping one backup) and\n\
                  is validated before being reported as usable."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (machine-readable)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: ./onnxport.toml, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Export, merge, publish and validate a checkpoint
    Convert {
        /// Checkpoint directory
        checkpoint: PathBuf,

        /// Live model directory (default: the checkpoint directory); tokenizer
        /// and config files are copied into it
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Model family: embedding, generative
        #[arg(short, long, default_value = "embedding")]
        family: ModelFamily,

        /// Variant name for the size table (default: directory name)
        #[arg(long)]
        variant: Option<String>,

        /// Skip the runtime load check
        #[arg(long)]
        no_runtime: bool,
    },

    /// Validate a model directory
    Validate {
        /// Model directory
        dir: PathBuf,

        /// Model family: embedding, generative
        #[arg(short, long, default_value = "embedding")]
        family: ModelFamily,

        /// Variant name for the size table (default: directory name)
        #[arg(long)]
        variant: Option<String>,

        /// Skip the runtime load check
        #[arg(long)]
        no_runtime: bool,
    },

    /// Inline a graph's external data into a single file
    Merge {
        /// Graph file (model.onnx)
        graph: PathBuf,

        /// Output file (default: merged/model.onnx next to the graph)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the export attempt order and thresholds in effect
    Plan,

    /// Check which toolchain modules are available
    Doctor,

    /// Show version
    Version,
}

/// Run the CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    let config = cli.config.as_deref();

    match cli.command {
        Some(Command::Convert {
            checkpoint,
            dest,
            family,
            variant,
            no_runtime,
        }) => commands::convert(
            &commands::ConvertArgs {
                checkpoint,
                dest,
                family,
                variant,
                no_runtime,
            },
            config,
            output_mode,
        ),
        Some(Command::Validate {
            dir,
            family,
            variant,
            no_runtime,
        }) => commands::validate(&dir, family, variant.as_deref(), no_runtime, config, output_mode),
        Some(Command::Merge { graph, output }) => {
            commands::merge(&graph, output.as_deref(), config, output_mode)
        },
        Some(Command::Plan) => commands::plan(config, output_mode),
        Some(Command::Doctor) => commands::doctor(config, output_mode),
        Some(Command::Version) => {
            if output_mode == OutputMode::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "version": onnxport::VERSION
                    })
                );
            } else {
                println!("onnxport v{}", onnxport::VERSION);
            }
            Ok(())
        },
        None => {
            if output_mode == OutputMode::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "version": onnxport::VERSION,
                        "hint": "Use --help for usage"
                    })
                );
            } else {
                println!("onnxport v{}", onnxport::VERSION);
                println!("\nRun 'onnxport --help' for usage");
                println!("Run 'onnxport doctor' to check the Python toolchain");
            }
            Ok(())
        },
    }
}
