use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process;

use msgwire::{decode_to_json, MsgWireError};
use msgwire_compiler::{build_plans, generate, write_artifacts, Config, Target};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "msgwire")]
#[command(about = "Generate big-endian encoders and decoders from message schemas", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where schemas come from; each flag overrides the config file.
#[derive(clap::Args)]
struct SourceArgs {
    /// Root directory holding `<pkg>/msg/<Name>.msg` files (repeatable)
    #[arg(short = 'm', long = "msg-path")]
    msg_paths: Vec<PathBuf>,

    /// JSON document mapping type names to field lists
    #[arg(short, long)]
    schema_json: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate codecs for the given root types
    Generate {
        /// Root types, e.g. `geometry_msgs/msg/Twist`
        messages: Vec<String>,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// `c` or `rust`
        #[arg(short, long)]
        target: Option<Target>,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print the codec plans of the given types as JSON
    Plan {
        messages: Vec<String>,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Decode a binary record and print it as JSON
    Decode {
        /// Type of the record
        #[arg(short = 'T', long = "type")]
        type_name: String,

        /// File holding the encoded bytes
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        source: SourceArgs,
    },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli, source: &SourceArgs) -> Result<Config, MsgWireError> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if !source.msg_paths.is_empty() {
        config.msg_paths = source.msg_paths.clone();
    }
    if source.schema_json.is_some() {
        config.schema_json = source.schema_json.clone();
    }
    Ok(config)
}

fn main() -> Result<(), MsgWireError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Generate { messages, output_dir, target, source } => {
            let mut config = load_config(&cli, source)?;
            if !messages.is_empty() {
                config.messages = messages.clone();
            }
            if let Some(target) = target {
                config.target = *target;
            }
            if output_dir.is_some() {
                config.output_dir = output_dir.clone();
            }
            let output_dir = config
                .output_dir
                .clone()
                .ok_or_else(|| MsgWireError::Config("No output directory: pass --output-dir".to_string()))?;

            let roots = config.messages_or_default();
            info!("Generating {} code for {} types", config.target, roots.len());
            let report = generate(config.source()?, &roots, config.target)?;

            for entry in &report.types {
                match &entry.outcome {
                    Ok(_) => println!("  ✓ {}", entry.type_name),
                    Err(err) => println!("  ✗ {}: {}", entry.type_name, err),
                }
            }
            let written = write_artifacts(&report, &output_dir)?;
            println!("Wrote {} files to {}", written, output_dir.display());

            if !report.is_success() {
                process::exit(1);
            }
            Ok(())
        }

        Commands::Plan { messages, source } => {
            let config = load_config(&cli, source)?;
            let roots = if messages.is_empty() { config.messages_or_default() } else { messages.clone() };
            let plans = build_plans(config.source()?, &roots)?;
            println!("{}", serde_json::to_string_pretty(plans.plans())?);
            Ok(())
        }

        Commands::Decode { type_name, input, source } => {
            let config = load_config(&cli, source)?;
            let plans = build_plans(config.source()?, &[type_name])?;
            let data = fs::read(input)?;
            println!("{}", decode_to_json(&plans, type_name, &data)?);
            Ok(())
        }
    }
}
