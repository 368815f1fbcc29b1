//! Dynaform CLI
//!
//! Command-line front-end for dynamic form schemas.
//!
//! # Usage
//!
//! ```bash
//! dynaform save --form Signup --field Name:text --field Role:dropdown:Admin,User
//! dynaform save --form Signup --file fields.yaml
//! dynaform show --form Signup --format json
//! dynaform watch --form Signup --interval 5
//! dynaform fill --form Signup
//! dynaform config set backend firestore
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "dynaform")]
#[command(author = "Dynaform")]
#[command(version)]
#[command(about = "Define, store and fill dynamic forms", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    format: output::OutputFormat,

    /// Profile name from config file
    #[arg(long, short, global = true)]
    profile: Option<String>,

    /// Explicit config file, overrides the profile lookup
    #[arg(long, global = true, env = "DYNAFORM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate and store a new schema revision
    Save {
        /// Form name; may also come from the file
        #[arg(long)]
        form: Option<String>,
        /// Field as LABEL:TYPE or LABEL:dropdown:OPT,OPT (repeatable)
        #[arg(long = "field", conflicts_with = "file")]
        fields: Vec<String>,
        /// JSON or YAML file with the field list
        #[arg(long, short = 'i')]
        file: Option<PathBuf>,
    },
    /// Show the latest revision of a form
    Show {
        #[arg(long)]
        form: String,
    },
    /// Follow a form and print each new revision
    Watch {
        #[arg(long)]
        form: String,
        /// Seconds between polls (defaults to the configured interval)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Fill in a form and print the submitted values
    Fill {
        #[arg(long)]
        form: String,
        /// LABEL=VALUE pairs; skips the interactive prompts (repeatable)
        #[arg(long = "value")]
        values: Vec<String>,
    },
    /// Configure the CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let location = config::ConfigLocation::resolve(cli.config, cli.profile.as_deref())?;

    let format = cli.format;
    let context = || -> anyhow::Result<commands::Context> { Ok(commands::Context::new(location.load()?, format)) };

    match cli.command {
        Commands::Save { form, fields, file } => commands::save::handle(&context()?, form, fields, file).await,
        Commands::Show { form } => commands::show::handle(&context()?, &form).await,
        Commands::Watch { form, interval } => commands::watch::handle(&context()?, &form, interval).await,
        Commands::Fill { form, values } => commands::fill::handle(&context()?, &form, values).await,
        Commands::Config { action } => commands::config::handle(action, &location),
    }
}
