//! tinyview CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "tinyview")]
#[command(version)]
#[command(about = "Compose HTML pages from nested templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an outer template and everything it includes
    Render {
        /// Outer template file name (searched under the document root)
        template: String,

        /// Document root
        #[arg(short = 'r', long, default_value = ".")]
        root: PathBuf,

        /// Group search root (NAME=PATH), e.g. css=assets/css
        #[arg(short = 'g', long = "group")]
        groups: Vec<String>,

        /// Instance variable (KEY=VALUE); the value is read as a YAML scalar
        #[arg(short = 'V', long = "var")]
        vars: Vec<String>,

        /// YAML file with a mapping of instance variables
        #[arg(long = "vars")]
        vars_file: Option<PathBuf>,

        /// Write output to FILE (use '-' for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Fail when any error diagnostic is raised
        #[arg(long)]
        strict: bool,

        /// Ignore _tinyview.yml in the document root
        #[arg(long)]
        no_config: bool,
    },

    /// Show where a file name resolves to
    Resolve {
        /// File name to look for
        filename: String,

        /// Document root
        #[arg(short = 'r', long, default_value = ".")]
        root: PathBuf,

        /// Directory to search (relative to the document root)
        #[arg(long = "in")]
        search_root: Option<String>,

        /// Print the path relative to the document root
        #[arg(long)]
        relative: bool,

        /// Do not descend into subdirectories
        #[arg(long)]
        flat: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tinyview=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            template,
            root,
            groups,
            vars,
            vars_file,
            output,
            strict,
            no_config,
        } => commands::render::execute(commands::render::RenderArgs {
            template,
            root,
            groups,
            vars,
            vars_file,
            output,
            strict,
            no_config,
        }),
        Commands::Resolve {
            filename,
            root,
            search_root,
            relative,
            flat,
        } => commands::resolve::execute(commands::resolve::ResolveArgs {
            filename,
            root,
            search_root,
            relative,
            flat,
        }),
    }
}
