//! devgen CLI
//!
//! Annotation-driven source generation for Go packages: load annotated
//! source, run every registered tool, and write the generated files back
//! into the packages.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use devgen_core::init_tracing;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "devgen")]
#[command(about = "Annotation-driven source generator for Go packages")]
#[command(version = devgen_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path patterns to generate over (./..., ./pkg/..., explicit dirs)
    #[arg(value_name = "PATTERN")]
    patterns: Vec<String>,

    /// Base directory patterns resolve against (defaults to the cwd)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Configuration file path (skips discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Validate and generate into buffers without writing
    #[arg(long)]
    dry_run: bool,

    /// With --dry-run, emit a machine-readable report on stdout
    #[arg(long, requires = "dry_run")]
    json: bool,

    /// Also generate sibling *_test.go files for tools that support it
    #[arg(long)]
    include_tests: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit the union of every loaded tool's configuration
    Config {
        /// Emit JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Collect every tool's agent rules
    Rules {
        /// Agent to render the rules for
        #[arg(long)]
        agent: String,

        /// Write the rules instead of printing them
        #[arg(short = 'w', long)]
        write: bool,
    },

    /// Write a starter devgen.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose && std::env::var("RUST_LOG").is_err() {
        // SAFETY: set before any other thread is spawned.
        unsafe { std::env::set_var("RUST_LOG", "devgen=debug") };
    }
    init_tracing();

    let result = match cli.command {
        Some(Commands::Config { json }) => {
            commands::config_command(cli.dir.as_deref(), cli.config.as_deref(), json)
        }
        Some(Commands::Rules { agent, write }) => {
            commands::rules_command(cli.dir.as_deref(), cli.config.as_deref(), &agent, write)
        }
        Some(Commands::Init { force }) => commands::init_command(cli.dir.as_deref(), force),
        None => commands::generate_command(commands::GenerateArgs {
            patterns: cli.patterns,
            dir: cli.dir,
            config_path: cli.config,
            dry_run: cli.dry_run,
            json: cli.json,
            include_tests: cli.include_tests,
        }),
    };

    match result {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
