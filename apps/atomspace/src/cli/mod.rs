//! # AtomSpace CLI Module
//!
//! ## Available Commands
//!
//! - `types` - List the type hierarchy
//! - `load` - Load a script and report what it built
//! - `query` - Load a script and run its query
//! - `show` - Load a script and render its atoms

mod commands;

use atomspace_core::AtomSpaceError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// AtomSpace - hypergraph knowledge store
///
/// Builds a space from a JSON script and runs structural pattern queries
/// against it.
#[derive(Parser, Debug)]
#[command(name = "atomspace")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (full atom rendering)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered atom types and their parents
    Types {
        /// Script whose custom types should be included
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Load a script and print a summary
    Load {
        /// Path to the JSON script
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Load a script and run its query
    Query {
        /// Path to the JSON script
        #[arg(short, long)]
        file: PathBuf,

        /// Stop at the first binding regardless of the script's mode
        #[arg(long)]
        first: bool,
    },

    /// Load a script and render every atom
    Show {
        /// Path to the JSON script
        #[arg(short, long)]
        file: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), AtomSpaceError> {
    let config = atomspace::load_config(cli.config.as_deref())?;
    let output = Output {
        json_mode: cli.json_mode,
        verbose: cli.verbose,
    };

    match cli.command {
        Some(Commands::Types { file }) => cmd_types(file.as_deref(), &config, output),
        Some(Commands::Load { file }) => cmd_load(&file, &config, output),
        Some(Commands::Query { file, first }) => cmd_query(&file, &config, output, first),
        Some(Commands::Show { file }) => cmd_show(&file, &config, output),
        None => {
            // No subcommand - list the built-in types by default
            cmd_types(None, &config, output)
        }
    }
}
