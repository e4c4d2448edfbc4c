//! Command implementations.

mod analyze;

use crate::cli::{Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Analyze {
            input,
            hex,
            options,
        } => analyze::cmd_analyze(input.as_deref(), hex.as_deref(), options, cli.silent),
    }
}
