//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use ilp::{AccountingMode, MemoryAliasing};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "ilp")]
#[command(about = "Instruction-level parallelism estimator for x86 basic blocks")]
#[command(version)]
pub struct Cli {
    /// Show metrics summary after execution
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Enable verbose output (per-block debug lines)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze raw machine code and report the weighted average ILP
    Analyze {
        /// Raw machine code file
        #[arg(value_name = "FILE", required_unless_present = "hex")]
        input: Option<PathBuf>,

        /// Machine code as hex (whitespace allowed), instead of a file
        #[arg(long, conflicts_with = "input")]
        hex: Option<String>,

        #[command(flatten)]
        options: AnalyzeArgs,
    },
}

/// Options shared by analysis commands.
#[derive(clap::Args, Clone, Debug)]
pub struct AnalyzeArgs {
    /// Decoder bitness
    #[arg(long, default_value = "64", value_parser = parse_bitness)]
    pub bitness: u32,

    /// Load address of the first byte (decimal or 0x-prefixed hex)
    #[arg(long, default_value = "0", value_parser = parse_address)]
    pub ip: u64,

    /// Memory aliasing rule
    #[arg(long, value_enum, default_value = "structural")]
    pub aliasing: AliasingArg,

    /// Accounting discipline for the shared totals
    #[arg(long, value_enum, default_value = "locked")]
    pub accounting: AccountingArg,

    /// Number of worker threads (0 = auto)
    #[arg(short = 'j', long, default_value = "0")]
    pub jobs: usize,

    /// Account every block as executed this many times
    #[arg(long, default_value = "1")]
    pub repeat: u32,

    /// Print one line per block before the report
    #[arg(long)]
    pub per_block: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum AliasingArg {
    /// Same base, index, scale and displacement
    #[default]
    Structural,
    /// Same base register
    SameBase,
}

impl From<AliasingArg> for MemoryAliasing {
    fn from(arg: AliasingArg) -> Self {
        match arg {
            AliasingArg::Structural => Self::Structural,
            AliasingArg::SameBase => Self::SameBase,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum AccountingArg {
    /// Exclusive lock around each update
    #[default]
    Locked,
    /// Independent atomic additions
    LockFree,
}

impl From<AccountingArg> for AccountingMode {
    fn from(arg: AccountingArg) -> Self {
        match arg {
            AccountingArg::Locked => Self::Locked,
            AccountingArg::LockFree => Self::LockFree,
        }
    }
}

fn parse_bitness(s: &str) -> Result<u32, String> {
    match s.trim() {
        "16" => Ok(16),
        "32" => Ok(32),
        "64" => Ok(64),
        other => Err(format!("unsupported bitness '{other}' (expected 16, 32 or 64)")),
    }
}

fn parse_address(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid address '{s}': {e}"))
}
