//! Analyze command.

use std::path::Path;

use ilp::x86::{self, X86Config};
use ilp::{AccountingSink, AnalysisConfig, Error, Session};
use tracing::{error, info, info_span};

use crate::cli::{AnalyzeArgs, EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal::{self, Alignment, Table};

/// Handle the `analyze` command.
pub fn cmd_analyze(
    input: Option<&Path>,
    hex: Option<&str>,
    options: &AnalyzeArgs,
    silent: bool,
) -> i32 {
    let code = match load_code(input, hex) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "failed to load machine code");
            terminal::error(&format!("Failed to load input: {e}"));
            return EXIT_FAILURE;
        }
    };

    let x86_config = X86Config {
        bitness: options.bitness,
        ip: options.ip,
    };
    let blocks = match x86::decode_blocks(&code, x86_config) {
        Ok(blocks) => blocks,
        Err(e) => {
            error!(error = %e, "failed to decode machine code");
            terminal::error(&format!("Decode failed: {e}"));
            return EXIT_FAILURE;
        }
    };
    info!(bytes = code.len(), blocks = blocks.len(), "decoded input");

    let pool = match ilp::thread_pool(options.jobs) {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "failed to start workers");
            return EXIT_FAILURE;
        }
    };

    let config = AnalysisConfig::default().with_memory_aliasing(options.aliasing.into());
    let session = Session::new(config, options.accounting.into());
    info!(
        aliasing = %session.config().memory_aliasing,
        accounting = %session.sink().mode(),
        jobs = pool.current_num_threads(),
        "analysis session"
    );

    let results = {
        let _span = info_span!("replay", repeat = options.repeat).entered();
        match pool.install(|| session.replay(&blocks, options.repeat)) {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "analysis failed");
                terminal::error(&format!("Analysis failed: {e}"));
                return EXIT_FAILURE;
            }
        }
    };

    if options.per_block && !silent {
        let mut table = Table::new(vec!["pc", "instructions", "ilp"]).with_alignments(vec![
            Alignment::Left,
            Alignment::Right,
            Alignment::Right,
        ]);
        for (block, result) in blocks.iter().zip(&results) {
            table.add_row(vec![
                format!("{:#x}", block.start_pc),
                result.instruction_count.to_string(),
                format!("{:.3}", result.ilp()),
            ]);
        }
        table.print();
        println!();
    }

    if !silent {
        println!("{}", session.report());
        terminal::success(&format!("Analyzed {} blocks", results.len()));
    }
    EXIT_SUCCESS
}

/// Read machine code from `--hex` or from a file.
fn load_code(input: Option<&Path>, hex: Option<&str>) -> ilp::Result<Vec<u8>> {
    if let Some(text) = hex {
        let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        return Ok(hex::decode(digits)?);
    }
    match input {
        Some(path) => Ok(std::fs::read(path)?),
        None => Err(Error::NoInput),
    }
}
