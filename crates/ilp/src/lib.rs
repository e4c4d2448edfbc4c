//! ILP - instruction-level parallelism estimator
//!
//! Estimates, for every basic block a host observes, how many instructions
//! could issue per cycle given only data dependencies, and keeps a running
//! instruction-weighted average across all executed blocks.
//!
//! # Example
//!
//! ```ignore
//! use ilp::{AccountingMode, AnalysisConfig, Session, x86};
//!
//! let session = Session::new(AnalysisConfig::default(), AccountingMode::Locked);
//! for block in x86::decode_blocks(&code, x86::X86Config::default())? {
//!     if let Some(result) = session.on_basic_block(&block, false)? {
//!         session.record_execution(&result);
//!     }
//! }
//! println!("{}", session.report());
//! ```

// Re-export from sub-crates
pub use ilp_analysis::{
    AnalysisConfig, AnalysisError, BlockResult, ChainEstimate, CriticalPathEstimator,
    DependencyTracker, ILP_SCALE, Location, LocationClassifier, MemoryAliasing, MemoryKey,
    analyze_block, compute_ilp,
};
pub use ilp_ir::{Block, Flag, FlagSet, Instruction, MemOperand, Operand, RegFamily, RegWidth, Register};
pub use ilp_stats::{Accounting, AccountingMode, AccountingSink, GlobalStats, LockedStats, Report};

mod error;
pub mod metrics;
pub mod x86;

pub use error::*;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, trace};

/// Build the worker pool for block replay; `jobs == 0` picks one worker per CPU.
///
/// # Errors
///
/// Returns [`Error::ThreadPool`] if the pool cannot be spawned.
pub fn thread_pool(jobs: usize) -> Result<ThreadPool> {
    let threads = if jobs == 0 { num_cpus::get() } else { jobs };
    debug!(threads, "building worker pool");
    Ok(ThreadPoolBuilder::new().num_threads(threads).build()?)
}

/// Host-facing glue: analyzes blocks as they are discovered and accounts
/// them as they execute.
///
/// A session is shared by every thread of the monitored program; analysis
/// needs no synchronization and accounting goes through the sink.
pub struct Session<S: AccountingSink = Accounting> {
    config: AnalysisConfig,
    sink: S,
}

impl Session {
    /// Create a session with the sink selected by `mode`.
    pub fn new(config: AnalysisConfig, mode: AccountingMode) -> Self {
        Self::with_sink(config, Accounting::new(mode))
    }
}

impl<S: AccountingSink> Session<S> {
    /// Create a session around an existing sink.
    pub const fn with_sink(config: AnalysisConfig, sink: S) -> Self {
        Self { config, sink }
    }

    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Basic-block event from the host.
    ///
    /// Returns `None` when the host is only re-deriving the translation of a
    /// block it has already seen. The same block may be analyzed any number of
    /// times; each analysis is independent.
    ///
    /// # Errors
    ///
    /// Propagates [`AnalysisError`]; the block must not be accounted.
    pub fn on_basic_block(&self, block: &Block, translating: bool) -> Result<Option<BlockResult>> {
        if translating {
            trace!(pc = block.start_pc, "skipping translation replay");
            crate::metrics::record_skipped();
            return Ok(None);
        }
        let result = analyze_block(block, &self.config)?;
        crate::metrics::record_block(&result);
        Ok(Some(result))
    }

    /// Execution-accounting hook: one execution of an analyzed block.
    #[inline]
    pub fn record_execution(&self, result: &BlockResult) {
        self.sink
            .record_block(result.instruction_count, result.ilp_fixed);
    }

    /// Analyze `blocks` in parallel, then account each one `repeat` times.
    ///
    /// Runs on the current rayon pool; wrap in [`ThreadPool::install`] to pick
    /// the workers. Results come back in block order.
    ///
    /// # Errors
    ///
    /// Stops at the first block whose analysis fails; nothing is accounted
    /// in that case.
    pub fn replay(&self, blocks: &[Block], repeat: u32) -> Result<Vec<BlockResult>> {
        let results = blocks
            .par_iter()
            .map(|block| analyze_block(block, &self.config).map_err(Error::from))
            .inspect(|result| {
                if let Ok(result) = result {
                    crate::metrics::record_block(result);
                }
            })
            .collect::<Result<Vec<_>>>()?;

        results.par_iter().for_each(|result| {
            for _ in 0..repeat {
                self.record_execution(result);
            }
        });
        Ok(results)
    }

    /// Shutdown hook: final statistics and the policies behind them.
    pub fn report(&self) -> Report {
        Report::new(
            self.sink.snapshot(),
            self.config.memory_aliasing,
            self.sink.mode(),
        )
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(AnalysisConfig::default(), AccountingMode::default())
    }
}
