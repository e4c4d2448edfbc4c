//! Instruction-level parallelism estimation for basic blocks.
//!
//! The pipeline is: [`LocationClassifier`] maps operands to dependency slots,
//! [`DependencyTracker`] remembers the depth of each slot's latest writer,
//! [`CriticalPathEstimator`] walks the block once, and [`compute_ilp`] turns
//! the result into a fixed-point ILP value.
//!
//! Analysis is pure: nothing is shared between blocks or threads, so the same
//! block can be analyzed any number of times with identical results.

mod error;
mod estimator;
mod location;
mod metric;
mod tracker;

pub use error::*;
pub use estimator::*;
pub use location::*;
pub use metric::*;
pub use tracker::*;

use ilp_ir::Block;
use tracing::debug;

/// Analysis configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Rule for deciding when two memory operands are the same location.
    pub memory_aliasing: MemoryAliasing,
}

impl AnalysisConfig {
    /// Set the memory aliasing rule.
    #[must_use]
    pub const fn with_memory_aliasing(mut self, aliasing: MemoryAliasing) -> Self {
        self.memory_aliasing = aliasing;
        self
    }

    /// Build the estimator for this configuration.
    pub const fn estimator(&self) -> CriticalPathEstimator {
        CriticalPathEstimator::new(self.memory_aliasing)
    }
}

/// Analyze one block end to end.
///
/// # Errors
///
/// Fails only on an internal inconsistency (see [`AnalysisError`]); the
/// offending block must not be accounted.
pub fn analyze_block(block: &Block, config: &AnalysisConfig) -> Result<BlockResult> {
    let estimate = config.estimator().estimate(&block.instructions);
    let ilp_fixed = compute_ilp(estimate.instruction_count, estimate.max_chain_depth)?;
    let result = BlockResult {
        instruction_count: estimate.instruction_count,
        ilp_fixed,
    };

    debug!(
        pc = block.start_pc,
        "ni={}, nc={}, ilp={:.3}",
        estimate.instruction_count,
        estimate.max_chain_depth,
        result.ilp()
    );

    Ok(result)
}
