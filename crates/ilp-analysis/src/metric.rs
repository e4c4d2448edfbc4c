//! Fixed-point ILP metric.

use crate::error::{AnalysisError, Result};

/// Fixed-point scale: an ILP of 1.0 is stored as 1000.
pub const ILP_SCALE: u32 = 1000;

/// Per-block analysis result handed back to the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockResult {
    pub instruction_count: u32,
    /// ILP scaled by [`ILP_SCALE`]. At least 1000 for non-empty blocks, 0 for
    /// empty ones.
    pub ilp_fixed: u32,
}

impl BlockResult {
    /// ILP as a float, for display only.
    pub fn ilp(&self) -> f64 {
        f64::from(self.ilp_fixed) / f64::from(ILP_SCALE)
    }

    pub const fn is_empty(&self) -> bool {
        self.instruction_count == 0
    }
}

/// Convert an instruction count and chain depth into fixed-point ILP.
///
/// Depths are 0-indexed chain positions, so a chain reaching depth `d` spans
/// `d + 1` instructions and ILP is `count / (d + 1)`. A block with no
/// dependencies therefore has ILP equal to its size, and a fully serial block
/// has ILP exactly 1.0. An empty block yields 0.
///
/// # Errors
///
/// Returns [`AnalysisError::IlpBelowUnity`] if the chain is longer than the
/// block, and [`AnalysisError::IlpOverflow`] if the result does not fit a
/// `u32`.
pub fn compute_ilp(instruction_count: u32, max_chain_depth: u32) -> Result<u32> {
    if instruction_count == 0 {
        return Ok(0);
    }

    let path_len = u64::from(max_chain_depth) + 1;
    let ilp_fixed = u64::from(instruction_count) * u64::from(ILP_SCALE) / path_len;

    if ilp_fixed < u64::from(ILP_SCALE) {
        return Err(AnalysisError::IlpBelowUnity {
            instruction_count,
            max_chain_depth,
            ilp_fixed,
        });
    }

    u32::try_from(ilp_fixed).map_err(|_| AnalysisError::IlpOverflow { instruction_count })
}
