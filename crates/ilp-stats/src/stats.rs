//! Global totals.

use ilp_analysis::ILP_SCALE;

/// Running totals across every accounted block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlobalStats {
    /// Instructions executed in accounted blocks.
    pub total_instructions: u64,
    /// Sum of `ilp_fixed * instruction_count` over accounted blocks.
    pub total_ilp_weighted: u64,
    /// Non-empty blocks accounted.
    pub blocks: u64,
    /// Largest block seen, in instructions.
    pub max_block_size: u32,
}

impl GlobalStats {
    /// Fold one block into the totals. Empty blocks are ignored.
    ///
    /// Totals saturate at `u64::MAX` instead of wrapping.
    pub const fn add_block(&mut self, instruction_count: u32, ilp_fixed: u32) {
        if instruction_count == 0 {
            return;
        }
        self.total_instructions = self
            .total_instructions
            .saturating_add(instruction_count as u64);
        self.total_ilp_weighted = self
            .total_ilp_weighted
            .saturating_add(weighted(instruction_count, ilp_fixed));
        self.blocks = self.blocks.saturating_add(1);
        if instruction_count > self.max_block_size {
            self.max_block_size = instruction_count;
        }
    }

    /// Instruction-weighted mean ILP, or `None` with no data.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_ilp(&self) -> Option<f64> {
        if self.total_instructions == 0 {
            return None;
        }
        Some(
            self.total_ilp_weighted as f64
                / self.total_instructions as f64
                / f64::from(ILP_SCALE),
        )
    }

    /// Mean block size in instructions, or `None` with no data.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_block_size(&self) -> Option<f64> {
        if self.blocks == 0 {
            return None;
        }
        Some(self.total_instructions as f64 / self.blocks as f64)
    }

    pub const fn is_empty(&self) -> bool {
        self.total_instructions == 0
    }

    /// Check if a total hit its ceiling, making the average approximate.
    pub const fn is_saturated(&self) -> bool {
        self.total_instructions == u64::MAX || self.total_ilp_weighted == u64::MAX
    }
}

/// Weight of one block in the ILP sum.
pub(crate) const fn weighted(instruction_count: u32, ilp_fixed: u32) -> u64 {
    instruction_count as u64 * ilp_fixed as u64
}
