//! Shutdown report.

use std::fmt;

use ilp_analysis::MemoryAliasing;

use crate::{AccountingMode, GlobalStats};

/// Final statistics plus the policies they were measured under.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Report {
    pub stats: GlobalStats,
    pub aliasing: MemoryAliasing,
    pub accounting: AccountingMode,
}

impl Report {
    /// Create a new report from final totals and the policies behind them.
    pub const fn new(
        stats: GlobalStats,
        aliasing: MemoryAliasing,
        accounting: AccountingMode,
    ) -> Self {
        Self {
            stats,
            aliasing,
            accounting,
        }
    }

    /// Instruction-weighted mean ILP, or `None` with no data.
    pub fn average_ilp(&self) -> Option<f64> {
        self.stats.average_ilp()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.average_ilp() {
            Some(avg) => writeln!(f, "Average ILP: {avg:.3}")?,
            None => writeln!(f, "Average ILP: no data")?,
        }
        writeln!(f, "Total instructions: {}", self.stats.total_instructions)?;
        writeln!(f, "Number of basic blocks seen: {}", self.stats.blocks)?;
        writeln!(
            f,
            "               Maximum size: {} instructions",
            self.stats.max_block_size
        )?;
        writeln!(
            f,
            "               Average size: {:5.1} instructions",
            self.stats.average_block_size().unwrap_or(0.0)
        )?;
        writeln!(f, "Memory aliasing: {}", self.aliasing)?;
        write!(f, "Accounting: {}", self.accounting)?;
        if self.stats.is_saturated() {
            write!(f, "\nWarning: totals saturated, average is approximate")?;
        }
        Ok(())
    }
}
