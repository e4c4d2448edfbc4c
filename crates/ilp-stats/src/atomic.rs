//! Lock-free accounting.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::stats::weighted;
use crate::{AccountingMode, AccountingSink, GlobalStats};

/// Totals updated with independent atomic additions.
///
/// Each counter is individually atomic, so no update is lost and no value is
/// ever torn, but the counters are not updated together as a unit: a
/// snapshot taken while writers are running may pair totals from different
/// moments. Read the report only after every writer has stopped.
///
/// The two totals saturate at `u64::MAX` like [`GlobalStats::add_block`].
#[derive(Debug, Default)]
pub struct AtomicStats {
    total_instructions: AtomicU64,
    total_ilp_weighted: AtomicU64,
    blocks: AtomicU64,
    max_block_size: AtomicU32,
}

impl AtomicStats {
    /// Create a new set of zeroed totals.
    pub fn new() -> Self {
        Self::default()
    }
}

fn saturating_fetch_add(counter: &AtomicU64, value: u64) {
    // The closure never returns `None`, so the update cannot fail.
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        Some(current.saturating_add(value))
    });
}

impl AccountingSink for AtomicStats {
    fn record_block(&self, instruction_count: u32, ilp_fixed: u32) {
        if instruction_count == 0 {
            return;
        }
        saturating_fetch_add(&self.total_instructions, u64::from(instruction_count));
        saturating_fetch_add(
            &self.total_ilp_weighted,
            weighted(instruction_count, ilp_fixed),
        );
        self.blocks.fetch_add(1, Ordering::Relaxed);
        self.max_block_size
            .fetch_max(instruction_count, Ordering::Relaxed);
    }

    fn snapshot(&self) -> GlobalStats {
        GlobalStats {
            total_instructions: self.total_instructions.load(Ordering::Relaxed),
            total_ilp_weighted: self.total_ilp_weighted.load(Ordering::Relaxed),
            blocks: self.blocks.load(Ordering::Relaxed),
            max_block_size: self.max_block_size.load(Ordering::Relaxed),
        }
    }

    fn mode(&self) -> AccountingMode {
        AccountingMode::LockFree
    }
}
