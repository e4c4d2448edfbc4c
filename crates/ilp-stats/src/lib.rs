//! Process-wide accounting of per-block ILP results.
//!
//! Per-block analysis is thread-local; the totals here are the one shared
//! resource. Two interchangeable [`AccountingSink`] implementations exist:
//! [`LockedStats`] (exclusive lock around both additions) and
//! [`AtomicStats`] (independent atomic additions). [`Accounting`] picks one
//! from an [`AccountingMode`].

mod accounting;
#[cfg(target_has_atomic = "64")]
mod atomic;
mod locked;
mod report;
mod stats;

pub use accounting::*;
#[cfg(target_has_atomic = "64")]
pub use atomic::*;
pub use locked::*;
pub use report::*;
pub use stats::*;

/// Capability to account executed blocks.
pub trait AccountingSink: Send + Sync {
    /// Add one execution of a block of `instruction_count` instructions with
    /// fixed-point ILP `ilp_fixed`. Empty blocks leave the totals unchanged.
    fn record_block(&self, instruction_count: u32, ilp_fixed: u32);

    /// Current totals.
    ///
    /// Only exact once all writers have stopped.
    fn snapshot(&self) -> GlobalStats;

    /// Which discipline this sink uses.
    fn mode(&self) -> AccountingMode;

    /// Instruction-weighted average ILP, or `None` if nothing was recorded.
    fn final_report(&self) -> Option<f64> {
        self.snapshot().average_ilp()
    }
}
