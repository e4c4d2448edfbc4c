//! Critical-path estimation over a block's data dependencies.
//!
//! One forward pass: each instruction issues at the deepest depth among the
//! locations it reads, and everything it writes becomes ready one step later.
//! Only true (read-after-write) dependencies lengthen the chain; a value that
//! is written but never read again does not count.

use ilp_ir::Instruction;
use tracing::trace;

use crate::location::{LocationClassifier, LocationSet, MemoryAliasing};
use crate::tracker::DependencyTracker;

/// Size and longest exercised dependency chain of a block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChainEstimate {
    pub instruction_count: u32,
    /// 0-indexed depth of the deepest instruction (0 = no dependencies).
    pub max_chain_depth: u32,
}

/// Critical-path estimator.
///
/// Holds no per-block state; every call to [`estimate`](Self::estimate) uses
/// a fresh [`DependencyTracker`], so one estimator can serve many threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct CriticalPathEstimator {
    classifier: LocationClassifier,
}

impl CriticalPathEstimator {
    /// Create a new estimator using `aliasing` for memory operands.
    pub const fn new(aliasing: MemoryAliasing) -> Self {
        Self {
            classifier: LocationClassifier::new(aliasing),
        }
    }

    /// Walk `instructions` in execution order and measure the critical path.
    pub fn estimate(&self, instructions: &[Instruction]) -> ChainEstimate {
        let mut tracker = DependencyTracker::new();
        let mut reads = LocationSet::new();
        let mut writes = LocationSet::new();
        let mut result = ChainEstimate::default();

        for instr in instructions {
            reads.clear();
            self.classifier.read_locations(instr, &mut reads);
            let issue = tracker.max_depth_of(&reads);
            result.max_chain_depth = result.max_chain_depth.max(issue);

            writes.clear();
            self.classifier.write_locations(instr, &mut writes);
            tracker.record_write(&writes, issue.saturating_add(1));

            trace!(
                depth = issue,
                reads = reads.len(),
                writes = writes.len(),
                "{instr}"
            );
            result.instruction_count = result.instruction_count.saturating_add(1);
        }

        result
    }
}

#[cfg(test)]
mod properties;
