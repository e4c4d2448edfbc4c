//! Lock-guarded accounting.

use parking_lot::Mutex;

use crate::{AccountingMode, AccountingSink, GlobalStats};

/// Totals guarded by one exclusive lock. Exact under any concurrency.
#[derive(Debug, Default)]
pub struct LockedStats {
    inner: Mutex<GlobalStats>,
}

impl LockedStats {
    /// Create a new set of zeroed totals.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountingSink for LockedStats {
    fn record_block(&self, instruction_count: u32, ilp_fixed: u32) {
        if instruction_count == 0 {
            return;
        }
        self.inner.lock().add_block(instruction_count, ilp_fixed);
    }

    fn snapshot(&self) -> GlobalStats {
        *self.inner.lock()
    }

    fn mode(&self) -> AccountingMode {
        AccountingMode::Locked
    }
}
