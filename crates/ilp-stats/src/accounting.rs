//! Accounting discipline selection.

use std::fmt;

#[cfg(target_has_atomic = "64")]
use crate::AtomicStats;
use crate::{AccountingSink, GlobalStats, LockedStats};

/// How concurrent block executions update the shared totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AccountingMode {
    /// Both additions under one exclusive lock.
    #[default]
    Locked,
    /// Each addition is its own atomic operation.
    LockFree,
}

impl AccountingMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::LockFree => "lock-free",
        }
    }
}

impl fmt::Display for AccountingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accounting sink selected at startup.
#[derive(Debug)]
pub enum Accounting {
    Locked(LockedStats),
    #[cfg(target_has_atomic = "64")]
    LockFree(AtomicStats),
}

impl Accounting {
    /// Create a sink for `mode`.
    ///
    /// Targets without 64-bit atomics fall back to the locked discipline.
    pub fn new(mode: AccountingMode) -> Self {
        match mode {
            AccountingMode::Locked => Self::Locked(LockedStats::new()),
            #[cfg(target_has_atomic = "64")]
            AccountingMode::LockFree => Self::LockFree(AtomicStats::new()),
            #[cfg(not(target_has_atomic = "64"))]
            AccountingMode::LockFree => {
                tracing::warn!("no 64-bit atomics on this target, using locked accounting");
                Self::Locked(LockedStats::new())
            }
        }
    }

    fn sink(&self) -> &dyn AccountingSink {
        match self {
            Self::Locked(stats) => stats,
            #[cfg(target_has_atomic = "64")]
            Self::LockFree(stats) => stats,
        }
    }
}

impl Default for Accounting {
    fn default() -> Self {
        Self::new(AccountingMode::default())
    }
}

impl AccountingSink for Accounting {
    #[inline]
    fn record_block(&self, instruction_count: u32, ilp_fixed: u32) {
        self.sink().record_block(instruction_count, ilp_fixed);
    }

    fn snapshot(&self) -> GlobalStats {
        self.sink().snapshot()
    }

    fn mode(&self) -> AccountingMode {
        self.sink().mode()
    }
}
