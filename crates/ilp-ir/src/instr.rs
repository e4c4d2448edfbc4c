//! Single instruction descriptor.

use std::fmt;

use crate::flags::FlagSet;
use crate::operand::Operand;

/// One decoded instruction as seen by the analysis.
///
/// Operands that are both read and written (e.g. `add eax, ebx` reads and
/// writes `eax`) appear in both lists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Instruction {
    /// Address of this instruction.
    pub pc: u64,
    /// Operands whose values are consumed.
    pub sources: Vec<Operand>,
    /// Operands whose values are produced.
    pub destinations: Vec<Operand>,
    pub flags_read: FlagSet,
    pub flags_written: FlagSet,
}

impl Instruction {
    /// Create an instruction with no operands.
    pub const fn new(pc: u64) -> Self {
        Self {
            pc,
            sources: Vec::new(),
            destinations: Vec::new(),
            flags_read: FlagSet::EMPTY,
            flags_written: FlagSet::EMPTY,
        }
    }

    /// Add a source operand.
    #[must_use]
    pub fn reads(mut self, operand: impl Into<Operand>) -> Self {
        self.sources.push(operand.into());
        self
    }

    /// Add a destination operand.
    #[must_use]
    pub fn writes(mut self, operand: impl Into<Operand>) -> Self {
        self.destinations.push(operand.into());
        self
    }

    /// Add an operand that is both read and written.
    #[must_use]
    pub fn modifies(self, operand: impl Into<Operand>) -> Self {
        let operand = operand.into();
        self.reads(operand).writes(operand)
    }

    #[must_use]
    pub const fn reads_flags(mut self, flags: FlagSet) -> Self {
        self.flags_read = self.flags_read.union(flags);
        self
    }

    #[must_use]
    pub const fn writes_flags(mut self, flags: FlagSet) -> Self {
        self.flags_written = self.flags_written.union(flags);
        self
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |ops: &[Operand]| {
            ops.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "{:#x}: {} <- {}",
            self.pc,
            join(&self.destinations),
            join(&self.sources)
        )?;
        if !self.flags_read.is_empty() {
            write!(f, " r{}", self.flags_read)?;
        }
        if !self.flags_written.is_empty() {
            write!(f, " w{}", self.flags_written)?;
        }
        Ok(())
    }
}
