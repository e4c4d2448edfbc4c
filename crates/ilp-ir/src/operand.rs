//! Instruction operands.

use std::fmt;

use crate::register::Register;

/// Memory operand addressed through registers: `[base + index*scale + disp]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MemOperand {
    pub base: Option<Register>,
    pub index: Option<Register>,
    pub scale: u8,
    pub displacement: i64,
}

impl MemOperand {
    /// `[base + displacement]`.
    pub const fn base_disp(base: Register, displacement: i64) -> Self {
        Self {
            base: Some(base),
            index: None,
            scale: 1,
            displacement,
        }
    }

    /// Attach a scaled index register.
    #[must_use]
    pub const fn with_index(mut self, index: Register, scale: u8) -> Self {
        self.index = Some(index);
        self.scale = scale;
        self
    }

    /// Registers that must be ready before the address can be formed.
    pub fn address_registers(&self) -> impl Iterator<Item = Register> + use<> {
        self.base.into_iter().chain(self.index)
    }
}

impl fmt::Display for MemOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        let mut first = true;
        if let Some(base) = self.base {
            write!(f, "{base}")?;
            first = false;
        }
        if let Some(index) = self.index {
            if !first {
                f.write_str("+")?;
            }
            write!(f, "{index}*{}", self.scale)?;
            first = false;
        }
        if first {
            write!(f, "{:#x}", self.displacement)?;
        } else if self.displacement < 0 {
            write!(f, "-{:#x}", self.displacement.unsigned_abs())?;
        } else if self.displacement > 0 {
            write!(f, "+{:#x}", self.displacement)?;
        }
        f.write_str("]")
    }
}

/// A location-bearing operand as supplied by the host decoder.
///
/// Immediates carry no dependency and are not represented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    Register(Register),
    Memory(MemOperand),
    /// Memory at a fixed absolute address.
    Absolute(u64),
    /// Memory relative to the next instruction's address.
    PcRelative { next_ip: u64, displacement: i64 },
}

impl Operand {
    /// Register operand.
    pub const fn reg(reg: Register) -> Self {
        Self::Register(reg)
    }

    /// `[base + displacement]` memory operand.
    pub const fn mem(base: Register, displacement: i64) -> Self {
        Self::Memory(MemOperand::base_disp(base, displacement))
    }

    /// Resolved target of an absolute or PC-relative operand.
    pub const fn resolved_address(&self) -> Option<u64> {
        match *self {
            Self::Absolute(addr) => Some(addr),
            Self::PcRelative {
                next_ip,
                displacement,
            } => Some(next_ip.wrapping_add_signed(displacement)),
            Self::Register(_) | Self::Memory(_) => None,
        }
    }

    /// Registers read to compute this operand's address (empty for registers).
    pub fn address_registers(&self) -> impl Iterator<Item = Register> + use<> {
        let mem = match self {
            Self::Memory(mem) => Some(*mem),
            _ => None,
        };
        mem.into_iter().flat_map(|m| m.address_registers())
    }
}

impl From<Register> for Operand {
    fn from(reg: Register) -> Self {
        Self::Register(reg)
    }
}

impl From<MemOperand> for Operand {
    fn from(mem: MemOperand) -> Self {
        Self::Memory(mem)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(reg) => write!(f, "{reg}"),
            Self::Memory(mem) => write!(f, "{mem}"),
            Self::Absolute(addr) => write!(f, "[{addr:#x}]"),
            Self::PcRelative { .. } => match self.resolved_address() {
                Some(addr) => write!(f, "[rip:{addr:#x}]"),
                None => f.write_str("[rip]"),
            },
        }
    }
}
