//! Architectural registers and their sub-register aliases.
//!
//! A register operand names a slice (`RegWidth`) of an architectural register
//! (`RegFamily`). Dependency tracking only ever looks at the family: writing
//! `eax` and then reading `al` touches the same physical register.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of general-purpose registers in x86-64.
pub const NUM_GPRS: u8 = 16;
/// Number of vector registers (xmm/ymm/zmm) with AVX-512.
pub const NUM_VECTOR_REGS: u8 = 32;
/// Number of AVX-512 opmask registers.
pub const NUM_MASK_REGS: u8 = 8;

#[rustfmt::skip]
const GPR64: [&str; 16] = [
    "rax", "rcx", "rdx", "rbx", "rsp", "rbp", "rsi", "rdi",
    "r8", "r9", "r10", "r11", "r12", "r13", "r14", "r15",
];
#[rustfmt::skip]
const GPR32: [&str; 16] = [
    "eax", "ecx", "edx", "ebx", "esp", "ebp", "esi", "edi",
    "r8d", "r9d", "r10d", "r11d", "r12d", "r13d", "r14d", "r15d",
];
#[rustfmt::skip]
const GPR16: [&str; 16] = [
    "ax", "cx", "dx", "bx", "sp", "bp", "si", "di",
    "r8w", "r9w", "r10w", "r11w", "r12w", "r13w", "r14w", "r15w",
];
#[rustfmt::skip]
const GPR8: [&str; 16] = [
    "al", "cl", "dl", "bl", "spl", "bpl", "sil", "dil",
    "r8b", "r9b", "r10b", "r11b", "r12b", "r13b", "r14b", "r15b",
];
const GPR8_HIGH: [&str; 4] = ["ah", "ch", "dh", "bh"];
const SEGMENTS: [&str; 6] = ["es", "cs", "ss", "ds", "fs", "gs"];

/// Canonical identity of an architectural register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegFamily {
    /// General-purpose register by encoding number (rax = 0 .. r15 = 15).
    Gpr(u8),
    /// Instruction pointer.
    Ip,
    /// Vector register (xmmN/ymmN/zmmN share family N).
    Vector(u8),
    /// AVX-512 opmask register.
    Mask(u8),
    /// Segment register (es, cs, ss, ds, fs, gs).
    Segment(u8),
    /// Host-specific register with no x86-64 name.
    Other(u16),
}

/// Slice of the architectural register an operand accesses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegWidth {
    /// Low 8 bits.
    Byte,
    /// Bits 8..16 (ah, ch, dh, bh).
    HighByte,
    Word,
    Dword,
    Qword,
    Xmm,
    Ymm,
    Zmm,
    /// The register has no narrower aliases.
    Full,
}

/// A register operand: an architectural family accessed at some width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Register {
    pub family: RegFamily,
    pub width: RegWidth,
}

impl Register {
    /// Create a register from family and width.
    pub const fn new(family: RegFamily, width: RegWidth) -> Self {
        Self { family, width }
    }

    /// General-purpose register by encoding number.
    pub const fn gpr(number: u8, width: RegWidth) -> Self {
        Self::new(RegFamily::Gpr(number), width)
    }

    /// Vector register by number.
    pub const fn vector(number: u8, width: RegWidth) -> Self {
        Self::new(RegFamily::Vector(number), width)
    }

    /// Canonical identity used for dependency tracking.
    pub const fn family(&self) -> RegFamily {
        self.family
    }
}

/// Error returned when a register name is not recognized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown register name: {name:?}")]
pub struct ParseRegisterError {
    pub name: String,
}

fn lookup(table: &[&str], name: &str) -> Option<u8> {
    (0u8..)
        .zip(table.iter())
        .find(|(_, n)| **n == name)
        .map(|(i, _)| i)
}

fn numbered(name: &str, prefix: &str, limit: u8) -> Option<u8> {
    let digits = name.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u8>().ok().filter(|n| *n < limit)
}

impl FromStr for Register {
    type Err = ParseRegisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();

        let gpr_tables = [
            (&GPR64, RegWidth::Qword),
            (&GPR32, RegWidth::Dword),
            (&GPR16, RegWidth::Word),
            (&GPR8, RegWidth::Byte),
        ];
        for (table, width) in gpr_tables {
            if let Some(n) = lookup(table, &name) {
                return Ok(Self::gpr(n, width));
            }
        }
        if let Some(n) = lookup(&GPR8_HIGH, &name) {
            return Ok(Self::gpr(n, RegWidth::HighByte));
        }
        if let Some(n) = lookup(&SEGMENTS, &name) {
            return Ok(Self::new(RegFamily::Segment(n), RegWidth::Full));
        }

        match name.as_str() {
            "rip" => return Ok(Self::new(RegFamily::Ip, RegWidth::Qword)),
            "eip" => return Ok(Self::new(RegFamily::Ip, RegWidth::Dword)),
            "ip" => return Ok(Self::new(RegFamily::Ip, RegWidth::Word)),
            _ => {}
        }

        for (prefix, width) in [
            ("xmm", RegWidth::Xmm),
            ("ymm", RegWidth::Ymm),
            ("zmm", RegWidth::Zmm),
        ] {
            if let Some(n) = numbered(&name, prefix, NUM_VECTOR_REGS) {
                return Ok(Self::vector(n, width));
            }
        }
        if let Some(n) = numbered(&name, "k", NUM_MASK_REGS) {
            return Ok(Self::new(RegFamily::Mask(n), RegWidth::Full));
        }

        Err(ParseRegisterError {
            name: s.to_string(),
        })
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.family, self.width) {
            (RegFamily::Gpr(n), width) if n < NUM_GPRS => {
                let idx = usize::from(n);
                let name = match width {
                    RegWidth::Byte => GPR8[idx],
                    RegWidth::HighByte if idx < GPR8_HIGH.len() => GPR8_HIGH[idx],
                    RegWidth::Word => GPR16[idx],
                    RegWidth::Dword => GPR32[idx],
                    _ => GPR64[idx],
                };
                f.write_str(name)
            }
            (RegFamily::Ip, RegWidth::Dword) => f.write_str("eip"),
            (RegFamily::Ip, RegWidth::Word) => f.write_str("ip"),
            (RegFamily::Ip, _) => f.write_str("rip"),
            (RegFamily::Vector(n), RegWidth::Ymm) => write!(f, "ymm{n}"),
            (RegFamily::Vector(n), RegWidth::Zmm) => write!(f, "zmm{n}"),
            (RegFamily::Vector(n), _) => write!(f, "xmm{n}"),
            (RegFamily::Mask(n), _) => write!(f, "k{n}"),
            (RegFamily::Segment(n), _) if usize::from(n) < SEGMENTS.len() => {
                f.write_str(SEGMENTS[usize::from(n)])
            }
            (RegFamily::Segment(n), _) => write!(f, "seg{n}"),
            (RegFamily::Gpr(n), _) => write!(f, "gpr{n}"),
            (RegFamily::Other(n), _) => write!(f, "reg{n}"),
        }
    }
}
