//! Arithmetic status flags.

use std::fmt;

/// One of the arithmetic status flags tracked as its own location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flag {
    Carry,
    Parity,
    Adjust,
    Zero,
    Sign,
    Overflow,
}

impl Flag {
    /// All tracked flags, in bit order.
    pub const ALL: [Self; 6] = [
        Self::Carry,
        Self::Parity,
        Self::Adjust,
        Self::Zero,
        Self::Sign,
        Self::Overflow,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Short assembler-style name (`cf`, `zf`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Carry => "cf",
            Self::Parity => "pf",
            Self::Adjust => "af",
            Self::Zero => "zf",
            Self::Sign => "sf",
            Self::Overflow => "of",
        }
    }
}

/// Set of status flags read or written by an instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FlagSet(u8);

impl FlagSet {
    pub const EMPTY: Self = Self(0);
    /// Every arithmetic flag (what `add`/`sub`/`cmp` write).
    pub const ARITHMETIC: Self = Self(0b11_1111);

    /// Build a set from a list of flags.
    pub fn of(flags: &[Flag]) -> Self {
        flags.iter().fold(Self::EMPTY, |set, flag| set.with(*flag))
    }

    /// Return this set with `flag` added.
    #[must_use]
    pub const fn with(self, flag: Flag) -> Self {
        Self(self.0 | flag.bit())
    }

    /// Union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, flag: Flag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterate the flags in the set, in bit order.
    pub fn iter(self) -> impl Iterator<Item = Flag> {
        Flag::ALL.into_iter().filter(move |flag| self.contains(*flag))
    }
}

impl FromIterator<Flag> for FlagSet {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Flag::name).collect();
        write!(f, "{{{}}}", names.join(","))
    }
}
