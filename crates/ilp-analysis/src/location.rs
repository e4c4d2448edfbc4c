//! Location classification: which dependency slot an operand occupies.

use std::fmt;

use ilp_ir::{Flag, Instruction, MemOperand, Operand, RegFamily};

/// Rule used to decide when two memory operands are the same location.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MemoryAliasing {
    /// Same base, index, scale and displacement. Proves only trivial
    /// same-address cases; anything else is treated as independent.
    #[default]
    Structural,
    /// Any two operands sharing a base register alias, whatever the
    /// displacement or index.
    SameBase,
}

impl MemoryAliasing {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::SameBase => "same-base",
        }
    }
}

impl fmt::Display for MemoryAliasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a memory location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemoryKey {
    /// Absolute or resolved PC-relative address.
    Address(u64),
    /// Register-relative address compared field by field.
    Structural {
        base: Option<RegFamily>,
        index: Option<RegFamily>,
        scale: u8,
        displacement: i64,
    },
    /// Every address formed from this base register.
    Base(RegFamily),
}

/// A dependency-tracking slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    Register(RegFamily),
    Memory(MemoryKey),
    Flag(Flag),
}

/// Small insertion-ordered set of locations, reused across instructions.
#[derive(Clone, Debug, Default)]
pub struct LocationSet {
    items: Vec<Location>,
}

impl LocationSet {
    /// Create a new empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a location; returns false if it was already present.
    pub fn insert(&mut self, loc: Location) -> bool {
        if self.items.contains(&loc) {
            return false;
        }
        self.items.push(loc);
        true
    }

    pub fn contains(&self, loc: &Location) -> bool {
        self.items.contains(loc)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Location> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a LocationSet {
    type Item = &'a Location;
    type IntoIter = std::slice::Iter<'a, Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Maps operands to locations under a memory aliasing rule.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocationClassifier {
    aliasing: MemoryAliasing,
}

impl LocationClassifier {
    /// Create a new classifier with the given memory rule.
    pub const fn new(aliasing: MemoryAliasing) -> Self {
        Self { aliasing }
    }

    /// Location occupied by an operand.
    pub fn classify(&self, operand: &Operand) -> Location {
        match operand {
            Operand::Register(reg) => Location::Register(reg.family()),
            Operand::Memory(mem) => Location::Memory(self.memory_key(mem)),
            Operand::Absolute(_) | Operand::PcRelative { .. } => {
                let addr = operand.resolved_address().unwrap_or_default();
                Location::Memory(MemoryKey::Address(addr))
            }
        }
    }

    fn memory_key(&self, mem: &MemOperand) -> MemoryKey {
        let base = mem.base.map(|r| r.family());
        let index = mem.index.map(|r| r.family());

        if let (MemoryAliasing::SameBase, Some(base)) = (self.aliasing, base) {
            return MemoryKey::Base(base);
        }
        if base.is_none() && index.is_none() {
            return MemoryKey::Address(0u64.wrapping_add_signed(mem.displacement));
        }
        MemoryKey::Structural {
            base,
            index,
            // Scale is meaningless without an index.
            scale: if index.is_some() { mem.scale } else { 0 },
            displacement: mem.displacement,
        }
    }

    /// Collect every location `instr` must wait for.
    ///
    /// Sources contribute their own location and their address registers;
    /// destinations contribute only their address registers (a store still
    /// needs its address to be ready).
    pub fn read_locations(&self, instr: &Instruction, out: &mut LocationSet) {
        for src in &instr.sources {
            out.insert(self.classify(src));
            for reg in src.address_registers() {
                out.insert(Location::Register(reg.family()));
            }
        }
        for dst in &instr.destinations {
            for reg in dst.address_registers() {
                out.insert(Location::Register(reg.family()));
            }
        }
        for flag in instr.flags_read.iter() {
            out.insert(Location::Flag(flag));
        }
    }

    /// Collect every location `instr` produces.
    pub fn write_locations(&self, instr: &Instruction, out: &mut LocationSet) {
        for dst in &instr.destinations {
            out.insert(self.classify(dst));
        }
        for flag in instr.flags_written.iter() {
            out.insert(Location::Flag(flag));
        }
    }
}
