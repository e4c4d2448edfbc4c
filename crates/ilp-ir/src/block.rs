//! Basic block descriptor.

use crate::instr::Instruction;

/// A straight-line instruction sequence with one entry and one exit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    /// Address of the first instruction.
    pub start_pc: u64,
    /// Instructions in execution order.
    pub instructions: Vec<Instruction>,
}

impl Block {
    /// Create an empty block.
    pub const fn new(start_pc: u64) -> Self {
        Self {
            start_pc,
            instructions: Vec::new(),
        }
    }

    /// Create a block from instructions, taking the start PC from the first one.
    pub fn from_instructions(instructions: Vec<Instruction>) -> Self {
        let start_pc = instructions.first().map_or(0, |i| i.pc);
        Self {
            start_pc,
            instructions,
        }
    }

    /// Add an instruction to the block.
    pub fn push(&mut self, instr: Instruction) {
        if self.instructions.is_empty() {
            self.start_pc = instr.pc;
        }
        self.instructions.push(instr);
    }

    /// Get number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if block is empty.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
