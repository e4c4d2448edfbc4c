//! x86 block discovery on top of iced-x86.
//!
//! Decodes raw machine code, converts each instruction's register, memory and
//! RFLAGS usage into an [`Instruction`], and splits the stream into basic
//! blocks: a block ends after any instruction that is not plain fall-through,
//! and a new block starts at every in-range direct branch target.

use iced_x86::{
    Decoder, DecoderOptions, FlowControl, Instruction as X86Instruction, InstructionInfoFactory,
    OpAccess, OpKind, Register as X86Register, RflagsBits, UsedMemory,
};
use ilp_ir::{Block, Flag, FlagSet, Instruction, MemOperand, Operand, RegFamily, RegWidth, Register};
use rustc_hash::FxHashSet;
use tracing::{debug, trace_span};

use crate::error::{Error, Result};

const FLAG_BITS: [(u32, Flag); 6] = [
    (RflagsBits::CF, Flag::Carry),
    (RflagsBits::PF, Flag::Parity),
    (RflagsBits::AF, Flag::Adjust),
    (RflagsBits::ZF, Flag::Zero),
    (RflagsBits::SF, Flag::Sign),
    (RflagsBits::OF, Flag::Overflow),
];

/// Decoder settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct X86Config {
    /// 16, 32 or 64.
    pub bitness: u32,
    /// Address of the first byte.
    pub ip: u64,
}

impl Default for X86Config {
    fn default() -> Self {
        Self {
            bitness: 64,
            ip: 0,
        }
    }
}

/// Decode `code` and split it into basic blocks.
///
/// # Errors
///
/// Fails on an unsupported bitness or on bytes that do not decode to a valid
/// instruction (including a truncated final instruction).
pub fn decode_blocks(code: &[u8], config: X86Config) -> Result<Vec<Block>> {
    let instrs = {
        let _span = trace_span!("decode").entered();
        decode_all(code, config)?
    };
    let leaders = branch_targets(&instrs);

    let _span = trace_span!("split_blocks").entered();
    let mut factory = InstructionInfoFactory::new();
    let mut blocks = Vec::new();
    let mut current = Block::new(config.ip);

    for instr in &instrs {
        if !current.is_empty() && leaders.contains(&instr.ip()) {
            blocks.push(std::mem::replace(&mut current, Block::new(instr.ip())));
        }
        current.push(convert(&mut factory, instr));
        if instr.flow_control() != FlowControl::Next {
            blocks.push(std::mem::replace(&mut current, Block::new(instr.next_ip())));
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    debug!(
        instructions = instrs.len(),
        blocks = blocks.len(),
        "decoded machine code"
    );
    Ok(blocks)
}

fn decode_all(code: &[u8], config: X86Config) -> Result<Vec<X86Instruction>> {
    let mut decoder = Decoder::try_with_ip(config.bitness, code, config.ip, DecoderOptions::NONE)?;
    let mut instrs = Vec::new();
    let mut instr = X86Instruction::default();

    while decoder.can_decode() {
        decoder.decode_out(&mut instr);
        if instr.is_invalid() {
            return Err(Error::InvalidInstruction(instr.ip()));
        }
        instrs.push(instr);
    }
    Ok(instrs)
}

/// Direct branch targets that land inside the decoded range.
fn branch_targets(instrs: &[X86Instruction]) -> FxHashSet<u64> {
    let starts: FxHashSet<u64> = instrs.iter().map(X86Instruction::ip).collect();
    instrs
        .iter()
        .filter(|i| {
            matches!(
                i.op0_kind(),
                OpKind::NearBranch16 | OpKind::NearBranch32 | OpKind::NearBranch64
            )
        })
        .map(X86Instruction::near_branch_target)
        .filter(|target| starts.contains(target))
        .collect()
}

/// Convert one decoded instruction to its operand-level description.
pub fn convert(factory: &mut InstructionInfoFactory, instr: &X86Instruction) -> Instruction {
    let info = factory.info(instr);
    let mut out = Instruction::new(instr.ip());

    for used in info.used_registers() {
        if let Some(reg) = register(used.register()) {
            push_access(&mut out, Operand::Register(reg), used.access());
        }
    }
    for mem in info.used_memory() {
        push_access(&mut out, memory_operand(instr, mem), mem.access());
    }

    out.flags_read = flags(instr.rflags_read());
    out.flags_written = flags(instr.rflags_modified());
    out
}

fn push_access(out: &mut Instruction, operand: Operand, access: OpAccess) {
    match access {
        OpAccess::Read | OpAccess::CondRead => out.sources.push(operand),
        OpAccess::Write => out.destinations.push(operand),
        // A conditional write keeps the old value when it does not happen.
        OpAccess::ReadWrite | OpAccess::ReadCondWrite | OpAccess::CondWrite => {
            out.sources.push(operand);
            out.destinations.push(operand);
        }
        _ => {}
    }
}

fn flags(bits: u32) -> FlagSet {
    FLAG_BITS
        .iter()
        .filter(|(bit, _)| bits & bit != 0)
        .map(|(_, flag)| *flag)
        .collect()
}

#[allow(clippy::cast_possible_wrap)]
fn memory_operand(instr: &X86Instruction, mem: &UsedMemory) -> Operand {
    let base = mem.base();
    if base == X86Register::RIP || base == X86Register::EIP {
        return Operand::Absolute(instr.ip_rel_memory_address());
    }
    let base = register(base);
    let index = register(mem.index());
    if base.is_none() && index.is_none() {
        return Operand::Absolute(mem.displacement());
    }
    Operand::Memory(MemOperand {
        base,
        index,
        scale: u8::try_from(mem.scale()).unwrap_or(1),
        displacement: mem.displacement() as i64,
    })
}

/// Map an iced register onto its family and access width.
pub fn register(reg: X86Register) -> Option<Register> {
    if reg == X86Register::None {
        return None;
    }
    let number = |r: X86Register| u8::try_from(r.number()).ok();

    let (family, width) = if reg.is_gpr() {
        let width = if reg.is_gpr8() {
            if matches!(
                reg,
                X86Register::AH | X86Register::CH | X86Register::DH | X86Register::BH
            ) {
                RegWidth::HighByte
            } else {
                RegWidth::Byte
            }
        } else if reg.is_gpr16() {
            RegWidth::Word
        } else if reg.is_gpr32() {
            RegWidth::Dword
        } else {
            RegWidth::Qword
        };
        (RegFamily::Gpr(number(reg.full_register())?), width)
    } else if reg.is_vector_register() {
        let width = if reg.is_zmm() {
            RegWidth::Zmm
        } else if reg.is_ymm() {
            RegWidth::Ymm
        } else {
            RegWidth::Xmm
        };
        (RegFamily::Vector(number(reg.full_register())?), width)
    } else if reg.is_ip() {
        let width = if reg == X86Register::EIP {
            RegWidth::Dword
        } else {
            RegWidth::Qword
        };
        (RegFamily::Ip, width)
    } else if reg.is_k() {
        (RegFamily::Mask(number(reg)?), RegWidth::Full)
    } else if reg.is_segment_register() {
        (RegFamily::Segment(number(reg)?), RegWidth::Full)
    } else {
        (RegFamily::Other(reg as u16), RegWidth::Full)
    };

    Some(Register::new(family, width))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode64(code: &[u8]) -> Vec<Block> {
        decode_blocks(code, X86Config::default()).unwrap()
    }

    fn reg(name: &str) -> Register {
        name.parse().unwrap()
    }

    #[test]
    fn test_register_mapping() {
        assert_eq!(register(X86Register::AL), Some(reg("al")));
        assert_eq!(register(X86Register::AH), Some(reg("ah")));
        assert_eq!(register(X86Register::R9D), Some(reg("r9d")));
        assert_eq!(register(X86Register::RSP), Some(reg("rsp")));
        assert_eq!(register(X86Register::YMM12), Some(reg("ymm12")));
        assert_eq!(register(X86Register::RIP), Some(reg("rip")));
        assert_eq!(register(X86Register::FS), Some(reg("fs")));
        assert_eq!(register(X86Register::None), None);
    }

    #[test]
    fn test_add_reads_and_writes() {
        // add rax, rbx
        let blocks = decode64(&[0x48, 0x01, 0xd8]);
        assert_eq!(blocks.len(), 1);
        let add = &blocks[0].instructions[0];
        assert!(add.sources.contains(&Operand::Register(reg("rax"))));
        assert!(add.sources.contains(&Operand::Register(reg("rbx"))));
        assert!(add.destinations.contains(&Operand::Register(reg("rax"))));
        assert_eq!(add.flags_written, FlagSet::ARITHMETIC);
        assert!(add.flags_read.is_empty());
    }

    #[test]
    fn test_store_operand() {
        // mov [rbx+8], rax
        let blocks = decode64(&[0x48, 0x89, 0x43, 0x08]);
        let store = &blocks[0].instructions[0];
        assert!(
            store
                .destinations
                .contains(&Operand::mem(reg("rbx"), 8))
        );
        assert!(store.sources.contains(&Operand::Register(reg("rax"))));
    }

    #[test]
    fn test_rip_relative_load_is_absolute() {
        // mov eax, [rip+0x10] at 0x1000 (6 bytes): target 0x1016
        let blocks = decode_blocks(
            &[0x8b, 0x05, 0x10, 0x00, 0x00, 0x00],
            X86Config {
                bitness: 64,
                ip: 0x1000,
            },
        )
        .unwrap();
        let load = &blocks[0].instructions[0];
        assert!(load.sources.contains(&Operand::Absolute(0x1016)));
    }

    #[test]
    fn test_blocks_end_at_control_flow() {
        // xor eax, eax ; ret ; inc eax ; jmp $-2 (back to inc)
        let code = [0x31, 0xc0, 0xc3, 0xff, 0xc0, 0xeb, 0xfc];
        let blocks = decode64(&code);
        let sizes: Vec<_> = blocks.iter().map(Block::len).collect();
        assert_eq!(sizes, vec![2, 2]);
        assert_eq!(blocks[1].start_pc, 3);
    }

    #[test]
    fn test_branch_target_starts_block() {
        // 0: xor eax, eax ; 2: inc eax ; 4: cmp eax, 10 ; 7: jne 2
        let code = [0x31, 0xc0, 0xff, 0xc0, 0x83, 0xf8, 0x0a, 0x75, 0xf9];
        let blocks = decode64(&code);
        let starts: Vec<_> = blocks.iter().map(|b| b.start_pc).collect();
        assert_eq!(starts, vec![0, 2]);
        assert_eq!(blocks[1].len(), 3);
        let jne = &blocks[1].instructions[2];
        assert!(jne.flags_read.contains(Flag::Zero));
    }

    #[test]
    fn test_invalid_code() {
        // Truncated `mov rax, imm64`.
        let err = decode_blocks(&[0x48, 0xb8, 0x01], X86Config::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidInstruction(0)));

        let err = decode_blocks(&[0x90], X86Config { bitness: 8, ip: 0 }).unwrap_err();
        assert!(matches!(err, Error::Decoder(_)));
    }
}
