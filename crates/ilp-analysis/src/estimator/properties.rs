//! Properties over randomly generated blocks.

use ilp_ir::{Block, Flag, FlagSet, Instruction, MemOperand, Operand, RegWidth, Register};
use proptest::prelude::*;

use super::*;
use crate::{AnalysisConfig, ILP_SCALE, MemoryAliasing, analyze_block, compute_ilp};

/// Generated blocks only touch these GPR families; r14 and r15 stay free.
const GPR_POOL: u8 = 8;

fn arb_width() -> impl Strategy<Value = RegWidth> {
    prop_oneof![
        Just(RegWidth::Byte),
        Just(RegWidth::Word),
        Just(RegWidth::Dword),
        Just(RegWidth::Qword),
    ]
}

fn arb_register() -> impl Strategy<Value = Register> {
    (0..GPR_POOL, arb_width()).prop_map(|(n, w)| Register::gpr(n, w))
}

fn arb_operand() -> impl Strategy<Value = Operand> {
    prop_oneof![
        4 => arb_register().prop_map(Operand::Register),
        2 => (arb_register(), prop::sample::select(vec![0i64, 8, 16, -8]))
            .prop_map(|(base, disp)| Operand::Memory(MemOperand::base_disp(base, disp))),
        1 => (arb_register(), arb_register(), prop::sample::select(vec![1u8, 2, 4, 8]))
            .prop_map(|(base, index, scale)| {
                Operand::Memory(MemOperand::base_disp(base, 0).with_index(index, scale))
            }),
        1 => prop::sample::select(vec![0x1000u64, 0x1008]).prop_map(Operand::Absolute),
        1 => (0x0ff0u64..0x1010).prop_map(|next_ip| Operand::PcRelative {
            next_ip,
            displacement: 0x10,
        }),
    ]
}

fn arb_flags() -> impl Strategy<Value = FlagSet> {
    any::<u8>().prop_map(|bits| {
        Flag::ALL
            .iter()
            .enumerate()
            .filter(|(i, _)| bits & (1 << i) != 0)
            .map(|(_, f)| *f)
            .collect()
    })
}

fn arb_instruction() -> impl Strategy<Value = Instruction> {
    (
        prop::collection::vec(arb_operand(), 0..3),
        prop::collection::vec(arb_operand(), 0..2),
        arb_flags(),
        arb_flags(),
    )
        .prop_map(|(sources, destinations, flags_read, flags_written)| Instruction {
            pc: 0,
            sources,
            destinations,
            flags_read,
            flags_written,
        })
}

fn arb_block() -> impl Strategy<Value = Block> {
    prop::collection::vec(arb_instruction(), 0..32).prop_map(|mut instrs| {
        for (pc, instr) in (0u64..).zip(instrs.iter_mut()) {
            instr.pc = pc * 4;
        }
        Block::from_instructions(instrs)
    })
}

fn arb_aliasing() -> impl Strategy<Value = MemoryAliasing> {
    prop_oneof![Just(MemoryAliasing::Structural), Just(MemoryAliasing::SameBase)]
}

/// Reads a register nothing in a generated block writes, writes another.
fn disjoint_instruction() -> Instruction {
    Instruction::new(0x1_0000)
        .reads(Register::gpr(14, RegWidth::Qword))
        .writes(Register::gpr(15, RegWidth::Qword))
}

proptest! {
    #[test]
    fn test_analysis_is_idempotent(block in arb_block(), aliasing in arb_aliasing()) {
        let config = AnalysisConfig::default().with_memory_aliasing(aliasing);
        let first = analyze_block(&block, &config);
        let second = analyze_block(&block, &config);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_chain_is_shorter_than_block(block in arb_block(), aliasing in arb_aliasing()) {
        let est = CriticalPathEstimator::new(aliasing).estimate(&block.instructions);
        prop_assert_eq!(usize::try_from(est.instruction_count).unwrap(), block.len());
        if block.is_empty() {
            prop_assert_eq!(est.max_chain_depth, 0);
        } else {
            prop_assert!(est.max_chain_depth < est.instruction_count);
        }
    }

    #[test]
    fn test_non_empty_blocks_reach_unity(block in arb_block(), aliasing in arb_aliasing()) {
        let config = AnalysisConfig::default().with_memory_aliasing(aliasing);
        let result = analyze_block(&block, &config).unwrap();
        if block.is_empty() {
            prop_assert_eq!(result.ilp_fixed, 0);
        } else {
            prop_assert!(result.ilp_fixed >= ILP_SCALE);
            prop_assert!(result.ilp_fixed <= result.instruction_count * ILP_SCALE);
        }
    }

    #[test]
    fn test_disjoint_instruction_never_lowers_ilp(block in arb_block(), aliasing in arb_aliasing()) {
        prop_assume!(!block.is_empty());
        let estimator = CriticalPathEstimator::new(aliasing);
        let before = estimator.estimate(&block.instructions);

        let mut instrs = block.instructions.clone();
        instrs.push(disjoint_instruction());
        let after = estimator.estimate(&instrs);

        prop_assert_eq!(after.max_chain_depth, before.max_chain_depth);
        let before_ilp = compute_ilp(before.instruction_count, before.max_chain_depth).unwrap();
        let after_ilp = compute_ilp(after.instruction_count, after.max_chain_depth).unwrap();
        prop_assert!(after_ilp >= before_ilp);
    }

    #[test]
    fn test_independent_instructions_scale_with_count(n in 1u32..200) {
        let instrs: Vec<_> = (0..u64::from(n))
            .map(|i| {
                Instruction::new(i)
                    .reads(Operand::Absolute(0x10_0000 + i * 8))
                    .writes(Operand::Absolute(i * 8))
            })
            .collect();
        let est = CriticalPathEstimator::default().estimate(&instrs);
        prop_assert_eq!(est.max_chain_depth, 0);
        prop_assert_eq!(compute_ilp(est.instruction_count, est.max_chain_depth), Ok(n * ILP_SCALE));
    }
}
