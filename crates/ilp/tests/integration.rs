//! End-to-end tests: machine code in, weighted average ILP out.

use std::thread;

use ilp::x86::{self, X86Config};
use ilp::{
    AccountingMode, AccountingSink, AnalysisConfig, Block, BlockResult, LockedStats,
    MemoryAliasing, Session,
};

// mov eax, 1 ; mov ecx, 2 ; mov edx, 3 ; mov esi, 4
const INDEPENDENT_MOVS: &str = "b801000000b902000000ba03000000be04000000";
// add rax, rbx ; add rax, rcx ; add rax, rdx
const DEPENDENT_ADDS: &str = "4801d84801c84801d0";
// 0: xor eax, eax ; 2: inc eax ; 4: cmp eax, 10 ; 7: jne 2
const COUNTING_LOOP: &str = "31c0ffc083f80a75f9";

fn decode(hex: &str) -> Vec<Block> {
    let code = hex::decode(hex).expect("valid hex");
    x86::decode_blocks(&code, X86Config::default()).expect("decodable code")
}

fn analyze(session: &Session, block: &Block) -> BlockResult {
    session
        .on_basic_block(block, false)
        .expect("analysis succeeds")
        .expect("not translating")
}

#[test]
fn test_independent_movs() {
    let blocks = decode(INDEPENDENT_MOVS);
    assert_eq!(blocks.len(), 1);

    let result = analyze(&Session::default(), &blocks[0]);
    assert_eq!(result.instruction_count, 4);
    assert_eq!(result.ilp_fixed, 4000);
}

#[test]
fn test_dependent_adds() {
    let blocks = decode(DEPENDENT_ADDS);
    let result = analyze(&Session::default(), &blocks[0]);
    assert_eq!(result.instruction_count, 3);
    assert_eq!(result.ilp_fixed, 1000);
}

#[test]
fn test_flags_chain() {
    // cmp eax, ebx ; sete cl ; mov edx, 1
    // sete waits on cmp through ZF; the mov is free.
    let blocks = decode("39d80f94c1ba01000000");
    let result = analyze(&Session::default(), &blocks[0]);
    assert_eq!(result.instruction_count, 3);
    assert_eq!(result.ilp_fixed, 1500);
}

#[test]
fn test_memory_aliasing_policies() {
    // mov [rbx+8], rax ; mov rdx, [rbx+16] ; add rdx, rdx
    let blocks = decode("48894308488b53104801d2");

    // Different displacement: the load does not wait on the store.
    let structural = analyze(&Session::default(), &blocks[0]);
    assert_eq!(structural.ilp_fixed, 1500);

    // Same base: store -> load -> add.
    let same_base = Session::new(
        AnalysisConfig::default().with_memory_aliasing(MemoryAliasing::SameBase),
        AccountingMode::Locked,
    );
    let serial = analyze(&same_base, &blocks[0]);
    assert_eq!(serial.ilp_fixed, 1000);
}

#[test]
fn test_loop_report() {
    let blocks = decode(COUNTING_LOOP);
    assert_eq!(blocks.len(), 2);

    let session = Session::default();
    let results = session.replay(&blocks, 1).unwrap();
    assert_eq!(results[0].instruction_count, 1);
    assert_eq!(results[1].instruction_count, 3);
    assert!(results.iter().all(|r| r.ilp_fixed == 1000));

    let text = session.report().to_string();
    let lines: Vec<_> = text.lines().map(str::trim).collect();
    assert_eq!(lines[0], "Average ILP: 1.000");
    assert_eq!(lines[1], "Total instructions: 4");
    assert_eq!(lines[2], "Number of basic blocks seen: 2");
    assert_eq!(lines[3], "Maximum size: 3 instructions");
    assert_eq!(lines[4], "Average size:   2.0 instructions");
    assert_eq!(lines[5], "Memory aliasing: structural");
    assert_eq!(lines[6], "Accounting: locked");
}

#[test]
fn test_translating_replay_is_ignored() {
    let blocks = decode(DEPENDENT_ADDS);
    let session = Session::default();
    assert!(session.on_basic_block(&blocks[0], true).unwrap().is_none());
    assert_eq!(session.report().average_ilp(), None);
}

fn run_concurrently(mode: AccountingMode) -> Session {
    const THREADS: usize = 4;
    const EXECUTIONS: usize = 1000;

    let movs = decode(INDEPENDENT_MOVS).remove(0);
    let adds = decode(DEPENDENT_ADDS).remove(0);
    let session = Session::new(AnalysisConfig::default(), mode);

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                let movs = analyze(&session, &movs);
                let adds = analyze(&session, &adds);
                for _ in 0..EXECUTIONS {
                    session.record_execution(&movs);
                    session.record_execution(&adds);
                }
            });
        }
    });
    session
}

#[test]
fn test_concurrent_accounting_modes_agree() {
    let locked = run_concurrently(AccountingMode::Locked);
    let lock_free = run_concurrently(AccountingMode::LockFree);

    for session in [&locked, &lock_free] {
        let stats = session.sink().snapshot();
        assert_eq!(stats.total_instructions, 4 * 1000 * 7);
        assert_eq!(stats.blocks, 4 * 1000 * 2);
        assert_eq!(stats.max_block_size, 4);
        // (4 * 4000 + 3 * 1000) / 7 per round
        let avg = session.report().average_ilp().unwrap();
        assert!((avg - 19.0 / 7.0).abs() < 1e-9);
    }
    assert_eq!(locked.sink().snapshot(), lock_free.sink().snapshot());
}

#[test]
fn test_custom_sink() {
    let session = Session::with_sink(AnalysisConfig::default(), LockedStats::new());
    let blocks = decode(INDEPENDENT_MOVS);
    let result = analyze_with(&session, &blocks[0]);
    session.record_execution(&result);
    assert_eq!(session.sink().final_report(), Some(4.0));
    assert_eq!(session.report().accounting, AccountingMode::Locked);
}

fn analyze_with<S: AccountingSink>(session: &Session<S>, block: &Block) -> BlockResult {
    session.on_basic_block(block, false).unwrap().unwrap()
}

#[test]
fn test_file_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loop.bin");
    std::fs::write(&path, hex::decode(COUNTING_LOOP).unwrap()).unwrap();

    let code = std::fs::read(&path).unwrap();
    let blocks = x86::decode_blocks(
        &code,
        X86Config {
            bitness: 64,
            ip: 0x40_1000,
        },
    )
    .unwrap();
    let starts: Vec<_> = blocks.iter().map(|b| b.start_pc).collect();
    assert_eq!(starts, vec![0x40_1000, 0x40_1002]);
}
