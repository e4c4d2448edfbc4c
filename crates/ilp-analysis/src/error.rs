use thiserror::Error;

/// Analysis errors.
///
/// Both variants indicate a defect rather than a transient condition; callers
/// must not retry or clamp.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error(
        "ILP below 1.0 ({ilp_fixed}/1000) for {instruction_count} instructions with chain depth {max_chain_depth}"
    )]
    IlpBelowUnity {
        instruction_count: u32,
        max_chain_depth: u32,
        ilp_fixed: u64,
    },
    #[error("block of {instruction_count} instructions overflows fixed-point ILP")]
    IlpOverflow { instruction_count: u32 },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
