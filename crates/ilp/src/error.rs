use thiserror::Error;

/// Top-level errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("analysis error: {0}")]
    Analysis(#[from] ilp_analysis::AnalysisError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("decoder error: {0}")]
    Decoder(#[from] iced_x86::IcedError),
    #[error("invalid instruction at 0x{0:x}")]
    InvalidInstruction(u64),
    #[error("no machine code given")]
    NoInput,
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;
