use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide error type.
///
/// Configuration errors are produced before any work begins; I/O and
/// reference-structure errors abort the run. Unmappable reads are not
/// errors and never surface here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse FASTA database: no sequence headers found")]
    EmptyDatabase,

    #[error("database contains duplicate header: {0}")]
    DuplicateHeader(String),

    #[error("sequence shorter than kmer in database ({name}: {len} bp, k = {k})")]
    SequenceTooShort { name: String, len: usize, k: usize },

    #[error("malformed FASTQ record near line {line} of {path}")]
    TruncatedFastq { path: PathBuf, line: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
