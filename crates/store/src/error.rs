use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while storing or patching source text
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested line range does not fit the stored text
    #[error("invalid line range {start}..{end} for a {line_count}-line source")]
    InvalidRange {
        start: usize,
        end: usize,
        line_count: usize,
    },

    /// No source is stored under the given file id
    #[error("unknown file: {0}")]
    UnknownFile(String),

    /// The caller patched against a revision that is no longer current
    #[error("stale revision: expected {expected}, stored text is at revision {stored}")]
    StaleRevision { expected: u64, stored: u64 },

    /// Storage collaborator failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
