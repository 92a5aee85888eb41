use thiserror::Error;

/// Result type for structure extraction
pub type Result<T> = std::result::Result<T, StructureError>;

/// Errors that can occur while parsing source and extracting definitions
#[derive(Error, Debug)]
pub enum StructureError {
    /// Source text does not parse
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Empty source text
    #[error("Empty source provided")]
    EmptySource,

    /// Source exceeds the configured size bound
    #[error("Source too large: {bytes} bytes (limit {max})")]
    SourceTooLarge { bytes: usize, max: usize },

    /// Parsing exceeded the configured time bound
    #[error("Parse aborted after {ms} ms")]
    ParseTimeout { ms: u64 },

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),
}

impl StructureError {
    /// Create a syntax error
    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitter(msg.into())
    }
}
