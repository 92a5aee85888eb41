use crate::error::{Result, StructureError};
use tree_sitter::{Node, Parser, Tree};

/// Bounds applied before and during parsing. Pathological input fails closed
/// instead of holding a request open indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    /// Maximum accepted source size in bytes
    pub max_source_bytes: usize,

    /// Parse wall-clock bound in milliseconds (0 disables the bound)
    pub parse_timeout_ms: u64,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_source_bytes: 2 * 1024 * 1024,
            parse_timeout_ms: 5_000,
        }
    }
}

/// Python front-end: turns source text into an immutable syntax tree snapshot
pub struct SourceParser {
    parser: Parser,
    limits: ParseLimits,
}

impl SourceParser {
    /// Create a parser with the Python grammar loaded
    pub fn new(limits: ParseLimits) -> Result<Self> {
        let ts_language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| StructureError::tree_sitter(format!("Failed to set language: {e}")))?;
        if limits.parse_timeout_ms > 0 {
            parser.set_timeout_micros(limits.parse_timeout_ms.saturating_mul(1_000));
        }
        Ok(Self { parser, limits })
    }

    /// Parse source into a [`ParsedModule`], enforcing the configured bounds.
    ///
    /// Tree-sitter recovers from broken input instead of failing, so a
    /// successful parse is additionally checked for error or missing nodes;
    /// either aborts the analysis with no partial output.
    pub fn parse(&mut self, source: &str) -> Result<ParsedModule> {
        if source.trim().is_empty() {
            return Err(StructureError::EmptySource);
        }
        if source.len() > self.limits.max_source_bytes {
            return Err(StructureError::SourceTooLarge {
                bytes: source.len(),
                max: self.limits.max_source_bytes,
            });
        }

        let tree = self.parser.parse(source, None).ok_or(StructureError::ParseTimeout {
            ms: self.limits.parse_timeout_ms,
        })?;

        let root = tree.root_node();
        if root.has_error() {
            let message = match first_error_line(root) {
                Some(line) => format!("invalid syntax at line {line}"),
                None => "invalid syntax".to_string(),
            };
            return Err(StructureError::syntax(message));
        }

        Ok(ParsedModule {
            source: source.to_string(),
            tree,
        })
    }
}

/// One immutable parse of one source file. Both extraction passes read this
/// same snapshot, so the second pass sees exactly the node identities the
/// first pass registered.
#[derive(Debug)]
pub struct ParsedModule {
    source: String,
    tree: Tree,
}

impl ParsedModule {
    /// The module root node
    #[must_use]
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Full source text
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Exact source substring spanned by a node
    #[must_use]
    pub fn text_of(&self, node: Node<'_>) -> &str {
        &self.source[node.start_byte()..node.end_byte()]
    }

    /// 1-indexed inclusive line span of a node
    #[must_use]
    pub fn line_span(&self, node: Node<'_>) -> (usize, usize) {
        (
            node.start_position().row + 1,
            node.end_position().row + 1,
        )
    }
}

/// Line of the first error or missing node, if any
fn first_error_line(node: Node<'_>) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(line) = first_error_line(child) {
            return Some(line);
        }
    }
    None
}
