//! # Codemap Structure
//!
//! Python front-end and first extraction pass: one source file in, a tree of
//! definitions out.
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     │
//!     ├──> Tree-sitter Parsing → immutable syntax tree snapshot
//!     │      └─ fail-closed bounds (size cap, parse timeout)
//!     │
//!     └──> Pass 1: Definition Extraction
//!          ├─ classes, top-level functions, methods
//!          ├─ exact code spans + 1-indexed line ranges
//!          └─ arena + id index (first-seen wins on collisions)
//! ```
//!
//! The parsed snapshot is exposed so the call-graph pass reads the exact tree
//! this pass registered, instead of re-parsing.

mod builder;
mod error;
mod parser;
mod types;

pub use builder::build;
pub use error::{Result, StructureError};
pub use parser::{ParseLimits, ParsedModule, SourceParser};
pub use types::{DefId, DefKind, Definition, DefinitionSet};
