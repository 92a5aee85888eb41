//! # Codemap Graph
//!
//! Second extraction pass and result assembly: resolve call expressions
//! against the definitions the structure pass registered, then fold both into
//! one serializable outline.
//!
//! ## Architecture
//!
//! ```text
//! ParsedModule + DefinitionSet
//!     │
//!     ├──> Pass 2: Call Resolution
//!     │      ├─ candidate name (bare identifier / attribute member)
//!     │      ├─ priority: same-class method, then bare name
//!     │      └─ edge kind from the resolved target (call vs instantiation)
//!     │
//!     ├──> Call Graph (petgraph)
//!     │      ├─ Nodes: definition arena slots
//!     │      └─ Edges: Calls / Instantiates, one per (caller, callee, kind)
//!     │
//!     └──> Assembler
//!            └─ nested ModuleOutline with symmetric edge id lists
//! ```

mod assembler;
mod resolver;
mod types;

pub use assembler::{assemble, DefinitionOutline, ModuleOutline, OutlineKind};
pub use resolver::resolve;
pub use types::{CallGraph, EdgeKind};

use codemap_structure::{build, ParseLimits, Result, SourceParser};

/// Run the full pipeline on one source text: parse, extract definitions,
/// resolve edges, assemble the outline.
pub fn analyze(source: &str, limits: ParseLimits) -> Result<ModuleOutline> {
    let mut parser = SourceParser::new(limits)?;
    let module = parser.parse(source)?;
    let defs = build(&module);
    let graph = resolve(&module, &defs);
    Ok(assemble(&defs, &graph))
}
