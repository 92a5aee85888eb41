use crate::types::{CallGraph, EdgeKind};
use codemap_structure::{DefId, DefKind, DefinitionSet};
use serde::{Deserialize, Serialize};

/// Serialized kind tag of an outline node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlineKind {
    Class,
    Function,
    Method,
}

/// One definition in the serializable outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionOutline {
    /// Unique id within the file
    pub id: String,

    /// Bare identifier as written
    pub name: String,

    /// Definition kind
    pub kind: OutlineKind,

    /// Exact source substring of the definition
    pub code: String,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,

    /// Nested definitions, in order of first encounter
    pub children: Vec<DefinitionOutline>,

    /// Ids this definition calls
    pub calls: Vec<String>,

    /// Ids that call this definition
    pub called_by: Vec<String>,

    /// Class ids this definition constructs
    pub instantiates: Vec<String>,

    /// Ids that construct this class
    pub instantiated_by: Vec<String>,
}

/// The analysis result: a synthetic module root owning every top-level
/// class and function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleOutline {
    pub id: String,
    pub name: String,
    pub children: Vec<DefinitionOutline>,
}

/// Fold the definition arena and the call graph into the nested outline.
/// Edge id lists come out in edge-insertion order, so rebuilding identical
/// input yields an identical outline.
pub fn assemble(defs: &DefinitionSet, graph: &CallGraph) -> ModuleOutline {
    let mut edges = EdgeLists::new(defs.len());
    for (src, dst, kind) in graph.edges_in_order() {
        let (src_id, dst_id) = (defs.get(src).id.clone(), defs.get(dst).id.clone());
        match kind {
            EdgeKind::Calls => {
                edges.calls[src].push(dst_id);
                edges.called_by[dst].push(src_id);
            }
            EdgeKind::Instantiates => {
                edges.instantiates[src].push(dst_id);
                edges.instantiated_by[dst].push(src_id);
            }
        }
    }

    let children = defs
        .module_children()
        .iter()
        .map(|&did| outline_node(defs, &edges, did))
        .collect();

    ModuleOutline {
        id: "module".to_string(),
        name: "module".to_string(),
        children,
    }
}

struct EdgeLists {
    calls: Vec<Vec<String>>,
    called_by: Vec<Vec<String>>,
    instantiates: Vec<Vec<String>>,
    instantiated_by: Vec<Vec<String>>,
}

impl EdgeLists {
    fn new(count: usize) -> Self {
        Self {
            calls: vec![Vec::new(); count],
            called_by: vec![Vec::new(); count],
            instantiates: vec![Vec::new(); count],
            instantiated_by: vec![Vec::new(); count],
        }
    }
}

fn outline_node(defs: &DefinitionSet, edges: &EdgeLists, did: DefId) -> DefinitionOutline {
    let def = defs.get(did);
    DefinitionOutline {
        id: def.id.clone(),
        name: def.name.clone(),
        kind: match def.kind {
            DefKind::Class => OutlineKind::Class,
            DefKind::Function => OutlineKind::Function,
            DefKind::Method { .. } => OutlineKind::Method,
        },
        code: def.code.clone(),
        start_line: def.start_line,
        end_line: def.end_line,
        children: def
            .children
            .iter()
            .map(|&child| outline_node(defs, edges, child))
            .collect(),
        calls: edges.calls[did].clone(),
        called_by: edges.called_by[did].clone(),
        instantiates: edges.instantiates[did].clone(),
        instantiated_by: edges.instantiated_by[did].clone(),
    }
}
