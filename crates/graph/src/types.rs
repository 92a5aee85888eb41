use codemap_structure::DefId;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

/// Kind of a resolved edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Caller's body contains a call resolved to a function or method
    Calls,

    /// Caller's body contains a call resolved to a class, i.e. construction
    Instantiates,
}

/// Directed call/instantiation graph over the definition arena.
///
/// Each relation is stored once as a directed edge; the `calls`/`called_by`
/// views (and their instantiation counterparts) are both derived from that one
/// edge, so the two directions cannot disagree.
pub struct CallGraph {
    graph: DiGraph<DefId, EdgeKind>,
    nodes: Vec<NodeIndex>,
}

impl CallGraph {
    /// Create a graph with one node per arena slot
    pub(crate) fn with_defs(count: usize) -> Self {
        let mut graph = DiGraph::new();
        let nodes = (0..count).map(|did| graph.add_node(did)).collect();
        Self { graph, nodes }
    }

    /// Add an edge unless the same (caller, callee, kind) edge already exists.
    /// Returns whether an edge was added. Self-loops are permitted.
    pub(crate) fn add_edge(&mut self, caller: DefId, callee: DefId, kind: EdgeKind) -> bool {
        let (from, to) = (self.nodes[caller], self.nodes[callee]);
        if self
            .graph
            .edges_connecting(from, to)
            .any(|e| *e.weight() == kind)
        {
            return false;
        }
        self.graph.add_edge(from, to, kind);
        true
    }

    /// All edges in insertion order
    pub fn edges_in_order(&self) -> impl Iterator<Item = (DefId, DefId, EdgeKind)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()], self.graph[e.target()], *e.weight()))
    }

    /// Definitions `caller` points at with edges of `kind`, in insertion order
    #[must_use]
    pub fn targets(&self, caller: DefId, kind: EdgeKind) -> Vec<DefId> {
        self.edges_in_order()
            .filter(|&(src, _, k)| src == caller && k == kind)
            .map(|(_, dst, _)| dst)
            .collect()
    }

    /// Definitions pointing at `callee` with edges of `kind`, in insertion order
    #[must_use]
    pub fn sources(&self, callee: DefId, kind: EdgeKind) -> Vec<DefId> {
        self.edges_in_order()
            .filter(|&(_, dst, k)| dst == callee && k == kind)
            .map(|(src, _, _)| src)
            .collect()
    }

    /// Number of definitions
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
