use crate::types::{CallGraph, EdgeKind};
use codemap_structure::{DefId, DefKind, DefinitionSet, ParsedModule};
use tree_sitter::Node;

/// Second pass: walk the same parsed snapshot the definitions came from and
/// resolve every call expression found inside a function or method body.
///
/// Resolution is name-based and type-unaware. An unresolvable call is an
/// expected outcome and produces no edge; this pass never fails.
pub fn resolve(module: &ParsedModule, defs: &DefinitionSet) -> CallGraph {
    let mut resolver = Resolver {
        module,
        defs,
        graph: CallGraph::with_defs(defs.len()),
    };
    resolver.walk(module.root(), None, None);
    log::info!(
        "built call graph: {} definitions, {} edges",
        defs.len(),
        resolver.graph.edge_count()
    );
    resolver.graph
}

struct Resolver<'m> {
    module: &'m ParsedModule,
    defs: &'m DefinitionSet,
    graph: CallGraph,
}

impl<'m> Resolver<'m> {
    /// `class_ctx` is the class name while visiting direct children of a class
    /// body; `scope` is the innermost enclosing registered function or method,
    /// restored on exit by the recursion itself.
    fn walk(&mut self, node: Node<'m>, class_ctx: Option<&'m str>, scope: Option<DefId>) {
        match node.kind() {
            "decorated_definition" => {
                let inner = node.child_by_field_name("definition");
                // Decorator expressions are attributed to the function they
                // decorate; a decorated class keeps the enclosing scope.
                let decorator_scope = inner
                    .filter(|d| d.kind() == "function_definition")
                    .and_then(|d| self.function_scope(d, class_ctx))
                    .or(scope);
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if inner.map(|d| d.id()) == Some(child.id()) {
                        self.walk(child, class_ctx, scope);
                    } else {
                        self.walk(child, None, decorator_scope);
                    }
                }
            }
            "class_definition" => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| self.module.text_of(n));
                let body_id = node.child_by_field_name("body").map(|b| b.id());
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if Some(child.id()) == body_id {
                        let mut body_cursor = child.walk();
                        for stmt in child.children(&mut body_cursor) {
                            self.walk(stmt, name, scope);
                        }
                    } else {
                        // superclass list evaluates in the enclosing scope
                        self.walk(child, None, scope);
                    }
                }
            }
            "function_definition" => {
                let scope = self.function_scope(node, class_ctx);
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.walk(child, None, scope);
                }
            }
            "call" => {
                if let Some(caller) = scope {
                    if let Some(callee) = self.call_name(node) {
                        self.record(caller, callee);
                    }
                }
                // Nested calls in the target or arguments keep the same scope,
                // so f(g()) yields edges for both f and g.
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.walk(child, None, scope);
                }
            }
            _ => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.walk(child, None, scope);
                }
            }
        }
    }

    /// Scope id for a function body. A body whose id is bound to a class
    /// (shadowed by an earlier class of the same name) carries no scope.
    fn function_scope(&self, node: Node<'m>, class_ctx: Option<&str>) -> Option<DefId> {
        let name_node = node.child_by_field_name("name")?;
        let name = self.module.text_of(name_node);
        let id = match class_ctx {
            Some(class) => format!("{class}.{name}"),
            None => name.to_string(),
        };
        let did = self.defs.def_id(&id)?;
        (!self.defs.get(did).kind.is_class()).then_some(did)
    }

    /// Candidate callee name: a bare identifier, or the member of an
    /// attribute access with the receiver ignored. Anything else (a call on a
    /// call result, a subscript, ...) yields no candidate.
    fn call_name(&self, node: Node<'m>) -> Option<&'m str> {
        let target = node.child_by_field_name("function")?;
        match target.kind() {
            "identifier" => Some(self.module.text_of(target)),
            "attribute" => {
                let attr = target.child_by_field_name("attribute")?;
                (attr.kind() == "identifier").then(|| self.module.text_of(attr))
            }
            _ => None,
        }
    }

    /// Try candidates in priority order: a sibling method of the caller's
    /// class first, then the bare name. The first id present in the index
    /// wins; the resolved definition's kind decides call vs instantiation.
    fn record(&mut self, caller: DefId, callee: &str) {
        if let DefKind::Method { class } = &self.defs.get(caller).kind {
            if let Some(target) = self.defs.def_id(&format!("{class}.{callee}")) {
                self.add(caller, target);
                return;
            }
        }
        if let Some(target) = self.defs.def_id(callee) {
            self.add(caller, target);
        }
    }

    fn add(&mut self, caller: DefId, target: DefId) {
        let kind = if self.defs.get(target).kind.is_class() {
            EdgeKind::Instantiates
        } else {
            EdgeKind::Calls
        };
        self.graph.add_edge(caller, target, kind);
    }
}
