use crate::parser::ParsedModule;
use crate::types::{DefKind, Definition, DefinitionSet};
use tree_sitter::Node;

/// Enclosing class context while walking a class body. Only the immediate
/// lexical level counts: a function declared directly under a class body is a
/// method, a function buried any deeper is a plain function.
struct ClassCtx<'m> {
    name: &'m str,
    /// Arena slot of the class to hang members off, when the class name is
    /// actually bound to a class (first-seen wins on id collisions).
    attach: Option<crate::types::DefId>,
}

/// First pass: walk the tree once and register every class, function, and
/// method. Edge resolution runs afterwards against the complete index, so a
/// call to a definition declared later in the file still resolves.
pub fn build(module: &ParsedModule) -> DefinitionSet {
    let mut set = DefinitionSet::default();
    collect(module, module.root(), None, &mut set);
    log::debug!("registered {} definitions", set.len());
    set
}

fn collect<'m>(
    module: &'m ParsedModule,
    node: Node<'m>,
    class_ctx: Option<&ClassCtx<'m>>,
    set: &mut DefinitionSet,
) {
    match node.kind() {
        "decorated_definition" => {
            if let Some(def) = node.child_by_field_name("definition") {
                visit_definition(module, def, Some(node), class_ctx, set);
            }
        }
        "class_definition" | "function_definition" => {
            visit_definition(module, node, None, class_ctx, set);
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect(module, child, None, set);
            }
        }
    }
}

/// Register one definition and descend into its body. `wrapper` is the
/// `decorated_definition` node when one is present, so `code` and the line
/// span cover the decorators.
fn visit_definition<'m>(
    module: &'m ParsedModule,
    node: Node<'m>,
    wrapper: Option<Node<'m>>,
    class_ctx: Option<&ClassCtx<'m>>,
    set: &mut DefinitionSet,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = module.text_of(name_node);
    let span_node = wrapper.unwrap_or(node);
    let (start_line, end_line) = module.line_span(span_node);

    match node.kind() {
        "class_definition" => {
            let attach = match set.def_id(name) {
                Some(existing) if set.get(existing).kind.is_class() => Some(existing),
                Some(_) => None,
                None => {
                    let did = set.register(Definition {
                        id: name.to_string(),
                        name: name.to_string(),
                        kind: DefKind::Class,
                        code: module.text_of(span_node).to_string(),
                        start_line,
                        end_line,
                        children: Vec::new(),
                    });
                    match class_ctx.and_then(|ctx| ctx.attach) {
                        Some(parent) => set.push_child(parent, did),
                        None => set.push_module_child(did),
                    }
                    Some(did)
                }
            };

            let body_ctx = ClassCtx { name, attach };
            if let Some(body) = node.child_by_field_name("body") {
                let mut cursor = body.walk();
                for child in body.children(&mut cursor) {
                    collect(module, child, Some(&body_ctx), set);
                }
            }
        }
        "function_definition" => {
            let (id, kind) = match class_ctx {
                Some(ctx) => (
                    format!("{}.{}", ctx.name, name),
                    DefKind::Method {
                        class: ctx.name.to_string(),
                    },
                ),
                None => (name.to_string(), DefKind::Function),
            };

            if !set.contains(&id) {
                let did = set.register(Definition {
                    id,
                    name: name.to_string(),
                    kind,
                    code: module.text_of(span_node).to_string(),
                    start_line,
                    end_line,
                    children: Vec::new(),
                });
                match class_ctx.and_then(|ctx| ctx.attach) {
                    Some(parent) => set.push_child(parent, did),
                    None => set.push_module_child(did),
                }
            }

            // Definitions nested inside a function body are plain functions.
            if let Some(body) = node.child_by_field_name("body") {
                let mut cursor = body.walk();
                for child in body.children(&mut cursor) {
                    collect(module, child, None, set);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParseLimits, SourceParser};
    use pretty_assertions::assert_eq;

    fn build_source(source: &str) -> DefinitionSet {
        let mut parser = SourceParser::new(ParseLimits::default()).unwrap();
        let module = parser.parse(source).unwrap();
        build(&module)
    }

    #[test]
    fn extracts_classes_functions_and_methods() {
        let set = build_source(
            "class A:\n    def m(self):\n        pass\n\ndef f():\n    pass\n",
        );

        assert_eq!(set.len(), 3);
        assert_eq!(set.by_id("A").unwrap().kind, DefKind::Class);
        assert_eq!(
            set.by_id("A.m").unwrap().kind,
            DefKind::Method {
                class: "A".to_string()
            }
        );
        assert_eq!(set.by_id("f").unwrap().kind, DefKind::Function);

        let roots: Vec<&str> = set
            .module_children()
            .iter()
            .map(|&did| set.get(did).id.as_str())
            .collect();
        assert_eq!(roots, vec!["A", "f"]);

        let a_children: Vec<&str> = set
            .by_id("A")
            .unwrap()
            .children
            .iter()
            .map(|&did| set.get(did).id.as_str())
            .collect();
        assert_eq!(a_children, vec!["A.m"]);
    }

    #[test]
    fn line_spans_are_one_indexed_inclusive() {
        let set = build_source("def f():\n    pass\n\nclass A:\n    pass\n");

        let f = set.by_id("f").unwrap();
        assert_eq!((f.start_line, f.end_line), (1, 2));

        let a = set.by_id("A").unwrap();
        assert_eq!((a.start_line, a.end_line), (4, 5));
    }

    #[test]
    fn code_is_the_exact_source_span() {
        let set = build_source("def f(x):\n    return x + 1\n");
        assert_eq!(set.by_id("f").unwrap().code, "def f(x):\n    return x + 1");
    }

    #[test]
    fn decorated_definition_span_includes_decorators() {
        let set = build_source("@wraps\ndef f():\n    pass\n");
        let f = set.by_id("f").unwrap();
        assert!(f.code.starts_with("@wraps"));
        assert_eq!((f.start_line, f.end_line), (1, 3));
    }

    #[test]
    fn decorated_method_keeps_method_identity() {
        let set = build_source(
            "class A:\n    @staticmethod\n    def m():\n        pass\n",
        );
        let m = set.by_id("A.m").unwrap();
        assert_eq!(
            m.kind,
            DefKind::Method {
                class: "A".to_string()
            }
        );
        assert!(m.code.starts_with("@staticmethod"));
    }

    #[test]
    fn nested_function_is_a_plain_function_on_the_module_root() {
        let set = build_source("def outer():\n    def inner():\n        pass\n");

        assert_eq!(set.by_id("inner").unwrap().kind, DefKind::Function);
        let roots: Vec<&str> = set
            .module_children()
            .iter()
            .map(|&did| set.get(did).id.as_str())
            .collect();
        assert_eq!(roots, vec!["outer", "inner"]);
    }

    #[test]
    fn function_under_conditional_in_class_body_is_not_a_method() {
        let set = build_source(
            "class A:\n    if True:\n        def f():\n            pass\n",
        );
        assert_eq!(set.by_id("f").unwrap().kind, DefKind::Function);
        assert!(set.by_id("A.f").is_none());
    }

    #[test]
    fn nested_class_hangs_off_the_enclosing_class() {
        let set = build_source(
            "class Outer:\n    class Inner:\n        def m(self):\n            pass\n",
        );

        let outer_children: Vec<&str> = set
            .by_id("Outer")
            .unwrap()
            .children
            .iter()
            .map(|&did| set.get(did).id.as_str())
            .collect();
        assert_eq!(outer_children, vec!["Inner"]);
        assert_eq!(
            set.by_id("Inner.m").unwrap().kind,
            DefKind::Method {
                class: "Inner".to_string()
            }
        );
    }

    #[test]
    fn first_seen_wins_on_duplicate_ids() {
        let set = build_source(
            "def f():\n    return 1\n\ndef f():\n    return 2\n",
        );

        assert_eq!(set.len(), 1);
        assert!(set.by_id("f").unwrap().code.contains("return 1"));
    }

    #[test]
    fn rebuilding_identical_input_is_idempotent() {
        let source = "class A:\n    def m(self):\n        self.m()\n\ndef f():\n    A()\n";
        let first = build_source(source);
        let second = build_source(source);
        assert_eq!(first, second);
    }
}
