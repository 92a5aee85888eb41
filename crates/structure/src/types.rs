use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable arena index of a definition within one analyzed file
pub type DefId = usize;

/// Kind of an extracted definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefKind {
    /// A class declaration
    Class,

    /// A top-level (or otherwise non-method) function
    Function,

    /// A function declared directly inside a class body
    Method {
        /// Name of the enclosing class
        class: String,
    },
}

impl DefKind {
    /// Lowercase label used in serialized output
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Function => "function",
            Self::Method { .. } => "method",
        }
    }

    /// Whether this definition is a class
    #[must_use]
    pub const fn is_class(&self) -> bool {
        matches!(self, Self::Class)
    }
}

/// A class, top-level function, or method extracted from source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// Unique id within the file: bare name, or `"<class>.<method>"`
    pub id: String,

    /// Bare identifier as written
    pub name: String,

    /// Definition kind
    pub kind: DefKind,

    /// Exact source substring spanned by the definition (decorators included)
    pub code: String,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,

    /// Nested definitions, in order of first encounter
    pub children: Vec<DefId>,
}

impl Definition {
    /// Number of source lines the definition spans
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// Arena of definitions plus the id index and the module root's children
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DefinitionSet {
    defs: Vec<Definition>,
    index: HashMap<String, DefId>,
    module_children: Vec<DefId>,
}

impl DefinitionSet {
    /// Register a new definition. The id must not already be registered;
    /// callers check with [`DefinitionSet::contains`] first (first-seen wins).
    pub(crate) fn register(&mut self, def: Definition) -> DefId {
        debug_assert!(!self.index.contains_key(&def.id));
        let did = self.defs.len();
        self.index.insert(def.id.clone(), did);
        self.defs.push(def);
        did
    }

    pub(crate) fn push_module_child(&mut self, did: DefId) {
        self.module_children.push(did);
    }

    pub(crate) fn push_child(&mut self, parent: DefId, child: DefId) {
        self.defs[parent].children.push(child);
    }

    /// Whether an id is already registered
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Look up the arena index of an id
    #[must_use]
    pub fn def_id(&self, id: &str) -> Option<DefId> {
        self.index.get(id).copied()
    }

    /// Get a definition by arena index
    #[must_use]
    pub fn get(&self, did: DefId) -> &Definition {
        &self.defs[did]
    }

    /// Get a definition by id
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<&Definition> {
        self.def_id(id).map(|did| &self.defs[did])
    }

    /// All definitions in registration order
    #[must_use]
    pub fn defs(&self) -> &[Definition] {
        &self.defs
    }

    /// Direct children of the module root, in order of first encounter
    #[must_use]
    pub fn module_children(&self) -> &[DefId] {
        &self.module_children
    }

    /// Number of registered definitions
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
