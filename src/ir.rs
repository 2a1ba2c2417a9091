// Strongly-typed IR between the type graph and codegen. No graph lookups here.

use std::sync::Arc;

use serde::Serialize;

use crate::diagnostics::Location;
use crate::graph::TypeId;

// ------------------------------- Paths ------------------------------------ //

/// A type as codegen needs it: either a graph type (rendered relative to the
/// module the code lands in) or verbatim text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypePath {
    Graph { namespace: Vec<String>, segments: Vec<String> },
    Verbatim(String),
}

/// Where emitted code lives: namespace plus namespace-relative module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub namespace: Vec<String>,
    pub module: Vec<String>,
}

impl Scope {
    pub fn new(namespace: &[String], module: &[String]) -> Self {
        Self { namespace: namespace.to_vec(), module: module.to_vec() }
    }

    pub fn child(&self, name: &str) -> Self {
        let mut module = self.module.clone();
        module.push(name.to_string());
        Self { namespace: self.namespace.clone(), module }
    }
}

impl TypePath {
    pub fn graph(namespace: &[String], segments: Vec<String>) -> Self {
        TypePath::Graph { namespace: namespace.to_vec(), segments }
    }

    pub fn render(&self, scope: &Scope) -> String {
        match self {
            TypePath::Verbatim(text) => text.clone(),
            TypePath::Graph { namespace, segments } if *namespace != scope.namespace => {
                let mut out = String::from("crate");
                for s in namespace.iter().chain(segments) {
                    out.push_str("::");
                    out.push_str(s);
                }
                out
            }
            TypePath::Graph { segments, .. } => {
                let parent = &segments[..segments.len().saturating_sub(1)];
                let common = scope
                    .module
                    .iter()
                    .zip(parent)
                    .take_while(|(a, b)| a == b)
                    .count();
                let ups = scope.module.len() - common;
                let mut parts: Vec<&str> = std::iter::repeat_n("super", ups).collect();
                parts.extend(segments[common..].iter().map(String::as_str));
                parts.join("::")
            }
        }
    }
}

// ----------------------------- Descriptors -------------------------------- //

/// One tagged record, as collected from the graph.
#[derive(Debug, Clone, Serialize)]
pub struct TaggedType {
    pub id: TypeId,
    pub qualified_name: String,
    pub name: String,
    pub namespace: Vec<String>,
    /// The immutable type itself.
    pub original: TypePath,
    pub components: Vec<Component>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosing: Option<TypeId>,
    pub options: Options,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Options {
    pub encapsulate_fields: bool,
    pub use_fancy_names: bool,
    pub derive: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self { encapsulate_fields: true, use_fancy_names: false, derive: Vec::new() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Component {
    pub name: String,
    /// Declared type text as written in the graph.
    pub ty: String,
    pub shape: ComponentShape,
}

/// Closed set of component shapes the synthesizer dispatches on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "shape")]
pub enum ComponentShape {
    /// Untagged (or external) type, copied as is.
    Reference { declared: TypePath },
    /// Tagged type whose companion lives elsewhere.
    Composite { id: TypeId, declared: TypePath },
    /// Tagged type whose companion is attached inside the owner's companion,
    /// through tagged enclosing types only.
    NestedTagged { id: TypeId, declared: TypePath },
    /// Type text the graph could not make sense of.
    Malformed,
}

impl Component {
    pub fn declared(&self) -> Option<&TypePath> {
        match &self.shape {
            ComponentShape::Reference { declared }
            | ComponentShape::Composite { declared, .. }
            | ComponentShape::NestedTagged { declared, .. } => Some(declared),
            ComponentShape::Malformed => None,
        }
    }

    pub fn tagged(&self) -> Option<TypeId> {
        match self.shape {
            ComponentShape::Composite { id, .. } | ComponentShape::NestedTagged { id, .. } => Some(id),
            _ => None,
        }
    }
}

// ------------------------------ Companions -------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EffectiveTy {
    Declared { ty: TypePath },
    /// Field holds another companion; `contract` converts into it.
    Companion { ty: TypePath, contract: TypePath },
}

impl EffectiveTy {
    pub fn ty(&self) -> &TypePath {
        match self {
            EffectiveTy::Declared { ty } | EffectiveTy::Companion { ty, .. } => ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub ty: EffectiveTy,
    pub public: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessorStyle {
    /// `a()` / `a_mut()`
    Plain,
    /// `get_a()` / `set_a(value)`
    Fancy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessorPair {
    pub field: String,
    pub getter: String,
    pub setter: String,
    pub style: AccessorStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractAccessor {
    pub name: String,
    pub returns: TypePath,
}

/// The sealed `Source` trait the original type implements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceContract {
    /// Path of the trait itself.
    pub path: TypePath,
    pub accessors: Vec<ContractAccessor>,
    pub companion: TypePath,
    /// The only type allowed to implement it.
    pub permits: TypePath,
}

#[derive(Debug, Clone)]
pub struct CompanionSpec {
    pub origin: TypeId,
    pub origin_name: String,
    pub name: String,
    pub namespace: Vec<String>,
    /// Namespace-relative path of the companion struct.
    pub segments: Vec<String>,
    pub original: TypePath,
    pub derives: Vec<String>,
    pub fields: Vec<FieldSpec>,
    pub accessors: Vec<AccessorPair>,
    pub contract: SourceContract,
    pub nested: Vec<Arc<CompanionSpec>>,
}

impl CompanionSpec {
    pub fn path(&self) -> TypePath {
        TypePath::graph(&self.namespace, self.segments.clone())
    }

    /// Scope of the struct and its inherent impl.
    pub fn scope(&self) -> Scope {
        Scope::new(&self.namespace, &self.segments[..self.segments.len() - 1])
    }

    /// Scope of the companion module (nested companions, `Source`).
    pub fn module_scope(&self) -> Scope {
        self.scope().child(&crate::naming::module_name(&self.name))
    }
}

// ------------------------------- Tests ------------------------------------ //
