//! Type graph: the read-only view of declared types the generator works on.
//!
//! The host exports its declarations as JSON *type graph documents* (one per
//! namespace). [`GraphIndex`] flattens them into an arena with enclosing/nested
//! links and answers the queries of the [`TypeGraph`] trait, which is all the
//! rest of the pipeline ever sees.
//!
//! Nested declarations follow the usual Rust layout for generated nested
//! types: a type nested in `Pair` lives in the module `pair`, so
//! `Pair > Inner` is addressed as `pair::Inner` inside its namespace.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::diagnostics::Location;
use crate::error::{Error, Result};
use crate::naming;
use crate::path_de;

// ------------------------------- Document --------------------------------- //

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GraphDocument {
    /// Module path from the crate root, `""` for the root itself.
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    #[serde(default)]
    pub components: Vec<ComponentDecl>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub nested: Vec<TypeDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Struct with named fields.
    Record,
    Tuple,
    Unit,
    Enum,
    Trait,
}

impl TypeKind {
    /// Immutable, closed, ordered set of named components.
    pub fn is_composite(self) -> bool {
        matches!(self, TypeKind::Record)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Record => "record",
            TypeKind::Tuple => "tuple struct",
            TypeKind::Unit => "unit struct",
            TypeKind::Enum => "enum",
            TypeKind::Trait => "trait",
        }
    }
}

/// The "generate mutable companion" tag and its options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Tag {
    #[serde(default = "default_encapsulate_fields")]
    pub encapsulate_fields: bool,
    #[serde(default, alias = "use_fancy_names")]
    pub use_fancy_method_names: bool,
    /// Extra derives for the companion struct.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub derive: Vec<String>,
}

fn default_encapsulate_fields() -> bool {
    true
}

impl Default for Tag {
    fn default() -> Self {
        Self {
            encapsulate_fields: true,
            use_fancy_method_names: false,
            derive: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentDecl {
    pub name: String,
    /// Rust type text, written relative to the module declaring the owner.
    pub ty: String,
}

// --------------------------------- Index ---------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone)]
pub struct TypeNode {
    pub id: TypeId,
    /// Document the declaration came from (for diagnostics).
    pub source: String,
    pub namespace: Vec<String>,
    pub name: String,
    /// Namespace-relative path: enclosing module names, then `name`.
    pub path: Vec<String>,
    pub kind: TypeKind,
    pub tag: Option<Tag>,
    pub components: Vec<ComponentDecl>,
    pub implements: Vec<String>,
    pub enclosing: Option<TypeId>,
    pub nested: Vec<TypeId>,
}

impl TypeNode {
    pub fn qualified_name(&self) -> String {
        self.namespace.iter().chain(&self.path).cloned().collect::<Vec<_>>().join("::")
    }

    /// Namespace-relative module the type is declared in.
    pub fn module(&self) -> &[String] {
        &self.path[..self.path.len() - 1]
    }

    pub fn location(&self) -> Location {
        Location::item(self.source.clone(), self.qualified_name())
    }
}

/// What a component's declared type text points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Declared(TypeId),
    /// Not part of the graph (std, other crates, generics): used verbatim.
    External(String),
    Malformed(String),
}

/// Read-only query surface over declared types.
pub trait TypeGraph: Sync {
    /// All declared types in discovery order.
    fn type_ids(&self) -> Vec<TypeId>;

    fn node(&self, id: TypeId) -> &TypeNode;

    /// `settings::pair::Inner` → id.
    fn lookup(&self, qualified_name: &str) -> Option<TypeId>;

    /// Resolve type text as written inside the declaration of `from`.
    fn resolve(&self, from: TypeId, ty: &str) -> TypeRef;

    fn kind(&self, id: TypeId) -> TypeKind {
        self.node(id).kind
    }

    fn tag(&self, id: TypeId) -> Option<&Tag> {
        self.node(id).tag.as_ref()
    }

    fn is_tagged(&self, id: TypeId) -> bool {
        self.tag(id).is_some()
    }

    fn components(&self, id: TypeId) -> &[ComponentDecl] {
        &self.node(id).components
    }

    fn capabilities(&self, id: TypeId) -> &[String] {
        &self.node(id).implements
    }

    fn enclosing(&self, id: TypeId) -> Option<TypeId> {
        self.node(id).enclosing
    }

    fn nested(&self, id: TypeId) -> &[TypeId] {
        &self.node(id).nested
    }

    /// The enclosing type, when it is tagged: the companion of `id` then
    /// lives inside the enclosing companion's module.
    fn tagged_enclosing(&self, id: TypeId) -> Option<TypeId> {
        self.enclosing(id).filter(|&outer| self.is_tagged(outer))
    }
}

#[derive(Debug, Default)]
pub struct GraphIndex {
    nodes: Vec<TypeNode>,
    by_name: IndexMap<String, TypeId>,
}

impl GraphIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and index every document, in the given order.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut index = Self::new();
        for path in paths {
            let path = path.as_ref();
            let src = std::fs::read_to_string(path).map_err(|source| Error::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let doc = parse_document(&src, path)?;
            index.add_document(path.display().to_string(), doc)?;
        }
        Ok(index)
    }

    pub fn from_documents<I, S>(docs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, GraphDocument)>,
        S: Into<String>,
    {
        let mut index = Self::new();
        for (source, doc) in docs {
            index.add_document(source, doc)?;
        }
        Ok(index)
    }

    pub fn add_document(&mut self, source: impl Into<String>, doc: GraphDocument) -> Result<()> {
        let source = source.into();
        let namespace = split_namespace(&doc.namespace).ok_or_else(|| Error::InvalidNamespace {
            namespace: doc.namespace.clone(),
            path: source.clone(),
        })?;
        for decl in doc.types {
            self.insert(&source, &namespace, &[], None, decl)?;
        }
        Ok(())
    }

    fn insert(
        &mut self,
        source: &str,
        namespace: &[String],
        module: &[String],
        enclosing: Option<TypeId>,
        decl: TypeDecl,
    ) -> Result<TypeId> {
        if !naming::is_identifier(&decl.name) {
            return Err(Error::InvalidTypeName {
                name: decl.name,
                path: source.to_string(),
            });
        }
        let id = TypeId(self.nodes.len() as u32);
        let mut path = module.to_vec();
        path.push(decl.name.clone());

        let node = TypeNode {
            id,
            source: source.to_string(),
            namespace: namespace.to_vec(),
            name: decl.name.clone(),
            path: path.clone(),
            kind: decl.kind,
            tag: decl.tag,
            components: decl.components,
            implements: decl.implements,
            enclosing,
            nested: Vec::new(),
        };
        let key = node.qualified_name();
        if let Some(&existing) = self.by_name.get(&key) {
            return Err(Error::DuplicateType {
                name: key,
                first: self.nodes[existing.0 as usize].source.clone(),
                second: source.to_string(),
            });
        }
        self.by_name.insert(key, id);
        self.nodes.push(node);

        // pre-order: children get ids after their parent
        let mut inner_module = module.to_vec();
        inner_module.push(naming::module_name(&decl.name));
        let mut nested = Vec::with_capacity(decl.nested.len());
        for child in decl.nested {
            nested.push(self.insert(source, namespace, &inner_module, Some(id), child)?);
        }
        self.nodes[id.0 as usize].nested = nested;
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn lookup_segments(&self, segments: &[String]) -> Option<TypeId> {
        self.by_name.get(&segments.join("::")).copied()
    }
}

impl TypeGraph for GraphIndex {
    fn type_ids(&self) -> Vec<TypeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    fn node(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.0 as usize]
    }

    fn lookup(&self, qualified_name: &str) -> Option<TypeId> {
        self.by_name.get(qualified_name).copied()
    }

    fn resolve(&self, from: TypeId, ty: &str) -> TypeRef {
        let text = ty.trim();
        if text.is_empty() || !balanced(text) || text.ends_with("::") {
            return TypeRef::Malformed(text.to_string());
        }
        let node = self.node(from);
        // module of `from`, crate-absolute
        let module: Vec<String> = node.namespace.iter().chain(node.module()).cloned().collect();

        // Companions live in modules below the original, so relative prefixes
        // are pinned to the original's module before anything else.
        let Some(text) = naming::rebase_relative_paths(text, &module) else {
            return TypeRef::Malformed(text.to_string());
        };
        if !naming::is_plain_path(&text) {
            return TypeRef::External(text);
        }
        let segments: Vec<&str> = text.split("::").collect();
        if text == "crate" || segments.iter().any(|s| matches!(*s, "self" | "super")) {
            return TypeRef::Malformed(text);
        }

        // crate-absolute
        if segments[0] == "crate" {
            let target: Vec<String> = segments[1..].iter().map(|s| s.to_string()).collect();
            return match self.lookup_segments(&target) {
                Some(id) => TypeRef::Declared(id),
                None => TypeRef::External(text),
            };
        }

        // Unprefixed paths also see the enclosing modules up to the namespace,
        // which is what the `use super::*` convention of nested modules gives.
        let rest: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
        let mut current = module;
        loop {
            let candidate: Vec<String> = current.iter().chain(&rest).cloned().collect();
            if let Some(id) = self.lookup_segments(&candidate) {
                return TypeRef::Declared(id);
            }
            if current.len() <= node.namespace.len() {
                break;
            }
            current.pop();
        }
        TypeRef::External(text)
    }
}

pub fn parse_document(src: &str, path: &Path) -> Result<GraphDocument> {
    path_de::from_str_with_path::<GraphDocument>(src).map_err(|err| Error::Document {
        path: PathBuf::from(path),
        message: err.to_string(),
    })
}

fn split_namespace(namespace: &str) -> Option<Vec<String>> {
    let namespace = namespace.trim();
    if namespace.is_empty() {
        return Some(Vec::new());
    }
    let namespace = namespace.strip_prefix("crate::").unwrap_or(namespace);
    namespace
        .split("::")
        .map(|s| naming::is_identifier(s).then(|| s.to_string()))
        .collect()
}

fn balanced(text: &str) -> bool {
    let mut stack = Vec::new();
    let mut prev = ' ';
    for c in text.chars() {
        match c {
            '<' | '(' | '[' => stack.push(c),
            // `->` in fn types is not a closing bracket
            '>' if prev == '-' => {}
            '>' | ')' | ']' => {
                let open = match c {
                    '>' => '<',
                    ')' => '(',
                    _ => '[',
                };
                if stack.pop() != Some(open) {
                    return false;
                }
            }
            _ => {}
        }
        prev = c;
    }
    stack.is_empty()
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn index(doc: serde_json::Value) -> GraphIndex {
        let doc: GraphDocument = serde_json::from_value(doc).unwrap();
        GraphIndex::from_documents([("settings.json", doc)]).unwrap()
    }

    fn sample() -> GraphIndex {
        index(json!({
            "namespace": "settings",
            "types": [
                {
                    "name": "Pair",
                    "kind": "record",
                    "tag": {},
                    "components": [
                        { "name": "a", "ty": "String" },
                        { "name": "b", "ty": "pair::Inner" }
                    ],
                    "nested": [
                        {
                            "name": "Inner",
                            "kind": "record",
                            "tag": { "encapsulate_fields": false },
                            "components": [ { "name": "c", "ty": "i32" } ],
                            "nested": [ { "name": "Leaf", "kind": "record" } ]
                        }
                    ]
                },
                { "name": "Color", "kind": "enum" }
            ]
        }))
    }

    #[test]
    fn nested_declarations_get_module_paths() {
        let g = sample();
        assert_eq!(g.len(), 4);
        let inner = g.lookup("settings::pair::Inner").unwrap();
        let leaf = g.lookup("settings::pair::inner::Leaf").unwrap();
        let pair = g.lookup("settings::Pair").unwrap();

        assert_eq!(g.enclosing(inner), Some(pair));
        assert_eq!(g.enclosing(leaf), Some(inner));
        assert_eq!(g.nested(pair), &[inner]);
        assert_eq!(g.node(leaf).module(), &["pair".to_string(), "inner".to_string()]);
        // pre-order discovery
        assert_eq!(g.type_ids(), vec![pair, inner, leaf, g.lookup("settings::Color").unwrap()]);
    }

    #[test]
    fn tag_defaults() {
        let g = sample();
        let pair = g.lookup("settings::Pair").unwrap();
        let inner = g.lookup("settings::pair::Inner").unwrap();
        assert_eq!(g.tag(pair), Some(&Tag::default()));
        assert!(!g.tag(inner).unwrap().encapsulate_fields);
        assert!(!g.tag(inner).unwrap().use_fancy_method_names);
    }

    #[test]
    fn resolve_relative_absolute_and_external() {
        let g = sample();
        let pair = g.lookup("settings::Pair").unwrap();
        let inner = g.lookup("settings::pair::Inner").unwrap();
        let leaf = g.lookup("settings::pair::inner::Leaf").unwrap();
        let color = g.lookup("settings::Color").unwrap();

        assert_eq!(g.resolve(pair, "pair::Inner"), TypeRef::Declared(inner));
        assert_eq!(g.resolve(pair, "crate::settings::pair::Inner"), TypeRef::Declared(inner));
        assert_eq!(g.resolve(inner, "inner::Leaf"), TypeRef::Declared(leaf));
        assert_eq!(g.resolve(inner, "super::Color"), TypeRef::Declared(color));
        // unprefixed paths fall back to enclosing modules
        assert_eq!(g.resolve(inner, "Color"), TypeRef::Declared(color));
        // but an explicit `self::` does not, and is pinned to the declaring module
        assert_eq!(
            g.resolve(inner, "self::Color"),
            TypeRef::External("crate::settings::pair::Color".into())
        );
        assert_eq!(g.resolve(pair, "super::Ext"), TypeRef::External("crate::Ext".into()));
        assert_eq!(
            g.resolve(inner, "Option<super::Color>"),
            TypeRef::External("Option<crate::settings::Color>".into())
        );
        assert_eq!(g.resolve(pair, "super"), TypeRef::Malformed("super".into()));

        assert_eq!(g.resolve(pair, "String"), TypeRef::External("String".into()));
        assert_eq!(g.resolve(pair, "Vec<pair::Inner>"), TypeRef::External("Vec<pair::Inner>".into()));
        assert_eq!(g.resolve(pair, "Vec<String"), TypeRef::Malformed("Vec<String".into()));
        assert_eq!(g.resolve(pair, " "), TypeRef::Malformed("".into()));
        assert_eq!(g.resolve(pair, "super::super::X"), TypeRef::Malformed("super::super::X".into()));
        assert_eq!(
            g.resolve(pair, "Box<dyn Fn(u8) -> u8>"),
            TypeRef::External("Box<dyn Fn(u8) -> u8>".into())
        );
    }

    #[test]
    fn duplicate_names_across_documents_fail() {
        let doc = || -> GraphDocument {
            serde_json::from_value(json!({
                "namespace": "settings",
                "types": [ { "name": "Pair", "kind": "record" } ]
            }))
            .unwrap()
        };
        let err = GraphIndex::from_documents([("a.json", doc()), ("b.json", doc())]).unwrap_err();
        assert!(matches!(err, Error::DuplicateType { ref name, .. } if name == "settings::Pair"));
    }

    #[test]
    fn invalid_namespace_is_rejected() {
        let doc: GraphDocument = serde_json::from_value(json!({ "namespace": "settings::3d" })).unwrap();
        let err = GraphIndex::from_documents([("a.json", doc)]).unwrap_err();
        assert!(matches!(err, Error::InvalidNamespace { .. }));
    }

    #[test]
    fn invalid_type_name_is_rejected() {
        let doc: GraphDocument = serde_json::from_value(json!({
            "namespace": "settings",
            "types": [
                { "name": "Outer", "kind": "record", "nested": [ { "name": "My Type", "kind": "record" } ] }
            ]
        }))
        .unwrap();
        let err = GraphIndex::from_documents([("a.json", doc)]).unwrap_err();
        assert!(matches!(err, Error::InvalidTypeName { ref name, .. } if name == "My Type"));
    }

    #[test]
    fn unknown_kind_reports_json_path() {
        let src = r#"{ "namespace": "s", "types": [ { "name": "X", "kind": "class" } ] }"#;
        let err = parse_document(src, Path::new("s.json")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("types[0].kind"), "{msg}");
    }

    #[test]
    fn root_namespace_has_no_prefix() {
        let g = index(json!({ "types": [ { "name": "Top", "kind": "record" } ] }));
        assert!(g.lookup("Top").is_some());
        assert!(g.node(TypeId(0)).namespace.is_empty());
    }
}
