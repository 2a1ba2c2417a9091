//! Source contracts, and where companions are placed.
//!
//! Placement: a companion sits inside its enclosing type's companion module
//! when the enclosing type is tagged, otherwise at namespace level. Its own
//! module (`mutable_pair` for `MutablePair`) holds the `Source` trait.

use crate::graph::{TypeGraph, TypeId};
use crate::ir::{ContractAccessor, SourceContract, TaggedType, TypePath};
use crate::naming;

// ------------------------------- Placement -------------------------------- //

/// Namespace-relative path of the companion struct of `id`.
pub fn companion_segments<G: TypeGraph + ?Sized>(graph: &G, id: TypeId) -> Vec<String> {
    let node = graph.node(id);
    let name = naming::companion_name(&node.name);
    match node.enclosing.filter(|&outer| graph.is_tagged(outer)) {
        Some(outer) => {
            let mut segments = companion_module(graph, outer);
            segments.push(name);
            segments
        }
        None => vec![name],
    }
}

/// Namespace-relative path of the companion module of `id`.
pub fn companion_module<G: TypeGraph + ?Sized>(graph: &G, id: TypeId) -> Vec<String> {
    let mut segments = companion_segments(graph, id);
    if let Some(last) = segments.pop() {
        segments.push(naming::module_name(&last));
    }
    segments
}

pub fn contract_segments<G: TypeGraph + ?Sized>(graph: &G, id: TypeId) -> Vec<String> {
    let mut segments = companion_module(graph, id);
    segments.push(naming::CONTRACT_NAME.to_string());
    segments
}

pub fn companion_path<G: TypeGraph + ?Sized>(graph: &G, id: TypeId) -> TypePath {
    TypePath::graph(&graph.node(id).namespace, companion_segments(graph, id))
}

pub fn contract_path<G: TypeGraph + ?Sized>(graph: &G, id: TypeId) -> TypePath {
    TypePath::graph(&graph.node(id).namespace, contract_segments(graph, id))
}

/// `settings::mutable_pair::Source`: the registry key of a contract.
pub fn contract_key<G: TypeGraph + ?Sized>(graph: &G, id: TypeId) -> String {
    let node = graph.node(id);
    node.namespace
        .iter()
        .cloned()
        .chain(contract_segments(graph, id))
        .collect::<Vec<_>>()
        .join("::")
}

/// Normalise a declared capability of a type in `namespace` to the registry
/// key form: `crate::` paths are absolute, anything else is relative to the
/// namespace.
pub fn capability_key(namespace: &[String], capability: &str) -> String {
    let capability = capability.trim();
    if let Some(abs) = capability.strip_prefix("crate::") {
        return abs.to_string();
    }
    let rel = capability.strip_prefix("self::").unwrap_or(capability);
    if namespace.is_empty() {
        rel.to_string()
    } else {
        format!("{}::{rel}", namespace.join("::"))
    }
}

// ------------------------------- Generator -------------------------------- //

/// One accessor per component, in declaration order, returning the declared
/// (not the companion) type; plus the default `to_mutable`, which codegen
/// renders from `companion`.
pub fn generate(descriptor: &TaggedType, path: TypePath, companion: TypePath) -> SourceContract {
    let accessors = descriptor
        .components
        .iter()
        .map(|c| ContractAccessor {
            name: c.name.clone(),
            returns: c.declared().cloned().unwrap_or_else(|| TypePath::Verbatim(c.ty.clone())),
        })
        .collect();
    SourceContract {
        path,
        accessors,
        companion,
        permits: descriptor.original.clone(),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::collect;
    use crate::diagnostics::DiagnosticSink;
    use crate::graph::{GraphDocument, GraphIndex};
    use serde_json::json;

    fn graph() -> GraphIndex {
        let doc: GraphDocument = serde_json::from_value(json!({
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
                        { "name": "Inner", "kind": "record", "tag": {} },
                        {
                            "name": "Plain",
                            "kind": "record",
                            "nested": [ { "name": "Deep", "kind": "record", "tag": {} } ]
                        }
                    ]
                }
            ]
        }))
        .unwrap();
        GraphIndex::from_documents([("settings.json", doc)]).unwrap()
    }

    #[test]
    fn placement_follows_tagged_enclosing_types() {
        let g = graph();
        let pair = g.lookup("settings::Pair").unwrap();
        let inner = g.lookup("settings::pair::Inner").unwrap();
        let deep = g.lookup("settings::pair::plain::Deep").unwrap();

        assert_eq!(companion_segments(&g, pair), vec!["MutablePair"]);
        assert_eq!(companion_segments(&g, inner), vec!["mutable_pair", "MutableInner"]);
        assert_eq!(contract_segments(&g, inner), vec!["mutable_pair", "mutable_inner", "Source"]);
        // enclosing `Plain` is untagged: standalone at namespace level
        assert_eq!(companion_segments(&g, deep), vec!["MutableDeep"]);
        assert_eq!(contract_key(&g, inner), "settings::mutable_pair::mutable_inner::Source");
    }

    #[test]
    fn capability_keys_accept_relative_and_absolute_forms() {
        let ns = vec!["settings".to_string()];
        let want = "settings::mutable_pair::Source";
        assert_eq!(capability_key(&ns, "mutable_pair::Source"), want);
        assert_eq!(capability_key(&ns, "self::mutable_pair::Source"), want);
        assert_eq!(capability_key(&ns, "crate::settings::mutable_pair::Source"), want);
        assert_eq!(capability_key(&[], "mutable_pair::Source"), "mutable_pair::Source");
    }

    #[test]
    fn contract_mirrors_components_and_permits_the_origin() {
        let g = graph();
        let tagged = collect(&g, &DiagnosticSink::new());
        let pair = &tagged[0];
        let contract = generate(pair, contract_path(&g, pair.id), companion_path(&g, pair.id));

        let names: Vec<_> = contract.accessors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(contract.accessors[0].returns, TypePath::Verbatim("String".into()));
        // declared type, not the companion
        assert_eq!(
            contract.accessors[1].returns,
            TypePath::graph(&["settings".into()], vec!["pair".into(), "Inner".into()])
        );
        assert_eq!(contract.permits, pair.original);
    }
}
