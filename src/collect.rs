//! Collector: every tagged declaration of the graph, turned into a
//! [`TaggedType`] descriptor, in discovery order.

use std::collections::HashSet;

use crate::diagnostics::{DiagnosticKind, DiagnosticSink};
use crate::graph::{ComponentDecl, TypeGraph, TypeId, TypeRef};
use crate::ir::{Component, ComponentShape, Options, TaggedType, TypePath};
use crate::naming;

pub fn collect<G: TypeGraph + ?Sized>(graph: &G, sink: &DiagnosticSink) -> Vec<TaggedType> {
    let mut out = Vec::new();
    for id in graph.type_ids() {
        let Some(tag) = graph.tag(id) else { continue };
        let node = graph.node(id);

        if !graph.kind(id).is_composite() {
            sink.report(
                DiagnosticKind::InvalidTargetKind,
                node.location(),
                format!(
                    "mutable companions can only be generated for records; `{}` is a {}",
                    node.name,
                    node.kind.as_str()
                ),
            );
            continue;
        }

        if !component_names_ok(graph, id, sink) {
            continue;
        }

        let components = graph
            .components(id)
            .iter()
            .map(|decl| Component {
                name: decl.name.clone(),
                ty: decl.ty.clone(),
                shape: shape_of(graph, id, decl),
            })
            .collect();

        tracing::debug!(ty = %node.qualified_name(), "collected tagged type");
        out.push(TaggedType {
            id,
            qualified_name: node.qualified_name(),
            name: node.name.clone(),
            namespace: node.namespace.clone(),
            original: TypePath::graph(&node.namespace, node.path.clone()),
            components,
            enclosing: node.enclosing,
            options: Options {
                encapsulate_fields: tag.encapsulate_fields,
                use_fancy_names: tag.use_fancy_method_names,
                derive: tag.derive.clone(),
            },
            location: node.location(),
        });
    }
    out
}

fn component_names_ok<G: TypeGraph + ?Sized>(graph: &G, id: TypeId, sink: &DiagnosticSink) -> bool {
    let node = graph.node(id);
    let (fancy, accessors) = graph
        .tag(id)
        .map_or((false, true), |tag| (tag.use_fancy_method_names, tag.encapsulate_fields));
    let mut seen = HashSet::new();
    let mut methods = HashSet::new();
    let mut ok = true;
    for c in &node.components {
        // public fields get no accessors; only the contract's own method remains
        let generated = if accessors {
            vec![naming::getter_name(&c.name, fancy), naming::setter_name(&c.name, fancy)]
        } else {
            Vec::new()
        };
        let problem = if !naming::is_field_name(&c.name) {
            Some(format!("`{}` is not a snake_case field name", c.name))
        } else if !seen.insert(c.name.as_str()) {
            Some(format!("`{}` is declared more than once", c.name))
        } else if c.name == naming::TO_MUTABLE {
            Some(format!("`{}` collides with the generated `{}`", c.name, naming::TO_MUTABLE))
        } else if let Some(clash) = generated
            .iter()
            .find(|name| naming::RESERVED_METHODS.contains(&name.as_str()))
        {
            Some(format!("`{}` collides with the generated `{clash}`", c.name))
        } else if let Some(clash) = generated.iter().find(|name| !methods.insert((*name).clone()))
        {
            Some(format!("accessor `{clash}` of `{}` is already generated for another component", c.name))
        } else {
            None
        };
        if let Some(message) = problem {
            sink.report(
                DiagnosticKind::InvalidComponentName,
                node.location().with_component(&c.name),
                message,
            );
            ok = false;
        }
    }
    ok
}

fn shape_of<G: TypeGraph + ?Sized>(graph: &G, owner: TypeId, decl: &ComponentDecl) -> ComponentShape {
    match graph.resolve(owner, &decl.ty) {
        TypeRef::Declared(target) => {
            let node = graph.node(target);
            let declared = TypePath::graph(&node.namespace, node.path.clone());
            if !graph.is_tagged(target) {
                ComponentShape::Reference { declared }
            } else if attached_under(graph, target, owner) {
                ComponentShape::NestedTagged { id: target, declared }
            } else {
                ComponentShape::Composite { id: target, declared }
            }
        }
        TypeRef::External(text) => ComponentShape::Reference { declared: TypePath::Verbatim(text) },
        TypeRef::Malformed(_) => ComponentShape::Malformed,
    }
}

/// Does the companion of `inner` land inside the companion of `outer`, i.e.
/// is `outer` reached through tagged enclosing types only?
fn attached_under<G: TypeGraph + ?Sized>(graph: &G, inner: TypeId, outer: TypeId) -> bool {
    let mut cursor = graph.tagged_enclosing(inner);
    while let Some(id) = cursor {
        if id == outer {
            return true;
        }
        cursor = graph.tagged_enclosing(id);
    }
    false
}

// ------------------------------- Tests ------------------------------------ //
