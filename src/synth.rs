//! Mutable type synthesis.
//!
//! Two passes over the validated descriptors:
//!
//! 1. *Availability*: a descriptor keeps its companion only while every
//!    tagged component type and its tagged enclosing type keep theirs too.
//!    Removal repeats until nothing changes, so a chain of failures reports
//!    each link once and cycles of healthy types stay in.
//! 2. *Synthesis*: depth first from each root, memoised per type id for the
//!    whole pass, then assembled into one tree per root.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::contract;
use crate::diagnostics::{DiagnosticKind, DiagnosticSink};
use crate::graph::{TypeGraph, TypeId};
use crate::ir::{
    AccessorPair, AccessorStyle, CompanionSpec, ComponentShape, EffectiveTy, FieldSpec, TaggedType,
    TypePath,
};
use crate::naming;
use crate::validate::Validated;

pub fn synthesize<G: TypeGraph + ?Sized>(
    graph: &G,
    validated: &Validated,
    sink: &DiagnosticSink,
) -> Vec<Arc<CompanionSpec>> {
    let available = resolve_availability(graph, &validated.accepted, sink);
    let mut synth = Synthesizer {
        graph,
        accepted: &validated.accepted,
        available: &available,
        arena: IndexMap::new(),
    };
    let roots: Vec<TypeId> = validated
        .roots
        .iter()
        .copied()
        .filter(|id| available.contains(id))
        .collect();
    for &root in &roots {
        synth.synthesize(root);
    }
    roots.into_iter().filter_map(|root| synth.assemble(root)).collect()
}

// ------------------------------ Availability ------------------------------ //

fn resolve_availability<G: TypeGraph + ?Sized>(
    graph: &G,
    accepted: &IndexMap<TypeId, TaggedType>,
    sink: &DiagnosticSink,
) -> IndexSet<TypeId> {
    let mut available: IndexSet<TypeId> = accepted.keys().copied().collect();
    loop {
        let mut dropped = Vec::new();
        for &id in &available {
            let descriptor = &accepted[&id];
            if report_unresolved(graph, descriptor, &available, sink) {
                dropped.push(id);
                continue;
            }
            let outer = graph.enclosing(id).filter(|&outer| graph.is_tagged(outer));
            if let Some(outer) = outer.filter(|outer| !available.contains(outer)) {
                sink.report(
                    DiagnosticKind::SkippedNested,
                    descriptor.location.clone(),
                    format!(
                        "not generated: enclosing `{}` failed to generate",
                        graph.node(outer).qualified_name()
                    ),
                );
                dropped.push(id);
            }
        }
        if dropped.is_empty() {
            return available;
        }
        for id in dropped {
            available.shift_remove(&id);
        }
    }
}

/// Reports every component of `descriptor` whose effective type cannot be
/// decided. Returns whether any was found.
fn report_unresolved<G: TypeGraph + ?Sized>(
    graph: &G,
    descriptor: &TaggedType,
    available: &IndexSet<TypeId>,
    sink: &DiagnosticSink,
) -> bool {
    let mut failed = false;
    for component in &descriptor.components {
        let message = if component.shape == ComponentShape::Malformed {
            format!("cannot resolve the declared type `{}`", component.ty)
        } else if let Some(target) = component.tagged().filter(|id| !available.contains(id)) {
            format!(
                "`{}` is tagged but its companion `{}` is not generated",
                component.ty,
                naming::companion_name(&graph.node(target).name)
            )
        } else {
            continue;
        };
        sink.report(
            DiagnosticKind::UnresolvedEffectiveType,
            descriptor.location.clone().with_component(&component.name),
            message,
        );
        failed = true;
    }
    failed
}

// ------------------------------- Synthesis -------------------------------- //

enum Slot {
    InProgress,
    /// Flat spec; nested companions are attached by `assemble`.
    Done(CompanionSpec),
}

struct Synthesizer<'a, G: TypeGraph + ?Sized> {
    graph: &'a G,
    accepted: &'a IndexMap<TypeId, TaggedType>,
    available: &'a IndexSet<TypeId>,
    arena: IndexMap<TypeId, Slot>,
}

impl<G: TypeGraph + ?Sized> Synthesizer<'_, G> {
    fn synthesize(&mut self, id: TypeId) {
        if self.arena.contains_key(&id) {
            return;
        }
        self.arena.insert(id, Slot::InProgress);
        let (graph, accepted) = (self.graph, self.accepted);
        let descriptor = &accepted[&id];

        // 1) effective types; tagged targets are synthesized (or reused) first
        let mut fields = Vec::with_capacity(descriptor.components.len());
        for component in &descriptor.components {
            let ty = match &component.shape {
                ComponentShape::Reference { declared } => EffectiveTy::Declared { ty: declared.clone() },
                ComponentShape::Composite { id: target, .. }
                | ComponentShape::NestedTagged { id: target, .. } => {
                    // an in-progress target is a cycle: its path is enough
                    self.synthesize(*target);
                    EffectiveTy::Companion {
                        ty: contract::companion_path(graph, *target),
                        contract: contract::contract_path(graph, *target),
                    }
                }
                // excluded by availability
                ComponentShape::Malformed => EffectiveTy::Declared { ty: TypePath::Verbatim(component.ty.clone()) },
            };
            // 2) visibility
            fields.push(FieldSpec {
                name: component.name.clone(),
                ty,
                public: !descriptor.options.encapsulate_fields,
            });
        }

        // 3) accessor names
        let accessors = if descriptor.options.encapsulate_fields {
            let fancy = descriptor.options.use_fancy_names;
            let style = if fancy { AccessorStyle::Fancy } else { AccessorStyle::Plain };
            descriptor
                .components
                .iter()
                .map(|c| AccessorPair {
                    field: c.name.clone(),
                    getter: naming::getter_name(&c.name, fancy),
                    setter: naming::setter_name(&c.name, fancy),
                    style,
                })
                .collect()
        } else {
            Vec::new()
        };

        let segments = contract::companion_segments(graph, id);
        let companion = contract::companion_path(graph, id);
        let spec = CompanionSpec {
            origin: id,
            origin_name: descriptor.qualified_name.clone(),
            name: naming::companion_name(&descriptor.name),
            namespace: descriptor.namespace.clone(),
            segments,
            original: descriptor.original.clone(),
            derives: descriptor.options.derive.clone(),
            fields,
            accessors,
            contract: contract::generate(descriptor, contract::contract_path(graph, id), companion),
            nested: Vec::new(),
        };
        tracing::debug!(ty = %spec.origin_name, companion = %spec.name, "synthesized companion");

        // 6) nested tagged declarations, in declaration order
        for &inner in graph.nested(id) {
            if self.available.contains(&inner) {
                self.synthesize(inner);
            }
        }
        self.arena.insert(id, Slot::Done(spec));
    }

    fn assemble(&self, id: TypeId) -> Option<Arc<CompanionSpec>> {
        let Some(Slot::Done(flat)) = self.arena.get(&id) else {
            return None;
        };
        let mut spec = flat.clone();
        spec.nested = self
            .graph
            .nested(id)
            .iter()
            .filter(|&&inner| self.available.contains(&inner) && self.graph.is_tagged(inner))
            .filter_map(|&inner| self.assemble(inner))
            .collect();
        Some(Arc::new(spec))
    }
}

/// Flattened view of a companion tree, outermost first.
pub fn walk(spec: &Arc<CompanionSpec>) -> Vec<Arc<CompanionSpec>> {
    let mut out = vec![spec.clone()];
    for inner in &spec.nested {
        out.extend(walk(inner));
    }
    out
}

// ------------------------------- Tests ------------------------------------ //
