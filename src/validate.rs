//! Contract validation: every collected descriptor must declare its own sealed
//! `Source` contract, nobody else may, and only outermost tagged types drive
//! generation.

use indexmap::IndexMap;

use crate::contract;
use crate::diagnostics::{DiagnosticKind, DiagnosticSink};
use crate::graph::{TypeGraph, TypeId};
use crate::ir::TaggedType;
use crate::naming;

/// Which type may implement each `Source` contract. Exactly one per contract.
#[derive(Debug, Default, Clone)]
pub struct ContractRegistry {
    implementers: IndexMap<String, TypeId>,
}

impl ContractRegistry {
    pub fn permit(&mut self, contract: String, implementer: TypeId) {
        self.implementers.insert(contract, implementer);
    }

    pub fn implementer(&self, contract: &str) -> Option<TypeId> {
        self.implementers.get(contract).copied()
    }

    pub fn len(&self) -> usize {
        self.implementers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.implementers.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Validated {
    /// Descriptors that passed, in discovery order.
    pub accepted: IndexMap<TypeId, TaggedType>,
    /// Outermost accepted descriptors: one generated unit each.
    pub roots: Vec<TypeId>,
    pub registry: ContractRegistry,
}

impl Validated {
    pub fn is_accepted(&self, id: TypeId) -> bool {
        self.accepted.contains_key(&id)
    }
}

pub fn validate<G: TypeGraph + ?Sized>(
    graph: &G,
    tagged: Vec<TaggedType>,
    sink: &DiagnosticSink,
) -> Validated {
    let mut out = Validated::default();

    // 1) own contract, one owner per contract
    let mut duplicates = Vec::new();
    for descriptor in tagged {
        let key = contract::contract_key(graph, descriptor.id);
        let declares = graph
            .capabilities(descriptor.id)
            .iter()
            .any(|cap| contract::capability_key(&descriptor.namespace, cap) == key);
        if !declares {
            let relative = contract::contract_segments(graph, descriptor.id).join("::");
            sink.report(
                DiagnosticKind::MissingContract,
                descriptor.location.clone(),
                format!(
                    "types with generated mutable companions must implement their source contract (`{relative}`, i.e. `crate::{key}`)"
                ),
            );
            continue;
        }
        if let Some(owner) = out.registry.implementer(&key) {
            sink.report(
                DiagnosticKind::DuplicateCompanion,
                descriptor.location.clone(),
                format!(
                    "companion `{}` is already generated for `{}`",
                    naming::companion_name(&descriptor.name),
                    graph.node(owner).qualified_name()
                ),
            );
            duplicates.push(descriptor.id);
            continue;
        }
        out.registry.permit(key, descriptor.id);
        out.accepted.insert(descriptor.id, descriptor);
    }

    // 2) sealing: nobody else may claim an accepted contract
    for id in graph.type_ids() {
        if duplicates.contains(&id) {
            continue;
        }
        let node = graph.node(id);
        for cap in &node.implements {
            let key = contract::capability_key(&node.namespace, cap);
            match out.registry.implementer(&key) {
                Some(owner) if owner != id => sink.report(
                    DiagnosticKind::SealedContractViolation,
                    node.location(),
                    format!(
                        "`{key}` is sealed; only `{}` may implement it",
                        graph.node(owner).qualified_name()
                    ),
                ),
                _ => {}
            }
        }
    }

    // 3) a companion must not shadow a declared type
    let mut shadowing = Vec::new();
    for (&id, descriptor) in &out.accepted {
        let segments = contract::companion_segments(graph, id);
        let key = descriptor
            .namespace
            .iter()
            .chain(&segments)
            .cloned()
            .collect::<Vec<_>>()
            .join("::");
        if let Some(other) = graph.lookup(&key) {
            sink.report(
                DiagnosticKind::DuplicateCompanion,
                descriptor.location.clone(),
                format!(
                    "companion `{}` would clash with the declared type `{}`",
                    naming::companion_name(&descriptor.name),
                    graph.node(other).qualified_name()
                ),
            );
            shadowing.push(id);
        }
    }
    out.accepted.retain(|id, _| !shadowing.contains(id));

    // 4) nested descriptors ride on their tagged ancestor
    let placed: Vec<TypeId> = out
        .accepted
        .keys()
        .copied()
        .filter(|&id| placeable(graph, &out.accepted, id))
        .collect();
    for (&id, descriptor) in &out.accepted {
        match graph.tagged_enclosing(id) {
            None => out.roots.push(id),
            Some(_) if placed.contains(&id) => {
                tracing::debug!(ty = %descriptor.qualified_name, "generated with its enclosing type");
            }
            Some(outer) => sink.report(
                DiagnosticKind::SkippedNested,
                descriptor.location.clone(),
                format!(
                    "not generated: enclosing `{}` has no companion to hold it",
                    graph.node(outer).qualified_name()
                ),
            ),
        }
    }
    out.accepted.retain(|id, _| placed.contains(id));

    tracing::debug!(
        contracts = out.registry.len(),
        accepted = out.accepted.len(),
        roots = out.roots.len(),
        "validated"
    );
    out
}

/// Accepted, and every tagged ancestor it hangs from is accepted too.
pub fn placeable<G: TypeGraph + ?Sized>(
    graph: &G,
    accepted: &IndexMap<TypeId, TaggedType>,
    id: TypeId,
) -> bool {
    let mut cursor = id;
    loop {
        if !accepted.contains_key(&cursor) {
            return false;
        }
        match graph.tagged_enclosing(cursor) {
            Some(outer) => cursor = outer,
            None => return true,
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
