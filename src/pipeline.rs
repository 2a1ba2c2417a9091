//! One generation pass: collect → validate → synthesize → render.

use rayon::prelude::*;
use serde::Serialize;

use crate::codegen::{self, GeneratedUnit};
use crate::collect::collect;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::graph::TypeGraph;
use crate::ir::TaggedType;
use crate::synth::{synthesize, walk};
use crate::validate::validate;

#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    /// One per outermost tagged type, in discovery order.
    pub units: Vec<GeneratedUnit>,
    /// Sorted by location.
    pub diagnostics: Vec<Diagnostic>,
}

impl Generation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }
}

pub fn generate<G: TypeGraph + ?Sized>(graph: &G) -> Generation {
    let sink = DiagnosticSink::new();
    let tagged = collect(graph, &sink);
    let validated = validate(graph, tagged, &sink);
    let specs = synthesize(graph, &validated, &sink);
    tracing::debug!(
        units = specs.len(),
        companions = specs.iter().map(|s| walk(s).len()).sum::<usize>(),
        "synthesis done"
    );

    let units: Vec<GeneratedUnit> = specs.par_iter().map(|spec| codegen::render(spec)).collect();
    for unit in &units {
        tracing::info!(root = %unit.root, file = %unit.relative_path().display(), "generated companion unit");
    }

    Generation { units, diagnostics: sink.into_sorted() }
}

/// Descriptors only, for the `inspect` view.
pub fn inspect<G: TypeGraph + ?Sized>(graph: &G) -> (Vec<TaggedType>, Vec<Diagnostic>) {
    let sink = DiagnosticSink::new();
    let tagged = collect(graph, &sink);
    (tagged, sink.into_sorted())
}

// ------------------------------- Tests ------------------------------------ //
