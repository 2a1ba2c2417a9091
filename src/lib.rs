//! Mutable companion generation for tagged immutable records.
//!
//! Given a type graph (JSON documents exported by the host, one per
//! namespace), every record carrying a `tag` gets a `Mutable<Name>` companion
//! with accessors, a `from_source` constructor and `to_immutable`, plus a
//! sealed `Source` trait the original type implements. Nested tagged records
//! are generated inside their enclosing companion's module, so each root
//! yields one self-contained unit.
//!
//! Entry points: [`Builder`] for build scripts, [`generate`] for anything
//! holding a [`TypeGraph`], and the `companion-gen` binary.

pub mod builder;
pub mod cli;
pub mod codegen;
pub mod collect;
pub mod config_manager;
pub mod contract;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod ir;
pub mod naming;
pub mod path_de;
pub mod pipeline;
pub mod synth;
pub mod validate;

pub use builder::Builder;
pub use codegen::GeneratedUnit;
pub use config_manager::{ConfigError, ConfigManager, OverrideGuard};
pub use diagnostics::{Diagnostic, DiagnosticKind, Location, Severity};
pub use error::{Error, Result};
pub use graph::{GraphDocument, GraphIndex, TypeGraph, TypeId};
pub use pipeline::{Generation, generate};
