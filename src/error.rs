//! Library error type.
//!
//! Structural problems in a type graph are *not* errors in this sense; they
//! are collected as [`crate::diagnostics::Diagnostic`]s and never abort a run.
//! `Error` covers what stops a run outright: unreadable or malformed graph
//! documents and, for the builder, a run that finished with error diagnostics.

use std::path::PathBuf;
use thiserror::Error;

use crate::diagnostics::Diagnostic;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed type graph document; `message` carries the JSON path.
    #[error("invalid type graph document {path}: {message}")]
    Document { path: PathBuf, message: String },

    #[error("type `{name}` is declared more than once (in {first} and {second})")]
    DuplicateType {
        name: String,
        first: String,
        second: String,
    },

    #[error("invalid namespace `{namespace}` in {path}")]
    InvalidNamespace { namespace: String, path: String },

    #[error("invalid type name `{name}` in {path}")]
    InvalidTypeName { name: String, path: String },

    #[error("no output directory configured (set `out_dir` or OUT_DIR)")]
    MissingOutDir,

    #[error("generation reported {} error(s)", .0.len())]
    Diagnostics(Vec<Diagnostic>),
}
