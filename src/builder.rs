//! `build.rs` entry point.
//!
//! ```no_run
//! companion_gen::Builder::new()
//!     .graph("graph/settings.json")
//!     .compile()
//!     .unwrap();
//! ```
//!
//! Units land in `$OUT_DIR/<namespace>/<companion module>.rs`, to be pulled in
//! with `include!(concat!(env!("OUT_DIR"), "/settings/mutable_window.rs"))`.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::graph::GraphIndex;
use crate::pipeline::{self, Generation};

#[derive(Debug, Clone)]
pub struct Builder {
    graphs: Vec<PathBuf>,
    out_dir: Option<PathBuf>,
    emit_rerun_if_changed: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self { graphs: Vec::new(), out_dir: None, emit_rerun_if_changed: true }
    }

    pub fn graph(mut self, path: impl AsRef<Path>) -> Self {
        self.graphs.push(path.as_ref().to_path_buf());
        self
    }

    pub fn graphs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.graphs.extend(paths.into_iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    /// Defaults to `$OUT_DIR`.
    pub fn out_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.out_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Print `cargo:rerun-if-changed` for every graph document (default on).
    pub fn emit_rerun_if_changed(mut self, enabled: bool) -> Self {
        self.emit_rerun_if_changed = enabled;
        self
    }

    /// Run the pipeline and write every unit. Returns the written paths.
    pub fn compile(self) -> Result<Vec<PathBuf>> {
        let out_dir = match self.out_dir {
            Some(dir) => dir,
            None => std::env::var_os("OUT_DIR").map(PathBuf::from).ok_or(Error::MissingOutDir)?,
        };
        if self.emit_rerun_if_changed {
            for path in &self.graphs {
                println!("cargo:rerun-if-changed={}", path.display());
            }
        }

        let graph = GraphIndex::load(&self.graphs)?;
        let generation = pipeline::generate(&graph);
        for warning in generation.warnings() {
            tracing::warn!("{warning}");
        }
        if generation.has_errors() {
            for error in generation.errors() {
                tracing::error!("{error}");
            }
            let Generation { diagnostics, .. } = generation;
            return Err(Error::Diagnostics(
                diagnostics.into_iter().filter(|d| d.is_error()).collect(),
            ));
        }

        let mut written = Vec::with_capacity(generation.units.len());
        for unit in &generation.units {
            let path = out_dir.join(unit.relative_path());
            write_if_changed(&path, &unit.source)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Leaves the file (and its mtime) alone when the content is unchanged.
pub(crate) fn write_if_changed(path: &Path, contents: &str) -> Result<bool> {
    if std::fs::read_to_string(path).is_ok_and(|current| current == contents) {
        tracing::debug!(path = %path.display(), "unchanged");
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| Error::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

// ------------------------------- Tests ------------------------------------ //
