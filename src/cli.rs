//! CLI: type graph documents → (companion sources | descriptor view)
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::diagnostics::Diagnostic;
use crate::graph::GraphIndex;
use crate::pipeline;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate mutable companion types (and their sealed `Source` contracts) for tagged records
#[derive(Parser, Debug)]
#[command(name = "companion-gen", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// generate one Rust source unit per outermost tagged type
    Generate(GenerateOut),
    /// print the collected tagged type descriptors as JSON (debug view)
    Inspect(InspectOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more type graph documents. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory; units go to <OUT>/<namespace>/<module>.rs (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// fail instead of writing when files under --out are missing or stale
    #[arg(long, requires = "out")]
    check: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct InspectOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_graph(&self) -> anyhow::Result<GraphIndex> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        tracing::debug!(documents = source_paths.len(), "loading type graph");
        let graph = GraphIndex::load(&source_paths).context("failed to load type graph documents")?;
        Ok(graph)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<ExitCode> {
        match &self.cmd {
            Command::Generate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(ExitCode::SUCCESS);
                }

                let graph = target.input_settings.load_graph()?;
                let generation = pipeline::generate(&graph);
                report(&generation.diagnostics);

                let mut failed = generation.has_errors();
                match target.out.as_ref() {
                    Some(out) if target.check => {
                        let stale = stale_units(out, &generation.units);
                        for path in &stale {
                            eprintln!("{} {}", "stale:".red().bold(), path.display());
                        }
                        failed |= !stale.is_empty();
                    }
                    Some(out) => {
                        for unit in &generation.units {
                            let path = out.join(unit.relative_path());
                            crate::builder::write_if_changed(&path, &unit.source)
                                .with_context(|| format!("failed to write {}", path.display()))?;
                        }
                    }
                    None => {
                        for unit in &generation.units {
                            println!("// ==> {}", unit.relative_path().display());
                            print!("{}", unit.source);
                        }
                    }
                }
                Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
            }
            Command::Inspect(target) => {
                let graph = target.input_settings.load_graph()?;
                let (tagged, diagnostics) = pipeline::inspect(&graph);
                report(&diagnostics);

                let view = serde_json::to_string_pretty(&tagged).context("failed to encode descriptors")?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("failed to create {}", parent.display()))?;
                    }
                    std::fs::write(out, &view).with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{view}");
                }
                let failed = diagnostics.iter().any(Diagnostic::is_error);
                Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic.render());
    }
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        eprintln!("{}", format!("{errors} error(s)").red().bold());
    }
}

/// Units whose file under `out` is missing or differs.
fn stale_units(out: &Path, units: &[crate::codegen::GeneratedUnit]) -> Vec<PathBuf> {
    units
        .iter()
        .map(|unit| (out.join(unit.relative_path()), &unit.source))
        .filter(|(path, source)| !std::fs::read_to_string(path).is_ok_and(|current| current == **source))
        .map(|(path, _)| path)
        .collect()
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched = glob::glob(pattern)
                .with_context(|| format!("invalid glob pattern: {pattern}"))?
                .collect::<Result<Vec<_>, _>>()?;
            if matched.is_empty() {
                // explicitly a glob but matched nothing
                bail!("glob pattern matched no files: {pattern}");
            }
            matched.sort();
            out.append(&mut matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
