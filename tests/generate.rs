use std::path::{Path, PathBuf};
use std::process::Command;

use companion_gen::{Builder, DiagnosticKind, GraphIndex, generate};
use pretty_assertions::assert_eq;

fn settings_graph() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("dev-test-runner/graph/settings.json")
}

#[test]
fn settings_graph_generates_one_unit_per_root() {
    let graph = GraphIndex::load(&[settings_graph()]).unwrap();
    let generation = generate(&graph);

    assert!(generation.diagnostics.is_empty(), "{:?}", generation.diagnostics);
    let files: Vec<_> = generation.units.iter().map(|u| u.relative_path()).collect();
    assert_eq!(
        files,
        vec![
            PathBuf::from("settings/mutable_test_record.rs"),
            PathBuf::from("settings/mutable_window.rs"),
        ]
    );

    let record = &generation.units[0].source;
    // nested companions live in the outer unit, once
    assert_eq!(record.matches("pub struct MutableInnerTestRecord").count(), 1);
    assert_eq!(record.matches("pub struct MutableLeaf").count(), 1);
    assert!(!generation.units[1].source.contains("MutableLeaf {"));
}

#[test]
fn output_is_deterministic() {
    let first = generate(&GraphIndex::load(&[settings_graph()]).unwrap());
    let second = generate(&GraphIndex::load(&[settings_graph()]).unwrap());
    assert_eq!(first.units, second.units);
}

#[test]
fn builder_is_idempotent_on_disk() {
    let out = tempfile::tempdir().unwrap();
    let build = || {
        Builder::new()
            .graph(settings_graph())
            .out_dir(out.path())
            .emit_rerun_if_changed(false)
            .compile()
            .unwrap()
    };
    let written = build();
    let before: Vec<_> = written.iter().map(|p| std::fs::read_to_string(p).unwrap()).collect();
    assert_eq!(build(), written);
    let after: Vec<_> = written.iter().map(|p| std::fs::read_to_string(p).unwrap()).collect();
    assert_eq!(before, after);
}

#[test]
fn a_broken_type_leaves_the_rest_generated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.json");
    std::fs::write(
        &path,
        r#"{
            "namespace": "mixed",
            "types": [
                { "name": "Kind", "kind": "enum", "tag": {} },
                { "name": "Orphan", "kind": "record", "tag": {}, "components": [ { "name": "x", "ty": "u8" } ] },
                {
                    "name": "Holder",
                    "kind": "record",
                    "tag": {},
                    "components": [ { "name": "o", "ty": "Orphan" } ],
                    "implements": ["mutable_holder::Source"]
                },
                {
                    "name": "Fine",
                    "kind": "record",
                    "tag": {},
                    "components": [ { "name": "x", "ty": "u8" } ],
                    "implements": ["mutable_fine::Source"]
                }
            ]
        }"#,
    )
    .unwrap();

    let generation = generate(&GraphIndex::load(&[path]).unwrap());
    let roots: Vec<_> = generation.units.iter().map(|u| u.root.as_str()).collect();
    assert_eq!(roots, vec!["mixed::Fine"]);
    let kinds: Vec<_> = generation.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::UnresolvedEffectiveType,
            DiagnosticKind::InvalidTargetKind,
            DiagnosticKind::MissingContract,
        ]
    );
}

#[test]
fn cli_generate_then_check() {
    let out = tempfile::tempdir().unwrap();
    let bin = env!("CARGO_BIN_EXE_companion-gen");
    let graph = settings_graph();

    let status = Command::new(bin)
        .args(["generate", "--input"])
        .arg(&graph)
        .arg("--out")
        .arg(out.path())
        .status()
        .unwrap();
    assert!(status.success());
    assert!(out.path().join("settings/mutable_window.rs").exists());

    let check = |dir: &Path| {
        Command::new(bin)
            .args(["generate", "--check", "--input"])
            .arg(&graph)
            .arg("--out")
            .arg(dir)
            .status()
            .unwrap()
    };
    assert!(check(out.path()).success());

    std::fs::write(out.path().join("settings/mutable_window.rs"), "// edited\n").unwrap();
    assert_eq!(check(out.path()).code(), Some(1));
}

#[test]
fn cli_inspect_prints_descriptors() {
    let output = Command::new(env!("CARGO_BIN_EXE_companion-gen"))
        .args(["inspect", "--input"])
        .arg(settings_graph())
        .output()
        .unwrap();
    assert!(output.status.success());
    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<_> = view
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["qualified_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "settings::TestRecord",
            "settings::test_record::InnerTestRecord",
            "settings::test_record::inner_test_record::Leaf",
            "settings::Window",
        ]
    );
}
