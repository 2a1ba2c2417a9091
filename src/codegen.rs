//! Rust source emission for synthesized companions.
//!
//! A unit is meant to be `include!`d into the namespace module that declares
//! the original types. Output is a pure function of the spec: no timestamps,
//! declaration order everywhere.

use std::fmt::Write as _;

use serde::Serialize;

use crate::ir::{AccessorStyle, CompanionSpec, EffectiveTy, Scope};
use crate::naming;

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedUnit {
    pub namespace: Vec<String>,
    /// `mutable_pair.rs`
    pub file_name: String,
    /// Qualified name of the originating type.
    pub root: String,
    pub source: String,
}

impl GeneratedUnit {
    /// Output path relative to the output directory.
    pub fn relative_path(&self) -> std::path::PathBuf {
        let mut path: std::path::PathBuf = self.namespace.iter().collect();
        path.push(&self.file_name);
        path
    }
}

pub fn render(spec: &CompanionSpec) -> GeneratedUnit {
    let mut cg = Codegen::new();
    cg.emit(spec);
    GeneratedUnit {
        namespace: spec.namespace.clone(),
        file_name: format!("{}.rs", naming::module_name(&spec.name)),
        root: spec.origin_name.clone(),
        source: cg.into_string(),
    }
}

pub struct Codegen {
    out: String,
    indent: usize,
}

impl Default for Codegen {
    fn default() -> Self {
        Self::new()
    }
}

impl Codegen {
    pub fn new() -> Self {
        Self { out: String::new(), indent: 0 }
    }

    pub fn into_string(self) -> String {
        self.out
    }

    /// Header plus the companion tree of `spec`.
    pub fn emit(&mut self, spec: &CompanionSpec) {
        self.line(&format!(
            "// @generated by companion-gen from `{}`. Do not edit.",
            spec.origin_name
        ));
        self.blank();
        self.companion(spec);
    }

    fn companion(&mut self, spec: &CompanionSpec) {
        let scope = spec.scope();
        self.strukt(spec, &scope);
        self.blank();
        self.inherent_impl(spec, &scope);
        self.blank();
        self.module(spec);
    }

    fn strukt(&mut self, spec: &CompanionSpec, scope: &Scope) {
        self.line(&format!(
            "/// Mutable companion of [`{}`].",
            spec.original.render(scope)
        ));
        if !spec.derives.is_empty() {
            self.line(&format!("#[derive({})]", spec.derives.join(", ")));
        }
        if spec.fields.is_empty() {
            self.line(&format!("pub struct {} {{}}", spec.name));
            return;
        }
        self.open(&format!("pub struct {} {{", spec.name));
        for field in &spec.fields {
            let vis = if field.public { "pub " } else { "" };
            self.line(&format!("{vis}{}: {},", field.name, field.ty.ty().render(scope)));
        }
        self.close("}");
    }

    fn inherent_impl(&mut self, spec: &CompanionSpec, scope: &Scope) {
        let contract = spec.contract.path.render(scope);
        let original = spec.original.render(scope);

        self.line("#[allow(clippy::clone_on_copy)]");
        self.open(&format!("impl {} {{", spec.name));

        let param = if spec.fields.is_empty() { "_source" } else { "source" };
        self.open(&format!(
            "pub fn {}<S: {contract} + ?Sized>({param}: &S) -> Self {{",
            naming::FROM_SOURCE
        ));
        self.struct_literal("Self", spec, |field| match &field.ty {
            EffectiveTy::Declared { .. } => format!("source.{}().clone()", field.name),
            EffectiveTy::Companion { contract, .. } => format!(
                "{}::{}(source.{}())",
                contract.render(scope),
                naming::TO_MUTABLE,
                field.name
            ),
        });
        self.close("}");

        self.blank();
        self.open(&format!("pub fn {}(&self) -> {original} {{", naming::TO_IMMUTABLE));
        self.struct_literal(&original, spec, |field| match &field.ty {
            EffectiveTy::Declared { .. } => format!("self.{}.clone()", field.name),
            EffectiveTy::Companion { .. } => {
                format!("self.{}.{}()", field.name, naming::TO_IMMUTABLE)
            }
        });
        self.close("}");

        for pair in &spec.accessors {
            let Some(field) = spec.fields.iter().find(|f| f.name == pair.field) else {
                continue;
            };
            let ty = field.ty.ty().render(scope);
            self.blank();
            self.open(&format!("pub fn {}(&self) -> &{ty} {{", pair.getter));
            self.line(&format!("&self.{}", pair.field));
            self.close("}");
            self.blank();
            match pair.style {
                AccessorStyle::Plain => {
                    self.open(&format!("pub fn {}(&mut self) -> &mut {ty} {{", pair.setter));
                    self.line(&format!("&mut self.{}", pair.field));
                }
                AccessorStyle::Fancy => {
                    self.open(&format!("pub fn {}(&mut self, value: {ty}) {{", pair.setter));
                    self.line(&format!("self.{} = value;", pair.field));
                }
            }
            self.close("}");
        }
        self.close("}");
    }

    /// `pub mod mutable_x`: the `Source` contract, its seal, nested companions.
    fn module(&mut self, spec: &CompanionSpec) {
        let scope = spec.module_scope();
        let contract = &spec.contract;

        self.open(&format!("pub mod {} {{", naming::module_name(&spec.name)));
        self.line("#[allow(unused_imports)]");
        self.line("use super::*;");
        self.blank();

        self.line(&format!(
            "/// Read access [`{}`] must provide for [`{}`].",
            spec.original.render(&scope),
            contract.companion.render(&scope)
        ));
        self.open(&format!(
            "pub trait {}: {}::Sealed {{",
            naming::CONTRACT_NAME,
            naming::SEALED_MODULE
        ));
        for accessor in &contract.accessors {
            self.line(&format!("fn {}(&self) -> &{};", accessor.name, accessor.returns.render(&scope)));
        }
        if !contract.accessors.is_empty() {
            self.blank();
        }
        let companion = contract.companion.render(&scope);
        self.open(&format!("fn {}(&self) -> {companion} {{", naming::TO_MUTABLE));
        self.line(&format!("{companion}::{}(self)", naming::FROM_SOURCE));
        self.close("}");
        self.close("}");
        self.blank();

        let sealed = scope.child(naming::SEALED_MODULE);
        self.open(&format!("mod {} {{", naming::SEALED_MODULE));
        self.line("pub trait Sealed {}");
        self.line(&format!("impl Sealed for {} {{}}", contract.permits.render(&sealed)));
        self.close("}");

        for inner in &spec.nested {
            self.blank();
            self.companion(inner);
        }
        self.close("}");
    }

    fn struct_literal<F>(&mut self, head: &str, spec: &CompanionSpec, value: F)
    where
        F: Fn(&crate::ir::FieldSpec) -> String,
    {
        if spec.fields.is_empty() {
            self.line(&format!("{head} {{}}"));
            return;
        }
        self.open(&format!("{head} {{"));
        for field in &spec.fields {
            self.line(&format!("{}: {},", field.name, value(field)));
        }
        self.close("}");
    }

    // ------------------------------ Writer -------------------------------- //

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        let _ = writeln!(self.out, "{text}");
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn open(&mut self, text: &str) {
        self.line(text);
        self.indent += 1;
    }

    fn close(&mut self, text: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::collect;
    use crate::diagnostics::DiagnosticSink;
    use crate::graph::{GraphDocument, GraphIndex};
    use crate::synth::synthesize;
    use crate::validate::validate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn units(doc: serde_json::Value) -> Vec<GeneratedUnit> {
        let doc: GraphDocument = serde_json::from_value(doc).unwrap();
        let g = GraphIndex::from_documents([("s.json", doc)]).unwrap();
        let sink = DiagnosticSink::new();
        let validated = validate(&g, collect(&g, &sink), &sink);
        let specs = synthesize(&g, &validated, &sink);
        assert!(sink.is_empty(), "{:?}", sink.into_sorted());
        specs.iter().map(|s| render(s)).collect()
    }

    fn pair() -> serde_json::Value {
        json!({
            "namespace": "s",
            "types": [
                {
                    "name": "Pair",
                    "kind": "record",
                    "tag": { "derive": ["Debug", "Clone"] },
                    "components": [
                        { "name": "a", "ty": "String" },
                        { "name": "b", "ty": "pair::Inner" }
                    ],
                    "implements": ["mutable_pair::Source"],
                    "nested": [
                        {
                            "name": "Inner",
                            "kind": "record",
                            "tag": { "use_fancy_method_names": true, "derive": ["Debug", "Clone"] },
                            "components": [ { "name": "c", "ty": "i32" } ],
                            "implements": ["mutable_pair::mutable_inner::Source"]
                        }
                    ]
                }
            ]
        })
    }

    #[test]
    fn pair_unit_text() {
        let units = units(pair());
        assert_eq!(units.len(), 1);
        let unit = &units[0];
        assert_eq!(unit.file_name, "mutable_pair.rs");
        assert_eq!(unit.root, "s::Pair");
        assert_eq!(unit.relative_path(), std::path::PathBuf::from("s/mutable_pair.rs"));

        let expected = r#"// @generated by companion-gen from `s::Pair`. Do not edit.

/// Mutable companion of [`Pair`].
#[derive(Debug, Clone)]
pub struct MutablePair {
    a: String,
    b: mutable_pair::MutableInner,
}

#[allow(clippy::clone_on_copy)]
impl MutablePair {
    pub fn from_source<S: mutable_pair::Source + ?Sized>(source: &S) -> Self {
        Self {
            a: source.a().clone(),
            b: mutable_pair::mutable_inner::Source::to_mutable(source.b()),
        }
    }

    pub fn to_immutable(&self) -> Pair {
        Pair {
            a: self.a.clone(),
            b: self.b.to_immutable(),
        }
    }

    pub fn a(&self) -> &String {
        &self.a
    }

    pub fn a_mut(&mut self) -> &mut String {
        &mut self.a
    }

    pub fn b(&self) -> &mutable_pair::MutableInner {
        &self.b
    }

    pub fn b_mut(&mut self) -> &mut mutable_pair::MutableInner {
        &mut self.b
    }
}

pub mod mutable_pair {
    #[allow(unused_imports)]
    use super::*;

    /// Read access [`super::Pair`] must provide for [`super::MutablePair`].
    pub trait Source: sealed::Sealed {
        fn a(&self) -> &String;
        fn b(&self) -> &super::pair::Inner;

        fn to_mutable(&self) -> super::MutablePair {
            super::MutablePair::from_source(self)
        }
    }

    mod sealed {
        pub trait Sealed {}
        impl Sealed for super::super::Pair {}
    }

    /// Mutable companion of [`super::pair::Inner`].
    #[derive(Debug, Clone)]
    pub struct MutableInner {
        c: i32,
    }

    #[allow(clippy::clone_on_copy)]
    impl MutableInner {
        pub fn from_source<S: mutable_inner::Source + ?Sized>(source: &S) -> Self {
            Self {
                c: source.c().clone(),
            }
        }

        pub fn to_immutable(&self) -> super::pair::Inner {
            super::pair::Inner {
                c: self.c.clone(),
            }
        }

        pub fn get_c(&self) -> &i32 {
            &self.c
        }

        pub fn set_c(&mut self, value: i32) {
            self.c = value;
        }
    }

    pub mod mutable_inner {
        #[allow(unused_imports)]
        use super::*;

        /// Read access [`super::super::pair::Inner`] must provide for [`super::MutableInner`].
        pub trait Source: sealed::Sealed {
            fn c(&self) -> &i32;

            fn to_mutable(&self) -> super::MutableInner {
                super::MutableInner::from_source(self)
            }
        }

        mod sealed {
            pub trait Sealed {}
            impl Sealed for super::super::super::pair::Inner {}
        }
    }
}
"#;
        assert_eq!(unit.source, expected);
    }

    #[test]
    fn public_fields_have_no_accessors() {
        let units = units(json!({
            "namespace": "s",
            "types": [
                {
                    "name": "Open",
                    "kind": "record",
                    "tag": { "encapsulate_fields": false },
                    "components": [ { "name": "x", "ty": "u8" } ],
                    "implements": ["mutable_open::Source"]
                }
            ]
        }));
        let src = &units[0].source;
        assert!(src.contains("    pub x: u8,\n"), "{src}");
        assert!(!src.contains("fn x(&self)\n"), "{src}");
        assert!(!src.contains("x_mut"), "{src}");
    }

    #[test]
    fn empty_record_compiles_to_empty_literals() {
        let units = units(json!({
            "namespace": "s",
            "types": [
                { "name": "Marker", "kind": "record", "tag": {}, "implements": ["mutable_marker::Source"] }
            ]
        }));
        let src = &units[0].source;
        assert!(src.contains("pub struct MutableMarker {}\n"), "{src}");
        assert!(src.contains("(_source: &S) -> Self {\n        Self {}\n"), "{src}");
        assert!(src.contains("        Marker {}\n"), "{src}");
    }

    #[test]
    fn cross_namespace_companions_are_crate_absolute() {
        let window: GraphDocument = serde_json::from_value(json!({
            "namespace": "ui",
            "types": [
                {
                    "name": "Window",
                    "kind": "record",
                    "tag": {},
                    "components": [ { "name": "w", "ty": "u32" } ],
                    "implements": ["mutable_window::Source"]
                }
            ]
        }))
        .unwrap();
        let app: GraphDocument = serde_json::from_value(json!({
            "namespace": "app",
            "types": [
                {
                    "name": "App",
                    "kind": "record",
                    "tag": {},
                    "components": [ { "name": "main", "ty": "crate::ui::Window" } ],
                    "implements": ["mutable_app::Source"]
                }
            ]
        }))
        .unwrap();
        let g = GraphIndex::from_documents([("ui.json", window), ("app.json", app)]).unwrap();
        let sink = DiagnosticSink::new();
        let validated = validate(&g, collect(&g, &sink), &sink);
        let specs = synthesize(&g, &validated, &sink);
        let app = specs.iter().find(|s| s.name == "MutableApp").map(|s| render(s)).unwrap();

        assert!(app.source.contains("    main: crate::ui::MutableWindow,\n"), "{}", app.source);
        assert!(
            app.source
                .contains("main: crate::ui::mutable_window::Source::to_mutable(source.main()),"),
            "{}",
            app.source
        );
        assert!(app.source.contains("fn main(&self) -> &crate::ui::Window;"), "{}", app.source);
    }
}
