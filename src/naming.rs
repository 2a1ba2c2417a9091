//! Naming rules shared by the resolver, validator and synthesizer.

use once_cell::sync::Lazy;
use regex::Regex;

pub const COMPANION_PREFIX: &str = "Mutable";
pub const CONTRACT_NAME: &str = "Source";
pub const SEALED_MODULE: &str = "sealed";
pub const TO_MUTABLE: &str = "to_mutable";
pub const TO_IMMUTABLE: &str = "to_immutable";
pub const FROM_SOURCE: &str = "from_source";

/// Methods every companion (or contract) already has.
pub const RESERVED_METHODS: &[&str] = &[TO_MUTABLE, TO_IMMUTABLE, FROM_SOURCE];

static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());
static SNAKE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap());
static PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z_][A-Za-z0-9_]*)(?:::[A-Za-z_][A-Za-z0-9_]*)*$").unwrap()
});
static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_:])((?:self|super)(?:::(?:self|super))*)::").unwrap()
});

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final",
    "gen", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

pub fn is_identifier(s: &str) -> bool {
    IDENT_RE.is_match(s) && !is_keyword(s)
}

pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

/// Field-style identifier: lower snake case, not a keyword.
pub fn is_field_name(s: &str) -> bool {
    SNAKE_RE.is_match(s) && !is_keyword(s) && s != "_"
}

/// `a::b::C`, no generics, no leading `::`.
pub fn is_plain_path(s: &str) -> bool {
    PATH_RE.is_match(s)
}

/// Rewrite every `self::`/`super::` path prefix in `text` as a `crate::` one,
/// as seen from `module` (crate-absolute). `None` when `super` climbs past
/// the crate root.
pub fn rebase_relative_paths(text: &str, module: &[String]) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in RELATIVE_RE.captures_iter(text) {
        let Some(prefix) = caps.get(1) else { continue };
        let mut current = module.to_vec();
        for segment in prefix.as_str().split("::") {
            if segment == "super" {
                current.pop()?;
            }
        }
        out.push_str(&text[last..prefix.start()]);
        out.push_str("crate");
        for segment in &current {
            out.push_str("::");
            out.push_str(segment);
        }
        last = prefix.end();
    }
    out.push_str(&text[last..]);
    Some(out)
}

/// `TestRecord` → `test_record`, `HTTPConfig` → `http_config`.
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|j| chars[j]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                None => false,
                Some(p) if p == '_' => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                // end of an acronym: `HTTPConfig` splits before `C`
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                Some(_) => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

pub fn companion_name(type_name: &str) -> String {
    format!("{COMPANION_PREFIX}{type_name}")
}

/// Module holding a type's nested declarations (`Pair` → `pair`).
pub fn module_name(type_name: &str) -> String {
    to_snake_case(type_name)
}

/// Read accessor: `a` or, fancy, `get_a`.
pub fn getter_name(component: &str, fancy: bool) -> String {
    if fancy { format!("get_{component}") } else { component.to_string() }
}

/// Write accessor: `a_mut` (returns `&mut`) or, fancy, `set_a` (takes a value).
pub fn setter_name(component: &str, fancy: bool) -> String {
    if fancy { format!("set_{component}") } else { format!("{component}_mut") }
}
