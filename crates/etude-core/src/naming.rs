//! Naming conventions shared by discovery and the resolver macros.

use std::path::Path;

/// File-stem suffixes marking a resolver unit. `_resolvers` is the Rust
/// module spelling; `-resolvers` is accepted for units mounted with `#[path]`.
pub const UNIT_SUFFIXES: [&str; 2] = ["_resolvers", "-resolvers"];

/// Source extension of a resolver unit.
pub const UNIT_EXTENSION: &str = "rs";

/// Default discovery predicate: `*_resolvers.rs` or `*-resolvers.rs`.
pub fn is_resolver_unit(path: &Path) -> bool {
    if path.extension().and_then(|e| e.to_str()) != Some(UNIT_EXTENSION) {
        return false;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| {
            UNIT_SUFFIXES
                .iter()
                .any(|suffix| stem.len() > suffix.len() && stem.ends_with(suffix))
        })
}

/// Wire name for a Rust identifier: `get_users_by_name` → `getUsersByName`.
///
/// Identifiers without underscores pass through untouched, so explicit
/// camelCase renames survive.
pub fn wire_name(ident: &str) -> String {
    let ident = ident.strip_prefix("r#").unwrap_or(ident);
    let mut out = String::with_capacity(ident.len());
    for (i, part) in ident.split('_').filter(|p| !p.is_empty()).enumerate() {
        if i == 0 {
            out.push_str(part);
            continue;
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
