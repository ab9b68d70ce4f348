//! Import candidate filtering and formatting.

/// Drop candidates whose module path starts with any vendored prefix.
///
/// Engine order is preserved and duplicates are collapsed to their first
/// occurrence.
pub fn filter_candidates(candidates: Vec<String>, vendor_prefixes: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(candidates.len());
    for module in candidates {
        if vendor_prefixes
            .iter()
            .any(|prefix| module.starts_with(prefix.as_str()))
        {
            tracing::debug!(module = %module, "skipping vendored import candidate");
            continue;
        }
        if !kept.contains(&module) {
            kept.push(module);
        }
    }
    kept
}

/// Render an import statement for `name` from `module`.
pub fn import_statement(module: &str, name: &str) -> String {
    format!("from {} import {}", module, name)
}
