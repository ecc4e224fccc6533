// SPDX-License-Identifier: GPL-3.0-only

//! Product names hidden in package dependency strings
//!
//! Product release packages provide or obsolete their products as
//! `product(NAME)`, older ones as `product:NAME`. Either may carry a version
//! constraint, e.g. `product(SUSE_SLES) < 12` or `product:sle-hae = 11-1`.

/// Product name of a product dependency, None for any other dependency
pub fn extract_product_name_from_dependency_string(dependency: &str) -> Option<&str> {
    let dependency = dependency.trim();

    let name = if let Some(rest) = dependency.strip_prefix("product(") {
        let (inner, _) = rest.split_once(')')?;
        // `product(:NAME)` is written by some product builders
        inner.strip_prefix(':').unwrap_or(inner)
    } else if let Some(rest) = dependency.strip_prefix("product:") {
        rest.split(|c: char| c.is_whitespace() || matches!(c, '<' | '>' | '=' | '('))
            .next()
            .unwrap_or_default()
    } else {
        return None;
    };

    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }

    Some(name)
}
