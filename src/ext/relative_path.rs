//! Helpers for the `/`-separated paths used inside comparison results.
//!
//! Both sides of a comparison are addressed relative to their roots, and the
//! root itself is the empty string. Keeping a single separator makes results
//! from a local and a remote tree directly comparable.

pub fn join_relative(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Number of directories above `path`. Top level entries have depth 0.
pub fn relative_depth(path: &str) -> usize {
    if path.is_empty() {
        0
    } else {
        path.matches('/').count()
    }
}

/// Splits `path` into components for ordering, so that `a/b` sorts right after `a`.
pub fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|component| !component.is_empty())
}
