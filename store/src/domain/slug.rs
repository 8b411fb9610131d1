//! Slug predicate for cause identifiers.
//!
//! A slug is a non-empty run of lowercase ASCII letters, digits and hyphens
//! that neither starts nor ends with a hyphen.

/// Return `true` when `value` is a valid slug.
pub(crate) fn is_valid_slug(value: &str) -> bool {
    is_trimmed_non_empty(value) && has_allowed_slug_chars(value) && !has_edge_hyphen(value)
}

fn is_trimmed_non_empty(value: &str) -> bool {
    !value.is_empty() && value.trim() == value
}

fn has_allowed_slug_chars(value: &str) -> bool {
    value
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

fn has_edge_hyphen(value: &str) -> bool {
    value.starts_with('-') || value.ends_with('-')
}
