//! Priority selection.
//!
//! The longest-waiting transient runs first: candidates are ordered by
//! `public_timestamp` ascending, with untimestamped transients after all
//! timestamped ones, and ties broken by name so selection is reproducible
//! across repeated runs.

use astroflow_core::Transient;

/// Order candidates by priority, best first.
pub fn priority_order(mut candidates: Vec<Transient>) -> Vec<Transient> {
    candidates.sort_by(|a, b| {
        match (a.public_timestamp, b.public_timestamp) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then_with(|| a.name.cmp(&b.name))
    });
    candidates
}

/// Pick the single highest-priority candidate, if any. An empty input is a
/// normal no-op, not an error.
pub fn select(candidates: Vec<Transient>) -> Option<Transient> {
    priority_order(candidates).into_iter().next()
}
