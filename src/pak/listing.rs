use std::cmp::Ordering;

use super::spec::{Spec, SpecIndex};

/// Case-insensitive ordering of package IDs, ties broken by their exact bytes
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Catalog entries in display order, keyed by their index ID
pub fn sorted_specs(index: &SpecIndex) -> Vec<(&str, &Spec)> {
    let mut specs = index
        .iter()
        .map(|(id, spec)| (id.as_str(), spec))
        .collect::<Vec<_>>();

    specs.sort_by(|(a, _), (b, _)| compare_ids(a, b));
    specs
}

/// Catalog entries whose ID contains `query` (ignoring case), in display order
pub fn search<'a>(index: &'a SpecIndex, query: &str) -> Vec<(&'a str, &'a Spec)> {
    let query = query.to_lowercase();

    sorted_specs(index)
        .into_iter()
        .filter(|(id, _)| id.to_lowercase().contains(&query))
        .collect()
}
