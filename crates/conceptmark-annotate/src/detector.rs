//! Single-pass summaries over the entity list: ambiguity and group presence.

use indexmap::IndexMap;
use tracing::debug;

use conceptmark_common::EntityRecord;

use crate::groups::SemanticGroupCatalog;

/// True when some mention carries ids from more than one group, judged by
/// the last four characters of each id.
pub fn has_ambiguous_concepts(records: &[EntityRecord]) -> bool {
    records.iter().any(|record| match record.ids.split_first() {
        Some((first, rest)) => {
            let key = suffix4(first);
            rest.iter().any(|id| suffix4(id) != key)
        }
        None => false,
    })
}

/// Mention count per semantic group name, in first-seen order.
/// Ids no group recognizes are left out of the count.
pub fn concept_group_counts(
    catalog: &SemanticGroupCatalog,
    records: &[EntityRecord],
) -> IndexMap<String, usize> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for id in records.iter().flat_map(|r| r.ids.iter()) {
        match catalog.classify(id) {
            Ok(group) => *counts.entry(group.name.clone()).or_insert(0) += 1,
            Err(e) => debug!("Not counting concept: {e}"),
        }
    }
    counts
}

fn suffix4(id: &str) -> &str {
    let start = id.char_indices().rev().nth(3).map_or(0, |(i, _)| i);
    &id[start..]
}
