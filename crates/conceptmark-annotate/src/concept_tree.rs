//! Concept tree: semantic group -> term -> concept ids.
//!
//! Feeds the navigable concept side panel. Groups and terms keep first-seen
//! order; case variants of a term within a group collapse to the first seen.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::warn;

use conceptmark_common::{EntityRecord, Result, NO_REFERENCE_ID};

use crate::groups::SemanticGroupCatalog;

pub type TermConcepts = IndexMap<String, IndexSet<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConceptTree {
    groups: IndexMap<String, TermConcepts>,
    /// Concept ids no catalog group recognized, in first-seen order.
    unrecognized: IndexSet<String>,
}

impl ConceptTree {
    pub fn groups(&self) -> &IndexMap<String, TermConcepts> {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&TermConcepts> {
        self.groups.get(name)
    }

    pub fn unrecognized(&self) -> &IndexSet<String> {
        &self.unrecognized
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Distinct terms across all groups.
    pub fn term_count(&self) -> usize {
        self.groups.values().map(IndexMap::len).sum()
    }
}

/// Group every mention's ids by semantic group and term.
///
/// Unrecognized ids are skipped and reported in [`ConceptTree::unrecognized`];
/// they never abort the build.
pub fn build_concept_tree(catalog: &SemanticGroupCatalog, records: &[EntityRecord]) -> ConceptTree {
    build_concept_tree_with(catalog, records, |_| {})
}

/// Like [`build_concept_tree`], also calling `on_unrecognized` for every id
/// occurrence that fails classification.
pub fn build_concept_tree_with<F>(
    catalog: &SemanticGroupCatalog,
    records: &[EntityRecord],
    mut on_unrecognized: F,
) -> ConceptTree
where
    F: FnMut(&str),
{
    let mut tree = ConceptTree::default();

    for record in records {
        for id in &record.ids {
            let group = match catalog.classify(id) {
                Ok(group) => group,
                Err(e) => {
                    warn!("Skipping concept in tree: {e}");
                    on_unrecognized(id);
                    tree.unrecognized.insert(id.clone());
                    continue;
                }
            };

            tree.groups
                .entry(group.name.clone())
                .or_default()
                .entry(record.term.clone())
                .or_default()
                .insert(id.clone());
        }
    }

    // Case-duplicate terms: first seen wins, later variants are dropped.
    for terms in tree.groups.values_mut() {
        let mut seen = HashSet::new();
        terms.retain(|term, _| seen.insert(term.to_lowercase()));
    }

    tree
}

/// Group a flat id list by semantic group name, skipping the no-reference sentinel.
pub fn group_concept_ids<S: AsRef<str>>(
    catalog: &SemanticGroupCatalog,
    ids: &[S],
) -> Result<IndexMap<String, Vec<String>>> {
    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
    for id in ids.iter().map(AsRef::as_ref) {
        if id == NO_REFERENCE_ID {
            continue;
        }
        let group = catalog.classify(id)?;
        groups.entry(group.name.clone()).or_default().push(id.to_string());
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conceptmark_common::entities::parse_entities;

    fn tree(entities: &[&str]) -> ConceptTree {
        build_concept_tree(&SemanticGroupCatalog::builtin(), &parse_entities(entities).unwrap())
    }

    #[test]
    fn test_case_duplicates_collapse_to_first_seen() {
        let tree = tree(&["Insulin|A:1:CHED|0", "insulin|A:1:CHED|20"]);
        let chemicals = tree.group("Chemicals").unwrap();
        assert_eq!(chemicals.len(), 1);
        assert!(chemicals.contains_key("Insulin"));
    }

    #[test]
    fn test_case_duplicate_is_dropped_not_merged() {
        let tree = tree(&["Insulin|A:1:CHED|0", "INSULIN|A:2:CHED|20"]);
        let ids = &tree.group("Chemicals").unwrap()["Insulin"];
        assert_eq!(ids.iter().collect::<Vec<_>>(), vec!["A:1:CHED"]);
    }

    #[test]
    fn test_ids_deduplicated_per_term() {
        let tree = tree(&["BRCA1|G:1:PRGE|0", "BRCA1|G:1:PRGE;G:2:PRGE|40"]);
        let ids = &tree.group("Genes and Proteins").unwrap()["BRCA1"];
        assert_eq!(ids.iter().collect::<Vec<_>>(), vec!["G:1:PRGE", "G:2:PRGE"]);
    }

    #[test]
    fn test_ambiguous_mention_appears_in_each_group() {
        let tree = tree(&["cold|D:1:DISO;P:1:PROC|0"]);
        assert!(tree.group("Disorders").unwrap().contains_key("cold"));
        assert!(tree.group("Biological Processes").unwrap().contains_key("cold"));
        assert_eq!(tree.term_count(), 2);
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let tree = tree(&["p53|G:1:PRGE|0", "cancer|D:1:DISO|10", "mouse|S:1:SPEC|20"]);
        let names: Vec<_> = tree.groups().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Genes and Proteins", "Disorders", "Species"]);
    }

    #[test]
    fn test_unrecognized_ids_are_reported_not_fatal() {
        let mut reported = Vec::new();
        let records = parse_entities(&["x|X:1:NOPE;D:1:DISO|0", "y|X:1:NOPE|5"]).unwrap();
        let tree = build_concept_tree_with(&SemanticGroupCatalog::builtin(), &records, |id| {
            reported.push(id.to_string())
        });
        assert_eq!(reported, vec!["X:1:NOPE", "X:1:NOPE"]);
        assert_eq!(tree.unrecognized().len(), 1);
        assert!(tree.group("Disorders").unwrap().contains_key("x"));
    }

    #[test]
    fn test_sentinel_is_kept_in_tree() {
        let tree = tree(&["HER2|:::PRGE|0"]);
        assert!(tree.group("Genes and Proteins").unwrap()["HER2"].contains(":::PRGE"));
    }

    #[test]
    fn test_group_concept_ids_skips_sentinel() {
        let catalog = SemanticGroupCatalog::builtin();
        let groups = group_concept_ids(&catalog, &[":::PRGE", "G:1:PRGE", "D:1:DISO"]).unwrap();
        assert_eq!(groups["Genes and Proteins"], vec!["G:1:PRGE"]);
        assert_eq!(groups["Disorders"], vec!["D:1:DISO"]);

        let only_sentinel = group_concept_ids(&catalog, &[":::PRGE"]).unwrap();
        assert!(only_sentinel.is_empty());
    }

    #[test]
    fn test_group_concept_ids_propagates_unrecognized() {
        let catalog = SemanticGroupCatalog::builtin();
        assert!(group_concept_ids(&catalog, &["X:1:NOPE"]).is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(tree(&[]).is_empty());
    }
}
