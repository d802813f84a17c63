//! Per-term concept details for annotation popovers.
//!
//! Given the concept ids of one highlighted term and the id dictionary of the
//! annotation result, builds the group chips shown in the popover header and
//! the group -> preferred name -> external reference listing below it.

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use conceptmark_common::{ConceptInfo, EntityRecord, Result};

use crate::concept_tree::group_concept_ids;
use crate::groups::SemanticGroupCatalog;

pub const DEFAULT_REDIRECT_PREFIX: &str = "api/concept/redirect/";

// ── Links ────────────────────────────────────────────────────────────────────

/// Builds relative redirect links for external references.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    prefix: String,
}

impl Default for LinkBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_REDIRECT_PREFIX)
    }
}

impl LinkBuilder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn from_config(config: &conceptmark_common::LinksConfig) -> Self {
        Self::new(config.redirect_prefix.clone())
    }

    pub fn link(&self, reference: &str) -> String {
        format!("{}{}", self.prefix, reference)
    }
}

/// `api/concept/redirect/<reference>`.
pub fn ref_to_link(reference: &str) -> String {
    LinkBuilder::default().link(reference)
}

// ── Group chips ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConceptEntry {
    pub group: String,
    pub class: String,
    pub color: String,
    pub label: String,
    pub ids: Vec<String>,
}

/// Ids grouped by semantic group, in first-seen group order, with display metadata.
pub fn concept_entries<S: AsRef<str>>(
    catalog: &SemanticGroupCatalog,
    ids: &[S],
) -> Result<Vec<ConceptEntry>> {
    let mut entries: Vec<ConceptEntry> = Vec::new();
    for id in ids.iter().map(AsRef::as_ref) {
        let group = catalog.classify(id)?;
        match entries.iter_mut().find(|e| e.group == group.name) {
            Some(entry) => entry.ids.push(id.to_string()),
            None => entries.push(ConceptEntry {
                group: group.name.clone(),
                class: group.class.clone(),
                color: group.color.clone(),
                label: group.label.clone(),
                ids: vec![id.to_string()],
            }),
        }
    }
    Ok(entries)
}

// ── Reference listing ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Linkout {
    pub reference: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConceptLinkouts {
    pub id: String,
    pub name: String,
    pub linkouts: Vec<Linkout>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupDetails {
    pub group: String,
    pub class: String,
    pub concepts: Vec<ConceptLinkouts>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConceptDetails {
    pub groups: Vec<GroupDetails>,
    pub concept_count: usize,
    pub linkout_count: usize,
    /// Ids absent from the dictionary.
    pub missing: Vec<String>,
}

/// Groups sorted by name, concepts by preferred name (case-insensitive),
/// references alphabetically. Two ids with one preferred name keep the last.
pub fn concept_details<S: AsRef<str>>(
    catalog: &SemanticGroupCatalog,
    ids: &[S],
    dictionary: &IndexMap<String, ConceptInfo>,
    links: &LinkBuilder,
) -> Result<ConceptDetails> {
    let mut grouped = group_concept_ids(catalog, ids)?;
    grouped.sort_keys();

    let mut details = ConceptDetails::default();

    for (group_name, group_ids) in grouped {
        let mut by_name: IndexMap<&str, (&str, &ConceptInfo)> = IndexMap::new();
        for id in &group_ids {
            let Some(info) = dictionary.get(id) else {
                warn!("No preferred name or external references for {id:?}");
                details.missing.push(id.clone());
                continue;
            };
            if let Some((previous, _)) = by_name.insert(info.name.as_str(), (id.as_str(), info)) {
                debug!("Concept {previous:?} replaced by {id:?} for name {:?}", info.name);
            }
        }
        by_name.sort_by(|a, _, b, _| case_insensitive(a, b));

        let concepts: Vec<ConceptLinkouts> = by_name
            .into_iter()
            .map(|(name, (id, info))| {
                let mut refs = info.refs.clone();
                refs.sort();
                ConceptLinkouts {
                    id: id.to_string(),
                    name: name.to_string(),
                    linkouts: refs
                        .into_iter()
                        .map(|reference| Linkout { href: links.link(&reference), reference })
                        .collect(),
                }
            })
            .collect();

        if concepts.is_empty() {
            continue;
        }

        details.concept_count += concepts.len();
        details.linkout_count += concepts.iter().map(|c| c.linkouts.len()).sum::<usize>();

        let class = catalog
            .by_name(&group_name)
            .map(|g| g.class.clone())
            .unwrap_or_default();
        details.groups.push(GroupDetails { group: group_name, class, concepts });
    }

    Ok(details)
}

fn case_insensitive(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

// ── Term positions ───────────────────────────────────────────────────────────

/// Lower-cased term -> offsets of all its mentions, for occurrence counts.
pub fn term_positions(records: &[EntityRecord]) -> IndexMap<String, Vec<usize>> {
    let mut positions: IndexMap<String, Vec<usize>> = IndexMap::new();
    for record in records {
        positions.entry(record.term.to_lowercase()).or_default().push(record.offset);
    }
    positions
}

/// Number of mentions of `term`, ignoring case.
pub fn occurrence_count(positions: &IndexMap<String, Vec<usize>>, term: &str) -> usize {
    positions.get(&term.to_lowercase()).map_or(0, Vec::len)
}
