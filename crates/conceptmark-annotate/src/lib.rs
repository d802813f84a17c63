//! conceptmark-annotate — Highlighted rendering of biomedical concept annotations.
//!
//! Takes the text and `term|ids|offset` mentions returned by a concept
//! recognition service and derives:
//!   - HTML markup with every mention wrapped and color-coded by semantic group,
//!     for plain text and for publication titles and abstracts
//!   - a group -> term -> concept id tree for navigation
//!   - ambiguity and group-presence summaries for the highlight controls
//!   - per-term popover details with external reference links

pub mod concept_tree;
pub mod controls;
pub mod details;
pub mod detector;
pub mod document;
pub mod entity_map;
pub mod groups;
pub mod markup;
pub mod overlay;

pub use concept_tree::{build_concept_tree, build_concept_tree_with, group_concept_ids, ConceptTree};
pub use controls::{GroupToggle, HighlightControls};
pub use details::{concept_details, concept_entries, ref_to_link, term_positions, LinkBuilder};
pub use detector::{concept_group_counts, has_ambiguous_concepts};
pub use document::{annotate, annotate_publication, AnnotatedDocument, AnnotatedPublication, ConceptSummary};
pub use entity_map::{build_entity_map, EntityMap, MapEntry};
pub use groups::{ClassList, SemanticGroup, SemanticGroupCatalog, AMBIGUOUS_ID};
pub use overlay::{render, OverlayRenderer};
