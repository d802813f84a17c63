//! One-call views over an annotation result.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use conceptmark_common::{AnnotationDocument, EntityRecord, PublicationDocument, Result};

use crate::concept_tree::{build_concept_tree, ConceptTree};
use crate::detector::{concept_group_counts, has_ambiguous_concepts};
use crate::details::term_positions;
use crate::entity_map::EntityMap;
use crate::groups::SemanticGroupCatalog;
use crate::overlay::OverlayRenderer;

/// Navigation and control data derived from every mention of a result.
#[derive(Debug, Clone, Serialize)]
pub struct ConceptSummary {
    pub concept_tree: ConceptTree,
    pub group_counts: IndexMap<String, usize>,
    pub has_ambiguous_concepts: bool,
    pub term_positions: IndexMap<String, Vec<usize>>,
}

impl ConceptSummary {
    pub fn new(catalog: &SemanticGroupCatalog, records: &[EntityRecord]) -> Self {
        Self {
            concept_tree: build_concept_tree(catalog, records),
            group_counts: concept_group_counts(catalog, records),
            has_ambiguous_concepts: has_ambiguous_concepts(records),
            term_positions: term_positions(records),
        }
    }
}

/// Everything the display surface derives from a plain text result.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedDocument {
    pub markup: String,
    #[serde(flatten)]
    pub summary: ConceptSummary,
}

/// Everything the display surface derives from a publication result.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedPublication {
    pub pmid: String,
    pub title_markup: String,
    /// `None` when the publication has no abstract.
    pub abstract_markup: Option<String>,
    pub authors: Vec<String>,
    pub journal: Option<String>,
    pub pubdate: Option<String>,
    pub doi: Option<String>,
    #[serde(flatten)]
    pub summary: ConceptSummary,
}

/// Parse the entities once and derive markup, tree and summaries from them.
pub fn annotate(catalog: &SemanticGroupCatalog, doc: &AnnotationDocument) -> Result<AnnotatedDocument> {
    let records = doc.records()?;
    let markup = render_field(catalog, &doc.text, &records)?;
    let summary = ConceptSummary::new(catalog, &records);
    log_summary(records.len(), &summary);

    Ok(AnnotatedDocument { markup, summary })
}

/// Render title and abstract each against its own entities; summarise over
/// both lists merged.
pub fn annotate_publication(
    catalog: &SemanticGroupCatalog,
    publication: &PublicationDocument,
) -> Result<AnnotatedPublication> {
    let title_markup = render_field(catalog, &publication.title, &publication.title_records()?)?;
    let abstract_markup = match &publication.abstract_text {
        Some(text) => Some(render_field(catalog, text, &publication.abstract_records()?)?),
        None => None,
    };

    let records = publication.records()?;
    let summary = ConceptSummary::new(catalog, &records);
    debug!(pmid = %publication.pmid, "publication annotated");
    log_summary(records.len(), &summary);

    Ok(AnnotatedPublication {
        pmid: publication.pmid.clone(),
        title_markup,
        abstract_markup,
        authors: publication.authors.clone(),
        journal: publication.journal.clone(),
        pubdate: publication.pubdate.clone(),
        doi: publication.doi.clone(),
        summary,
    })
}

fn render_field(catalog: &SemanticGroupCatalog, text: &str, records: &[EntityRecord]) -> Result<String> {
    let map = EntityMap::build(records);
    debug!(mentions = records.len(), offsets = map.len(), "entity map built");
    OverlayRenderer::new(catalog).render_map(text, &map)
}

fn log_summary(mentions: usize, summary: &ConceptSummary) {
    info!(
        "Annotated {} mentions: {} groups, {} distinct terms, ambiguous={}",
        mentions,
        summary.group_counts.len(),
        summary.concept_tree.term_count(),
        summary.has_ambiguous_concepts
    );
}
