/// Annotation result types as returned by the remote concept recognition service.
/// Entities travel as `term|id1;id2|offset` strings; these are the parsed forms.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ConceptmarkError, Result};

/// Concept id used for gene/protein mentions with no normalized reference.
pub const NO_REFERENCE_ID: &str = ":::PRGE";

// ---------------------------------------------------------------------------
// Entity record
// ---------------------------------------------------------------------------

/// One recognized mention: surface term, concept ids and character offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub term: String,
    pub ids: Vec<String>,
    /// Offset in UTF-16 code units into the trimmed source text.
    pub offset: usize,
}

impl EntityRecord {
    pub fn new(term: impl Into<String>, ids: Vec<String>, offset: usize) -> Self {
        Self { term: term.into(), ids, offset }
    }

    /// Term length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.term.encode_utf16().count()
    }

    pub fn is_empty(&self) -> bool {
        self.term.is_empty()
    }

    /// Serialize back to the wire form.
    pub fn to_wire(&self) -> String {
        format!("{}|{}|{}", self.term, self.ids.join(";"), self.offset)
    }
}

impl FromStr for EntityRecord {
    type Err = ConceptmarkError;

    fn from_str(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split('|').collect();
        if parts.len() != 3 {
            return Err(ConceptmarkError::malformed(
                raw,
                format!("expected 3 '|'-separated fields, found {}", parts.len()),
            ));
        }

        let term = parts[0];
        if term.is_empty() {
            return Err(ConceptmarkError::malformed(raw, "empty term"));
        }

        let ids: Vec<String> = parts[1]
            .split(';')
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        if ids.is_empty() {
            return Err(ConceptmarkError::malformed(raw, "no concept ids"));
        }

        let offset = parts[2]
            .trim()
            .parse::<usize>()
            .map_err(|e| ConceptmarkError::malformed(raw, format!("bad offset: {e}")))?;

        Ok(EntityRecord { term: term.to_string(), ids, offset })
    }
}

/// Parse every wire record, failing on the first malformed one.
pub fn parse_entities<S: AsRef<str>>(entities: &[S]) -> Result<Vec<EntityRecord>> {
    entities.iter().map(|e| e.as_ref().parse()).collect()
}

/// Semantic group key of a concept id: its last colon-delimited segment.
pub fn group_suffix(concept_id: &str) -> &str {
    concept_id.rsplit(':').next().unwrap_or(concept_id)
}

// ---------------------------------------------------------------------------
// Annotation document
// ---------------------------------------------------------------------------

/// Preferred name and external references for a concept id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptInfo {
    pub name: String,
    #[serde(default)]
    pub refs: Vec<String>,
}

/// A decoded annotation result: source text, wire entities and the id dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationDocument {
    pub text: String,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub ids: IndexMap<String, ConceptInfo>,
}

impl AnnotationDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn records(&self) -> Result<Vec<EntityRecord>> {
        parse_entities(&self.entities)
    }
}

/// A decoded PubMed publication result. Title and abstract are annotated
/// separately; each entity list holds offsets into its own field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublicationDocument {
    #[serde(deserialize_with = "string_or_number")]
    pub pmid: String,
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub entities_title: Vec<String>,
    #[serde(default)]
    pub entities_abstract: Option<Vec<String>>,
    #[serde(default)]
    pub ids: IndexMap<String, ConceptInfo>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default)]
    pub pubdate: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
}

impl PublicationDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn title_records(&self) -> Result<Vec<EntityRecord>> {
        parse_entities(&self.entities_title)
    }

    pub fn abstract_records(&self) -> Result<Vec<EntityRecord>> {
        parse_entities(self.entities_abstract.as_deref().unwrap_or_default())
    }

    /// Title and abstract entities as one list, first occurrence kept for
    /// wire records appearing more than once.
    pub fn entities(&self) -> Vec<&str> {
        let abstract_entities = self.entities_abstract.iter().flatten();
        let mut seen = std::collections::HashSet::new();
        self.entities_title
            .iter()
            .chain(abstract_entities)
            .map(String::as_str)
            .filter(|e| seen.insert(*e))
            .collect()
    }

    /// Records of [`PublicationDocument::entities`], for summaries over the
    /// whole publication.
    pub fn records(&self) -> Result<Vec<EntityRecord>> {
        parse_entities(&self.entities())
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Pmid {
        Text(String),
        Number(u64),
    }

    Ok(match Pmid::deserialize(deserializer)? {
        Pmid::Text(text) => text,
        Pmid::Number(number) => number.to_string(),
    })
}

/// Either kind of annotation result, told apart by its fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationResult {
    Publication(PublicationDocument),
    Text(AnnotationDocument),
}

impl AnnotationResult {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Every mention of the result; for publications, title and abstract merged.
    pub fn records(&self) -> Result<Vec<EntityRecord>> {
        match self {
            AnnotationResult::Publication(publication) => publication.records(),
            AnnotationResult::Text(document) => document.records(),
        }
    }

    pub fn ids(&self) -> &IndexMap<String, ConceptInfo> {
        match self {
            AnnotationResult::Publication(publication) => &publication.ids,
            AnnotationResult::Text(document) => &document.ids,
        }
    }
}
