//! Semantic group catalog and concept id classification.
//!
//! A concept id ends with a four-letter group key (`DOID:1234:DISO`). The
//! catalog maps that key to the display metadata of its biomedical category.
//! It is built once per session and never mutated afterwards.

use std::fmt;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use conceptmark_common::{ConceptmarkError, Result};

/// Id of the synthetic pseudo-group used for toggling ambiguous mentions.
pub const AMBIGUOUS_ID: &str = "AMBIGUOUS";

/// Number of distinct color tokens (`color0` .. `color10`).
const COLOR_COUNT: usize = 11;

/// Built-in categories: (id, name, css class).
const BUILTIN_GROUPS: &[(&str, &str, &str)] = &[
    ("SPEC", "Species", "species"),
    ("ANAT", "Anatomy", "anatomy"),
    ("DISO", "Disorders", "disorder"),
    ("PATH", "Pathways", "pathway"),
    ("CHED", "Chemicals", "chemical"),
    ("ENZY", "Enzymes", "enzyme"),
    ("MRNA", "miRNA", "mrna"),
    ("PRGE", "Genes and Proteins", "gene-protein"),
    ("COMP", "Cellular Components", "component"),
    ("FUNC", "Molecular Functions", "function"),
    ("PROC", "Biological Processes", "process"),
];

// ── Semantic group ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SemanticGroup {
    pub id: String,
    pub name: String,
    /// CSS class tag, e.g. `disorder`.
    pub class: String,
    /// Color token, e.g. `color2`.
    pub color: String,
    pub label: String,
    #[serde(skip)]
    pattern: Option<Regex>,
}

impl SemanticGroup {
    fn new(id: &str, name: &str, class: &str, color: String, label: &str) -> Result<Self> {
        if id.is_empty() || id.contains(':') {
            return Err(ConceptmarkError::Config(format!("invalid group id {id:?}")));
        }
        let pattern = Regex::new(&format!(":{}$", regex::escape(id)))
            .map_err(|e| ConceptmarkError::Config(e.to_string()))?;

        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            class: class.to_string(),
            color,
            label: label.to_string(),
            pattern: Some(pattern),
        })
    }

    fn ambiguous() -> Self {
        Self {
            id: AMBIGUOUS_ID.to_string(),
            name: "Ambiguous".to_string(),
            class: "ambiguous".to_string(),
            color: "ambiguous".to_string(),
            label: "Ambiguous".to_string(),
            pattern: None,
        }
    }

    /// Does this group claim the concept id? The ambiguous pseudo-group never does.
    pub fn matches(&self, concept_id: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(concept_id))
    }
}

// ── Class list ───────────────────────────────────────────────────────────────

/// Result of classifying the ids of one mention.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList {
    classes: Vec<String>,
    ambiguous: bool,
}

impl ClassList {
    /// Distinct group classes in first-seen order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn is_ambiguous(&self) -> bool {
        self.ambiguous
    }

    /// Space-joined class attribute value, with `ambiguous` appended when needed.
    pub fn css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ClassList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.classes.join(" "))?;
        if self.ambiguous {
            f.write_str(" ambiguous")?;
        }
        Ok(())
    }
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SemanticGroupCatalog {
    groups: Vec<SemanticGroup>,
    ambiguous: SemanticGroup,
}

impl Default for SemanticGroupCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SemanticGroupCatalog {
    /// The eleven standard biomedical categories.
    pub fn builtin() -> Self {
        let groups = BUILTIN_GROUPS
            .iter()
            .enumerate()
            .map(|(i, (id, name, class))| {
                SemanticGroup::new(id, name, class, color_token(i), name)
                    .expect("built-in group ids are valid")
            })
            .collect();

        Self { groups, ambiguous: SemanticGroup::ambiguous() }
    }

    /// Build from the service's ordered `group id -> normalized label` list.
    ///
    /// Known ids keep their built-in name and class; unknown ids use the group
    /// id verbatim as both name and class.
    pub fn from_service(groups: &IndexMap<String, String>) -> Result<Self> {
        if groups.is_empty() {
            return Err(ConceptmarkError::Config("service offers no semantic groups".to_string()));
        }

        let groups = groups
            .iter()
            .enumerate()
            .map(|(i, (id, label))| {
                let (name, class) = BUILTIN_GROUPS
                    .iter()
                    .find(|(builtin, _, _)| *builtin == id.as_str())
                    .map(|(_, name, class)| (name.to_string(), class.to_string()))
                    .unwrap_or_else(|| (id.clone(), id.clone()));
                SemanticGroup::new(id, &name, &class, color_token(i), label)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { groups, ambiguous: SemanticGroup::ambiguous() })
    }

    pub fn from_config(config: &conceptmark_common::GroupsConfig) -> Result<Self> {
        match &config.service {
            Some(service) => Self::from_service(service),
            None => Ok(Self::builtin()),
        }
    }

    /// Catalog groups in display order, without the ambiguous pseudo-group.
    pub fn groups(&self) -> &[SemanticGroup] {
        &self.groups
    }

    pub fn ambiguous(&self) -> &SemanticGroup {
        &self.ambiguous
    }

    pub fn by_id(&self, id: &str) -> Option<&SemanticGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn by_name(&self, name: &str) -> Option<&SemanticGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Resolve a concept id to its group. First catalog match wins.
    pub fn classify(&self, concept_id: &str) -> Result<&SemanticGroup> {
        self.groups
            .iter()
            .find(|g| g.matches(concept_id))
            .ok_or_else(|| ConceptmarkError::UnrecognizedConcept(concept_id.to_string()))
    }

    /// Classify all ids of a mention; two or more distinct groups make it ambiguous.
    pub fn classify_many<S: AsRef<str>>(&self, concept_ids: &[S]) -> Result<ClassList> {
        let mut classes: Vec<String> = Vec::new();
        for id in concept_ids {
            let class = &self.classify(id.as_ref())?.class;
            if !classes.contains(class) {
                classes.push(class.clone());
            }
        }

        let ambiguous = classes.len() > 1;
        Ok(ClassList { classes, ambiguous })
    }

    /// Color token for a single class tag; empty for multi-class or unknown tags.
    pub fn color_for(&self, class_tag: &str) -> &str {
        self.single_class(class_tag).map_or("", |g| g.color.as_str())
    }

    /// Normalized label for a single class tag; empty for multi-class or unknown tags.
    pub fn normalized_label_for(&self, class_tag: &str) -> &str {
        self.single_class(class_tag).map_or("", |g| g.label.as_str())
    }

    fn single_class(&self, class_tag: &str) -> Option<&SemanticGroup> {
        let mut tags = class_tag.split_whitespace();
        let tag = tags.next()?;
        if tags.next().is_some() {
            return None;
        }
        self.groups.iter().find(|g| g.class == tag)
    }
}

fn color_token(index: usize) -> String {
    format!("color{}", index % COLOR_COUNT)
}
