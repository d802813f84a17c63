//! conceptmark-common — Shared types, errors and configuration used across all conceptmark crates.

pub mod error;
pub mod entities;
pub mod config;

// Re-export commonly used types
pub use error::{ConceptmarkError, Result};
pub use entities::{
    AnnotationDocument, AnnotationResult, ConceptInfo, EntityRecord, PublicationDocument, NO_REFERENCE_ID,
};
pub use config::{Config, GroupsConfig, LinksConfig, RenderConfig};
