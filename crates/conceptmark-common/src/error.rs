use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConceptmarkError {
    #[error("Unrecognized concept id: {0}")]
    UnrecognizedConcept(String),

    #[error("Malformed entity record {record:?}: {reason}")]
    MalformedEntityRecord { record: String, reason: String },

    #[error("No concept groups selected")]
    NoGroupsSelected,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ConceptmarkError {
    pub(crate) fn malformed(record: &str, reason: impl Into<String>) -> Self {
        ConceptmarkError::MalformedEntityRecord {
            record: record.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConceptmarkError>;
