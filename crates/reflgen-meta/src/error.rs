use thiserror::Error;

/// Annotation text that could not be read as metadata
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetaError {
    #[error("malformed metadata at offset {offset}: {reason}")]
    Malformed { reason: String, offset: usize },
}

impl MetaError {
    pub fn malformed(reason: impl Into<String>, offset: usize) -> Self {
        MetaError::Malformed {
            reason: reason.into(),
            offset,
        }
    }

    pub fn offset(&self) -> usize {
        match self {
            MetaError::Malformed { offset, .. } => *offset,
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("type '{name}' is already registered")]
    Duplicate { name: String },

    #[error("failed to load artifact: {0}")]
    Load(#[from] serde_json::Error),
}
