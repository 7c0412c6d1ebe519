//! Errors and diagnostics from walking a declaration tree

use reflgen_ast::Span;
use reflgen_meta::MetaError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum WalkError {
    /// E-WALK-001: Two reflected types share a qualified name (hard error)
    #[error("duplicate qualified name: {name}")]
    DuplicateQualifiedName {
        name: String,
        /// Span of the first declaration
        first: Span,
        /// Span of the conflicting declaration
        second: Span,
    },

    /// E-WALK-002: Annotation text could not be parsed (soft error)
    #[error("malformed metadata on {target}: {error}")]
    MalformedMetadata {
        /// Qualified type name, or `Type::member`
        target: String,
        error: MetaError,
        span: Span,
    },

    /// E-WALK-003: A later overload of a reflected method (soft error)
    #[error("overload of {owner}::{name} skipped; only the first declaration is reflected")]
    OverloadSkipped {
        owner: String,
        name: String,
        span: Span,
    },
}

impl WalkError {
    pub fn span(&self) -> Span {
        match self {
            WalkError::DuplicateQualifiedName { second, .. } => *second,
            WalkError::MalformedMetadata { span, .. } => *span,
            WalkError::OverloadSkipped { span, .. } => *span,
        }
    }

    /// Whether this error fails the run
    pub fn is_hard_error(&self) -> bool {
        match self {
            WalkError::DuplicateQualifiedName { .. } => true,
            WalkError::MalformedMetadata { .. } => false,
            WalkError::OverloadSkipped { .. } => false,
        }
    }

    /// Error code for machine-readable output
    pub fn code(&self) -> &'static str {
        match self {
            WalkError::DuplicateQualifiedName { .. } => "E-WALK-001",
            WalkError::MalformedMetadata { .. } => "E-WALK-002",
            WalkError::OverloadSkipped { .. } => "E-WALK-003",
        }
    }
}
