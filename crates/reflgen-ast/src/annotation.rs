//! Raw annotation text attached to declarations
//!
//! The tree keeps annotations verbatim. Turning them into key/value
//! metadata is the job of `reflgen-meta`.

use serde::{Deserialize, Serialize};

use crate::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    /// Contents of a `[[ ... ]]` attribute block
    Attribute,
    /// Consecutive `///` comment lines, markers stripped
    DocComment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub text: String,
    #[serde(default)]
    pub span: Span,
}

impl Annotation {
    pub fn attribute(text: impl Into<String>, span: Span) -> Self {
        Self {
            kind: AnnotationKind::Attribute,
            text: text.into(),
            span,
        }
    }

    pub fn doc(text: impl Into<String>, span: Span) -> Self {
        Self {
            kind: AnnotationKind::DocComment,
            text: text.into(),
            span,
        }
    }

    /// Whether this annotation marks its declaration for reflection.
    ///
    /// Any attribute block counts. A doc comment only counts when one of its
    /// lines is an `@tag`; plain prose does not.
    pub fn is_marker(&self) -> bool {
        match self.kind {
            AnnotationKind::Attribute => true,
            AnnotationKind::DocComment => self
                .text
                .lines()
                .any(|line| line.trim_start().starts_with('@')),
        }
    }
}

/// True when any annotation in the list marks the declaration
pub fn has_marker(annotations: &[Annotation]) -> bool {
    annotations.iter().any(Annotation::is_marker)
}
