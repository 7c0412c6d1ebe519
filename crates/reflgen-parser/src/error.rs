//! Parser error types

use std::path::PathBuf;

use reflgen_ast::Span;
use reflgen_lexer::TokenKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected end of file")]
    UnexpectedEof { span: Span },

    #[error("unterminated {what}")]
    Unterminated { what: &'static str, span: Span },

    #[error("unmatched '}}'")]
    UnmatchedBrace { span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::UnexpectedEof { span } => *span,
            ParseError::Unterminated { span, .. } => *span,
            ParseError::UnmatchedBrace { span } => *span,
        }
    }

    pub fn unexpected(expected: impl Into<String>, found: TokenKind, span: Span) -> Self {
        if found == TokenKind::Eof {
            return ParseError::UnexpectedEof { span };
        }
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: found.describe().to_string(),
            span,
        }
    }
}

/// Failure to turn a file into a declaration tree
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `text` is the (macro-expanded) text the span points into
    #[error("{}: {error}", path.display())]
    Parse {
        path: PathBuf,
        text: String,
        #[source]
        error: ParseError,
    },

    #[error("invalid declaration tree in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<ParseError> for SourceError {
    fn from(error: ParseError) -> Self {
        SourceError::Parse {
            path: PathBuf::from("<input>"),
            text: String::new(),
            error,
        }
    }
}

/// Failure to read compilation settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read compilation database {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid compilation database {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no entry for {file} in compilation database")]
    NoEntry { file: String },
}
