//! reflgen Parser - Declaration front-ends
//!
//! Turns a source file into the declaration tree the walker consumes.
//! Two front-ends are provided:
//! - [`HeaderParser`], a tolerant recursive descent parser for the
//!   declaration subset of C++ headers
//! - [`JsonTreeLoader`], for trees dumped as JSON by another tool
//!
//! Key parsing challenges:
//! - Function bodies, initializers and template arguments are skipped by
//!   balancing delimiters rather than parsed
//! - `struct X { ... }` must be told apart from `struct X* field;`
//! - A lone `NAME(...)` inside a class is a macro invocation, not a method

mod config;
mod error;
mod parser;
mod source;

pub use config::*;
pub use error::*;
pub use source::*;

use std::borrow::Cow;
use std::collections::BTreeMap;

use reflgen_ast::TranslationUnit;
use reflgen_lexer::{tokenize, TokenKind};

use parser::Parser;

/// Options for the header parser
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Abort on the first error instead of skipping the broken declaration
    pub fatal_errors: bool,
    /// Object-like macros substituted before parsing
    pub macros: BTreeMap<String, String>,
}

impl ParseOptions {
    pub fn from_config(config: &CompileConfig, fatal_errors: bool) -> Self {
        Self {
            fatal_errors,
            macros: config.macros(),
        }
    }
}

/// A parsed unit plus the errors the parser recovered from
#[derive(Debug)]
pub struct Parsed {
    pub unit: TranslationUnit,
    pub recovered: Vec<ParseError>,
}

#[derive(Debug, Clone, Default)]
pub struct HeaderParser {
    options: ParseOptions,
}

impl HeaderParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Substitute object-like macros at token level.
    ///
    /// Text between tokens (whitespace, comments, preprocessor lines) is
    /// kept as is. Replacement text is not rescanned.
    pub fn expand<'s>(&self, source: &'s str) -> Cow<'s, str> {
        if self.options.macros.is_empty() {
            return Cow::Borrowed(source);
        }

        let mut out = String::with_capacity(source.len());
        let mut last = 0;
        for token in tokenize(source) {
            if token.kind != TokenKind::Ident {
                continue;
            }
            if let Some(replacement) = self.options.macros.get(token.text(source)) {
                out.push_str(&source[last..token.span.start]);
                out.push_str(replacement);
                last = token.span.end;
            }
        }
        out.push_str(&source[last..]);
        Cow::Owned(out)
    }

    /// Parse already expanded source
    pub fn parse(&self, source: &str) -> Result<Parsed, ParseError> {
        let tokens = tokenize(source);
        let mut parser = Parser::new(source, tokens, self.options.fatal_errors);
        let unit = parser.parse_unit()?;
        Ok(Parsed {
            unit,
            recovered: parser.into_errors(),
        })
    }

    /// Expand macros and parse, discarding recovered errors
    pub fn parse_str(&self, source: &str) -> Result<TranslationUnit, ParseError> {
        let expanded = self.expand(source);
        Ok(self.parse(&expanded)?.unit)
    }
}
