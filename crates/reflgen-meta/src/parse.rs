//! Annotation text to metadata pieces
//!
//! Attribute text is a comma separated list of items:
//!
//! ```text
//! refl                          -> (refl, null)
//! meta("Some text\n")           -> (meta, Some text<newline>)
//! range(0, 100)                 -> (range, 0, 100)
//! {"doc": "x", "min": 0}        -> (doc, x), (min, 0)
//! meta({"doc": "x"})            -> (doc, x)
//! ```
//!
//! Doc comment text contributes one piece per `@key rest` line.

use reflgen_ast::{Annotation, AnnotationKind};
use reflgen_lexer::{tokenize_meta, MetaToken, MetaTokenKind};

use crate::{MetaError, MetaPiece, NULL_VALUE};

/// Parse one raw annotation into ordered pieces
pub fn parse_annotation(annotation: &Annotation) -> Result<Vec<MetaPiece>, MetaError> {
    match annotation.kind {
        AnnotationKind::Attribute => parse_attribute_text(&annotation.text),
        AnnotationKind::DocComment => Ok(parse_doc_text(&annotation.text)),
    }
}

/// Parse the contents of an attribute block
pub fn parse_attribute_text(text: &str) -> Result<Vec<MetaPiece>, MetaError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == NULL_VALUE {
        return Ok(Vec::new());
    }

    let mut parser = MetaParser::new(text);
    parser.parse_items()
}

/// Collect `@key rest` lines; other lines are prose
pub fn parse_doc_text(text: &str) -> Vec<MetaPiece> {
    let mut pieces = Vec::new();

    for line in text.lines() {
        let Some(tag) = line.trim().strip_prefix('@') else {
            continue;
        };
        let (key, rest) = match tag.split_once(char::is_whitespace) {
            Some((key, rest)) => (key, rest.trim()),
            None => (tag, ""),
        };
        if key.is_empty() {
            continue;
        }
        if rest.is_empty() {
            pieces.push(MetaPiece::marker(key));
        } else {
            pieces.push(MetaPiece::new(key, rest));
        }
    }

    pieces
}

struct MetaParser<'a> {
    text: &'a str,
    tokens: Vec<MetaToken>,
    pos: usize,
}

impl<'a> MetaParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            tokens: tokenize_meta(text),
            pos: 0,
        }
    }

    fn peek(&self) -> MetaTokenKind {
        self.peek_ahead(0)
    }

    fn peek_ahead(&self, n: usize) -> MetaTokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(MetaTokenKind::Eof)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.span.start)
            .unwrap_or(self.text.len())
    }

    fn advance(&mut self) -> Option<MetaToken> {
        let token = self.tokens.get(self.pos).cloned();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: MetaTokenKind) -> bool {
        self.peek() == kind
    }

    fn unexpected(&self, expected: &str) -> MetaError {
        let found = self.peek();
        let reason = if found == MetaTokenKind::Error {
            "invalid character or unterminated string".to_string()
        } else {
            format!("expected {}, found {}", expected, found.describe())
        };
        MetaError::malformed(reason, self.offset())
    }

    fn consume(&mut self, kind: MetaTokenKind) -> Result<MetaToken, MetaError> {
        if self.at(kind) {
            self.advance()
                .ok_or_else(|| MetaError::malformed("unexpected end of annotation", self.text.len()))
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    fn token_text(&self, token: &MetaToken) -> &'a str {
        token.text(self.text)
    }

    fn parse_items(&mut self) -> Result<Vec<MetaPiece>, MetaError> {
        let mut pieces = Vec::new();

        while !self.at(MetaTokenKind::Eof) {
            self.parse_item(&mut pieces)?;
            match self.peek() {
                MetaTokenKind::Comma => {
                    self.advance();
                }
                MetaTokenKind::Eof => break,
                _ => return Err(self.unexpected("','")),
            }
        }

        Ok(pieces)
    }

    fn parse_item(&mut self, pieces: &mut Vec<MetaPiece>) -> Result<(), MetaError> {
        match self.peek() {
            MetaTokenKind::LBrace => self.parse_object(pieces),
            MetaTokenKind::Ident | MetaTokenKind::ColonColon => {
                let key = self.parse_key()?;
                if !self.at(MetaTokenKind::LParen) {
                    pieces.push(MetaPiece::marker(key));
                    return Ok(());
                }

                let open = self.consume(MetaTokenKind::LParen)?;
                if self.at(MetaTokenKind::LBrace) {
                    // `key({...})` splices the object entries
                    self.parse_object(pieces)?;
                    self.consume(MetaTokenKind::RParen)?;
                } else if self.at(MetaTokenKind::String) && self.peek_ahead(1) == MetaTokenKind::RParen {
                    let literal = self.consume(MetaTokenKind::String)?;
                    let value = unescape(self.token_text(&literal));
                    self.consume(MetaTokenKind::RParen)?;
                    pieces.push(MetaPiece::new(key, value));
                } else {
                    let close = self.skip_to_close(&open)?;
                    let value = self.text[open.span.end..close].trim();
                    pieces.push(MetaPiece::new(key, value));
                }
                Ok(())
            }
            _ => Err(self.unexpected("metadata key")),
        }
    }

    /// `name`, `ns::name` or `::ns::name`
    fn parse_key(&mut self) -> Result<String, MetaError> {
        let mut key = String::new();
        if self.at(MetaTokenKind::ColonColon) {
            self.advance();
            key.push_str("::");
        }
        loop {
            let ident = self.consume(MetaTokenKind::Ident)?;
            key.push_str(self.token_text(&ident));
            if self.at(MetaTokenKind::ColonColon) && self.peek_ahead(1) == MetaTokenKind::Ident {
                self.advance();
                key.push_str("::");
            } else {
                return Ok(key);
            }
        }
    }

    /// Skip a raw argument list; returns the offset of the closing `)`
    fn skip_to_close(&mut self, open: &MetaToken) -> Result<usize, MetaError> {
        let mut stack = vec![MetaTokenKind::RParen];

        loop {
            let kind = self.peek();
            match kind {
                MetaTokenKind::Eof => {
                    return Err(MetaError::malformed("unterminated '('", open.span.start));
                }
                MetaTokenKind::Error => return Err(self.unexpected("argument")),
                MetaTokenKind::LParen => stack.push(MetaTokenKind::RParen),
                MetaTokenKind::LBrace => stack.push(MetaTokenKind::RBrace),
                MetaTokenKind::LBracket => stack.push(MetaTokenKind::RBracket),
                MetaTokenKind::RParen | MetaTokenKind::RBrace | MetaTokenKind::RBracket => {
                    if stack.pop() != Some(kind) {
                        return Err(MetaError::malformed(
                            format!("unbalanced {}", kind.describe()),
                            self.offset(),
                        ));
                    }
                    if stack.is_empty() {
                        let close = self.offset();
                        self.advance();
                        return Ok(close);
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// `{ "key": value, ... }`; an empty object adds nothing
    fn parse_object(&mut self, pieces: &mut Vec<MetaPiece>) -> Result<(), MetaError> {
        self.consume(MetaTokenKind::LBrace)?;

        while !self.at(MetaTokenKind::RBrace) {
            let key = match self.peek() {
                MetaTokenKind::String => {
                    let token = self.consume(MetaTokenKind::String)?;
                    unescape(self.token_text(&token))
                }
                MetaTokenKind::Ident => {
                    let token = self.consume(MetaTokenKind::Ident)?;
                    self.token_text(&token).to_string()
                }
                _ => return Err(self.unexpected("object key")),
            };
            if !self.at(MetaTokenKind::Colon) && !self.at(MetaTokenKind::Eq) {
                return Err(self.unexpected("':'"));
            }
            self.advance();

            let value = self.parse_value()?;
            pieces.push(MetaPiece::new(key, value));

            if self.at(MetaTokenKind::Comma) {
                self.advance();
            } else if !self.at(MetaTokenKind::RBrace) {
                return Err(self.unexpected("',' or '}'"));
            }
        }

        self.consume(MetaTokenKind::RBrace)?;
        Ok(())
    }

    fn parse_value(&mut self) -> Result<String, MetaError> {
        match self.peek() {
            MetaTokenKind::String => {
                let token = self.consume(MetaTokenKind::String)?;
                Ok(unescape(self.token_text(&token)))
            }
            MetaTokenKind::Number | MetaTokenKind::Ident => {
                let kind = self.peek();
                let token = self.consume(kind)?;
                Ok(self.token_text(&token).to_string())
            }
            MetaTokenKind::LBrace | MetaTokenKind::LBracket => {
                // Nested values are kept as raw text
                let start = self.offset();
                let open = self.advance().ok_or_else(|| self.unexpected("value"))?;
                let end = self.skip_nested(&open)?;
                Ok(self.text[start..end].to_string())
            }
            _ => Err(self.unexpected("value")),
        }
    }

    /// Skip past the group opened by `open`; returns the offset after its close
    fn skip_nested(&mut self, open: &MetaToken) -> Result<usize, MetaError> {
        let mut depth = 1usize;
        loop {
            match self.peek() {
                MetaTokenKind::Eof => {
                    return Err(MetaError::malformed(
                        format!("unterminated {}", open.kind.describe()),
                        open.span.start,
                    ));
                }
                MetaTokenKind::Error => return Err(self.unexpected("value")),
                MetaTokenKind::LBrace | MetaTokenKind::LBracket | MetaTokenKind::LParen => depth += 1,
                MetaTokenKind::RBrace | MetaTokenKind::RBracket | MetaTokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        let token = self.advance().ok_or_else(|| self.unexpected("value"))?;
                        return Ok(token.span.end);
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }
}

/// Decode a C string literal, quotes included
pub fn unescape(literal: &str) -> String {
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') if !chars.peek().is_some_and(|c| c.is_digit(8)) => out.push('\0'),
            Some('a') => out.push('\u{07}'),
            Some('b') => out.push('\u{08}'),
            Some('f') => out.push('\u{0C}'),
            Some('v') => out.push('\u{0B}'),
            Some('x') => {
                let mut code = 0u32;
                let mut digits = 0;
                while let Some(d) = chars.peek().and_then(|c| c.to_digit(16)) {
                    code = code * 16 + d;
                    digits += 1;
                    chars.next();
                }
                match char::from_u32(code) {
                    Some(decoded) if digits > 0 => out.push(decoded),
                    _ => out.push_str("\\x"),
                }
            }
            Some(d) if d.is_digit(8) => {
                let mut code = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(next) => {
                            code = code * 8 + next;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflgen_ast::Span;

    fn pieces(text: &str) -> Vec<(String, String)> {
        parse_attribute_text(text)
            .unwrap()
            .into_iter()
            .map(|p| (p.key, p.value))
            .collect()
    }

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn test_bare_marker_and_string_argument() {
        assert_eq!(
            pieces(r#"refl, descriptions("This is a test component")"#),
            vec![
                pair("refl", "null"),
                pair("descriptions", "This is a test component"),
            ]
        );
    }

    #[test]
    fn test_string_escapes_are_decoded() {
        assert_eq!(
            pieces(r#"meta("Can't \"quote\"\n\ttab\x41\101")"#),
            vec![pair("meta", "Can't \"quote\"\n\ttabAA")]
        );
    }

    #[test]
    fn test_raw_arguments_keep_spelling() {
        assert_eq!(
            pieces("range(0, 100), size(sizeof(int) * 2), ns::tag"),
            vec![
                pair("range", "0, 100"),
                pair("size", "sizeof(int) * 2"),
                pair("ns::tag", "null"),
            ]
        );
    }

    #[test]
    fn test_object_literal_keeps_order_and_duplicates() {
        assert_eq!(
            pieces(r#"{"doc": "x", "min": 0, "doc": "y", "flag": true, "list": [1, 2]}"#),
            vec![
                pair("doc", "x"),
                pair("min", "0"),
                pair("doc", "y"),
                pair("flag", "true"),
                pair("list", "[1, 2]"),
            ]
        );
    }

    #[test]
    fn test_object_argument_is_spliced() {
        assert_eq!(
            pieces(r#"refl, meta({"doc": "item count"})"#),
            vec![pair("refl", "null"), pair("doc", "item count")]
        );
    }

    #[test]
    fn test_explicit_empty_forms() {
        assert!(pieces("").is_empty());
        assert!(pieces("   ").is_empty());
        assert!(pieces("null").is_empty());
        assert!(pieces("{}").is_empty());
        assert!(pieces("{ }").is_empty());
    }

    #[test]
    fn test_malformed_text_is_an_error() {
        for text in [
            r#"meta("unterminated)"#,
            "meta(1, 2",
            "meta(1]",
            r#"{"doc" "x"}"#,
            "refl refl",
            "42",
        ] {
            let result = parse_attribute_text(text);
            assert!(
                matches!(result, Err(MetaError::Malformed { .. })),
                "expected malformed for {:?}, got {:?}",
                text,
                result
            );
        }
    }

    #[test]
    fn test_doc_comment_tags() {
        let annotation = Annotation::doc(
            "Widget shown in the toolbar.\n@refl\n@doc  shows things \n  @category ui",
            Span::dummy(),
        );
        let result: Vec<_> = parse_annotation(&annotation)
            .unwrap()
            .into_iter()
            .map(|p| (p.key, p.value))
            .collect();
        assert_eq!(
            result,
            vec![
                pair("refl", "null"),
                pair("doc", "shows things"),
                pair("category", "ui"),
            ]
        );
    }

    #[test]
    fn test_doc_comment_without_tags_is_empty() {
        assert!(parse_doc_text("Just prose.\nMore prose @ here").is_empty());
    }
}
