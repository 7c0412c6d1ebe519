//! reflgen Lexer - Tokenization using logos
//!
//! Two token sets live here:
//! - [`TokenKind`] covers the declaration subset of C++ headers. Comments
//!   and preprocessor lines are skipped, `///` doc comments are kept.
//! - [`MetaTokenKind`] covers annotation text such as `refl, meta("x")`.

mod meta_token;
mod token;

pub use meta_token::*;
pub use token::*;

use logos::Logos;
use reflgen_ast::Span;

/// Tokenize header source into a vector of tokens ending with `Eof`
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        let kind = result.unwrap_or(TokenKind::Error);
        tokens.push(Token { kind, span });
    }

    let end = source.len();
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(end, end),
    });

    tokens
}

/// Tokenize annotation text into a vector of tokens ending with `Eof`
pub fn tokenize_meta(text: &str) -> Vec<MetaToken> {
    let mut tokens = Vec::new();
    let mut lexer = MetaTokenKind::lexer(text);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        let kind = result.unwrap_or(MetaTokenKind::Error);
        tokens.push(MetaToken { kind, span });
    }

    let end = text.len();
    tokens.push(MetaToken {
        kind: MetaTokenKind::Eof,
        span: Span::new(end, end),
    });

    tokens
}

/// A header token with its span
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }
}

/// An annotation token with its span
#[derive(Debug, Clone)]
pub struct MetaToken {
    pub kind: MetaTokenKind,
    pub span: Span,
}

impl MetaToken {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_struct_with_attribute() {
        assert_eq!(
            kinds("struct [[refl]] Widget;"),
            vec![
                TokenKind::Struct,
                TokenKind::AttrOpen,
                TokenKind::Ident,
                TokenKind::RBracket,
                TokenKind::RBracket,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_and_preprocessor_skipped() {
        let source = "#pragma once\n#define X \\\n  1\n// note\n/* block */ int x;";
        assert_eq!(
            kinds(source),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Semicolon, TokenKind::Eof]
        );
    }

    #[test]
    fn test_block_comments_skipped() {
        let source = "/* Copyright\n * header **/\nstruct /* inline */ W; /**/";
        assert_eq!(
            kinds(source),
            vec![TokenKind::Struct, TokenKind::Ident, TokenKind::Semicolon, TokenKind::Eof]
        );
        // An unterminated comment runs to the end
        assert_eq!(
            kinds("int x; /* open"),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Semicolon, TokenKind::Eof]
        );
    }

    #[test]
    fn test_string_literals() {
        let source = r#""a \"q\" ]] b" x"#;
        let tokens = tokenize(source);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text(source), r#""a \"q\" ]] b""#);
        assert_eq!(tokens[1].kind, TokenKind::Ident);
    }

    #[test]
    fn test_unterminated_string_stops_before_attribute_close() {
        let source = "[[meta(\"oops)]] int x;\nint y;";
        let tokens = tokenize(source);
        assert_eq!(tokens[3].kind, TokenKind::String);
        assert_eq!(tokens[3].text(source), "\"oops)");
        assert_eq!(tokens[4].kind, TokenKind::RBracket);
        assert_eq!(tokens[5].kind, TokenKind::RBracket);

        let source = "\"open\nint y;";
        let tokens = tokenize(source);
        assert_eq!(tokens[0].text(source), "\"open");
        assert_eq!(tokens[1].kind, TokenKind::Ident);
    }

    #[test]
    fn test_doc_comment_kept() {
        let source = "/// @doc hello\nint x;";
        let tokens = tokenize(source);
        assert_eq!(tokens[0].kind, TokenKind::DocComment);
        assert_eq!(tokens[0].text(source), "/// @doc hello");
        assert_eq!(tokens[1].kind, TokenKind::Ident);
    }

    #[test]
    fn test_scope_and_destructor() {
        assert_eq!(
            kinds("~A(); a::b"),
            vec![
                TokenKind::Tilde,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::ColonColon,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_meta_tokens() {
        let text = r#"refl, meta("a \"b\""), {"k": -1}"#;
        let kinds: Vec<_> = tokenize_meta(text).into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MetaTokenKind::Ident,
                MetaTokenKind::Comma,
                MetaTokenKind::Ident,
                MetaTokenKind::LParen,
                MetaTokenKind::String,
                MetaTokenKind::RParen,
                MetaTokenKind::Comma,
                MetaTokenKind::LBrace,
                MetaTokenKind::String,
                MetaTokenKind::Colon,
                MetaTokenKind::Number,
                MetaTokenKind::RBrace,
                MetaTokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_meta_string_is_error() {
        let tokens = tokenize_meta(r#"meta("oops)"#);
        assert!(tokens.iter().any(|t| t.kind == MetaTokenKind::Error));
    }
}
