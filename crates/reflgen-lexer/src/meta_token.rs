//! Token definitions for annotation text (`refl, meta("x")`, `{"doc":"x"}`)

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum MetaTokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("::")]
    ColonColon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("=")]
    Eq,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    #[regex(r"-?[0-9][0-9A-Za-z_.']*")]
    Number,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    /// Any other operator character, kept for raw argument text
    #[regex(r"[-+*/%^|&!.?<>~#@]")]
    Punct,

    Error,
    Eof,
}

impl MetaTokenKind {
    pub fn describe(&self) -> &'static str {
        match self {
            MetaTokenKind::LParen => "'('",
            MetaTokenKind::RParen => "')'",
            MetaTokenKind::LBrace => "'{'",
            MetaTokenKind::RBrace => "'}'",
            MetaTokenKind::LBracket => "'['",
            MetaTokenKind::RBracket => "']'",
            MetaTokenKind::ColonColon => "'::'",
            MetaTokenKind::Colon => "':'",
            MetaTokenKind::Comma => "','",
            MetaTokenKind::Eq => "'='",
            MetaTokenKind::String => "string literal",
            MetaTokenKind::Number => "number",
            MetaTokenKind::Ident => "identifier",
            MetaTokenKind::Punct => "operator",
            MetaTokenKind::Error => "invalid character",
            MetaTokenKind::Eof => "end of annotation",
        }
    }
}
