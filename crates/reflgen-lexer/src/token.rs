//! Token definitions for C++ header declarations

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")] // Skip whitespace
#[logos(skip r"//([^/\n][^\n]*)?")] // Skip plain line comments; `///` is a doc comment
#[logos(skip r"#([^\n\\]|\\(.|\n))*")] // Skip preprocessor lines, with continuations
pub enum TokenKind {
    #[token("/*", lex_block_comment)]
    BlockComment,

    // === Keywords ===
    #[token("namespace")]
    Namespace,
    #[token("class")]
    Class,
    #[token("struct")]
    Struct,
    #[token("union")]
    Union,
    #[token("enum")]
    Enum,
    #[token("static")]
    Static,
    #[token("template")]
    Template,
    #[token("typedef")]
    Typedef,
    #[token("using")]
    Using,
    #[token("friend")]
    Friend,
    #[token("static_assert")]
    StaticAssert,
    #[token("public")]
    Public,
    #[token("protected")]
    Protected,
    #[token("private")]
    Private,
    #[token("operator")]
    Operator,
    #[token("extern")]
    Extern,
    #[token("inline")]
    Inline,
    #[token("alignas")]
    Alignas,

    // === Doc comments ===
    #[regex(r"///[^\n]*")]
    DocComment,

    // === Attributes ===
    #[token("[[")]
    AttrOpen,

    // === Delimiters ===
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
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    // === Punctuation ===
    #[token("::")]
    ColonColon,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("=")]
    Eq,
    #[token("~")]
    Tilde,
    #[token("*")]
    Star,
    #[token("&")]
    Amp,
    #[regex(r"[-+/%^|!.?]")]
    Punct,
    #[token("...")]
    Ellipsis,
    #[token("->")]
    Arrow,

    // === Literals ===
    #[regex(r"[0-9][0-9A-Za-z_.']*")]
    Number,

    /// Unterminated literals end before the line break or a closing `]]`
    #[token("\"", lex_string)]
    String,

    #[regex(r"'([^'\\\n]|\\.)*'")]
    Char,

    // === Identifiers ===
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,

    // === Special ===
    Error,
    Eof,
}

impl TokenKind {
    /// Get a human-readable description of this token kind
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::BlockComment => "comment",
            TokenKind::Namespace => "'namespace'",
            TokenKind::Class => "'class'",
            TokenKind::Struct => "'struct'",
            TokenKind::Union => "'union'",
            TokenKind::Enum => "'enum'",
            TokenKind::Static => "'static'",
            TokenKind::Template => "'template'",
            TokenKind::Typedef => "'typedef'",
            TokenKind::Using => "'using'",
            TokenKind::Friend => "'friend'",
            TokenKind::StaticAssert => "'static_assert'",
            TokenKind::Public => "'public'",
            TokenKind::Protected => "'protected'",
            TokenKind::Private => "'private'",
            TokenKind::Operator => "'operator'",
            TokenKind::Extern => "'extern'",
            TokenKind::Inline => "'inline'",
            TokenKind::Alignas => "'alignas'",
            TokenKind::DocComment => "doc comment",
            TokenKind::AttrOpen => "'[['",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::ColonColon => "'::'",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Eq => "'='",
            TokenKind::Tilde => "'~'",
            TokenKind::Star => "'*'",
            TokenKind::Amp => "'&'",
            TokenKind::Punct => "operator",
            TokenKind::Ellipsis => "'...'",
            TokenKind::Arrow => "'->'",
            TokenKind::Number => "number",
            TokenKind::String => "string literal",
            TokenKind::Char => "character literal",
            TokenKind::Ident => "identifier",
            TokenKind::Error => "invalid token",
            TokenKind::Eof => "end of file",
        }
    }

    /// Opening delimiters that must be balanced when skipping
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket | TokenKind::AttrOpen
        )
    }

    pub fn is_close(&self) -> bool {
        matches!(self, TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket)
    }
}

fn lex_block_comment(lex: &mut logos::Lexer<TokenKind>) -> logos::Skip {
    let remainder = lex.remainder();
    match remainder.find("*/") {
        Some(end) => lex.bump(end + 2),
        // Unterminated: runs to end of input
        None => lex.bump(remainder.len()),
    }
    logos::Skip
}

fn lex_string(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let remainder = lex.remainder();
    let bytes = remainder.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() && bytes[i + 1] != b'\n' => i += 2,
            b'"' => {
                lex.bump(i + 1);
                return true;
            }
            b'\n' => break,
            _ => i += 1,
        }
    }

    let line = &remainder[..i.min(remainder.len())];
    let end = line.find("]]").unwrap_or(line.len());
    lex.bump(end);
    true
}
