//! Recursive descent parser for the declaration subset of C++ headers
//!
//! The parser only builds the nodes reflection needs. Anything else at
//! namespace or class scope is skipped by balancing delimiters up to the
//! end of the declaration.

use log::debug;
use reflgen_ast::*;
use reflgen_lexer::{Token, TokenKind};

use crate::ParseError;

pub(crate) struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    fatal_errors: bool,
    errors: Vec<ParseError>,
    /// Declarators after the last type definition, as in `} instance;`
    type_declarators: Vec<(String, Span)>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(source: &'a str, tokens: Vec<Token>, fatal_errors: bool) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            fatal_errors,
            errors: Vec::new(),
            type_declarators: Vec::new(),
        }
    }

    /// Errors recovered from so far
    pub(crate) fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    // === Utilities ===

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens.last().expect("tokens should have at least EOF")
        })
    }

    fn peek(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_ahead(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    fn at_ident(&self, text: &str) -> bool {
        self.at(TokenKind::Ident) && self.text(self.current()) == text
    }

    fn consume(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::unexpected(
                kind.describe(),
                self.peek(),
                self.current().span,
            ))
        }
    }

    fn text(&self, token: &Token) -> &'a str {
        token.text(self.source)
    }

    fn span(&self) -> Span {
        self.current().span
    }

    fn prev_span(&self) -> Span {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|t| t.span)
            .unwrap_or_default()
    }

    /// Record a recoverable error, or fail when running with fatal errors
    fn report(&mut self, error: ParseError) -> Result<(), ParseError> {
        if self.fatal_errors {
            return Err(error);
        }
        debug!("recovered from parse error: {}", error);
        self.errors.push(error);
        Ok(())
    }

    // === Translation unit ===

    pub(crate) fn parse_unit(&mut self) -> Result<TranslationUnit, ParseError> {
        let start = self.span();
        let entities = self.parse_scope(TokenKind::Eof)?;
        Ok(TranslationUnit::new(entities, start.merge(self.span())))
    }

    /// Parse namespace-scope declarations until `end` (not consumed)
    fn parse_scope(&mut self, end: TokenKind) -> Result<Vec<Entity>, ParseError> {
        let mut entities = Vec::new();

        loop {
            if self.at(end) {
                break;
            }
            if self.at(TokenKind::Eof) {
                let error = ParseError::UnexpectedEof { span: self.span() };
                self.report(error)?;
                break;
            }
            if self.at(TokenKind::RBrace) {
                let error = ParseError::UnmatchedBrace { span: self.span() };
                self.advance();
                self.report(error)?;
                continue;
            }

            let before = self.pos;
            match self.parse_scope_item(&mut entities) {
                Ok(()) => {}
                Err(error) => {
                    self.report(error)?;
                    self.recover();
                }
            }
            if self.pos == before {
                // Guarantee progress on tokens no rule accepts
                self.advance();
            }
        }

        Ok(entities)
    }

    fn parse_scope_item(&mut self, entities: &mut Vec<Entity>) -> Result<(), ParseError> {
        let annotations = self.parse_leading_annotations()?;

        match self.peek() {
            TokenKind::Namespace => {
                let ns = self.parse_namespace(false)?;
                entities.extend(ns);
            }
            TokenKind::Inline if self.peek_ahead(1) == TokenKind::Namespace => {
                self.advance();
                let ns = self.parse_namespace(true)?;
                entities.extend(ns);
            }
            TokenKind::Extern
                if self.peek_ahead(1) == TokenKind::String
                    && self.peek_ahead(2) == TokenKind::LBrace =>
            {
                // Linkage blocks do not introduce a scope
                self.advance();
                self.advance();
                self.consume(TokenKind::LBrace)?;
                let inner = self.parse_scope(TokenKind::RBrace)?;
                self.consume(TokenKind::RBrace)?;
                entities.extend(inner);
            }
            TokenKind::Class | TokenKind::Struct | TokenKind::Union
                if self.looks_like_type_decl() =>
            {
                entities.extend(self.parse_class(annotations, false)?);
            }
            TokenKind::Enum if self.looks_like_type_decl() => {
                entities.extend(self.parse_enum(annotations)?);
            }
            TokenKind::Template => {
                entities.extend(self.parse_template(annotations)?);
            }
            TokenKind::Semicolon => {
                self.advance();
            }
            TokenKind::Eof | TokenKind::RBrace => {}
            _ => self.skip_declaration()?,
        }

        Ok(())
    }

    fn parse_namespace(&mut self, is_inline: bool) -> Result<Option<Entity>, ParseError> {
        let start = self.span();
        self.consume(TokenKind::Namespace)?;
        self.skip_attribute_blocks()?;

        let name = if self.at(TokenKind::Ident) {
            Some(self.parse_qualified_name()?)
        } else {
            None
        };

        if self.at(TokenKind::Eq) {
            // Namespace alias
            self.skip_declaration()?;
            return Ok(None);
        }

        self.consume(TokenKind::LBrace)?;
        let entities = self.parse_scope(TokenKind::RBrace)?;
        self.consume(TokenKind::RBrace)?;

        Ok(Some(Entity::Namespace(NamespaceDecl {
            name,
            is_inline,
            entities,
            span: start.merge(self.prev_span()),
        })))
    }

    fn parse_template(&mut self, annotations: Vec<Annotation>) -> Result<Option<Entity>, ParseError> {
        self.consume(TokenKind::Template)?;
        if self.at(TokenKind::Lt) {
            self.skip_angle_brackets()?;
        }

        match self.peek() {
            TokenKind::Class | TokenKind::Struct | TokenKind::Union if self.looks_like_type_decl() => {
                self.parse_class(annotations, true)
            }
            _ => {
                self.skip_declaration()?;
                Ok(None)
            }
        }
    }

    // === Annotations ===

    /// Doc comments and attribute blocks in front of a declaration
    fn parse_leading_annotations(&mut self) -> Result<Vec<Annotation>, ParseError> {
        let mut annotations = Vec::new();

        loop {
            match self.peek() {
                TokenKind::DocComment if self.is_trailing_doc() => {
                    // `///<` belongs to the previous declaration and has no owner here
                    debug!("dropping detached trailing doc comment");
                    self.advance();
                }
                TokenKind::DocComment => annotations.push(self.parse_doc_comment()),
                TokenKind::AttrOpen => annotations.push(self.parse_attribute_block()?),
                _ => break,
            }
        }

        Ok(annotations)
    }

    fn is_trailing_doc(&self) -> bool {
        self.at(TokenKind::DocComment) && self.text(self.current()).starts_with("///<")
    }

    /// Merge consecutive `///` lines into one annotation
    fn parse_doc_comment(&mut self) -> Annotation {
        let mut lines = Vec::new();
        let mut span = self.span();

        while self.at(TokenKind::DocComment) && !self.is_trailing_doc() {
            let token = self.advance();
            span = span.merge(token.span);
            lines.push(strip_doc_marker(self.text(&token), "///"));
        }

        Annotation::doc(lines.join("\n"), span)
    }

    /// A `///<` comment directly after a declaration, if any
    fn take_trailing_doc(&mut self) -> Option<Annotation> {
        if !self.is_trailing_doc() {
            return None;
        }
        let token = self.advance();
        let line = strip_doc_marker(self.text(&token), "///<");
        Some(Annotation::doc(line, token.span))
    }

    /// Parse `[[ ... ]]`, keeping the inner text verbatim.
    ///
    /// The first `]]` closes the block even inside unbalanced brackets, so
    /// malformed text stays with its own declaration.
    fn parse_attribute_block(&mut self) -> Result<Annotation, ParseError> {
        let open = self.consume(TokenKind::AttrOpen)?;
        let inner_start = open.span.end;

        loop {
            match self.peek() {
                TokenKind::Eof => {
                    return Err(ParseError::Unterminated {
                        what: "attribute",
                        span: open.span,
                    });
                }
                TokenKind::RBracket if self.peek_ahead(1) == TokenKind::RBracket => {
                    let close = self.advance();
                    self.advance();
                    let text = self.source[inner_start..close.span.start].trim();
                    return Ok(Annotation::attribute(text, open.span.merge(self.prev_span())));
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn skip_attribute_blocks(&mut self) -> Result<Vec<Annotation>, ParseError> {
        let mut attributes = Vec::new();
        loop {
            match self.peek() {
                TokenKind::AttrOpen => attributes.push(self.parse_attribute_block()?),
                TokenKind::Alignas => {
                    self.advance();
                    if self.at(TokenKind::LParen) {
                        self.skip_balanced()?;
                    }
                }
                _ => return Ok(attributes),
            }
        }
    }

    // === Types ===

    /// Distinguish `struct X { ... }` / `struct X;` from `struct X* field;`
    fn looks_like_type_decl(&self) -> bool {
        let mut i = 1;
        if self.peek() == TokenKind::Enum
            && matches!(self.peek_ahead(1), TokenKind::Class | TokenKind::Struct)
        {
            i += 1;
        }

        loop {
            match self.peek_ahead(i) {
                TokenKind::AttrOpen => {
                    // Walk to the closing `]]`
                    i += 1;
                    while !matches!(self.peek_ahead(i), TokenKind::Eof)
                        && !(self.peek_ahead(i) == TokenKind::RBracket
                            && self.peek_ahead(i + 1) == TokenKind::RBracket)
                    {
                        i += 1;
                    }
                    i += 2;
                }
                TokenKind::Alignas => {
                    i += 1;
                    if self.peek_ahead(i) == TokenKind::LParen {
                        let mut depth = 0usize;
                        loop {
                            match self.peek_ahead(i) {
                                TokenKind::LParen => depth += 1,
                                TokenKind::RParen => depth -= 1,
                                TokenKind::Eof => return false,
                                _ => {}
                            }
                            i += 1;
                            if depth == 0 {
                                break;
                            }
                        }
                    }
                }
                _ => break,
            }
        }

        // Optional (qualified) name
        while matches!(self.peek_ahead(i), TokenKind::Ident | TokenKind::ColonColon) {
            i += 1;
        }
        // Template arguments of an explicit specialization
        if self.peek_ahead(i) == TokenKind::Lt {
            let mut depth = 0usize;
            loop {
                match self.peek_ahead(i) {
                    TokenKind::Lt => depth += 1,
                    TokenKind::Gt => depth -= 1,
                    TokenKind::Eof | TokenKind::Semicolon | TokenKind::LBrace => return false,
                    _ => {}
                }
                i += 1;
                if depth == 0 {
                    break;
                }
            }
        }

        matches!(
            self.peek_ahead(i),
            TokenKind::LBrace | TokenKind::Colon | TokenKind::Semicolon
        )
    }

    fn parse_class(
        &mut self,
        mut annotations: Vec<Annotation>,
        is_template: bool,
    ) -> Result<Option<Entity>, ParseError> {
        let start = self.span();
        let key = match self.advance().kind {
            TokenKind::Class => ClassKey::Class,
            TokenKind::Union => ClassKey::Union,
            _ => ClassKey::Struct,
        };
        annotations.extend(self.skip_attribute_blocks()?);

        let name = if self.at(TokenKind::Ident) && !self.at_ident("final") {
            Some(self.parse_qualified_name()?)
        } else {
            None
        };
        if self.at(TokenKind::Lt) {
            self.skip_angle_brackets()?;
        }
        if self.at_ident("final") {
            self.advance();
        }

        if self.at(TokenKind::Semicolon) {
            self.advance();
            return Ok(Some(Entity::Class(ClassDecl {
                name,
                key,
                is_definition: false,
                is_template,
                annotations,
                members: Vec::new(),
                span: start.merge(self.prev_span()),
            })));
        }

        if self.at(TokenKind::Colon) {
            self.skip_base_clause()?;
        }

        self.consume(TokenKind::LBrace)?;
        let simple_name = name
            .as_deref()
            .map(|n| n.rsplit("::").next().unwrap_or(n).to_string());
        let members = self.parse_class_body(key, simple_name.as_deref())?;
        self.consume(TokenKind::RBrace)?;
        let span = start.merge(self.prev_span());
        self.finish_type_declarators()?;

        Ok(Some(Entity::Class(ClassDecl {
            name,
            key,
            is_definition: true,
            is_template,
            annotations,
            members,
            span,
        })))
    }

    /// Skip `: public Base<T>, private Other` up to the class body
    fn skip_base_clause(&mut self) -> Result<(), ParseError> {
        self.consume(TokenKind::Colon)?;
        while !self.at(TokenKind::LBrace) {
            match self.peek() {
                TokenKind::Eof | TokenKind::Semicolon => {
                    return Err(ParseError::unexpected("'{'", self.peek(), self.span()));
                }
                TokenKind::Lt => self.skip_angle_brackets()?,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::AttrOpen => self.skip_balanced()?,
                _ => {
                    self.advance();
                }
            }
        }
        Ok(())
    }

    /// After `}` of a type: `;`, or declarators such as `} instance, *ptr;`
    fn finish_type_declarators(&mut self) -> Result<(), ParseError> {
        self.type_declarators.clear();
        let mut last_ident: Option<(String, Span)> = None;

        loop {
            match self.peek() {
                TokenKind::Comma | TokenKind::Semicolon => {
                    let done = self.at(TokenKind::Semicolon);
                    self.advance();
                    self.type_declarators.extend(last_ident.take());
                    if done {
                        return Ok(());
                    }
                }
                TokenKind::Eof | TokenKind::RBrace => {
                    return Err(ParseError::unexpected("';'", self.peek(), self.span()));
                }
                TokenKind::Ident => {
                    let token = self.advance();
                    last_ident = Some((self.text(&token).to_string(), token.span));
                }
                TokenKind::Eq | TokenKind::Colon => {
                    self.advance();
                    self.skip_initializer()?;
                }
                kind if kind.is_open() => self.skip_balanced()?,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn parse_class_body(
        &mut self,
        key: ClassKey,
        class_name: Option<&str>,
    ) -> Result<Vec<ClassMember>, ParseError> {
        let mut members = Vec::new();
        let mut access = key.default_access();

        loop {
            match self.peek() {
                TokenKind::RBrace => break,
                TokenKind::Eof => {
                    return Err(ParseError::UnexpectedEof { span: self.span() });
                }
                _ => {}
            }

            let before = self.pos;
            let result = self.parse_member(&mut members, &mut access, class_name);
            if let Err(error) = result {
                self.report(error)?;
                self.recover();
            }
            if self.pos == before {
                self.advance();
            }
        }

        Ok(members)
    }

    fn parse_member(
        &mut self,
        members: &mut Vec<ClassMember>,
        access: &mut Access,
        class_name: Option<&str>,
    ) -> Result<(), ParseError> {
        let annotations = self.parse_leading_annotations()?;

        match self.peek() {
            TokenKind::Public | TokenKind::Protected | TokenKind::Private => {
                *access = match self.advance().kind {
                    TokenKind::Public => Access::Public,
                    TokenKind::Protected => Access::Protected,
                    _ => Access::Private,
                };
                self.consume(TokenKind::Colon)?;
                if !annotations.is_empty() {
                    debug!("ignoring annotations on an access specifier");
                }
            }
            TokenKind::Class | TokenKind::Struct | TokenKind::Union if self.looks_like_type_decl() => {
                self.type_declarators.clear();
                if let Some(entity) = self.parse_class(annotations, false)? {
                    members.push(ClassMember::Type(entity));
                }
                self.push_type_declarators(members, *access);
            }
            TokenKind::Enum if self.looks_like_type_decl() => {
                self.type_declarators.clear();
                if let Some(entity) = self.parse_enum(annotations)? {
                    members.push(ClassMember::Type(entity));
                }
                self.push_type_declarators(members, *access);
            }
            TokenKind::Template => {
                if let Some(entity) = self.parse_template(annotations)? {
                    members.push(ClassMember::Type(entity));
                }
            }
            TokenKind::Using | TokenKind::Typedef | TokenKind::Friend | TokenKind::StaticAssert => {
                self.skip_declaration()?;
            }
            TokenKind::Semicolon => {
                self.advance();
            }
            TokenKind::RBrace | TokenKind::Eof => {}
            _ => {
                let start = members.len();
                self.parse_member_declaration(members, annotations, *access, class_name)?;
                if let Some(doc) = self.take_trailing_doc() {
                    for member in &mut members[start..] {
                        match member {
                            ClassMember::Field(field) => field.annotations.push(doc.clone()),
                            ClassMember::Method(method) => method.annotations.push(doc.clone()),
                            ClassMember::Type(_) => {}
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// `enum Mode { On } mode;` also declares the field `mode`
    fn push_type_declarators(&mut self, members: &mut Vec<ClassMember>, access: Access) {
        for (name, span) in std::mem::take(&mut self.type_declarators) {
            members.push(ClassMember::Field(FieldDecl {
                name,
                is_static: false,
                access,
                annotations: Vec::new(),
                span,
            }));
        }
    }

    /// Parse one member declaration: a data member list or a member function.
    ///
    /// Declarators are found by scanning the declaration left to right and
    /// tracking the most recent identifier.
    fn parse_member_declaration(
        &mut self,
        members: &mut Vec<ClassMember>,
        annotations: Vec<Annotation>,
        access: Access,
        class_name: Option<&str>,
    ) -> Result<(), ParseError> {
        let start = self.span();
        let mut is_static = false;
        let mut is_destructor = false;
        let mut last_ident: Option<(String, Span)> = None;
        let mut ident_count = 0usize;
        let mut declarator_attrs: Vec<Annotation> = Vec::new();

        loop {
            match self.peek() {
                TokenKind::Static => {
                    is_static = true;
                    self.advance();
                }
                TokenKind::AttrOpen => {
                    declarator_attrs.push(self.parse_attribute_block()?);
                }
                TokenKind::Alignas => {
                    self.skip_attribute_blocks()?;
                }
                TokenKind::Lt => self.skip_angle_brackets()?,
                TokenKind::Tilde => {
                    is_destructor = true;
                    self.advance();
                }
                TokenKind::Operator => {
                    let name = self.parse_operator_name()?;
                    let mut all = annotations;
                    all.extend(declarator_attrs);
                    self.skip_function_tail()?;
                    members.push(ClassMember::Method(MethodDecl {
                        name,
                        kind: MethodKind::Operator,
                        is_static,
                        access,
                        annotations: all,
                        span: start.merge(self.prev_span()),
                    }));
                    return Ok(());
                }
                TokenKind::LParen => {
                    let fn_pointer = matches!(self.peek_ahead(1), TokenKind::Star | TokenKind::Amp);
                    if fn_pointer {
                        // `R (*name)(Args...)`: a data member
                        self.advance();
                        while matches!(self.peek(), TokenKind::Star | TokenKind::Amp | TokenKind::ColonColon)
                            || (self.at(TokenKind::Ident) && self.peek_ahead(1) == TokenKind::ColonColon)
                        {
                            self.advance();
                        }
                        let ident = self.consume(TokenKind::Ident)?;
                        last_ident = Some((self.text(&ident).to_string(), ident.span));
                        self.consume(TokenKind::RParen)?;
                        if self.at(TokenKind::LParen) {
                            self.skip_balanced()?;
                        }
                        continue;
                    }

                    let Some((name, _)) = last_ident.take() else {
                        return Err(ParseError::unexpected("identifier", self.peek(), self.span()));
                    };

                    let kind = if is_destructor {
                        MethodKind::Destructor
                    } else if Some(name.as_str()) == class_name {
                        MethodKind::Constructor
                    } else {
                        MethodKind::Regular
                    };

                    // Only constructors and destructors lack a return type, so a lone
                    // `NAME(...)` is a macro invocation such as `REFL_BODY()`
                    if kind == MethodKind::Regular && ident_count == 1 {
                        debug!("skipping macro invocation {}()", name);
                        self.skip_balanced()?;
                        if self.at(TokenKind::Semicolon) {
                            self.advance();
                        }
                        return Ok(());
                    }

                    self.skip_function_tail()?;
                    let mut all = annotations;
                    all.extend(declarator_attrs);
                    members.push(ClassMember::Method(MethodDecl {
                        name,
                        kind,
                        is_static,
                        access,
                        annotations: all,
                        span: start.merge(self.prev_span()),
                    }));
                    return Ok(());
                }
                TokenKind::Eq => {
                    self.advance();
                    self.skip_initializer()?;
                }
                TokenKind::LBrace | TokenKind::LBracket => self.skip_balanced()?,
                TokenKind::Colon => {
                    // Bit-field width
                    self.advance();
                    self.skip_initializer()?;
                }
                TokenKind::Comma | TokenKind::Semicolon => {
                    let Some((name, name_span)) = last_ident.take() else {
                        return Err(ParseError::unexpected("identifier", self.peek(), self.span()));
                    };
                    let done = self.at(TokenKind::Semicolon);
                    let end = self.advance().span;
                    let mut all = annotations.clone();
                    all.append(&mut declarator_attrs);
                    members.push(ClassMember::Field(FieldDecl {
                        name,
                        is_static,
                        access,
                        annotations: all,
                        span: start.merge(name_span).merge(end),
                    }));
                    if done {
                        return Ok(());
                    }
                }
                TokenKind::RBrace | TokenKind::Eof => {
                    return Err(ParseError::unexpected("';'", self.peek(), self.span()));
                }
                TokenKind::Ident => {
                    let token = self.advance();
                    last_ident = Some((self.text(&token).to_string(), token.span));
                    ident_count += 1;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn parse_operator_name(&mut self) -> Result<String, ParseError> {
        self.consume(TokenKind::Operator)?;
        let mut name = String::from("operator");

        if self.at(TokenKind::LParen) && self.peek_ahead(1) == TokenKind::RParen {
            self.advance();
            self.advance();
            name.push_str("()");
            return Ok(name);
        }

        while !self.at(TokenKind::LParen) {
            if matches!(self.peek(), TokenKind::Eof | TokenKind::Semicolon | TokenKind::RBrace) {
                return Err(ParseError::unexpected("'('", self.peek(), self.span()));
            }
            let token = self.advance();
            if token.kind == TokenKind::Ident {
                name.push(' ');
            }
            name.push_str(self.text(&token));
        }
        Ok(name)
    }

    /// Skip a parameter list and whatever ends the function: `;`, a body,
    /// `= 0;`, `= default;` or a constructor initializer list.
    fn skip_function_tail(&mut self) -> Result<(), ParseError> {
        if self.at(TokenKind::LParen) {
            self.skip_balanced()?;
        }

        loop {
            match self.peek() {
                TokenKind::Semicolon => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::LBrace => {
                    self.skip_balanced()?;
                    if self.at(TokenKind::Semicolon) {
                        self.advance();
                    }
                    return Ok(());
                }
                TokenKind::Colon => {
                    self.advance();
                    self.skip_member_initializers()?;
                }
                TokenKind::LParen | TokenKind::LBracket | TokenKind::AttrOpen => self.skip_balanced()?,
                TokenKind::Lt => self.skip_angle_brackets()?,
                TokenKind::RBrace | TokenKind::Eof => {
                    return Err(ParseError::unexpected("';'", self.peek(), self.span()));
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// `a(1), b{2}, Base<T>(x)` up to the constructor body
    fn skip_member_initializers(&mut self) -> Result<(), ParseError> {
        loop {
            while !matches!(self.peek(), TokenKind::LParen | TokenKind::LBrace) {
                match self.peek() {
                    TokenKind::Lt => self.skip_angle_brackets()?,
                    TokenKind::Eof | TokenKind::Semicolon | TokenKind::RBrace => {
                        return Err(ParseError::unexpected("'('", self.peek(), self.span()));
                    }
                    _ => {
                        self.advance();
                    }
                }
            }
            self.skip_balanced()?;
            if self.at(TokenKind::Ellipsis) {
                self.advance();
            }
            if self.at(TokenKind::Comma) {
                self.advance();
                continue;
            }
            return Ok(());
        }
    }

    fn parse_enum(&mut self, mut annotations: Vec<Annotation>) -> Result<Option<Entity>, ParseError> {
        let start = self.span();
        self.consume(TokenKind::Enum)?;
        let is_scoped = matches!(self.peek(), TokenKind::Class | TokenKind::Struct);
        if is_scoped {
            self.advance();
        }
        annotations.extend(self.skip_attribute_blocks()?);

        let name = if self.at(TokenKind::Ident) {
            Some(self.parse_qualified_name()?)
        } else {
            None
        };

        if self.at(TokenKind::Colon) {
            // Underlying type
            self.advance();
            while !matches!(self.peek(), TokenKind::LBrace | TokenKind::Semicolon) {
                if self.at(TokenKind::Eof) {
                    return Err(ParseError::UnexpectedEof { span: self.span() });
                }
                self.advance();
            }
        }

        if self.at(TokenKind::Semicolon) {
            self.advance();
            return Ok(Some(Entity::Enum(EnumDecl {
                name,
                is_scoped,
                is_definition: false,
                annotations,
                enumerators: Vec::new(),
                span: start.merge(self.prev_span()),
            })));
        }

        self.consume(TokenKind::LBrace)?;
        let enumerators = self.parse_enumerators()?;
        self.consume(TokenKind::RBrace)?;
        let span = start.merge(self.prev_span());
        self.finish_type_declarators()?;

        Ok(Some(Entity::Enum(EnumDecl {
            name,
            is_scoped,
            is_definition: true,
            annotations,
            enumerators,
            span,
        })))
    }

    fn parse_enumerators(&mut self) -> Result<Vec<EnumeratorDecl>, ParseError> {
        let mut enumerators: Vec<EnumeratorDecl> = Vec::new();

        loop {
            let mut annotations = self.parse_leading_annotations()?;
            if self.at(TokenKind::RBrace) {
                break;
            }

            let ident = self.consume(TokenKind::Ident)?;
            annotations.extend(self.skip_attribute_blocks()?);

            if self.at(TokenKind::Eq) {
                self.advance();
                self.skip_initializer()?;
            }

            let mut decl = EnumeratorDecl {
                name: self.text(&ident).to_string(),
                annotations,
                span: ident.span.merge(self.prev_span()),
            };

            let more = self.at(TokenKind::Comma);
            if more {
                self.advance();
            }
            if let Some(doc) = self.take_trailing_doc() {
                decl.annotations.push(doc);
            }
            enumerators.push(decl);

            if !more {
                break;
            }
        }

        Ok(enumerators)
    }

    fn parse_qualified_name(&mut self) -> Result<String, ParseError> {
        let mut name = String::new();
        if self.at(TokenKind::ColonColon) {
            self.advance();
        }
        loop {
            let ident = self.consume(TokenKind::Ident)?;
            name.push_str(self.text(&ident));
            if self.at(TokenKind::ColonColon) && self.peek_ahead(1) == TokenKind::Ident {
                self.advance();
                name.push_str("::");
            } else {
                return Ok(name);
            }
        }
    }

    // === Skipping ===

    /// Skip a balanced `(...)`, `{...}`, `[...]` or `[[...]]` group at the cursor
    fn skip_balanced(&mut self) -> Result<(), ParseError> {
        let open = self.current().clone();
        let mut depth = 0usize;

        loop {
            match self.peek() {
                TokenKind::Eof => {
                    return Err(ParseError::Unterminated {
                        what: "delimiter group",
                        span: open.span,
                    });
                }
                TokenKind::AttrOpen => {
                    self.parse_attribute_block()?;
                    if depth == 0 {
                        return Ok(());
                    }
                    continue;
                }
                kind if kind.is_open() => depth += 1,
                kind if kind.is_close() => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// Skip `<...>` in a type context, honoring nested groups
    fn skip_angle_brackets(&mut self) -> Result<(), ParseError> {
        let open = self.consume(TokenKind::Lt)?;
        let mut depth = 1usize;

        while depth > 0 {
            match self.peek() {
                TokenKind::Lt => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::Gt => {
                    depth -= 1;
                    self.advance();
                }
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket | TokenKind::AttrOpen => {
                    self.skip_balanced()?;
                }
                TokenKind::Eof | TokenKind::Semicolon | TokenKind::RBrace => {
                    return Err(ParseError::Unterminated {
                        what: "template argument list",
                        span: open.span,
                    });
                }
                _ => {
                    self.advance();
                }
            }
        }
        Ok(())
    }

    /// Skip an initializer or bit-field width up to the next `,` or `;`
    fn skip_initializer(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                TokenKind::Comma | TokenKind::Semicolon => return Ok(()),
                TokenKind::RBrace | TokenKind::Eof => return Ok(()),
                kind if kind.is_open() => self.skip_balanced()?,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip any declaration the tree does not model, including function bodies
    fn skip_declaration(&mut self) -> Result<(), ParseError> {
        let mut saw_params = false;
        let mut after_eq = false;

        loop {
            match self.peek() {
                TokenKind::Semicolon => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::Eof | TokenKind::RBrace => {
                    return Err(ParseError::unexpected("';'", self.peek(), self.span()));
                }
                TokenKind::Eq => {
                    after_eq = true;
                    self.advance();
                }
                TokenKind::LParen => {
                    if !after_eq {
                        saw_params = true;
                    }
                    self.skip_balanced()?;
                }
                TokenKind::LBrace => {
                    self.skip_balanced()?;
                    if saw_params && !after_eq {
                        // Function body: no trailing `;` required
                        if self.at(TokenKind::Semicolon) {
                            self.advance();
                        }
                        return Ok(());
                    }
                }
                kind if kind.is_open() => self.skip_balanced()?,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip to just after the next `;`, or to a closing `}` of the enclosing scope
    fn recover(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                TokenKind::Eof => return,
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace if depth == 0 => return,
                TokenKind::AttrOpen => depth += 2,
                kind if kind.is_open() => depth += 1,
                kind if kind.is_close() => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 && kind == TokenKind::RBrace {
                        self.advance();
                        if self.at(TokenKind::Semicolon) {
                            self.advance();
                        }
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }
}

fn strip_doc_marker(line: &str, marker: &str) -> String {
    let body = line.strip_prefix(marker).unwrap_or(line);
    body.strip_prefix(' ').unwrap_or(body).trim_end().to_string()
}
