//! Declaration tree nodes
//!
//! Only the declaration categories reflection cares about are modelled.
//! Everything else a front-end sees (free functions, variables, aliases)
//! is dropped before it reaches this tree.

use serde::{Deserialize, Serialize};

use crate::{Annotation, Span};

fn default_true() -> bool {
    true
}

/// A namespace-scope declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum Entity {
    /// `namespace foo { ... }`, `inline namespace v1 { ... }` or `namespace { ... }`
    Namespace(NamespaceDecl),

    /// `class`, `struct` or `union`
    Class(ClassDecl),

    /// `enum` or `enum class`
    Enum(EnumDecl),
}

impl Entity {
    pub fn span(&self) -> Span {
        match self {
            Entity::Namespace(ns) => ns.span,
            Entity::Class(class) => class.span,
            Entity::Enum(en) => en.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceDecl {
    /// `None` for an anonymous namespace
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_inline: bool,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKey {
    Class,
    Struct,
    Union,
}

impl ClassKey {
    /// Access level members get before any access specifier
    pub fn default_access(self) -> Access {
        match self {
            ClassKey::Class => Access::Private,
            ClassKey::Struct | ClassKey::Union => Access::Public,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    /// Declared name; may itself be qualified (`struct ns::Widget { ... }`).
    /// `None` for anonymous classes.
    #[serde(default)]
    pub name: Option<String>,
    pub key: ClassKey,
    /// `false` for forward declarations
    #[serde(default = "default_true")]
    pub is_definition: bool,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub members: Vec<ClassMember>,
    #[serde(default)]
    pub span: Span,
}

/// A member of a class body, in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "member", rename_all = "snake_case")]
pub enum ClassMember {
    Field(FieldDecl),
    Method(MethodDecl),
    /// A nested class or enum
    Type(Entity),
}

/// Data member, static or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    #[default]
    Regular,
    Constructor,
    Destructor,
    Operator,
}

/// Member function declaration or definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub kind: MethodKind,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDecl {
    #[serde(default)]
    pub name: Option<String>,
    /// `enum class` / `enum struct`
    #[serde(default)]
    pub is_scoped: bool,
    #[serde(default = "default_true")]
    pub is_definition: bool,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub enumerators: Vec<EnumeratorDecl>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumeratorDecl {
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub span: Span,
}
