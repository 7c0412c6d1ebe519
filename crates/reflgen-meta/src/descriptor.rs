//! Reflection descriptors: what the walker produces and the emitter consumes

use serde::{Deserialize, Serialize};

use crate::piece::{all_values, first_value};
use crate::MetaPiece;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    StaticField,
    Method,
    Enumerator,
}

impl MemberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Field => "field",
            MemberKind::StaticField => "static field",
            MemberKind::Method => "method",
            MemberKind::Enumerator => "enumerator",
        }
    }
}

/// A reflected member. `meta` is always present, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    pub name: String,
    pub kind: MemberKind,
    #[serde(default)]
    pub meta: Vec<MetaPiece>,
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>, kind: MemberKind, meta: Vec<MetaPiece>) -> Self {
        Self {
            name: name.into(),
            kind,
            meta,
        }
    }

    pub fn meta_value(&self, key: &str) -> Option<&str> {
        first_value(&self.meta, key)
    }

    pub fn meta_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        all_values(&self.meta, key)
    }
}

/// Members of a class or of an enum, never both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeBody {
    Class {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        fields: Vec<MemberDescriptor>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        static_fields: Vec<MemberDescriptor>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        methods: Vec<MemberDescriptor>,
    },
    Enum {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        enumerators: Vec<MemberDescriptor>,
    },
}

impl TypeBody {
    pub fn class() -> Self {
        TypeBody::Class {
            fields: Vec::new(),
            static_fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn enumeration() -> Self {
        TypeBody::Enum {
            enumerators: Vec::new(),
        }
    }
}

/// Reflection descriptor of one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Fully qualified name, e.g. `app::ui::Widget`
    pub qualified_name: String,
    #[serde(default)]
    pub meta: Vec<MetaPiece>,
    #[serde(flatten)]
    pub body: TypeBody,
}

impl TypeDescriptor {
    pub fn new(qualified_name: impl Into<String>, meta: Vec<MetaPiece>, body: TypeBody) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            meta,
            body,
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.body, TypeBody::Enum { .. })
    }

    /// Last path segment of the qualified name
    pub fn simple_name(&self) -> &str {
        self.qualified_name
            .rsplit("::")
            .next()
            .unwrap_or(&self.qualified_name)
    }

    pub fn fields(&self) -> &[MemberDescriptor] {
        self.members(MemberKind::Field)
    }

    pub fn static_fields(&self) -> &[MemberDescriptor] {
        self.members(MemberKind::StaticField)
    }

    pub fn methods(&self) -> &[MemberDescriptor] {
        self.members(MemberKind::Method)
    }

    pub fn enumerators(&self) -> &[MemberDescriptor] {
        self.members(MemberKind::Enumerator)
    }

    /// Members of one kind; empty when the body has no such category
    pub fn members(&self, kind: MemberKind) -> &[MemberDescriptor] {
        match (&self.body, kind) {
            (TypeBody::Class { fields, .. }, MemberKind::Field) => fields,
            (TypeBody::Class { static_fields, .. }, MemberKind::StaticField) => static_fields,
            (TypeBody::Class { methods, .. }, MemberKind::Method) => methods,
            (TypeBody::Enum { enumerators }, MemberKind::Enumerator) => enumerators,
            _ => &[],
        }
    }

    /// Mutable member list for `kind`, or `None` if the body cannot hold it
    pub fn members_mut(&mut self, kind: MemberKind) -> Option<&mut Vec<MemberDescriptor>> {
        match (&mut self.body, kind) {
            (TypeBody::Class { fields, .. }, MemberKind::Field) => Some(fields),
            (TypeBody::Class { static_fields, .. }, MemberKind::StaticField) => Some(static_fields),
            (TypeBody::Class { methods, .. }, MemberKind::Method) => Some(methods),
            (TypeBody::Enum { enumerators }, MemberKind::Enumerator) => Some(enumerators),
            _ => None,
        }
    }

    pub fn member(&self, kind: MemberKind, name: &str) -> Option<&MemberDescriptor> {
        self.members(kind).iter().find(|member| member.name == name)
    }

    pub fn meta_value(&self, key: &str) -> Option<&str> {
        first_value(&self.meta, key)
    }

    pub fn meta_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        all_values(&self.meta, key)
    }
}

/// Everything generated from one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Source file name as given to the generator
    pub source: String,
    /// SHA-256 of the source bytes, recorded for hash-based gating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
}

impl Artifact {
    pub fn new(source: &str, types: Vec<TypeDescriptor>) -> Self {
        Self {
            source: source.to_string(),
            source_hash: None,
            types,
        }
    }

    pub fn with_source_hash(mut self, hash: impl Into<String>) -> Self {
        self.source_hash = Some(hash.into());
        self
    }

    pub fn get(&self, qualified_name: &str) -> Option<&TypeDescriptor> {
        self.types.iter().find(|ty| ty.qualified_name == qualified_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> TypeDescriptor {
        let mut ty = TypeDescriptor::new(
            "app::Widget",
            vec![MetaPiece::marker("refl")],
            TypeBody::class(),
        );
        if let Some(fields) = ty.members_mut(MemberKind::Field) {
            fields.push(MemberDescriptor::new(
                "count",
                MemberKind::Field,
                vec![MetaPiece::new("doc", "item count")],
            ));
        }
        ty
    }

    #[test]
    fn test_absent_categories_are_not_serialized() {
        let json = serde_json::to_value(widget()).unwrap();
        assert_eq!(json["kind"], "class");
        assert!(json.get("fields").is_some());
        assert!(json.get("static_fields").is_none());
        assert!(json.get("methods").is_none());
    }

    #[test]
    fn test_empty_member_meta_is_serialized() {
        let member = MemberDescriptor::new("x", MemberKind::Field, vec![]);
        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["meta"], serde_json::json!([]));
    }

    #[test]
    fn test_queries() {
        let ty = widget();
        assert_eq!(ty.simple_name(), "Widget");
        assert_eq!(ty.meta_value("refl"), Some("null"));
        assert_eq!(
            ty.member(MemberKind::Field, "count").and_then(|m| m.meta_value("doc")),
            Some("item count")
        );
        assert!(ty.enumerators().is_empty());
        assert!(TypeDescriptor::new("E", vec![], TypeBody::enumeration())
            .members_mut(MemberKind::Field)
            .is_none());
    }

    #[test]
    fn test_enum_body_deserializes() {
        let json = r#"{
            "qualified_name": "Color",
            "meta": [],
            "kind": "enum",
            "enumerators": [
                { "name": "RED", "kind": "enumerator", "meta": [] }
            ]
        }"#;
        let ty: TypeDescriptor = serde_json::from_str(json).unwrap();
        assert!(ty.is_enum());
        assert_eq!(ty.enumerators()[0].name, "RED");
    }
}
