//! reflgen AST - Declaration tree handed to the reflection walker
//!
//! This crate defines the declaration tree produced by a front-end (the
//! bundled header parser or a JSON dump from another tool), source spans,
//! and the raw annotation text attached to declarations.

mod annotation;
mod decl;
mod span;

pub use annotation::*;
pub use decl::*;
pub use span::*;

use serde::{Deserialize, Serialize};

/// One parsed source file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub span: Span,
}

impl TranslationUnit {
    pub fn new(entities: Vec<Entity>, span: Span) -> Self {
        Self { entities, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_tree_fills_defaults() {
        let json = r#"{
            "entities": [
                { "entity": "class", "name": "Widget", "key": "struct",
                  "annotations": [ { "kind": "attribute", "text": "refl" } ],
                  "members": [ { "member": "field", "name": "count" } ] }
            ]
        }"#;
        let unit: TranslationUnit = serde_json::from_str(json).unwrap();
        let Entity::Class(class) = &unit.entities[0] else {
            panic!("expected class");
        };
        assert!(class.is_definition);
        assert!(!class.is_template);
        assert_eq!(class.members.len(), 1);
        let ClassMember::Field(field) = &class.members[0] else {
            panic!("expected field");
        };
        assert_eq!(field.access, Access::Public);
        assert!(field.annotations.is_empty());
    }
}
