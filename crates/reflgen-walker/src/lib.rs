//! reflgen Walker - Declaration tree to reflection descriptors
//!
//! Selects annotated types, classifies their members and parses the
//! attached metadata:
//! - Fields, static fields and methods of classes, structs and unions
//! - Enumerators of enums
//! - Nested types, flattened into the same ordered list
//!
//! # Example
//!
//! ```ignore
//! use reflgen_parser::HeaderParser;
//! use reflgen_walker::{walk, WalkOptions};
//!
//! let unit = HeaderParser::default()
//!     .parse_str(r#"struct [[refl]] Widget { int count; };"#)
//!     .unwrap();
//! let result = walk(&unit, &WalkOptions::default()).unwrap();
//! assert_eq!(result.types[0].qualified_name, "Widget");
//! ```

mod error;
mod walker;

pub use error::WalkError;

use reflgen_ast::TranslationUnit;
use reflgen_meta::TypeDescriptor;
use walker::DeclWalker;

/// Key of the single piece kept for malformed text under [`MalformedPolicy::Opaque`]
pub const RAW_META_KEY: &str = "__raw";

/// Which members of a selected type are reflected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemberFilter {
    #[default]
    All,
    /// Only members carrying an annotation
    Annotated,
}

/// What malformed annotation text contributes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Nothing
    #[default]
    Empty,
    /// One `("__raw", text)` piece holding the trimmed text
    Opaque,
}

/// Metadata key that selects a type by default
pub const DEFAULT_TYPE_MARKER: &str = "refl";

#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// A type is selected only if its metadata has this key. `None`
    /// selects every type carrying an attribute or `@tag`, including
    /// standard attributes such as `[[nodiscard]]`.
    pub type_marker: Option<String>,
    pub member_filter: MemberFilter,
    /// Skip protected and private members
    pub public_only: bool,
    pub malformed: MalformedPolicy,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            type_marker: Some(DEFAULT_TYPE_MARKER.to_string()),
            member_filter: MemberFilter::default(),
            public_only: false,
            malformed: MalformedPolicy::default(),
        }
    }
}

/// Descriptors plus soft diagnostics
#[derive(Debug)]
pub struct WalkResult {
    pub types: Vec<TypeDescriptor>,
    pub diagnostics: Vec<WalkError>,
}

/// Walk a translation unit
///
/// # Returns
/// * `Ok(WalkResult)` - Descriptors in pre-order, with soft diagnostics
/// * `Err(Vec<WalkError>)` - Hard errors; nothing should be emitted
pub fn walk(unit: &TranslationUnit, options: &WalkOptions) -> Result<WalkResult, Vec<WalkError>> {
    let mut walker = DeclWalker::new(options);
    walker.walk_entities(&unit.entities, "");
    let (types, errors) = walker.finish();

    let (hard, diagnostics): (Vec<_>, Vec<_>) = errors.into_iter().partition(|e| e.is_hard_error());
    if !hard.is_empty() {
        return Err(hard);
    }

    Ok(WalkResult { types, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflgen_meta::{MemberKind, MetaPiece};
    use reflgen_parser::HeaderParser;

    fn walk_source(source: &str, options: &WalkOptions) -> Result<WalkResult, Vec<WalkError>> {
        let unit = HeaderParser::default().parse_str(source).unwrap();
        walk(&unit, options)
    }

    fn walk_default(source: &str) -> WalkResult {
        let result = walk_source(source, &WalkOptions::default());
        assert!(result.is_ok(), "Walk failed: {:?}", result.err());
        result.unwrap()
    }

    fn names(result: &WalkResult) -> Vec<&str> {
        result.types.iter().map(|t| t.qualified_name.as_str()).collect()
    }

    #[test]
    fn test_widget_scenario() {
        let result = walk_default(
            r#"struct [[refl]] Widget {
                [[ {"doc":"item count"} ]] int count;
            };"#,
        );
        assert_eq!(result.types.len(), 1);
        let widget = &result.types[0];
        assert_eq!(widget.qualified_name, "Widget");
        assert_eq!(widget.fields().len(), 1);
        assert_eq!(widget.fields()[0].meta, vec![MetaPiece::new("doc", "item count")]);
        assert!(widget.methods().is_empty());
        assert!(widget.static_fields().is_empty());
    }

    #[test]
    fn test_color_scenario() {
        let result = walk_default(
            r#"enum class [[refl]] Color {
                RED [[desc("warm")]],
                GREEN [[desc("calm")]],
            };"#,
        );
        let color = &result.types[0];
        assert!(color.is_enum());
        let enumerators: Vec<_> = color
            .enumerators()
            .iter()
            .map(|e| (e.name.as_str(), e.meta_value("desc")))
            .collect();
        assert_eq!(enumerators, vec![("RED", Some("warm")), ("GREEN", Some("calm"))]);
    }

    #[test]
    fn test_declaration_order_and_empty_meta() {
        let result = walk_default(
            r#"struct [[refl]] S {
                int c;
                [[meta("b")]] int b;
                int a;
                static int s;
                void run();
            };"#,
        );
        let s = &result.types[0];
        let fields: Vec<_> = s.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["c", "b", "a"]);
        assert!(s.fields()[0].meta.is_empty());
        assert_eq!(s.static_fields()[0].kind, MemberKind::StaticField);
        assert_eq!(s.methods()[0].name, "run");
    }

    #[test]
    fn test_duplicate_keys_are_kept() {
        let result = walk_default(
            r#"struct [[refl]] S {
                [[tag("x"), tag("y")]] int v;
            };"#,
        );
        let values: Vec<_> = result.types[0].fields()[0].meta_values("tag").collect();
        assert_eq!(values, vec!["x", "y"]);
    }

    #[test]
    fn test_nested_types_are_flattened_in_pre_order() {
        let result = walk_default(
            r#"namespace app { namespace {
                struct [[refl]] Outer {
                    struct [[refl]] Inner {
                        enum [[refl]] Mode { On };
                    };
                    int value;
                };
                struct Plain {
                    struct [[refl]] Child {};
                };
                struct [[refl]] Next {};
            } }"#,
        );
        assert_eq!(
            names(&result),
            vec![
                "app::Outer",
                "app::Outer::Inner",
                "app::Outer::Inner::Mode",
                "app::Plain::Child",
                "app::Next",
            ]
        );
        assert_eq!(result.types[0].fields().len(), 1);
    }

    #[test]
    fn test_unselected_declarations_produce_nothing() {
        let result = walk_default(
            r#"struct [[refl]] Forward;
            struct Unannotated { int x; };
            /// Only prose here
            struct Documented { int y; };
            template <typename T> struct [[refl]] Generic { T t; };"#,
        );
        assert!(result.types.is_empty());
    }

    #[test]
    fn test_doc_comment_tags_select_types() {
        let result = walk_default(
            "/// @refl\n/// @doc A widget\nstruct Widget {\n  int count; ///< @doc item count\n};",
        );
        let widget = &result.types[0];
        assert_eq!(widget.meta_value("doc"), Some("A widget"));
        assert_eq!(widget.fields()[0].meta_value("doc"), Some("item count"));
    }

    #[test]
    fn test_special_members_and_overloads() {
        let result = walk_default(
            r#"struct [[refl]] S {
                S();
                ~S();
                S& operator=(const S&);
                [[meta("first")]] void set(int v);
                [[meta("second")]] void set(float v);
            };"#,
        );
        let s = &result.types[0];
        assert_eq!(s.methods().len(), 1);
        assert_eq!(s.methods()[0].meta_value("meta"), Some("first"));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code(), "E-WALK-003");
        assert!(!result.diagnostics[0].is_hard_error());
    }

    #[test]
    fn test_duplicate_qualified_name_is_hard_error() {
        let errors = walk_source(
            r#"namespace a { struct [[refl]] W {}; }
            namespace a { struct [[refl]] W {}; }"#,
            &WalkOptions::default(),
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], WalkError::DuplicateQualifiedName { name, .. } if name == "a::W"));
        assert_eq!(errors[0].code(), "E-WALK-001");
    }

    #[test]
    fn test_malformed_policy() {
        let source = r#"struct [[refl]] S { [[meta("oops)]] int x; int y; };"#;

        let result = walk_default(source);
        let s = &result.types[0];
        assert_eq!(s.fields().len(), 2);
        assert!(s.fields()[0].meta.is_empty());
        assert_eq!(result.diagnostics[0].code(), "E-WALK-002");

        let options = WalkOptions {
            malformed: MalformedPolicy::Opaque,
            ..WalkOptions::default()
        };
        let result = walk_source(source, &options).unwrap();
        assert_eq!(
            result.types[0].fields()[0].meta,
            vec![MetaPiece::new(RAW_META_KEY, r#"meta("oops)"#)]
        );
    }

    #[test]
    fn test_member_filters() {
        let source = r#"class [[refl]] C {
                int hidden;
            public:
                [[meta("x")]] int shown;
                int plain;
                void act();
            };"#;

        let options = WalkOptions {
            public_only: true,
            ..WalkOptions::default()
        };
        let result = walk_source(source, &options).unwrap();
        let fields: Vec<_> = result.types[0].fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["shown", "plain"]);

        let options = WalkOptions {
            member_filter: MemberFilter::Annotated,
            ..WalkOptions::default()
        };
        let result = walk_source(source, &options).unwrap();
        let c = &result.types[0];
        assert_eq!(c.fields().len(), 1);
        assert_eq!(c.fields()[0].name, "shown");
        assert!(c.methods().is_empty());
    }

    #[test]
    fn test_standard_attributes_do_not_select_types() {
        let source = r#"namespace a {
            struct [[deprecated("old")]] Legacy { int x; };
            struct [[nodiscard]] Result { int code; };
            struct [[deprecated("oops]] Broken {};
            struct [[refl, meta("x")]] B {};
            struct [[reflect]] C {};
        }"#;

        let result = walk_default(source);
        assert_eq!(names(&result), vec!["a::B"]);
        // Malformed text on an unselected type is not reported
        assert!(result.diagnostics.is_empty());

        let options = WalkOptions {
            type_marker: Some("reflect".to_string()),
            ..WalkOptions::default()
        };
        assert_eq!(names(&walk_source(source, &options).unwrap()), vec!["a::C"]);

        let options = WalkOptions {
            type_marker: None,
            ..WalkOptions::default()
        };
        let result = walk_source(source, &options).unwrap();
        assert_eq!(
            names(&result),
            vec!["a::Legacy", "a::Result", "a::Broken", "a::B", "a::C"]
        );
        assert_eq!(result.diagnostics[0].code(), "E-WALK-002");
    }

    #[test]
    fn test_block_comment_before_first_type() {
        let result = walk_default(
            "/* Copyright header */\nstruct [[refl]] Widget { int count; };\nstruct [[refl]] Other { int a; };",
        );
        assert_eq!(names(&result), vec!["Widget", "Other"]);
    }
}
