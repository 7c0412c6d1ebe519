//! C++ header emitter
//!
//! Each type becomes a `ClassInfo<T>` or `EnumInfo<T>` specialization
//! holding `constexpr` metadata arrays and tuple accessors built with the
//! `SFIELD_INFO` family of macros from the rule header. Tabs indent.

use reflgen_meta::{Artifact, MemberDescriptor, MemberKind, MetaPiece, TypeDescriptor};

use crate::HASH_MARKER;

/// Accessor returning the enumerators of an `EnumInfo` specialization
pub const DEFAULT_ENUM_ACCESSOR: &str = "all_enumerators";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CppOptions {
    /// Header providing `Meta::MetaPiece`, `ClassInfo` and the field macros
    pub rule_header: String,
    /// Namespace brought in with `using namespace`
    pub namespace: String,
    /// Rule headers written against `all_static_fields` for enums can
    /// select that name here
    pub enum_accessor: String,
}

impl Default for CppOptions {
    fn default() -> Self {
        Self {
            rule_header: "refl.rule.hxx".to_string(),
            namespace: "refl".to_string(),
            enum_accessor: DEFAULT_ENUM_ACCESSOR.to_string(),
        }
    }
}

pub fn render_cpp(artifact: &Artifact, options: &CppOptions) -> String {
    let mut emitter = CppEmitter::new();

    emitter.line(0, &format!("// Generated by reflgen from {}. Do not edit.", artifact.source));
    if let Some(hash) = &artifact.source_hash {
        emitter.line(0, &format!("{}{}", HASH_MARKER, hash));
    }
    emitter.line(0, "#pragma once");
    emitter.line(0, &format!("#include <{}>", options.rule_header));
    emitter.blank();
    emitter.line(0, &format!("using namespace {};", options.namespace));

    for ty in &artifact.types {
        emitter.blank();
        emitter.emit_type(ty, options);
    }

    emitter.out
}

/// One accessor function: name, macro, members
struct Accessor<'a> {
    function: &'a str,
    macro_name: &'static str,
    members: &'a [MemberDescriptor],
}

struct CppEmitter {
    out: String,
}

impl CppEmitter {
    fn new() -> Self {
        Self { out: String::new() }
    }

    fn line(&mut self, indent: usize, text: &str) {
        for _ in 0..indent {
            self.out.push('\t');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn emit_type(&mut self, ty: &TypeDescriptor, options: &CppOptions) {
        let name = &ty.qualified_name;
        let (info, getter) = if ty.is_enum() {
            ("EnumInfo", "GetEnumName")
        } else {
            ("ClassInfo", "GetClassName")
        };

        self.line(0, "template<>");
        self.line(0, &format!("struct {}<{}>", info, name));
        self.line(0, "{");
        self.line(1, &format!("inline static constexpr const char* {}()", getter));
        self.line(1, "{");
        self.line(2, &format!("return {};", c_string(name)));
        self.line(1, "}");
        self.emit_meta_array("meta", &ty.meta);

        let accessors = if ty.is_enum() {
            vec![Accessor {
                function: &options.enum_accessor,
                macro_name: "SENUM_FIELD_INFO",
                members: ty.enumerators(),
            }]
        } else {
            vec![
                Accessor {
                    function: "all_fields",
                    macro_name: "SFIELD_INFO",
                    members: ty.fields(),
                },
                Accessor {
                    function: "all_static_fields",
                    macro_name: "SSTATICFIELD_INFO",
                    members: ty.members(MemberKind::StaticField),
                },
                Accessor {
                    function: "all_methods",
                    macro_name: "SMETHOD_INFO",
                    members: ty.methods(),
                },
            ]
        };

        for accessor in &accessors {
            for member in accessor.members {
                self.blank();
                self.emit_meta_array(&format!("{}_meta", member.name), &member.meta);
            }
        }

        // Empty categories get no accessor at all
        for accessor in accessors.iter().filter(|a| !a.members.is_empty()) {
            self.blank();
            self.emit_accessor(name, accessor);
        }

        self.line(0, "};");
    }

    /// Emitted even when empty, as a zero-length array
    fn emit_meta_array(&mut self, variable: &str, meta: &[MetaPiece]) {
        let declaration = format!(
            "inline static constexpr std::array<Meta::MetaPiece, {}> {} =",
            meta.len(),
            variable
        );

        if meta.is_empty() {
            self.line(1, &format!("{} {{}};", declaration));
            return;
        }

        self.line(1, &declaration);
        self.line(1, "{{");
        for (i, piece) in meta.iter().enumerate() {
            let separator = if i + 1 < meta.len() { "," } else { "" };
            self.line(
                2,
                &format!(
                    "{{{}, {}}}{}",
                    c_string(&piece.key),
                    c_string(&piece.value),
                    separator
                ),
            );
        }
        self.line(1, "}};");
    }

    fn emit_accessor(&mut self, type_name: &str, accessor: &Accessor<'_>) {
        self.line(1, &format!("inline static constexpr auto {}()", accessor.function));
        self.line(1, "{");
        for member in accessor.members {
            self.line(
                2,
                &format!(
                    "{}({}, {}, {}_meta);",
                    accessor.macro_name, member.name, type_name, member.name
                ),
            );
        }
        let infos: Vec<String> = accessor
            .members
            .iter()
            .map(|member| format!("{}_info()", member.name))
            .collect();
        self.line(2, &format!("return hana::make_tuple({});", infos.join(", ")));
        self.line(1, "}");
    }
}

/// Quote and escape text as a C string literal.
///
/// Other control characters use three-digit octal escapes, which cannot
/// run into a following digit the way `\x` escapes do.
fn c_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\{:03o}", c as u32));
            }
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflgen_meta::TypeBody;

    fn member(name: &str, kind: MemberKind, meta: Vec<MetaPiece>) -> MemberDescriptor {
        MemberDescriptor::new(name, kind, meta)
    }

    #[test]
    fn test_widget_header() {
        let widget = TypeDescriptor::new(
            "Widget",
            vec![MetaPiece::marker("refl")],
            TypeBody::Class {
                fields: vec![member(
                    "count",
                    MemberKind::Field,
                    vec![MetaPiece::new("doc", "item count")],
                )],
                static_fields: vec![],
                methods: vec![],
            },
        );
        let text = render_cpp(&Artifact::new("widget.hpp", vec![widget]), &CppOptions::default());

        let expected = "\
// Generated by reflgen from widget.hpp. Do not edit.
#pragma once
#include <refl.rule.hxx>

using namespace refl;

template<>
struct ClassInfo<Widget>
{
\tinline static constexpr const char* GetClassName()
\t{
\t\treturn \"Widget\";
\t}
\tinline static constexpr std::array<Meta::MetaPiece, 1> meta =
\t{{
\t\t{\"refl\", \"null\"}
\t}};

\tinline static constexpr std::array<Meta::MetaPiece, 1> count_meta =
\t{{
\t\t{\"doc\", \"item count\"}
\t}};

\tinline static constexpr auto all_fields()
\t{
\t\tSFIELD_INFO(count, Widget, count_meta);
\t\treturn hana::make_tuple(count_info());
\t}
};
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_empty_meta_is_present_and_empty_categories_absent() {
        let ty = TypeDescriptor::new(
            "ns::S",
            vec![],
            TypeBody::Class {
                fields: vec![],
                static_fields: vec![member("instances", MemberKind::StaticField, vec![])],
                methods: vec![],
            },
        );
        let text = render_cpp(&Artifact::new("s.hpp", vec![ty]), &CppOptions::default());

        assert!(text.contains("std::array<Meta::MetaPiece, 0> meta = {};"));
        assert!(text.contains("std::array<Meta::MetaPiece, 0> instances_meta = {};"));
        assert!(text.contains("SSTATICFIELD_INFO(instances, ns::S, instances_meta);"));
        assert!(!text.contains("all_fields"));
        assert!(!text.contains("all_methods"));
    }

    #[test]
    fn test_enum_specialization() {
        let color = TypeDescriptor::new(
            "Color",
            vec![MetaPiece::marker("refl")],
            TypeBody::Enum {
                enumerators: vec![
                    member("RED", MemberKind::Enumerator, vec![MetaPiece::new("desc", "warm")]),
                    member("GREEN", MemberKind::Enumerator, vec![MetaPiece::new("desc", "calm")]),
                ],
            },
        );
        let text = render_cpp(&Artifact::new("color.hpp", vec![color]), &CppOptions::default());

        assert!(text.contains("struct EnumInfo<Color>"));
        assert!(text.contains("GetEnumName()"));
        let red = text.find("SENUM_FIELD_INFO(RED, Color, RED_meta);").unwrap();
        let green = text.find("SENUM_FIELD_INFO(GREEN, Color, GREEN_meta);").unwrap();
        assert!(red < green);
        assert!(text.contains("return hana::make_tuple(RED_info(), GREEN_info());"));
    }

    #[test]
    fn test_enum_accessor_name_is_configurable() {
        let mode = TypeDescriptor::new(
            "Mode",
            vec![MetaPiece::marker("refl")],
            TypeBody::Enum {
                enumerators: vec![member("On", MemberKind::Enumerator, vec![])],
            },
        );
        let artifact = Artifact::new("mode.hpp", vec![mode]);

        let text = render_cpp(&artifact, &CppOptions::default());
        assert!(text.contains("inline static constexpr auto all_enumerators()"));

        let options = CppOptions {
            enum_accessor: "all_static_fields".to_string(),
            ..CppOptions::default()
        };
        let text = render_cpp(&artifact, &options);
        assert!(text.contains("inline static constexpr auto all_static_fields()"));
        assert!(text.contains("SENUM_FIELD_INFO(On, Mode, On_meta);"));
        assert!(!text.contains("all_enumerators"));
    }

    #[test]
    fn test_options_and_hash_line() {
        let options = CppOptions {
            rule_header: "Sakura/refl.rule.hxx".to_string(),
            namespace: "Sakura::refl".to_string(),
            ..CppOptions::default()
        };
        let artifact = Artifact::new("a.hpp", vec![]).with_source_hash("abc123");
        let text = render_cpp(&artifact, &options);
        assert!(text.contains("#include <Sakura/refl.rule.hxx>"));
        assert!(text.contains("using namespace Sakura::refl;"));
        assert!(text.contains("// reflgen source-hash: abc123\n"));
    }

    #[test]
    fn test_c_string_escapes() {
        assert_eq!(c_string("a\"b\\c\nd\te\r"), r#""a\"b\\c\nd\te\r""#);
        assert_eq!(c_string("\u{1}2"), r#""\0012""#);
        assert_eq!(c_string("Can't"), "\"Can't\"");
    }
}
