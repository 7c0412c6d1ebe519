//! Traversal of the declaration tree
//!
//! Descriptors are produced in pre-order: a type comes before the types
//! nested in it, and nested types are flattened into the same list.

use std::collections::HashMap;

use log::{debug, info};
use reflgen_ast::{
    has_marker, Access, Annotation, ClassDecl, ClassMember, EnumDecl, Entity, MethodKind, Span,
};
use reflgen_meta::{
    parse_annotation, MemberDescriptor, MemberKind, MetaPiece, TypeBody, TypeDescriptor,
};

use crate::{MalformedPolicy, MemberFilter, WalkError, WalkOptions, RAW_META_KEY};

pub(crate) struct DeclWalker<'o> {
    options: &'o WalkOptions,
    types: Vec<TypeDescriptor>,
    /// Qualified name to the span of its first declaration
    seen: HashMap<String, Span>,
    errors: Vec<WalkError>,
}

impl<'o> DeclWalker<'o> {
    pub(crate) fn new(options: &'o WalkOptions) -> Self {
        Self {
            options,
            types: Vec::new(),
            seen: HashMap::new(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> (Vec<TypeDescriptor>, Vec<WalkError>) {
        (self.types, self.errors)
    }

    pub(crate) fn walk_entities(&mut self, entities: &[Entity], scope: &str) {
        for entity in entities {
            match entity {
                Entity::Namespace(ns) => match &ns.name {
                    Some(name) => {
                        let inner = qualify(scope, name);
                        self.walk_entities(&ns.entities, &inner);
                    }
                    // Anonymous namespaces add nothing to the name
                    None => self.walk_entities(&ns.entities, scope),
                },
                Entity::Class(class) => self.visit_class(class, scope),
                Entity::Enum(decl) => self.visit_enum(decl, scope),
            }
        }
    }

    fn visit_class(&mut self, class: &ClassDecl, scope: &str) {
        let Some(name) = &class.name else {
            debug!("skipping unnamed class in '{}'", scope);
            return;
        };
        let qualified = qualify(scope, name);

        if !class.is_definition {
            debug!("skipping forward declaration of {}", qualified);
            return;
        }
        if class.is_template {
            debug!("skipping class template {}", qualified);
            return;
        }

        if let Some(meta) = self.type_meta(&class.annotations, &qualified) {
            let descriptor = self.describe_class(class, &qualified, meta);
            self.add(descriptor, class.span);
        } else {
            debug!("{} carries no reflection annotation", qualified);
        }

        // Nested types are reflected whether or not the outer type is
        for member in &class.members {
            if let ClassMember::Type(entity) = member {
                self.walk_entities(std::slice::from_ref(entity), &qualified);
            }
        }
    }

    fn describe_class(&mut self, class: &ClassDecl, qualified: &str, meta: Vec<MetaPiece>) -> TypeDescriptor {
        let mut fields = Vec::new();
        let mut static_fields = Vec::new();
        let mut methods: Vec<MemberDescriptor> = Vec::new();

        for member in &class.members {
            match member {
                ClassMember::Field(field) => {
                    if !self.includes(&field.annotations, field.access) {
                        continue;
                    }
                    let target = format!("{}::{}", qualified, field.name);
                    let meta = self.collect_meta(&field.annotations, &target);
                    if field.is_static {
                        static_fields.push(MemberDescriptor::new(&field.name, MemberKind::StaticField, meta));
                    } else {
                        fields.push(MemberDescriptor::new(&field.name, MemberKind::Field, meta));
                    }
                }
                ClassMember::Method(method) => {
                    if method.kind != MethodKind::Regular {
                        debug!("not reflecting {:?} {}::{}", method.kind, qualified, method.name);
                        continue;
                    }
                    if !self.includes(&method.annotations, method.access) {
                        continue;
                    }
                    if methods.iter().any(|m| m.name == method.name) {
                        info!("skipping overload of {}::{}", qualified, method.name);
                        self.errors.push(WalkError::OverloadSkipped {
                            owner: qualified.to_string(),
                            name: method.name.clone(),
                            span: method.span,
                        });
                        continue;
                    }
                    let target = format!("{}::{}", qualified, method.name);
                    let meta = self.collect_meta(&method.annotations, &target);
                    methods.push(MemberDescriptor::new(&method.name, MemberKind::Method, meta));
                }
                ClassMember::Type(_) => {}
            }
        }

        TypeDescriptor::new(
            qualified,
            meta,
            TypeBody::Class {
                fields,
                static_fields,
                methods,
            },
        )
    }

    fn visit_enum(&mut self, decl: &EnumDecl, scope: &str) {
        let Some(name) = &decl.name else {
            debug!("skipping unnamed enum in '{}'", scope);
            return;
        };
        let qualified = qualify(scope, name);

        if !decl.is_definition {
            debug!("skipping opaque enum declaration {}", qualified);
            return;
        }
        let Some(meta) = self.type_meta(&decl.annotations, &qualified) else {
            debug!("{} carries no reflection annotation", qualified);
            return;
        };

        let mut enumerators = Vec::new();
        for enumerator in &decl.enumerators {
            if !self.includes(&enumerator.annotations, Access::Public) {
                continue;
            }
            let target = format!("{}::{}", qualified, enumerator.name);
            let meta = self.collect_meta(&enumerator.annotations, &target);
            enumerators.push(MemberDescriptor::new(&enumerator.name, MemberKind::Enumerator, meta));
        }

        let descriptor = TypeDescriptor::new(qualified, meta, TypeBody::Enum { enumerators });
        self.add(descriptor, decl.span);
    }

    /// Type-level metadata, or `None` when the type is not selected
    fn type_meta(&mut self, annotations: &[Annotation], qualified: &str) -> Option<Vec<MetaPiece>> {
        if !has_marker(annotations) {
            return None;
        }
        let recorded = self.errors.len();
        let meta = self.collect_meta(annotations, qualified);
        if let Some(marker) = &self.options.type_marker {
            if !meta.iter().any(|piece| &piece.key == marker) {
                debug!("{} lacks the '{}' marker", qualified, marker);
                // Unselected types report nothing
                self.errors.truncate(recorded);
                return None;
            }
        }
        Some(meta)
    }

    fn includes(&self, annotations: &[Annotation], access: Access) -> bool {
        if self.options.public_only && access != Access::Public {
            return false;
        }
        match self.options.member_filter {
            MemberFilter::All => true,
            MemberFilter::Annotated => has_marker(annotations),
        }
    }

    /// Parse every annotation in order, recovering from malformed text
    fn collect_meta(&mut self, annotations: &[Annotation], target: &str) -> Vec<MetaPiece> {
        let mut meta = Vec::new();

        for annotation in annotations {
            match parse_annotation(annotation) {
                Ok(pieces) => meta.extend(pieces),
                Err(error) => {
                    info!("malformed metadata on {}: {}", target, error);
                    if self.options.malformed == MalformedPolicy::Opaque {
                        meta.push(MetaPiece::new(RAW_META_KEY, annotation.text.trim()));
                    }
                    self.errors.push(WalkError::MalformedMetadata {
                        target: target.to_string(),
                        error,
                        span: annotation.span,
                    });
                }
            }
        }

        meta
    }

    fn add(&mut self, descriptor: TypeDescriptor, span: Span) {
        if let Some(first) = self.seen.get(&descriptor.qualified_name) {
            self.errors.push(WalkError::DuplicateQualifiedName {
                name: descriptor.qualified_name,
                first: *first,
                second: span,
            });
            return;
        }

        debug!("reflecting {}", descriptor.qualified_name);
        self.seen.insert(descriptor.qualified_name.clone(), span);
        self.types.push(descriptor);
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", scope, name)
    }
}
