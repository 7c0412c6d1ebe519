//! Lookup of reflected types by qualified name
//!
//! A [`Registry`] is filled from generated JSON artifacts or from
//! descriptors directly. One process-wide instance is available through
//! [`global`].

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::{Artifact, RegistryError, TypeDescriptor};

/// Types in registration order, indexed by qualified name
#[derive(Debug, Default)]
pub struct Registry {
    types: Vec<Arc<TypeDescriptor>>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor; a second registration of the same name fails
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<Arc<TypeDescriptor>, RegistryError> {
        if self.by_name.contains_key(&descriptor.qualified_name) {
            return Err(RegistryError::Duplicate {
                name: descriptor.qualified_name,
            });
        }

        let descriptor = Arc::new(descriptor);
        self.by_name
            .insert(descriptor.qualified_name.clone(), self.types.len());
        self.types.push(Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Register every type of a JSON artifact.
    ///
    /// Either all types are registered or none are. Returns the number of
    /// types added.
    pub fn register_artifact(&mut self, json: &str) -> Result<usize, RegistryError> {
        let artifact: Artifact = serde_json::from_str(json)?;

        let mut incoming = std::collections::HashSet::new();
        for ty in &artifact.types {
            if self.contains(&ty.qualified_name) || !incoming.insert(ty.qualified_name.as_str()) {
                return Err(RegistryError::Duplicate {
                    name: ty.qualified_name.clone(),
                });
            }
        }

        let count = artifact.types.len();
        debug!("registering {} types from {}", count, artifact.source);
        for ty in artifact.types {
            self.register(ty)?;
        }
        Ok(count)
    }

    pub fn get(&self, qualified_name: &str) -> Option<&Arc<TypeDescriptor>> {
        self.by_name
            .get(qualified_name)
            .and_then(|&index| self.types.get(index))
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.by_name.contains_key(qualified_name)
    }

    /// Types in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeDescriptor>> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

static GLOBAL: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::new()));

/// The process-wide registry
pub fn global() -> &'static RwLock<Registry> {
    &GLOBAL
}

pub fn register_global(descriptor: TypeDescriptor) -> Result<Arc<TypeDescriptor>, RegistryError> {
    GLOBAL.write().register(descriptor)
}

/// Look a type up in the process-wide registry
pub fn lookup(qualified_name: &str) -> Option<Arc<TypeDescriptor>> {
    GLOBAL.read().get(qualified_name).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MetaPiece, TypeBody};

    fn descriptor(name: &str) -> TypeDescriptor {
        TypeDescriptor::new(name, vec![MetaPiece::marker("refl")], TypeBody::class())
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = Registry::new();
        registry.register(descriptor("a::First")).unwrap();
        registry.register(descriptor("a::Second")).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("a::First").is_some());
        assert!(registry.get("First").is_none());
        let names: Vec<_> = registry.iter().map(|t| t.qualified_name.as_str()).collect();
        assert_eq!(names, vec!["a::First", "a::Second"]);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = Registry::new();
        registry.register(descriptor("Widget")).unwrap();
        let err = registry.register(descriptor("Widget")).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { name } if name == "Widget"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_artifact_is_all_or_nothing() {
        let mut registry = Registry::new();
        registry.register(descriptor("Taken")).unwrap();

        let json = r#"{
            "source": "x.hpp",
            "types": [
                { "qualified_name": "Fresh", "meta": [], "kind": "class" },
                { "qualified_name": "Taken", "meta": [], "kind": "class" }
            ]
        }"#;
        assert!(registry.register_artifact(json).is_err());
        assert!(!registry.contains("Fresh"));

        let ok = r#"{ "source": "y.hpp", "types": [
            { "qualified_name": "Color", "meta": [], "kind": "enum" }
        ] }"#;
        assert_eq!(registry.register_artifact(ok).unwrap(), 1);
        assert!(registry.get("Color").unwrap().is_enum());
    }

    #[test]
    fn test_bad_json_is_load_error() {
        let mut registry = Registry::new();
        let err = registry.register_artifact("{ not json").unwrap_err();
        assert!(matches!(err, RegistryError::Load(_)));
    }

    #[test]
    fn test_global_registry() {
        register_global(descriptor("registry_test::GlobalOnly")).unwrap();
        assert!(lookup("registry_test::GlobalOnly").is_some());
        assert!(register_global(descriptor("registry_test::GlobalOnly")).is_err());
        assert!(global().read().contains("registry_test::GlobalOnly"));
    }
}
