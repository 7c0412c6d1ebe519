use serde::{Deserialize, Serialize};

/// Value given to a key that appears without an argument, e.g. `refl`
pub const NULL_VALUE: &str = "null";

/// One `(key, value)` metadata entry. Both sides are opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetaPiece {
    pub key: String,
    pub value: String,
}

impl MetaPiece {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// A bare marker such as `refl`
    pub fn marker(key: impl Into<String>) -> Self {
        Self::new(key, NULL_VALUE)
    }

    pub fn is_marker(&self) -> bool {
        self.value == NULL_VALUE
    }
}

/// First value recorded for `key`
pub fn first_value<'a>(meta: &'a [MetaPiece], key: &str) -> Option<&'a str> {
    meta.iter()
        .find(|piece| piece.key == key)
        .map(|piece| piece.value.as_str())
}

/// Every value recorded for `key`, in declaration order
pub fn all_values<'a>(meta: &'a [MetaPiece], key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    meta.iter()
        .filter(move |piece| piece.key == key)
        .map(|piece| piece.value.as_str())
}
