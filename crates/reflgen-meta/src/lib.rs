//! reflgen Meta - Reflection metadata model
//!
//! - [`MetaPiece`] and the descriptors built from them
//! - [`parse_annotation`], turning raw annotation text into pieces
//! - [`Registry`], lookup of generated descriptors by qualified name
//!
//! Metadata is never interpreted here: keys and values are opaque strings
//! kept in declaration order, duplicates included.

mod descriptor;
mod error;
mod parse;
mod piece;
pub mod registry;

pub use descriptor::*;
pub use error::*;
pub use parse::{parse_annotation, parse_attribute_text, parse_doc_text, unescape};
pub use piece::*;
pub use registry::{lookup, register_global, Registry};
