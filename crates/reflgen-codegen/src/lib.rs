//! reflgen Codegen - Artifact emission
//!
//! Renders an [`Artifact`] as a C++ header of `ClassInfo`/`EnumInfo`
//! specializations or as JSON, and decides whether an existing artifact
//! needs regenerating.

mod artifact;
mod cpp;
mod json;

pub use artifact::*;
pub use cpp::{render_cpp, CppOptions, DEFAULT_ENUM_ACCESSOR};
pub use json::render_json;

use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use reflgen_meta::Artifact;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("failed to write '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to read '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to serialize artifact: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("source file not found: {}", path.display())]
    MissingSource { path: PathBuf },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// C++ header with `ClassInfo`/`EnumInfo` specializations
    #[default]
    Cpp,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpp" | "hxx" | "c++" => Ok(OutputFormat::Cpp),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}' (expected cpp or json)", other)),
        }
    }
}

/// Render with default C++ options
pub fn render(format: OutputFormat, artifact: &Artifact) -> Result<String, CodegenError> {
    render_with(format, artifact, &CppOptions::default())
}

pub fn render_with(
    format: OutputFormat,
    artifact: &Artifact,
    cpp: &CppOptions,
) -> Result<String, CodegenError> {
    match format {
        OutputFormat::Cpp => Ok(render_cpp(artifact, cpp)),
        OutputFormat::Json => render_json(artifact),
    }
}
