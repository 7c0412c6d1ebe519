//! reflgen - static reflection metadata generator
//!
//! This is the root workspace crate. It ties the member crates into the
//! parse, walk and emit pipeline used by the `reflgen` binary and by the
//! integration tests.

// Re-export main crates for convenience
pub use reflgen_ast as ast;
pub use reflgen_codegen as codegen;
pub use reflgen_meta as meta;
pub use reflgen_parser as parser;
pub use reflgen_walker as walker;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info};
use reflgen_codegen::{
    check_freshness, render, render_with, source_hash, write_artifact, CodegenError, CppOptions,
    GateMode, OutputFormat,
};
use reflgen_meta::Artifact;
use reflgen_parser::{source_for, CompileConfig, HeaderParser, ParseOptions, SourceError};
use reflgen_walker::{walk, WalkError, WalkOptions};
use thiserror::Error;

/// Errors from the whole parse -> walk -> emit pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("{}", describe_walk_errors(.0))]
    Walk(Vec<WalkError>),

    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

fn describe_walk_errors(errors: &[WalkError]) -> String {
    match errors {
        [] => "walk failed".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

/// Everything needed to generate one artifact
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub input: PathBuf,
    /// Artifact path; `None` renders to a string and skips the gate
    pub output: Option<PathBuf>,
    pub config: CompileConfig,
    pub fatal_errors: bool,
    pub walk: WalkOptions,
    pub format: OutputFormat,
    pub cpp: CppOptions,
    pub gate: GateMode,
    /// Regenerate even when the artifact is fresh
    pub force: bool,
}

impl GenerateRequest {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }
}

#[derive(Debug)]
pub enum GenerateOutcome {
    /// The artifact was fresh; nothing was written
    Skipped { path: PathBuf },
    Written {
        path: PathBuf,
        types: usize,
        diagnostics: Vec<WalkError>,
        elapsed: Duration,
    },
    Rendered {
        text: String,
        types: usize,
        diagnostics: Vec<WalkError>,
        elapsed: Duration,
    },
}

/// Generate the artifact for one source file.
///
/// With an output path the regeneration gate runs first, and the file is
/// only opened once rendering has succeeded.
pub fn generate(request: &GenerateRequest) -> Result<GenerateOutcome, PipelineError> {
    let input = &request.input;
    if input.as_os_str().is_empty() || !input.exists() {
        return Err(PipelineError::MissingInput {
            path: input.clone(),
        });
    }

    if let Some(output) = &request.output {
        if !request.force && check_freshness(input, output, request.gate)?.is_up_to_date() {
            info!("{} is up to date", output.display());
            return Ok(GenerateOutcome::Skipped {
                path: output.clone(),
            });
        }
    }

    let started = Instant::now();
    let unit = source_for(input, &request.config, request.fatal_errors).load(input)?;
    debug!("declaration tree for {}: {:#?}", input.display(), unit);

    let result = walk(&unit, &request.walk).map_err(PipelineError::Walk)?;
    let types = result.types.len();
    let mut artifact = Artifact::new(&source_name(input), result.types);
    if request.gate == GateMode::ContentHash {
        let bytes = fs::read(input).map_err(|source| SourceError::Read {
            path: input.clone(),
            source,
        })?;
        artifact = artifact.with_source_hash(source_hash(&bytes));
    }

    let text = render_with(request.format, &artifact, &request.cpp)?;

    match &request.output {
        Some(path) => {
            write_artifact(path, &text)?;
            Ok(GenerateOutcome::Written {
                path: path.clone(),
                types,
                diagnostics: result.diagnostics,
                elapsed: started.elapsed(),
            })
        }
        None => Ok(GenerateOutcome::Rendered {
            text,
            types,
            diagnostics: result.diagnostics,
            elapsed: started.elapsed(),
        }),
    }
}

/// Parse header text, walk it and render the artifact in one call.
///
/// `source_name` only appears in the artifact header.
pub fn generate_from_str(
    source_name: &str,
    text: &str,
    walk_options: &WalkOptions,
    format: OutputFormat,
) -> Result<String, PipelineError> {
    let unit = HeaderParser::new(ParseOptions::default())
        .parse_str(text)
        .map_err(SourceError::from)?;
    let result = walk(&unit, walk_options).map_err(PipelineError::Walk)?;
    let artifact = Artifact::new(source_name, result.types);
    Ok(render(format, &artifact)?)
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
