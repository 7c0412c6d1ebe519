//! Declaration sources: where a translation unit comes from

use std::fs;
use std::path::Path;

use log::{debug, warn};
use reflgen_ast::TranslationUnit;

use crate::{CompileConfig, HeaderParser, ParseError, ParseOptions, SourceError};

/// Anything that can produce a declaration tree for a file
pub trait DeclarationSource {
    fn load(&self, path: &Path) -> Result<TranslationUnit, SourceError>;
}

impl DeclarationSource for HeaderParser {
    fn load(&self, path: &Path) -> Result<TranslationUnit, SourceError> {
        let text = read(path)?;
        let expanded = self.expand(&text).into_owned();
        match self.parse(&expanded) {
            Ok(parsed) => {
                for error in &parsed.recovered {
                    warn!("{}", located(path, &expanded, error));
                }
                Ok(parsed.unit)
            }
            Err(error) => Err(SourceError::Parse {
                path: path.to_path_buf(),
                text: expanded,
                error,
            }),
        }
    }
}

/// Loads a declaration tree dumped as JSON by another front-end
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTreeLoader;

impl DeclarationSource for JsonTreeLoader {
    fn load(&self, path: &Path) -> Result<TranslationUnit, SourceError> {
        let text = read(path)?;
        serde_json::from_str(&text).map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Pick a source by file extension: `.json` is a dumped tree, anything
/// else is parsed as a header.
pub fn source_for(path: &Path, config: &CompileConfig, fatal_errors: bool) -> Box<dyn DeclarationSource> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        debug!("loading {} as a JSON declaration tree", path.display());
        Box::new(JsonTreeLoader)
    } else {
        debug!(
            "parsing {} as a header with flags {:?}",
            path.display(),
            config.to_flags()
        );
        Box::new(HeaderParser::new(ParseOptions::from_config(config, fatal_errors)))
    }
}

/// `file:line:col: message` for a recovered error
fn located(path: &Path, text: &str, error: &ParseError) -> String {
    let (line, col) = error.span().line_col(text);
    format!("{}:{}:{}: {}", path.display(), line, col, error)
}

fn read(path: &Path) -> Result<String, SourceError> {
    fs::read_to_string(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })
}
