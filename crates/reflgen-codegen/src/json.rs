use reflgen_meta::Artifact;

use crate::CodegenError;

/// Pretty-printed artifact with a trailing newline
pub fn render_json(artifact: &Artifact) -> Result<String, CodegenError> {
    let mut text = serde_json::to_string_pretty(artifact)?;
    text.push('\n');
    Ok(text)
}
