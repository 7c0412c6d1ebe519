//! Writing artifacts and deciding whether they need regenerating

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use log::debug;
use sha2::{Digest, Sha256};

use crate::CodegenError;

/// Line prefix recording the source hash in a C++ artifact
pub const HASH_MARKER: &str = "// reflgen source-hash: ";

/// How an existing artifact is judged fresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GateMode {
    /// Artifact modified strictly after the source
    #[default]
    Timestamp,
    /// Artifact records the SHA-256 of the current source bytes
    ContentHash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// No artifact yet
    Missing,
    Stale,
    UpToDate,
}

impl Freshness {
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, Freshness::UpToDate)
    }
}

/// Hex SHA-256 of source bytes
pub fn source_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Check whether `artifact` is fresh with respect to `source`
pub fn check_freshness(source: &Path, artifact: &Path, mode: GateMode) -> Result<Freshness, CodegenError> {
    let source_meta = fs::metadata(source).map_err(|e| missing_or_io(source, e))?;
    let artifact_meta = match fs::metadata(artifact) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Freshness::Missing),
        Err(e) => return Err(io_error(artifact, e)),
    };

    let fresh = match mode {
        GateMode::Timestamp => {
            let source_time = source_meta.modified().map_err(|e| io_error(source, e))?;
            let artifact_time = artifact_meta.modified().map_err(|e| io_error(artifact, e))?;
            artifact_time > source_time
        }
        GateMode::ContentHash => {
            let bytes = fs::read(source).map_err(|e| missing_or_io(source, e))?;
            let text = fs::read_to_string(artifact).map_err(|e| io_error(artifact, e))?;
            recorded_hash(&text).is_some_and(|recorded| recorded == source_hash(&bytes))
        }
    };

    let freshness = if fresh {
        Freshness::UpToDate
    } else {
        Freshness::Stale
    };
    debug!("{} is {:?} ({:?})", artifact.display(), freshness, mode);
    Ok(freshness)
}

/// Source hash stored in an artifact of either format
pub fn recorded_hash(text: &str) -> Option<String> {
    if let Some(hash) = text
        .lines()
        .take_while(|line| line.starts_with("//"))
        .find_map(|line| line.strip_prefix(HASH_MARKER))
    {
        return Some(hash.trim().to_string());
    }

    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value
        .get("source_hash")
        .and_then(|hash| hash.as_str())
        .map(str::to_string)
}

/// Create or truncate `path` and write the rendered artifact
pub fn write_artifact(path: &Path, contents: &str) -> Result<(), CodegenError> {
    let write_error = |source| CodegenError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(write_error)?;
    file.write_all(contents.as_bytes()).map_err(write_error)?;
    file.flush().map_err(write_error)?;
    debug!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

fn missing_or_io(path: &Path, error: io::Error) -> CodegenError {
    if error.kind() == io::ErrorKind::NotFound {
        CodegenError::MissingSource {
            path: path.to_path_buf(),
        }
    } else {
        io_error(path, error)
    }
}

fn io_error(path: &Path, source: io::Error) -> CodegenError {
    CodegenError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn test_timestamp_gate() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("widget.hpp");
        let artifact = dir.path().join("widget.gen.hxx");
        fs::write(&source, "struct [[refl]] Widget {};").unwrap();

        assert_eq!(
            check_freshness(&source, &artifact, GateMode::Timestamp).unwrap(),
            Freshness::Missing
        );

        fs::write(&artifact, "// old").unwrap();
        let now = SystemTime::now();
        set_mtime(&source, now);
        set_mtime(&artifact, now + Duration::from_secs(60));
        assert!(check_freshness(&source, &artifact, GateMode::Timestamp)
            .unwrap()
            .is_up_to_date());

        // Equal times are not newer
        set_mtime(&artifact, now);
        assert_eq!(
            check_freshness(&source, &artifact, GateMode::Timestamp).unwrap(),
            Freshness::Stale
        );
    }

    #[test]
    fn test_content_hash_gate() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("widget.hpp");
        let artifact = dir.path().join("widget.gen.hxx");
        fs::write(&source, "struct [[refl]] Widget {};").unwrap();
        let hash = source_hash(b"struct [[refl]] Widget {};");

        fs::write(&artifact, format!("// header\n{}{}\n#pragma once\n", HASH_MARKER, hash)).unwrap();
        // An older artifact is still fresh when the content matches
        set_mtime(&artifact, SystemTime::now() - Duration::from_secs(3600));
        assert!(check_freshness(&source, &artifact, GateMode::ContentHash)
            .unwrap()
            .is_up_to_date());

        fs::write(&source, "struct [[refl]] Widget { int x; };").unwrap();
        assert_eq!(
            check_freshness(&source, &artifact, GateMode::ContentHash).unwrap(),
            Freshness::Stale
        );
    }

    #[test]
    fn test_recorded_hash_in_json() {
        assert_eq!(
            recorded_hash(r#"{ "source": "a.hpp", "source_hash": "ff00", "types": [] }"#),
            Some("ff00".to_string())
        );
        assert_eq!(recorded_hash("#pragma once\n"), None);
    }

    #[test]
    fn test_missing_source_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_freshness(
            &dir.path().join("nope.hpp"),
            &dir.path().join("nope.gen.hxx"),
            GateMode::Timestamp,
        )
        .unwrap_err();
        assert!(matches!(err, CodegenError::MissingSource { .. }));
    }

    #[test]
    fn test_write_artifact_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_artifact(&path, "a much longer first version").unwrap();
        write_artifact(&path, "short").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "short");

        let err = write_artifact(&dir.path().join("missing/out.json"), "x").unwrap_err();
        assert!(matches!(err, CodegenError::Write { .. }));
    }

    #[test]
    fn test_source_hash_is_sha256_hex() {
        assert_eq!(
            source_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
