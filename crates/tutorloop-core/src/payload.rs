//! Loading raw producer payloads from JSON files.
//!
//! Files are read as untyped JSON; turning them into canonical records is
//! left to [`crate::adapters`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::adapters::adapt_quiz_result;
use crate::error::AdapterError;
use crate::model::QuizAdapterOutput;

/// Read a single JSON payload file.
pub fn read_payload(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read payload file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse JSON: {}", path.display()))
}

/// Recursively load all `.json` payload files under `dir`, sorted by path.
///
/// Files that are not valid JSON are skipped with a warning.
pub fn load_payload_directory(dir: &Path) -> Result<Vec<(PathBuf, Value)>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut payloads = Vec::new();
    collect_payloads(dir, &mut payloads)?;
    payloads.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(payloads)
}

fn collect_payloads(dir: &Path, out: &mut Vec<(PathBuf, Value)>) -> Result<()> {
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();

        if path.is_dir() {
            collect_payloads(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            match read_payload(&path) {
                Ok(value) => out.push((path, value)),
                Err(e) => tracing::warn!("skipping {}: {:#}", path.display(), e),
            }
        }
    }
    Ok(())
}

/// Outcome of validating one quiz payload file.
#[derive(Debug, Clone)]
pub struct QuizFileCheck {
    pub path: PathBuf,
    pub result: Result<QuizAdapterOutput, AdapterError>,
}

/// Load quiz payloads from a file or directory and run each through the
/// adapter.
pub fn check_quiz_payloads(path: &Path) -> Result<Vec<QuizFileCheck>> {
    let payloads = if path.is_dir() {
        load_payload_directory(path)?
    } else {
        vec![(path.to_path_buf(), read_payload(path)?)]
    };

    Ok(payloads
        .into_iter()
        .map(|(path, value)| QuizFileCheck {
            result: adapt_quiz_result(&value),
            path,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_QUIZ: &str = r#"{
        "user_id": "u1",
        "topic_id": "algebra",
        "timestamp": "2025-01-01T00:00:00",
        "difficulty": "easy",
        "questions": [{"is_correct": true}, {"is_correct": false}]
    }"#;

    const EMPTY_QUIZ: &str = r#"{
        "user_id": "u1",
        "topic_id": "algebra",
        "timestamp": "2025-01-01T00:00:00",
        "difficulty": "easy",
        "questions": []
    }"#;

    #[test]
    fn read_single_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.json");
        std::fs::write(&path, VALID_QUIZ).unwrap();

        let value = read_payload(&path).unwrap();
        assert_eq!(value["topic_id"], "algebra");
    }

    #[test]
    fn read_malformed_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(read_payload(&path).is_err());
    }

    #[test]
    fn load_directory_recurses_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("week2")).unwrap();
        std::fs::write(dir.path().join("a.json"), VALID_QUIZ).unwrap();
        std::fs::write(dir.path().join("week2").join("b.json"), EMPTY_QUIZ).unwrap();
        std::fs::write(dir.path().join("broken.json"), "][").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let payloads = load_payload_directory(dir.path()).unwrap();
        assert_eq!(payloads.len(), 2);

        let checks = check_quiz_payloads(dir.path()).unwrap();
        assert_eq!(checks.len(), 2);
        assert!(checks[0].result.is_ok());
        assert!(checks[1].result.is_err());
    }

    #[test]
    fn load_non_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_payload_directory(&dir.path().join("missing")).is_err());
    }
}
