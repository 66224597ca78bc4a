//! Session recordings
//!
//! A recording holds the already-evaluated assertions of one session run,
//! as YAML or JSON:
//!
//! ```yaml
//! session_id: run-1
//! assertions:
//!   - frame_id: main
//!     type: count
//!     args: ["li.result"]
//!     result: 12
//!   - frame_id: main
//!     type: url
//!     result: https://example.org/search
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::shared::SharedAssertionStore;
use crate::store::AssertionStore;
use crate::types::{Assertion, FrameId, SessionAssertions, SessionId};

/// Assertions recorded for one session run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub session_id: SessionId,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub assertions: Vec<RecordedAssertion>,
}

/// One assertion and the frame it was observed in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedAssertion {
    /// Accepts numeric frame ids as well as strings
    #[serde(deserialize_with = "frame_id_from_scalar")]
    pub frame_id: FrameId,

    #[serde(flatten)]
    pub assertion: Assertion,
}

fn frame_id_from_scalar<'de, D>(deserializer: D) -> std::result::Result<FrameId, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid frame id: {}", other))),
    }
}

impl Recording {
    /// Parse a recording from a YAML (or JSON) string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let recording: Self = serde_yaml::from_str(yaml)?;
        recording.validate()?;
        Ok(recording)
    }

    /// Parse a recording file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| with_path(path, e))
    }

    /// Load all recordings from a directory, in file name order
    pub fn load_all(dir: &Path) -> Result<Vec<Self>> {
        recording_paths(dir)
            .iter()
            .map(|path| Self::from_file(path))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.session_id.trim().is_empty() {
            return Err(Error::InvalidRecording("session_id must not be empty".to_string()));
        }
        Ok(())
    }

    /// Record every entry into `store`, returning how many were recorded
    pub fn record_into(&self, store: &mut AssertionStore) -> usize {
        for entry in &self.assertions {
            store.record_assertion(&self.session_id, &entry.frame_id, entry.assertion.clone());
        }
        self.assertions.len()
    }

    /// Record every entry through a shared handle
    pub fn record_shared(&self, store: &SharedAssertionStore) -> usize {
        for entry in &self.assertions {
            store.record_assertion(&self.session_id, &entry.frame_id, entry.assertion.clone());
        }
        self.assertions.len()
    }

    /// The recorded assertions as a standalone state
    pub fn to_state(&self) -> SessionAssertions {
        let mut store = AssertionStore::new();
        self.record_into(&mut store);
        store.remove_session(&self.session_id).unwrap_or_default()
    }
}

/// Read every recording under `dir` concurrently and record it into `store`.
///
/// Returns the number of assertions recorded.
pub async fn load_dir(dir: &Path, store: &SharedAssertionStore) -> Result<usize> {
    let paths = recording_paths(dir);
    debug!("Loading {} recording file(s) from {}", paths.len(), dir.display());

    let recordings = futures::future::try_join_all(paths.into_iter().map(read_recording)).await?;

    let mut recorded = 0;
    for recording in &recordings {
        recorded += recording.record_shared(store);
    }

    info!(
        "Recorded {} assertion(s) from {} recording(s)",
        recorded,
        recordings.len()
    );
    Ok(recorded)
}

async fn read_recording(path: PathBuf) -> Result<Recording> {
    let content = tokio::fs::read_to_string(&path).await?;
    Recording::from_yaml(&content).map_err(|e| with_path(&path, e))
}

fn recording_paths(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                warn!(path = %path, error = %e, "Skipping recording entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_recording_file(e.path()))
        .map(|e| e.into_path())
        .collect()
}

fn is_recording_file(path: &Path) -> bool {
    let recognized = path
        .extension()
        .map(|ext| ext == "yaml" || ext == "yml" || ext == "json")
        .unwrap_or(false);
    if !recognized {
        warn!(path = %path.display(), "Skipping recording entry: unrecognized extension");
    }
    recognized
}

fn with_path(path: &Path, error: Error) -> Error {
    match error {
        Error::Io(e) => Error::Io(e),
        other => Error::InvalidRecording(format!("{}: {}", path.display(), other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssertionResult, Comparison};
    use tempfile::TempDir;

    const RUN_1: &str = r#"
session_id: run-1
description: search results page
assertions:
  - frame_id: main
    type: count
    args: ["li.result"]
    result: 12
  - frame_id: 7
    type: url
    result: https://example.org/search
  - frame_id: main
    type: text
    args: ["h1"]
    result: Results
    comparison: "="
"#;

    #[test]
    fn test_parse_recording() {
        let recording = Recording::from_yaml(RUN_1).unwrap();
        assert_eq!(recording.session_id, "run-1");
        assert_eq!(recording.assertions.len(), 3);
        assert_eq!(recording.assertions[1].frame_id, "7");
        assert!(recording.assertions[1].assertion.args.is_none());
        assert_eq!(
            recording.assertions[0].assertion.result,
            AssertionResult::Number(12.0)
        );
        assert_eq!(recording.assertions[2].assertion.comparison, Comparison::Equal);
    }

    #[test]
    fn test_parse_json_recording() {
        let json = r#"{"session_id": "run-2", "assertions": [
            {"frame_id": "main", "type": "count", "args": ["li.result"], "result": 9}
        ]}"#;
        let recording = Recording::from_yaml(json).unwrap();
        assert_eq!(recording.assertions[0].assertion.query_key(), r#"count:["li.result"]"#);
    }

    #[test]
    fn test_empty_session_id_rejected() {
        let err = Recording::from_yaml("session_id: ''\nassertions: []\n").unwrap_err();
        assert!(matches!(err, Error::InvalidRecording(_)));
    }

    #[test]
    fn test_record_into_store() {
        let recording = Recording::from_yaml(RUN_1).unwrap();
        let mut store = AssertionStore::new();

        assert_eq!(recording.record_into(&mut store), 3);
        assert_eq!(store.session_assertions_count("run-1"), 3);
        assert!(store.session_assertion_with_query("run-1", "7", "url:").is_some());
    }

    #[test]
    fn test_to_state() {
        let state = Recording::from_yaml(RUN_1).unwrap().to_state();
        assert_eq!(state.len(), 2);
        assert_eq!(state["main"].len(), 2);
    }

    #[test]
    fn test_load_all_sorted() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("b.yaml"), RUN_1).unwrap();
        std::fs::write(
            tmp.path().join("a.json"),
            r#"{"session_id": "run-0", "assertions": []}"#,
        )
        .unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let recordings = Recording::load_all(tmp.path()).unwrap();
        let ids: Vec<_> = recordings.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids, vec!["run-0", "run-1"]);
    }

    #[tokio::test]
    async fn test_load_dir_into_shared_store() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("run-1.yaml"), RUN_1).unwrap();
        std::fs::write(
            tmp.path().join("run-2.yaml"),
            RUN_1.replace("run-1", "run-2").replace("12", "10"),
        )
        .unwrap();

        let shared = SharedAssertionStore::new();
        let recorded = load_dir(tmp.path(), &shared).await.unwrap();
        assert_eq!(recorded, 6);

        let consensus = shared.common_session_assertions(["run-1", "run-2"], None);
        let count = &consensus["main"][r#"count:["li.result"]"#];
        assert_eq!(count.result, AssertionResult::Number(10.0));
        assert_eq!(count.comparison, Comparison::AtLeast);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_load_dir_follows_symlinked_recordings() {
        let tmp = TempDir::new().unwrap();
        let real = tmp.path().join("real");
        let dir = tmp.path().join("recordings");
        std::fs::create_dir_all(&real).unwrap();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(real.join("run-1.yaml"), RUN_1).unwrap();
        std::os::unix::fs::symlink(real.join("run-1.yaml"), dir.join("run-1.yaml")).unwrap();

        let shared = SharedAssertionStore::new();
        let recorded = load_dir(&dir, &shared).await.unwrap();
        assert_eq!(recorded, 3);
        assert_eq!(shared.session_ids(), vec!["run-1"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_skipped() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("run-1.yaml"), RUN_1).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone.yaml"), tmp.path().join("run-2.yaml")).unwrap();

        let recordings = Recording::load_all(tmp.path()).unwrap();
        assert_eq!(recordings.len(), 1);
        assert_eq!(recordings[0].session_id, "run-1");
    }

    #[tokio::test]
    async fn test_load_dir_reports_bad_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("broken.yaml"), "session_id: [").unwrap();

        let err = load_dir(tmp.path(), &SharedAssertionStore::new()).await.unwrap_err();
        match err {
            Error::InvalidRecording(msg) => assert!(msg.contains("broken.yaml")),
            other => panic!("unexpected error: {}", other),
        }
    }
}
