//! CLI Commands

pub mod check;
pub mod consensus;
pub mod distinct;
pub mod sessions;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::Path;

use pagestate_assertions::recording::load_dir;
use pagestate_assertions::{SessionAssertions, SharedAssertionStore};

use crate::output::{render_rows, render_structured, OutputFormat, TableDisplay};

/// Load every recording under `dir` into a fresh store
pub async fn load_store(dir: &Path) -> Result<SharedAssertionStore> {
    if !dir.is_dir() {
        bail!("Recordings directory not found: {}", dir.display());
    }

    let store = SharedAssertionStore::new();
    load_dir(dir, &store)
        .await
        .with_context(|| format!("Failed to load recordings from {}", dir.display()))?;
    Ok(store)
}

/// Read a state file (JSON or YAML)
pub fn read_state(path: &Path) -> Result<SessionAssertions> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file {}", path.display()))?;
    let state = serde_yaml::from_str(&content)
        .with_context(|| format!("Invalid state file {}", path.display()))?;
    Ok(state)
}

/// Write a state as pretty JSON
pub fn write_state(path: &Path, state: &SessionAssertions) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(state)?)?;
    Ok(())
}

/// One assertion of a state, flattened for display
#[derive(Debug, Serialize)]
pub struct AssertionRow {
    pub frame_id: String,
    pub key: String,
    pub comparison: String,
    pub result: String,
}

impl TableDisplay for AssertionRow {
    fn headers() -> Vec<&'static str> {
        vec!["Frame", "Key", "Cmp", "Result"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.frame_id.clone(),
            self.key.clone(),
            self.comparison.clone(),
            self.result.clone(),
        ]
    }
}

pub fn state_rows(state: &SessionAssertions) -> Vec<AssertionRow> {
    state
        .iter()
        .flat_map(|(frame_id, frame)| {
            frame.iter().map(move |(key, assertion)| AssertionRow {
                frame_id: frame_id.clone(),
                key: key.clone(),
                comparison: assertion.comparison.to_string(),
                result: assertion.result.to_string(),
            })
        })
        .collect()
}

/// Render a state: the state itself for JSON/YAML, one row per assertion otherwise
pub fn render_state(state: &SessionAssertions, format: OutputFormat) -> String {
    if let Some(rendered) = render_structured(state, format) {
        return rendered;
    }

    let rows = state_rows(state);
    if rows.is_empty() {
        return "No assertions.".to_string();
    }
    render_rows(&rows, format)
}
