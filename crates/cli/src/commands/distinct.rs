//! Distinct Command
//!
//! Strips assertions shared between several captured states so each one
//! keeps only what tells it apart.

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};

use pagestate_assertions::{assertion_count, remove_asserts_shared_between_states, SessionAssertions};

use crate::output::{print_success, render_structured, OutputFormat};

#[derive(Args)]
pub struct DistinctArgs {
    /// State files to compare (at least two)
    #[arg(required = true, num_args = 2..)]
    pub states: Vec<PathBuf>,

    /// Write each stripped state to `<dir>/<name>.distinct.json`
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

/// A stripped state and where it came from
#[derive(Debug, Serialize)]
pub struct DistinctState {
    pub source: String,
    pub state: SessionAssertions,
}

pub fn distinct_states(paths: &[PathBuf]) -> Result<Vec<DistinctState>> {
    let mut states = paths
        .iter()
        .map(|path| super::read_state(path))
        .collect::<Result<Vec<_>>>()?;

    remove_asserts_shared_between_states(&mut states);

    Ok(paths
        .iter()
        .zip(states)
        .map(|(path, state)| DistinctState {
            source: path.display().to_string(),
            state,
        })
        .collect())
}

fn distinct_path(dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "state".to_string());
    dir.join(format!("{}.distinct.json", stem))
}

pub fn execute(args: DistinctArgs, format: OutputFormat) -> Result<()> {
    if args.states.len() < 2 {
        bail!("At least two state files are required");
    }

    let distinct = distinct_states(&args.states)?;

    if let Some(dir) = &args.output_dir {
        for (source, entry) in args.states.iter().zip(&distinct) {
            let path = distinct_path(dir, source);
            super::write_state(&path, &entry.state)?;
            print_success(&format!("{} -> {}", entry.source, path.display()));
        }
    }

    if let Some(rendered) = render_structured(&distinct, format) {
        println!("{}", rendered);
        return Ok(());
    }

    for entry in &distinct {
        println!(
            "== {} ({} distinct assertion(s))",
            entry.source,
            assertion_count(&entry.state)
        );
        println!("{}", super::render_state(&entry.state, format));
    }
    Ok(())
}
