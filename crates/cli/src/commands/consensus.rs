//! Consensus Command

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use pagestate_assertions::{assertion_count, state_digest, SessionAssertions, SharedAssertionStore};

use crate::output::{print_info, print_success, OutputFormat};

#[derive(Args)]
pub struct ConsensusArgs {
    /// Session to include, in merge order (repeatable; defaults to all sessions)
    #[arg(short, long = "session")]
    pub sessions: Vec<String>,

    /// State file to start the consensus from
    #[arg(long)]
    pub start: Option<PathBuf>,

    /// Recordings directory (defaults to the configured one)
    #[arg(short, long)]
    pub recordings: Option<PathBuf>,

    /// Write the consensus state to this file as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Requested sessions in merge order, or every recorded one when none are given.
///
/// Fails on a requested session with nothing recorded.
pub fn select_sessions(store: &SharedAssertionStore, requested: Vec<String>) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(store.session_ids());
    }
    for session_id in &requested {
        store.require_session(session_id)?;
    }
    Ok(requested)
}

pub async fn execute(args: ConsensusArgs, default_dir: PathBuf, format: OutputFormat) -> Result<()> {
    let dir = args.recordings.unwrap_or(default_dir);
    let store = super::load_store(&dir).await?;

    let session_ids = select_sessions(&store, args.sessions)?;
    if session_ids.is_empty() {
        bail!("No sessions recorded in {}", dir.display());
    }

    let starting: Option<SessionAssertions> = match &args.start {
        Some(path) => Some(super::read_state(path)?),
        None => None,
    };

    let consensus = store.common_session_assertions(&session_ids, starting.as_ref());
    info!(
        "Consensus of {} session(s) holds {} assertion(s)",
        session_ids.len(),
        assertion_count(&consensus)
    );

    if let Some(path) = &args.output {
        super::write_state(path, &consensus)?;
        print_success(&format!("Consensus written to {}", path.display()));
    }

    println!("{}", super::render_state(&consensus, format));
    if matches!(format, OutputFormat::Table | OutputFormat::Plain) {
        print_info(&format!("Signature: {}", state_digest(&consensus)?));
    }
    Ok(())
}
