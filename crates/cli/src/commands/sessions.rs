//! Sessions Command

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use pagestate_assertions::SharedAssertionStore;

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct SessionsArgs {
    /// Recordings directory (defaults to the configured one)
    #[arg(short, long)]
    pub recordings: Option<PathBuf>,
}

/// Session summary for display
#[derive(Debug, Serialize)]
pub struct SessionDisplay {
    pub session_id: String,
    pub frames: usize,
    pub assertions: usize,
}

impl TableDisplay for SessionDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Session", "Frames", "Assertions"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.session_id.clone(),
            self.frames.to_string(),
            self.assertions.to_string(),
        ]
    }
}

pub fn summarize(store: &SharedAssertionStore) -> Vec<SessionDisplay> {
    store
        .session_ids()
        .into_iter()
        .map(|session_id| {
            let frames = store.with_store(|s| s.session(&session_id).map_or(0, |frames| frames.len()));
            let assertions = store.session_assertions_count(&session_id);
            SessionDisplay {
                session_id,
                frames,
                assertions,
            }
        })
        .collect()
}

pub async fn execute(args: SessionsArgs, default_dir: PathBuf, format: OutputFormat) -> Result<()> {
    let dir = args.recordings.unwrap_or(default_dir);
    let store = super::load_store(&dir).await?;
    print_list(&summarize(&store), format);
    Ok(())
}
