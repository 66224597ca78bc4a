//! Check Command

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use pagestate_assertions::matcher::AssertionMismatch;
use pagestate_assertions::{match_state, MatchReport, Recording};

use crate::output::{print_list, render_structured, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct CheckArgs {
    /// Expected state file (e.g. a consensus)
    #[arg(short, long)]
    pub expected: PathBuf,

    /// Recording of the observed page
    #[arg(short, long)]
    pub observed: PathBuf,

    /// Passing assertions required for a match (overrides config)
    #[arg(long)]
    pub min_valid: Option<usize>,
}

/// A failing or missing assertion for display
#[derive(Debug, Serialize)]
pub struct ProblemDisplay {
    pub status: String,
    pub frame_id: String,
    pub key: String,
    pub expected: String,
    pub observed: String,
}

impl From<&AssertionMismatch> for ProblemDisplay {
    fn from(m: &AssertionMismatch) -> Self {
        Self {
            status: "failed".to_string(),
            frame_id: m.frame_id.clone(),
            key: m.key.clone(),
            expected: format!("{} {}", m.comparison, m.expected),
            observed: m.observed.to_string(),
        }
    }
}

impl TableDisplay for ProblemDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Status", "Frame", "Key", "Expected", "Observed"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.status.clone(),
            self.frame_id.clone(),
            self.key.clone(),
            self.expected.clone(),
            self.observed.clone(),
        ]
    }
}

pub fn problems(report: &MatchReport) -> Vec<ProblemDisplay> {
    let mut rows: Vec<ProblemDisplay> = report.failed.iter().map(ProblemDisplay::from).collect();
    rows.extend(report.missing.iter().map(|(frame_id, key)| ProblemDisplay {
        status: "missing".to_string(),
        frame_id: frame_id.clone(),
        key: key.clone(),
        expected: String::new(),
        observed: String::new(),
    }));
    rows
}

/// Returns whether the observed page matched
pub fn execute(args: CheckArgs, config_min_valid: Option<usize>, format: OutputFormat) -> Result<bool> {
    let expected = super::read_state(&args.expected)?;
    let observed = Recording::from_file(&args.observed)?.to_state();

    let report = match_state(&expected, &observed);
    let min_valid = args.min_valid.or(config_min_valid);
    let matched = report.is_match(min_valid);

    if let Some(rendered) = render_structured(&report, format) {
        println!("{}", rendered);
        return Ok(matched);
    }

    let rows = problems(&report);
    if !rows.is_empty() {
        print_list(&rows, format);
    }

    let verdict = if matched { "MATCH".green().bold() } else { "NO MATCH".red().bold() };
    println!(
        "{}: {} passed, {} failed, {} missing of {}",
        verdict,
        report.passed,
        report.failed.len(),
        report.missing.len(),
        report.total()
    );
    Ok(matched)
}
