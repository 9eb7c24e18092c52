//! Machine-readable report of a run

use super::outcome::OrchestratorOutcome;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct Report {
    pub result: &'static str,
    pub result_code: i32,
    pub sessions: Vec<ReportEntry>,
}

#[derive(Debug, Serialize)]
pub struct ReportEntry {
    pub name: String,
    pub signatures: Vec<String>,
    pub result: &'static str,
    pub result_code: i32,
    pub args: Vec<String>,
}

impl Report {
    pub fn new(outcome: &OrchestratorOutcome, posargs: &[String]) -> Self {
        let sessions = outcome
            .results
            .iter()
            .map(|result| ReportEntry {
                name: result.session_name.clone(),
                signatures: vec![result.signature.clone()],
                result: result.status.label(),
                result_code: result.status.result_code(),
                args: posargs.to_vec(),
            })
            .collect();

        Self {
            result: if outcome.success() { "success" } else { "failed" },
            result_code: outcome.exit_code(),
            sessions,
        }
    }
}

/// Write the report as pretty JSON
pub async fn write_report(path: &Path, outcome: &OrchestratorOutcome, posargs: &[String]) -> Result<()> {
    let report = Report::new(outcome, posargs);
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
}
