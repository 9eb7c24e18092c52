use crate::session::{RunResult, RunStatus};
use colored::*;

/// Aggregate of every run the orchestrator scheduled
#[derive(Debug, Clone, Default)]
pub struct OrchestratorOutcome {
    pub results: Vec<RunResult>,
    /// Set when an interrupt stopped the run
    pub cancelled: bool,
}

impl OrchestratorOutcome {
    /// True iff nothing failed; skipped runs do not count
    pub fn success(&self) -> bool {
        !self.cancelled && !self.results.iter().any(|r| r.status.is_failure())
    }

    pub fn exit_code(&self) -> i32 {
        if self.cancelled {
            130
        } else if self.success() {
            0
        } else {
            1
        }
    }

    pub fn count(&self, label: &str) -> usize {
        self.results
            .iter()
            .filter(|r| r.status.label() == label)
            .count()
    }

    /// One line per run, e.g. `* tests-3.10: success`
    pub fn render_summary(&self) -> String {
        let mut lines = Vec::with_capacity(self.results.len() + 1);
        if self.results.len() > 1 {
            lines.push("Ran multiple sessions:".to_string());
        }
        for result in &self.results {
            let status = match &result.status {
                RunStatus::Success => "success".green(),
                RunStatus::Failed { .. } => "failed".red(),
                RunStatus::Skipped { .. } => "skipped".yellow(),
                RunStatus::Cancelled => "cancelled".red().bold(),
            };
            lines.push(format!("* {}: {}", result.signature, status));
        }
        lines.join("\n")
    }
}
