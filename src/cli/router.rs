//! Command routing and execution

use crate::app::AppConfig;
use crate::cli::args::Cli;
use crate::config::SessionFile;
use crate::interpreter::PathInterpreterLocator;
use crate::orchestrator::{write_report, Orchestrator, OrchestratorConfig};
use crate::subprocess::{cancel_on_ctrl_c, CancelSignal, TokioProcessRunner};
use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Load the session file, then list or run sessions
///
/// Returns the process exit code.
pub async fn execute_command(cli: Cli, config: &AppConfig) -> Result<i32> {
    let noxfile = config.working_dir.join(&cli.noxfile);
    let file = SessionFile::load(&noxfile).await?;
    let workdir = noxfile
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.working_dir.clone());

    let run_config = OrchestratorConfig::from_sources(
        &workdir,
        &file.options,
        |key| std::env::var(key).ok(),
        &cli.overrides(),
    );
    debug!("Run configuration: {:?}", run_config);
    let registry = file.into_registry()?;

    let cancel = CancelSignal::new();
    let orchestrator = Orchestrator::new(
        registry,
        run_config,
        Arc::new(PathInterpreterLocator::from_env()),
        Arc::new(TokioProcessRunner::new(cancel.clone())),
        cancel.clone(),
    );

    if cli.list {
        println!("{}", render_session_list(&orchestrator, &cli.sessions, &noxfile)?);
        return Ok(0);
    }

    cancel_on_ctrl_c(cancel);
    let outcome = orchestrator.run(&cli.sessions).await?;

    if !outcome.results.is_empty() {
        eprintln!("{}", outcome.render_summary());
    }
    if let Some(report) = &cli.report {
        write_report(report, &outcome, &cli.posargs).await?;
        info!("Wrote report to {}", report.display());
    }

    Ok(outcome.exit_code())
}

/// Every run signature with its description; `*` marks the ones that would run
pub fn render_session_list(
    orchestrator: &Orchestrator,
    requested: &[String],
    noxfile: &Path,
) -> Result<String> {
    let selected: HashSet<String> = orchestrator
        .plan(requested)?
        .into_iter()
        .map(|run| run.signature)
        .collect();

    let mut lines = vec![format!("Sessions defined in {}:", noxfile.display()), String::new()];
    for definition in orchestrator.registry().list_all() {
        for signature in definition.signatures() {
            let marker = if selected.contains(&signature) { '*' } else { '-' };
            match &definition.description {
                Some(description) => lines.push(format!("{marker} {signature} -> {description}")),
                None => lines.push(format!("{marker} {signature}")),
            }
        }
    }
    lines.push(String::new());
    lines.push(
        "sessions marked with * are selected, sessions marked with - are skipped.".to_string(),
    );
    Ok(lines.join("\n"))
}
