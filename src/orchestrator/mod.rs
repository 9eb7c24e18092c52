//! Orchestrator
//!
//! Resolves the selected sessions, fans each out over its interpreter
//! versions and drives one environment plus one session body per
//! (session, version) pair. Failures are contained per pair; only
//! configuration errors abort the whole run.

mod config;
mod outcome;
pub mod report;

pub use config::{CliOverrides, OrchestratorConfig, ENVDIR_VAR};
pub use outcome::OrchestratorOutcome;
pub use report::{write_report, Report};

use crate::error::{NoxideError, Result};
use crate::interpreter::InterpreterLocator;
use crate::session::{signature, RunResult, Session, SessionDefinition, SessionRegistry};
use crate::subprocess::{CancelSignal, ProcessRunner};
use crate::venv::EnvironmentManager;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// One scheduled (session, version) pair
#[derive(Debug, Clone)]
pub struct PlannedRun<'a> {
    pub definition: &'a SessionDefinition,
    pub version: Option<String>,
    pub signature: String,
}

pub struct Orchestrator {
    registry: SessionRegistry,
    config: OrchestratorConfig,
    locator: Arc<dyn InterpreterLocator>,
    runner: Arc<dyn ProcessRunner>,
    cancel: CancelSignal,
    manager: EnvironmentManager,
}

impl Orchestrator {
    pub fn new(
        registry: SessionRegistry,
        config: OrchestratorConfig,
        locator: Arc<dyn InterpreterLocator>,
        runner: Arc<dyn ProcessRunner>,
        cancel: CancelSignal,
    ) -> Self {
        let manager = EnvironmentManager::new(config.envdir.clone(), runner.clone())
            .with_persistence(config.reuse_existing_virtualenvs);
        Self {
            registry,
            config,
            locator,
            runner,
            cancel,
            manager,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn manager(&self) -> &EnvironmentManager {
        &self.manager
    }

    /// Resolve the selection into runs, in selection order and without duplicates
    ///
    /// An empty selection means the default sessions. Any unknown name fails
    /// the whole plan.
    pub fn plan(&self, requested: &[String]) -> Result<Vec<PlannedRun<'_>>> {
        let mut selected: Vec<(&SessionDefinition, Option<String>)> = Vec::new();
        if requested.is_empty() {
            for definition in self.registry.list_default_sessions() {
                selected.push((definition, None));
            }
        } else {
            for name in requested {
                selected.push(self.registry.resolve(name)?);
            }
        }

        let mut seen = HashSet::new();
        let mut runs = Vec::new();
        for (definition, only) in selected {
            let versions = match only {
                Some(version) => vec![Some(version)],
                None => definition.versions(),
            };
            for version in versions {
                if !self.passes_python_filter(version.as_deref()) {
                    continue;
                }
                let signature = signature(&definition.name, version.as_deref());
                if seen.insert(signature.clone()) {
                    runs.push(PlannedRun {
                        definition,
                        version,
                        signature,
                    });
                }
            }
        }
        Ok(runs)
    }

    fn passes_python_filter(&self, version: Option<&str>) -> bool {
        match version {
            Some(version) if !self.config.python_filter.is_empty() => {
                self.config.python_filter.iter().any(|v| v == version)
            }
            _ => true,
        }
    }

    /// Run the selection and aggregate the results
    ///
    /// Returns `Err` only for configuration errors, before anything ran.
    pub async fn run(&self, requested: &[String]) -> Result<OrchestratorOutcome> {
        let plan = self.plan(requested)?;
        if plan.is_empty() {
            warn!("No sessions selected");
        }

        let mut outcome = OrchestratorOutcome::default();
        for planned in &plan {
            if self.cancel.is_cancelled() {
                break;
            }

            let result = self.run_one(planned).await;
            let failed = result.status.is_failure();
            outcome.results.push(result);

            if self.cancel.is_cancelled() {
                break;
            }
            if failed && self.config.stop_on_first_error {
                info!("Stopping after first failure");
                break;
            }
        }

        outcome.cancelled = self.cancel.is_cancelled();
        if outcome.cancelled {
            warn!("Interrupted, remaining sessions were not run");
        }
        Ok(outcome)
    }

    async fn run_one(&self, planned: &PlannedRun<'_>) -> RunResult {
        let definition = planned.definition;
        let version = planned.version.as_deref();
        info!("Running session {}", planned.signature);
        let started = Instant::now();

        let Some(interpreter) = self.locator.locate(version) else {
            let missing = NoxideError::MissingInterpreter {
                version: version.unwrap_or("current").to_string(),
            };
            if self.config.error_on_missing_interpreters {
                error!("Session {} failed: {}", planned.signature, missing);
                return RunResult::from_error(
                    &definition.name,
                    version,
                    &planned.signature,
                    &missing,
                    started.elapsed(),
                );
            }
            warn!("Missing interpreters will error by default on CI systems.");
            warn!("Session {} skipped: {}.", planned.signature, missing);
            return RunResult::skipped(
                &definition.name,
                version,
                &planned.signature,
                missing.to_string(),
            );
        };
        debug!(
            "Using interpreter {} for {}",
            interpreter.path.display(),
            planned.signature
        );

        let result = self.execute(planned, &interpreter).await;
        let elapsed = started.elapsed();
        match result {
            Ok(()) => {
                info!("Session {} was successful", planned.signature);
                RunResult::success(&definition.name, version, &planned.signature, elapsed)
            }
            Err(e) => {
                if matches!(e, NoxideError::Cancelled) {
                    warn!("Session {} interrupted", planned.signature);
                } else {
                    error!("Session {} failed: {}", planned.signature, e.user_message());
                }
                RunResult::from_error(&definition.name, version, &planned.signature, &e, elapsed)
            }
        }
    }

    async fn execute(
        &self,
        planned: &PlannedRun<'_>,
        interpreter: &crate::interpreter::Interpreter,
    ) -> Result<()> {
        let definition = planned.definition;
        let backend = self.config.backend_for(definition.venv_backend);
        let environment = self
            .manager
            .acquire(
                &definition.name,
                interpreter,
                backend,
                definition.reuse_env.into(),
            )
            .await?;

        let mut session = Session::new(
            planned.signature.clone(),
            environment,
            &self.manager,
            self.runner.clone(),
            self.config.posargs.clone(),
            self.config.workdir.clone(),
        )
        .with_no_install(self.config.no_install);

        definition.body.run(&mut session).await
    }
}
