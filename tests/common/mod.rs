//! Common test utilities and helpers
#![allow(dead_code)]

use noxide::config::SessionFile;
use noxide::interpreter::StaticInterpreterLocator;
use noxide::orchestrator::{Orchestrator, OrchestratorConfig};
use noxide::subprocess::{CancelSignal, MockProcessRunner};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A temporary project holding a session file
pub struct TestProject {
    pub dir: TempDir,
    pub noxfile: PathBuf,
}

impl TestProject {
    pub fn new(noxfile: &str) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("noxide.toml");
        std::fs::write(&path, noxfile).expect("write session file");
        Self { dir, noxfile: path }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> OrchestratorConfig {
        OrchestratorConfig::new(self.path())
    }

    /// Build an orchestrator over the project's session file
    pub async fn orchestrator(
        &self,
        config: OrchestratorConfig,
        locator: StaticInterpreterLocator,
        mock: &MockProcessRunner,
    ) -> Orchestrator {
        let file = SessionFile::load(&self.noxfile)
            .await
            .expect("load session file");
        let registry = file.into_registry().expect("build registry");
        Orchestrator::new(
            registry,
            config,
            Arc::new(locator),
            Arc::new(mock.clone()),
            CancelSignal::new(),
        )
    }
}

/// Locator offering the current interpreter plus the given versions
pub fn locator(versions: &[&str]) -> StaticInterpreterLocator {
    versions.iter().fold(
        StaticInterpreterLocator::new().with(None, "/usr/bin/python3"),
        |locator, version| locator.with(Some(version), format!("/usr/bin/python{version}")),
    )
}

pub fn strings(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

/// Session file used by the end-to-end scenarios
pub const SCENARIO_FILE: &str = r#"
[[session]]
name = "lint"
reuse_venv = true
steps = [
    { install = ["pre-commit"] },
    { run = ["pre-commit", "run", "--all-files"] },
]

[[session]]
name = "tests"
python = ["3.10", "3.11"]
reuse_venv = true
steps = [
    { install = ["-ve.[test]"] },
    { run = ["pytest", "{posargs}"] },
]

[[session]]
name = "docs"
default = false
conflicts = [
    { when = { switch = "serve", option = "builder", not_equals = "html" }, message = "Must not specify non-HTML builder with --serve" },
]
steps = [
    { install = ["-ve.[docs]"] },
    { run = ["sphinx-build", "-b", "{builder}", "source", "_build/{builder}", "{posargs}"] },
]

[session.args]
mode = "structured"
pass_unknown = true
options = [
    { name = "serve", kind = "switch" },
    { name = "builder", short = "b", kind = "value", default = "html" },
]
"#;
