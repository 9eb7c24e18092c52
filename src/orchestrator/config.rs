use crate::config::FileOptions;
use crate::venv::VenvBackend;
use std::path::{Path, PathBuf};

/// Environment variable naming the environment directory
pub const ENVDIR_VAR: &str = "NOXIDE_ENVDIR";

/// Settings given on the command line; `None` leaves lower layers in place
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub error_on_missing_interpreters: Option<bool>,
    pub reuse_existing_virtualenvs: bool,
    pub envdir: Option<PathBuf>,
    pub stop_on_first_error: bool,
    pub no_install: bool,
    pub no_venv: bool,
    pub python: Vec<String>,
    pub posargs: Vec<String>,
}

/// Everything the orchestrator needs to know about one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Directory holding one environment per identity key
    pub envdir: PathBuf,
    /// Directory commands start in
    pub workdir: PathBuf,
    /// Fail instead of skip when an interpreter is missing
    pub error_on_missing_interpreters: bool,
    /// Keep environments across process runs
    pub reuse_existing_virtualenvs: bool,
    pub stop_on_first_error: bool,
    pub no_install: bool,
    /// Backend for sessions that do not pick one
    pub default_venv_backend: VenvBackend,
    /// Backend forced on every session
    pub force_venv_backend: Option<VenvBackend>,
    /// Only run these interpreter versions
    pub python_filter: Vec<String>,
    pub posargs: Vec<String>,
}

impl OrchestratorConfig {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        let workdir = workdir.into();
        Self {
            envdir: workdir.join(".noxide"),
            workdir,
            error_on_missing_interpreters: false,
            reuse_existing_virtualenvs: false,
            stop_on_first_error: false,
            no_install: false,
            default_venv_backend: VenvBackend::default(),
            force_venv_backend: None,
            python_filter: Vec::new(),
            posargs: Vec::new(),
        }
    }

    /// Merge the session file, environment and command line, later layers winning
    ///
    /// `workdir` is the directory of the session file; relative paths from the
    /// file resolve against it.
    pub fn from_sources<F>(
        workdir: &Path,
        options: &FileOptions,
        env: F,
        cli: &CliOverrides,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(workdir);

        if let Some(strict) = options.error_on_missing_interpreters {
            config.error_on_missing_interpreters = strict;
        }
        if let Some(reuse) = options.reuse_existing_virtualenvs {
            config.reuse_existing_virtualenvs = reuse;
        }
        if let Some(envdir) = &options.envdir {
            config.envdir = workdir.join(envdir);
        }
        if let Some(stop) = options.stop_on_first_error {
            config.stop_on_first_error = stop;
        }
        if let Some(backend) = options.venv_backend {
            config.default_venv_backend = backend;
        }

        if env("CI").is_some_and(|value| !value.is_empty()) {
            config.error_on_missing_interpreters = true;
        }
        if let Some(envdir) = env(ENVDIR_VAR).filter(|value| !value.is_empty()) {
            config.envdir = workdir.join(envdir);
        }

        if let Some(strict) = cli.error_on_missing_interpreters {
            config.error_on_missing_interpreters = strict;
        }
        if cli.reuse_existing_virtualenvs {
            config.reuse_existing_virtualenvs = true;
        }
        if let Some(envdir) = &cli.envdir {
            config.envdir = envdir.clone();
        }
        if cli.stop_on_first_error {
            config.stop_on_first_error = true;
        }
        if cli.no_venv {
            config.force_venv_backend = Some(VenvBackend::Disabled);
        }
        config.no_install = cli.no_install;
        config.python_filter = cli.python.clone();
        config.posargs = cli.posargs.clone();
        config
    }

    pub fn backend_for(&self, session_backend: Option<VenvBackend>) -> VenvBackend {
        self.force_venv_backend
            .or(session_backend)
            .unwrap_or(self.default_venv_backend)
    }
}
