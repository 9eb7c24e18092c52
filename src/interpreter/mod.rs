//! Interpreter discovery
//!
//! Maps a declared version string ("3.10", "pypy3.9") or the synthetic
//! "current" version to an executable on the host.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::trace;

/// A located interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    /// Declared version, `None` for the current/default interpreter
    pub version: Option<String>,
    pub path: PathBuf,
}

/// Finds interpreters on the host
pub trait InterpreterLocator: Send + Sync {
    fn locate(&self, version: Option<&str>) -> Option<Interpreter>;
}

/// Executable names tried, in order, for a declared version
pub fn candidate_names(version: Option<&str>) -> Vec<String> {
    match version {
        None => vec!["python3".to_string(), "python".to_string()],
        Some(v) if v.starts_with("pypy") || v.starts_with("python") => vec![v.to_string()],
        Some(v) => vec![format!("python{v}")],
    }
}

/// Searches the `PATH` directories for `python<version>` executables
pub struct PathInterpreterLocator {
    search_path: Option<OsString>,
    cwd: PathBuf,
}

impl PathInterpreterLocator {
    /// Search the current process `PATH`
    pub fn from_env() -> Self {
        Self {
            search_path: std::env::var_os("PATH"),
            cwd: std::env::current_dir().unwrap_or_default(),
        }
    }

    /// Search an explicit `PATH`-style list of directories
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
            cwd: std::env::current_dir().unwrap_or_default(),
        }
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        let search_path = self.search_path.as_ref()?;
        which::which_in(name, Some(search_path), &self.cwd).ok()
    }
}

impl InterpreterLocator for PathInterpreterLocator {
    fn locate(&self, version: Option<&str>) -> Option<Interpreter> {
        for name in candidate_names(version) {
            if let Some(path) = self.find_executable(&name) {
                trace!("Resolved interpreter {} to {}", name, path.display());
                return Some(Interpreter {
                    version: version.map(str::to_string),
                    path,
                });
            }
        }
        None
    }
}

/// Fixed version table, for tests and for hosts with unusual layouts
#[derive(Debug, Clone, Default)]
pub struct StaticInterpreterLocator {
    available: HashMap<Option<String>, PathBuf>,
}

impl StaticInterpreterLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an interpreter for a version (`None` = current)
    pub fn with(mut self, version: Option<&str>, path: impl Into<PathBuf>) -> Self {
        self.available
            .insert(version.map(str::to_string), path.into());
        self
    }
}

impl InterpreterLocator for StaticInterpreterLocator {
    fn locate(&self, version: Option<&str>) -> Option<Interpreter> {
        self.available
            .get(&version.map(str::to_string))
            .map(|path| Interpreter {
                version: version.map(str::to_string),
                path: path.clone(),
            })
    }
}
