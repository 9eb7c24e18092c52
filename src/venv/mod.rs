//! Environment manager
//!
//! Creates, caches and reuses the isolated environment each
//! (session, interpreter version) pair runs in.

mod backend;
mod cache;
mod manager;
mod record;

pub use backend::VenvBackend;
pub use cache::EnvCache;
pub use manager::EnvironmentManager;
pub use record::{fingerprint, EnvRecord, RECORD_FILE};

use crate::interpreter::Interpreter;
use crate::platform::Platform;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Whether an existing environment with the same identity may be handed out again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReusePolicy {
    Reuse,
    Recreate,
}

impl From<bool> for ReusePolicy {
    fn from(reuse: bool) -> Self {
        if reuse {
            ReusePolicy::Reuse
        } else {
            ReusePolicy::Recreate
        }
    }
}

/// Lifecycle of a managed environment
///
/// `Unresolved -> Created -> (Installing -> Ready)*`. A recreate discards
/// the instance and starts a new one at `Created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvState {
    Unresolved,
    Created,
    Installing,
    Ready,
}

impl EnvState {
    pub fn can_transition_to(&self, next: EnvState) -> bool {
        matches!(
            (self, next),
            (EnvState::Unresolved, EnvState::Created)
                | (EnvState::Created, EnvState::Installing)
                | (EnvState::Created, EnvState::Ready)
                | (EnvState::Ready, EnvState::Installing)
                | (EnvState::Installing, EnvState::Ready)
        )
    }
}

/// Stable key for a (session, interpreter version) pair, also its directory name
pub fn identity_key(session_name: &str, version: Option<&str>) -> String {
    let raw = match version {
        Some(v) => format!("{session_name}-{v}"),
        None => session_name.to_string(),
    };
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// An environment handed to one session run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionEnvironment {
    pub identity_key: String,
    pub interpreter: Interpreter,
    pub backend: VenvBackend,
    /// Environment directory; `None` when running without isolation
    pub root: Option<PathBuf>,
    /// True when the environment existed before this acquisition
    pub reused: bool,
    /// Distinguishes separately created instances under the same key
    pub instance: u64,
    pub platform: Platform,
}

impl ExecutionEnvironment {
    pub fn interpreter_version(&self) -> Option<&str> {
        self.interpreter.version.as_deref()
    }

    pub fn is_isolated(&self) -> bool {
        self.root.is_some()
    }

    pub fn bin_dir(&self) -> Option<PathBuf> {
        self.root
            .as_ref()
            .map(|root| root.join(self.platform.venv_bin_dir()))
    }

    /// Interpreter used for `-m pip` and friends
    pub fn python(&self) -> PathBuf {
        match self.bin_dir() {
            Some(bin) => bin.join(format!("python{}", self.platform.exe_suffix())),
            None => self.interpreter.path.clone(),
        }
    }

    /// Variables that make spawned commands see the environment first
    pub fn activation_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        let (Some(root), Some(bin)) = (self.root.as_ref(), self.bin_dir()) else {
            return env;
        };

        env.insert(
            "VIRTUAL_ENV".to_string(),
            root.to_string_lossy().into_owned(),
        );

        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let dirs = std::iter::once(bin).chain(std::env::split_paths(&inherited));
        match std::env::join_paths(dirs) {
            Ok(path) => {
                env.insert("PATH".to_string(), path.to_string_lossy().into_owned());
            }
            Err(e) => warn!("Could not prepend environment to PATH: {}", e),
        }
        env
    }

    /// Prefer the environment's own copy of a bare program name
    pub fn resolve_program(&self, program: &str) -> String {
        let bare = Path::new(program).components().count() == 1;
        if let (true, Some(bin)) = (bare, self.bin_dir()) {
            if let Ok(found) = which::which_in(program, Some(&bin), &bin) {
                return found.to_string_lossy().into_owned();
            }
        }
        program.to_string()
    }
}
