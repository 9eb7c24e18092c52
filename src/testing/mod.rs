//! Testing utilities
//!
//! [`RecordingContext`] stands in for a real session so bodies can be
//! exercised without creating environments or spawning processes.

use crate::error::{NoxideError, Result};
use crate::platform::Platform;
use crate::session::SessionContext;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A capability call made by a session body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Install {
        specs: Vec<String>,
        env: HashMap<String, String>,
    },
    Run {
        argv: Vec<String>,
        env: HashMap<String, String>,
        silent: bool,
        cwd: PathBuf,
    },
    Chdir(PathBuf),
}

/// Fake [`SessionContext`] that records every call
pub struct RecordingContext {
    name: String,
    python: Option<String>,
    posargs: Vec<String>,
    platform: Platform,
    env_root: Option<PathBuf>,
    env: HashMap<String, String>,
    cwd: PathBuf,
    failing_programs: HashMap<String, i32>,
    calls: Vec<RecordedCall>,
}

impl RecordingContext {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            python: None,
            posargs: Vec::new(),
            platform: Platform::Linux,
            env_root: Some(PathBuf::from(".noxide").join(name)),
            env: HashMap::new(),
            cwd: PathBuf::new(),
            failing_programs: HashMap::new(),
            calls: Vec::new(),
        }
    }

    pub fn with_python(mut self, version: &str) -> Self {
        self.python = Some(version.to_string());
        self
    }

    pub fn with_posargs<I, S>(mut self, posargs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.posargs = posargs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn without_isolation(mut self) -> Self {
        self.env_root = None;
        self
    }

    /// Make runs of `program` exit with `code`
    pub fn failing(mut self, program: &str, code: i32) -> Self {
        self.failing_programs.insert(program.to_string(), code);
        self
    }

    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    /// Argument vectors of all `run` calls, in order
    pub fn runs(&self) -> Vec<Vec<String>> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Run { argv, .. } => Some(argv.clone()),
                _ => None,
            })
            .collect()
    }

    /// Specs of all `install` calls, in order
    pub fn installs(&self) -> Vec<Vec<String>> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Install { specs, .. } => Some(specs.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    fn merged(&self, extra: &HashMap<String, String>) -> HashMap<String, String> {
        let mut env = self.env.clone();
        env.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }
}

#[async_trait]
impl SessionContext for RecordingContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn python(&self) -> Option<&str> {
        self.python.as_deref()
    }

    fn posargs(&self) -> &[String] {
        &self.posargs
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn env_root(&self) -> Option<&Path> {
        self.env_root.as_deref()
    }

    fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    fn env_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.env
    }

    async fn install(&mut self, specs: &[String], env: &HashMap<String, String>) -> Result<()> {
        let env = self.merged(env);
        self.calls.push(RecordedCall::Install {
            specs: specs.to_vec(),
            env,
        });
        Ok(())
    }

    async fn run(
        &mut self,
        argv: &[String],
        env: &HashMap<String, String>,
        silent: bool,
    ) -> Result<()> {
        let env = self.merged(env);
        self.calls.push(RecordedCall::Run {
            argv: argv.to_vec(),
            env,
            silent,
            cwd: self.cwd.clone(),
        });

        let program = argv.first().map(String::as_str).unwrap_or_default();
        match self.failing_programs.get(program) {
            Some(code) => Err(NoxideError::CommandFailed {
                command: shell_words::join(argv),
                exit_code: *code,
            }),
            None => Ok(()),
        }
    }

    fn chdir(&mut self, dir: &Path) -> Result<()> {
        self.cwd = self.cwd.join(dir);
        self.calls.push(RecordedCall::Chdir(dir.to_path_buf()));
        Ok(())
    }
}
