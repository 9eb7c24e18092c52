use crate::error::{ErrorCode, NoxideError, Result};
use crate::platform::Platform;
use crate::subprocess::{ProcessCommandBuilder, ProcessRunner};
use crate::venv::{EnvironmentManager, ExecutionEnvironment};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Capabilities available to a session body
///
/// Command-level `env` maps are applied on top of the session overlay
/// returned by [`SessionContext::env`].
#[async_trait]
pub trait SessionContext: Send {
    /// Run signature, e.g. `tests-3.10`
    fn name(&self) -> &str;

    /// Interpreter version of this run, `None` for the current interpreter
    fn python(&self) -> Option<&str>;

    /// Trailing arguments given to the session
    fn posargs(&self) -> &[String];

    fn platform(&self) -> Platform;

    /// Environment directory, `None` without isolation
    fn env_root(&self) -> Option<&Path>;

    fn env(&self) -> &HashMap<String, String>;

    fn env_mut(&mut self) -> &mut HashMap<String, String>;

    async fn install(&mut self, specs: &[String], env: &HashMap<String, String>) -> Result<()>;

    async fn run(
        &mut self,
        argv: &[String],
        env: &HashMap<String, String>,
        silent: bool,
    ) -> Result<()>;

    fn chdir(&mut self, dir: &Path) -> Result<()>;

    /// Error that aborts this run; return it from the body
    fn error(&self, message: &str) -> NoxideError {
        NoxideError::SessionAborted {
            message: message.to_string(),
        }
    }
}

/// The context handed to session bodies during a real run
pub struct Session<'a> {
    signature: String,
    environment: ExecutionEnvironment,
    manager: &'a EnvironmentManager,
    runner: Arc<dyn ProcessRunner>,
    posargs: Vec<String>,
    env_vars: HashMap<String, String>,
    cwd: PathBuf,
    no_install: bool,
}

impl<'a> Session<'a> {
    pub fn new(
        signature: impl Into<String>,
        environment: ExecutionEnvironment,
        manager: &'a EnvironmentManager,
        runner: Arc<dyn ProcessRunner>,
        posargs: Vec<String>,
        cwd: PathBuf,
    ) -> Self {
        Self {
            signature: signature.into(),
            environment,
            manager,
            runner,
            posargs,
            env_vars: HashMap::new(),
            cwd,
            no_install: false,
        }
    }

    /// Skip installs when the environment was reused
    pub fn with_no_install(mut self, no_install: bool) -> Self {
        self.no_install = no_install;
        self
    }

    fn overlay(&self, extra: &HashMap<String, String>) -> HashMap<String, String> {
        let mut vars = self.env_vars.clone();
        vars.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        vars
    }
}

#[async_trait]
impl<'a> SessionContext for Session<'a> {
    fn name(&self) -> &str {
        &self.signature
    }

    fn python(&self) -> Option<&str> {
        self.environment.interpreter_version()
    }

    fn posargs(&self) -> &[String] {
        &self.posargs
    }

    fn platform(&self) -> Platform {
        self.environment.platform
    }

    fn env_root(&self) -> Option<&Path> {
        self.environment.root.as_deref()
    }

    fn env(&self) -> &HashMap<String, String> {
        &self.env_vars
    }

    fn env_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.env_vars
    }

    async fn install(&mut self, specs: &[String], env: &HashMap<String, String>) -> Result<()> {
        if self.no_install && self.environment.reused {
            info!(
                "Skipping install of {} in reused environment",
                shell_words::join(specs)
            );
            return Ok(());
        }
        let overlay = self.overlay(env);
        self.manager
            .install(&self.environment, specs, &overlay, &self.cwd)
            .await
    }

    async fn run(
        &mut self,
        argv: &[String],
        env: &HashMap<String, String>,
        silent: bool,
    ) -> Result<()> {
        let Some((program, args)) = argv.split_first() else {
            return Err(NoxideError::argument("run needs a program to execute"));
        };

        let mut vars = self.environment.activation_env();
        vars.extend(self.overlay(env));

        let command = ProcessCommandBuilder::new(&self.environment.resolve_program(program))
            .args(args)
            .envs(vars)
            .current_dir(&self.cwd)
            .capture_output(silent)
            .build();
        let command_line = shell_words::join(argv);
        info!("{}", command_line);

        let output = self.runner.run(command).await?;
        if !output.status.success() {
            if silent {
                error!("{}", output.combined_output().trim_end());
            }
            return Err(NoxideError::CommandFailed {
                command: command_line,
                exit_code: output.status.shell_code(),
            });
        }
        Ok(())
    }

    fn chdir(&mut self, dir: &Path) -> Result<()> {
        let target = self.cwd.join(dir);
        if !target.is_dir() {
            return Err(NoxideError::environment(
                ErrorCode::ENV_GENERIC,
                &target,
                "cannot change into a directory that does not exist",
                None,
            ));
        }
        info!("cd {}", dir.display());
        self.cwd = target;
        Ok(())
    }
}
