use super::{
    fingerprint, identity_key, EnvCache, EnvRecord, EnvState, ExecutionEnvironment, ReusePolicy,
    VenvBackend,
};
use crate::error::{ErrorCode, NoxideError, Result};
use crate::interpreter::Interpreter;
use crate::platform::Platform;
use crate::subprocess::{ProcessCommandBuilder, ProcessRunner};
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

/// Owns every environment created during a run
pub struct EnvironmentManager {
    envdir: PathBuf,
    runner: Arc<dyn ProcessRunner>,
    cache: EnvCache,
    persist: bool,
    platform: Platform,
    next_instance: AtomicU64,
}

impl EnvironmentManager {
    /// Create a manager rooted at `envdir` (one subdirectory per identity key)
    pub fn new(envdir: impl Into<PathBuf>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            envdir: envdir.into(),
            runner,
            cache: EnvCache::new(),
            persist: false,
            platform: Platform::current(),
            next_instance: AtomicU64::new(1),
        }
    }

    /// Keep environments usable across process runs via on-disk records
    pub fn with_persistence(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn envdir(&self) -> &Path {
        &self.envdir
    }

    pub fn cache(&self) -> &EnvCache {
        &self.cache
    }

    pub async fn state(&self, env: &ExecutionEnvironment) -> EnvState {
        self.cache.state(&env.identity_key).await
    }

    /// Hand out an environment for a (session, interpreter) pair
    ///
    /// With [`ReusePolicy::Reuse`] an environment already created under the
    /// same identity key is returned as is. Otherwise a fresh one replaces it.
    pub async fn acquire(
        &self,
        session_name: &str,
        interpreter: &Interpreter,
        backend: VenvBackend,
        policy: ReusePolicy,
    ) -> Result<ExecutionEnvironment> {
        let key = identity_key(session_name, interpreter.version.as_deref());

        if policy == ReusePolicy::Reuse {
            if let Some(mut env) = self.cache.get(&key).await {
                if env.backend == backend && env.interpreter == *interpreter {
                    debug!("Reusing environment {} created earlier in this run", key);
                    env.reused = true;
                    return Ok(env);
                }
            }
        }

        if backend == VenvBackend::Disabled {
            debug!("Session {} runs without an isolated environment", key);
            let env = self.new_environment(key, interpreter, backend, None, false);
            self.cache.insert(env.clone(), EnvState::Created).await;
            return Ok(env);
        }

        let root = self.envdir.join(&key);

        if policy == ReusePolicy::Reuse && self.persist {
            if let Some(env) = self.reuse_from_disk(&key, &root, interpreter, backend).await {
                info!("Re-using existing virtual environment at {}", root.display());
                self.cache.insert(env.clone(), EnvState::Created).await;
                return Ok(env);
            }
        }

        self.create(key, root, interpreter, backend).await
    }

    async fn reuse_from_disk(
        &self,
        key: &str,
        root: &Path,
        interpreter: &Interpreter,
        backend: VenvBackend,
    ) -> Option<ExecutionEnvironment> {
        let record = EnvRecord::load(root).await?;
        let expected = fingerprint(backend, &interpreter.path, interpreter.version.as_deref());
        if record.fingerprint != expected {
            debug!(
                "Environment {} was created for a different interpreter, recreating",
                key
            );
            return None;
        }
        Some(self.new_environment(
            key.to_string(),
            interpreter,
            backend,
            Some(root.to_path_buf()),
            true,
        ))
    }

    async fn create(
        &self,
        key: String,
        root: PathBuf,
        interpreter: &Interpreter,
        backend: VenvBackend,
    ) -> Result<ExecutionEnvironment> {
        if fs::try_exists(&root).await.unwrap_or(false) {
            debug!("Removing previous environment at {}", root.display());
            fs::remove_dir_all(&root).await.map_err(|e| {
                NoxideError::environment(
                    ErrorCode::ENV_CREATE_FAILED,
                    &root,
                    "failed to remove previous environment",
                    Some(e),
                )
            })?;
        }

        fs::create_dir_all(&self.envdir).await.map_err(|e| {
            NoxideError::environment(
                ErrorCode::ENV_CREATE_FAILED,
                &self.envdir,
                "failed to create environment directory",
                Some(e),
            )
        })?;

        if let Some(command) = backend.creation_command(&interpreter.path, &root) {
            info!(
                "Creating virtual environment ({}) using {} in {}",
                backend,
                interpreter.path.display(),
                root.display()
            );
            let command_line = command.display();
            let output = self.runner.run(command).await?;
            if !output.status.success() {
                return Err(NoxideError::environment(
                    ErrorCode::ENV_CREATE_FAILED,
                    &root,
                    format!(
                        "{} exited with {}: {}",
                        command_line,
                        output.status.shell_code(),
                        output.combined_output().trim_end()
                    ),
                    None,
                ));
            }
        }

        let env = self.new_environment(key, interpreter, backend, Some(root.clone()), false);

        if self.persist {
            let record = EnvRecord {
                identity_key: env.identity_key.clone(),
                interpreter: interpreter.path.clone(),
                interpreter_version: interpreter.version.clone(),
                backend,
                fingerprint: fingerprint(backend, &interpreter.path, interpreter.version.as_deref()),
                created_at: Utc::now(),
            };
            record.save(&root).await.map_err(|e| {
                NoxideError::environment(
                    ErrorCode::ENV_CREATE_FAILED,
                    &root,
                    "failed to record environment",
                    Some(e),
                )
            })?;
        }

        self.cache.insert(env.clone(), EnvState::Created).await;
        Ok(env)
    }

    fn new_environment(
        &self,
        identity_key: String,
        interpreter: &Interpreter,
        backend: VenvBackend,
        root: Option<PathBuf>,
        reused: bool,
    ) -> ExecutionEnvironment {
        ExecutionEnvironment {
            identity_key,
            interpreter: interpreter.clone(),
            backend,
            root,
            reused,
            instance: self.next_instance.fetch_add(1, Ordering::Relaxed),
            platform: self.platform,
        }
    }

    /// Install package specifications into an environment with the package installer
    pub async fn install(
        &self,
        env: &ExecutionEnvironment,
        specs: &[String],
        overlay: &HashMap<String, String>,
        cwd: &Path,
    ) -> Result<()> {
        if !env.is_isolated() {
            return Err(NoxideError::environment(
                ErrorCode::ENV_NOT_ISOLATED,
                &env.interpreter.path,
                "install requires an isolated environment, but venv_backend is none",
                None,
            ));
        }
        if specs.is_empty() {
            return Err(NoxideError::argument(
                "install needs at least one package specification",
            ));
        }

        self.cache
            .transition(&env.identity_key, env.instance, EnvState::Installing)
            .await;

        let mut vars = env.activation_env();
        vars.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));

        let command = ProcessCommandBuilder::new(&env.python().to_string_lossy())
            .args(["-m", "pip", "install"])
            .args(specs)
            .envs(vars)
            .current_dir(cwd)
            .capture_output(true)
            .build();
        let command_line = command.display();
        info!("{}", command_line);

        let output = self.runner.run(command).await?;
        if !output.status.success() {
            return Err(NoxideError::Install {
                command: command_line,
                exit_code: output.status.shell_code(),
                output: output.combined_output(),
            });
        }

        self.cache
            .transition(&env.identity_key, env.instance, EnvState::Ready)
            .await;
        Ok(())
    }
}
