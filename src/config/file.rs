use super::declarative::DeclarativeSession;
use super::step::{Condition, Conflict, Step, StepAction};
use crate::error::{NoxideError, Result};
use crate::session::{ArgPolicy, OptionKind, SessionDefinition, SessionRegistry};
use crate::venv::VenvBackend;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Run-wide defaults from the `[options]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileOptions {
    /// Default selection; overrides each session's `default` flag
    pub sessions: Option<Vec<String>>,
    pub error_on_missing_interpreters: Option<bool>,
    pub reuse_existing_virtualenvs: Option<bool>,
    pub envdir: Option<PathBuf>,
    pub stop_on_first_error: Option<bool>,
    pub venv_backend: Option<VenvBackend>,
}

fn default_true() -> bool {
    true
}

/// One `[[session]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSpec {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub python: Vec<String>,
    #[serde(default)]
    pub reuse_venv: bool,
    #[serde(default = "default_true")]
    pub default: bool,
    pub venv_backend: Option<VenvBackend>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub args: ArgPolicy,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// The declarative session file (`noxide.toml` or YAML)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionFile {
    #[serde(default)]
    pub options: FileOptions,
    #[serde(default, rename = "session")]
    pub sessions: Vec<SessionSpec>,
}

impl SessionFile {
    /// Read and validate a session file; the format follows the extension
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await.map_err(|e| NoxideError::Config {
            message: format!("cannot read file: {e}"),
            path: Some(path.to_path_buf()),
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml" | "yml")
        );
        let parsed = if is_yaml {
            Self::from_yaml(&content)
        } else {
            Self::from_toml(&content)
        };
        let file = parsed.map_err(|e| match e {
            NoxideError::Config { message, .. } => NoxideError::Config {
                message,
                path: Some(path.to_path_buf()),
            },
            other => other,
        })?;

        debug!(
            "Loaded {} session(s) from {}",
            file.sessions.len(),
            path.display()
        );
        Ok(file)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: Self = toml::from_str(content).map_err(|e| NoxideError::config(e.to_string()))?;
        file.validate()?;
        Ok(file)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: Self =
            serde_yaml::from_str(content).map_err(|e| NoxideError::config(e.to_string()))?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<()> {
        for spec in &self.sessions {
            if spec.name.trim().is_empty() {
                return Err(NoxideError::config("session name must not be empty"));
            }
            for (index, conflict) in spec.conflicts.iter().enumerate() {
                check_condition(&spec.args, &conflict.when).map_err(|message| {
                    NoxideError::config(format!(
                        "session '{}', conflict {}: {}",
                        spec.name,
                        index + 1,
                        message
                    ))
                })?;
            }
            for (index, step) in spec.steps.iter().enumerate() {
                let invalid = |message: String| {
                    NoxideError::config(format!(
                        "session '{}', step {}: {}",
                        spec.name,
                        index + 1,
                        message
                    ))
                };

                if let StepAction::Run(argv) = &step.action {
                    if argv.is_empty() {
                        return Err(invalid("run needs a program".to_string()));
                    }
                }
                if let Some(condition) = &step.when {
                    check_condition(&spec.args, condition).map_err(invalid)?;
                }
            }
        }

        if let Some(selected) = &self.options.sessions {
            let names: Vec<String> = self.sessions.iter().map(|s| s.name.clone()).collect();
            if let Some(missing) = selected.iter().find(|name| !names.contains(name)) {
                return Err(NoxideError::UnknownSession {
                    name: missing.clone(),
                    available: names,
                });
            }
        }
        Ok(())
    }

    /// Register every session, in file order
    ///
    /// Fails with a duplicate-session error before anything runs.
    pub fn into_registry(self) -> Result<SessionRegistry> {
        let mut registry = SessionRegistry::new();
        let selected = self.options.sessions;

        for spec in self.sessions {
            let included = match &selected {
                Some(selected) => selected.contains(&spec.name),
                None => spec.default,
            };
            let body = DeclarativeSession::new(spec.args, spec.steps)
                .with_env(spec.env)
                .with_conflicts(spec.conflicts);

            let mut definition = SessionDefinition::new(spec.name, body)
                .reuse_env(spec.reuse_venv)
                .python(spec.python)
                .default_session(included);
            if let Some(description) = spec.description {
                definition = definition.with_description(description);
            }
            if let Some(backend) = spec.venv_backend {
                definition = definition.venv_backend(backend);
            }
            registry.register(definition)?;
        }
        Ok(registry)
    }
}

fn check_condition(policy: &ArgPolicy, condition: &Condition) -> std::result::Result<(), String> {
    condition.check()?;
    for name in condition.referenced_options() {
        check_option(policy, name, condition.option.as_deref() == Some(name))?;
    }
    Ok(())
}

fn check_option(policy: &ArgPolicy, name: &str, wants_value: bool) -> std::result::Result<(), String> {
    let ArgPolicy::Structured { options, .. } = policy else {
        return Err(format!(
            "condition on option '{name}' needs structured args"
        ));
    };
    let Some(option) = options.iter().find(|o| o.name == name) else {
        return Err(format!("condition on undeclared option '{name}'"));
    };
    match (option.kind, wants_value) {
        (OptionKind::Value, true) | (OptionKind::Switch, false) => Ok(()),
        (OptionKind::Value, false) => Err(format!("'{name}' takes a value, compare it with `option`")),
        (OptionKind::Switch, true) => Err(format!("'{name}' is a switch, test it with `switch`")),
    }
}
