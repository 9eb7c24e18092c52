use super::context::SessionContext;
use crate::error::{NoxideError, Result};
use crate::venv::VenvBackend;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// The work a session performs inside its environment
#[async_trait]
pub trait SessionBody: Send + Sync {
    async fn run(&self, ctx: &mut dyn SessionContext) -> Result<()>;
}

/// Display name of one (session, version) run, e.g. `tests-3.10`
pub fn signature(name: &str, version: Option<&str>) -> String {
    match version {
        Some(v) => format!("{name}-{v}"),
        None => name.to_string(),
    }
}

/// A registered session, immutable once in the registry
#[derive(Clone)]
pub struct SessionDefinition {
    pub name: String,
    pub description: Option<String>,
    pub reuse_env: bool,
    /// Empty means a single run on the current interpreter
    pub interpreter_versions: Vec<String>,
    pub included_by_default: bool,
    /// Overrides the run-wide backend
    pub venv_backend: Option<VenvBackend>,
    pub body: Arc<dyn SessionBody>,
}

impl SessionDefinition {
    pub fn new(name: impl Into<String>, body: impl SessionBody + 'static) -> Self {
        Self {
            name: name.into(),
            description: None,
            reuse_env: false,
            interpreter_versions: Vec::new(),
            included_by_default: true,
            venv_backend: None,
            body: Arc::new(body),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn reuse_env(mut self, reuse: bool) -> Self {
        self.reuse_env = reuse;
        self
    }

    pub fn python<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interpreter_versions = versions.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_session(mut self, included: bool) -> Self {
        self.included_by_default = included;
        self
    }

    pub fn venv_backend(mut self, backend: VenvBackend) -> Self {
        self.venv_backend = Some(backend);
        self
    }

    /// Versions to run, in declared order (`None` is the current interpreter)
    pub fn versions(&self) -> Vec<Option<String>> {
        if self.interpreter_versions.is_empty() {
            vec![None]
        } else {
            self.interpreter_versions
                .iter()
                .cloned()
                .map(Some)
                .collect()
        }
    }

    pub fn signatures(&self) -> Vec<String> {
        self.versions()
            .iter()
            .map(|version| signature(&self.name, version.as_deref()))
            .collect()
    }
}

impl fmt::Debug for SessionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionDefinition")
            .field("name", &self.name)
            .field("reuse_env", &self.reuse_env)
            .field("interpreter_versions", &self.interpreter_versions)
            .field("included_by_default", &self.included_by_default)
            .field("venv_backend", &self.venv_backend)
            .finish_non_exhaustive()
    }
}

/// Session definitions in registration order
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<SessionDefinition>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition; a duplicate name leaves the registry untouched
    pub fn register(&mut self, definition: SessionDefinition) -> Result<()> {
        if self.sessions.iter().any(|s| s.name == definition.name) {
            return Err(NoxideError::DuplicateSession {
                name: definition.name,
            });
        }
        self.sessions.push(definition);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&SessionDefinition> {
        self.sessions
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| NoxideError::UnknownSession {
                name: name.to_string(),
                available: self.names(),
            })
    }

    /// Resolve a selection entry, either a base name or a `<name>-<version>` signature
    ///
    /// Returns the definition and, for signatures, the single version selected.
    pub fn resolve(&self, name: &str) -> Result<(&SessionDefinition, Option<String>)> {
        if let Ok(definition) = self.lookup(name) {
            return Ok((definition, None));
        }

        for definition in &self.sessions {
            for version in &definition.interpreter_versions {
                if signature(&definition.name, Some(version)) == name {
                    return Ok((definition, Some(version.clone())));
                }
            }
        }

        Err(NoxideError::UnknownSession {
            name: name.to_string(),
            available: self.names(),
        })
    }

    pub fn list_default_sessions(&self) -> Vec<&SessionDefinition> {
        self.sessions
            .iter()
            .filter(|s| s.included_by_default)
            .collect()
    }

    pub fn list_all(&self) -> &[SessionDefinition] {
        &self.sessions
    }

    pub fn names(&self) -> Vec<String> {
        self.sessions.iter().map(|s| s.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
