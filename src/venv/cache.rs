use super::{EnvState, ExecutionEnvironment};
use std::collections::HashMap;
use tokio::sync::RwLock;

struct CacheEntry {
    env: ExecutionEnvironment,
    state: EnvState,
}

/// Identity key to environment map shared by all sessions of one run
///
/// Only the [`super::EnvironmentManager`] writes to it.
#[derive(Default)]
pub struct EnvCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl EnvCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<ExecutionEnvironment> {
        self.entries
            .read()
            .await
            .get(key)
            .map(|entry| entry.env.clone())
    }

    /// Insert or replace the environment stored under its identity key
    pub async fn insert(&self, env: ExecutionEnvironment, state: EnvState) {
        self.entries
            .write()
            .await
            .insert(env.identity_key.clone(), CacheEntry { env, state });
    }

    /// Current state, `Unresolved` for unknown keys
    pub async fn state(&self, key: &str) -> EnvState {
        self.entries
            .read()
            .await
            .get(key)
            .map(|entry| entry.state)
            .unwrap_or(EnvState::Unresolved)
    }

    /// Move an environment to a new state if the transition is legal
    ///
    /// Returns false (and leaves the state alone) otherwise.
    pub async fn transition(&self, key: &str, instance: u64, next: EnvState) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) if entry.env.instance == instance && entry.state.can_transition_to(next) => {
                entry.state = next;
                true
            }
            _ => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
