use crate::config::ServerConfig;
use crate::error::ServerResult;
use std::sync::Arc;
use store::DocumentStore;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Document store every handler talks to
    pub store: Arc<dyn DocumentStore>,
}

impl ServerState {
    /// Create state around an already-built store.
    pub fn new(config: ServerConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// Create state, building the store from `config.store`.
    pub fn from_config(config: ServerConfig) -> ServerResult<Self> {
        let store = config.store.build()?;
        Ok(Self::new(config, store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_builds_memory_store() {
        let state = ServerState::from_config(ServerConfig::default()).unwrap();
        assert_eq!(state.store.name(), "memory");
        assert_eq!(state.config.port, 4051);
    }
}
