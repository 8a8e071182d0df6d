use std::sync::Arc;

use legenda_core::{Config, Library, MetadataStore, SanitizedConfig, SubtitleOrchestrator};

/// Shared application state
pub struct AppState {
    config: Config,
    library: Library,
}

impl AppState {
    pub fn new(config: Config, library: Library) -> Self {
        Self { config, library }
    }

    /// Wire the library and orchestrator described by `config`.
    pub fn from_config(config: Config) -> Self {
        let orchestrator = Arc::new(SubtitleOrchestrator::from_config(&config));
        let library = Library::new(MetadataStore::new(&config.library.root), orchestrator);
        Self::new(config, library)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn library(&self) -> &Library {
        &self.library
    }
}
