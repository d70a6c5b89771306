//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;

use scribe_core::config::PersistedConfig;
use scribe_core::credentials::{Credential, CredentialResolver, PromptMode};
use scribe_core::crew::{CrewEngine, CrewEvent, CrewProgress, RadkitEngine};
use scribe_core::models::ModelConfig;
use tokio::sync::{broadcast, RwLock};

/// How generate requests obtain an engine
#[derive(Clone)]
pub enum EngineSource {
    /// Build a radkit engine from the current config and credential
    Radkit,
    /// Always use this engine
    #[cfg(test)]
    Fixed(Arc<dyn CrewEngine>),
}

pub struct AppState {
    pub runtime_dir: PathBuf,
    pub config: RwLock<PersistedConfig>,
    pub credential: RwLock<Option<Credential>>,
    pub progress: RwLock<CrewProgress>,
    pub event_tx: broadcast::Sender<CrewEvent>,
    pub engine: EngineSource,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        runtime_dir: PathBuf,
        config: PersistedConfig,
        credential: Option<Credential>,
        engine: EngineSource,
    ) -> Self {
        let (event_tx, _) = broadcast::channel::<CrewEvent>(100);
        Self {
            runtime_dir,
            config: RwLock::new(config),
            credential: RwLock::new(credential),
            progress: RwLock::new(CrewProgress::new()),
            event_tx,
            engine,
        }
    }

    pub async fn model_config(&self) -> ModelConfig {
        self.config.read().await.model_config()
    }

    /// Resolver for the currently selected provider. The server never prompts.
    pub async fn resolver(&self) -> CredentialResolver {
        let provider = self.model_config().await.provider;
        CredentialResolver::new(provider, &self.runtime_dir).with_prompt(PromptMode::Disabled)
    }

    pub fn build_engine(&self, model: ModelConfig, credential: Credential) -> Arc<dyn CrewEngine> {
        match &self.engine {
            EngineSource::Radkit => Arc::new(RadkitEngine::new(model, credential)),
            #[cfg(test)]
            EngineSource::Fixed(engine) => Arc::clone(engine),
        }
    }
}
