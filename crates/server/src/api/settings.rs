//! # Settings API
//!
//! Status, crew roster, provider/model config, and API key management.

use axum::{extract::State, Json};
use scribe_core::agents::create_personas;
use scribe_core::config::PersistedConfig;
use scribe_core::credentials::{Credential, CredentialResolver, CredentialSource, PromptMode};
use scribe_core::crew::CrewStage;
use scribe_core::models::{LlmProvider, ModelConfig};
use scribe_core::tasks::create_tasks;
use scribe_core::ScribeError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ApiResponse, ApiResult, ErrorBody};
use crate::state::SharedState;

#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    /// `idle`, `planning`, `writing`, `editing`, `complete`, `failed`
    #[schema(value_type = String)]
    stage: CrewStage,
    stage_label: String,
    percent: u8,
    active_agent: Option<String>,
    /// A run has started and not yet finished
    running: bool,
    /// Outcome of the most recent finished run
    last_run_succeeded: Option<bool>,
    credential_configured: bool,
    /// Masked key, e.g. `sk-…abcd`
    credential_preview: Option<String>,
    /// `file`, `environment`, `prompt`, or `explicit`
    #[schema(value_type = Option<String>)]
    credential_source: Option<CredentialSource>,
    provider: String,
    model: String,
}

#[derive(Serialize, ToSchema)]
pub struct AgentInfo {
    id: String,
    role: String,
    goal: String,
    allow_delegation: bool,
    task: String,
    /// Task whose output this agent receives
    depends_on: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProviderInfo {
    id: String,
    name: String,
    default_model: String,
    supports_base_url: bool,
    env_var: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProvidersResponse {
    providers: Vec<ProviderInfo>,
}

#[derive(Deserialize, ToSchema)]
pub struct ApiKeyRequest {
    api_key: String,
    /// Provider the key belongs to; defaults to the configured provider
    provider: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ConfigUpdate {
    provider: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

impl ConfigUpdate {
    fn into_persisted(self) -> Result<PersistedConfig, ScribeError> {
        let provider = self
            .provider
            .as_deref()
            .map(str::parse::<LlmProvider>)
            .transpose()
            .map_err(ScribeError::InvalidInput)?;
        Ok(PersistedConfig {
            provider,
            model: self.model.filter(|m| !m.trim().is_empty()),
            base_url: self.base_url,
            prompt_for_key: None,
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct ConfigResponse {
    #[schema(value_type = Object)]
    config: PersistedConfig,
    /// Provider/model actually used for the next run
    #[schema(value_type = Object)]
    effective: ModelConfig,
}

/// Current run stage and configuration summary
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "config",
    responses(
        (status = 200, description = "Current status", body = StatusResponse)
    )
)]
pub async fn get_status(State(state): State<SharedState>) -> Json<StatusResponse> {
    let progress = state.progress.read().await.clone();
    let credential = state.credential.read().await.clone();
    let model = state.model_config().await;

    let finished = progress.is_complete();
    Json(StatusResponse {
        stage: progress.stage,
        stage_label: progress.stage.label().to_string(),
        percent: progress.percent(),
        running: progress.stage != CrewStage::Idle && !finished,
        last_run_succeeded: finished.then(|| progress.is_success()),
        active_agent: progress.active_agent,
        credential_configured: credential.is_some(),
        credential_source: credential.as_ref().map(Credential::source),
        credential_preview: credential.map(|c| c.masked()),
        provider: model.provider.id().to_string(),
        model: model.model,
    })
}

/// The three personas and the task each one runs
#[utoipa::path(
    get,
    path = "/api/v1/agents",
    tag = "config",
    responses(
        (status = 200, description = "Crew roster in pipeline order", body = [AgentInfo])
    )
)]
pub async fn list_agents() -> Json<Vec<AgentInfo>> {
    let personas = create_personas();
    let tasks = create_tasks(&personas.planner, &personas.writer, &personas.editor);

    let agents = tasks
        .in_order()
        .iter()
        .map(|task| AgentInfo {
            id: task.agent.id.clone(),
            role: task.agent.role.clone(),
            goal: task.agent.goal.raw().to_string(),
            allow_delegation: task.agent.allow_delegation,
            task: task.id.as_str().to_string(),
            depends_on: task.context.map(|t| t.as_str().to_string()),
        })
        .collect();
    Json(agents)
}

/// Get current configuration
#[utoipa::path(
    get,
    path = "/api/v1/config",
    tag = "config",
    responses(
        (status = 200, description = "Persisted and effective configuration", body = ConfigResponse)
    )
)]
pub async fn get_config(State(state): State<SharedState>) -> Json<ConfigResponse> {
    let config = state.config.read().await.clone();
    let effective = config.model_config();
    Json(ConfigResponse { config, effective })
}

/// Update configuration (partial merge)
#[utoipa::path(
    patch,
    path = "/api/v1/config",
    tag = "config",
    request_body = ConfigUpdate,
    responses(
        (status = 200, description = "Updated configuration", body = ConfigResponse),
        (status = 400, description = "Unknown provider", body = ErrorBody),
        (status = 500, description = "Config could not be saved", body = ErrorBody)
    )
)]
pub async fn update_config(
    State(state): State<SharedState>,
    Json(update): Json<ConfigUpdate>,
) -> ApiResult<Json<ConfigResponse>> {
    let updates = update.into_persisted()?;
    let previous_provider = state.model_config().await.provider;

    let config = {
        let mut config = state.config.write().await;
        config.merge(updates);
        config.clone()
    };
    config
        .save(&state.runtime_dir)
        .await
        .map_err(|e| ScribeError::Config(format!("{:#}", e)))?;

    let effective = config.model_config();
    if effective.provider != previous_provider {
        // A different provider needs a different key
        let credential = state.resolver().await.resolve().ok();
        if credential.is_none() {
            tracing::warn!(provider = %effective.provider.id(), "No API key found for the new provider");
        }
        *state.credential.write().await = credential;
    }

    tracing::info!(provider = %effective.provider.id(), model = %effective.model, "Configuration updated");
    Ok(Json(ConfigResponse { config, effective }))
}

/// Get available LLM providers
#[utoipa::path(
    get,
    path = "/api/v1/providers",
    tag = "config",
    responses(
        (status = 200, description = "List of supported LLM providers", body = ProvidersResponse)
    )
)]
pub async fn get_providers() -> Json<ProvidersResponse> {
    let providers = LlmProvider::all()
        .into_iter()
        .map(|p| ProviderInfo {
            id: p.id().to_string(),
            name: p.display_name().to_string(),
            default_model: p.default_model().to_string(),
            supports_base_url: p.supports_base_url(),
            env_var: p.env_var().to_string(),
        })
        .collect();
    Json(ProvidersResponse { providers })
}

/// Save an API key to .scribe/.env and use it from now on
#[utoipa::path(
    post,
    path = "/api/v1/settings/api-key",
    tag = "config",
    request_body = ApiKeyRequest,
    responses(
        (status = 200, description = "API key saved", body = ApiResponse),
        (status = 400, description = "Empty key or unknown provider", body = ErrorBody)
    )
)]
pub async fn save_api_key(
    State(state): State<SharedState>,
    Json(req): Json<ApiKeyRequest>,
) -> ApiResult<Json<ApiResponse>> {
    let configured = state.model_config().await.provider;
    let provider = match req.provider.as_deref() {
        Some(p) => p.parse::<LlmProvider>().map_err(ScribeError::InvalidInput)?,
        None => configured,
    };

    let credential = Credential::new(provider.env_var(), req.api_key);
    CredentialResolver::new(provider, &state.runtime_dir)
        .with_prompt(PromptMode::Disabled)
        .persist(&credential)?;

    if provider == configured {
        *state.credential.write().await = Some(credential);
    }

    Ok(Json(ApiResponse {
        success: true,
        message: format!("{} API key configured", provider.display_name()),
    }))
}
