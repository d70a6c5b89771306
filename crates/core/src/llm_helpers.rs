//! # LLM Helpers
//!
//! Provider dispatch for radkit clients. radkit has one client type per
//! provider, so the match lives in a macro rather than behind a trait object.

/// Run an `LlmFunction` with the configured provider and an explicit API key.
///
/// ```rust,ignore
/// let out = run_llm_function!(&config, credential.expose(), TaskDeliverable, system, prompt)?;
/// ```
#[macro_export]
macro_rules! run_llm_function {
    (@call $llm:expr, $output_type:ty, $system_prompt:expr, $input:expr) => {
        radkit::agent::LlmFunction::<$output_type>::new_with_system_instructions(
            $llm,
            $system_prompt,
        )
        .run($input)
        .await
        .map_err(Into::into)
    };
    ($config:expr, $api_key:expr, $output_type:ty, $system_prompt:expr, $input:expr) => {{
        use radkit::models::providers::{
            AnthropicLlm, DeepSeekLlm, GeminiLlm, GrokLlm, OpenAILlm, OpenRouterLlm,
        };
        use $crate::models::LlmProvider;

        let config = $config;
        let api_key: &str = $api_key;
        let model = config.model.as_str();
        let result: anyhow::Result<$output_type> = match config.provider {
            LlmProvider::OpenAI => {
                let llm = OpenAILlm::new(model, api_key);
                let llm = match &config.base_url {
                    Some(base_url) => llm.with_base_url(base_url),
                    None => llm,
                };
                $crate::run_llm_function!(@call llm, $output_type, $system_prompt, $input)
            }
            LlmProvider::Anthropic => $crate::run_llm_function!(
                @call AnthropicLlm::new(model, api_key), $output_type, $system_prompt, $input
            ),
            LlmProvider::Gemini => $crate::run_llm_function!(
                @call GeminiLlm::new(model, api_key), $output_type, $system_prompt, $input
            ),
            LlmProvider::OpenRouter => $crate::run_llm_function!(
                @call OpenRouterLlm::new(model, api_key), $output_type, $system_prompt, $input
            ),
            LlmProvider::Grok => $crate::run_llm_function!(
                @call GrokLlm::new(model, api_key), $output_type, $system_prompt, $input
            ),
            LlmProvider::DeepSeek => $crate::run_llm_function!(
                @call DeepSeekLlm::new(model, api_key), $output_type, $system_prompt, $input
            ),
        };
        result
    }};
}

pub use run_llm_function;
