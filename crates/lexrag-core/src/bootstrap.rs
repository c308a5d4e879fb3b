//! Application bootstrap: config resolution and pipeline construction.

use std::path::{Path, PathBuf};

use anyhow::Context;
use lexrag_llm::openai::OpenAiProvider;
use lexrag_llm::provider::Message;
use lexrag_llm::{LlmError, LlmProvider};
use lexrag_rag::document::{
    Extractor, ExtractorConfig, FailurePolicy, SplitterConfig, TextSplitter, default_stop_words,
};
use lexrag_rag::{PipelineConfig, RagPipeline, RetrievalConfig, Retriever};

use crate::config::{Config, OPENAI_API_KEY_VAR};
use crate::vault::VaultProvider;

pub const CONFIG_PATH_VAR: &str = "LEXRAG_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Priority: `--config` argument > `LEXRAG_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Load, override from env, validate, then resolve secrets.
///
/// # Errors
///
/// Returns an error if the file cannot be parsed, a value is out of range, or
/// the vault fails.
pub async fn load_config(path: &Path, vault: &dyn VaultProvider) -> anyhow::Result<Config> {
    let mut config = Config::load(path)?;
    config.validate()?;
    config.resolve_secrets(vault).await?;
    Ok(config)
}

/// Build the OpenAI-compatible provider from `[llm]` and the resolved API key.
///
/// # Errors
///
/// Returns an error if no API key was resolved.
pub fn build_provider(config: &Config) -> anyhow::Result<OpenAiProvider> {
    let api_key = config
        .secrets
        .openai_api_key
        .as_ref()
        .with_context(|| format!("{OPENAI_API_KEY_VAR} is not set"))?;
    let llm = &config.llm;
    let provider = OpenAiProvider::new(
        api_key.expose().to_owned(),
        llm.base_url.clone(),
        llm.model.clone(),
    )
    .with_sampling(llm.max_tokens, llm.temperature, llm.top_p)
    .with_max_retries(llm.max_retries);
    tracing::debug!(model = provider.model(), base_url = %llm.base_url, "provider configured");
    Ok(provider)
}

/// Stand-in provider for commands that never reach the completion step.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider;

impl LlmProvider for OfflineProvider {
    async fn chat(&self, _messages: &[Message]) -> Result<String, LlmError> {
        Err(LlmError::Other(
            "no completion provider is configured for this command".into(),
        ))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "offline"
    }
}

/// Map configuration onto the extractor, splitter, retriever and pipeline.
///
/// # Errors
///
/// Returns an error if the chunk size is zero or an extension has no loader.
pub fn build_pipeline<P: LlmProvider>(
    config: &Config,
    provider: P,
) -> anyhow::Result<RagPipeline<P>> {
    let rag = &config.rag;
    let extractor = Extractor::new(ExtractorConfig {
        extensions: rag.extensions.clone(),
        max_file_size: rag.max_file_size,
        policy: if rag.fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::Skip
        },
    })?;
    let splitter = TextSplitter::new(SplitterConfig {
        max_chunk_size: rag.max_chunk_size,
    })?;
    let retriever = Retriever::new(RetrievalConfig {
        top_n: rag.top_n,
        case_insensitive: rag.case_insensitive,
    });
    let pipeline_config = PipelineConfig {
        stop_words: rag.remove_stop_words.then(default_stop_words),
        system_prompt: config.llm.system_prompt.clone(),
        completion_timeout: config.timeouts.completion_timeout(),
    };

    Ok(RagPipeline::new(
        extractor,
        splitter,
        retriever,
        provider,
        pipeline_config,
    ))
}
