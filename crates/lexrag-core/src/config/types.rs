use std::time::Duration;

use lexrag_llm::openai::{
    DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
    DEFAULT_TOP_P,
};
use lexrag_llm::prompt::DEFAULT_SYSTEM_PROMPT;
use lexrag_rag::document::DEFAULT_MAX_FILE_SIZE;
use lexrag_rag::document::splitter::DEFAULT_MAX_CHUNK_SIZE;
use lexrag_rag::retriever::DEFAULT_TOP_N;
use serde::{Deserialize, Serialize};

use crate::vault::Secret;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_model() -> String {
    DEFAULT_MODEL.into()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_top_p() -> f32 {
    DEFAULT_TOP_P
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}

/// Completion endpoint and sampling parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_retries: default_max_retries(),
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_max_chunk_size() -> usize {
    DEFAULT_MAX_CHUNK_SIZE
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_extensions() -> Vec<String> {
    vec!["pdf".into()]
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

/// Extraction, chunking and retrieval settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RagConfig {
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub case_insensitive: bool,
    #[serde(default)]
    pub remove_stop_words: bool,
    /// Abort on the first unreadable file instead of skipping it.
    #[serde(default)]
    pub fail_fast: bool,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            top_n: default_top_n(),
            extensions: default_extensions(),
            case_insensitive: false,
            remove_stop_words: false,
            fail_fast: false,
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_completion_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct TimeoutConfig {
    /// Seconds to wait for the completion call; `0` disables the limit.
    #[serde(default = "default_completion_timeout")]
    pub completion: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            completion: default_completion_timeout(),
        }
    }
}

impl TimeoutConfig {
    #[must_use]
    pub fn completion_timeout(&self) -> Option<Duration> {
        (self.completion > 0).then(|| Duration::from_secs(self.completion))
    }
}

#[derive(Debug, Default)]
pub struct ResolvedSecrets {
    pub openai_api_key: Option<Secret>,
}
