use std::str::FromStr;

use super::Config;

/// Read and parse `key`, warning about (and ignoring) values that do not parse.
fn parsed<T: FromStr>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    if let Ok(parsed) = v.trim().parse() {
        Some(parsed)
    } else {
        tracing::warn!("ignoring invalid {key} value: {v}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_rag();
        if let Some(secs) = parsed::<u64>("LEXRAG_TIMEOUT_COMPLETION") {
            self.timeouts.completion = secs;
        }
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Ok(v) = std::env::var("LEXRAG_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("LEXRAG_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(tokens) = parsed::<u32>("LEXRAG_LLM_MAX_TOKENS") {
            self.llm.max_tokens = tokens;
        }
    }

    fn apply_env_overrides_rag(&mut self) {
        if let Some(size) = parsed::<usize>("LEXRAG_RAG_MAX_CHUNK_SIZE") {
            self.rag.max_chunk_size = size;
        }
        if let Some(n) = parsed::<usize>("LEXRAG_RAG_TOP_N") {
            self.rag.top_n = n;
        }
        if let Ok(v) = std::env::var("LEXRAG_RAG_EXTENSIONS") {
            self.rag.extensions = v
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(enabled) = parsed::<bool>("LEXRAG_RAG_CASE_INSENSITIVE") {
            self.rag.case_insensitive = enabled;
        }
        if let Some(enabled) = parsed::<bool>("LEXRAG_RAG_REMOVE_STOP_WORDS") {
            self.rag.remove_stop_words = enabled;
        }
        if let Some(enabled) = parsed::<bool>("LEXRAG_RAG_FAIL_FAST") {
            self.rag.fail_fast = enabled;
        }
    }
}
