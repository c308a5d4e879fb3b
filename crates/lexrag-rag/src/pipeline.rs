use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use lexrag_llm::LlmProvider;
use lexrag_llm::prompt::{DEFAULT_SYSTEM_PROMPT, grounded_messages};
use tokio_util::sync::CancellationToken;

use crate::document::{Chunk, Extractor, TextSplitter, remove_stop_words, token_count};
use crate::error::RagError;
use crate::retriever::{Retriever, ScoredChunk};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Strip these (lowercase) words from every chunk before ranking.
    pub stop_words: Option<HashSet<String>>,
    pub system_prompt: String,
    /// Upper bound on the completion call. `None` waits indefinitely.
    pub completion_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stop_words: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            completion_timeout: None,
        }
    }
}

/// The completion text together with the chunks it was grounded on.
#[derive(Debug, Clone, PartialEq)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<ScoredChunk>,
}

/// Extract, chunk, retrieve and complete, in that order, on every call.
///
/// Holds no per-query state, so one pipeline can serve concurrent queries as
/// long as the provider can.
pub struct RagPipeline<P: LlmProvider> {
    extractor: Extractor,
    splitter: TextSplitter,
    retriever: Retriever,
    provider: P,
    config: PipelineConfig,
}

impl<P: LlmProvider> std::fmt::Debug for RagPipeline<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("extractor", &self.extractor)
            .field("splitter", &self.splitter)
            .field("retriever", &self.retriever)
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish()
    }
}

impl<P: LlmProvider> RagPipeline<P> {
    #[must_use]
    pub fn new(
        extractor: Extractor,
        splitter: TextSplitter,
        retriever: Retriever,
        provider: P,
        config: PipelineConfig,
    ) -> Self {
        Self {
            extractor,
            splitter,
            retriever,
            provider,
            config,
        }
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Answer `query` from the documents in `dir`.
    ///
    /// # Errors
    ///
    /// Same as [`RagPipeline::answer`], minus external cancellation.
    pub async fn execute(&self, query: &str, dir: &Path) -> Result<String, RagError> {
        let token = CancellationToken::new();
        Ok(self.answer(query, dir, &token).await?.answer)
    }

    /// Answer `query` from the documents in `dir`, returning the chunks used.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidArgument`] for a blank query or empty path, before any I/O.
    /// - [`RagError::FileSystem`] / [`RagError::Parse`] from extraction.
    /// - [`RagError::Cancelled`] if `cancel` fires or the completion times out.
    /// - [`RagError::Completion`] when the provider fails.
    pub async fn answer(
        &self,
        query: &str,
        dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<RagAnswer, RagError> {
        validate(query, dir)?;
        if cancel.is_cancelled() {
            return Err(RagError::Cancelled);
        }

        let sources = self.select(query, dir).await?;
        let context: Vec<&str> = sources.iter().map(|s| s.chunk.content.as_str()).collect();
        let messages = grounded_messages(&self.config.system_prompt, query, &context);

        tracing::debug!(
            provider = self.provider.name(),
            passages = context.len(),
            "requesting completion"
        );
        let answer = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RagError::Cancelled),
            result = self.bounded(self.provider.chat(&messages)) => result?,
        };

        Ok(RagAnswer { answer, sources })
    }

    /// Rank the corpus against `query` without calling the provider.
    ///
    /// # Errors
    ///
    /// [`RagError::InvalidArgument`], [`RagError::FileSystem`] or [`RagError::Parse`]
    /// as for [`RagPipeline::answer`].
    pub async fn search(&self, query: &str, dir: &Path) -> Result<Vec<ScoredChunk>, RagError> {
        validate(query, dir)?;
        self.select(query, dir).await
    }

    /// Every chunk of the corpus in `dir`, after optional stop-word stripping.
    ///
    /// # Errors
    ///
    /// Extraction errors, see [`Extractor::extract_documents`].
    pub async fn chunks(&self, dir: &Path) -> Result<Vec<Chunk>, RagError> {
        let documents = self.extractor.extract_documents(dir).await?;
        let mut chunks: Vec<Chunk> = documents
            .iter()
            .flat_map(|doc| self.splitter.split(doc))
            .collect();

        if let Some(stop_words) = &self.config.stop_words {
            let stripped = remove_stop_words(
                &chunks.iter().map(|c| c.content.as_str()).collect::<Vec<_>>(),
                stop_words,
            );
            for (chunk, content) in chunks.iter_mut().zip(stripped) {
                chunk.content = content;
            }
        }

        tracing::debug!(
            documents = documents.len(),
            chunks = chunks.len(),
            tokens = token_count(&chunks.iter().map(|c| c.content.as_str()).collect::<Vec<_>>()),
            "corpus chunked"
        );
        Ok(chunks)
    }

    async fn select(&self, query: &str, dir: &Path) -> Result<Vec<ScoredChunk>, RagError> {
        let chunks = self.chunks(dir).await?;
        if chunks.is_empty() {
            tracing::warn!(dir = %dir.display(), "no text found in corpus");
        }
        Ok(self.retriever.retrieve(query, &chunks))
    }

    async fn bounded<F>(&self, completion: F) -> Result<String, RagError>
    where
        F: Future<Output = Result<String, lexrag_llm::LlmError>>,
    {
        match self.config.completion_timeout {
            Some(limit) => match tokio::time::timeout(limit, completion).await {
                Ok(result) => Ok(result?),
                Err(_) => {
                    tracing::warn!(timeout_secs = limit.as_secs_f64(), "completion timed out");
                    Err(RagError::Cancelled)
                }
            },
            None => Ok(completion.await?),
        }
    }
}

fn validate(query: &str, dir: &Path) -> Result<(), RagError> {
    if query.trim().is_empty() {
        return Err(RagError::InvalidArgument("query must not be empty".into()));
    }
    if dir.as_os_str().is_empty() {
        return Err(RagError::InvalidArgument(
            "document directory must not be empty".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use lexrag_llm::mock::MockProvider;
    use lexrag_llm::provider::Role;

    use super::*;
    use crate::document::{ExtractorConfig, SplitterConfig, default_stop_words};
    use crate::retriever::RetrievalConfig;

    fn pipeline(provider: MockProvider, config: PipelineConfig) -> RagPipeline<MockProvider> {
        let extractor = Extractor::new(ExtractorConfig {
            extensions: vec!["txt".into()],
            ..ExtractorConfig::default()
        })
        .unwrap();
        let splitter = TextSplitter::new(SplitterConfig { max_chunk_size: 40 }).unwrap();
        let retriever = Retriever::new(RetrievalConfig {
            top_n: 1,
            ..RetrievalConfig::default()
        });
        RagPipeline::new(extractor, splitter, retriever, provider, config)
    }

    fn corpus() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("animals.txt"),
            "The quick brown fox jumps. The lazy dog sleeps all day.",
        )
        .unwrap();
        std::fs::write(dir.path().join("plants.txt"), "Ferns grow in shade.").unwrap();
        dir
    }

    #[tokio::test]
    async fn execute_returns_provider_answer() {
        let dir = corpus();
        let mock = MockProvider::with_responses(vec!["The fox jumps.".into()]);
        let p = pipeline(mock.clone(), PipelineConfig::default());

        let answer = p.execute("What does the fox do?", dir.path()).await.unwrap();
        assert_eq!(answer, "The fox jumps.");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn prompt_contains_query_and_best_chunk() {
        let dir = corpus();
        let mock = MockProvider::default();
        let p = pipeline(mock.clone(), PipelineConfig::default());

        let result = p
            .answer("quick fox", dir.path(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].chunk.content, "The quick brown fox jumps. ");
        assert!(result.sources[0].chunk.metadata.source.ends_with("animals.txt"));

        let sent = &mock.received()[0];
        assert_eq!(sent[0].role, Role::System);
        assert!(sent[1].content.contains("The quick brown fox jumps."));
        assert!(sent[1].content.ends_with("Question: quick fox"));
    }

    #[tokio::test]
    async fn blank_query_rejected_before_io() {
        let mock = MockProvider::default();
        let p = pipeline(mock.clone(), PipelineConfig::default());

        let result = p.execute("   ", Path::new("/nonexistent")).await;
        assert!(matches!(result, Err(RagError::InvalidArgument(_))));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_dir_path_rejected() {
        let p = pipeline(MockProvider::default(), PipelineConfig::default());
        let result = p.search("fox", Path::new("")).await;
        assert!(matches!(result, Err(RagError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn missing_directory_never_reaches_provider() {
        let mock = MockProvider::default();
        let p = pipeline(mock.clone(), PipelineConfig::default());

        let result = p.execute("fox", Path::new("/nonexistent/corpus")).await;
        assert!(matches!(result, Err(RagError::FileSystem { .. })));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_corpus_still_asks_with_no_context() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockProvider::default();
        let p = pipeline(mock.clone(), PipelineConfig::default());

        let result = p
            .answer("anything", dir.path(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.sources.is_empty());
        assert!(mock.received()[0][1].content.starts_with("No context passages"));
    }

    #[tokio::test]
    async fn provider_error_surfaces_verbatim() {
        let dir = corpus();
        let p = pipeline(MockProvider::failing(), PipelineConfig::default());

        let err = p.execute("fox", dir.path()).await.unwrap_err();
        assert!(matches!(err, RagError::Completion(_)));
        assert_eq!(err.to_string(), "mock LLM error");
    }

    #[tokio::test]
    async fn pre_cancelled_token_skips_work() {
        let dir = corpus();
        let mock = MockProvider::default();
        let p = pipeline(mock.clone(), PipelineConfig::default());
        let token = CancellationToken::new();
        token.cancel();

        let result = p.answer("fox", dir.path(), &token).await;
        assert!(matches!(result, Err(RagError::Cancelled)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_completion() {
        let dir = corpus();
        let mock = MockProvider::default().with_delay(10_000);
        let p = pipeline(mock.clone(), PipelineConfig::default());
        let token = CancellationToken::new();

        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            trigger.cancel();
        });

        let result = p.answer("fox", dir.path(), &token).await;
        assert!(matches!(result, Err(RagError::Cancelled)));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_timeout_is_cancellation() {
        let dir = corpus();
        let mock = MockProvider::default().with_delay(10_000);
        let p = pipeline(
            mock,
            PipelineConfig {
                completion_timeout: Some(Duration::from_millis(50)),
                ..PipelineConfig::default()
            },
        );

        let result = p.execute("fox", dir.path()).await;
        assert!(matches!(result, Err(RagError::Cancelled)));
    }

    #[tokio::test]
    async fn search_does_not_call_provider() {
        let dir = corpus();
        let mock = MockProvider::default();
        let p = pipeline(mock.clone(), PipelineConfig::default());

        let hits = p.search("Ferns shade", dir.path()).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].chunk.metadata.source.ends_with("plants.txt"));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn stop_words_are_stripped_from_chunks() {
        let dir = corpus();
        let p = pipeline(
            MockProvider::default(),
            PipelineConfig {
                stop_words: Some(default_stop_words()),
                ..PipelineConfig::default()
            },
        );

        let chunks = p.chunks(dir.path()).await.unwrap();
        assert_eq!(chunks[0].content, "quick brown fox jumps.");
        assert!(chunks.iter().all(|c| !c.content.split_whitespace().any(|t| t == "The")));
    }
}
