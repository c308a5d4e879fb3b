use std::path::{Path, PathBuf};

use super::loader::supports;
use super::{DEFAULT_MAX_FILE_SIZE, Document, DocumentLoader, TextLoader};
use crate::error::RagError;

/// What to do when a single file in the corpus cannot be turned into text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure and continue with the remaining files.
    #[default]
    Skip,
    /// Abort the whole batch with [`RagError::Parse`].
    FailFast,
}

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// File extensions (without the dot) to pick up, matched case-insensitively.
    pub extensions: Vec<String>,
    pub max_file_size: u64,
    pub policy: FailurePolicy,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["pdf".into()],
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            policy: FailurePolicy::Skip,
        }
    }
}

/// Reads every matching file of a directory (non-recursive) into a [`Document`].
pub struct Extractor {
    loaders: Vec<Box<dyn DocumentLoader>>,
    extensions: Vec<String>,
    policy: FailurePolicy,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("loaders", &self.loaders.len())
            .field("extensions", &self.extensions)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Extractor {
    /// Build an extractor with the built-in loaders.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the extension filter is empty or names an
    /// extension no built-in loader understands.
    pub fn new(config: ExtractorConfig) -> Result<Self, RagError> {
        let mut loaders: Vec<Box<dyn DocumentLoader>> = vec![Box::new(TextLoader {
            max_file_size: config.max_file_size,
        })];
        #[cfg(feature = "pdf")]
        loaders.push(Box::new(super::PdfLoader {
            max_file_size: config.max_file_size,
        }));

        Self::with_loaders(loaders, config.extensions, config.policy)
    }

    /// Build an extractor around caller-supplied loaders.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `extensions` is empty or contains an
    /// extension none of `loaders` supports.
    pub fn with_loaders(
        loaders: Vec<Box<dyn DocumentLoader>>,
        extensions: Vec<String>,
        policy: FailurePolicy,
    ) -> Result<Self, RagError> {
        let extensions: Vec<String> = extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        if extensions.is_empty() {
            return Err(RagError::Config(
                "at least one document extension is required".into(),
            ));
        }
        for ext in &extensions {
            let known = loaders
                .iter()
                .any(|l| l.supported_extensions().iter().any(|s| s == ext));
            if !known {
                return Err(RagError::Config(format!(
                    "no document loader available for extension `{ext}`"
                )));
            }
        }

        Ok(Self {
            loaders,
            extensions,
            policy,
        })
    }

    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Raw text of every matching document in `dir`, one string per file.
    ///
    /// # Errors
    ///
    /// See [`Extractor::extract_documents`].
    pub async fn extract_text(&self, dir: &Path) -> Result<Vec<String>, RagError> {
        Ok(self
            .extract_documents(dir)
            .await?
            .into_iter()
            .map(|d| d.content)
            .collect())
    }

    /// Load every matching file in `dir`, in lexicographic path order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::FileSystem`] if `dir` is missing, not a directory or
    /// unreadable, and [`RagError::Parse`] for an unreadable file under
    /// [`FailurePolicy::FailFast`].
    pub async fn extract_documents(&self, dir: &Path) -> Result<Vec<Document>, RagError> {
        let paths = self.candidate_paths(dir).await?;
        tracing::debug!(dir = %dir.display(), files = paths.len(), "extracting documents");

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(loader) = self.loader_for(&path) else {
                continue;
            };
            match loader.load(&path).await {
                Ok(doc) => documents.push(doc),
                Err(source) => match self.policy {
                    FailurePolicy::FailFast => return Err(RagError::Parse { path, source }),
                    FailurePolicy::Skip => {
                        tracing::warn!(path = %path.display(), "skipping document: {source}");
                    }
                },
            }
        }
        Ok(documents)
    }

    async fn candidate_paths(&self, dir: &Path) -> Result<Vec<PathBuf>, RagError> {
        let fs_err = |source| RagError::FileSystem {
            path: dir.to_path_buf(),
            source,
        };

        let meta = tokio::fs::metadata(dir).await.map_err(fs_err)?;
        if !meta.is_dir() {
            return Err(fs_err(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                "not a directory",
            )));
        }

        let mut entries = tokio::fs::read_dir(dir).await.map_err(fs_err)?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(fs_err)? {
            let path = entry.path();
            if !self.matches_extension(&path) {
                continue;
            }
            // follows symlinks
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => paths.push(path),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), "skipping unreadable entry: {e}");
                }
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    fn loader_for(&self, path: &Path) -> Option<&dyn DocumentLoader> {
        for loader in &self.loaders {
            if supports(loader.as_ref(), path) {
                return Some(loader.as_ref());
            }
        }
        None
    }
}
