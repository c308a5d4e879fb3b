#[cfg(feature = "pdf")]
mod pdf;
mod text;

#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;
pub use text::TextLoader;

use std::path::{Path, PathBuf};

use super::{DocumentError, DocumentLoader};

/// Canonicalize `path` and reject files larger than `max_size`.
async fn checked_path(path: &Path, max_size: u64) -> Result<PathBuf, DocumentError> {
    let path = tokio::fs::canonicalize(path).await?;
    let meta = tokio::fs::metadata(&path).await?;
    if meta.len() > max_size {
        return Err(DocumentError::FileTooLarge(meta.len()));
    }
    Ok(path)
}

/// Whether `loader` declares support for the extension of `path` (case-insensitive).
#[must_use]
pub fn supports(loader: &dyn DocumentLoader, path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            loader
                .supported_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}
