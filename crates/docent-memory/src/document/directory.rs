use std::path::{Path, PathBuf};

use super::{DEFAULT_MAX_FILE_SIZE, DocumentError, DocumentLoader, SourceDocument, TextLoader};
use crate::Degradation;

/// What to do with a file whose extension no loader claims.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnsupportedPolicy {
    #[default]
    Skip,
    Warn,
    Error,
}

/// Result of scanning a documents directory.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub documents: Vec<SourceDocument>,
    /// Files ignored because of their extension.
    pub skipped: usize,
    /// Files that matched a loader but could not be read.
    pub failed: usize,
}

impl LoadOutcome {
    #[must_use]
    pub fn notice(&self) -> Option<Degradation> {
        self.documents
            .is_empty()
            .then_some(Degradation::NoDocumentsFound)
    }
}

/// Loads every supported file directly inside one directory.
pub struct DirectoryLoader {
    loaders: Vec<Box<dyn DocumentLoader>>,
    policy: UnsupportedPolicy,
}

impl Default for DirectoryLoader {
    fn default() -> Self {
        Self::new(UnsupportedPolicy::default(), DEFAULT_MAX_FILE_SIZE)
    }
}

impl DirectoryLoader {
    /// Text loader always, PDF loader when the `pdf` feature is on.
    #[must_use]
    pub fn new(policy: UnsupportedPolicy, max_file_size: u64) -> Self {
        let mut loaders: Vec<Box<dyn DocumentLoader>> =
            vec![Box::new(TextLoader { max_file_size })];
        #[cfg(feature = "pdf")]
        loaders.push(Box::new(super::PdfLoader { max_file_size }));
        Self { loaders, policy }
    }

    #[must_use]
    pub fn with_loader(mut self, loader: Box<dyn DocumentLoader>) -> Self {
        self.loaders.push(loader);
        self
    }

    fn loader_for(&self, path: &Path) -> Option<&dyn DocumentLoader> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.loaders
            .iter()
            .find(|l| l.supported_extensions().contains(&ext.as_str()))
            .map(AsRef::as_ref)
    }

    /// Scan `dir` in file-name order.
    ///
    /// A missing directory yields an empty outcome. Files that fail to load are logged
    /// and counted in [`LoadOutcome::failed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed, or if an unsupported file is
    /// found under [`UnsupportedPolicy::Error`].
    pub async fn load(&self, dir: &Path) -> Result<LoadOutcome, DocumentError> {
        let mut outcome = LoadOutcome::default();

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(dir = %dir.display(), "documents directory not found");
                return Ok(outcome);
            }
            Err(e) => return Err(e.into()),
        };

        let mut paths: Vec<PathBuf> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            // follows symlinks; a dangling link counts as a failed file
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => paths.push(path),
                Ok(_) => tracing::debug!(path = %path.display(), "skipping non-file entry"),
                Err(e) => {
                    tracing::warn!(path = %path.display(), "cannot stat entry: {e}");
                    outcome.failed += 1;
                }
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        for path in paths {
            let Some(loader) = self.loader_for(&path) else {
                match self.policy {
                    UnsupportedPolicy::Skip => {
                        tracing::debug!(path = %path.display(), "skipping unsupported file");
                    }
                    UnsupportedPolicy::Warn => {
                        tracing::warn!(path = %path.display(), "skipping unsupported file");
                    }
                    UnsupportedPolicy::Error => {
                        return Err(DocumentError::UnsupportedFormat(path.display().to_string()));
                    }
                }
                outcome.skipped += 1;
                continue;
            };

            match loader.load(&path).await {
                Ok(doc) => {
                    tracing::debug!(
                        path = %doc.path,
                        chars = doc.raw_text.chars().count(),
                        "loaded document"
                    );
                    outcome.documents.push(doc);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "failed to load document: {e}");
                    outcome.failed += 1;
                }
            }
        }

        tracing::info!(
            dir = %dir.display(),
            documents = outcome.documents.len(),
            skipped = outcome.skipped,
            failed = outcome.failed,
            "document scan complete"
        );
        Ok(outcome)
    }
}
