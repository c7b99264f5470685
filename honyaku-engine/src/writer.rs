use crate::error::{EngineError, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;
use url::Url;

/// Persists rewritten pages under the output directory.
///
/// Writes land in a per-call temp file first and are renamed into place, so
/// an aborted run never leaves a partially written page behind. Two URLs
/// whose paths share a basename collapse to one file; the later write wins.
pub struct OutputWriter {
    output_dir: PathBuf,
    write_seq: AtomicU64,
}

impl OutputWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            write_seq: AtomicU64::new(0),
        }
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// Destination file name for a URL: the final non-empty path segment,
    /// `index` for the site root or a trailing slash.
    pub fn file_name_for(url: &Url) -> String {
        url.path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
            .unwrap_or("index")
            .to_string()
    }

    pub async fn persist(&self, url: &str, content: &[u8]) -> Result<PathBuf> {
        let parsed = Url::parse(url)
            .map_err(|e| EngineError::InvalidUrl(format!("{}: {}", url, e)))?;
        let name = Self::file_name_for(&parsed);
        let dest = self.output_dir.join(&name);

        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = self.output_dir.join(format!("{}.{}.tmp", name, seq));

        if let Err(e) = tokio::fs::write(&tmp, content).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, &dest).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!("Persisted {} to {}", url, dest.display());
        Ok(dest)
    }
}
