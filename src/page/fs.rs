//! Filesystem-backed page.

use std::path::PathBuf;

use crate::error::{CensorError, Result};
use crate::page::Page;

/// Page that writes each rendered body to a file, overwriting the previous
/// render. Intermediate directories are created automatically.
///
/// # Example
///
/// ```rust,no_run
/// use page_censor::FsPage;
///
/// let page = FsPage::new("/tmp/rendered/index.html", "https://example.com/");
/// ```
pub struct FsPage {
    path: PathBuf,
    url: String,
}

impl FsPage {
    pub fn new(path: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
        }
    }
}

impl Page for FsPage {
    fn url(&self) -> String {
        self.url.clone()
    }

    async fn publish(&self, html: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CensorError::Publish(Box::new(e)))?;
        }

        tokio::fs::write(&self.path, html)
            .await
            .map_err(|e| CensorError::Publish(Box::new(e)))?;

        tracing::debug!("Wrote {} bytes to {}", html.len(), self.path.display());
        Ok(())
    }
}
