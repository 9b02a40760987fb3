//! In-memory page.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Result;
use crate::page::Page;

/// Page whose body lives in memory. Clones share the same body, so a test or
/// headless host can keep one clone and hand another to the render worker.
///
/// # Example
///
/// ```
/// use page_censor::MemoryPage;
///
/// let page = MemoryPage::new("https://example.com/", "<p>hi</p>");
/// assert_eq!(page.html(), "<p>hi</p>");
/// ```
#[derive(Clone)]
pub struct MemoryPage {
    url: Arc<Mutex<String>>,
    html: Arc<Mutex<String>>,
    publishes: Arc<Mutex<usize>>,
}

impl MemoryPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: Arc::new(Mutex::new(url.into())),
            html: Arc::new(Mutex::new(html.into())),
            publishes: Arc::new(Mutex::new(0)),
        }
    }

    /// Current body markup.
    pub fn html(&self) -> String {
        self.html
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Simulate navigation to another document.
    pub fn navigate(&self, url: impl Into<String>) {
        *self.url.lock().unwrap_or_else(PoisonError::into_inner) = url.into();
    }

    /// Number of successful publishes so far.
    pub fn publish_count(&self) -> usize {
        *self.publishes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Page for MemoryPage {
    fn url(&self) -> String {
        self.url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn publish(&self, html: &str) -> Result<()> {
        *self.html.lock().unwrap_or_else(PoisonError::into_inner) = html.to_string();
        *self.publishes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        tracing::debug!("Published {} bytes to in-memory page", html.len());
        Ok(())
    }
}
