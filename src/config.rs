//! Builder for configuring and launching the background render worker.

use crate::coordinator::Coordinator;
use crate::handle::CensorHandle;
use crate::message::InboundBatch;
use crate::page::Page;
use crate::settings::SettingsStore;
use crate::worker;

/// Builder for configuring and starting a [`CensorHandle`].
///
/// # Example
///
/// ```rust,no_run
/// use page_censor::{CensorBuilder, MemoryPage, SettingsStore};
///
/// # async fn example() {
/// let store = SettingsStore::default();
/// let page = MemoryPage::new("https://example.com/", "<body>hello</body>");
/// let handle = CensorBuilder::new(page)
///     .settings(store.clone())
///     .channel_buffer(64)
///     .build();
///
/// // Later, when the page goes away:
/// handle.shutdown().await;
/// # }
/// ```
pub struct CensorBuilder<P: Page> {
    page: P,
    settings: SettingsStore,
    channel_buffer: usize,
}

impl<P: Page> CensorBuilder<P> {
    /// Create a new builder for `page` with default settings and a channel
    /// buffer of 32 batches.
    pub fn new(page: P) -> Self {
        Self {
            page,
            settings: SettingsStore::default(),
            channel_buffer: 32,
        }
    }

    /// Configuration source the coordinator reads its strategies from.
    pub fn settings(mut self, settings: SettingsStore) -> Self {
        self.settings = settings;
        self
    }

    /// Capacity of the internal mpsc channel between producers and the worker.
    pub fn channel_buffer(mut self, size: usize) -> Self {
        self.channel_buffer = size;
        self
    }

    /// Consume the builder, spawn the render worker, and return the
    /// [`CensorHandle`] used to submit batches and stop the worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> CensorHandle {
        let (tx, rx) = tokio::sync::mpsc::channel::<InboundBatch>(self.channel_buffer.max(1));
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let coordinator = Coordinator::new(&self.settings);
        let worker_handle = tokio::spawn(worker::run(rx, shutdown_rx, self.page, coordinator));

        CensorHandle::new(tx, shutdown_tx, worker_handle)
    }
}
