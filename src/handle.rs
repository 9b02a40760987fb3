//! Handles for submitting moderation batches and controlling the render worker.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{CensorError, Result};
use crate::message::InboundBatch;

/// Primary handle returned by [`CensorBuilder::build`](crate::CensorBuilder::build).
///
/// Owns the shutdown signal and the worker task. Submission goes through the
/// same [`CensorSender`] that [`sender`](Self::sender) hands out.
pub struct CensorHandle {
    sender: CensorSender,
    shutdown: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl CensorHandle {
    pub(crate) fn new(
        sender: mpsc::Sender<InboundBatch>,
        shutdown: oneshot::Sender<()>,
        worker: JoinHandle<()>,
    ) -> Self {
        Self {
            sender: CensorSender { sender },
            shutdown: Some(shutdown),
            worker: Some(worker),
        }
    }

    /// Queue a batch for rendering. See [`CensorSender::submit`].
    pub fn submit(&self, batch: InboundBatch) -> Result<()> {
        self.sender.submit(batch)
    }

    /// Queue a batch, logging the error instead of returning it.
    pub fn submit_or_log(&self, batch: InboundBatch) {
        self.sender.submit_or_log(batch);
    }

    /// A cloneable sender for producers on other tasks, such as one per
    /// moderation round-trip.
    pub fn sender(&self) -> CensorSender {
        self.sender.clone()
    }

    /// Stop the render worker.
    ///
    /// New submissions are refused from here on, including through senders
    /// obtained earlier. Batches already queued still go through the stale
    /// check against the page's current URL and settings, and the ones that
    /// pass are rendered and published before this returns.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.await;
        }
    }
}

/// Cloneable sender for submitting batches from multiple tasks.
///
/// Obtained via [`CensorHandle::sender`]. Does **not** own the shutdown
/// signal or the worker task.
#[derive(Clone)]
pub struct CensorSender {
    sender: mpsc::Sender<InboundBatch>,
}

impl CensorSender {
    /// Queue a batch for rendering.
    ///
    /// Never waits. Returns [`CensorError::ChannelClosed`] if the queue is
    /// full or the worker has stopped. A batch whose verdict has no targets
    /// is still queued, since rendering it republishes its origin markup.
    pub fn submit(&self, batch: InboundBatch) -> Result<()> {
        let action = batch.action;
        let targets = batch.targets().len();
        self.sender
            .try_send(batch)
            .map_err(|_| CensorError::ChannelClosed)?;
        tracing::trace!("Queued {action:?} batch with {targets} targets");
        Ok(())
    }

    /// Queue a batch, logging errors instead of returning them.
    pub fn submit_or_log(&self, batch: InboundBatch) {
        let action = batch.action;
        if let Err(e) = self.submit(batch) {
            tracing::error!("Failed to queue {action:?} batch: {e}");
        }
    }

    /// Whether the render worker has stopped accepting batches.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
