//! Background worker that renders inbound moderation batches onto a page.
//!
//! This module is internal -- users interact with it indirectly through
//! [`CensorHandle`](crate::CensorHandle).

use tokio::sync::{mpsc, oneshot};

use crate::coordinator::Coordinator;
use crate::message::InboundBatch;
use crate::page::Page;

pub async fn run<P: Page>(
    mut rx: mpsc::Receiver<InboundBatch>,
    mut shutdown_rx: oneshot::Receiver<()>,
    page: P,
    mut coordinator: Coordinator,
) {
    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown_rx => {
                tracing::info!("Shutdown signal received, draining channel");
                rx.close();
                while let Some(batch) = rx.recv().await {
                    render_batch(&page, &mut coordinator, batch).await;
                }
                tracing::info!("Worker shut down");
                return;
            }

            batch = rx.recv() => match batch {
                Some(batch) => render_batch(&page, &mut coordinator, batch).await,
                None => {
                    tracing::info!("All senders dropped, worker exiting");
                    return;
                }
            },
        }
    }
}

async fn render_batch<P: Page>(page: &P, coordinator: &mut Coordinator, batch: InboundBatch) {
    // Strategies only change between passes.
    coordinator.refresh();

    let url = page.url();
    let code = coordinator.method_code(batch.action);
    if !batch.result.is_current(code, &url) {
        tracing::debug!(
            "Discarding stale {:?} batch (method {code}, page {url})",
            batch.action
        );
        return;
    }

    let count = batch.targets().len();
    let html = coordinator.render(&batch);
    if let Err(e) = page.publish(&html).await {
        tracing::error!("Failed to publish filtered page {url}: {e}");
        return;
    }
    tracing::debug!("Rendered {:?} batch of {count} targets", batch.action);
}
