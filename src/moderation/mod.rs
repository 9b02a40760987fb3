//! The remote moderation service, seen from the client side.
//!
//! Implement the [`Moderation`] trait to talk to a service. With the `http`
//! feature (on by default) the crate ships [`HttpModeration`], a JSON-over-POST
//! client.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpModeration;

use std::future::Future;

use crate::error::Result;
use crate::message::{BatchAction, InboundBatch, ModerationRequest, ModerationResult};

/// A moderation backend that flags words and image URLs.
pub trait Moderation: Send + Sync {
    /// Submit collected content and return the service's verdict.
    fn analyze(
        &self,
        request: &ModerationRequest,
    ) -> impl Future<Output = Result<ModerationResult>> + Send;
}

/// Run one moderation round-trip and package the verdict, together with the
/// markup it was computed for, as a batch for the render worker.
pub async fn moderate<M: Moderation>(
    moderation: &M,
    request: &ModerationRequest,
    action: BatchAction,
    origin_html: impl Into<String>,
) -> Result<InboundBatch> {
    let result = moderation.analyze(request).await?;
    tracing::debug!(
        "Moderation flagged {} words and {} urls",
        result.words.len(),
        result.urls.len()
    );
    Ok(InboundBatch::new(action, origin_html, result))
}

/// Run the text and image round-trips for one page snapshot concurrently.
///
/// A half whose request has nothing to check is skipped. The text batch, if
/// any, comes first. Fails if either round-trip fails.
pub async fn moderate_page<T: Moderation, I: Moderation>(
    text: &T,
    image: &I,
    text_request: &ModerationRequest,
    image_request: &ModerationRequest,
    origin_html: &str,
) -> Result<Vec<InboundBatch>> {
    let text_round = async {
        if text_request.words.is_empty() {
            Ok(None)
        } else {
            moderate(text, text_request, BatchAction::ChangeContent, origin_html)
                .await
                .map(Some)
        }
    };
    let image_round = async {
        if image_request.images.is_empty() {
            Ok(None)
        } else {
            moderate(image, image_request, BatchAction::ChangeImageUrl, origin_html)
                .await
                .map(Some)
        }
    };

    let (text_batch, image_batch) = futures::future::try_join(text_round, image_round).await?;
    Ok(text_batch.into_iter().chain(image_batch).collect())
}
