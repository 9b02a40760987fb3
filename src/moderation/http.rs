//! HTTP moderation client (requires the `http` feature).

use reqwest::Client;

use crate::error::{CensorError, Result};
use crate::message::{ModerationRequest, ModerationResult};
use crate::moderation::Moderation;

/// Moderation backend that POSTs requests as JSON to a single endpoint.
///
/// Text and image analysis usually live behind different endpoints; create
/// one client per endpoint. Clones of the underlying [`Client`] share a
/// connection pool.
///
/// # Example
///
/// ```rust,no_run
/// use page_censor::{HttpModeration, Moderation, ModerationRequest};
///
/// # async fn example() -> page_censor::Result<()> {
/// let text = HttpModeration::new("https://moderation.example.com/api/text/analyze");
/// let request = ModerationRequest::new(vec!["word".into()], vec![], 50);
/// let verdict = text.analyze(&request).await?;
/// # Ok(())
/// # }
/// ```
pub struct HttpModeration {
    client: Client,
    endpoint: String,
}

impl HttpModeration {
    /// Create a client for `endpoint` with a fresh [`Client`].
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    /// Create a client for `endpoint` reusing an existing [`Client`].
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Moderation for HttpModeration {
    async fn analyze(&self, request: &ModerationRequest) -> Result<ModerationResult> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| CensorError::Moderation(Box::new(e)))?
            .error_for_status()
            .map_err(|e| CensorError::Moderation(Box::new(e)))?;

        let result = response
            .json::<ModerationResult>()
            .await
            .map_err(|e| CensorError::Moderation(Box::new(e)))?;

        tracing::debug!(
            "Moderation response from {}: {} words, {} urls",
            self.endpoint,
            result.words.len(),
            result.urls.len()
        );
        Ok(result)
    }
}
