//! Wire types exchanged with the moderation service and delivered to the
//! render worker.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound moderation request, posted as JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationRequest {
    pub words: Vec<String>,
    pub images: Vec<String>,
    /// Harm level threshold, 0..=100.
    pub rate: u8,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_url: Option<String>,
}

impl ModerationRequest {
    pub fn new(words: Vec<String>, images: Vec<String>, rate: u8) -> Self {
        Self {
            words,
            images,
            rate,
            kind: None,
            request_url: None,
        }
    }

    /// Tag the request with the active method code so the response can be
    /// checked for staleness when it comes back.
    pub fn with_kind(mut self, method_code: i64) -> Self {
        self.kind = Some(method_code.to_string());
        self
    }

    /// Tag the request with the URL of the page it was collected from.
    pub fn with_request_url(mut self, url: impl Into<String>) -> Self {
        self.request_url = Some(url.into());
        self
    }
}

/// Moderation verdict: the targets to filter plus the optional parallel
/// replacement arrays consumed by server-value strategies.
///
/// `words[i]` is replaced by `filtered_words[i]`, `urls[i]` by
/// `filtered_urls[i]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModerationResult {
    pub words: Vec<String>,
    pub urls: Vec<String>,
    pub filtered_words: Vec<String>,
    pub filtered_urls: Vec<String>,
    /// Echo of the request's method code. The service may send it as a
    /// number or a string.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_url: Option<String>,
}

impl ModerationResult {
    /// Value paired with `target` in `filteredWords`, if any.
    pub fn filtered_word(&self, target: &str) -> Option<&str> {
        lookup(&self.words, &self.filtered_words, target)
    }

    /// Value paired with `target` in `filteredUrls`, if any.
    pub fn filtered_url(&self, target: &str) -> Option<&str> {
        lookup(&self.urls, &self.filtered_urls, target)
    }

    /// Whether this verdict still applies to a page at `page_url` whose
    /// active method for the batch kind is `method_code`.
    ///
    /// Echo fields the service left out are not checked.
    pub fn is_current(&self, method_code: i64, page_url: &str) -> bool {
        let kind_matches = match &self.kind {
            None | Some(Value::Null) => true,
            Some(Value::Number(n)) => n.as_i64() == Some(method_code),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok() == Some(method_code),
            Some(_) => false,
        };
        let url_matches = self
            .request_url
            .as_deref()
            .is_none_or(|url| url == page_url);
        kind_matches && url_matches
    }
}

fn lookup<'a>(keys: &[String], values: &'a [String], target: &str) -> Option<&'a str> {
    keys.iter()
        .position(|key| key == target)
        .and_then(|i| values.get(i))
        .map(String::as_str)
}

/// Which filter a batch is meant for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchAction {
    /// Text targets in `result.words`.
    #[default]
    #[serde(rename = "changeContent")]
    ChangeContent,
    /// Image targets in `result.urls`.
    #[serde(rename = "changeImageURL")]
    ChangeImageUrl,
}

/// A moderation verdict paired with the page markup it was computed for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InboundBatch {
    #[serde(default)]
    pub action: BatchAction,
    #[serde(rename = "originhtml")]
    pub origin_html: String,
    pub result: ModerationResult,
}

impl InboundBatch {
    pub fn new(action: BatchAction, origin_html: impl Into<String>, result: ModerationResult) -> Self {
        Self {
            action,
            origin_html: origin_html.into(),
            result,
        }
    }

    /// Target strings for this batch's filter, in application order.
    pub fn targets(&self) -> &[String] {
        match self.action {
            BatchAction::ChangeContent => &self.result.words,
            BatchAction::ChangeImageUrl => &self.result.urls,
        }
    }
}
