//! Content filters that rewrite matched strings inside serialized HTML.
//!
//! Filters implement the [`ContentFilter`] trait. Each owns a [`Strategy`]
//! that decides what a match becomes.
//!
//! Built-in filters:
//!
//! - [`TextFilter`] -- text nodes and non-URL attributes under `<body>`.
//! - [`ImageFilter`] -- image-related attributes of `<img>` elements.

mod image;
mod text;

pub use image::{IMAGE_ATTRIBUTES, ImageFilter};
pub use text::{TextFilter, URL_ATTRIBUTES};

use regex::{NoExpand, Regex};

use crate::document::Segment;
use crate::error::{CensorError, Result};
use crate::message::ModerationResult;
use crate::strategy::Strategy;

/// Trait for filters that rewrite one target string at a time.
///
/// Implementations only provide [`try_apply`](Self::try_apply). The provided
/// [`apply`](Self::apply) validates the input and contains every failure, so
/// a filtering error leaves the content unfiltered instead of aborting the
/// caller.
pub trait ContentFilter: Send + Sync {
    /// The strategy currently used to compute replacements.
    fn strategy(&self) -> &Strategy;

    /// Swap the strategy. Takes effect on the next call.
    fn set_strategy(&mut self, strategy: Strategy);

    /// Rewrite every occurrence of `target` in `html`.
    fn try_apply(&self, html: &str, target: &str, data: Option<&ModerationResult>)
    -> Result<String>;

    /// Rewrite every occurrence of `target` in `html`, returning `html`
    /// unchanged if the input is empty or filtering fails.
    fn apply(&self, html: &str, target: &str, data: Option<&ModerationResult>) -> String {
        if let Err(e) = validate(html, target) {
            tracing::warn!("Skipping filter pass: {e}");
            return html.to_string();
        }

        match self.try_apply(html, target, data) {
            Ok(filtered) => filtered,
            Err(e) => {
                tracing::warn!("Failed to filter {target:?}: {e}");
                html.to_string()
            }
        }
    }
}

fn validate(html: &str, target: &str) -> Result<()> {
    if html.is_empty() {
        return Err(CensorError::InvalidInput("empty html"));
    }
    if target.is_empty() {
        return Err(CensorError::InvalidInput("empty filter target"));
    }
    Ok(())
}

/// Literal, global matcher for a single target string.
///
/// Regex metacharacters in the target are escaped, so `"a.b"` only matches
/// the literal `"a.b"`.
pub struct Matcher {
    re: Regex,
}

impl Matcher {
    pub fn literal(target: &str) -> Result<Self> {
        Ok(Self {
            re: Regex::new(&regex::escape(target))?,
        })
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.re.is_match(haystack)
    }

    /// Replace every occurrence, or `None` if there is none. `$` in the
    /// replacement is taken literally.
    pub fn replace_all(&self, haystack: &str, replacement: &str) -> Option<String> {
        if !self.re.is_match(haystack) {
            return None;
        }
        Some(self.re.replace_all(haystack, NoExpand(replacement)).into_owned())
    }

    /// Split `haystack` around every occurrence, emitting the replacement as
    /// a markup segment between the text pieces. `None` if there is no match.
    pub fn split_markup(&self, haystack: &str, replacement: &str) -> Option<Vec<Segment>> {
        let mut segments = Vec::new();
        let mut last = 0;
        let mut matched = false;
        for m in self.re.find_iter(haystack) {
            matched = true;
            if m.start() > last {
                segments.push(Segment::Text(haystack[last..m.start()].to_string()));
            }
            if !replacement.is_empty() {
                segments.push(Segment::Markup(replacement.to_string()));
            }
            last = m.end();
        }
        if !matched {
            return None;
        }
        if last < haystack.len() {
            segments.push(Segment::Text(haystack[last..].to_string()));
        }
        Some(segments)
    }
}
