//! `<img>` attribute filter.

use scraper::Selector;

use super::{ContentFilter, Matcher};
use crate::document::{Document, Rewrites, qualified_attrs};
use crate::error::{CensorError, Result};
use crate::message::ModerationResult;
use crate::strategy::Strategy;

/// The only attributes the image filter rewrites.
pub const IMAGE_ATTRIBUTES: &[&str] = &["src", "srcset", "alt", "title", "longdesc"];

/// Filter that rewrites a target string inside the image-related attributes
/// of every `<img>` element.
///
/// The element itself is always kept: a [`Strategy::Remove`] match empties
/// the attribute value instead of deleting the image. Text nodes are never
/// touched.
///
/// # Example
///
/// ```
/// use page_censor::{ContentFilter, ImageFilter, Strategy};
///
/// let filter = ImageFilter::new(Strategy::Remove);
/// let html = filter.apply(r#"<img class="nsfw.png" src="nsfw.png">"#, "nsfw.png", None);
/// assert!(html.contains(r#"<img class="nsfw.png" src="">"#));
/// ```
pub struct ImageFilter {
    strategy: Strategy,
}

impl ImageFilter {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new(Strategy::replace_image())
    }
}

impl ContentFilter for ImageFilter {
    fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = strategy;
    }

    fn try_apply(
        &self,
        html: &str,
        target: &str,
        data: Option<&ModerationResult>,
    ) -> Result<String> {
        let selector =
            Selector::parse("img").map_err(|e| CensorError::Selector(format!("img: {e:?}")))?;
        let matcher = Matcher::literal(target)?;
        let replacement = self.strategy.resolve(target, data);

        let document = Document::parse(html);
        let mut rewrites = Rewrites::default();

        for img in document.select(&selector) {
            let mut changed = false;
            let attrs = qualified_attrs(img.value())
                .map(|(name, value)| {
                    let replaced = if IMAGE_ATTRIBUTES.contains(&name.as_str()) {
                        matcher.replace_all(value, &replacement)
                    } else {
                        None
                    };
                    changed |= replaced.is_some();
                    (name, replaced.unwrap_or_else(|| value.to_string()))
                })
                .collect();
            if changed {
                rewrites.set_attrs(img.id(), attrs);
            }
        }

        tracing::trace!("Rewrote {} images for {target:?}", rewrites.len());
        document.serialize(&rewrites)
    }
}
