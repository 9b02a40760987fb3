//! Text-node and attribute filter.

use scraper::node::Node;

use super::{ContentFilter, Matcher};
use crate::document::{Document, Rewrites, Segment, qualified_attrs};
use crate::error::Result;
use crate::message::ModerationResult;
use crate::strategy::Strategy;

/// URL-bearing attributes the text filter never rewrites, so links and
/// resource references keep working.
pub const URL_ATTRIBUTES: &[&str] = &[
    "href",
    "src",
    "srcset",
    "action",
    "data",
    "poster",
    "formaction",
    "cite",
    "longdesc",
    "usemap",
    "manifest",
];

/// Namespaced names count by their local part, so `xlink:href` is a URL.
fn is_url_attribute(name: &str) -> bool {
    let local = name.rsplit_once(':').map_or(name, |(_, local)| local);
    URL_ATTRIBUTES
        .iter()
        .any(|url| url.eq_ignore_ascii_case(local))
}

/// Filter that rewrites a target string in every text node and every
/// non-URL attribute under `<body>`.
///
/// Markup-producing strategies (strike-through, blur) are inserted into text
/// nodes as elements. In attributes every replacement is plain text.
///
/// # Example
///
/// ```
/// use page_censor::{ContentFilter, TextFilter};
///
/// let filter = TextFilter::default();
/// let html = filter.apply(r#"<a href="/ab" title="ab">ab</a>"#, "ab", None);
/// assert!(html.contains(r#"<a href="/ab" title="***">***</a>"#));
/// ```
pub struct TextFilter {
    strategy: Strategy,
}

impl TextFilter {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }
}

impl Default for TextFilter {
    fn default() -> Self {
        Self::new(Strategy::replace_text())
    }
}

impl ContentFilter for TextFilter {
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
        let matcher = Matcher::literal(target)?;
        let replacement = self.strategy.resolve(target, data);
        let markup = self.strategy.emits_markup();

        let document = Document::parse(html);
        let mut rewrites = Rewrites::default();

        // Pre-order walk, body first.
        for node in document.body()?.descendants() {
            match node.value() {
                Node::Text(text) => {
                    let text: &str = text.as_ref();
                    if markup {
                        if let Some(segments) = matcher.split_markup(text, &replacement) {
                            rewrites.set_text(node.id(), segments);
                        }
                    } else if let Some(replaced) = matcher.replace_all(text, &replacement) {
                        rewrites.set_text(node.id(), vec![Segment::Text(replaced)]);
                    }
                }
                Node::Element(el) => {
                    let mut changed = false;
                    let attrs: Vec<(String, String)> = qualified_attrs(el)
                        .map(|(name, value)| {
                            let replaced = if is_url_attribute(&name) {
                                None
                            } else {
                                matcher.replace_all(value, &replacement)
                            };
                            changed |= replaced.is_some();
                            (name, replaced.unwrap_or_else(|| value.to_string()))
                        })
                        .collect();
                    if changed {
                        rewrites.set_attrs(node.id(), attrs);
                    }
                }
                _ => {}
            }
        }

        tracing::trace!("Rewrote {} nodes for {target:?}", rewrites.len());
        document.serialize(&rewrites)
    }
}
