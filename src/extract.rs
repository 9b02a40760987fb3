//! Collection of visible words and image URLs to send for moderation.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::RegexSet;
use scraper::node::Node;

use crate::document::Document;
use crate::error::Result;
use crate::message::ModerationRequest;

/// Elements whose content is never shown as text.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript"];

const MAX_WORD_CHARS: usize = 25;

static GARBAGE_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)cls\d+fill",
        r"(?i)hashtaglandingpage",
        r"(?i)animation|keyframes|fade(in|out)?",
        r"(?i)^(roboto|arial|sansserif)$",
        r"\d(px|ms|s)$",
    ])
    .expect("invalid garbage pattern")
});

/// Whether a cleaned token is page noise (class names, CSS leftovers, font
/// names) rather than a word worth moderating.
pub fn is_garbage_word(word: &str) -> bool {
    word.chars().count() > MAX_WORD_CHARS || GARBAGE_PATTERNS.is_match(word)
}

fn clean_word(raw: &str) -> String {
    raw.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Accumulates new words and image URLs across page snapshots.
///
/// Every word and URL is reported once per collector, however many times it
/// is seen.
///
/// # Example
///
/// ```
/// use page_censor::Collector;
///
/// let mut collector = Collector::new();
/// collector.collect("<body><p>Hello, hello world!</p><img src=\"a.png\"></body>").unwrap();
/// let request = collector.request(50);
/// assert_eq!(request.words, ["Hello", "hello", "world"]);
/// assert_eq!(request.images, ["a.png"]);
/// ```
#[derive(Debug, Default)]
pub struct Collector {
    known_words: HashSet<String>,
    known_images: HashSet<String>,
    words: Vec<String>,
    images: Vec<String>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the body of `html`, queueing words and image URLs not seen
    /// before. Returns how many new items were queued.
    pub fn collect(&mut self, html: &str) -> Result<usize> {
        let document = Document::parse(html);
        let before = self.words.len() + self.images.len();

        let mut stack = vec![document.body()?];
        while let Some(node) = stack.pop() {
            match node.value() {
                Node::Text(text) => {
                    let text: &str = text.as_ref();
                    for raw in text.split_whitespace() {
                        self.push_word(clean_word(raw));
                    }
                }
                Node::Element(el) => {
                    if SKIPPED_ELEMENTS.contains(&el.name()) {
                        continue;
                    }
                    if el.name() == "img" {
                        if let Some(src) = el.attr("src") {
                            self.push_image(src.trim());
                        }
                    }
                    stack.extend(node.children().rev());
                }
                _ => {}
            }
        }

        Ok(self.words.len() + self.images.len() - before)
    }

    fn push_word(&mut self, word: String) {
        if word.is_empty()
            || word.chars().all(|c| c.is_ascii_digit())
            || self.known_words.contains(&word)
            || is_garbage_word(&word)
        {
            return;
        }
        self.known_words.insert(word.clone());
        self.words.push(word);
    }

    fn push_image(&mut self, src: &str) {
        if src.is_empty() || !self.known_images.insert(src.to_string()) {
            return;
        }
        self.images.push(src.to_string());
    }

    /// Words queued since the last [`request`](Self::request).
    pub fn pending_words(&self) -> &[String] {
        &self.words
    }

    /// Image URLs queued since the last [`request`](Self::request).
    pub fn pending_images(&self) -> &[String] {
        &self.images
    }

    pub fn has_pending(&self) -> bool {
        !self.words.is_empty() || !self.images.is_empty()
    }

    /// Drain the queued items into a moderation request.
    pub fn request(&mut self, harm_level: u8) -> ModerationRequest {
        ModerationRequest::new(
            std::mem::take(&mut self.words),
            std::mem::take(&mut self.images),
            harm_level.min(100),
        )
    }
}
