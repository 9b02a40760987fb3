//! Replacement-value policies for matched content.

use crate::message::ModerationResult;

/// Default replacement for filtered text.
pub const DEFAULT_TEXT_REPLACEMENT: &str = "***";

/// Default replacement for filtered image attributes: a transparent 1x1 GIF.
pub const DEFAULT_IMAGE_PLACEHOLDER: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

pub const DEFAULT_STRIKE_PREFIX: &str = "<s>";
pub const DEFAULT_STRIKE_SUFFIX: &str = "</s>";
pub const DEFAULT_BLUR_STYLE: &str = "filter: blur(6px);";

/// Which parallel array of the server payload a server-value strategy reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    /// `words` -> `filteredWords`
    Words,
    /// `urls` -> `filteredUrls`
    Urls,
}

/// Maps a matched target to the value that replaces it.
///
/// The result of [`resolve`](Self::resolve) depends only on the target and
/// the server payload, so filters compute it once per target.
///
/// # Example
///
/// ```
/// use page_censor::Strategy;
///
/// let strike = Strategy::strikethrough();
/// assert_eq!(strike.resolve("bad", None), "<s>bad</s>");
/// assert!(strike.emits_markup());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// A fixed replacement string.
    Replace(String),
    /// Delete the match.
    Remove,
    /// Wrap the match in `prefix` and `suffix` markup.
    Strikethrough { prefix: String, suffix: String },
    /// Wrap the match in a styled `<span>`.
    Blur { style: String },
    /// Look the match up in the server payload. Missing entries resolve to
    /// an empty string.
    ReplaceByServerValue(Lookup),
}

impl Strategy {
    /// Text replacement with the default `***` mask.
    pub fn replace_text() -> Self {
        Self::Replace(DEFAULT_TEXT_REPLACEMENT.to_string())
    }

    /// Image replacement with the default placeholder URL.
    pub fn replace_image() -> Self {
        Self::Replace(DEFAULT_IMAGE_PLACEHOLDER.to_string())
    }

    /// Strike-through with the default `<s>` / `</s>` wrap.
    pub fn strikethrough() -> Self {
        Self::Strikethrough {
            prefix: DEFAULT_STRIKE_PREFIX.to_string(),
            suffix: DEFAULT_STRIKE_SUFFIX.to_string(),
        }
    }

    /// Blur with the default style.
    pub fn blur() -> Self {
        Self::Blur {
            style: DEFAULT_BLUR_STYLE.to_string(),
        }
    }

    /// Compute the replacement for `target`.
    pub fn resolve(&self, target: &str, data: Option<&ModerationResult>) -> String {
        match self {
            Self::Replace(text) => text.clone(),
            Self::Remove => String::new(),
            Self::Strikethrough { prefix, suffix } => {
                format!("{prefix}{}{suffix}", escape_markup(target))
            }
            Self::Blur { style } => format!(
                r#"<span style="{}">{}</span>"#,
                escape_markup(style),
                escape_markup(target)
            ),
            Self::ReplaceByServerValue(lookup) => data
                .and_then(|data| match lookup {
                    Lookup::Words => data.filtered_word(target),
                    Lookup::Urls => data.filtered_url(target),
                })
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Whether [`resolve`](Self::resolve) produces markup that must be
    /// inserted as nodes rather than as text.
    pub fn emits_markup(&self) -> bool {
        matches!(self, Self::Strikethrough { .. } | Self::Blur { .. })
    }
}

fn escape_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}
