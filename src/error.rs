//! Error types for the `page_censor` crate.

/// All errors that can occur while filtering and rendering page content.
#[derive(Debug, thiserror::Error)]
pub enum CensorError {
    /// The markup or the target string was empty.
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),

    /// The markup could not be turned into a usable document.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Writing the mutated document back to markup failed.
    #[error("Serialize error: {0}")]
    Serialize(#[from] std::fmt::Error),

    /// The literal matcher for a target could not be compiled.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A CSS selector failed to parse.
    #[error("Invalid selector: {0}")]
    Selector(String),

    /// A page sink failed to accept rendered markup.
    #[error("Page publish failed: {0}")]
    Publish(Box<dyn std::error::Error + Send + Sync>),

    /// The remote moderation round-trip failed.
    #[error("Moderation request failed: {0}")]
    Moderation(Box<dyn std::error::Error + Send + Sync>),

    /// The internal channel to the render worker is closed or full.
    #[error("Channel closed or full")]
    ChannelClosed,

    /// A setting key or value is invalid.
    #[error("Config error: {0}")]
    Config(String),
}

/// A type alias for `Result<T, CensorError>`.
pub type Result<T> = std::result::Result<T, CensorError>;
