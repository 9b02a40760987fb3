//! # page_censor
//!
//! An HTML content-rewriting engine for moderated browsing: it finds flagged
//! words and image URLs inside serialized page markup and rewrites them in
//! place according to a user-selected censoring style.
//!
//! ## Overview
//!
//! A [`Strategy`] decides what a match becomes (a fixed mask, nothing, a
//! strike-through or blur wrap, or a value supplied by the moderation
//! service). The [`TextFilter`] and [`ImageFilter`] parse a document, rewrite
//! every literal occurrence of one target, and serialize it back. The
//! [`Coordinator`] threads a whole batch of targets through the active
//! filter, re-resolving strategies from a [`SettingsStore`] between passes.
//!
//! Around that core, a background worker receives [`InboundBatch`]es from
//! moderation round-trips, drops verdicts that no longer match the page or
//! settings, and publishes the result to a [`Page`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use page_censor::{
//!     BatchAction, CensorBuilder, InboundBatch, MemoryPage, ModerationResult, SettingsStore,
//! };
//!
//! # async fn example() {
//! let store = SettingsStore::default();
//! let page = MemoryPage::new("https://example.com/", "<body>aa ab bc</body>");
//!
//! let handle = CensorBuilder::new(page.clone())
//!     .settings(store.clone())
//!     .build();
//!
//! let verdict = ModerationResult {
//!     words: vec!["ab".into()],
//!     ..Default::default()
//! };
//! handle
//!     .submit(InboundBatch::new(BatchAction::ChangeContent, page.html(), verdict))
//!     .unwrap();
//!
//! handle.shutdown().await;
//! assert!(page.html().contains("<body>aa *** bc</body>"));
//! # }
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `http` | **yes** | Enables [`HttpModeration`], a `reqwest`-based moderation client. |

pub mod config;
pub mod coordinator;
pub mod document;
pub mod error;
pub mod extract;
pub mod filter;
pub mod handle;
pub mod message;
pub mod moderation;
pub mod page;
pub mod settings;
pub mod strategy;
mod worker;

pub use config::CensorBuilder;
pub use coordinator::Coordinator;
pub use document::{Document, Rewrites, Segment};
pub use error::{CensorError, Result};
pub use extract::Collector;
pub use filter::{
    ContentFilter, IMAGE_ATTRIBUTES, ImageFilter, Matcher, TextFilter, URL_ATTRIBUTES,
};
pub use handle::{CensorHandle, CensorSender};
pub use message::{BatchAction, InboundBatch, ModerationRequest, ModerationResult};
#[cfg(feature = "http")]
pub use moderation::HttpModeration;
pub use moderation::{Moderation, moderate, moderate_page};
pub use page::{FsPage, MemoryPage, Page};
pub use settings::{ImageMethod, Settings, SettingsStore, TextMethod};
pub use strategy::{Lookup, Strategy};
