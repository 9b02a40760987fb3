//! Pluggable sinks for rendered page markup.
//!
//! The crate ships with two built-in pages:
//!
//! - [`MemoryPage`] -- keeps the current body in memory.
//! - [`FsPage`] -- writes every rendered body to a file.
//!
//! Implement the [`Page`] trait to drive a real host document.

mod fs;
mod memory;

pub use fs::FsPage;
pub use memory::MemoryPage;

use crate::error::Result;

use std::future::Future;

/// The hosting page that receives filtered markup.
///
/// Publishing is the only point where filtering has an observable side
/// effect. Implementations must be `Send + Sync + 'static` so they can be
/// used from the render worker task.
///
/// # Implementing a custom page
///
/// ```rust,no_run
/// use page_censor::{Page, Result};
///
/// struct MyPage;
///
/// impl Page for MyPage {
///     fn url(&self) -> String {
///         "https://example.com/".to_string()
///     }
///
///     async fn publish(&self, html: &str) -> Result<()> {
///         // replace the live body ...
///         Ok(())
///     }
/// }
/// ```
pub trait Page: Send + Sync + 'static {
    /// URL of the currently displayed document, used to drop stale batches.
    fn url(&self) -> String;

    /// Replace the page content with `html`.
    fn publish(&self, html: &str) -> impl Future<Output = Result<()>> + Send;
}
