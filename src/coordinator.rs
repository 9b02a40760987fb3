//! Sequencing of filter passes over a batch of targets.

use tokio::sync::watch;

use crate::filter::{ContentFilter, ImageFilter, TextFilter};
use crate::message::{BatchAction, InboundBatch, ModerationResult};
use crate::settings::{Settings, SettingsStore};

/// Owns the text and image filters and keeps their strategies in line with
/// the configuration source.
///
/// Strategies are only swapped by [`refresh`](Self::refresh), which callers
/// run between passes; a pass always sees one consistent strategy.
/// Content that was already rendered is not re-filtered on a settings change.
///
/// # Example
///
/// ```
/// use page_censor::{Coordinator, SettingsStore};
///
/// let store = SettingsStore::default();
/// let coordinator = Coordinator::new(&store);
/// let html = coordinator.apply_all_text("<body>aa ab bc</body>", &["ab"], None);
/// assert!(html.contains("<body>aa *** bc</body>"));
/// ```
pub struct Coordinator {
    text: TextFilter,
    image: ImageFilter,
    settings: watch::Receiver<Settings>,
    active: Settings,
}

impl Coordinator {
    /// Create a coordinator bound to `store`, resolving strategies from its
    /// current settings.
    pub fn new(store: &SettingsStore) -> Self {
        let mut settings = store.subscribe();
        let active = settings.borrow_and_update().clone();
        tracing::debug!(
            "Coordinator initialized: text {:?}, image {:?}",
            active.text_method(),
            active.image_method()
        );
        Self {
            text: TextFilter::new(active.text_strategy()),
            image: ImageFilter::new(active.image_strategy()),
            settings,
            active,
        }
    }

    /// Re-resolve both strategies if the settings changed since the last
    /// refresh. Returns whether anything was swapped.
    pub fn refresh(&mut self) -> bool {
        if !self.settings.has_changed().unwrap_or(false) {
            return false;
        }
        let next = self.settings.borrow_and_update().clone();
        if next.text_strategy() == *self.text.strategy()
            && next.image_strategy() == *self.image.strategy()
        {
            self.active = next;
            return false;
        }

        self.text.set_strategy(next.text_strategy());
        self.image.set_strategy(next.image_strategy());
        tracing::info!(
            "Filtering methods updated: text {:?}, image {:?}",
            next.text_method(),
            next.image_method()
        );
        self.active = next;
        true
    }

    /// Settings the current strategies were resolved from.
    pub fn active_settings(&self) -> &Settings {
        &self.active
    }

    pub fn text_filter(&self) -> &TextFilter {
        &self.text
    }

    pub fn image_filter(&self) -> &ImageFilter {
        &self.image
    }

    /// Method code a batch of the given kind must echo to still apply.
    pub fn method_code(&self, action: BatchAction) -> i64 {
        match action {
            BatchAction::ChangeContent => self.active.censor_method,
            BatchAction::ChangeImageUrl => self.active.image_filter_method,
        }
    }

    /// Apply the text filter for every target in order, threading each
    /// output into the next pass. Blank targets are skipped.
    pub fn apply_all_text<S: AsRef<str>>(
        &self,
        html: &str,
        targets: &[S],
        data: Option<&ModerationResult>,
    ) -> String {
        apply_all(&self.text, html, targets, data)
    }

    /// Image-filter counterpart of [`apply_all_text`](Self::apply_all_text).
    pub fn apply_all_images<S: AsRef<str>>(
        &self,
        html: &str,
        targets: &[S],
        data: Option<&ModerationResult>,
    ) -> String {
        apply_all(&self.image, html, targets, data)
    }

    /// Filter a batch's origin markup with the filter its action selects,
    /// using the batch's verdict as the server payload.
    pub fn render(&self, batch: &InboundBatch) -> String {
        let data = Some(&batch.result);
        match batch.action {
            BatchAction::ChangeContent => {
                self.apply_all_text(&batch.origin_html, batch.targets(), data)
            }
            BatchAction::ChangeImageUrl => {
                self.apply_all_images(&batch.origin_html, batch.targets(), data)
            }
        }
    }
}

fn apply_all<F: ContentFilter, S: AsRef<str>>(
    filter: &F,
    html: &str,
    targets: &[S],
    data: Option<&ModerationResult>,
) -> String {
    let filtered = targets
        .iter()
        .map(AsRef::as_ref)
        .filter(|target| !target.trim().is_empty())
        .fold(html.to_string(), |acc, target| filter.apply(&acc, target, data));
    tracing::debug!("Applied {} targets", targets.len());
    filtered
}
