//! User-selected filtering settings and the store that publishes them.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::watch;

use crate::error::{CensorError, Result};
use crate::strategy::{
    DEFAULT_BLUR_STYLE, DEFAULT_IMAGE_PLACEHOLDER, DEFAULT_STRIKE_PREFIX, DEFAULT_STRIKE_SUFFIX,
    DEFAULT_TEXT_REPLACEMENT, Lookup, Strategy,
};

/// Default harm-level threshold sent with moderation requests.
pub const DEFAULT_HARM_LEVEL: u8 = 50;

/// Text censoring style, stored under `censorMethod`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextMethod {
    #[default]
    Replace,
    Remove,
    Strikethrough,
    Blur,
    ServerValue,
}

impl TextMethod {
    /// Unknown codes fall back to [`TextMethod::Replace`].
    pub fn from_code(code: i64) -> Self {
        match code {
            2 => Self::Remove,
            3 => Self::Strikethrough,
            4 => Self::Blur,
            5 => Self::ServerValue,
            _ => Self::Replace,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Replace => 1,
            Self::Remove => 2,
            Self::Strikethrough => 3,
            Self::Blur => 4,
            Self::ServerValue => 5,
        }
    }
}

/// Image censoring style, stored under `imageFilterMethod`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageMethod {
    #[default]
    Replace,
    Remove,
    ServerValue,
}

impl ImageMethod {
    /// Unknown codes fall back to [`ImageMethod::Replace`].
    pub fn from_code(code: i64) -> Self {
        match code {
            2 => Self::Remove,
            3 => Self::ServerValue,
            _ => Self::Replace,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Replace => 1,
            Self::Remove => 2,
            Self::ServerValue => 3,
        }
    }
}

/// Snapshot of the extension settings, keyed like the external store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub censor_method: i64,
    pub image_filter_method: i64,
    #[serde(deserialize_with = "clamped_harm_level")]
    pub harm_level: u8,
    pub text_replacement: String,
    pub image_replacement: String,
    pub strike_prefix: String,
    pub strike_suffix: String,
    pub blur_style: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            censor_method: TextMethod::Replace.code(),
            image_filter_method: ImageMethod::Replace.code(),
            harm_level: DEFAULT_HARM_LEVEL,
            text_replacement: DEFAULT_TEXT_REPLACEMENT.to_string(),
            image_replacement: DEFAULT_IMAGE_PLACEHOLDER.to_string(),
            strike_prefix: DEFAULT_STRIKE_PREFIX.to_string(),
            strike_suffix: DEFAULT_STRIKE_SUFFIX.to_string(),
            blur_style: DEFAULT_BLUR_STYLE.to_string(),
        }
    }
}

impl Settings {
    /// Load a settings blob as stored by the extension. Missing keys take
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CensorError::Config(e.to_string()))
    }

    pub fn text_method(&self) -> TextMethod {
        TextMethod::from_code(self.censor_method)
    }

    pub fn image_method(&self) -> ImageMethod {
        ImageMethod::from_code(self.image_filter_method)
    }

    /// Strategy for the text filter under these settings.
    pub fn text_strategy(&self) -> Strategy {
        match self.text_method() {
            TextMethod::Replace => Strategy::Replace(or_default(
                &self.text_replacement,
                DEFAULT_TEXT_REPLACEMENT,
            )),
            TextMethod::Remove => Strategy::Remove,
            TextMethod::Strikethrough => Strategy::Strikethrough {
                prefix: self.strike_prefix.clone(),
                suffix: self.strike_suffix.clone(),
            },
            TextMethod::Blur => Strategy::Blur {
                style: self.blur_style.clone(),
            },
            TextMethod::ServerValue => Strategy::ReplaceByServerValue(Lookup::Words),
        }
    }

    /// Strategy for the image filter under these settings.
    pub fn image_strategy(&self) -> Strategy {
        match self.image_method() {
            ImageMethod::Replace => Strategy::Replace(or_default(
                &self.image_replacement,
                DEFAULT_IMAGE_PLACEHOLDER,
            )),
            ImageMethod::Remove => Strategy::Remove,
            ImageMethod::ServerValue => Strategy::ReplaceByServerValue(Lookup::Urls),
        }
    }

    /// Set one value by its store key. Returns whether the value changed.
    fn set(&mut self, key: &str, raw: &str) -> Result<bool> {
        let code = || {
            raw.trim()
                .parse::<i64>()
                .map_err(|e| CensorError::Config(format!("{key}: {e}")))
        };
        let before = self.clone();
        match key {
            "censorMethod" => self.censor_method = code()?,
            "imageFilterMethod" => self.image_filter_method = code()?,
            "harmLevel" => self.harm_level = code()?.clamp(0, 100) as u8,
            "textReplacement" => self.text_replacement = raw.to_string(),
            "imageReplacement" => self.image_replacement = raw.to_string(),
            "strikePrefix" => self.strike_prefix = raw.to_string(),
            "strikeSuffix" => self.strike_suffix = raw.to_string(),
            "blurStyle" => self.blur_style = raw.to_string(),
            _ => return Err(CensorError::Config(format!("unknown setting {key:?}"))),
        }
        Ok(*self != before)
    }
}

/// Any integer is accepted for `harmLevel` and clamped into 0..=100.
fn clamped_harm_level<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<u8, D::Error> {
    let level = i64::deserialize(deserializer)?;
    Ok(level.clamp(0, 100) as u8)
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Configuration source shared by the settings UI glue and the coordinator.
///
/// Cloning is cheap; all clones publish to the same subscribers. Subscribers
/// are only notified when a write actually changes a value.
#[derive(Clone)]
pub struct SettingsStore {
    tx: Arc<watch::Sender<Settings>>,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Self {
        let (tx, _rx) = watch::channel(settings);
        Self { tx: Arc::new(tx) }
    }

    /// Current settings snapshot.
    pub fn get(&self) -> Settings {
        self.tx.borrow().clone()
    }

    /// Modify the settings in place. Returns whether anything changed.
    pub fn update(&self, f: impl FnOnce(&mut Settings)) -> bool {
        self.tx.send_if_modified(|settings| {
            let before = settings.clone();
            f(settings);
            settings.harm_level = settings.harm_level.min(100);
            *settings != before
        })
    }

    /// Set a value by its store key (`censorMethod`, `harmLevel`, ...).
    /// Returns whether the value changed.
    pub fn set_value(&self, key: &str, raw: &str) -> Result<bool> {
        let mut outcome = Ok(false);
        self.tx.send_if_modified(|settings| {
            outcome = settings.set(key, raw);
            matches!(outcome, Ok(true))
        });
        if let Ok(true) = outcome {
            tracing::debug!("Setting updated: {key} = {raw}");
        }
        outcome
    }

    /// Receiver that observes every change.
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
