//! `ConversionOptions` — a single frozen configuration record with all
//! fields enumerated and defaulted, resolving Design Note "dynamic typing
//! of options" in favor of no absent-vs-null distinctions downstream.

use serde::{Deserialize, Serialize};

use super::settings::Settings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOptions {
    pub target_selectors: Vec<String>,
    pub remove_selectors: Vec<String>,
    pub aggressive_cleaning: bool,
    pub remove_images: bool,
    pub min_content_length: usize,
    pub scroll_wait_ms: u64,
    pub no_cache: bool,
}

impl ConversionOptions {
    /// Defaults seeded from process-wide settings, with every field present
    /// (`spec.md` §3: "Created per request; immutable").
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            target_selectors: Vec::new(),
            remove_selectors: Vec::new(),
            aggressive_cleaning: settings.aggressive_cleaning,
            remove_images: settings.remove_images,
            min_content_length: settings.min_content_length,
            scroll_wait_ms: settings.scroll_wait_time.as_millis() as u64,
            no_cache: false,
        }
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}
