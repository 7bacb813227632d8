use std::{fs, path::Path};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const DEFAULT_REMAINING_ITEMS_THRESHOLD: usize = 5;
pub const DEFAULT_BASE_URI: &str = "https://derpibooru.org/";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Unspecified,
    Dark,
    Light,
}

/// User preferences persisted by the app shell. Read-only to the gallery.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub compact_mode: bool,
    pub show_score_icons: bool,
    pub theme: Theme,
}

impl Settings {
    /// Loads settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Unable to read settings from {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Unable to parse settings in {}", path.display()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GalleryConfig {
    pub page_size: u32,
    /// How many unseen items may remain before the next page is requested.
    pub remaining_items_threshold: usize,
    pub base_uri: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            remaining_items_threshold: DEFAULT_REMAINING_ITEMS_THRESHOLD,
            base_uri: DEFAULT_BASE_URI.to_string(),
        }
    }
}
