use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::api::ImageId;

static PAGE_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^page-(\d+)\.json$").expect("valid page pattern"));
static DETAIL_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^detail-(\d+)\.json$").expect("valid detail pattern"));

/// Recorded API responses found on disk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FixtureIndex {
    pub pages: BTreeMap<u32, PathBuf>,
    pub details: HashMap<ImageId, PathBuf>,
}

impl FixtureIndex {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.details.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    Page(u32),
    Detail(ImageId),
}

pub fn classify_fixture(path: &Path) -> Option<FixtureKind> {
    let name = path.file_name()?.to_str()?;
    if let Some(caps) = PAGE_FILE.captures(name) {
        return caps[1].parse().ok().map(FixtureKind::Page);
    }
    if let Some(caps) = DETAIL_FILE.captures(name) {
        return caps[1].parse().ok().map(|id| FixtureKind::Detail(ImageId(id)));
    }
    None
}

pub fn collect_fixtures(root: &Path, recursive: bool) -> Result<FixtureIndex> {
    if !root.exists() {
        return Err(anyhow!("{} does not exist", root.display()));
    }
    if !root.is_dir() {
        return Err(anyhow!("{} is not a directory", root.display()));
    }

    let mut index = FixtureIndex::default();
    let mut add = |path: PathBuf| match classify_fixture(&path) {
        Some(FixtureKind::Page(page)) => {
            index.pages.insert(page, path);
        }
        Some(FixtureKind::Detail(id)) => {
            index.details.insert(id, path);
        }
        None => {}
    };

    if recursive {
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() {
                add(entry.path().to_path_buf());
            }
        }
    } else {
        for entry in fs::read_dir(root).with_context(|| format!("Unable to read directory {}", root.display()))? {
            let entry = entry.with_context(|| format!("Unable to read entry in {}", root.display()))?;
            let path = entry.path();
            if path.is_file() {
                add(path);
            }
        }
    }
    Ok(index)
}
