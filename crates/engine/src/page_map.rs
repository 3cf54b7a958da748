//! Verse key to page number mapping.

use std::collections::BTreeMap;
use std::path::Path;

use khatma_core::TOTAL_PAGES;
use serde::{Deserialize, Serialize};

use crate::error::{BuildError, BuildResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMapMeta {
    pub source: String,
    pub pages: u32,
}

/// `{"2:255": 42, ...}` plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMap {
    pub meta: PageMapMeta,
    pub map: BTreeMap<String, u32>,
}

impl PageMap {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            meta: PageMapMeta {
                source: source.into(),
                pages: TOTAL_PAGES,
            },
            map: BTreeMap::new(),
        }
    }

    /// Records the verse keys listed for `page`. A key seen on an earlier page keeps that page.
    pub fn record_page<S: AsRef<str>>(&mut self, page: u32, keys: &[S]) -> BuildResult<()> {
        if !(1..=self.meta.pages).contains(&page) {
            return Err(BuildError::PageOutOfRange {
                page,
                last: self.meta.pages,
            });
        }
        let mut keys = keys
            .iter()
            .map(|k| k.as_ref())
            .filter(|k| !k.is_empty())
            .peekable();
        if keys.peek().is_none() {
            return Err(BuildError::NoKeysForPage(page));
        }
        for key in keys {
            self.map.entry(key.to_string()).or_insert(page);
        }
        Ok(())
    }

    pub fn page_of(&self, key: &str) -> Option<u32> {
        self.map.get(key).copied()
    }

    pub fn load(path: &Path) -> BuildResult<Self> {
        crate::read_json(path)
    }

    pub fn save(&self, path: &Path) -> BuildResult<()> {
        crate::write_json_atomic(path, self)
    }
}

fn default_source() -> String {
    "local".to_string()
}

/// Saved per-page verse key listings: `{"source": "...", "pages": {"1": ["1:1", ...], ...}}`.
#[derive(Debug, Deserialize)]
struct PageKeysFile {
    #[serde(default = "default_source")]
    source: String,
    pages: BTreeMap<u32, Vec<String>>,
}

/// Builds the page map from saved listings, one page at a time in page order.
///
/// Every page must list at least one key; listings for pages outside the corpus are rejected.
pub fn build_page_map(input: &Path, output: &Path) -> BuildResult<PageMap> {
    let listing: PageKeysFile = crate::read_json(input)?;
    let mut map = PageMap::new(listing.source);

    if let Some(&page) = listing.pages.keys().find(|p| !(1..=TOTAL_PAGES).contains(*p)) {
        return Err(BuildError::PageOutOfRange {
            page,
            last: TOTAL_PAGES,
        });
    }
    for page in 1..=TOTAL_PAGES {
        let keys = listing.pages.get(&page).map(Vec::as_slice).unwrap_or(&[]);
        map.record_page(page, keys)?;
    }

    map.save(output)?;
    tracing::info!(
        keys = map.map.len(),
        output = %output.display(),
        "wrote page map"
    );
    Ok(map)
}
