//! Loading the per-page text dataset.

use std::fs;
use std::path::Path;

use khatma_core::{DatasetMeta, PageDataset, TOTAL_PAGES, TextUnit};
use serde::Deserialize;

use crate::error::DatasetError;

/// On-disk shape: `pages[0]` is unused, `pages[p]` holds page `p`.
#[derive(Debug, Deserialize)]
struct DatasetFile {
    #[serde(default)]
    meta: DatasetMeta,
    pages: Vec<Option<Vec<TextUnit>>>,
}

/// Parses a dataset and checks that every page has text.
pub fn parse_dataset(raw: &str) -> Result<PageDataset, DatasetError> {
    let file: DatasetFile = serde_json::from_str(raw)?;
    let pages = file
        .pages
        .into_iter()
        .skip(1)
        .map(Option::unwrap_or_default)
        .collect();

    let dataset = PageDataset::new(file.meta, pages);
    let missing = dataset.empty_pages(TOTAL_PAGES);
    if !missing.is_empty() {
        return Err(DatasetError::MissingPages(missing));
    }
    Ok(dataset)
}

pub fn load_dataset(path: impl AsRef<Path>) -> Result<PageDataset, DatasetError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path)?;
    let dataset = parse_dataset(&raw)?;
    tracing::info!(
        path = %path.display(),
        pages = dataset.page_count(),
        built_at = dataset.meta().built_at.as_deref().unwrap_or("unknown"),
        "loaded page dataset"
    );
    Ok(dataset)
}
