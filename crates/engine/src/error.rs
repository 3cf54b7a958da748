use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Pages listed in a diagnostic before it is cut short.
const LISTED_PAGES: usize = 50;

fn list_pages(pages: &[u32]) -> String {
    let shown: Vec<String> = pages.iter().take(LISTED_PAGES).map(u32::to_string).collect();
    if pages.len() > LISTED_PAGES {
        format!("{} (and {} more)", shown.join(", "), pages.len() - LISTED_PAGES)
    } else {
        shown.join(", ")
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("page dataset not found at {0}; build it with `khatma build pages`")]
    NotFound(PathBuf),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("page dataset is not valid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("page dataset has no text for pages: {}", list_pages(.0))]
    MissingPages(Vec<u32>),
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("missing input file: {0}")]
    MissingInput(PathBuf),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("corpus incomplete, surahs without verses: {0:?}")]
    IncompleteCorpus(Vec<u32>),

    #[error("no keys returned for page {0}")]
    NoKeysForPage(u32),

    #[error("page {page} is outside 1..={last}")]
    PageOutOfRange { page: u32, last: u32 },

    #[error(
        "some pages are empty: {}; verse keys probably follow a different page scheme",
        list_pages(.0)
    )]
    EmptyPages(Vec<u32>),
}

pub type BuildResult<T> = Result<T, BuildError>;
