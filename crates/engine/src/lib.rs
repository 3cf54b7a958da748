//! Page dataset loading and the offline dataset build steps.
//!
//! The build is a pipeline of JSON artifacts: the plain-text corpus is parsed into
//! per-surah verses, a verse-key to page map is recorded, and the two are joined into the
//! page dataset the reader consumes. Each step rewrites its output atomically.

use std::fs::{self, File};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

pub mod corpus;
pub mod dataset;
mod error;
pub mod page_map;
pub mod pages;

pub use corpus::{Corpus, build_corpus, parse_corpus};
pub use dataset::{load_dataset, parse_dataset};
pub use error::{BuildError, BuildResult, DatasetError};
pub use page_map::{PageMap, build_page_map};
pub use pages::{PagesArtifact, build_pages, join_pages};

fn read_text(path: &Path) -> BuildResult<String> {
    if !path.exists() {
        return Err(BuildError::MissingInput(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> BuildResult<T> {
    let raw = read_text(path)?;
    serde_json::from_str(&raw).map_err(|source| BuildError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `value` as compact JSON next to `path`, then renames it into place.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> BuildResult<()> {
    let io_err = |source: io::Error| BuildError::Io {
        path: path.to_path_buf(),
        source,
    };

    let raw = serde_json::to_string(value).map_err(|source| BuildError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let tmp = temp_path(path);
    let written = File::create(&tmp).and_then(|mut file| {
        file.write_all(raw.as_bytes())?;
        file.sync_all()
    });
    if let Err(err) = written.and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(err));
    }
    Ok(())
}
