//! Joining the corpus with the page map into the page dataset.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use khatma_core::{DatasetMeta, PageDataset, TOTAL_PAGES, TextUnit};
use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, CorpusMeta};
use crate::error::{BuildError, BuildResult};
use crate::page_map::{PageMap, PageMapMeta};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagesMeta {
    pub source_text: CorpusMeta,
    pub page_map: PageMapMeta,
    pub pages: u32,
    pub built_at: String,
}

/// The dataset as written to disk. `pages[0]` is always empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagesArtifact {
    pub meta: PagesMeta,
    pub pages: Vec<Vec<TextUnit>>,
}

impl PagesArtifact {
    pub fn into_dataset(self) -> PageDataset {
        let meta = DatasetMeta {
            pages: self.meta.pages,
            built_at: Some(self.meta.built_at),
        };
        PageDataset::new(meta, self.pages.into_iter().skip(1).collect())
    }
}

/// Assigns every corpus verse to its page.
///
/// Verses missing from the map are skipped. Fails with the list of pages left empty.
pub fn join_pages(
    corpus: &Corpus,
    page_map: &PageMap,
    built_at: DateTime<Utc>,
) -> BuildResult<PagesArtifact> {
    let mut pages: Vec<Vec<TextUnit>> = vec![Vec::new(); TOTAL_PAGES as usize + 1];

    let mut unmapped = 0usize;
    for surah in &corpus.surahs {
        for verse in &surah.ayahs {
            let key = format!("{}:{}", surah.number, verse.n);
            let Some(page) = page_map.page_of(&key) else {
                unmapped += 1;
                continue;
            };
            let Some(units) = pages.get_mut(page as usize).filter(|_| page >= 1) else {
                tracing::warn!(%key, page, "page map points outside the corpus");
                continue;
            };
            units.push(TextUnit {
                key,
                surah: Some(surah.number),
                ayah: Some(verse.n),
                text: verse.text.clone(),
            });
        }
    }
    if unmapped > 0 {
        tracing::warn!(unmapped, "verses without a page");
    }

    let empty: Vec<u32> = (1..=TOTAL_PAGES)
        .filter(|p| pages[*p as usize].is_empty())
        .collect();
    if !empty.is_empty() {
        return Err(BuildError::EmptyPages(empty));
    }

    Ok(PagesArtifact {
        meta: PagesMeta {
            source_text: corpus.meta.clone(),
            page_map: page_map.meta.clone(),
            pages: TOTAL_PAGES,
            built_at: built_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        },
        pages,
    })
}

/// Reads the corpus and page map artifacts, joins them and writes the dataset.
///
/// Nothing is written when validation fails.
pub fn build_pages(
    corpus_path: &Path,
    page_map_path: &Path,
    output: &Path,
    built_at: DateTime<Utc>,
) -> BuildResult<PagesArtifact> {
    let corpus: Corpus = crate::read_json(corpus_path)?;
    let page_map = PageMap::load(page_map_path)?;
    let artifact = join_pages(&corpus, &page_map, built_at)?;
    crate::write_json_atomic(output, &artifact)?;
    tracing::info!(
        pages = artifact.meta.pages,
        verses = artifact.pages.iter().map(Vec::len).sum::<usize>(),
        output = %output.display(),
        "wrote page dataset"
    );
    Ok(artifact)
}
