//! Test helpers and fixtures.

use chrono::NaiveDate;
use khatma_core::{DatasetMeta, FixedClock, PageDataset, TOTAL_PAGES, TextUnit};
use khatma_engine::PageMap;
use khatma_engine::corpus::SURAH_COUNT;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_clock(y: i32, m: u32, d: u32) -> FixedClock {
    FixedClock::on(date(y, m, d))
}

/// A full dataset where page `p` has one unit keyed `p:1` reading `page p <word>`.
pub fn make_dataset(word: &str) -> PageDataset {
    let pages = (1..=TOTAL_PAGES)
        .map(|p| vec![TextUnit::new(format!("{p}:1"), format!("page {p} {word}"))])
        .collect();
    PageDataset::new(
        DatasetMeta {
            pages: TOTAL_PAGES,
            built_at: None,
        },
        pages,
    )
}

/// Plain-text corpus with `verses` lines per surah, `|`-delimited.
pub fn make_corpus_text(verses: u32) -> String {
    let mut lines = Vec::new();
    for s in 1..=SURAH_COUNT {
        for n in 1..=verses {
            lines.push(format!("{s}|{n}|verse {s}:{n}"));
        }
    }
    lines.join("\n")
}

/// Page map over [`make_corpus_text`] that lays verses out in reading order, wrapping around.
pub fn make_page_map(verses: u32) -> PageMap {
    let mut by_page: Vec<Vec<String>> = vec![Vec::new(); TOTAL_PAGES as usize];
    let mut idx = 0usize;
    for s in 1..=SURAH_COUNT {
        for n in 1..=verses {
            by_page[idx % TOTAL_PAGES as usize].push(format!("{s}:{n}"));
            idx += 1;
        }
    }

    let mut map = PageMap::new("fixture");
    for (page, keys) in (1..).zip(&by_page) {
        if !keys.is_empty() {
            map.record_page(page, keys.as_slice())
                .expect("fixture pages are in range");
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_dataset() {
        let dataset = make_dataset("alpha");
        assert_eq!(dataset.page_count(), TOTAL_PAGES as usize);
        assert_eq!(dataset.page(604)[0].text, "page 604 alpha");
    }

    #[test]
    fn page_map_covers_corpus() {
        let map = make_page_map(6);
        assert_eq!(map.map.len(), 684);
        assert_eq!(map.page_of("1:1"), Some(1));
        assert_eq!(map.page_of("101:5"), Some(1));
    }
}
