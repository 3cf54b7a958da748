//! Page navigation, bookmarks and search over the page dataset.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use khatma_core::{
    BOOKMARK_LIMIT, Bookmark, Clock, LastRead, PAGE_TEXT_SEPARATOR, PageDataset, ReaderState,
    SEARCH_HIT_LIMIT, SearchHit, TOTAL_PAGES, TextUnit, clamp_page,
};

/// One page of text as shown to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageView<'a> {
    pub page: u32,
    pub units: &'a [TextUnit],
}

impl<'a> PageView<'a> {
    pub fn first_key(&self) -> Option<&'a str> {
        self.units.first().map(|u| u.key.as_str())
    }

    pub fn last_key(&self) -> Option<&'a str> {
        self.units.last().map(|u| u.key.as_str())
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn title(&self) -> String {
        format!("Page {} / {}", self.page, TOTAL_PAGES)
    }

    pub fn text(&self) -> String {
        self.units
            .iter()
            .map(|u| u.text.as_str())
            .collect::<Vec<_>>()
            .join(PAGE_TEXT_SEPARATOR)
    }

    pub fn range_line(&self) -> String {
        match (self.first_key(), self.last_key()) {
            (Some(first), Some(last)) => format!(
                "Range: {first} → {last} • Verses: {}",
                self.unit_count()
            ),
            _ => "No verses found for this page".to_string(),
        }
    }
}

/// Looks up a page, clamping out-of-range requests to the first or last page.
pub fn page_view(dataset: &PageDataset, page: i64) -> PageView<'_> {
    let page = clamp_page(page);
    PageView {
        page,
        units: dataset.page(page),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkOutcome {
    Added,
    AlreadyBookmarked,
}

/// Adds a bookmark for `page` at the front of the list.
///
/// A page is bookmarked at most once; the list keeps the `BOOKMARK_LIMIT` most recent entries.
pub fn add_bookmark(state: &mut ReaderState, page: i64, now: DateTime<Utc>) -> BookmarkOutcome {
    let page = clamp_page(page);
    let outcome = if state.is_bookmarked(page) {
        BookmarkOutcome::AlreadyBookmarked
    } else {
        state.bookmarks.insert(
            0,
            Bookmark {
                page,
                created_at: now,
            },
        );
        BookmarkOutcome::Added
    };
    state.bookmarks.truncate(BOOKMARK_LIMIT);
    outcome
}

/// Literal, case-sensitive substring search over every page in order.
///
/// Blank needles match nothing. Scanning stops once `SEARCH_HIT_LIMIT` hits are collected.
pub fn search(dataset: &PageDataset, needle: &str) -> Vec<SearchHit> {
    search_pages((1..=TOTAL_PAGES).map(|p| (p, dataset.page(p))), needle)
}

fn search_pages<'a, I>(pages: I, needle: &str) -> Vec<SearchHit>
where
    I: IntoIterator<Item = (u32, &'a [TextUnit])>,
{
    let needle = needle.trim();
    let mut hits = Vec::new();
    if needle.is_empty() {
        return hits;
    }

    for (page, units) in pages {
        for unit in units {
            if unit.text.contains(needle) {
                hits.push(SearchHit {
                    page,
                    key: unit.key.clone(),
                    preview: unit.text.clone(),
                });
                if hits.len() >= SEARCH_HIT_LIMIT {
                    return hits;
                }
            }
        }
    }
    hits
}

/// Owns a reader record over a loaded dataset.
///
/// Constructing one requires a dataset, so no query can run before the load succeeded.
#[derive(Debug, Clone)]
pub struct ReaderEngine<C> {
    state: ReaderState,
    dataset: Arc<PageDataset>,
    clock: C,
}

impl<C: Clock> ReaderEngine<C> {
    pub fn new(mut state: ReaderState, dataset: Arc<PageDataset>, clock: C) -> Self {
        state.normalize();
        Self {
            state,
            dataset,
            clock,
        }
    }

    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    pub fn into_state(self) -> ReaderState {
        self.state
    }

    pub fn current(&self) -> PageView<'_> {
        page_view(&self.dataset, i64::from(self.state.page))
    }

    pub fn go_to(&mut self, page: i64) -> u32 {
        self.state.page = clamp_page(page);
        tracing::debug!(page = self.state.page, "go to page");
        self.state.page
    }

    pub fn next(&mut self) -> u32 {
        self.go_to(i64::from(self.state.page) + 1)
    }

    pub fn prev(&mut self) -> u32 {
        self.go_to(i64::from(self.state.page) - 1)
    }

    pub fn mark_last_read(&mut self) {
        self.state.last_read = Some(LastRead {
            page: self.state.page,
        });
        tracing::debug!(page = self.state.page, "marked last read");
    }

    pub fn go_to_last_read(&mut self) -> u32 {
        self.go_to(i64::from(self.state.last_read_page()))
    }

    pub fn add_bookmark(&mut self) -> BookmarkOutcome {
        let page = self.state.page;
        let outcome = add_bookmark(&mut self.state, i64::from(page), self.clock.now());
        tracing::debug!(page, ?outcome, "bookmark");
        outcome
    }

    pub fn search(&self, needle: &str) -> Vec<SearchHit> {
        let hits = search(&self.dataset, needle);
        tracing::debug!(needle = needle.trim(), hits = hits.len(), "search");
        hits
    }

    pub fn open_hit(&mut self, hit: &SearchHit) -> u32 {
        self.go_to(i64::from(hit.page))
    }
}
