//! Core domain types for khatma.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Pages in the corpus.
pub const TOTAL_PAGES: u32 = 604;
/// Days in a reading plan.
pub const DAYS: usize = 20;
pub const BOOKMARK_LIMIT: usize = 50;
pub const SEARCH_HIT_LIMIT: usize = 30;
/// Joins unit texts when a page is shown as a single string.
pub const PAGE_TEXT_SEPARATOR: &str = " ۝ ";

pub const PLAN_STATE_KEY: &str = "q20_plan_pages_simple_v1";
pub const READER_STATE_KEY: &str = "q20_reader_pages_simple_v1";

/// Clamps any page request into `1..=TOTAL_PAGES`.
pub fn clamp_page(page: i64) -> u32 {
    page.clamp(1, i64::from(TOTAL_PAGES)) as u32
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days)).unwrap_or(date)
}

/// Source of "today" and "now" for the engines.
pub trait Clock {
    /// Calendar date in the local timezone.
    fn today(&self) -> NaiveDate;
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }

    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a given day, for tests and replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

impl FixedClock {
    pub fn on(today: NaiveDate) -> Self {
        Self {
            today,
            now: today.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    pub fn advance_days(&mut self, days: i64) {
        self.today = add_days(self.today, days);
        self.now += Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

fn default_total_pages() -> u32 {
    TOTAL_PAGES
}

/// Accepts any stored `totalPages`: numbers are floored into `1..`, anything else is the default.
fn lenient_total_pages<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Number(f64),
        Other(#[allow(dead_code)] IgnoredAny),
    }

    Ok(match Stored::deserialize(deserializer)? {
        Stored::Number(n) if n.is_finite() => n.floor().clamp(1.0, f64::from(u32::MAX)) as u32,
        Stored::Number(_) | Stored::Other(_) => TOTAL_PAGES,
    })
}

fn first_page() -> u32 {
    1
}

/// Persisted reading-plan record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanState {
    pub start_date: NaiveDate,
    #[serde(
        default = "default_total_pages",
        deserialize_with = "lenient_total_pages"
    )]
    pub total_pages: u32,
    #[serde(default)]
    pub done: Vec<bool>,
    #[serde(default, with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl PlanState {
    pub fn new(start_date: NaiveDate, updated_at: DateTime<Utc>) -> Self {
        Self {
            start_date,
            total_pages: TOTAL_PAGES,
            done: vec![false; DAYS],
            updated_at,
        }
    }

    pub fn normalize(&mut self) {
        self.total_pages = self.total_pages.max(1);
        self.done.resize(DAYS, false);
    }

    pub fn completed(&self) -> usize {
        self.done.iter().filter(|d| **d).count()
    }
}

/// Page range assigned to a single plan day. `end` is `start - 1` when `size` is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanChunk {
    pub start: u32,
    pub end: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastRead {
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub page: u32,
    #[serde(rename = "ts", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Persisted reader record. Bookmarks are most-recent-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderState {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub last_read: Option<LastRead>,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

impl Default for ReaderState {
    fn default() -> Self {
        Self {
            page: 1,
            last_read: Some(LastRead { page: 1 }),
            bookmarks: Vec::new(),
        }
    }
}

impl ReaderState {
    pub fn last_read_page(&self) -> u32 {
        self.last_read.map(|l| l.page).unwrap_or(1)
    }

    pub fn is_bookmarked(&self, page: u32) -> bool {
        self.bookmarks.iter().any(|b| b.page == page)
    }

    pub fn normalize(&mut self) {
        self.page = clamp_page(i64::from(self.page));
        if let Some(last_read) = self.last_read.as_mut() {
            last_read.page = clamp_page(i64::from(last_read.page));
        }

        let mut seen = std::collections::HashSet::new();
        for bookmark in &mut self.bookmarks {
            bookmark.page = clamp_page(i64::from(bookmark.page));
        }
        self.bookmarks.retain(|b| seen.insert(b.page));
        self.bookmarks.truncate(BOOKMARK_LIMIT);
    }
}

/// One verse-like unit of page text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextUnit {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surah: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ayah: Option<u32>,
    pub text: String,
}

impl TextUnit {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            surah: None,
            ayah: None,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMeta {
    #[serde(default)]
    pub pages: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_at: Option<String>,
}

/// Read-only page text, indexed by page number starting at 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDataset {
    meta: DatasetMeta,
    pages: Vec<Vec<TextUnit>>,
}

impl PageDataset {
    /// `pages[0]` holds page 1.
    pub fn new(meta: DatasetMeta, pages: Vec<Vec<TextUnit>>) -> Self {
        Self { meta, pages }
    }

    pub fn meta(&self) -> &DatasetMeta {
        &self.meta
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Units of `page`, empty when the dataset has no entry for it.
    pub fn page(&self, page: u32) -> &[TextUnit] {
        page.checked_sub(1)
            .and_then(|idx| self.pages.get(idx as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Pages in `1..=last` that have no units.
    pub fn empty_pages(&self, last: u32) -> Vec<u32> {
        (1..=last).filter(|p| self.page(*p).is_empty()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub page: u32,
    pub key: String,
    pub preview: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn clamp_page_bounds() {
        assert_eq!(clamp_page(0), 1);
        assert_eq!(clamp_page(-3), 1);
        assert_eq!(clamp_page(42), 42);
        assert_eq!(clamp_page(i64::from(TOTAL_PAGES) + 5), TOTAL_PAGES);
    }

    #[test]
    fn add_days_crosses_month_boundaries() {
        assert_eq!(add_days(date(2024, 2, 28), 2), date(2024, 3, 1));
        assert_eq!(add_days(date(2024, 3, 1), -1), date(2024, 2, 29));
    }

    #[test]
    fn new_plan_has_all_days_open() {
        let clock = FixedClock::on(date(2024, 3, 10));
        let plan = PlanState::new(clock.today(), clock.now());
        assert_eq!(plan.done.len(), DAYS);
        assert_eq!(plan.completed(), 0);
        assert_eq!(plan.total_pages, TOTAL_PAGES);
    }

    #[test]
    fn plan_normalizes_done_length_and_pages() {
        let mut plan = PlanState::new(date(2024, 1, 1), Utc::now());
        plan.done = vec![true, true, false];
        plan.total_pages = 0;
        plan.normalize();
        assert_eq!(plan.done.len(), DAYS);
        assert_eq!(plan.completed(), 2);
        assert_eq!(plan.total_pages, 1);

        plan.done = vec![true; DAYS + 4];
        plan.normalize();
        assert_eq!(plan.done.len(), DAYS);
    }

    #[test]
    fn plan_state_reads_stored_snapshot() {
        let raw = r#"{"startDate":"2024-03-10","totalPages":604,"done":[true,false],"updatedAt":1710028800000}"#;
        let mut plan: PlanState = serde_json::from_str(raw).unwrap();
        plan.normalize();
        assert_eq!(plan.start_date, date(2024, 3, 10));
        assert_eq!(plan.updated_at.timestamp_millis(), 1_710_028_800_000);
        assert!(plan.done[0]);
        assert_eq!(plan.done.len(), DAYS);
    }

    #[test]
    fn odd_total_pages_keep_the_rest_of_the_plan() {
        for (stored, expected) in [
            ("300.9", 300),
            ("-12", 1),
            ("0", 1),
            ("\"lots\"", TOTAL_PAGES),
            ("null", TOTAL_PAGES),
        ] {
            let raw = format!(
                r#"{{"startDate":"2024-03-10","totalPages":{stored},"done":[true,true]}}"#
            );
            let plan: PlanState = serde_json::from_str(&raw).unwrap();
            assert_eq!(plan.total_pages, expected, "totalPages {stored}");
            assert_eq!(plan.completed(), 2);
        }
    }

    #[test]
    fn reader_state_reads_stored_snapshot() {
        let raw = r#"{"page":700,"lastRead":null,"bookmarks":[{"page":3,"ts":5},{"page":3,"ts":4}]}"#;
        let mut reader: ReaderState = serde_json::from_str(raw).unwrap();
        reader.normalize();
        assert_eq!(reader.page, TOTAL_PAGES);
        assert_eq!(reader.last_read_page(), 1);
        assert_eq!(reader.bookmarks.len(), 1);
        assert_eq!(reader.bookmarks[0].created_at.timestamp_millis(), 5);
    }

    #[test]
    fn reader_state_serializes_stored_shape() {
        let state = ReaderState::default();
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"page":1,"lastRead":{"page":1},"bookmarks":[]}"#);
    }

    #[test]
    fn dataset_page_lookup_is_one_based() {
        let dataset = PageDataset::new(
            DatasetMeta::default(),
            vec![vec![TextUnit::new("1:1", "a")], Vec::new()],
        );
        assert_eq!(dataset.page(1)[0].key, "1:1");
        assert!(dataset.page(0).is_empty());
        assert!(dataset.page(2).is_empty());
        assert!(dataset.page(9).is_empty());
        assert_eq!(dataset.empty_pages(3), vec![2, 3]);
    }

    #[test]
    fn fixed_clock_advances() {
        let mut clock = FixedClock::on(date(2024, 3, 30));
        clock.advance_days(2);
        assert_eq!(clock.today(), date(2024, 4, 1));
        assert_eq!(clock.now().date_naive(), date(2024, 4, 1));
    }
}
