//! Plain-text rendering of engine snapshots.

use std::fmt::Write as _;

use chrono::Local;
use khatma_application::{PageView, PlanEngine};
use khatma_core::{Clock, DAYS, ReaderState, SearchHit};
use unicode_width::UnicodeWidthChar;

/// Search results shown at once.
pub const SEARCH_DISPLAY_LIMIT: usize = 12;
/// Display columns of a search preview.
pub const PREVIEW_WIDTH: usize = 120;

/// Cuts `text` to at most `width` display columns.
pub fn truncate_to_width(text: &str, width: usize) -> &str {
    let mut used = 0;
    for (idx, ch) in text.char_indices() {
        used += ch.width().unwrap_or(0);
        if used > width {
            return &text[..idx];
        }
    }
    text
}

pub fn plan<C: Clock>(engine: &PlanEngine<C>) -> String {
    let state = engine.state();
    let progress = engine.progress();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Plan from {} • {} pages over {} days",
        state.start_date, state.total_pages, DAYS
    );
    for day in engine.schedule() {
        let _ = writeln!(
            out,
            "[{}] D{:<2}  Pages {}–{:<4}  {} • {} pages",
            if day.done { "x" } else { " " },
            day.number(),
            day.chunk.start,
            day.chunk.end,
            day.date,
            day.chunk.size,
        );
    }
    let _ = writeln!(
        out,
        "Completed {} ({}%) • Streak {} • Today: {}",
        progress.completed_label(),
        progress.progress_percent,
        progress.streak,
        progress.status.today_label(),
    );
    let _ = write!(out, "{}", progress.status);
    out
}

pub fn page(view: &PageView<'_>, state: &ReaderState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.title());
    let _ = writeln!(out, "{}", view.range_line());
    if view.unit_count() > 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", view.text());
        let _ = writeln!(out);
    }
    let _ = write!(
        out,
        "Last read: {} • Bookmarks: {}",
        state.last_read_page(),
        state.bookmarks.len()
    );
    out
}

pub fn search_results(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No matches".to_string();
    }

    let mut out = String::new();
    let _ = write!(out, "{} match(es)", hits.len());
    for (idx, hit) in hits.iter().take(SEARCH_DISPLAY_LIMIT).enumerate() {
        let _ = write!(
            out,
            "\n[{}] Page {} • {}\n    …{}…",
            idx + 1,
            hit.page,
            hit.key,
            truncate_to_width(&hit.preview, PREVIEW_WIDTH)
        );
    }
    out
}

pub fn bookmarks(state: &ReaderState) -> String {
    if state.bookmarks.is_empty() {
        return "No bookmarks".to_string();
    }
    state
        .bookmarks
        .iter()
        .map(|b| {
            format!(
                "Page {} • {}",
                b.page,
                b.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
