use std::sync::Arc;

use chrono::{Duration, Utc};
use khatma_application::{AppContext, BookmarkOutcome, PlanEngine, PlanStatus, build_plan};
use khatma_core::{Clock, DAYS, TOTAL_PAGES, add_days};
use khatma_engine::{join_pages, parse_corpus};
use khatma_storage::{MemoryStore, Storage, load_plan, load_reader, save_plan, save_reader};
use khatma_test::{date, make_clock, make_corpus_text, make_dataset, make_page_map};

#[test]
fn fresh_plan_allocates_the_remainder_first() {
    let clock = make_clock(2024, 3, 10);
    let engine = PlanEngine::fresh(clock);

    assert_eq!(engine.state().start_date, clock.today());
    let days = engine.schedule();
    assert_eq!(days.len(), DAYS);
    assert_eq!((days[0].chunk.start, days[0].chunk.end), (1, 31));
    assert!(days[..4].iter().all(|d| d.chunk.size == 31));
    assert!(days[4..].iter().all(|d| d.chunk.size == 30));
    assert_eq!(days[19].chunk.end, TOTAL_PAGES);
}

#[test]
fn three_days_done_on_day_five_is_two_behind() {
    let mut clock = make_clock(2024, 3, 10);
    let mut engine = PlanEngine::fresh(clock);
    for day in 0..3 {
        engine.set_done(day, true);
    }

    clock.advance_days(4);
    let engine = PlanEngine::new(engine.into_state(), clock);
    let progress = engine.progress();
    assert_eq!(progress.day_index, 4);
    assert_eq!(progress.behind, 2);
    assert_eq!(progress.status, PlanStatus::Behind { day_index: 4, days: 2 });
    assert_eq!(progress.status.pace_line(), "Behind by 2 day(s).");
}

#[test]
fn partition_holds_for_many_sizes() {
    for total in [20, 21, 39, 100, 604, 1000, 6236] {
        let chunks = build_plan(total);
        let mut next = 1;
        for chunk in &chunks {
            assert_eq!(chunk.start, next);
            next = chunk.end + 1;
        }
        assert_eq!(next, total + 1);
        let max = chunks.iter().map(|c| c.size).max().unwrap();
        let min = chunks.iter().map(|c| c.size).min().unwrap();
        assert!(max - min <= 1);
    }
}

#[test]
fn plan_window_moves_with_the_clock() {
    let mut clock = make_clock(2024, 3, 30);
    let mut engine = PlanEngine::fresh(clock);
    assert!(engine.mark_today());

    clock.advance_days(DAYS as i64);
    let mut engine = PlanEngine::new(engine.into_state(), clock);
    assert!(!engine.mark_today());
    assert_eq!(
        engine.progress().status.pace_line(),
        format!("Plan ended on {}.", add_days(date(2024, 3, 30), 19))
    );
}

#[test]
fn reader_session_survives_a_restart() -> anyhow::Result<()> {
    let store = Storage::open_in_memory()?;
    let clock = make_clock(2024, 3, 10);
    let dataset = Arc::new(make_dataset("alpha"));

    let mut ctx = AppContext::new(load_plan(&store, &clock), clock).with_reader(
        Arc::clone(&dataset),
        load_reader(&store),
        clock,
    );
    ctx.plan.mark_today();
    let reader = ctx.reader_mut().unwrap();
    assert_eq!(reader.go_to(0), 1);
    assert_eq!(reader.go_to(i64::from(TOTAL_PAGES) + 5), TOTAL_PAGES);
    reader.go_to(42);
    reader.mark_last_read();
    assert_eq!(reader.add_bookmark(), BookmarkOutcome::Added);
    assert_eq!(reader.add_bookmark(), BookmarkOutcome::AlreadyBookmarked);
    reader.go_to(7);

    let (plan, reader) = ctx.into_states();
    save_plan(&store, &plan)?;
    save_reader(&store, &reader.unwrap())?;

    let plan = load_plan(&store, &clock);
    assert!(plan.done[0]);
    let reader = load_reader(&store);
    assert_eq!(reader.page, 7);
    assert_eq!(reader.last_read_page(), 42);
    assert_eq!(reader.bookmarks.len(), 1);
    assert_eq!(reader.bookmarks[0].page, 42);
    Ok(())
}

#[test]
fn bookmarks_keep_the_newest_fifty() -> anyhow::Result<()> {
    let store = MemoryStore::default();
    let clock = make_clock(2024, 3, 10);
    let mut ctx = AppContext::new(load_plan(&store, &clock), clock).with_reader(
        Arc::new(make_dataset("alpha")),
        load_reader(&store),
        clock,
    );

    let reader = ctx.reader_mut().unwrap();
    for page in 1..=51 {
        reader.go_to(page);
        reader.add_bookmark();
    }
    save_reader(&store, reader.state())?;

    let state = load_reader(&store);
    assert_eq!(state.bookmarks.len(), 50);
    assert_eq!(state.bookmarks[0].page, 51);
    assert!(!state.is_bookmarked(1));
    Ok(())
}

#[test]
fn search_over_a_built_dataset() -> anyhow::Result<()> {
    let corpus = parse_corpus(&make_corpus_text(6))?;
    let artifact = join_pages(&corpus, &make_page_map(6), Utc::now())?;
    let dataset = Arc::new(artifact.into_dataset());
    let clock = make_clock(2024, 3, 10);

    let mut ctx = AppContext::new(load_plan(&MemoryStore::default(), &clock), clock)
        .with_reader(dataset, Default::default(), clock);
    let reader = ctx.reader_mut().unwrap();

    assert!(reader.search("").is_empty());
    let hits = reader.search("verse");
    assert_eq!(hits.len(), 30);
    assert!(hits.windows(2).all(|w| w[0].page <= w[1].page));
    assert_eq!((hits[0].page, hits[0].key.as_str()), (1, "1:1"));
    assert_eq!((hits[1].page, hits[1].key.as_str()), (1, "101:5"));

    let hits = reader.search("verse 114:6");
    assert_eq!(hits.len(), 1);
    assert_eq!(reader.open_hit(&hits[0]), 80);
    assert_eq!(reader.current().title(), "Page 80 / 604");
    Ok(())
}

#[test]
fn plan_is_usable_without_a_dataset() {
    let clock = make_clock(2024, 3, 10);
    let mut ctx = AppContext::new(load_plan(&MemoryStore::default(), &clock), clock);
    assert!(ctx.reader().is_none());
    ctx.plan.set_done(25, true);
    assert!(ctx.plan.state().done[DAYS - 1]);
    assert!(ctx.plan.state().updated_at > clock.now() - Duration::seconds(1));
}
