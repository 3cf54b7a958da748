//! Reading-plan scheduling and progress.

use chrono::NaiveDate;
use khatma_core::{Clock, DAYS, PlanChunk, PlanState, TOTAL_PAGES, add_days};

/// Splits `total_pages` into `DAYS` contiguous chunks.
///
/// The first `total_pages % DAYS` chunks carry one extra page. With fewer pages than days the
/// trailing chunks are empty.
pub fn build_plan(total_pages: u32) -> Vec<PlanChunk> {
    let days = DAYS as u32;
    let base = total_pages / days;
    let rem = total_pages % days;

    let mut page = 1;
    (0..days)
        .map(|day| {
            let size = base + u32::from(day < rem);
            let chunk = PlanChunk {
                start: page,
                end: page - 1 + size,
                size,
            };
            page = page.saturating_add(size);
            chunk
        })
        .collect()
}

/// Whole calendar days from `start` to `today`. Negative before the plan starts.
pub fn compute_day_index(start: NaiveDate, today: NaiveDate) -> i64 {
    today.signed_duration_since(start).num_days()
}

/// Length of the run of completed days at the end of the plan.
///
/// The run is anchored at the last day, not at today.
pub fn compute_streak(done: &[bool]) -> usize {
    done.iter().rev().take_while(|d| **d).count()
}

pub fn plan_end_date(start: NaiveDate) -> NaiveDate {
    add_days(start, DAYS as i64 - 1)
}

pub fn default_plan_state(clock: &impl Clock) -> PlanState {
    PlanState::new(clock.today(), clock.now())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanDay {
    pub index: usize,
    pub date: NaiveDate,
    pub chunk: PlanChunk,
    pub done: bool,
}

impl PlanDay {
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatus {
    NotStarted { starts_on: NaiveDate },
    OnTrack { day_index: usize },
    Behind { day_index: usize, days: u32 },
    Ended { ended_on: NaiveDate },
    Completed,
}

impl PlanStatus {
    pub fn pace_line(&self) -> String {
        match self {
            PlanStatus::NotStarted { starts_on } => format!("Plan starts on {starts_on}."),
            PlanStatus::OnTrack { .. } => "On track ✔️".to_string(),
            PlanStatus::Behind { days, .. } => format!("Behind by {days} day(s)."),
            PlanStatus::Ended { ended_on } => format!("Plan ended on {ended_on}."),
            PlanStatus::Completed => "Completed ✅".to_string(),
        }
    }

    pub fn today_label(&self) -> String {
        match self {
            PlanStatus::NotStarted { .. } => "Not started".to_string(),
            PlanStatus::OnTrack { day_index } | PlanStatus::Behind { day_index, .. } => {
                format!("Day {}", day_index + 1)
            }
            PlanStatus::Ended { .. } | PlanStatus::Completed => "Ended".to_string(),
        }
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pace_line())
    }
}

/// Derived view of a plan on a given day. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanProgress {
    pub completed: usize,
    pub progress_percent: u32,
    pub streak: usize,
    pub day_index: i64,
    pub expected: i64,
    pub behind: i64,
    pub status: PlanStatus,
}

impl PlanProgress {
    pub fn compute(state: &PlanState, today: NaiveDate) -> Self {
        let completed = state.completed();
        let day_index = compute_day_index(state.start_date, today);
        let expected = (day_index + 1).clamp(0, DAYS as i64);
        let behind = expected - completed as i64;

        let status = if day_index < 0 {
            PlanStatus::NotStarted {
                starts_on: state.start_date,
            }
        } else if day_index >= DAYS as i64 {
            if completed == DAYS {
                PlanStatus::Completed
            } else {
                PlanStatus::Ended {
                    ended_on: plan_end_date(state.start_date),
                }
            }
        } else if behind <= 0 {
            PlanStatus::OnTrack {
                day_index: day_index as usize,
            }
        } else {
            PlanStatus::Behind {
                day_index: day_index as usize,
                days: behind as u32,
            }
        };

        Self {
            completed,
            progress_percent: (completed as f64 / DAYS as f64 * 100.0).round() as u32,
            streak: compute_streak(&state.done),
            day_index,
            expected,
            behind,
            status,
        }
    }

    pub fn completed_label(&self) -> String {
        format!("{}/{}", self.completed, DAYS)
    }
}

/// Owns a plan record and applies user actions to it.
///
/// Every mutation stamps `updated_at`; persisting the result is up to the caller.
#[derive(Debug, Clone)]
pub struct PlanEngine<C> {
    state: PlanState,
    clock: C,
}

impl<C: Clock> PlanEngine<C> {
    pub fn new(mut state: PlanState, clock: C) -> Self {
        state.normalize();
        Self { state, clock }
    }

    pub fn fresh(clock: C) -> Self {
        let state = default_plan_state(&clock);
        Self { state, clock }
    }

    pub fn state(&self) -> &PlanState {
        &self.state
    }

    pub fn into_state(self) -> PlanState {
        self.state
    }

    pub fn chunks(&self) -> Vec<PlanChunk> {
        build_plan(self.state.total_pages)
    }

    pub fn schedule(&self) -> Vec<PlanDay> {
        self.chunks()
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| PlanDay {
                index,
                date: add_days(self.state.start_date, index as i64),
                chunk,
                done: self.state.done.get(index).copied().unwrap_or(false),
            })
            .collect()
    }

    pub fn day_index(&self) -> i64 {
        compute_day_index(self.state.start_date, self.clock.today())
    }

    pub fn progress(&self) -> PlanProgress {
        PlanProgress::compute(&self.state, self.clock.today())
    }

    /// Sets day `day_index` (0-based, clamped into the plan) done or not done.
    pub fn set_done(&mut self, day_index: i64, value: bool) {
        let idx = day_index.clamp(0, DAYS as i64 - 1) as usize;
        self.state.done[idx] = value;
        tracing::debug!(day = idx + 1, done = value, "set plan day");
        self.touch();
    }

    pub fn set_start_date(&mut self, date: NaiveDate) {
        self.state.start_date = date;
        tracing::debug!(%date, "set plan start date");
        self.touch();
    }

    /// Floors `total_pages` and keeps it at least 1. Non-finite input restores the corpus size.
    pub fn set_total_pages(&mut self, total_pages: f64) {
        self.state.total_pages = if total_pages.is_finite() {
            total_pages.floor().clamp(1.0, f64::from(u32::MAX)) as u32
        } else {
            TOTAL_PAGES
        };
        tracing::debug!(total_pages = self.state.total_pages, "set plan total pages");
        self.touch();
    }

    /// Marks today's plan day done. Returns false when today is outside the plan window.
    pub fn mark_today(&mut self) -> bool {
        self.set_today(true)
    }

    pub fn undo_today(&mut self) -> bool {
        self.set_today(false)
    }

    pub fn reset(&mut self) {
        self.state = default_plan_state(&self.clock);
        tracing::debug!(start = %self.state.start_date, "reset plan");
    }

    fn set_today(&mut self, value: bool) -> bool {
        let day_index = self.day_index();
        if !(0..DAYS as i64).contains(&day_index) {
            tracing::debug!(day_index, "today is outside the plan window");
            return false;
        }
        self.set_done(day_index, value);
        true
    }

    fn touch(&mut self) {
        self.state.updated_at = self.clock.now();
    }
}
