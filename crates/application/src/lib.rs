//! Application orchestration layer for khatma.

use std::sync::Arc;

use khatma_core::{Clock, PageDataset, PlanState, ReaderState};

pub mod plan;
pub mod reader;

pub use plan::{
    PlanDay, PlanEngine, PlanProgress, PlanStatus, build_plan, compute_day_index, compute_streak,
    default_plan_state, plan_end_date,
};
pub use reader::{BookmarkOutcome, PageView, ReaderEngine, add_bookmark, page_view, search};

/// One session: the plan engine, plus the reader once a dataset is available.
///
/// The two engines never talk to each other. The plan stays usable without a dataset.
#[derive(Debug, Clone)]
pub struct AppContext<C> {
    pub plan: PlanEngine<C>,
    reader: Option<ReaderEngine<C>>,
}

impl<C: Clock + Clone> AppContext<C> {
    pub fn new(plan_state: PlanState, clock: C) -> Self {
        Self {
            plan: PlanEngine::new(plan_state, clock),
            reader: None,
        }
    }

    pub fn with_reader(mut self, dataset: Arc<PageDataset>, state: ReaderState, clock: C) -> Self {
        self.reader = Some(ReaderEngine::new(state, dataset, clock));
        self
    }

    pub fn reader(&self) -> Option<&ReaderEngine<C>> {
        self.reader.as_ref()
    }

    pub fn reader_mut(&mut self) -> Option<&mut ReaderEngine<C>> {
        self.reader.as_mut()
    }

    pub fn into_states(self) -> (PlanState, Option<ReaderState>) {
        (
            self.plan.into_state(),
            self.reader.map(ReaderEngine::into_state),
        )
    }
}
