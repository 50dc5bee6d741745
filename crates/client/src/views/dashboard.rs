//! The question dashboard: snapshot, filter, paginate.
//!
//! Every [`Dashboard::load`] takes a ticket from a monotonically
//! increasing counter. When the fetch resumes, the page is stored only if
//! no newer load has started in the meantime, so a slow response can never
//! overwrite a faster, more recent one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;

use qaforum_core::error::CoreError;
use qaforum_core::filter::QuestionFilter;
use qaforum_core::pagination::{
    clamp_items_per_page, clamp_sibling_count, PageState, DEFAULT_ITEMS_PER_PAGE,
    DEFAULT_SIBLING_COUNT,
};
use qaforum_core::read_model::{aggregate_question_record, QuestionReadModel};
use qaforum_core::records::QuestionRecord;
use qaforum_core::session::Session;
use qaforum_core::types::{DbId, Timestamp};
use qaforum_core::vote::AggregateCounts;

use crate::backend::ForumBackend;
use crate::config::ClientConfig;

/// Page size and window width for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSettings {
    pub items_per_page: usize,
    pub sibling_count: usize,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            sibling_count: DEFAULT_SIBLING_COUNT,
        }
    }
}

impl From<&ClientConfig> for PageSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            items_per_page: clamp_items_per_page(config.items_per_page),
            sibling_count: clamp_sibling_count(config.sibling_count),
        }
    }
}

/// What the user asked to see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardQuery {
    pub filter: QuestionFilter,
    /// 1-based; out-of-range values are clamped.
    pub page: usize,
}

impl DashboardQuery {
    pub fn new(filter: QuestionFilter, page: usize) -> Self {
        Self { filter, page }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardPage {
    pub questions: Vec<QuestionReadModel>,
    pub page: PageState,
    /// Questions matching the filter, across all pages.
    pub total_matches: usize,
    pub filter: QuestionFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was stored and is now current.
    Applied,
    /// A newer load started while this one was fetching; its result was dropped.
    Superseded,
}

pub struct Dashboard {
    backend: Arc<dyn ForumBackend>,
    settings: PageSettings,
    latest_ticket: AtomicU64,
    current: RwLock<Option<DashboardPage>>,
}

impl Dashboard {
    pub fn new(backend: Arc<dyn ForumBackend>, settings: PageSettings) -> Self {
        Self {
            backend,
            settings,
            latest_ticket: AtomicU64::new(0),
            current: RwLock::new(None),
        }
    }

    /// Fetch, aggregate, filter and paginate for `query`.
    ///
    /// On error the previously displayed page stays current. A superseded
    /// load reports [`LoadOutcome::Superseded`] whether its fetch
    /// succeeded or not.
    pub async fn load(
        &self,
        session: &Session,
        query: &DashboardQuery,
    ) -> Result<LoadOutcome, CoreError> {
        let ticket = self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let fetched = self.backend.fetch_questions(session.viewer_id()).await;

        let mut current = self.current.write().await;
        if self.latest_ticket.load(Ordering::SeqCst) != ticket {
            tracing::debug!(ticket, "Discarding superseded dashboard load");
            return Ok(LoadOutcome::Superseded);
        }

        let records = fetched.map_err(|e| {
            tracing::warn!(error = %e, "Dashboard load failed");
            e
        })?;
        let page = build_page(&records, query, self.settings, Utc::now());
        tracing::debug!(
            ticket,
            total_matches = page.total_matches,
            page = page.page.current_page,
            "Dashboard page loaded",
        );
        *current = Some(page);
        Ok(LoadOutcome::Applied)
    }

    /// The page currently on screen, if any load has completed.
    pub async fn current(&self) -> Option<DashboardPage> {
        self.current.read().await.clone()
    }

    /// Show confirmed vote counts for a question on the current page.
    pub async fn apply_vote(&self, question_id: DbId, counts: &AggregateCounts) {
        if let Some(page) = self.current.write().await.as_mut() {
            if let Some(question) = page.questions.iter_mut().find(|q| q.id == question_id) {
                question.apply_counts(counts);
            }
        }
    }
}

/// Aggregate every record, then filter and cut out the requested page.
pub fn build_page(
    records: &[QuestionRecord],
    query: &DashboardQuery,
    settings: PageSettings,
    now: Timestamp,
) -> DashboardPage {
    let all: Vec<QuestionReadModel> = records
        .iter()
        .map(|r| aggregate_question_record(r, now))
        .collect();
    let matches = query.filter.apply(&all);
    let page = PageState::new(
        matches.len(),
        settings.items_per_page,
        query.page,
        settings.sibling_count,
    );

    DashboardPage {
        questions: page.page_slice(&matches).to_vec(),
        total_matches: matches.len(),
        filter: query.filter.clone(),
        page,
    }
}
