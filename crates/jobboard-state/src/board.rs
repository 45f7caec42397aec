//! Job listing, filtering, pagination and the save/apply actions.
//!
//! With a session the board pages through server search results. Without
//! one it filters the sample catalog locally. Filter edits never fetch;
//! only `search` and the page moves do.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use jobboard_client::{ApiClient, ApiError};
use jobboard_models::{
    filter_jobs, ApplicationRequest, FilterUpdate, Job, JobApplication, JobFilterCriteria, JobId,
    SortBy,
};
use tracing::{debug, info, warn};

use crate::error::{JobBoardError, JobBoardResult};
use crate::sample::SampleCatalog;
use crate::session::SessionStore;

/// Where the visible jobs come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardMode {
    #[default]
    Sample,
    Server,
}

/// Client-side view of a saved/applied flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Confirmed(bool),
    /// Sent to the server, not yet confirmed.
    Pending { previous: bool, target: bool },
}

impl ToggleState {
    /// Value to display: the target while pending.
    pub fn value(&self) -> bool {
        match *self {
            ToggleState::Confirmed(v) => v,
            ToggleState::Pending { target, .. } => target,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ToggleState::Pending { .. })
    }
}

/// Where to send the user to sign in, and where to come back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRedirect {
    pub return_to: String,
}

impl AuthRedirect {
    pub fn for_job(job_id: JobId) -> Self {
        Self {
            return_to: format!("/jobs/{}", job_id),
        }
    }
}

/// Result of an action that needs a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    AuthRequired(AuthRedirect),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardOp {
    Search,
    LoadSaved,
    Save,
    Unsave,
    Apply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
    Saved,
    Applied,
}

struct BoardState {
    filters: JobFilterCriteria,
    sort_by: SortBy,
    mode: BoardMode,
    /// Catalog in sample mode, the current result page in server mode.
    jobs: Vec<Job>,
    current_page: u32,
    total_pages: u32,
    total_elements: u64,
    search_generation: u64,
    saved: HashMap<JobId, ToggleState>,
    applied: HashMap<JobId, ToggleState>,
    saved_jobs: Vec<Job>,
    applications: HashMap<JobId, JobApplication>,
    errors: HashMap<BoardOp, String>,
    loading: HashSet<BoardOp>,
}

impl BoardState {
    fn toggles(&mut self, toggle: Toggle) -> &mut HashMap<JobId, ToggleState> {
        match toggle {
            Toggle::Saved => &mut self.saved,
            Toggle::Applied => &mut self.applied,
        }
    }

    fn cached_flag(&self, toggle: Toggle, job_id: JobId) -> bool {
        self.jobs
            .iter()
            .chain(self.saved_jobs.iter())
            .find(|j| j.id == job_id)
            .is_some_and(|j| match toggle {
                Toggle::Saved => j.saved,
                Toggle::Applied => j.applied,
            })
    }

    fn state_of(&self, toggle: Toggle, job_id: JobId) -> ToggleState {
        let map = match toggle {
            Toggle::Saved => &self.saved,
            Toggle::Applied => &self.applied,
        };
        map.get(&job_id)
            .copied()
            .unwrap_or_else(|| ToggleState::Confirmed(self.cached_flag(toggle, job_id)))
    }

    /// Copy the toggle view onto a job.
    fn overlay(&self, mut job: Job) -> Job {
        job.saved = self.state_of(Toggle::Saved, job.id).value();
        job.applied = self.state_of(Toggle::Applied, job.id).value();
        job
    }

    /// Jobs to show. Server pages were already filtered and sorted by the
    /// search endpoint, so only the sample catalog is derived locally.
    fn derive(&self, now: DateTime<Utc>) -> Vec<Job> {
        let jobs = match self.mode {
            BoardMode::Server => self.jobs.clone(),
            BoardMode::Sample => filter_jobs(&self.jobs, &self.filters, self.sort_by, now),
        };
        jobs.into_iter().map(|job| self.overlay(job)).collect()
    }

    /// Seed confirmed flags from server data without touching pending ones.
    fn adopt_flags(&mut self, jobs: &[Job]) {
        for job in jobs {
            if !self.saved.get(&job.id).is_some_and(ToggleState::is_pending) {
                self.saved.insert(job.id, ToggleState::Confirmed(job.saved));
            }
            if !self.applied.get(&job.id).is_some_and(ToggleState::is_pending) {
                self.applied.insert(job.id, ToggleState::Confirmed(job.applied));
            }
        }
    }

    fn record_error(&mut self, op: BoardOp, err: &JobBoardError) {
        self.errors.insert(op, err.user_message());
    }
}

pub struct JobBoard {
    client: Arc<ApiClient>,
    session: Arc<SessionStore>,
    catalog: SampleCatalog,
    page_size: u32,
    state: Mutex<BoardState>,
}

impl JobBoard {
    pub fn new(
        client: Arc<ApiClient>,
        session: Arc<SessionStore>,
        catalog: SampleCatalog,
        page_size: u32,
    ) -> Self {
        let state = BoardState {
            filters: JobFilterCriteria::default(),
            sort_by: SortBy::default(),
            mode: BoardMode::Sample,
            jobs: catalog.jobs().to_vec(),
            current_page: 0,
            total_pages: 0,
            total_elements: 0,
            search_generation: 0,
            saved: HashMap::new(),
            applied: HashMap::new(),
            saved_jobs: Vec::new(),
            applications: HashMap::new(),
            errors: HashMap::new(),
            loading: HashSet::new(),
        };
        Self {
            client,
            session,
            catalog,
            page_size: page_size.max(1),
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mode(&self) -> BoardMode {
        self.state().mode
    }

    pub fn filters(&self) -> JobFilterCriteria {
        self.state().filters.clone()
    }

    pub fn sort_by(&self) -> SortBy {
        self.state().sort_by
    }

    pub fn current_page(&self) -> u32 {
        self.state().current_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn error(&self, op: BoardOp) -> Option<String> {
        self.state().errors.get(&op).cloned()
    }

    pub fn is_loading(&self, op: BoardOp) -> bool {
        self.state().loading.contains(&op)
    }

    /// Merge a partial filter update. Does not fetch.
    pub fn update_filters(&self, update: FilterUpdate) {
        let mut state = self.state();
        state.filters.apply(update);
        if state.mode == BoardMode::Sample {
            state.current_page = 0;
        }
    }

    /// Change the ordering. Does not fetch.
    pub fn set_sort(&self, sort_by: SortBy) {
        let mut state = self.state();
        state.sort_by = sort_by;
        if state.mode == BoardMode::Sample {
            state.current_page = 0;
        }
    }

    pub fn reset_filters(&self) {
        let mut state = self.state();
        state.filters = JobFilterCriteria::default();
        if state.mode == BoardMode::Sample {
            state.current_page = 0;
        }
    }

    /// Filtered and sorted view of the sample catalog, or the current
    /// server page as returned, with the saved/applied flags applied.
    pub fn filtered_jobs(&self) -> Vec<Job> {
        self.filtered_jobs_at(Utc::now())
    }

    /// Same as [`filtered_jobs`](Self::filtered_jobs) with an explicit
    /// clock; deterministic for equal inputs.
    pub fn filtered_jobs_at(&self, now: DateTime<Utc>) -> Vec<Job> {
        self.state().derive(now)
    }

    /// Jobs on the current page.
    pub fn visible_jobs(&self) -> Vec<Job> {
        let state = self.state();
        let derived = state.derive(Utc::now());
        match state.mode {
            BoardMode::Server => derived,
            BoardMode::Sample => {
                let start = state.current_page as usize * self.page_size as usize;
                derived
                    .into_iter()
                    .skip(start)
                    .take(self.page_size as usize)
                    .collect()
            }
        }
    }

    pub fn has_next_page(&self) -> bool {
        let state = self.state();
        match state.mode {
            BoardMode::Server => state.current_page + 1 < state.total_pages,
            BoardMode::Sample => {
                let shown = (state.current_page as usize + 1) * self.page_size as usize;
                shown < state.derive(Utc::now()).len()
            }
        }
    }

    pub fn has_previous_page(&self) -> bool {
        self.state().current_page > 0
    }

    /// Total matching jobs: the server's count, or the local derived count.
    pub fn total_jobs(&self) -> u64 {
        let state = self.state();
        match state.mode {
            BoardMode::Server => state.total_elements,
            BoardMode::Sample => state.derive(Utc::now()).len() as u64,
        }
    }

    /// Run the current filters from the first page.
    pub async fn search(&self) -> JobBoardResult<()> {
        self.go_to_page(0).await
    }

    pub async fn next_page(&self) -> JobBoardResult<()> {
        if !self.has_next_page() {
            return Ok(());
        }
        let page = self.current_page() + 1;
        self.go_to_page(page).await
    }

    pub async fn previous_page(&self) -> JobBoardResult<()> {
        let current = self.current_page();
        if current == 0 {
            return Ok(());
        }
        self.go_to_page(current - 1).await
    }

    /// Show page `page` (zero-based). Server search with a session, local
    /// paging over the catalog without one.
    pub async fn go_to_page(&self, page: u32) -> JobBoardResult<()> {
        let Some(token) = self.session.token() else {
            self.show_sample_page(page);
            return Ok(());
        };

        let (filters, sort_by, generation) = {
            let mut state = self.state();
            state.search_generation += 1;
            state.loading.insert(BoardOp::Search);
            (state.filters.clone(), state.sort_by, state.search_generation)
        };

        let result = self
            .client
            .search_jobs(&filters, sort_by, page, self.page_size, Some(&token))
            .await;

        let mut state = self.state();
        if state.search_generation != generation {
            debug!(page, "Discarding superseded search result");
            return Ok(());
        }
        state.loading.remove(&BoardOp::Search);
        match result {
            Ok(results) => {
                state.adopt_flags(&results.items);
                state.mode = BoardMode::Server;
                state.current_page = results.page;
                state.total_pages = results.total_pages;
                state.total_elements = results.total_elements;
                state.jobs = results.items;
                state.errors.remove(&BoardOp::Search);
                debug!(page, total = state.total_elements, "Search results loaded");
                Ok(())
            }
            Err(e) => {
                let err = JobBoardError::from(e);
                warn!(page, "Job search failed: {}", err);
                state.record_error(BoardOp::Search, &err);
                Err(err)
            }
        }
    }

    fn show_sample_page(&self, page: u32) {
        let mut state = self.state();
        state.search_generation += 1;
        state.loading.remove(&BoardOp::Search);
        if state.mode != BoardMode::Sample {
            state.mode = BoardMode::Sample;
            state.jobs = self.catalog.jobs().to_vec();
        }
        let count = state.derive(Utc::now()).len();
        let last_page = count.saturating_sub(1) / self.page_size as usize;
        state.current_page = page.min(last_page as u32);
        state.total_elements = count as u64;
        state.errors.remove(&BoardOp::Search);
    }

    pub fn saved_state(&self, job_id: JobId) -> ToggleState {
        self.state().state_of(Toggle::Saved, job_id)
    }

    pub fn is_saved(&self, job_id: JobId) -> bool {
        self.saved_state(job_id).value()
    }

    pub fn application_state(&self, job_id: JobId) -> ToggleState {
        self.state().state_of(Toggle::Applied, job_id)
    }

    /// Application record returned by the server for `job_id`, if any.
    pub fn application(&self, job_id: JobId) -> Option<JobApplication> {
        self.state().applications.get(&job_id).cloned()
    }

    pub fn saved_jobs(&self) -> Vec<Job> {
        self.state().saved_jobs.clone()
    }

    /// Fetch the user's saved jobs and confirm their saved flags.
    pub async fn load_saved_jobs(&self) -> JobBoardResult<Vec<Job>> {
        let token = self.session.token().ok_or(JobBoardError::NotAuthenticated)?;
        self.state().loading.insert(BoardOp::LoadSaved);
        let result = self.client.saved_jobs(&token).await;

        let mut state = self.state();
        state.loading.remove(&BoardOp::LoadSaved);
        match result {
            Ok(jobs) => {
                let ids: HashSet<JobId> = jobs.iter().map(|j| j.id).collect();
                for (id, toggle) in state.saved.iter_mut() {
                    if !toggle.is_pending() && !ids.contains(id) {
                        *toggle = ToggleState::Confirmed(false);
                    }
                }
                for id in &ids {
                    if !state.saved.get(id).is_some_and(ToggleState::is_pending) {
                        state.saved.insert(*id, ToggleState::Confirmed(true));
                    }
                }
                state.saved_jobs = jobs.clone();
                state.errors.remove(&BoardOp::LoadSaved);
                Ok(jobs)
            }
            Err(e) => {
                let err = JobBoardError::from(e);
                state.record_error(BoardOp::LoadSaved, &err);
                Err(err)
            }
        }
    }

    /// Save a job. Without a session nothing is sent and a sign-in
    /// redirect is returned.
    pub async fn save_job(&self, job_id: JobId) -> JobBoardResult<ActionOutcome> {
        let Some(token) = self.session.token() else {
            return Ok(ActionOutcome::AuthRequired(AuthRedirect::for_job(job_id)));
        };
        self.toggle(Toggle::Saved, BoardOp::Save, job_id, true, async {
            self.client.save_job(&token, job_id).await
        })
        .await?;
        Ok(ActionOutcome::Completed)
    }

    pub async fn unsave_job(&self, job_id: JobId) -> JobBoardResult<ActionOutcome> {
        let Some(token) = self.session.token() else {
            return Ok(ActionOutcome::AuthRequired(AuthRedirect::for_job(job_id)));
        };
        self.toggle(Toggle::Saved, BoardOp::Unsave, job_id, false, async {
            self.client.unsave_job(&token, job_id).await
        })
        .await?;
        self.state().saved_jobs.retain(|j| j.id != job_id);
        Ok(ActionOutcome::Completed)
    }

    /// Apply to a job. On success the job is marked applied locally so
    /// repeat applications are refused without a refetch.
    pub async fn apply_to_job(
        &self,
        job_id: JobId,
        request: &ApplicationRequest,
    ) -> JobBoardResult<ActionOutcome> {
        let Some(token) = self.session.token() else {
            return Ok(ActionOutcome::AuthRequired(AuthRedirect::for_job(job_id)));
        };
        if self.application_state(job_id) == ToggleState::Confirmed(true) {
            return Err(JobBoardError::AlreadyApplied(job_id));
        }

        let result = self
            .toggle(Toggle::Applied, BoardOp::Apply, job_id, true, async {
                self.client.apply_to_job(&token, job_id, request).await
            })
            .await;

        match result {
            Ok(Some(application)) => {
                self.state().applications.insert(job_id, application);
            }
            Ok(None) => {}
            Err(JobBoardError::Api(ApiError::Conflict(_))) => {
                let mut state = self.state();
                state.applied.insert(job_id, ToggleState::Confirmed(true));
                state.errors.remove(&BoardOp::Apply);
                return Err(JobBoardError::AlreadyApplied(job_id));
            }
            Err(e) => return Err(e),
        }
        info!(job_id, "Application submitted");
        Ok(ActionOutcome::Completed)
    }

    /// Drop per-user flags, e.g. after logout.
    pub fn clear_user_state(&self) {
        let mut state = self.state();
        state.saved.clear();
        state.applied.clear();
        state.saved_jobs.clear();
        state.applications.clear();
        state.errors.clear();
    }

    /// Mark the flag pending, run `call`, then confirm the target or
    /// revert to the previous confirmed value.
    async fn toggle<T, Fut>(
        &self,
        toggle: Toggle,
        op: BoardOp,
        job_id: JobId,
        target: bool,
        call: Fut,
    ) -> JobBoardResult<T>
    where
        Fut: std::future::Future<Output = Result<T, ApiError>>,
    {
        {
            let mut state = self.state();
            let previous = match state.state_of(toggle, job_id) {
                ToggleState::Pending { .. } => return Err(JobBoardError::ActionInFlight(job_id)),
                ToggleState::Confirmed(v) => v,
            };
            state
                .toggles(toggle)
                .insert(job_id, ToggleState::Pending { previous, target });
            state.loading.insert(op);
        }

        let result = call.await;

        let mut state = self.state();
        state.loading.remove(&op);
        match result {
            Ok(value) => {
                state.toggles(toggle).insert(job_id, ToggleState::Confirmed(target));
                for job in state.jobs.iter_mut().filter(|j| j.id == job_id) {
                    match toggle {
                        Toggle::Saved => job.saved = target,
                        Toggle::Applied => job.applied = target,
                    }
                }
                state.errors.remove(&op);
                Ok(value)
            }
            Err(e) => {
                let previous = match state.state_of(toggle, job_id) {
                    ToggleState::Pending { previous, .. } => previous,
                    ToggleState::Confirmed(v) => v,
                };
                state.toggles(toggle).insert(job_id, ToggleState::Confirmed(previous));
                let err = JobBoardError::from(e);
                warn!(job_id, op = ?op, "Job action failed: {}", err);
                state.record_error(op, &err);
                Err(err)
            }
        }
    }
}
