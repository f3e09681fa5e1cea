//! The advanced filter engine.
//!
//! `AdvancedFilter` wraps a [`FilterState`] with one of two execution modes:
//!
//! - **Local**: the caller's items are filtered in memory whenever the panel
//!   is open and at least one condition has a value.
//! - **Remote**: every relevant change is sent to a [`SearchBackend`] and the
//!   returned page replaces the current data and pagination.
//!
//! Remote fetches are split in two: request methods such as
//! [`AdvancedFilter::edit`] or [`AdvancedFilter::page_request`] hand out a
//! [`FetchTicket`], and [`AdvancedFilter::complete_fetch`] applies the response.
//! Tickets carry a sequence number and only the latest issued one is applied.

use crate::config::FilterSettings;
use crate::core::error::FilterError;
use crate::core::evaluator::evaluate_query;
use crate::core::models::{ApiFilterRequest, ApiFilterResponse, FilterGroup, PaginationConfig, SortSpec};
use crate::core::record::{Record, record_value};
use crate::core::state::FilterState;
use crate::core::types::{ConditionKey, GroupId, Logic};
use crate::services::search_service::{SearchBackend, SearchError};
use std::fmt;
use std::sync::Arc;
use strum::Display;
use tracing::{debug, error, warn};

/// Predicate applied to each item in local mode
pub type ApplyFilter<T> = Arc<dyn Fn(&T, &[FilterGroup]) -> bool + Send + Sync>;

/// In-memory items plus the predicate used to filter them
pub struct LocalSource<T> {
    items: Vec<T>,
    apply: ApplyFilter<T>,
}

impl<T> LocalSource<T> {
    pub fn new<F>(items: Vec<T>, apply: F) -> Self
    where
        F: Fn(&T, &[FilterGroup]) -> bool + Send + Sync + 'static,
    {
        Self {
            items,
            apply: Arc::new(apply),
        }
    }

    /// Filter with [`evaluate_query`], reading fields through `field_value`
    pub fn with_getter<G>(items: Vec<T>, field_value: G) -> Self
    where
        T: 'static,
        G: Fn(&T, &str) -> String + Send + Sync + 'static,
    {
        Self::new(items, move |item: &T, groups: &[FilterGroup]| {
            evaluate_query(groups, item, &field_value)
        })
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    fn matches(&self, item: &T, groups: &[FilterGroup]) -> bool {
        (self.apply)(item, groups)
    }
}

impl<T: Record + 'static> LocalSource<T> {
    /// Filter records through their own [`Record`] implementation
    pub fn from_records(items: Vec<T>) -> Self {
        Self::with_getter(items, record_value::<T>)
    }
}

/// Where queries run. Chosen once, when the engine is built.
pub enum ExecutionMode<T> {
    Local(LocalSource<T>),
    Remote(Arc<dyn SearchBackend<T>>),
}

impl<T> ExecutionMode<T> {
    pub fn remote<B>(backend: B) -> Self
    where
        B: SearchBackend<T> + 'static,
    {
        Self::Remote(Arc::new(backend))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ExecutionMode::Remote(_))
    }
}

impl<T> fmt::Debug for ExecutionMode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Local(source) => write!(f, "Local({} items)", source.items.len()),
            ExecutionMode::Remote(_) => f.write_str("Remote"),
        }
    }
}

/// A change to the condition tree or the filter panel
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum FilterEdit {
    AddGroup,
    RemoveGroup(GroupId),
    AddCondition(GroupId),
    RemoveCondition {
        group: GroupId,
        index: usize,
    },
    UpdateCondition {
        group: GroupId,
        index: usize,
        key: ConditionKey,
        value: String,
    },
    UpdateConditionLogic {
        group: GroupId,
        index: usize,
        logic: Logic,
    },
    UpdateGroupLogic {
        group: GroupId,
        logic: Logic,
    },
    ClearAll,
    ReplaceGroups(Vec<FilterGroup>),
    SetPanelOpen(bool),
}

/// An issued remote request waiting for its response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    request: ApiFilterRequest,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn request(&self) -> &ApiFilterRequest {
        &self.request
    }
}

/// What happened to a completed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FetchOutcome {
    /// The response replaced the current page
    Applied,
    /// The backend failed; the engine now shows an empty first page
    Failed,
    /// A newer request was issued meanwhile; the response was dropped
    Stale,
}

pub struct AdvancedFilter<T> {
    state: FilterState,
    mode: ExecutionMode<T>,
    panel_open: bool,
    default_page_size: usize,
    pagination: PaginationConfig,
    sort: Option<SortSpec>,
    remote_data: Vec<T>,
    last_request: Option<ApiFilterRequest>,
    last_error: Option<SearchError>,
    issued: u64,
    pending: Option<u64>,
}

impl<T> AdvancedFilter<T> {
    pub fn new(state: FilterState, mode: ExecutionMode<T>, settings: &FilterSettings) -> Self {
        let default_page_size = settings.page_size();
        Self {
            state,
            mode,
            panel_open: settings.panel_open,
            default_page_size,
            pagination: PaginationConfig::new(default_page_size),
            sort: settings.sort(),
            remote_data: Vec::new(),
            last_request: None,
            last_error: None,
            issued: 0,
            pending: None,
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn groups(&self) -> &[FilterGroup] {
        self.state.groups()
    }

    pub fn applied_condition_count(&self) -> usize {
        self.state.applied_condition_count()
    }

    pub fn is_remote(&self) -> bool {
        self.mode.is_remote()
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    /// True while the latest issued request has not completed
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pagination(&self) -> &PaginationConfig {
        &self.pagination
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    /// Error from the most recent failed fetch, cleared by the next success
    pub fn last_error(&self) -> Option<&SearchError> {
        self.last_error.as_ref()
    }

    pub fn last_request(&self) -> Option<&ApiFilterRequest> {
        self.last_request.as_ref()
    }

    /// Whether conditions are currently narrowing the data
    pub fn is_filtering(&self) -> bool {
        self.panel_open && self.applied_condition_count() > 0
    }

    /// Items to display.
    ///
    /// Local mode filters the source only while [`is_filtering`](Self::is_filtering);
    /// remote mode returns the last accepted page.
    pub fn filtered_data(&self) -> Vec<&T> {
        match &self.mode {
            ExecutionMode::Local(source) => {
                if self.is_filtering() {
                    let groups = self.state.groups();
                    source
                        .items
                        .iter()
                        .filter(|item| source.matches(item, groups))
                        .collect()
                } else {
                    source.items.iter().collect()
                }
            }
            ExecutionMode::Remote(_) => self.remote_data.iter().collect(),
        }
    }

    /// Replace the local source items. Returns false in remote mode.
    pub fn set_items(&mut self, items: Vec<T>) -> bool {
        match &mut self.mode {
            ExecutionMode::Local(source) => {
                source.items = items;
                true
            }
            ExecutionMode::Remote(_) => false,
        }
    }

    /// Apply an edit and, in remote mode, issue a request when one is due.
    ///
    /// A request is issued when the edit changed something while the panel is
    /// open and at least one condition has a value.
    pub fn edit(&mut self, edit: FilterEdit) -> Result<Option<FetchTicket>, FilterError> {
        debug!("Applying filter edit {}", edit);
        let changed = self.apply_edit(edit)?;
        if !changed || !self.is_remote() || !self.is_filtering() {
            return Ok(None);
        }
        let request = self.current_request();
        Ok(self.begin_fetch(request))
    }

    /// Initial unfiltered request: empty tree, first page, default page size
    pub fn mount_request(&mut self) -> Option<FetchTicket> {
        self.pagination.page = 1;
        self.pagination.page_size = self.default_page_size;
        let request = ApiFilterRequest::new(Vec::new(), 1, self.default_page_size)
            .with_sort(self.sort.clone());
        self.begin_fetch(request)
    }

    /// Request another page with the current conditions
    pub fn page_request(&mut self, page: usize) -> Result<Option<FetchTicket>, FilterError> {
        if page == 0 {
            return Err(FilterError::InvalidPage);
        }
        if !self.is_remote() {
            return Ok(None);
        }
        self.pagination.page = page;
        let request = self.current_request();
        Ok(self.begin_fetch(request))
    }

    /// Request a different page size, starting again from page 1
    pub fn page_size_request(&mut self, page_size: usize) -> Result<Option<FetchTicket>, FilterError> {
        if page_size == 0 {
            return Err(FilterError::InvalidPageSize);
        }
        if !self.is_remote() {
            return Ok(None);
        }
        self.pagination.page = 1;
        self.pagination.page_size = page_size;
        let request = self.current_request();
        Ok(self.begin_fetch(request))
    }

    /// Change the sort order and request the current page again
    pub fn sort_request(&mut self, sort: Option<SortSpec>) -> Option<FetchTicket> {
        self.sort = sort;
        if !self.is_remote() {
            return None;
        }
        let request = self.current_request();
        self.begin_fetch(request)
    }

    /// Reissue the last request unchanged
    pub fn refresh_request(&mut self) -> Option<FetchTicket> {
        let request = match &self.last_request {
            Some(request) => request.clone(),
            None => self.current_request(),
        };
        self.begin_fetch(request)
    }

    /// Apply the response to an issued request.
    ///
    /// Responses to anything but the latest issued request are dropped.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<ApiFilterResponse<T>, SearchError>,
    ) -> FetchOutcome {
        if self.pending != Some(ticket.seq) {
            warn!(
                "Dropping stale search response #{} (latest issued #{})",
                ticket.seq, self.issued
            );
            return FetchOutcome::Stale;
        }
        self.pending = None;

        match result {
            Ok(response) => {
                debug!(
                    "Search #{} returned {} of {} rows (page {}/{})",
                    ticket.seq,
                    response.data.len(),
                    response.total,
                    response.page,
                    response.total_pages
                );
                self.pagination = response.pagination();
                self.remote_data = response.data;
                self.last_error = None;
                FetchOutcome::Applied
            }
            Err(e) => {
                error!("Search #{} failed: {}", ticket.seq, e);
                self.remote_data.clear();
                self.pagination = PaginationConfig::new(self.default_page_size);
                self.last_error = Some(e);
                FetchOutcome::Failed
            }
        }
    }

    fn current_request(&self) -> ApiFilterRequest {
        ApiFilterRequest::new(
            self.state.groups().to_vec(),
            self.pagination.page,
            self.pagination.page_size,
        )
        .with_sort(self.sort.clone())
    }

    fn begin_fetch(&mut self, request: ApiFilterRequest) -> Option<FetchTicket> {
        if !self.is_remote() {
            return None;
        }
        self.issued += 1;
        self.pending = Some(self.issued);
        self.last_request = Some(request.clone());
        debug!(
            "Issuing search #{} (page {}, size {}, {} active conditions)",
            self.issued,
            request.page,
            request.page_size,
            request.applied_condition_count()
        );
        Some(FetchTicket {
            seq: self.issued,
            request,
        })
    }

    fn apply_edit(&mut self, edit: FilterEdit) -> Result<bool, FilterError> {
        let state = &mut self.state;
        let changed = match edit {
            FilterEdit::AddGroup => {
                state.add_group();
                true
            }
            FilterEdit::RemoveGroup(id) => state.remove_group(&id),
            FilterEdit::AddCondition(id) => state.add_condition(&id),
            FilterEdit::RemoveCondition { group, index } => state.remove_condition(&group, index),
            FilterEdit::UpdateCondition {
                group,
                index,
                key,
                value,
            } => state.update_condition(&group, index, key, &value)?,
            FilterEdit::UpdateConditionLogic {
                group,
                index,
                logic,
            } => state.update_condition_logic(&group, index, logic),
            FilterEdit::UpdateGroupLogic { group, logic } => state.update_group_logic(&group, logic),
            FilterEdit::ClearAll => {
                state.clear_all();
                true
            }
            FilterEdit::ReplaceGroups(groups) => {
                state.replace_groups(groups)?;
                true
            }
            FilterEdit::SetPanelOpen(open) => {
                let changed = self.panel_open != open;
                self.panel_open = open;
                changed
            }
        };
        Ok(changed)
    }
}

impl<T> AdvancedFilter<T> {
    /// Run an issued ticket against the backend and apply the response
    pub async fn run(&mut self, ticket: Option<FetchTicket>) -> Option<FetchOutcome> {
        let ticket = ticket?;
        let backend = match &self.mode {
            ExecutionMode::Remote(backend) => Arc::clone(backend),
            ExecutionMode::Local(_) => return None,
        };
        let result = backend.search(ticket.request()).await;
        Some(self.complete_fetch(ticket, result))
    }

    /// Load the initial unfiltered page (remote mode)
    pub async fn mount(&mut self) -> Option<FetchOutcome> {
        let ticket = self.mount_request();
        self.run(ticket).await
    }

    /// Apply an edit and wait for any fetch it triggers
    pub async fn apply(&mut self, edit: FilterEdit) -> Result<Option<FetchOutcome>, FilterError> {
        let ticket = self.edit(edit)?;
        Ok(self.run(ticket).await)
    }

    pub async fn change_page(&mut self, page: usize) -> Result<Option<FetchOutcome>, FilterError> {
        let ticket = self.page_request(page)?;
        Ok(self.run(ticket).await)
    }

    pub async fn change_page_size(
        &mut self,
        page_size: usize,
    ) -> Result<Option<FetchOutcome>, FilterError> {
        let ticket = self.page_size_request(page_size)?;
        Ok(self.run(ticket).await)
    }

    pub async fn change_sort(&mut self, sort: Option<SortSpec>) -> Option<FetchOutcome> {
        let ticket = self.sort_request(sort);
        self.run(ticket).await
    }

    pub async fn refresh_data(&mut self) -> Option<FetchOutcome> {
        let ticket = self.refresh_request();
        self.run(ticket).await
    }
}

impl<T> fmt::Debug for AdvancedFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvancedFilter")
            .field("mode", &self.mode)
            .field("panel_open", &self.panel_open)
            .field("applied", &self.applied_condition_count())
            .field("pagination", &self.pagination)
            .field("loading", &self.is_loading())
            .finish()
    }
}
