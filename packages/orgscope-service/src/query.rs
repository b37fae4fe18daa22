use std::{
	sync::{Arc, Mutex, MutexGuard},
	time::Duration,
};

use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle};

use crate::{ChannelWarning, DualFetcher, Error};
use orgscope_domain::{
	AggregatedPage, PageCursor, QueryGeneration, ResultId, SearchFilters, SearchResult,
	SelectionTracker, is_conversational,
};

const LANDING_QUERY: &str = "*";

/// Snapshot of everything the search screen shows. Replaced wholesale on every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchView {
	pub query: String,
	pub filters: SearchFilters,
	/// The query reads like a question and should be summarized automatically.
	pub conversational: bool,
	pub loading: bool,
	pub generation: QueryGeneration,
	pub page: Option<AggregatedPage>,
	pub selection: Vec<ResultId>,
	pub warnings: Vec<ChannelWarning>,
	pub error: Option<String>,
	pub auth_required: bool,
}

/// Owns query text, filters and paging. Coalesces edits into one fetch after a quiet interval
/// and lets only the latest generation touch visible state.
///
/// Must be used inside a tokio runtime.
pub struct QueryController {
	inner: Arc<Inner>,
}

struct Inner {
	fetcher: DualFetcher,
	debounce: Duration,
	page_size: u32,
	state: Mutex<ControllerState>,
	view: watch::Sender<SearchView>,
}

struct ControllerState {
	query: String,
	filters: SearchFilters,
	cursor: PageCursor,
	generation: QueryGeneration,
	timer: Option<JoinHandle<()>>,
	selection: SelectionTracker,
	page: Option<AggregatedPage>,
	warnings: Vec<ChannelWarning>,
	error: Option<String>,
	auth_required: bool,
	loading: bool,
}
impl ControllerState {
	fn cancel_timer(&mut self) {
		if let Some(timer) = self.timer.take() {
			timer.abort();
		}
	}

	fn clear_results(&mut self) {
		self.page = None;
		self.warnings.clear();
		self.error = None;
		self.auth_required = false;
		self.loading = false;
		self.selection.reset();
	}

	fn view(&self) -> SearchView {
		SearchView {
			query: self.query.clone(),
			filters: self.filters.clone(),
			conversational: is_conversational(&self.query),
			loading: self.loading,
			generation: self.generation,
			page: self.page.clone(),
			selection: self.selection.ids().to_vec(),
			warnings: self.warnings.clone(),
			error: self.error.clone(),
			auth_required: self.auth_required,
		}
	}
}

impl QueryController {
	pub fn new(fetcher: DualFetcher, cfg: &orgscope_config::Search) -> Self {
		let (view, _) = watch::channel(SearchView::default());
		let state = ControllerState {
			query: String::new(),
			filters: SearchFilters::default(),
			cursor: PageCursor::first(cfg.page_size),
			generation: QueryGeneration::default(),
			timer: None,
			selection: SelectionTracker::new(),
			page: None,
			warnings: Vec::new(),
			error: None,
			auth_required: false,
			loading: false,
		};

		Self {
			inner: Arc::new(Inner {
				fetcher,
				debounce: Duration::from_millis(cfg.debounce_ms),
				page_size: cfg.page_size,
				state: Mutex::new(state),
				view,
			}),
		}
	}

	pub fn subscribe(&self) -> watch::Receiver<SearchView> {
		self.inner.view.subscribe()
	}

	pub fn view(&self) -> SearchView {
		self.inner.lock().view()
	}

	/// Blank text clears every result immediately and schedules nothing.
	pub fn set_query(&self, text: &str) {
		let mut state = self.inner.lock();

		state.query = text.to_string();
		state.cursor = PageCursor::first(self.inner.page_size);

		if text.trim().is_empty() {
			state.cancel_timer();
			state.generation = state.generation.next();
			state.clear_results();
		} else {
			Inner::schedule(&self.inner, &mut state, Some(self.inner.debounce));
		}

		self.inner.publish(&state);
	}

	pub fn set_filters(&self, filters: SearchFilters) {
		let mut state = self.inner.lock();

		state.filters = filters;
		state.cursor = PageCursor::first(self.inner.page_size);

		if !state.query.trim().is_empty() {
			Inner::schedule(&self.inner, &mut state, Some(self.inner.debounce));
		}

		self.inner.publish(&state);
	}

	/// Fetches page `page` right away. Returns `false` when the page is out of range or already
	/// shown.
	pub fn go_to_page(&self, page: u32) -> bool {
		let mut state = self.inner.lock();
		let Some(total_pages) = state.page.as_ref().map(|current| current.total_pages) else {
			return false;
		};

		if page < 1 || page > total_pages || page == state.cursor.page {
			return false;
		}

		state.cursor = state.cursor.with_page(page);

		Inner::schedule(&self.inner, &mut state, None);
		self.inner.publish(&state);

		true
	}

	pub fn next_page(&self) -> bool {
		let page = self.inner.lock().cursor.page.saturating_add(1);

		self.go_to_page(page)
	}

	pub fn previous_page(&self) -> bool {
		let page = self.inner.lock().cursor.page.saturating_sub(1);

		self.go_to_page(page)
	}

	/// Browses everything on the first page without waiting for the quiet interval.
	pub fn load_landing(&self) {
		let mut state = self.inner.lock();

		state.query = LANDING_QUERY.to_string();
		state.cursor = PageCursor::first(self.inner.page_size);

		Inner::schedule(&self.inner, &mut state, None);
		self.inner.publish(&state);
	}

	/// Forgets query, filters, results and selection, e.g. when the signed-in user changes.
	pub fn clear(&self) {
		let mut state = self.inner.lock();

		state.cancel_timer();
		state.generation = state.generation.next();
		state.query.clear();
		state.filters = SearchFilters::default();
		state.cursor = PageCursor::first(self.inner.page_size);
		state.clear_results();

		self.inner.publish(&state);
	}

	pub fn toggle_selection(&self, id: &ResultId) -> bool {
		let mut state = self.inner.lock();
		let selected = state.selection.toggle(id);

		self.inner.publish(&state);

		selected
	}

	pub fn toggle_all(&self) {
		let mut state = self.inner.lock();

		state.selection.toggle_all();

		self.inner.publish(&state);
	}

	pub fn deselect_all(&self) {
		let mut state = self.inner.lock();

		state.selection.deselect_all();

		self.inner.publish(&state);
	}

	/// Selected results in selection order.
	pub fn selected_results(&self) -> Vec<SearchResult> {
		let state = self.inner.lock();

		match &state.page {
			Some(page) => state.selection.resolve(page).into_iter().cloned().collect(),
			None => Vec::new(),
		}
	}
}
impl Drop for QueryController {
	fn drop(&mut self) {
		self.inner.lock().cancel_timer();
	}
}

impl Inner {
	fn lock(&self) -> MutexGuard<'_, ControllerState> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn publish(&self, state: &ControllerState) {
		self.view.send_replace(state.view());
	}

	/// Mints the next generation and starts its fetch, after `delay` when given. Supersedes any
	/// pending timer and every in-flight fetch.
	fn schedule(this: &Arc<Self>, state: &mut ControllerState, delay: Option<Duration>) {
		state.cancel_timer();
		state.generation = state.generation.next();

		let generation = state.generation;

		match delay {
			Some(delay) => {
				let inner = Arc::clone(this);

				state.timer = Some(tokio::spawn(async move {
					tokio::time::sleep(delay).await;
					inner.start_fetch(generation);
				}));
			},
			None => {
				state.loading = true;

				Self::spawn_fetch(this, state, generation);
			},
		}
	}

	fn start_fetch(self: &Arc<Self>, generation: QueryGeneration) {
		let mut state = self.lock();

		if state.generation != generation {
			return;
		}

		state.timer = None;
		state.loading = true;

		Self::spawn_fetch(self, &state, generation);
		self.publish(&state);
	}

	fn spawn_fetch(this: &Arc<Self>, state: &ControllerState, generation: QueryGeneration) {
		let inner = Arc::clone(this);
		let query = state.query.clone();
		let filters = state.filters.clone();
		let cursor = state.cursor;

		tokio::spawn(async move {
			let outcome = inner.fetcher.fetch(&query, &filters, cursor).await;

			inner.apply(generation, outcome);
		});
	}

	fn apply(&self, generation: QueryGeneration, outcome: crate::Result<crate::FetchOutcome>) {
		let mut state = self.lock();

		if state.generation != generation {
			tracing::debug!(
				stale = generation.0,
				current = state.generation.0,
				"Discarding stale search response."
			);

			return;
		}

		state.loading = false;

		match outcome {
			Ok(outcome) => {
				state.selection.observe(&outcome.page);
				state.page = Some(outcome.page);
				state.warnings = outcome.warnings;
				state.error = None;
				state.auth_required = false;
			},
			Err(err) => {
				tracing::warn!(error = %err, "Search failed. Keeping the previous results.");

				state.auth_required = matches!(err, Error::Authentication { .. });
				state.error = Some(err.to_string());
			},
		}

		self.publish(&state);
	}
}
