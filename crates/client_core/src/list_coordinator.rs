use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use shared::domain::{Character, Page};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    display::{ListDisplay, ViewHandle},
    repository::{CharactersRepository, RepositoryResult},
    ui::Dispatcher,
};

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InFlight,
    NoNextPage,
    AlreadySetUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Issued,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    /// `None` means unfiltered.
    pub query: Option<String>,
    pub current_page: u32,
    pub total_pages: u32,
    pub is_fetching: bool,
    /// Every character received since the last reset, in arrival order.
    pub characters: Vec<Character>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            query: None,
            current_page: 1,
            total_pages: 1,
            is_fetching: false,
            characters: Vec::new(),
        }
    }
}

impl SearchState {
    pub fn has_next_page(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Blank input means no filter; anything else is trimmed.
pub fn normalize_query(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
}

pub struct ListCoordinator {
    repository: Arc<dyn CharactersRepository>,
    dispatcher: Dispatcher,
    view: Mutex<ViewHandle<dyn ListDisplay>>,
    state: Mutex<SearchState>,
    set_up: AtomicBool,
    debounce: Duration,
    search_generation: AtomicU64,
    pending_search: Mutex<Option<JoinHandle<()>>>,
}

impl ListCoordinator {
    pub fn new(repository: Arc<dyn CharactersRepository>, dispatcher: Dispatcher) -> Arc<Self> {
        Self::with_debounce(repository, dispatcher, DEFAULT_SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(
        repository: Arc<dyn CharactersRepository>,
        dispatcher: Dispatcher,
        debounce: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            repository,
            dispatcher,
            view: Mutex::new(ViewHandle::detached()),
            state: Mutex::new(SearchState::default()),
            set_up: AtomicBool::new(false),
            debounce,
            search_generation: AtomicU64::new(0),
            pending_search: Mutex::new(None),
        })
    }

    pub fn attach_view<V: ListDisplay + 'static>(&self, view: &Arc<V>) {
        let view: Arc<dyn ListDisplay> = view.clone();
        *lock(&self.view) = ViewHandle::attach(&view);
    }

    pub fn snapshot(&self) -> SearchState {
        lock(&self.state).clone()
    }

    /// Prepares the view and loads page 1 unfiltered, dropping any stored
    /// query. Counts as done only once that fetch is issued.
    pub fn setup_view(self: &Arc<Self>) -> FetchOutcome {
        if self.set_up.load(Ordering::SeqCst) {
            return FetchOutcome::Skipped(SkipReason::AlreadySetUp);
        }
        let outcome = self.fetch(1, true, None);
        if outcome == FetchOutcome::Issued {
            self.set_up.store(true, Ordering::SeqCst);
            self.view_handle().with(|view| view.setup_view());
        }
        outcome
    }

    /// Reloads page 1 keeping the current query.
    pub fn load_initial(self: &Arc<Self>) -> FetchOutcome {
        let query = lock(&self.state).query.clone();
        self.fetch(1, true, query)
    }

    pub fn search(self: &Arc<Self>, query: Option<&str>) -> FetchOutcome {
        self.cancel_pending_search();
        let query = normalize_query(query);
        lock(&self.state).query = query.clone();
        self.fetch(1, true, query)
    }

    /// Runs [`search`](Self::search) after the debounce delay unless another
    /// search supersedes it first.
    pub fn search_debounced(self: &Arc<Self>, query: Option<&str>) {
        self.cancel_pending_search();
        let generation = self.search_generation.load(Ordering::SeqCst);
        let query = query.map(str::to_string);
        let coordinator = Arc::downgrade(self);
        let dispatcher = self.dispatcher.clone();
        let delay = self.debounce;

        let handle = self.dispatcher.spawn(async move {
            tokio::time::sleep(delay).await;
            dispatcher.post(move || {
                let Some(coordinator) = coordinator.upgrade() else {
                    return;
                };
                if coordinator.search_generation.load(Ordering::SeqCst) != generation {
                    debug!("debounced search superseded");
                    return;
                }
                coordinator.search(query.as_deref());
            });
        });
        *lock(&self.pending_search) = Some(handle);
    }

    pub fn load_next_page(self: &Arc<Self>) -> FetchOutcome {
        let (next_page, query) = {
            let state = lock(&self.state);
            if state.is_fetching {
                return FetchOutcome::Skipped(SkipReason::InFlight);
            }
            if !state.has_next_page() {
                return FetchOutcome::Skipped(SkipReason::NoNextPage);
            }
            (state.current_page + 1, state.query.clone())
        };
        self.fetch(next_page, false, query)
    }

    fn cancel_pending_search(&self) {
        self.search_generation.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = lock(&self.pending_search).take() {
            previous.abort();
        }
    }

    fn view_handle(&self) -> ViewHandle<dyn ListDisplay> {
        lock(&self.view).clone()
    }

    fn fetch(self: &Arc<Self>, page: u32, reset: bool, query: Option<String>) -> FetchOutcome {
        {
            let mut state = lock(&self.state);
            if state.is_fetching {
                debug!(page, "list fetch already in flight; dropping request");
                return FetchOutcome::Skipped(SkipReason::InFlight);
            }
            state.is_fetching = true;
            state.query = query.clone();
        }

        info!(page, query = ?query, reset, "fetching characters");
        let coordinator = Arc::clone(self);
        self.dispatcher.spawn(async move {
            let result = coordinator
                .repository
                .list_characters(Some(page), query.as_deref())
                .await;
            let dispatcher = coordinator.dispatcher.clone();
            dispatcher.post(move || coordinator.apply_page(page, reset, result));
        });
        FetchOutcome::Issued
    }

    fn apply_page(&self, page: u32, reset: bool, result: RepositoryResult<Page<Character>>) {
        let view = self.view_handle();
        match result {
            Ok(response) => {
                let characters = {
                    let mut state = lock(&self.state);
                    state.total_pages = response.info.pages;
                    if reset {
                        state.characters = response.results;
                    } else {
                        state.characters.extend(response.results);
                    }
                    state.current_page = page;
                    state.characters.clone()
                };
                debug!(page, total = characters.len(), "characters page applied");
                view.with(|view| view.display_characters(&characters));
            }
            Err(err) => {
                warn!(page, error = %err, "characters page fetch failed");
                view.with(|view| view.display_error(&err.to_string()));
            }
        }
        lock(&self.state).is_fetching = false;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "tests/list_coordinator_tests.rs"]
mod tests;
