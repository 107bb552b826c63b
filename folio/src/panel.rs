//! SearchPanel - the search-as-you-type controller
//!
//! Owns everything the panel needs for one page session: the document
//! handle, the background index load, the keystroke debouncer, the rendered
//! entries and the selection cursor.
//!
//! Concurrency Model:
//! - The index load and debounced searches run as tokio tasks
//! - Panel state sits behind one mutex; a render happens entirely under it,
//!   so a half-written panel is never observable
//! - Uses the current tokio runtime when there is one, otherwise a
//!   process-wide fallback runtime

use crate::config::PanelConfig;
use crate::debounce::Debouncer;
use crate::document::{Document, SELECTED_CLASS, VISIBLE_CLASS};
use crate::interface::{Anchor, EventResponse, FolioError, Key, KeyInput, PageEvent, QueryHit, SearchOutcome};
use crate::loader::{spawn_index_load, HttpIndexSource, IndexSource, LoadState};
use crate::render::{panel_position, render_message, render_results, RenderedEntry};
use crate::search::{self, QueryLimits};
use crate::selection::{Highlight, Selection};
use crate::snapshot::IndexSnapshot;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::debug;
use url::Url;

/// Fallback Tokio runtime for hosts that call in from outside any runtime.
/// Shared across all panels and never dropped.
static FALLBACK_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("Failed to create fallback tokio runtime")
});

/// Current runtime if available, otherwise the global fallback
fn runtime_handle() -> tokio::runtime::Handle {
    tokio::runtime::Handle::try_current().unwrap_or_else(|_| FALLBACK_RUNTIME.handle().clone())
}

pub struct SearchPanel<D: Document> {
    core: Arc<Mutex<PanelCore<D>>>,
    debouncer: Mutex<Debouncer>,
    load_state: watch::Receiver<LoadState>,
}

struct PanelCore<D: Document> {
    document: D,
    config: PanelConfig,
    load_state: watch::Receiver<LoadState>,
    entries: Vec<RenderedEntry>,
    selection: Selection,
    /// Set by teardown; late debounced searches must not touch the page
    retired: bool,
}

impl<D: Document> SearchPanel<D> {
    /// Bind to the page and start loading the index.
    ///
    /// Returns `None`, without error, when the page lacks any of the input,
    /// panel or wrapper anchors.
    pub fn init(document: D, config: PanelConfig, source: Arc<dyn IndexSource>) -> Option<Self> {
        let missing: Vec<Anchor> = [Anchor::Input, Anchor::Panel, Anchor::Wrapper]
            .into_iter()
            .filter(|&anchor| !document.has_anchor(anchor))
            .collect();
        if !missing.is_empty() {
            debug!(?missing, "search anchors missing, panel disabled");
            return None;
        }

        let runtime = runtime_handle();
        let (load_state, _load_task) = spawn_index_load(&runtime, source, config.weights);
        let debouncer = Debouncer::new(config.debounce(), runtime);

        let core = PanelCore {
            document,
            config,
            load_state: load_state.clone(),
            entries: Vec::new(),
            selection: Selection::default(),
            retired: false,
        };

        Some(Self {
            core: Arc::new(Mutex::new(core)),
            debouncer: Mutex::new(debouncer),
            load_state,
        })
    }

    /// Like `init`, with the index fetched from the configured `index_url`
    /// resolved against the site the page was served from.
    pub fn init_for_site(document: D, config: PanelConfig, site: &Url) -> Result<Option<Self>, FolioError> {
        let source = HttpIndexSource::for_site(&config, site)?;
        Ok(Self::init(document, config, Arc::new(source)))
    }

    /// Cancel any pending search, hide the panel and hand the page back.
    /// The index load, if still running, finishes on its own and is discarded.
    pub fn teardown(self) -> D {
        self.retire();

        // Debounced tasks only hold weak references; one may be mid-run on
        // another worker, in which case its strong reference is short-lived.
        let mut core = self.core;
        loop {
            match Arc::try_unwrap(core) {
                Ok(mutex) => return mutex.into_inner().document,
                Err(shared) => {
                    core = shared;
                    std::thread::yield_now();
                }
            }
        }
    }

    /// Stop debounced searches for good and hide the panel.
    fn retire(&self) {
        self.debouncer.lock().cancel();
        let mut core = self.core.lock();
        core.retired = true;
        core.close();
    }

    /// Handle one page event. The response says whether the browser's
    /// default action should be suppressed.
    pub fn dispatch(&self, event: PageEvent<D::Node>) -> EventResponse {
        match event {
            PageEvent::Input => {
                self.schedule_search();
                EventResponse::default()
            }
            PageEvent::Focus => {
                self.core.lock().handle_focus();
                EventResponse::default()
            }
            PageEvent::InputKey(key) => self.core.lock().handle_input_key(&key),
            PageEvent::DocumentKey(key) => self.core.lock().handle_document_key(&key),
            PageEvent::ItemHover(index) => {
                self.core.lock().hover(index);
                EventResponse::default()
            }
            PageEvent::Click { target } => {
                self.core.lock().handle_click(&target);
                EventResponse::default()
            }
        }
    }

    /// Run the current query after the debounce delay, superseding any
    /// search still waiting.
    fn schedule_search(&self) {
        let core = Arc::downgrade(&self.core);
        self.debouncer.lock().schedule(move || run_debounced(&core));
    }

    /// Run the current query immediately.
    pub fn search_now(&self) -> SearchOutcome {
        self.core.lock().run_search()
    }

    /// Wait for the background load to finish, successfully or not.
    pub async fn index_settled(&self) -> LoadState {
        let mut rx = self.load_state.clone();
        let settled = rx.wait_for(LoadState::is_settled).await.map(|state| state.clone());
        settled.unwrap_or_else(|_| rx.borrow().clone())
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state.borrow().clone()
    }

    pub fn is_pending_search(&self) -> bool {
        self.debouncer.lock().is_pending()
    }

    /// Highlighted entry index; `None` when nothing is selected
    pub fn cursor(&self) -> Option<usize> {
        self.core.lock().selection.cursor()
    }

    /// Permalinks of the entries currently rendered, in display order
    pub fn rendered(&self) -> Vec<String> {
        self.core
            .lock()
            .entries
            .iter()
            .map(|e| e.permalink.clone())
            .collect()
    }

    /// Inspect or mutate the page while holding the panel lock.
    pub fn with_document<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        f(&mut self.core.lock().document)
    }
}

/// Body of a debounced search. The task may already be past its
/// cancellation check when teardown runs, so `retired` is re-checked under
/// the lock.
fn run_debounced<D: Document>(core: &Weak<Mutex<PanelCore<D>>>) {
    let Some(core) = core.upgrade() else {
        return;
    };
    let mut core = core.lock();
    if !core.retired {
        core.run_search();
    }
}

impl<D: Document> PanelCore<D> {
    fn limits(&self) -> QueryLimits {
        QueryLimits {
            max_results: self.config.max_results,
            min_query_chars: self.config.min_query_chars,
        }
    }

    fn run_search(&mut self) -> SearchOutcome {
        let input = self.document.input_value();
        // Clone out of the watch so the load task is never blocked on a search
        let engine = self.load_state.borrow().engine().cloned();
        let outcome = search::evaluate(engine.as_deref(), &input, self.limits());

        match &outcome {
            SearchOutcome::Idle => self.close(),
            SearchOutcome::Loading => {
                let message = self.config.loading_message.clone();
                self.show_message(&message);
            }
            SearchOutcome::NoResults => {
                let message = self.config.empty_message.clone();
                self.show_message(&message);
            }
            SearchOutcome::Hits { stage, hits } => {
                debug!(query = input.trim(), ?stage, hits = hits.len(), "search results");
                if let Some(engine) = engine.as_deref() {
                    self.show_results(hits, engine.snapshot());
                }
            }
        }
        outcome
    }

    fn show_results(&mut self, hits: &[QueryHit], snapshot: &IndexSnapshot) {
        let rendered = render_results(hits, snapshot);
        self.document.set_panel_html(&rendered.html);
        self.entries = rendered.entries;
        self.selection.reset(self.entries.len());
        self.reveal();
    }

    fn show_message(&mut self, message: &str) {
        self.document.set_panel_html(&render_message(message));
        self.entries.clear();
        self.selection.reset(0);
        self.reveal();
    }

    /// Position the panel under the wrapper and make it visible.
    fn reveal(&mut self) {
        let position = panel_position(
            self.document.bounding_rect(Anchor::Wrapper),
            self.document.viewport_width(),
            self.config.panel_gap_px,
        );
        self.document.set_panel_position(position);
        self.document.add_class(Anchor::Panel, VISIBLE_CLASS);
    }

    fn close(&mut self) {
        self.apply(Highlight { selected: None, scroll: false });
        self.document.remove_class(Anchor::Panel, VISIBLE_CLASS);
        self.entries.clear();
        self.selection.reset(0);
    }

    /// Mark exactly the highlighted entry and bring it into view.
    fn apply(&mut self, highlight: Highlight) {
        for index in 0..self.document.entry_count() {
            self.document
                .set_entry_class(index, SELECTED_CLASS, highlight.selected == Some(index));
        }
        if let (true, Some(index)) = (highlight.scroll, highlight.selected) {
            self.document.scroll_entry_into_view(index);
        }
    }

    fn handle_focus(&mut self) {
        let value = self.document.input_value();
        if value.trim().chars().count() >= self.config.min_query_chars {
            self.run_search();
        }
    }

    fn handle_input_key(&mut self, key: &KeyInput) -> EventResponse {
        match key.key {
            Key::ArrowDown => {
                let highlight = self.selection.move_down();
                self.apply(highlight);
                EventResponse::prevent_default()
            }
            Key::ArrowUp => {
                let highlight = self.selection.move_up();
                self.apply(highlight);
                EventResponse::prevent_default()
            }
            Key::Enter => {
                let Some(entry) = self.selection.chosen().and_then(|i| self.entries.get(i)) else {
                    return EventResponse::default();
                };
                let href = entry.permalink.clone();
                self.document.navigate(&href);
                EventResponse::prevent_default()
            }
            Key::Escape => {
                self.close();
                self.document.blur_input();
                EventResponse::default()
            }
            _ => EventResponse::default(),
        }
    }

    fn handle_document_key(&mut self, key: &KeyInput) -> EventResponse {
        if key.is_focus_shortcut() {
            self.document.focus_input();
            return EventResponse::prevent_default();
        }
        if key.key == Key::Escape && self.document.has_class(Anchor::Panel, VISIBLE_CLASS) {
            self.close();
            self.document.blur_input();
        }
        EventResponse::default()
    }

    fn hover(&mut self, index: usize) {
        if let Some(highlight) = self.selection.hover(index) {
            self.apply(highlight);
        }
    }

    fn handle_click(&mut self, target: &D::Node) {
        let inside = self.document.contains(Anchor::Wrapper, target)
            || self.document.contains(Anchor::Panel, target);
        if !inside {
            self.close();
        }
    }
}
