//! Shared fixtures for the panel scenario tests.

#![allow(dead_code)]

use async_trait::async_trait;
use folio::{
    FolioError, IndexSource, Key, KeyInput, MemoryDocument, PageEvent, PanelConfig, SearchPanel,
    StaticIndexSource,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Debounce delay of the stock configuration
pub const DEBOUNCE: Duration = Duration::from_millis(150);

/// Number of "Weekly notes" pages, more than the panel shows
pub const NOTES_PAGES: usize = 11;

/// A small site: a few distinct articles plus a run of near-identical notes.
pub fn sample_index() -> String {
    let mut pages = vec![
        json!({
            "permalink": "/posts/rust-basics/",
            "title": "Rust Basics",
            "tags": ["rust", "beginner"],
            "summary": "Ownership, borrowing and lifetimes",
            "content": "A first look at the borrow checker.",
            "date": "2024-01-10"
        }),
        json!({
            "permalink": "/posts/async-runtime/",
            "title": "Async Runtimes",
            "tags": "rust",
            "summary": "How Tokio schedules tasks",
            "content": "Futures are polled by an executor.",
            "date": "2024-03-02"
        }),
        json!({
            "permalink": "/posts/generics/",
            "title": "Generics <T> & Traits",
            "tags": ["types"],
            "summary": null,
            "content": "Monomorphization explained.",
            "date": "2024-04-18"
        }),
        json!({
            "permalink": "/about/",
            "title": "About",
            "summary": "Who writes this blog",
            "date": ""
        }),
    ];
    for week in 1..=NOTES_PAGES {
        pages.push(json!({
            "permalink": format!("/notes/week-{:02}/", week),
            "title": format!("Weekly notes {}", week),
            "tags": ["notes"],
            "summary": "Links and reading",
            "content": "Short notes from the week.",
            "date": format!("2024-05-{:02}", week)
        }));
    }
    serde_json::Value::Array(pages).to_string()
}

/// Index source that holds its body back until `release` is called.
pub struct GatedSource {
    body: Vec<u8>,
    gate: Arc<Notify>,
}

impl GatedSource {
    pub fn new(body: impl Into<Vec<u8>>) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let source = Self {
            body: body.into(),
            gate: Arc::clone(&gate),
        };
        (source, gate)
    }
}

#[async_trait]
impl IndexSource for GatedSource {
    async fn fetch(&self) -> Result<Vec<u8>, FolioError> {
        self.gate.notified().await;
        Ok(self.body.clone())
    }

    fn describe(&self) -> String {
        "gated fixture".to_string()
    }
}

pub fn panel_with(source: Arc<dyn IndexSource>) -> SearchPanel<MemoryDocument> {
    SearchPanel::init(MemoryDocument::new(), PanelConfig::default(), source)
        .expect("fixture page has every anchor")
}

/// Panel over `sample_index()` with the index fully loaded
pub async fn ready_panel() -> SearchPanel<MemoryDocument> {
    let panel = panel_with(Arc::new(StaticIndexSource::new(sample_index())));
    assert!(panel.index_settled().await.engine().is_some());
    panel
}

/// Type `query` and let the debounce window pass
pub async fn type_and_wait(panel: &SearchPanel<MemoryDocument>, query: &str) {
    panel.with_document(|d| d.type_query(query));
    panel.dispatch(PageEvent::Input);
    tokio::time::sleep(DEBOUNCE + Duration::from_millis(10)).await;
}

pub fn input_key(key: Key) -> PageEvent<folio::MemoryNode> {
    PageEvent::InputKey(KeyInput::plain(key))
}

pub fn titles_in_panel(panel: &SearchPanel<MemoryDocument>) -> Vec<String> {
    let html = panel.with_document(|d| d.panel_html().to_string());
    html.split(r#"<span class="search-result-title">"#)
        .skip(1)
        .filter_map(|rest| rest.split("</span>").next())
        .map(str::to_string)
        .collect()
}
