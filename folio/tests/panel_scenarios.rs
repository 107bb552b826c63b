//! End-to-end scenarios for the search panel, driven through page events on
//! a `MemoryDocument` with paused tokio time.

mod test_data;

use folio::{
    Anchor, Document, Key, KeyInput, LoadState, MemoryNode, PageEvent, PanelPosition, SearchOutcome, StaticIndexSource,
};
use std::sync::Arc;
use std::time::Duration;
use test_data::*;

// ============================================================
// Searching
// ============================================================

#[tokio::test(start_paused = true)]
async fn typing_a_query_shows_matching_pages() {
    let panel = ready_panel().await;
    type_and_wait(&panel, "rust").await;

    assert!(panel.with_document(|d| d.is_panel_visible()));
    let titles = titles_in_panel(&panel);
    assert_eq!(titles.first().map(String::as_str), Some("Rust Basics"));
    assert!(titles.contains(&"Async Runtimes".to_string()));
    assert_eq!(panel.cursor(), None);
    assert!(panel.with_document(|d| d.selected_entries().is_empty()));
}

#[tokio::test(start_paused = true)]
async fn unmatched_query_shows_no_results() {
    let panel = ready_panel().await;
    type_and_wait(&panel, "xyqqz").await;

    assert!(panel.with_document(|d| d.is_panel_visible()));
    let html = panel.with_document(|d| d.panel_html().to_string());
    assert_eq!(html, r#"<div class="search-message">No results found</div>"#);
    assert!(panel.rendered().is_empty());
}

#[tokio::test(start_paused = true)]
async fn partial_word_falls_back_to_prefix() {
    let panel = ready_panel().await;
    panel.with_document(|d| d.type_query("tok"));
    let outcome = panel.search_now();
    assert!(
        matches!(outcome, SearchOutcome::Hits { stage: folio::Relaxation::Prefix, .. }),
        "got {:?}",
        outcome
    );
    assert_eq!(panel.rendered(), vec!["/posts/async-runtime/".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn typo_falls_back_to_fuzzy() {
    let panel = ready_panel().await;
    panel.with_document(|d| d.type_query("tokip"));
    let outcome = panel.search_now();
    assert!(
        matches!(outcome, SearchOutcome::Hits { stage: folio::Relaxation::Fuzzy, .. }),
        "got {:?}",
        outcome
    );
    assert_eq!(panel.rendered(), vec!["/posts/async-runtime/".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn results_are_capped_at_eight() {
    let panel = ready_panel().await;
    type_and_wait(&panel, "notes").await;

    assert!(NOTES_PAGES > 8);
    assert_eq!(panel.rendered().len(), 8);
    assert_eq!(panel.with_document(|d| d.entry_count()), 8);
}

#[tokio::test(start_paused = true)]
async fn markup_in_titles_is_escaped() {
    let panel = ready_panel().await;
    type_and_wait(&panel, "generics").await;

    let html = panel.with_document(|d| d.panel_html().to_string());
    assert!(html.contains("Generics &lt;T&gt; &amp; Traits"), "{}", html);
    assert!(!html.contains("<T>"));
}

#[tokio::test(start_paused = true)]
async fn short_query_closes_the_panel() {
    let panel = ready_panel().await;
    type_and_wait(&panel, "rust").await;
    assert!(panel.with_document(|d| d.is_panel_visible()));

    type_and_wait(&panel, " r ").await;
    assert!(!panel.with_document(|d| d.is_panel_visible()));
    assert_eq!(panel.cursor(), None);
}

#[tokio::test(start_paused = true)]
async fn panel_sits_under_the_search_box() {
    let panel = ready_panel().await;
    type_and_wait(&panel, "rust").await;

    // Fixture wrapper: bottom 48, right 1180, in a 1280 wide viewport
    assert_eq!(
        panel.with_document(|d| d.panel_position()),
        Some(PanelPosition { top: 52.0, right: 100.0 })
    );
}

// ============================================================
// Index loading
// ============================================================

#[tokio::test(start_paused = true)]
async fn query_before_index_ready_shows_loading() {
    let (source, gate) = GatedSource::new(sample_index());
    let panel = panel_with(Arc::new(source));

    type_and_wait(&panel, "rust").await;
    assert!(matches!(panel.load_state(), LoadState::Pending));
    let html = panel.with_document(|d| d.panel_html().to_string());
    assert_eq!(html, r#"<div class="search-message">Search is loading...</div>"#);
    assert!(panel.with_document(|d| d.is_panel_visible()));

    gate.notify_one();
    assert!(panel.index_settled().await.engine().is_some());
    type_and_wait(&panel, "rust").await;
    assert_eq!(titles_in_panel(&panel).first().map(String::as_str), Some("Rust Basics"));
}

#[tokio::test(start_paused = true)]
async fn failed_load_keeps_reporting_loading() {
    let panel = panel_with(Arc::new(StaticIndexSource::new("{\"oops\": true}")));
    assert!(matches!(panel.index_settled().await, LoadState::Failed(_)));

    type_and_wait(&panel, "rust").await;
    let html = panel.with_document(|d| d.panel_html().to_string());
    assert!(html.contains("Search is loading..."));
    assert!(panel.rendered().is_empty());
}

// ============================================================
// Debounce
// ============================================================

#[tokio::test(start_paused = true)]
async fn only_the_last_keystroke_in_a_burst_searches() {
    let panel = ready_panel().await;

    for partial in ["ru", "rus", "rust"] {
        panel.with_document(|d| d.type_query(partial));
        panel.dispatch(PageEvent::Input);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    // t=150: the first keystroke's window has passed but it was superseded
    assert!(panel.is_pending_search());
    assert!(!panel.with_document(|d| d.is_panel_visible()));

    // t=240: still inside the last keystroke's window
    tokio::time::sleep(Duration::from_millis(90)).await;
    assert!(panel.is_pending_search());
    assert!(!panel.with_document(|d| d.is_panel_visible()));

    // t=260: the last keystroke's window has elapsed
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(panel.with_document(|d| d.is_panel_visible()));
    assert!(!panel.is_pending_search());
    assert_eq!(titles_in_panel(&panel).first().map(String::as_str), Some("Rust Basics"));
}

#[tokio::test(start_paused = true)]
async fn focus_with_a_query_searches_immediately() {
    let panel = ready_panel().await;
    panel.with_document(|d| d.type_query("rust"));
    panel.dispatch(PageEvent::Focus);
    assert!(panel.with_document(|d| d.is_panel_visible()));

    panel.dispatch(PageEvent::Click { target: MemoryNode::Elsewhere });
    panel.with_document(|d| d.type_query("r"));
    panel.dispatch(PageEvent::Focus);
    assert!(!panel.with_document(|d| d.is_panel_visible()));
}

// ============================================================
// Selection and keyboard
// ============================================================

#[tokio::test(start_paused = true)]
async fn escape_closes_and_blurs() {
    let panel = ready_panel().await;
    panel.with_document(|d| d.focus_input());
    type_and_wait(&panel, "rust").await;
    panel.dispatch(input_key(Key::ArrowDown));
    panel.dispatch(input_key(Key::ArrowDown));
    assert_eq!(panel.cursor(), Some(1));

    let response = panel.dispatch(input_key(Key::Escape));
    assert!(!response.prevent_default);
    assert!(!panel.with_document(|d| d.is_panel_visible()));
    assert!(!panel.with_document(|d| d.is_input_focused()));
    assert_eq!(panel.cursor(), None);
}

#[tokio::test(start_paused = true)]
async fn document_escape_only_acts_on_a_visible_panel() {
    let panel = ready_panel().await;
    panel.with_document(|d| d.focus_input());

    panel.dispatch(PageEvent::DocumentKey(KeyInput::plain(Key::Escape)));
    assert!(panel.with_document(|d| d.is_input_focused()), "hidden panel leaves focus alone");

    type_and_wait(&panel, "rust").await;
    panel.dispatch(PageEvent::DocumentKey(KeyInput::plain(Key::Escape)));
    assert!(!panel.with_document(|d| d.is_panel_visible()));
    assert!(!panel.with_document(|d| d.is_input_focused()));
}

#[tokio::test(start_paused = true)]
async fn enter_opens_the_selected_entry() {
    let panel = ready_panel().await;
    type_and_wait(&panel, "rust").await;

    panel.dispatch(input_key(Key::ArrowDown));
    let response = panel.dispatch(input_key(Key::Enter));
    assert!(response.prevent_default);
    assert_eq!(
        panel.with_document(|d| d.navigations().to_vec()),
        vec!["/posts/rust-basics/".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn cursor_clamps_at_both_ends() {
    let panel = ready_panel().await;
    type_and_wait(&panel, "rust").await;
    let count = panel.rendered().len();

    for _ in 0..count + 3 {
        panel.dispatch(input_key(Key::ArrowDown));
    }
    assert_eq!(panel.cursor(), Some(count - 1));
    assert_eq!(panel.with_document(|d| d.selected_entries()), vec![count - 1]);

    for _ in 0..count + 3 {
        panel.dispatch(input_key(Key::ArrowUp));
    }
    assert_eq!(panel.cursor(), None);
    assert!(panel.with_document(|d| d.selected_entries().is_empty()));
}

#[tokio::test(start_paused = true)]
async fn new_results_reset_the_cursor() {
    let panel = ready_panel().await;
    type_and_wait(&panel, "rust").await;
    panel.dispatch(input_key(Key::ArrowDown));
    assert_eq!(panel.cursor(), Some(0));

    type_and_wait(&panel, "notes").await;
    assert_eq!(panel.cursor(), None);
    assert!(panel.with_document(|d| d.selected_entries().is_empty()));
}

#[tokio::test(start_paused = true)]
async fn repeating_the_same_query_resets_the_cursor() {
    let panel = ready_panel().await;
    type_and_wait(&panel, "rust").await;
    let first = panel.rendered();
    panel.dispatch(input_key(Key::ArrowDown));
    assert_eq!(panel.with_document(|d| d.selected_entries()), vec![0]);

    type_and_wait(&panel, "rust").await;
    assert_eq!(panel.rendered(), first);
    assert_eq!(panel.cursor(), None);
    assert!(panel.with_document(|d| d.selected_entries().is_empty()));
}

#[tokio::test(start_paused = true)]
async fn hover_and_arrows_share_the_cursor() {
    let panel = ready_panel().await;
    type_and_wait(&panel, "notes").await;

    panel.dispatch(PageEvent::ItemHover(2));
    assert_eq!(panel.cursor(), Some(2));
    assert_eq!(panel.with_document(|d| d.selected_entries()), vec![2]);

    panel.dispatch(input_key(Key::ArrowDown));
    assert_eq!(panel.cursor(), Some(3));
    assert_eq!(panel.with_document(|d| d.selected_entries()), vec![3]);

    panel.dispatch(PageEvent::ItemHover(40));
    assert_eq!(panel.cursor(), Some(3), "hover outside the list is ignored");
}

#[tokio::test(start_paused = true)]
async fn selection_scrolls_into_view() {
    let panel = ready_panel().await;
    type_and_wait(&panel, "notes").await;

    for _ in 0..6 {
        panel.dispatch(input_key(Key::ArrowDown));
    }
    let scroll = panel.with_document(|d| d.scroll());
    assert!(scroll.offset > 0.0);
    assert!(scroll.is_visible(5));

    for _ in 0..5 {
        panel.dispatch(input_key(Key::ArrowUp));
    }
    let scroll = panel.with_document(|d| d.scroll());
    assert!(scroll.is_visible(0));
}

#[tokio::test(start_paused = true)]
async fn ctrl_or_meta_k_focuses_the_input() {
    let panel = ready_panel().await;

    let response = panel.dispatch(PageEvent::DocumentKey(KeyInput::ctrl(Key::Character('k'))));
    assert!(response.prevent_default);
    assert!(panel.with_document(|d| d.is_input_focused()));

    panel.dispatch(input_key(Key::Escape));
    let response = panel.dispatch(PageEvent::DocumentKey(KeyInput::meta(Key::Character('k'))));
    assert!(response.prevent_default);
    assert!(panel.with_document(|d| d.is_input_focused()));

    panel.dispatch(input_key(Key::Escape));
    let response = panel.dispatch(PageEvent::DocumentKey(KeyInput::plain(Key::Character('k'))));
    assert!(!response.prevent_default);
    assert!(!panel.with_document(|d| d.is_input_focused()));
}

// ============================================================
// Clicks
// ============================================================

#[tokio::test(start_paused = true)]
async fn clicks_inside_keep_the_panel_open() {
    let panel = ready_panel().await;
    type_and_wait(&panel, "rust").await;

    for target in [MemoryNode::Input, MemoryNode::Wrapper, MemoryNode::Panel, MemoryNode::Entry(0)] {
        panel.dispatch(PageEvent::Click { target });
        assert!(panel.with_document(|d| d.is_panel_visible()), "{:?} is inside", target);
    }

    panel.dispatch(PageEvent::Click { target: MemoryNode::Elsewhere });
    assert!(!panel.with_document(|d| d.is_panel_visible()));
}

#[tokio::test(start_paused = true)]
async fn teardown_returns_the_page_with_the_panel_hidden() {
    let panel = ready_panel().await;
    type_and_wait(&panel, "rust").await;
    panel.with_document(|d| d.type_query("notes"));
    panel.dispatch(PageEvent::Input);

    let page = panel.teardown();
    assert!(!page.is_panel_visible());
    assert!(page.panel_html().contains("Rust Basics"));
    assert!(page.has_anchor(Anchor::Panel));
}
