//! Folio Interface Definition
//!
//! Shared types for the search panel: index records, ranked hits, search
//! outcomes, page events and the error type. Every other module speaks in
//! these types.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// Indexed text fields of a page, in the order they are declared in the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Tags,
    Summary,
    Content,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Title, Field::Tags, Field::Summary, Field::Content];

    /// Schema name, also the name accepted in `field:term` query clauses
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Tags => "tags",
            Field::Summary => "summary",
            Field::Content => "content",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Stage of the exact → prefix → fuzzy fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relaxation {
    Exact,
    Prefix,
    Fuzzy,
}

impl Relaxation {
    pub const CHAIN: [Relaxation; 3] = [Relaxation::Exact, Relaxation::Prefix, Relaxation::Fuzzy];

    /// Text appended to the typed query for this stage
    pub fn suffix(self) -> &'static str {
        match self {
            Relaxation::Exact => "",
            Relaxation::Prefix => "*",
            Relaxation::Fuzzy => "~1",
        }
    }
}

/// What a keystroke-triggered search produced
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Query shorter than the minimum; nothing was searched
    Idle,
    /// Index not available (still fetching, or the fetch failed)
    Loading,
    /// Every relaxation stage came back empty
    NoResults,
    Hits {
        stage: Relaxation,
        hits: Vec<QueryHit>,
    },
}

/// Page elements the panel binds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// The query text input
    Input,
    /// The results container
    Panel,
    /// Wrapper around the input, used for positioning and outside-click checks
    Wrapper,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
    Character(char),
    Other(String),
}

/// A keydown as seen by the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyInput {
    pub fn plain(key: Key) -> Self {
        Self { key, ctrl: false, meta: false }
    }

    pub fn ctrl(key: Key) -> Self {
        Self { key, ctrl: true, meta: false }
    }

    pub fn meta(key: Key) -> Self {
        Self { key, ctrl: false, meta: true }
    }

    /// Ctrl+K on Linux/Windows, Cmd+K on macOS
    pub fn is_focus_shortcut(&self) -> bool {
        (self.ctrl || self.meta) && matches!(self.key, Key::Character('k'))
    }
}

/// Events the host page forwards to the panel.
/// `N` is the document's node handle type, used for click targets.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent<N> {
    /// The input's value changed
    Input,
    /// The input gained focus
    Focus,
    /// Keydown while the input has focus
    InputKey(KeyInput),
    /// Keydown anywhere in the document
    DocumentKey(KeyInput),
    /// Pointer entered the result entry at this index
    ItemHover(usize),
    /// Click anywhere in the document
    Click { target: N },
}

/// What the host should do with the originating browser event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventResponse {
    pub prevent_default: bool,
}

impl EventResponse {
    pub fn prevent_default() -> Self {
        Self { prevent_default: true }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

/// One indexable page, as published in the site's `index.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub permalink: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "tags_from_json")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date: String,
}

impl DocumentRecord {
    /// Text indexed for `field`. Tags are joined with spaces.
    pub fn field_text(&self, field: Field) -> String {
        match field {
            Field::Title => self.title.clone(),
            Field::Tags => self.tags.join(" "),
            Field::Summary => self.summary.clone(),
            Field::Content => self.content.clone(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Site generators emit tags either as an array or as one comma-joined string.
fn tags_from_json<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Tags>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Tags::One(tag)) if tag.is_empty() => Vec::new(),
        Some(Tags::One(tag)) => vec![tag],
        Some(Tags::Many(tags)) => tags,
    })
}

/// A ranked reference into the index snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryHit {
    pub permalink: String,
    pub score: f32,
}

/// Viewport-relative bounding box of an element, in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Fixed-position offsets applied to the results panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelPosition {
    pub top: f64,
    pub right: f64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR TYPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Error type for Folio operations
#[derive(Debug, Error)]
pub enum FolioError {
    #[error("Fetch error: {0}")]
    Fetch(String),
    #[error("Search index request failed with status {0}")]
    HttpStatus(u16),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid search index: {0}")]
    Parse(String),
    #[error("Index error: {0}")]
    Index(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<crate::indexer::IndexerError> for FolioError {
    fn from(e: crate::indexer::IndexerError) -> Self {
        FolioError::Index(e.to_string())
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(e: serde_json::Error) -> Self {
        FolioError::Parse(e.to_string())
    }
}

impl From<reqwest::Error> for FolioError {
    fn from(e: reqwest::Error) -> Self {
        FolioError::Fetch(e.to_string())
    }
}
