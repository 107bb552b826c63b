//! Folio Search - search-as-you-type panel for the Folio blog theme
//!
//! This library implements the theme's search panel: a pre-built page index is
//! fetched once, indexed with Tantivy (weighted fields, exact → prefix → fuzzy
//! relaxation), and the top hits are rendered into the panel with a
//! keyboard/mouse selection cursor.
//!
//! The page itself sits behind the `Document` trait; `MemoryDocument` is a
//! headless implementation for tests and the CLI.

pub mod config;
mod debounce;
pub mod document;
mod indexer;
pub mod interface;
pub mod loader;
mod panel;
pub mod query;
pub mod render;
pub mod search;
pub mod selection;
mod snapshot;

pub use config::{FieldWeights, PanelConfig};
pub use debounce::{Debouncer, ScheduledTask};
pub use document::{Document, MemoryDocument, MemoryNode};
pub use indexer::IndexerError;
pub use interface::*;
pub use loader::{source_for, FileIndexSource, HttpIndexSource, IndexSource, LoadState, StaticIndexSource};
pub use panel::SearchPanel;
pub use search::SearchEngine;
pub use snapshot::IndexSnapshot;
