//! Index snapshot: the page records exactly as fetched, in publication order.
//!
//! The tantivy index only stores permalinks; titles, dates and summaries for
//! rendering are looked up here.

use crate::interface::{DocumentRecord, FolioError};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct IndexSnapshot {
    records: Vec<DocumentRecord>,
    positions: HashMap<String, usize>,
}

impl IndexSnapshot {
    pub fn new(records: Vec<DocumentRecord>) -> Self {
        let mut positions = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            // First occurrence wins for display lookups
            positions.entry(record.permalink.clone()).or_insert(i);
        }
        Self { records, positions }
    }

    /// Parse the `index.json` body: a JSON array of page records.
    pub fn from_json(bytes: &[u8]) -> Result<Self, FolioError> {
        let records: Vec<DocumentRecord> = serde_json::from_slice(bytes)?;
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    pub fn get(&self, permalink: &str) -> Option<&DocumentRecord> {
        self.positions.get(permalink).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
