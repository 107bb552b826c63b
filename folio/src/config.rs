//! Panel configuration
//!
//! Every field has a default matching the theme's stock behavior, so an empty
//! JSON object (or no config file at all) gives the standard panel.

use crate::interface::{Field, FolioError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Relative importance of each indexed field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub title: f32,
    pub tags: f32,
    pub summary: f32,
    pub content: f32,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            title: 10.0,
            tags: 5.0,
            summary: 2.0,
            content: 1.0,
        }
    }
}

impl FieldWeights {
    pub fn weight(&self, field: Field) -> f32 {
        match field {
            Field::Title => self.title,
            Field::Tags => self.tags,
            Field::Summary => self.summary,
            Field::Content => self.content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Where the page index is published, absolute or site-relative
    pub index_url: String,
    pub debounce_ms: u64,
    pub max_results: usize,
    /// Queries shorter than this (after trimming) close the panel
    pub min_query_chars: usize,
    /// Vertical gap between the wrapper's bottom edge and the panel
    pub panel_gap_px: f64,
    pub weights: FieldWeights,
    pub loading_message: String,
    pub empty_message: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            index_url: "/index.json".to_string(),
            debounce_ms: 150,
            max_results: 8,
            min_query_chars: 2,
            panel_gap_px: 4.0,
            weights: FieldWeights::default(),
            loading_message: "Search is loading...".to_string(),
            empty_message: "No results found".to_string(),
        }
    }
}

impl PanelConfig {
    pub fn from_json_str(json: &str) -> Result<Self, FolioError> {
        let config: PanelConfig =
            serde_json::from_str(json).map_err(|e| FolioError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, FolioError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Resolve `index_url` against the site origin the page was served from.
    pub fn index_url_for(&self, site: &Url) -> Result<Url, FolioError> {
        site.join(&self.index_url)
            .map_err(|e| FolioError::Config(format!("index_url `{}`: {}", self.index_url, e)))
    }

    fn validate(&self) -> Result<(), FolioError> {
        if self.max_results == 0 {
            return Err(FolioError::Config("max_results must be at least 1".into()));
        }
        if self.index_url.trim().is_empty() {
            return Err(FolioError::Config("index_url must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = PanelConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PanelConfig::default());
        assert_eq!(config.debounce(), Duration::from_millis(150));
        assert_eq!(config.weights.weight(Field::Title), 10.0);
        assert_eq!(config.weights.weight(Field::Content), 1.0);
    }

    #[test]
    fn test_partial_override() {
        let config =
            PanelConfig::from_json_str(r#"{"debounce_ms": 300, "weights": {"tags": 7}}"#).unwrap();
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.weights.tags, 7.0);
        assert_eq!(config.weights.title, 10.0);
        assert_eq!(config.max_results, 8);
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(matches!(
            PanelConfig::from_json_str(r#"{"max_results": 0}"#),
            Err(FolioError::Config(_))
        ));
        assert!(matches!(
            PanelConfig::from_json_str(r#"{"debounce_ms": "fast"}"#),
            Err(FolioError::Config(_))
        ));
    }

    #[test]
    fn test_index_url_resolution() {
        let site = Url::parse("https://blog.example.com/posts/hello/").unwrap();
        let config = PanelConfig::default();
        assert_eq!(
            config.index_url_for(&site).unwrap().as_str(),
            "https://blog.example.com/index.json"
        );
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.json");
        std::fs::write(&path, r#"{"index_url": "/search/index.json"}"#).unwrap();
        let config = PanelConfig::from_path(&path).unwrap();
        assert_eq!(config.index_url, "/search/index.json");
    }
}
