//! Page abstraction the search panel drives.
//!
//! `Document` is the capability set the panel needs from a page: find its
//! three anchors, read the query, write markup, toggle classes, measure and
//! place the panel, and navigate. `MemoryDocument` is a headless
//! implementation used by the CLI and tests.

use crate::interface::{Anchor, PanelPosition, Rect};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Class marking a result entry in panel markup
pub const ENTRY_CLASS: &str = "search-result-item";
/// Class the theme uses to show the panel
pub const VISIBLE_CLASS: &str = "visible";
/// Class marking the highlighted entry
pub const SELECTED_CLASS: &str = "selected";

pub trait Document: Send + 'static {
    /// Handle for an arbitrary node, used as a click target
    type Node: Clone + Send + 'static;

    fn has_anchor(&self, anchor: Anchor) -> bool;

    /// Whether `node` is the anchor itself or one of its descendants
    fn contains(&self, anchor: Anchor, node: &Self::Node) -> bool;

    fn input_value(&self) -> String;
    fn focus_input(&mut self);
    fn blur_input(&mut self);

    /// Replace the panel's contents
    fn set_panel_html(&mut self, html: &str);

    fn add_class(&mut self, anchor: Anchor, class: &str);
    fn remove_class(&mut self, anchor: Anchor, class: &str);
    fn has_class(&self, anchor: Anchor, class: &str) -> bool;

    /// Viewport-relative bounding box of an anchor
    fn bounding_rect(&self, anchor: Anchor) -> Rect;
    fn viewport_width(&self) -> f64;
    fn set_panel_position(&mut self, position: PanelPosition);

    /// Number of result entries currently in the panel markup
    fn entry_count(&self) -> usize;
    /// Add or remove `class` on the result entry at `index`
    fn set_entry_class(&mut self, index: usize, class: &str, on: bool);
    /// Scroll the panel the minimum amount needed to show entry `index`
    fn scroll_entry_into_view(&mut self, index: usize);

    /// Full page load of `href`
    fn navigate(&mut self, href: &str);
}

/// Nodes of a `MemoryDocument`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryNode {
    Input,
    Panel,
    Wrapper,
    Entry(usize),
    /// Anywhere else on the page
    Elsewhere,
}

/// Vertical scroll state of the panel, fixed-height entries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollViewport {
    pub entry_height: f64,
    pub visible_height: f64,
    pub offset: f64,
}

impl Default for ScrollViewport {
    fn default() -> Self {
        Self {
            entry_height: 60.0,
            visible_height: 240.0,
            offset: 0.0,
        }
    }
}

impl ScrollViewport {
    /// Nearest-edge reveal: no movement if fully visible, otherwise align the
    /// closer edge.
    pub fn reveal(&mut self, index: usize) {
        let top = index as f64 * self.entry_height;
        let bottom = top + self.entry_height;
        if top < self.offset {
            self.offset = top;
        } else if bottom > self.offset + self.visible_height {
            self.offset = bottom - self.visible_height;
        }
    }

    pub fn is_visible(&self, index: usize) -> bool {
        let top = index as f64 * self.entry_height;
        top >= self.offset && top + self.entry_height <= self.offset + self.visible_height
    }
}

/// In-memory page with the theme's three search anchors.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    anchors: HashSet<Anchor>,
    input_value: String,
    input_focused: bool,
    panel_html: String,
    classes: HashMap<Anchor, BTreeSet<String>>,
    entry_classes: Vec<BTreeSet<String>>,
    rects: HashMap<Anchor, Rect>,
    viewport_width: f64,
    panel_position: Option<PanelPosition>,
    scroll: ScrollViewport,
    navigations: Vec<String>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// A page with all three anchors present
    pub fn new() -> Self {
        let mut rects = HashMap::new();
        rects.insert(
            Anchor::Wrapper,
            Rect { top: 12.0, right: 1180.0, bottom: 48.0, left: 880.0 },
        );
        Self {
            anchors: [Anchor::Input, Anchor::Panel, Anchor::Wrapper].into_iter().collect(),
            input_value: String::new(),
            input_focused: false,
            panel_html: String::new(),
            classes: HashMap::new(),
            entry_classes: Vec::new(),
            rects,
            viewport_width: 1280.0,
            panel_position: None,
            scroll: ScrollViewport::default(),
            navigations: Vec::new(),
        }
    }

    /// A page missing `anchor` (the panel stays inert on it)
    pub fn without(mut self, anchor: Anchor) -> Self {
        self.anchors.remove(&anchor);
        self
    }

    /// Set the input's value as if the user typed it
    pub fn type_query(&mut self, value: &str) {
        self.input_value = value.to_string();
    }

    pub fn set_rect(&mut self, anchor: Anchor, rect: Rect) {
        self.rects.insert(anchor, rect);
    }

    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = width;
    }

    pub fn is_input_focused(&self) -> bool {
        self.input_focused
    }

    pub fn panel_html(&self) -> &str {
        &self.panel_html
    }

    pub fn is_panel_visible(&self) -> bool {
        self.has_class(Anchor::Panel, VISIBLE_CLASS)
    }

    pub fn panel_position(&self) -> Option<PanelPosition> {
        self.panel_position
    }

    /// Indices of entries carrying the `selected` class
    pub fn selected_entries(&self) -> Vec<usize> {
        self.entry_classes
            .iter()
            .enumerate()
            .filter(|(_, classes)| classes.contains(SELECTED_CLASS))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn scroll(&self) -> ScrollViewport {
        self.scroll
    }

    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }
}

impl Document for MemoryDocument {
    type Node = MemoryNode;

    fn has_anchor(&self, anchor: Anchor) -> bool {
        self.anchors.contains(&anchor)
    }

    fn contains(&self, anchor: Anchor, node: &MemoryNode) -> bool {
        if !self.has_anchor(anchor) {
            return false;
        }
        match (anchor, node) {
            (Anchor::Input, MemoryNode::Input) => true,
            (Anchor::Wrapper, MemoryNode::Wrapper | MemoryNode::Input) => true,
            (Anchor::Panel, MemoryNode::Panel) => true,
            (Anchor::Panel, MemoryNode::Entry(i)) => *i < self.entry_classes.len(),
            _ => false,
        }
    }

    fn input_value(&self) -> String {
        self.input_value.clone()
    }

    fn focus_input(&mut self) {
        self.input_focused = true;
    }

    fn blur_input(&mut self) {
        self.input_focused = false;
    }

    fn set_panel_html(&mut self, html: &str) {
        self.panel_html = html.to_string();
        let entries = html.matches(&format!(r#"class="{}""#, ENTRY_CLASS)).count();
        self.entry_classes = vec![BTreeSet::new(); entries];
        self.scroll.offset = 0.0;
    }

    fn add_class(&mut self, anchor: Anchor, class: &str) {
        self.classes.entry(anchor).or_default().insert(class.to_string());
    }

    fn remove_class(&mut self, anchor: Anchor, class: &str) {
        if let Some(classes) = self.classes.get_mut(&anchor) {
            classes.remove(class);
        }
    }

    fn has_class(&self, anchor: Anchor, class: &str) -> bool {
        self.classes.get(&anchor).is_some_and(|c| c.contains(class))
    }

    fn bounding_rect(&self, anchor: Anchor) -> Rect {
        self.rects.get(&anchor).copied().unwrap_or_default()
    }

    fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    fn set_panel_position(&mut self, position: PanelPosition) {
        self.panel_position = Some(position);
    }

    fn entry_count(&self) -> usize {
        self.entry_classes.len()
    }

    fn set_entry_class(&mut self, index: usize, class: &str, on: bool) {
        if let Some(classes) = self.entry_classes.get_mut(index) {
            if on {
                classes.insert(class.to_string());
            } else {
                classes.remove(class);
            }
        }
    }

    fn scroll_entry_into_view(&mut self, index: usize) {
        if index < self.entry_classes.len() {
            self.scroll.reveal(index);
        }
    }

    fn navigate(&mut self, href: &str) {
        self.navigations.push(href.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveal_scrolls_to_nearest_edge() {
        let mut view = ScrollViewport { entry_height: 50.0, visible_height: 200.0, offset: 0.0 };
        view.reveal(2);
        assert_eq!(view.offset, 0.0, "already visible, no scroll");
        view.reveal(5);
        assert_eq!(view.offset, 100.0, "bottom edge aligned");
        assert!(view.is_visible(5));
        view.reveal(1);
        assert_eq!(view.offset, 50.0, "top edge aligned");
    }

    #[test]
    fn test_markup_defines_entries() {
        let mut doc = MemoryDocument::new();
        doc.set_panel_html(
            r#"<ul><li class="search-result-item" data-index="0"></li><li class="search-result-item" data-index="1"></li></ul>"#,
        );
        assert_eq!(doc.entry_count(), 2);
        doc.set_entry_class(1, SELECTED_CLASS, true);
        assert_eq!(doc.selected_entries(), vec![1]);

        doc.set_panel_html(r#"<div class="search-message">No results found</div>"#);
        assert_eq!(doc.entry_count(), 0);
        assert!(doc.selected_entries().is_empty());
    }

    #[test]
    fn test_containment() {
        let doc = MemoryDocument::new();
        assert!(doc.contains(Anchor::Wrapper, &MemoryNode::Input));
        assert!(doc.contains(Anchor::Panel, &MemoryNode::Panel));
        assert!(!doc.contains(Anchor::Panel, &MemoryNode::Entry(0)));
        assert!(!doc.contains(Anchor::Wrapper, &MemoryNode::Elsewhere));

        let doc = MemoryDocument::new().without(Anchor::Wrapper);
        assert!(!doc.has_anchor(Anchor::Wrapper));
        assert!(!doc.contains(Anchor::Wrapper, &MemoryNode::Input));
    }

    #[test]
    fn test_classes() {
        let mut doc = MemoryDocument::new();
        doc.add_class(Anchor::Panel, VISIBLE_CLASS);
        assert!(doc.is_panel_visible());
        doc.remove_class(Anchor::Panel, VISIBLE_CLASS);
        assert!(!doc.is_panel_visible());
    }
}
