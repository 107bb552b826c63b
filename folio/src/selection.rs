//! Selection cursor over the rendered result entries.
//!
//! Keyboard and mouse share one cursor. `None` means nothing is highlighted.
//! The cursor only ever points into the list that is currently rendered:
//! replacing the list resets it.

/// Cursor change the page has to reflect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    /// Entry to mark selected; every other entry is unmarked
    pub selected: Option<usize>,
    /// Whether the selected entry should be scrolled into view
    pub scroll: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    cursor: Option<usize>,
    len: usize,
}

impl Selection {
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of entries in the currently rendered list
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A new list was rendered (or the panel closed, with `len` 0)
    pub fn reset(&mut self, len: usize) {
        self.cursor = None;
        self.len = len;
    }

    pub fn move_down(&mut self) -> Highlight {
        let next = match self.cursor {
            None => 0,
            Some(i) => i + 1,
        };
        // min(cursor + 1, N - 1), which stays at -1 for an empty list
        self.cursor = if self.len == 0 {
            None
        } else {
            Some(next.min(self.len - 1))
        };
        self.highlight()
    }

    pub fn move_up(&mut self) -> Highlight {
        self.cursor = match self.cursor {
            None | Some(0) => None,
            Some(i) => Some(i - 1),
        };
        self.highlight()
    }

    /// Pointer entered entry `index`; out-of-range indices are ignored.
    pub fn hover(&mut self, index: usize) -> Option<Highlight> {
        if index >= self.len {
            return None;
        }
        self.cursor = Some(index);
        Some(self.highlight())
    }

    /// Entry Enter should open, if the cursor is inside the current list
    pub fn chosen(&self) -> Option<usize> {
        self.cursor.filter(|&i| i < self.len)
    }

    fn highlight(&self) -> Highlight {
        Highlight {
            selected: self.cursor,
            scroll: self.cursor.is_some(),
        }
    }
}
