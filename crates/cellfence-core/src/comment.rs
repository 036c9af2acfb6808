//! Cell comments (notes)
//!
//! ## Example
//!
//! ```rust
//! use cellfence_core::{CellComment, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_comment("A1", CellComment::new("Auditor", "Check this total")).unwrap();
//! assert_eq!(sheet.comment("A1").unwrap().unwrap().author, "Auditor");
//! ```

use std::fmt;

/// A note attached to one cell
///
/// Rich-text runs are flattened to plain text when a file is read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellComment {
    /// Author of the comment; empty when the file names none
    pub author: String,
    /// Comment text
    pub text: String,
    /// Whether the note box is always shown rather than on hover
    pub visible: bool,
}

impl CellComment {
    /// Create a hidden comment with the given author and text
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            visible: false,
        }
    }

    /// Set whether the note box is always shown
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Check if this comment has an author
    pub fn has_author(&self) -> bool {
        !self.author.is_empty()
    }
}

impl fmt::Display for CellComment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_author() {
            write!(f, "[{}]: {}", self.author, self.text)
        } else {
            write!(f, "{}", self.text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_comment_is_hidden() {
        let comment = CellComment::new("Auditor", "Text");
        assert_eq!(comment.author, "Auditor");
        assert!(!comment.visible);
        assert!(CellComment::new("A", "B").with_visible(true).visible);
    }

    #[test]
    fn test_display() {
        assert_eq!(CellComment::new("Kim", "Hello").to_string(), "[Kim]: Hello");
        assert_eq!(CellComment::new("", "Hello").to_string(), "Hello");
    }
}
