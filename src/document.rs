//! # Template Document Buffer
//!
//! The `template.yaml` of a project, held in memory as an ordered list of
//! lines. Every mutation operation reads the document fresh from disk,
//! splices line ranges in memory, and writes the result back in a single
//! `save` call — a failed operation never leaves a half-written template.
//!
//! Line indices are only valid until the next splice; callers re-derive
//! positions from the current `lines()` after every structural change.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::locator::Span;

#[derive(Debug)]
pub struct Document {
    path: PathBuf,
    lines: Vec<String>,
}

impl Document {
    /// Reads the document from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read template '{}'", path.display()))?;
        Ok(Self::from_content(path, &content))
    }

    /// Builds a document from raw text without touching the filesystem.
    pub fn from_content(path: &Path, content: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            lines: content.lines().map(str::to_string).collect(),
        }
    }

    /// Builds a document directly from prepared lines (used by the scaffolder).
    pub fn from_lines(path: &Path, lines: Vec<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            lines,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Replaces the line range `[start, end)` with `replacement`.
    /// All other indices derived before this call are invalid afterwards.
    pub fn splice(&mut self, start: usize, end: usize, replacement: Vec<String>) {
        assert!(
            start <= end && end <= self.lines.len(),
            "splice range {start}..{end} out of bounds for {} lines",
            self.lines.len()
        );
        self.lines.splice(start..end, replacement);
    }

    /// Inserts `new_lines` so the first one lands at index `at`.
    pub fn insert(&mut self, at: usize, new_lines: Vec<String>) {
        self.splice(at, at, new_lines);
    }

    /// Removes the line range `[span.start, span.end)`.
    pub fn remove(&mut self, span: Span) {
        self.splice(span.start, span.end, Vec::new());
    }

    /// Removes a single line.
    pub fn remove_line(&mut self, index: usize) {
        self.splice(index, index + 1, Vec::new());
    }

    /// Overwrites a single line in place.
    pub fn replace_line(&mut self, index: usize, line: String) {
        self.splice(index, index + 1, vec![line]);
    }

    /// Reconstructs the full text. Non-empty documents always end with a
    /// single trailing newline, which is also what the scaffolder emits.
    pub fn text(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut content = self.lines.join("\n");
        content.push('\n');
        content
    }

    /// Writes the document back to its path in one call.
    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, self.text())
            .with_context(|| format!("failed to write template '{}'", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::Builder;

    fn doc(content: &str) -> Document {
        Document::from_content(Path::new("template.yaml"), content)
    }

    #[test]
    fn test_round_trips_text() {
        let d = doc("a\nb\nc\n");
        assert_eq!(d.lines(), &["a", "b", "c"]);
        assert_eq!(d.text(), "a\nb\nc\n");
    }

    #[test]
    fn test_splice_replaces_range() {
        let mut d = doc("a\nb\nc\nd\n");
        d.splice(1, 3, vec!["x".to_string()]);
        assert_eq!(d.lines(), &["a", "x", "d"]);
    }

    #[test]
    fn test_insert_and_remove() {
        let mut d = doc("a\nc\n");
        d.insert(1, vec!["b".to_string()]);
        assert_eq!(d.lines(), &["a", "b", "c"]);
        d.remove(Span { start: 0, end: 2 });
        assert_eq!(d.lines(), &["c"]);
    }

    #[test]
    fn test_save_writes_trailing_newline() {
        let tmp_dir = Builder::new().prefix("test-doc-").tempdir().unwrap();
        let path = tmp_dir.path().join("template.yaml");
        let d = Document::from_lines(&path, vec!["Resources:".to_string()]);
        d.save().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Resources:\n");
    }

    #[test]
    fn test_empty_document_text() {
        let d = doc("");
        assert!(d.is_empty());
        assert_eq!(d.text(), "");
    }
}
