//! # Template Diff Display
//!
//! Colorized unified diff between the template before and after a
//! mutation, shown when the user passes `--diff`.

use console::style;
use similar::{ChangeTag, TextDiff};

const CONTEXT_LINES: usize = 2;

pub fn render(old: &str, new: &str) -> String {
    if old == new {
        return "No changes detected.".to_string();
    }

    let diff = TextDiff::from_lines(old, new);
    let mut output = Vec::new();

    for (hunk_idx, group) in diff.grouped_ops(CONTEXT_LINES).iter().enumerate() {
        if hunk_idx > 0 {
            output.push("...".to_string());
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let text = change.value().trim_end_matches('\n');
                match change.tag() {
                    ChangeTag::Delete => {
                        output.push(style(format!("- {text}")).red().to_string());
                    }
                    ChangeTag::Insert => {
                        output.push(style(format!("+ {text}")).green().to_string());
                    }
                    ChangeTag::Equal => {
                        output.push(format!("  {text}"));
                    }
                }
            }
        }
    }
    output.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_changes() {
        assert_eq!(render("a\nb\n", "a\nb\n"), "No changes detected.");
    }

    #[test]
    fn test_marks_inserts_and_deletes() {
        let rendered = render("a\nb\nc\n", "a\nx\nc\n");
        let plain = console::strip_ansi_codes(&rendered).to_string();
        assert!(plain.contains("- b"));
        assert!(plain.contains("+ x"));
        assert!(plain.contains("  a"));
    }
}
