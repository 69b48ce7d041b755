//! Text preparation for `prepare` — one numbered pair per non-empty line.
//!
//! Pure functions, no I/O.

use crate::types::Identifier;

/// Non-empty lines of `text`, trimmed.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Pair each non-empty line with its 1-based zero-padded identifier.
pub fn numbered_lines(text: &str) -> Vec<(Identifier, String)> {
    split_lines(text)
        .into_iter()
        .enumerate()
        .map(|(i, line)| (Identifier::ordinal(i + 1), line))
        .collect()
}

/// Short preview of a line for progress logs (first 50 chars).
pub fn preview(line: &str) -> String {
    const MAX: usize = 50;
    if line.chars().count() <= MAX {
        line.to_string()
    } else {
        let head: String = line.chars().take(MAX).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_lines_and_trims() {
        let text = "  first line  \n\n\t\nsecond\r\n   \nthird";
        assert_eq!(split_lines(text), vec!["first line", "second", "third"]);
    }

    #[test]
    fn numbers_from_001() {
        let numbered = numbered_lines("a\n\nb\nc\n");
        let ids: Vec<&str> = numbered.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["001", "002", "003"]);
        assert_eq!(numbered[1].1, "b");
    }

    #[test]
    fn empty_input_has_no_lines() {
        assert!(numbered_lines("").is_empty());
        assert!(numbered_lines("\n  \n").is_empty());
    }

    #[test]
    fn ordinal_widens_past_999() {
        let text = "x\n".repeat(1000);
        let numbered = numbered_lines(&text);
        assert_eq!(numbered[998].0.as_str(), "999");
        assert_eq!(numbered[999].0.as_str(), "1000");
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("short"), "short");
        let long = "你".repeat(60);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), 53);
    }
}
