//! Strip LRC markup from raw lyrics text.
//!
//! [00:12.34]Hello   ->  Hello
//! [ar:Some Artist]  ->  (removed)

use once_cell::sync::Lazy;
use regex::Regex;

static TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\d{1,2}:\d{2}[.:]\d{2}\]").expect("valid timestamp regex"));
static METADATA_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[[a-z]+:.*?\]").expect("valid metadata regex"));
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid newline regex"));

/// Repeats the pass until nothing changes, so markup exposed by a removal
/// (`[0[00:01.00]0:01.00]`) is stripped too and the result is a fixpoint.
pub fn normalize(raw: &str) -> String {
    let mut current = pass(raw);
    loop {
        let next = pass(&current);
        // Every change shortens the text, so this terminates.
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Order matters: timestamps, then metadata tags, then blank-line runs, then trim.
fn pass(raw: &str) -> String {
    let text = TIMESTAMP.replace_all(raw, "");
    let text = METADATA_TAG.replace_all(&text, "");
    let text = BLANK_RUN.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_timestamps() {
        assert_eq!(normalize("[00:23.45]Hello"), "Hello");
        assert_eq!(normalize("[1:02:03]Colon form"), "Colon form");
        assert_eq!(
            normalize("[00:01.00]one\n[00:02.50]two"),
            "one\ntwo"
        );
    }

    #[test]
    fn test_strips_metadata_tags() {
        let raw = "[ti:Test Song]\n[AR:Test Artist]\n[00:12.34]First line\n[00:15.00]Second line";
        assert_eq!(normalize(raw), "First line\nSecond line");
    }

    #[test]
    fn test_keeps_section_headers() {
        // No colon, so not a metadata tag.
        assert_eq!(normalize("[Chorus]\nla la"), "[Chorus]\nla la");
    }

    #[test]
    fn test_collapses_blank_runs_and_trims() {
        let raw = "\n\n  verse one\n\n\n\n\nverse two  \n\n\n";
        assert_eq!(normalize(raw), "verse one\n\nverse two");
    }

    #[test]
    fn test_exposed_markup_is_removed() {
        assert_eq!(normalize("[0[00:01.00]0:01.00]nested"), "nested");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            "plain text",
            "[00:01.00]a\n\n\n\n[00:02.00]b",
            "[ti:x][00:01.00]\n\n\n[length:03:20]\nc",
            "  [Verse 1]\nhola\n\n\n\nmundo  ",
            "[[00:01.00]] odd [ar:[x]]",
            "[0[00:01.00]0:01.00]nested",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "input: {s:?}");
        }
    }
}
