//! Property-based tests for memory-sync
//!
//! These tests verify invariants that must hold for all inputs:
//! - Extraction never panics, even on garbage
//! - Summaries stay within the character cap
//! - Exported functions are always named in the summary
//!
//! Run with: cargo test --test property_tests

use proptest::prelude::*;
use std::path::Path;

use memsync::extract::{truncate_chars, ExtractLimits, Extractor, DEFAULT_MAX_TEXT_CHARS};

fn extractor() -> Extractor {
    Extractor::new("/repo", ExtractLimits::default())
}

proptest! {
    /// Invariant: summarize never panics on any input
    #[test]
    fn never_panics(s in "\\PC*", ext in prop::sample::select(vec!["ts", "tsx", "js", "jsx"])) {
        let path = format!("/repo/src/file.{}", ext);
        let _ = extractor().summarize(Path::new(&path), &s);
    }

    /// Invariant: summary text never exceeds the cap
    #[test]
    fn bounded_length(lines in prop::collection::vec("[ -~]{0,200}", 0..60)) {
        let source = lines.join("\n");
        if let Some(summary) = extractor().summarize(Path::new("/repo/a.tsx"), &source) {
            prop_assert!(summary.text.chars().count() <= DEFAULT_MAX_TEXT_CHARS);
        }
    }

    /// Invariant: an exported function's name appears in the summary
    #[test]
    fn exported_function_named(name in "[a-z][a-zA-Z0-9_]{0,20}", body in "[a-z =;0-9\n]{0,300}") {
        let source = format!("export function {}(x: number) {{}}\n{}", name, body);
        let summary = extractor().summarize(Path::new("/repo/a.ts"), &source);
        prop_assert!(summary.is_some());
        prop_assert!(summary.unwrap().text.contains(&name));
    }

    /// Invariant: truncation is a hard character cap
    #[test]
    fn truncate_respects_cap(s in "\\PC{0,300}", max in 0usize..200) {
        let cut = truncate_chars(&s, max);
        prop_assert!(cut.chars().count() <= max);
        prop_assert!(s.starts_with(&cut));
    }
}
