// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Property-based tests for keyword matching, classification and grouping.

use pagesort_classify::{KeywordSet, PageClassifier, group_pages, match_keywords};
use pagesort_core::types::PageRecord;
use pagesort_core::{PipelineConfig, ProfileTable};
use proptest::prelude::*;

fn record(page_number: u32, doc_type: &str, functional: bool) -> PageRecord {
    PageRecord {
        page_number,
        document_type: doc_type.to_string(),
        functional,
        ocr_confidence: 1.0,
        keywords_found: Vec::new(),
        used_roi: false,
        roi_region: None,
        rotation_applied: None,
        is_blank: false,
        text: String::new(),
    }
}

const TYPES: [&str; 3] = ["INVOICE", "PACKING_LIST", "DELIVERY_NOTE"];

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Word/non-word transition at byte offset `pos` of ASCII `text`.
fn at_boundary(text: &[u8], pos: usize) -> bool {
    let before = pos > 0 && is_word_byte(text[pos - 1]);
    let after = pos < text.len() && is_word_byte(text[pos]);
    before != after
}

/// Whether `keyword` occurs in ASCII `text` with a boundary on both sides.
fn occurs_as_token(text: &str, keyword: &str) -> bool {
    let text = text.to_ascii_lowercase();
    let keyword = keyword.to_ascii_lowercase();
    let bytes = text.as_bytes();
    (0..=text.len().saturating_sub(keyword.len()))
        .filter(|&i| text[i..].starts_with(&keyword))
        .any(|i| at_boundary(bytes, i) && at_boundary(bytes, i + keyword.len()))
}

// ============================================================================
// Keyword matching
// ============================================================================

/// Every reported keyword occurs in the text, ignoring case, and a keyword
/// edged with punctuation is reported exactly when it stands between word
/// boundaries.
#[test]
fn proptest_matches_are_substrings() {
    proptest!(|(text in "[a-zA-Z0-9 .:#$]{0,200}", keywords in prop::collection::vec("[a-z]{1,6}( [a-z]{1,6})?", 0..8))| {
        let lowered = text.to_lowercase();
        for found in match_keywords(&text, &keywords) {
            prop_assert!(lowered.contains(&found.to_lowercase()));
        }
    });

    proptest!(|(
        keyword in "[a-z]{1,4}[:#$]|[:#$][a-z0-9]{1,4}|[a-z]{1,3} ?[#$][a-z0-9]{0,3}",
        prefix in "[a-zA-Z0-9 :#$]{0,3}",
        suffix in "[a-zA-Z0-9 :#$]{0,3}"
    )| {
        let text = format!("{prefix}{keyword}{suffix}");
        let matched = !match_keywords(&text, &[keyword.as_str()]).is_empty();
        prop_assert_eq!(matched, occurs_as_token(&text, &keyword), "text {:?} keyword {:?}", text, keyword);
    });
}

/// Results never contain the same keyword twice and are ordered longest first.
#[test]
fn proptest_matches_unique_and_longest_first() {
    proptest!(|(text in "[a-z ]{0,200}", keywords in prop::collection::vec("[a-z]{1,5}", 0..10))| {
        let found = KeywordSet::new(&keywords).find_in(&text);
        for pair in found.windows(2) {
            prop_assert!(pair[0].chars().count() >= pair[1].chars().count());
        }
        let mut folded: Vec<String> = found.iter().map(|k| k.to_lowercase()).collect();
        folded.sort();
        folded.dedup();
        prop_assert_eq!(folded.len(), found.len());
    });
}

/// Text surrounded by word characters never matches a purely alphabetic keyword.
#[test]
fn proptest_embedded_keyword_does_not_match() {
    proptest!(|(keyword in "[a-z]{2,6}", prefix in "[a-z]{1,4}", suffix in "[a-z]{1,4}")| {
        let text = format!("{prefix}{keyword}{suffix}");
        prop_assert!(match_keywords(&text, &[keyword.as_str()]).is_empty());
    });
}

// ============================================================================
// Classification
// ============================================================================

/// Classification is deterministic and never panics on arbitrary text.
#[test]
fn proptest_classification_is_deterministic() {
    let classifier = PageClassifier::new(&ProfileTable::builtin(), &PipelineConfig::default());
    proptest!(|(text in "\\PC{0,300}")| {
        let first = classifier.classify(&text);
        let second = classifier.classify(&text);
        prop_assert_eq!(first, second);
    });
}

// ============================================================================
// Grouping
// ============================================================================

/// Groups partition exactly the functional pages, each group is a contiguous
/// single-type run, groups appear in page order, and no two neighbouring
/// groups could have been merged.
#[test]
fn proptest_groups_partition_functional_pages() {
    proptest!(|(pages in prop::collection::vec((0usize..3, any::<bool>()), 0..40))| {
        let records: Vec<PageRecord> = pages
            .iter()
            .enumerate()
            .map(|(i, (t, functional))| record(i as u32 + 1, TYPES[*t], *functional))
            .collect();

        let groups = group_pages(&records);

        let grouped: Vec<u32> = groups.iter().flat_map(|g| g.pages.iter().copied()).collect();
        let functional: Vec<u32> = records
            .iter()
            .filter(|r| r.functional)
            .map(|r| r.page_number)
            .collect();
        prop_assert_eq!(grouped, functional);

        for group in &groups {
            prop_assert_eq!(group.start_page, group.pages[0]);
            prop_assert_eq!(group.end_page, *group.pages.last().unwrap_or(&0));
            for pair in group.pages.windows(2) {
                prop_assert_eq!(pair[0] + 1, pair[1]);
            }
            for page in &group.pages {
                let r = &records[*page as usize - 1];
                prop_assert_eq!(&r.document_type, &group.doc_type);
            }
        }

        for pair in groups.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            prop_assert!(prev.end_page < next.start_page);
            prop_assert!(
                !(prev.doc_type == next.doc_type && prev.end_page + 1 == next.start_page),
                "groups {}-{} and {}-{} share type {}",
                prev.start_page, prev.end_page, next.start_page, next.end_page, next.doc_type
            );
        }
    });
}
