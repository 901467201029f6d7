// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Keyword matcher — case-insensitive, whole-word phrase search.
//
// A keyword never matches inside a larger token: `id` does not match `paid`,
// `po` does not match `report`. Both ends of every phrase carry a `\b`
// assertion, so a punctuation edge needs a word character on its far side:
// `$` does not match `$1,200.00`, `shipper:` does not match `Shipper: ACME`,
// while `invoice #` still matches `Invoice #5531`.

use regex::Regex;
use tracing::warn;

/// A compiled, deduplicated keyword list, ordered longest phrase first.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    entries: Vec<Keyword>,
}

#[derive(Debug, Clone)]
struct Keyword {
    /// The phrase as written in the profile.
    phrase: String,
    pattern: Regex,
}

impl KeywordSet {
    /// Compile `keywords`. Blank entries and case-insensitive duplicates are
    /// dropped; the first spelling of a duplicate is kept.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: Vec<String> = Vec::new();
        let mut entries = Vec::new();

        for keyword in keywords {
            let phrase = keyword.as_ref().trim();
            if phrase.is_empty() {
                continue;
            }
            let folded = phrase.to_lowercase();
            if seen.contains(&folded) {
                continue;
            }
            match Regex::new(&boundary_pattern(phrase)) {
                Ok(pattern) => {
                    seen.push(folded);
                    entries.push(Keyword {
                        phrase: phrase.to_string(),
                        pattern,
                    });
                }
                Err(err) => warn!(keyword = phrase, %err, "Skipping keyword that cannot be compiled"),
            }
        }

        // Stable: equal-length phrases keep their configured order.
        entries.sort_by_key(|k| std::cmp::Reverse(k.phrase.chars().count()));

        Self { entries }
    }

    /// Keywords occurring in `text`, longest first, in their configured casing.
    pub fn find_in(&self, text: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|k| k.pattern.is_match(text))
            .map(|k| k.phrase.clone())
            .collect()
    }

    /// Compiled phrases in evaluation order.
    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|k| k.phrase.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One-shot form of [`KeywordSet::find_in`] for callers without a compiled set.
pub fn match_keywords<S: AsRef<str>>(text: &str, keywords: &[S]) -> Vec<String> {
    KeywordSet::new(keywords).find_in(text)
}

/// Case-insensitive regex for `phrase` with a word boundary at both ends.
fn boundary_pattern(phrase: &str) -> String {
    format!(r"(?i)\b{}\b", regex::escape(phrase))
}
