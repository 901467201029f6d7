// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page classifier — scores every document type profile against a page's text
// and selects a winner.
//
// A type is a candidate only if at least one of its primary keywords occurs.
// Functional types additionally need `min_secondary_matches` corroborating
// secondary keywords. Candidates are scored as
//
//     primary_weight * |primary| + |secondary|
//
// with non-functional scores multiplied by `non_functional_weight`, and the
// winner is the maximum of (score, functional, total keyword count).

use std::cmp::Ordering;

use pagesort_core::profiles::ProfileTable;
use pagesort_core::types::UNKNOWN_TYPE;
use pagesort_core::PipelineConfig;
use serde::Serialize;
use tracing::{debug, trace};

use crate::keywords::KeywordSet;

/// The winning type for a page, with the evidence that selected it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeMatch {
    pub doc_type: String,
    /// Matched primary keywords, longest first.
    pub primary: Vec<String>,
    /// Matched secondary keywords, longest first.
    pub secondary: Vec<String>,
    pub score: f64,
    pub functional: bool,
    /// The winning profile's `min_secondary_matches`.
    pub min_secondary_matches: usize,
    /// How many types survived to scoring. More than one means the page
    /// plausibly belongs to several types.
    pub candidate_count: usize,
}

impl TypeMatch {
    pub fn total_keyword_count(&self) -> usize {
        self.primary.len() + self.secondary.len()
    }
}

/// Outcome of classifying one page of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Classification {
    Classified(TypeMatch),
    /// No profile had a primary match (or every functional match lacked
    /// corroboration).
    Unknown,
}

impl Classification {
    pub fn doc_type(&self) -> &str {
        match self {
            Self::Classified(m) => &m.doc_type,
            Self::Unknown => UNKNOWN_TYPE,
        }
    }

    pub fn is_functional(&self) -> bool {
        matches!(self, Self::Classified(m) if m.functional)
    }

    pub fn as_match(&self) -> Option<&TypeMatch> {
        match self {
            Self::Classified(m) => Some(m),
            Self::Unknown => None,
        }
    }

    pub fn primary_matches(&self) -> &[String] {
        self.as_match()
            .map(|m| m.primary.as_slice())
            .unwrap_or_default()
    }

    pub fn secondary_matches(&self) -> &[String] {
        self.as_match()
            .map(|m| m.secondary.as_slice())
            .unwrap_or_default()
    }

    pub fn total_keyword_count(&self) -> usize {
        self.as_match().map_or(0, TypeMatch::total_keyword_count)
    }

    pub fn candidate_count(&self) -> usize {
        self.as_match().map_or(0, |m| m.candidate_count)
    }

    /// Primary then secondary matches; a keyword listed in both appears once.
    pub fn keywords(&self) -> Vec<String> {
        let mut keywords: Vec<String> = Vec::with_capacity(self.total_keyword_count());
        for keyword in self.primary_matches().iter().chain(self.secondary_matches()) {
            if !keywords.contains(keyword) {
                keywords.push(keyword.clone());
            }
        }
        keywords
    }
}

/// A profile with its keyword lists compiled.
#[derive(Debug, Clone)]
struct CompiledProfile {
    name: String,
    primary: KeywordSet,
    secondary: KeywordSet,
    min_secondary_matches: usize,
    functional: bool,
}

/// Per-type scoring state for one classification call.
struct Candidate<'a> {
    profile: &'a CompiledProfile,
    primary: Vec<String>,
    secondary: Vec<String>,
    score: f64,
}

impl Candidate<'_> {
    fn total_keywords(&self) -> usize {
        self.primary.len() + self.secondary.len()
    }

    /// Lexicographic comparison of (score, functional, total keyword count).
    fn rank(&self, other: &Self) -> Ordering {
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(Ordering::Equal)
            .then(self.profile.functional.cmp(&other.profile.functional))
            .then(self.total_keywords().cmp(&other.total_keywords()))
    }
}

/// Classifies page text against an immutable [`ProfileTable`].
///
/// Construction compiles every keyword once; [`classify`](Self::classify) is a
/// pure function of its input text.
#[derive(Debug, Clone)]
pub struct PageClassifier {
    profiles: Vec<CompiledProfile>,
    primary_weight: f64,
    non_functional_weight: f64,
}

impl PageClassifier {
    /// Build a classifier using the keyword weights from `config`.
    pub fn new(table: &ProfileTable, config: &PipelineConfig) -> Self {
        Self::with_weights(table, config.primary_weight, config.non_functional_weight)
    }

    pub fn with_weights(table: &ProfileTable, primary_weight: f32, non_functional_weight: f32) -> Self {
        let profiles = table
            .profiles()
            .iter()
            .map(|p| CompiledProfile {
                name: p.name.clone(),
                primary: KeywordSet::new(&p.primary_keywords),
                secondary: KeywordSet::new(&p.secondary_keywords),
                min_secondary_matches: p.min_secondary_matches,
                functional: p.functional,
            })
            .collect::<Vec<_>>();

        debug!(profiles = profiles.len(), "Page classifier compiled");

        Self {
            profiles,
            primary_weight: f64::from(primary_weight),
            non_functional_weight: f64::from(non_functional_weight),
        }
    }

    /// Score every profile against `text` and pick the winner.
    pub fn classify(&self, text: &str) -> Classification {
        let mut candidates: Vec<Candidate<'_>> = Vec::new();

        for profile in &self.profiles {
            let primary = profile.primary.find_in(text);
            if primary.is_empty() {
                continue;
            }

            let secondary = profile.secondary.find_in(text);
            if profile.functional && secondary.len() < profile.min_secondary_matches {
                trace!(
                    doc_type = %profile.name,
                    secondary = secondary.len(),
                    required = profile.min_secondary_matches,
                    "Functional type lacks corroborating keywords"
                );
                continue;
            }

            let mut score = self.primary_weight * primary.len() as f64 + secondary.len() as f64;
            if !profile.functional {
                score *= self.non_functional_weight;
            }

            candidates.push(Candidate {
                profile,
                primary,
                secondary,
                score,
            });
        }

        let candidate_count = candidates.len();

        // Strictly-greater replacement: on a complete tie the earlier profile wins.
        let mut winner: Option<Candidate<'_>> = None;
        for candidate in candidates {
            let better = match &winner {
                None => true,
                Some(current) => candidate.rank(current) == Ordering::Greater,
            };
            if better {
                winner = Some(candidate);
            }
        }

        match winner {
            None => Classification::Unknown,
            Some(w) => {
                debug!(
                    doc_type = %w.profile.name,
                    score = w.score,
                    candidates = candidate_count,
                    "Page classified"
                );
                Classification::Classified(TypeMatch {
                    doc_type: w.profile.name.clone(),
                    primary: w.primary,
                    secondary: w.secondary,
                    score: w.score,
                    functional: w.profile.functional,
                    min_secondary_matches: w.profile.min_secondary_matches,
                    candidate_count,
                })
            }
        }
    }

    /// Whether pages of `doc_type` are kept. `UNKNOWN` never is.
    pub fn is_functional(&self, doc_type: &str) -> bool {
        self.profiles
            .iter()
            .any(|p| p.name == doc_type && p.functional)
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }
}
