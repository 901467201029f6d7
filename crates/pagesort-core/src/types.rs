// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagesort page classifier and splitter.

use serde::{Deserialize, Serialize};

/// Type name reported for pages no profile claims.
pub const UNKNOWN_TYPE: &str = "UNKNOWN";

/// Text and confidence returned by one OCR call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recognition {
    pub text: String,
    /// Mean recognition confidence in [0, 1].
    pub confidence: f32,
}

impl Recognition {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// The value substituted for a failed recognition call.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Combine per-line recognizer output in reading order.
    ///
    /// Non-blank lines are joined with single spaces. The confidence is the
    /// mean score over every line the recognizer returned, blank ones
    /// included; a non-finite score counts as zero.
    pub fn from_scored_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = (S, f32)>,
        S: AsRef<str>,
    {
        let mut texts: Vec<String> = Vec::new();
        let mut score_sum = 0.0f32;
        let mut count = 0usize;

        for (text, score) in lines {
            count += 1;
            if score.is_finite() {
                score_sum += score.clamp(0.0, 1.0);
            }
            let text = text.as_ref().trim();
            if !text.is_empty() {
                texts.push(text.to_string());
            }
        }

        if count == 0 {
            return Self::empty();
        }
        Self::new(texts.join(" "), score_sum / count as f32)
    }
}

/// Horizontal band of a page used for the cheap OCR pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoiRegion {
    Header,
    Footer,
}

impl std::fmt::Display for RoiRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Header => f.write_str("header"),
            Self::Footer => f.write_str("footer"),
        }
    }
}

/// Final classification of one scanned page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// 1-based page number in the source document.
    pub page_number: u32,
    pub document_type: String,
    pub functional: bool,
    pub ocr_confidence: f32,
    /// Primary then secondary matches, each keyword at most once.
    pub keywords_found: Vec<String>,
    pub used_roi: bool,
    /// Band whose text decided the page, when `used_roi` is set.
    pub roi_region: Option<RoiRegion>,
    /// Corrective rotation applied before OCR, in degrees.
    pub rotation_applied: Option<i32>,
    pub is_blank: bool,
    /// Recognised text the classification was made from.
    #[serde(default, skip_serializing)]
    pub text: String,
}

impl PageRecord {
    pub fn is_unknown(&self) -> bool {
        self.document_type == UNKNOWN_TYPE
    }

    /// A page that skipped OCR because it is blank.
    pub fn blank(page_number: u32) -> Self {
        Self {
            page_number,
            document_type: UNKNOWN_TYPE.to_string(),
            functional: false,
            ocr_confidence: 0.0,
            keywords_found: Vec::new(),
            used_roi: false,
            roi_region: None,
            rotation_applied: None,
            is_blank: true,
            text: String::new(),
        }
    }
}

/// A maximal run of consecutive functional pages of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentGroup {
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Contiguous, ascending page numbers.
    pub pages: Vec<u32>,
    pub start_page: u32,
    pub end_page: u32,
}

impl DocumentGroup {
    pub fn new(doc_type: impl Into<String>, first_page: u32) -> Self {
        Self {
            doc_type: doc_type.into(),
            pages: vec![first_page],
            start_page: first_page,
            end_page: first_page,
        }
    }

    pub fn push(&mut self, page: u32) {
        self.pages.push(page);
        self.end_page = page;
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// A page that was dropped from the record sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFailure {
    pub page_number: u32,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognition_clamps_confidence() {
        assert_eq!(Recognition::new("x", 1.7).confidence, 1.0);
        assert_eq!(Recognition::new("x", -0.2).confidence, 0.0);
    }

    #[test]
    fn scored_lines_average_every_line() {
        let recognition = Recognition::from_scored_lines([
            ("COMMERCIAL INVOICE", 0.98),
            ("  ", 0.40),
            ("No 7781", 0.91),
        ]);
        assert_eq!(recognition.text, "COMMERCIAL INVOICE No 7781");
        assert!((recognition.confidence - 0.763_333).abs() < 1e-4);
    }

    #[test]
    fn scored_lines_without_lines_are_empty() {
        let none: [(&str, f32); 0] = [];
        assert_eq!(Recognition::from_scored_lines(none), Recognition::empty());
        let noisy = Recognition::from_scored_lines([("x", f32::NAN), ("y", 1.0)]);
        assert_eq!(noisy.confidence, 0.5);
    }

    #[test]
    fn group_push_extends_end_page() {
        let mut group = DocumentGroup::new("INVOICE", 3);
        group.push(4);
        group.push(5);
        assert_eq!(group.pages, vec![3, 4, 5]);
        assert_eq!(group.start_page, 3);
        assert_eq!(group.end_page, 5);
        assert_eq!(group.page_count(), 3);
    }

    #[test]
    fn group_serialises_type_field() {
        let group = DocumentGroup::new("INVOICE", 1);
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["type"], "INVOICE");
        assert_eq!(json["pages"], serde_json::json!([1]));
    }

    #[test]
    fn blank_record_is_unknown_and_not_functional() {
        let record = PageRecord::blank(7);
        assert!(record.is_unknown());
        assert!(!record.functional);
        assert!(record.is_blank);
    }

    #[test]
    fn record_text_is_not_serialised() {
        let mut record = PageRecord::blank(1);
        record.text = "secret page text".into();
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("secret page text"));
    }
}
