// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagesort-classify — Lexical page classification for Pagesort.
//
// Provides whole-word keyword matching, per-page document type scoring against
// the profile table, and grouping of classified pages into contiguous
// documents. Nothing in this crate touches images or OCR.

pub mod classifier;
pub mod grouper;
pub mod keywords;

pub use classifier::{Classification, PageClassifier, TypeMatch};
pub use grouper::group_pages;
pub use keywords::{KeywordSet, match_keywords};
