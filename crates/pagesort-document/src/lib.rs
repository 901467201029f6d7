// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagesort-document — Page images, OCR strategy, and PDF splitting for Pagesort.
//
// Provides page image extraction from scanned PDFs, header/footer cropping and
// orientation correction, the region-first OCR decision policy, the per-document
// page pipeline, and writing one PDF per detected document.

pub mod image;
pub mod pdf;
pub mod pipeline;
pub mod scan;

// Re-export the primary structs so callers can use `pagesort_document::PdfReader` etc.
pub use image::processor::{ExpandingRotator, ImageProcessor};
pub use pdf::reader::PdfReader;
pub use pdf::splitter::{DocumentSplitter, GeneratedDocument};
pub use pipeline::{DocumentOutcome, PageProcessor};
pub use scan::orientation::UprightClassifier;
pub use scan::roi::{RoiDecision, RoiPolicy};
pub use scan::traits::{ImageRotator, Orientation, OrientationClassifier, PageRenderer, TextRecognizer};

#[cfg(feature = "oar")]
pub use scan::oar::{OarOrientationClassifier, OarRecognizer};
#[cfg(feature = "ocr")]
pub use scan::ocr::OcrsRecognizer;
