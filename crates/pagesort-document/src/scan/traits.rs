// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator interfaces — the expensive or platform-specific operations the
// page pipeline depends on but does not implement itself.
//
// Implementations shipped in this crate:
//
// - `TextRecognizer`: `scan::ocr::OcrsRecognizer` (feature `ocr`) and
//   `scan::oar::OarRecognizer` (feature `oar`).
// - `OrientationClassifier`: `scan::oar::OarOrientationClassifier` (feature
//   `oar`), or `scan::orientation::UprightClassifier` when no model is loaded.
// - `ImageRotator`: `image::processor::ExpandingRotator`.
// - `PageRenderer`: `pdf::reader::PdfReader`.

use image::DynamicImage;
use pagesort_core::error::Result;
use pagesort_core::types::Recognition;
use serde::{Deserialize, Serialize};

/// Recognises text in a page image or a band cropped from one.
///
/// An `Err` from a region call is absorbed by the ROI policy as an empty,
/// zero-confidence result. An `Err` from the full-page call drops the page.
pub trait TextRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<Recognition>;
}

/// Orientation reported for a full page image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    /// Detected rotation of the page content in degrees, nominally one of
    /// 0, 90, 180 or 270.
    pub angle: f32,
    pub confidence: f32,
}

impl Orientation {
    pub fn new(angle: f32, confidence: f32) -> Self {
        Self {
            angle,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn upright() -> Self {
        Self::new(0.0, 1.0)
    }

    /// Parse a classifier label such as `"90"` or `"270°"`.
    ///
    /// Returns `None` for labels that are not an angle in [0, 360).
    pub fn from_label(label: &str, confidence: f32) -> Option<Self> {
        let angle: f32 = label.trim().trim_end_matches('°').trim().parse().ok()?;
        if !(0.0..360.0).contains(&angle) {
            return None;
        }
        Some(Self::new(angle, confidence))
    }
}

/// Detects how far a page image is rotated from upright.
pub trait OrientationClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Orientation>;
}

impl<T: OrientationClassifier + ?Sized> OrientationClassifier for Box<T> {
    fn classify(&self, image: &DynamicImage) -> Result<Orientation> {
        (**self).classify(image)
    }
}

/// Rotates an image by a signed angle (degrees, positive is clockwise),
/// growing the canvas so no corner is cropped.
pub trait ImageRotator {
    fn rotate(&self, image: &DynamicImage, degrees: f32) -> Result<DynamicImage>;
}

/// Produces page rasters of one source document, 1-based and in order.
pub trait PageRenderer {
    fn page_count(&self) -> u32;

    fn render_page(&self, page_number: u32) -> Result<DynamicImage>;
}
