// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Orientation normalizer — rotates sideways or upside-down scans upright
// before any OCR pass.

use image::DynamicImage;
use pagesort_core::PipelineConfig;
use pagesort_core::error::Result;
use tracing::{debug, info, instrument, warn};

use crate::scan::traits::{ImageRotator, Orientation, OrientationClassifier};

/// Angle classes that trigger a correction.
const ROTATED_CLASSES: [f32; 3] = [90.0, 180.0, 270.0];

/// Orientation classifier for builds without an orientation model: reports
/// every page as upright with full confidence, so no page is ever rotated.
#[derive(Debug, Clone, Copy, Default)]
pub struct UprightClassifier;

impl OrientationClassifier for UprightClassifier {
    fn classify(&self, _image: &DynamicImage) -> Result<Orientation> {
        Ok(Orientation::upright())
    }
}

/// Decides whether a page needs rotating and applies the correction.
pub struct OrientationNormalizer<'a> {
    classifier: &'a dyn OrientationClassifier,
    rotator: &'a dyn ImageRotator,
    tolerance: f32,
    confidence_threshold: f32,
}

impl<'a> OrientationNormalizer<'a> {
    pub fn new(
        classifier: &'a dyn OrientationClassifier,
        rotator: &'a dyn ImageRotator,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            classifier,
            rotator,
            tolerance: config.angle_tolerance,
            confidence_threshold: config.angle_confidence_threshold,
        }
    }

    /// Signed clockwise rotation (degrees) that undoes `orientation`, or `None`
    /// when the page should be left as it is.
    ///
    /// The detected angle must be non-zero, its confidence must exceed the
    /// threshold, and it must lie within the tolerance of 90, 180 or 270.
    /// Corrections are normalised to (-180, 180]: 90 -> -90, 180 -> 180,
    /// 270 -> 90.
    pub fn corrective_rotation(&self, orientation: Orientation) -> Option<i32> {
        if orientation.angle == 0.0 || orientation.confidence <= self.confidence_threshold {
            return None;
        }

        let class = ROTATED_CLASSES
            .iter()
            .copied()
            .find(|class| (orientation.angle - class).abs() <= self.tolerance)?;

        let correction = (-(class as i32)).rem_euclid(360);
        Some(if correction > 180 {
            correction - 360
        } else {
            correction
        })
    }

    /// Return the page upright, with the rotation applied (if any).
    ///
    /// Classifier and rotator failures are logged and leave the page
    /// unrotated.
    #[instrument(skip_all, fields(page = page_number))]
    pub fn normalize(&self, page_number: u32, image: DynamicImage) -> (DynamicImage, Option<i32>) {
        let orientation = match self.classifier.classify(&image) {
            Ok(orientation) => orientation,
            Err(err) => {
                warn!(%err, "Orientation detection failed, keeping page as scanned");
                return (image, None);
            }
        };

        let Some(degrees) = self.corrective_rotation(orientation) else {
            debug!(
                angle = orientation.angle,
                confidence = orientation.confidence,
                "No orientation correction"
            );
            return (image, None);
        };

        match self.rotator.rotate(&image, degrees as f32) {
            Ok(rotated) => {
                info!(
                    detected = orientation.angle,
                    confidence = orientation.confidence,
                    applied = degrees,
                    "Page orientation corrected"
                );
                (rotated, Some(degrees))
            }
            Err(err) => {
                warn!(%err, degrees, "Rotation failed, keeping page as scanned");
                (image, None)
            }
        }
    }
}
