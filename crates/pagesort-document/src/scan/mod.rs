// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — collaborator interfaces, blank page detection, orientation
// correction, the region-first OCR decision policy, and the engine-backed
// implementations: ocrs (feature `ocr`) and oar-ocr (feature `oar`).

pub mod blank;
pub mod orientation;
pub mod roi;
pub mod traits;

#[cfg(feature = "oar")]
pub mod oar;
#[cfg(feature = "ocr")]
pub mod ocr;

pub use blank::BlankDetector;
pub use orientation::{OrientationNormalizer, UprightClassifier};
pub use roi::{FallbackReason, RoiAcceptance, RoiDecision, RoiPolicy};
pub use traits::{ImageRotator, Orientation, OrientationClassifier, PageRenderer, TextRecognizer};

#[cfg(feature = "oar")]
pub use oar::{OarConfig, OarOrientationClassifier, OarRecognizer};
#[cfg(feature = "ocr")]
pub use ocr::{OcrConfig, OcrsRecognizer};
