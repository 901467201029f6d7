// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ROI decision policy — decides whether a cheap header or footer OCR pass is
// trustworthy enough to classify the page without full-page OCR.
//
// One attempt moves through
//
//     ROI attempt -> region gate -> classification gate -> Accepted
//                         \                 \
//                          `-----------------`--> FallbackRequired(reason)
//
// `RoiPolicy::evaluate` is the pure transition from a region recognition to a
// decision. `RoiPolicy::attempt` wraps it with the crop and the OCR call.

use std::fmt;

use image::DynamicImage;
use pagesort_classify::{Classification, PageClassifier};
use pagesort_core::PipelineConfig;
use pagesort_core::types::{Recognition, RoiRegion};
use tracing::{debug, instrument, warn};

use crate::image::processor::ImageProcessor;
use crate::scan::traits::TextRecognizer;

/// Why a region result was not trusted.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// Region OCR is switched off.
    Disabled,
    LowConfidence { confidence: f32 },
    /// Too few characters (raw or trimmed) to judge the page by.
    TooLittleText { chars: usize, trimmed_chars: usize },
    /// Several document types are plausible.
    Ambiguous { candidates: usize },
    /// No profile matched the region text.
    NoKeywords,
    /// A functional type matched without the corroboration needed to skip
    /// full-page OCR.
    WeakEvidence {
        doc_type: String,
        secondary: usize,
        required: usize,
    },
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("region OCR disabled"),
            Self::LowConfidence { confidence } => {
                write!(f, "region confidence {confidence:.2} below threshold")
            }
            Self::TooLittleText {
                chars,
                trimmed_chars,
            } => write!(f, "region text too short ({chars} chars, {trimmed_chars} trimmed)"),
            Self::Ambiguous { candidates } => write!(f, "{candidates} candidate types"),
            Self::NoKeywords => f.write_str("no keywords in region"),
            Self::WeakEvidence {
                doc_type,
                secondary,
                required,
            } => write!(
                f,
                "{doc_type} has {secondary} secondary keywords, {required} needed"
            ),
        }
    }
}

/// A region result accepted as the page's final classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiAcceptance {
    pub region: RoiRegion,
    pub recognition: Recognition,
    pub classification: Classification,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoiDecision {
    Accepted(RoiAcceptance),
    FallbackRequired(FallbackReason),
}

impl RoiDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Two-tier OCR acceptance rules for one pipeline configuration.
pub struct RoiPolicy<'a> {
    config: &'a PipelineConfig,
    classifier: &'a PageClassifier,
}

impl<'a> RoiPolicy<'a> {
    pub fn new(config: &'a PipelineConfig, classifier: &'a PageClassifier) -> Self {
        Self { config, classifier }
    }

    /// Band to try first. The footer is used only when the caller signals
    /// that the header is unlikely to identify this page.
    pub fn region(need_footer: bool) -> RoiRegion {
        if need_footer {
            RoiRegion::Footer
        } else {
            RoiRegion::Header
        }
    }

    /// Crop the band, recognise it and evaluate the result.
    ///
    /// A recognizer error is logged and treated as an empty, zero-confidence
    /// recognition, which always falls back.
    #[instrument(skip_all, fields(need_footer))]
    pub fn attempt(
        &self,
        image: &DynamicImage,
        recognizer: &dyn TextRecognizer,
        need_footer: bool,
    ) -> RoiDecision {
        if !self.config.enable_roi_ocr {
            return RoiDecision::FallbackRequired(FallbackReason::Disabled);
        }

        let region = Self::region(need_footer);
        let band = ImageProcessor::from_dynamic(image.clone())
            .region_band(
                region,
                self.config.roi_header_fraction,
                self.config.roi_footer_fraction,
            )
            .into_dynamic();

        let recognition = recognizer.recognize(&band).unwrap_or_else(|err| {
            warn!(%region, %err, "Region OCR failed");
            Recognition::empty()
        });

        self.evaluate(region, recognition)
    }

    /// Decide whether `recognition` of `region` can stand in for full-page OCR.
    ///
    /// The region gate needs confidence at or above the threshold and enough
    /// raw and trimmed text. The classification gate rejects ambiguous
    /// pages, pages with no match, and functional matches whose secondary
    /// count is below `min_secondary_matches + roi_secondary_margin`.
    pub fn evaluate(&self, region: RoiRegion, recognition: Recognition) -> RoiDecision {
        let config = self.config;

        if recognition.confidence < config.roi_confidence_threshold {
            return fallback(
                region,
                FallbackReason::LowConfidence {
                    confidence: recognition.confidence,
                },
            );
        }

        let (min_chars, min_trimmed) = match region {
            RoiRegion::Header => (
                config.roi_min_header_chars,
                config.roi_min_header_trimmed_chars,
            ),
            RoiRegion::Footer => (
                config.roi_min_footer_chars,
                config.roi_min_footer_trimmed_chars,
            ),
        };
        let chars = recognition.text.chars().count();
        let trimmed_chars = recognition.text.trim().chars().count();
        if chars <= min_chars || trimmed_chars <= min_trimmed {
            return fallback(
                region,
                FallbackReason::TooLittleText {
                    chars,
                    trimmed_chars,
                },
            );
        }

        let classification = self.classifier.classify(&recognition.text);
        let Some(winner) = classification.as_match() else {
            return fallback(region, FallbackReason::NoKeywords);
        };

        if winner.candidate_count >= 2 {
            return fallback(
                region,
                FallbackReason::Ambiguous {
                    candidates: winner.candidate_count,
                },
            );
        }

        let required = winner.min_secondary_matches + config.roi_secondary_margin;
        if winner.functional && winner.secondary.len() < required {
            return fallback(
                region,
                FallbackReason::WeakEvidence {
                    doc_type: winner.doc_type.clone(),
                    secondary: winner.secondary.len(),
                    required,
                },
            );
        }

        debug!(
            %region,
            doc_type = %winner.doc_type,
            confidence = recognition.confidence,
            "Region result accepted"
        );
        RoiDecision::Accepted(RoiAcceptance {
            region,
            recognition,
            classification,
        })
    }
}

fn fallback(region: RoiRegion, reason: FallbackReason) -> RoiDecision {
    debug!(%region, %reason, "Region result rejected");
    RoiDecision::FallbackRequired(reason)
}
