// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration — every tunable consumed by classification, the
// ROI-first OCR policy, orientation correction, and batch processing.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PagesortError, Result};

/// Tunable settings for one processing run.
///
/// Loaded once at startup and passed by reference into the classifier and the
/// page pipeline; never mutated while pages are being processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Try a cheap header/footer OCR pass before full-page OCR.
    pub enable_roi_ocr: bool,
    /// Fraction of the page height OCR'd as the header band.
    pub roi_header_fraction: f32,
    /// Fraction of the page height OCR'd as the footer band.
    pub roi_footer_fraction: f32,
    /// Minimum band OCR confidence for the band text to be trusted.
    pub roi_confidence_threshold: f32,
    /// Header text must be longer than this many characters.
    pub roi_min_header_chars: usize,
    /// Header text, trimmed, must be longer than this many characters.
    pub roi_min_header_trimmed_chars: usize,
    /// Footer text must be longer than this many characters.
    pub roi_min_footer_chars: usize,
    /// Footer text, trimmed, must be longer than this many characters.
    pub roi_min_footer_trimmed_chars: usize,
    /// Extra secondary matches (above a functional type's
    /// `min_secondary_matches`) required before band text alone is accepted.
    pub roi_secondary_margin: usize,
    /// When the previous page fell back to full-page OCR and ended up
    /// functional, try the footer band first on the next page.
    pub footer_hint: bool,
    /// Degrees within which a detected angle snaps to 90/180/270.
    pub angle_tolerance: f32,
    /// Orientation confidence a rotation must exceed to be applied.
    pub angle_confidence_threshold: f32,
    /// Score contributed by each primary keyword match.
    pub primary_weight: f32,
    /// Multiplier applied to the score of non-functional types.
    pub non_functional_weight: f32,
    /// Resolution used when pages are rasterised.
    pub render_dpi: u32,
    /// Skip OCR on pages that are almost entirely white.
    pub detect_blank_pages: bool,
    /// Share of near-white pixels at which a page counts as blank.
    pub blank_white_ratio: f32,
    /// Luma value above which a pixel counts as near-white.
    pub blank_white_level: u8,
    /// Number of PDFs processed concurrently in a batch.
    pub max_workers: usize,
    /// Characters of recognised text kept per page in reports.
    pub text_preview_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enable_roi_ocr: true,
            roi_header_fraction: 0.40,
            roi_footer_fraction: 0.30,
            roi_confidence_threshold: 0.75,
            roi_min_header_chars: 30,
            roi_min_header_trimmed_chars: 10,
            roi_min_footer_chars: 5,
            roi_min_footer_trimmed_chars: 5,
            roi_secondary_margin: 1,
            footer_hint: true,
            angle_tolerance: 5.0,
            angle_confidence_threshold: 0.70,
            primary_weight: 3.0,
            non_functional_weight: 0.7,
            render_dpi: 300,
            detect_blank_pages: false,
            blank_white_ratio: 0.975,
            blank_white_level: 240,
            max_workers: 2,
            text_preview_chars: 400,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file. Absent fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|err| {
            PagesortError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|err| {
            PagesortError::Config(format!("cannot parse {}: {}", path.display(), err))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value lies in its meaningful range.
    pub fn validate(&self) -> Result<()> {
        check_fraction("roi_header_fraction", self.roi_header_fraction)?;
        check_fraction("roi_footer_fraction", self.roi_footer_fraction)?;
        check_unit("roi_confidence_threshold", self.roi_confidence_threshold)?;
        check_unit("angle_confidence_threshold", self.angle_confidence_threshold)?;
        check_unit("blank_white_ratio", self.blank_white_ratio)?;

        if !(0.0..45.0).contains(&self.angle_tolerance) {
            return Err(PagesortError::Config(format!(
                "angle_tolerance must be in [0, 45), got {}",
                self.angle_tolerance
            )));
        }
        if self.primary_weight <= 0.0 || self.non_functional_weight <= 0.0 {
            return Err(PagesortError::Config(
                "keyword weights must be positive".into(),
            ));
        }
        if self.max_workers == 0 {
            return Err(PagesortError::Config("max_workers must be at least 1".into()));
        }
        if self.render_dpi == 0 {
            return Err(PagesortError::Config("render_dpi must be positive".into()));
        }
        Ok(())
    }
}

fn check_fraction(name: &str, value: f32) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(PagesortError::Config(format!(
            "{name} must be in (0, 1], got {value}"
        )))
    }
}

fn check_unit(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PagesortError::Config(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "enable_roi_ocr": false, "max_workers": 4 }"#).unwrap();
        assert!(!config.enable_roi_ocr);
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.roi_min_header_chars, 30);
        assert!((config.roi_confidence_threshold - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn rejects_zero_header_fraction() {
        let config = PipelineConfig {
            roi_header_fraction: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_confidence_above_one() {
        let config = PipelineConfig {
            roi_confidence_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagesort.json");
        std::fs::write(&path, r#"{ "roi_secondary_margin": 0 }"#).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.roi_secondary_margin, 0);
        assert!(config.enable_roi_ocr);
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = PipelineConfig::load("/nonexistent/pagesort.json").unwrap_err();
        assert!(matches!(err, PagesortError::Config(_)));
    }
}
