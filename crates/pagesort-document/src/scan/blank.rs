// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blank page detection — share of near-white pixels in the page luma.

use image::DynamicImage;
use pagesort_core::PipelineConfig;
use tracing::debug;

/// Flags scanned pages that carry no content worth recognising.
#[derive(Debug, Clone, Copy)]
pub struct BlankDetector {
    /// Luma strictly above this counts as white.
    white_level: u8,
    /// Minimum white share for a page to be blank.
    white_ratio: f32,
}

impl BlankDetector {
    pub fn new(white_level: u8, white_ratio: f32) -> Self {
        Self {
            white_level,
            white_ratio,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.blank_white_level, config.blank_white_ratio)
    }

    /// Share of pixels brighter than the white level, in [0, 1].
    /// An empty image counts as entirely white.
    pub fn white_share(&self, image: &DynamicImage) -> f32 {
        let luma = image.to_luma8();
        let total = luma.width() as usize * luma.height() as usize;
        if total == 0 {
            return 1.0;
        }
        let white = luma.pixels().filter(|p| p.0[0] > self.white_level).count();
        white as f32 / total as f32
    }

    pub fn is_blank(&self, image: &DynamicImage) -> bool {
        let share = self.white_share(image);
        let blank = share >= self.white_ratio;
        debug!(white_share = share, blank, "Blank page check");
        blank
    }
}

impl Default for BlankDetector {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}
