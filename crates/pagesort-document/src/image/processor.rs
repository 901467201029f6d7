// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — band cropping for region OCR and canvas-expanding rotation
// for orientation correction. Operates on in-memory images using the `image`
// and `imageproc` crates.

use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{self, Interpolation, Projection};
use pagesort_core::error::{PagesortError, Result};
use pagesort_core::types::RoiRegion;
use tracing::{debug, instrument};

use crate::scan::traits::ImageRotator;

/// Fill for canvas area uncovered by a rotation: opaque white, like paper.
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Image processing pipeline operating on a single in-memory page image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping the
/// transformed image, enabling method chaining.
///
/// ```ignore
/// let header = ImageProcessor::from_dynamic(page)
///     .rotate(-90.0)
///     .header_band(0.40)
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| PagesortError::ImageError(format!("failed to decode image: {}", err)))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Resize to fit within `max_width` x `max_height`, preserving aspect
    /// ratio. Uses Lanczos3 filtering for high-quality downscaling.
    #[instrument(skip(self), fields(max_width, max_height))]
    pub fn resize(self, max_width: u32, max_height: u32) -> Self {
        let resized = self.image.resize(
            max_width.max(1),
            max_height.max(1),
            image::imageops::FilterType::Lanczos3,
        );
        debug!(
            new_w = resized.width(),
            new_h = resized.height(),
            "Resize complete"
        );
        Self { image: resized }
    }

    /// Crop a rectangular region. Values are clamped to image bounds.
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.min(img_w - safe_x);
        let safe_h = height.min(img_h - safe_y);

        let cropped = self.image.crop_imm(safe_x, safe_y, safe_w, safe_h);
        Self { image: cropped }
    }

    /// Full-width band covering the top `fraction` of the page height.
    pub fn header_band(self, fraction: f32) -> Self {
        let band = band_height(self.height(), fraction);
        let width = self.width();
        self.crop(0, 0, width, band)
    }

    /// Full-width band covering the bottom `fraction` of the page height.
    pub fn footer_band(self, fraction: f32) -> Self {
        let height = self.height();
        let band = band_height(height, fraction);
        let width = self.width();
        self.crop(0, height.saturating_sub(band), width, band)
    }

    /// Band for `region`, using the matching fraction.
    pub fn region_band(self, region: RoiRegion, header_fraction: f32, footer_fraction: f32) -> Self {
        match region {
            RoiRegion::Header => self.header_band(header_fraction),
            RoiRegion::Footer => self.footer_band(footer_fraction),
        }
    }

    /// Rotate by an arbitrary angle in degrees (clockwise).
    ///
    /// Multiples of 90 use lossless rotation. Other angles use bilinear
    /// interpolation onto a canvas enlarged to the rotated bounding box, so no
    /// corner of the page is cut off.
    #[instrument(skip(self), fields(degrees))]
    pub fn rotate(self, degrees: f32) -> Self {
        let normalised = degrees.rem_euclid(360.0);
        if (normalised - 90.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate90(),
            };
        }
        if (normalised - 180.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate180(),
            };
        }
        if (normalised - 270.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate270(),
            };
        }
        if normalised < 0.01 || (normalised - 360.0).abs() < 0.01 {
            return self;
        }

        let rgba = self.image.to_rgba8();
        let rotated = rotate_expanding(&rgba, degrees.to_radians());
        debug!(
            width = rotated.width(),
            height = rotated.height(),
            "General rotation applied"
        );
        Self {
            image: DynamicImage::ImageRgba8(rotated),
        }
    }
}

/// Rows in a band covering `fraction` of `height`, at least one.
fn band_height(height: u32, fraction: f32) -> u32 {
    let rows = (height as f32 * fraction.clamp(0.0, 1.0)) as u32;
    rows.clamp(1, height.max(1))
}

/// Rotate about the centre onto a canvas sized to the rotated bounding box.
fn rotate_expanding(image: &RgbaImage, radians: f32) -> RgbaImage {
    let (w, h) = (image.width() as f32, image.height() as f32);
    let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
    let new_w = (w * cos + h * sin).ceil().max(1.0);
    let new_h = (w * sin + h * cos).ceil().max(1.0);

    let projection = Projection::translate(new_w / 2.0, new_h / 2.0)
        * Projection::rotate(radians)
        * Projection::translate(-w / 2.0, -h / 2.0);

    let mut out = RgbaImage::from_pixel(new_w as u32, new_h as u32, BACKGROUND);
    geometric_transformations::warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        BACKGROUND,
        &mut out,
    );
    out
}

/// [`ImageRotator`] backed by [`ImageProcessor::rotate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandingRotator;

impl ImageRotator for ExpandingRotator {
    fn rotate(&self, image: &DynamicImage, degrees: f32) -> Result<DynamicImage> {
        if !degrees.is_finite() {
            return Err(PagesortError::ImageError(format!(
                "cannot rotate by {} degrees",
                degrees
            )));
        }
        Ok(ImageProcessor::from_dynamic(image.clone())
            .rotate(degrees)
            .into_dynamic())
    }
}
