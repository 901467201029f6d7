// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PaddleOCR models through `oar-ocr` — a text recognizer that scores every
// line it reads, and the page orientation classifier.
//
// # Feature Gate
//
// This module is only available when the `oar` feature is enabled:
//
// ```toml
// pagesort-document = { path = "crates/pagesort-document", features = ["oar"] }
// ```
//
// # Model Setup
//
// A model directory holds the ONNX exports of the PaddleOCR models:
//
// - `PP-OCRv5_mobile_det.onnx`: text line detection.
// - `PP-OCRv5_mobile_rec.onnx`: line recognition.
// - `ppocrv5_dict.txt`: character dictionary for the recognizer.
// - `PP-LCNet_x1_0_doc_ori.onnx`: page orientation (optional).
//
// # Confidence
//
// The recognizer returns a score for every line it decodes. A call's
// confidence is the mean over all returned lines.

use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage};
use oar_ocr::core::traits::StandardPredictor;
use oar_ocr::predictor::{
    DocOrientationClassifier, DocOrientationClassifierBuilder, TextDetPredictor,
    TextDetPredictorBuilder, TextRecPredictor, TextRecPredictorBuilder,
};
use pagesort_core::error::{PagesortError, Result};
use pagesort_core::types::Recognition;
use tracing::{debug, info, instrument};

use crate::scan::traits::{Orientation, OrientationClassifier, TextRecognizer};

const DETECTION_MODEL_FILENAME: &str = "PP-OCRv5_mobile_det.onnx";
const RECOGNITION_MODEL_FILENAME: &str = "PP-OCRv5_mobile_rec.onnx";
const CHARACTER_DICT_FILENAME: &str = "ppocrv5_dict.txt";

/// File name of the page orientation model inside a model directory.
pub const ORIENTATION_MODEL_FILENAME: &str = "PP-LCNet_x1_0_doc_ori.onnx";

/// Recognizer input tensor: channels, height, width.
const RECOGNITION_INPUT_SHAPE: [usize; 3] = [3, 48, 320];
const ORIENTATION_INPUT_SHAPE: (u32, u32) = (224, 224);

/// Locations of the recognizer's model files.
#[derive(Debug, Clone)]
pub struct OarConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
    pub character_dict_path: PathBuf,
}

impl OarConfig {
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
            character_dict_path: dir.join(CHARACTER_DICT_FILENAME),
        }
    }

    /// Verify that every model file exists.
    pub fn validate(&self) -> Result<()> {
        for path in [
            &self.detection_model_path,
            &self.recognition_model_path,
            &self.character_dict_path,
        ] {
            require_file(path)?;
        }
        Ok(())
    }
}

/// Path of the orientation model in `dir`, if it is there.
pub fn orientation_model_in(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(ORIENTATION_MODEL_FILENAME);
    path.is_file().then_some(path)
}

/// [`TextRecognizer`] over PaddleOCR detection and recognition models.
///
/// Detected lines are cropped to their bounding rectangles and recognised in
/// reading order, top to bottom, then left to right.
pub struct OarRecognizer {
    detector: TextDetPredictor,
    recognizer: TextRecPredictor,
}

impl OarRecognizer {
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: &OarConfig) -> Result<Self> {
        config.validate()?;

        let dictionary: Vec<String> = std::fs::read_to_string(&config.character_dict_path)?
            .lines()
            .map(str::to_string)
            .collect();

        let detector = TextDetPredictorBuilder::new()
            .build(config.detection_model_path.as_path())
            .map_err(|err| engine_error("failed to load detection model", err))?;
        let recognizer = TextRecPredictorBuilder::new()
            .model_input_shape(RECOGNITION_INPUT_SHAPE)
            .character_dict(dictionary)
            .build(config.recognition_model_path.as_path())
            .map_err(|err| engine_error("failed to load recognition model", err))?;

        info!("oar-ocr recognizer initialised");
        Ok(Self {
            detector,
            recognizer,
        })
    }

    pub fn from_model_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::new(&OarConfig::from_dir(dir))
    }
}

impl TextRecognizer for OarRecognizer {
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &DynamicImage) -> Result<Recognition> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let detection = self
            .detector
            .predict(vec![rgb.clone()], None)
            .map_err(|err| engine_error("text detection failed", err))?;

        let mut lines: Vec<LineBox> = detection
            .dt_polys
            .first()
            .map(|polys| {
                polys
                    .iter()
                    .filter_map(|poly| {
                        LineBox::enclosing(poly.points.iter().map(|p| (p.x, p.y)), width, height)
                    })
                    .collect()
            })
            .unwrap_or_default();
        if lines.is_empty() {
            debug!("No text lines detected");
            return Ok(Recognition::empty());
        }
        lines.sort_by_key(|line| (line.y, line.x));

        let crops: Vec<RgbImage> = lines
            .iter()
            .map(|line| image::imageops::crop_imm(&rgb, line.x, line.y, line.width, line.height).to_image())
            .collect();

        let recognised = self
            .recognizer
            .predict(crops, None)
            .map_err(|err| engine_error("line recognition failed", err))?;

        let recognition = Recognition::from_scored_lines(
            recognised
                .rec_text
                .iter()
                .zip(recognised.rec_score.iter().copied()),
        );
        debug!(
            detected_lines = lines.len(),
            recognised_lines = recognised.rec_text.len(),
            confidence = recognition.confidence,
            "OCR recognition complete"
        );
        Ok(recognition)
    }
}

/// [`OrientationClassifier`] over the PP-LCNet document orientation model.
///
/// Labels are the page's rotation class (0, 90, 180 or 270) with the model's
/// top score as confidence.
pub struct OarOrientationClassifier {
    classifier: DocOrientationClassifier,
}

impl OarOrientationClassifier {
    #[instrument(skip_all, fields(model = %model_path.display()))]
    pub fn new(model_path: &Path) -> Result<Self> {
        require_file(model_path)?;
        let classifier = DocOrientationClassifierBuilder::new()
            .topk(1)
            .input_shape(ORIENTATION_INPUT_SHAPE)
            .build(model_path)
            .map_err(|err| engine_error("failed to load orientation model", err))?;
        info!("Orientation classifier initialised");
        Ok(Self { classifier })
    }
}

impl OrientationClassifier for OarOrientationClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Orientation> {
        let result = self
            .classifier
            .predict(vec![image.to_rgb8()], None)
            .map_err(|err| engine_error("orientation classification failed", err))?;

        let label = result.label_names.first().and_then(|labels| labels.first());
        let score = result.scores.first().and_then(|scores| scores.first());
        match (label, score) {
            (Some(label), Some(&score)) => Orientation::from_label(label, score).ok_or_else(|| {
                PagesortError::OcrError(format!("unexpected orientation label `{}`", label))
            }),
            _ => Err(PagesortError::OcrError(
                "orientation model returned no prediction".into(),
            )),
        }
    }
}

/// Axis-aligned crop rectangle of one detected line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineBox {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl LineBox {
    /// Bounding rectangle of `points`, clipped to a `width` x `height` image.
    /// `None` when nothing of it lies inside the image.
    fn enclosing<I>(points: I, width: u32, height: u32) -> Option<Self>
    where
        I: IntoIterator<Item = (f32, f32)>,
    {
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for (x, y) in points {
            if !(x.is_finite() && y.is_finite()) {
                continue;
            }
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let left = min_x.floor().max(0.0) as u32;
        let top = min_y.floor().max(0.0) as u32;
        let right = (max_x.ceil().max(0.0) as u32).min(width);
        let bottom = (max_y.ceil().max(0.0) as u32).min(height);
        if !min_x.is_finite() || right <= left || bottom <= top {
            return None;
        }
        Some(Self {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        })
    }
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PagesortError::OcrError(format!(
            "model not found at {}",
            path.display()
        )))
    }
}

fn engine_error(context: &str, err: impl std::fmt::Display) -> PagesortError {
    PagesortError::OcrError(format!("{}: {}", context, err))
}
