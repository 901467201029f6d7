// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page pipeline — drives one document's pages, in order, through blank
// detection, orientation correction, the ROI decision policy and full-page
// fallback, then groups the resulting records.

use std::time::{Duration, Instant};

use image::DynamicImage;
use pagesort_classify::{Classification, PageClassifier, group_pages};
use pagesort_core::PipelineConfig;
use pagesort_core::error::Result;
use pagesort_core::types::{DocumentGroup, PageFailure, PageRecord, Recognition, RoiRegion};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::scan::blank::BlankDetector;
use crate::scan::orientation::OrientationNormalizer;
use crate::scan::roi::{RoiDecision, RoiPolicy};
use crate::scan::traits::{ImageRotator, OrientationClassifier, PageRenderer, TextRecognizer};

/// Everything produced for one source document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    pub pdf_name: String,
    pub total_pages: u32,
    /// One record per page that was processed, in page order.
    pub records: Vec<PageRecord>,
    pub groups: Vec<DocumentGroup>,
    /// Pages left out of `records`.
    pub failures: Vec<PageFailure>,
    /// Pages decided from a header or footer band alone.
    pub roi_count: usize,
    pub elapsed: Duration,
}

impl DocumentOutcome {
    pub fn functional_pages(&self) -> usize {
        self.records.iter().filter(|r| r.functional).count()
    }

    pub fn non_functional_pages(&self) -> usize {
        self.records.len() - self.functional_pages()
    }

    pub fn blank_pages(&self) -> usize {
        self.records.iter().filter(|r| r.is_blank).count()
    }
}

/// Whether the page after `record` should try its footer band first.
///
/// A page that needed full-page OCR and turned out functional is usually the
/// start of a multi-page document whose continuation pages repeat only the
/// footer.
pub fn needs_footer_next(config: &PipelineConfig, record: &PageRecord) -> bool {
    config.footer_hint && record.functional && !record.used_roi && !record.is_blank
}

/// Classifies the pages of one document.
pub struct PageProcessor<'a> {
    config: &'a PipelineConfig,
    classifier: &'a PageClassifier,
    recognizer: &'a dyn TextRecognizer,
    normalizer: OrientationNormalizer<'a>,
    blank: BlankDetector,
}

impl<'a> PageProcessor<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        classifier: &'a PageClassifier,
        recognizer: &'a dyn TextRecognizer,
        orientation: &'a dyn OrientationClassifier,
        rotator: &'a dyn ImageRotator,
    ) -> Self {
        Self {
            config,
            classifier,
            recognizer,
            normalizer: OrientationNormalizer::new(orientation, rotator, config),
            blank: BlankDetector::from_config(config),
        }
    }

    /// Classify one page image.
    ///
    /// Only a failed full-page recognition is an error; region failures fall
    /// back and orientation failures leave the page as scanned.
    #[instrument(skip(self, image), fields(page = page_number))]
    pub fn process_page(
        &self,
        page_number: u32,
        image: DynamicImage,
        need_footer: bool,
    ) -> Result<PageRecord> {
        if self.config.detect_blank_pages && self.blank.is_blank(&image) {
            info!("Blank page, skipping OCR");
            return Ok(PageRecord::blank(page_number));
        }

        let (image, rotation) = self.normalizer.normalize(page_number, image);

        let policy = RoiPolicy::new(self.config, self.classifier);
        let (recognition, classification, region) =
            match policy.attempt(&image, self.recognizer, need_footer) {
                RoiDecision::Accepted(accepted) => (
                    accepted.recognition,
                    accepted.classification,
                    Some(accepted.region),
                ),
                RoiDecision::FallbackRequired(reason) => {
                    debug!(%reason, "Falling back to full-page OCR");
                    let recognition = self.recognizer.recognize(&image)?;
                    let classification = self.classifier.classify(&recognition.text);
                    (recognition, classification, None)
                }
            };

        let record = build_record(page_number, recognition, &classification, region, rotation);
        info!(
            doc_type = %record.document_type,
            functional = record.functional,
            used_roi = record.used_roi,
            keywords = record.keywords_found.len(),
            confidence = record.ocr_confidence,
            "Page classified"
        );
        Ok(record)
    }

    /// Process every page of `renderer` in ascending order and group the
    /// results. Pages that cannot be rendered or recognised are recorded as
    /// failures and skipped.
    #[instrument(skip(self, renderer), fields(pdf = pdf_name))]
    pub fn process_document(&self, pdf_name: &str, renderer: &dyn PageRenderer) -> DocumentOutcome {
        let started = Instant::now();
        let total_pages = renderer.page_count();
        let mut records = Vec::with_capacity(total_pages as usize);
        let mut failures = Vec::new();
        let mut need_footer = false;

        for page_number in 1..=total_pages {
            info!("Processing page {}/{}", page_number, total_pages);

            let result = renderer
                .render_page(page_number)
                .and_then(|image| self.process_page(page_number, image, need_footer));

            match result {
                Ok(record) => {
                    need_footer = needs_footer_next(self.config, &record);
                    records.push(record);
                }
                Err(err) => {
                    warn!(page = page_number, %err, "Page skipped");
                    need_footer = false;
                    failures.push(PageFailure {
                        page_number,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let groups = group_pages(&records);
        let roi_count = records.iter().filter(|r| r.used_roi).count();
        let outcome = DocumentOutcome {
            pdf_name: pdf_name.to_string(),
            total_pages,
            records,
            groups,
            failures,
            roi_count,
            elapsed: started.elapsed(),
        };

        info!(
            pages = outcome.records.len(),
            functional = outcome.functional_pages(),
            groups = outcome.groups.len(),
            failed = outcome.failures.len(),
            roi = outcome.roi_count,
            "Document processed"
        );
        outcome
    }
}

fn build_record(
    page_number: u32,
    recognition: Recognition,
    classification: &Classification,
    region: Option<RoiRegion>,
    rotation: Option<i32>,
) -> PageRecord {
    PageRecord {
        page_number,
        document_type: classification.doc_type().to_string(),
        functional: classification.is_functional(),
        ocr_confidence: recognition.confidence,
        keywords_found: classification.keywords(),
        used_roi: region.is_some(),
        roi_region: region,
        rotation_applied: rotation,
        is_blank: false,
        text: recognition.text,
    }
}
