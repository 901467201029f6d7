// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end page pipeline scenarios driven by scripted OCR, orientation and
// rendering fakes.

use std::cell::RefCell;
use std::collections::HashMap;

use image::{DynamicImage, GrayImage, Luma};
use pagesort_classify::PageClassifier;
use pagesort_core::error::{PagesortError, Result};
use pagesort_core::profiles::{ProfileTable, TypeProfile};
use pagesort_core::types::{Recognition, RoiRegion};
use pagesort_core::PipelineConfig;
use pagesort_document::{
    ExpandingRotator, Orientation, OrientationClassifier, PageProcessor, PageRenderer,
    TextRecognizer, UprightClassifier,
};

const PAGE_HEIGHT: u32 = 1000;
const HEADER_HEIGHT: u32 = 400;
const FOOTER_HEIGHT: u32 = 300;

const INVOICE_HEADER: &str =
    "COMMERCIAL INVOICE No 2026-0413  Bill To: Northwind  Total 554.40  Tax 50.40  Amount Due 554.40";
const INVOICE_FULL: &str = "COMMERCIAL INVOICE No 2026-0413 Bill To: Northwind Traders \
     Description Quantity Total 554.40 Tax 50.40 Amount Due 554.40 Subtotal 504.00";
const INVOICE_FOOTER: &str = "Invoice 2026-0413 page 2 of 2  Subtotal 504.00 Total 554.40 Tax 50.40 Amount Due 554.40";
const CERTIFICATE_FULL: &str = "CERTIFICATE OF ORIGIN  We certify the goods originate in the country stated";

#[derive(Clone, Copy)]
enum Band {
    Header,
    Footer,
    Full,
}

/// Pages are told apart by width: page `n` is `100 + n` pixels wide.
fn page_width(page: u32) -> u32 {
    100 + page
}

fn page_image(page: u32) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(page_width(page), PAGE_HEIGHT, Luma([128u8])))
}

fn key(page: u32, band: Band) -> (u32, u32) {
    let height = match band {
        Band::Header => HEADER_HEIGHT,
        Band::Footer => FOOTER_HEIGHT,
        Band::Full => PAGE_HEIGHT,
    };
    (page_width(page), height)
}

/// Answers OCR calls by image size; unscripted calls recognise nothing.
#[derive(Default)]
struct ScriptedRecognizer {
    responses: HashMap<(u32, u32), Option<Recognition>>,
    calls: RefCell<Vec<(u32, u32)>>,
}

impl ScriptedRecognizer {
    fn on(mut self, page: u32, band: Band, text: &str, confidence: f32) -> Self {
        self.responses
            .insert(key(page, band), Some(Recognition::new(text, confidence)));
        self
    }

    fn on_size(mut self, size: (u32, u32), text: &str, confidence: f32) -> Self {
        self.responses
            .insert(size, Some(Recognition::new(text, confidence)));
        self
    }

    fn failing(mut self, page: u32, band: Band) -> Self {
        self.responses.insert(key(page, band), None);
        self
    }

    fn called(&self, page: u32, band: Band) -> bool {
        self.calls.borrow().contains(&key(page, band))
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<Recognition> {
        let size = (image.width(), image.height());
        self.calls.borrow_mut().push(size);
        match self.responses.get(&size) {
            Some(Some(recognition)) => Ok(recognition.clone()),
            Some(None) => Err(PagesortError::OcrError("engine crashed".into())),
            None => Ok(Recognition::empty()),
        }
    }
}

/// Reports a fixed orientation for chosen page widths, upright otherwise.
#[derive(Default)]
struct ScriptedOrientation {
    angles: HashMap<u32, Orientation>,
}

impl OrientationClassifier for ScriptedOrientation {
    fn classify(&self, image: &DynamicImage) -> Result<Orientation> {
        Ok(self
            .angles
            .get(&image.width())
            .copied()
            .unwrap_or_else(Orientation::upright))
    }
}

/// Renders `count` pages, failing those listed in `broken`.
struct FakeRenderer {
    count: u32,
    broken: Vec<u32>,
    blank: Vec<u32>,
}

impl FakeRenderer {
    fn pages(count: u32) -> Self {
        Self {
            count,
            broken: Vec::new(),
            blank: Vec::new(),
        }
    }
}

impl PageRenderer for FakeRenderer {
    fn page_count(&self) -> u32 {
        self.count
    }

    fn render_page(&self, page_number: u32) -> Result<DynamicImage> {
        if self.broken.contains(&page_number) {
            return Err(PagesortError::Render {
                page: page_number,
                reason: "corrupt image stream".into(),
            });
        }
        if self.blank.contains(&page_number) {
            return Ok(DynamicImage::ImageLuma8(GrayImage::from_pixel(
                page_width(page_number),
                PAGE_HEIGHT,
                Luma([255u8]),
            )));
        }
        Ok(page_image(page_number))
    }
}

fn table() -> ProfileTable {
    ProfileTable::new(vec![
        TypeProfile::new("INVOICE", &["invoice", "commercial invoice"])
            .with_secondary(&["total", "tax", "amount due", "bill to", "subtotal"])
            .min_secondary(3)
            .functional(true),
        TypeProfile::new("CERTIFICATE_ORIGIN", &["certificate of origin"])
            .with_secondary(&["country", "certify"])
            .min_secondary(2),
    ])
    .unwrap()
}

struct Harness {
    config: PipelineConfig,
    classifier: PageClassifier,
}

impl Harness {
    fn new(config: PipelineConfig) -> Self {
        let classifier = PageClassifier::new(&table(), &config);
        Self { config, classifier }
    }

    fn processor<'a>(
        &'a self,
        recognizer: &'a dyn TextRecognizer,
        orientation: &'a dyn OrientationClassifier,
    ) -> PageProcessor<'a> {
        PageProcessor::new(
            &self.config,
            &self.classifier,
            recognizer,
            orientation,
            &ExpandingRotator,
        )
    }
}

// ============================================================================
// ROI decision
// ============================================================================

#[test]
fn confident_header_is_accepted_without_full_page_ocr() {
    let harness = Harness::new(PipelineConfig::default());
    let recognizer = ScriptedRecognizer::default().on(1, Band::Header, INVOICE_HEADER, 0.9);
    let processor = harness.processor(&recognizer, &UprightClassifier);

    let record = processor.process_page(1, page_image(1), false).unwrap();

    assert_eq!(record.document_type, "INVOICE");
    assert!(record.functional);
    assert!(record.used_roi);
    assert_eq!(record.roi_region, Some(RoiRegion::Header));
    assert_eq!(record.ocr_confidence, 0.9);
    assert!(!recognizer.called(1, Band::Full), "full page must not be recognised");
}

#[test]
fn low_confidence_header_falls_back_to_full_page() {
    let harness = Harness::new(PipelineConfig::default());
    let recognizer = ScriptedRecognizer::default()
        .on(1, Band::Header, INVOICE_HEADER, 0.5)
        .on(1, Band::Full, INVOICE_FULL, 0.95);
    let processor = harness.processor(&recognizer, &UprightClassifier);

    let record = processor.process_page(1, page_image(1), false).unwrap();

    assert!(recognizer.called(1, Band::Full));
    assert!(!record.used_roi);
    assert_eq!(record.roi_region, None);
    assert_eq!(record.document_type, "INVOICE");
    assert_eq!(record.ocr_confidence, 0.95);
    assert_eq!(record.text, INVOICE_FULL);
}

#[test]
fn disabled_roi_goes_straight_to_full_page() {
    let harness = Harness::new(PipelineConfig {
        enable_roi_ocr: false,
        ..PipelineConfig::default()
    });
    let recognizer = ScriptedRecognizer::default()
        .on(1, Band::Header, INVOICE_HEADER, 0.99)
        .on(1, Band::Full, INVOICE_FULL, 0.9);
    let processor = harness.processor(&recognizer, &UprightClassifier);

    let record = processor.process_page(1, page_image(1), false).unwrap();

    assert!(!recognizer.called(1, Band::Header));
    assert_eq!(recognizer.calls.borrow().len(), 1);
    assert!(!record.used_roi);
    assert_eq!(record.document_type, "INVOICE");
}

#[test]
fn region_failure_falls_back_instead_of_failing() {
    let harness = Harness::new(PipelineConfig::default());
    let recognizer = ScriptedRecognizer::default()
        .failing(1, Band::Header)
        .on(1, Band::Full, CERTIFICATE_FULL, 0.88);
    let processor = harness.processor(&recognizer, &UprightClassifier);

    let record = processor.process_page(1, page_image(1), false).unwrap();

    assert!(!record.used_roi);
    assert_eq!(record.document_type, "CERTIFICATE_ORIGIN");
    assert!(!record.functional);
}

#[test]
fn full_page_failure_is_a_page_error() {
    let harness = Harness::new(PipelineConfig::default());
    let recognizer = ScriptedRecognizer::default().failing(1, Band::Full);
    let processor = harness.processor(&recognizer, &UprightClassifier);

    assert!(processor.process_page(1, page_image(1), false).is_err());
}

#[test]
fn unreadable_page_is_unknown_and_not_functional() {
    let harness = Harness::new(PipelineConfig::default());
    let recognizer = ScriptedRecognizer::default();
    let processor = harness.processor(&recognizer, &UprightClassifier);

    let record = processor.process_page(1, page_image(1), false).unwrap();

    assert!(record.is_unknown());
    assert!(!record.functional);
    assert!(record.keywords_found.is_empty());
}

// ============================================================================
// Orientation
// ============================================================================

#[test]
fn sideways_page_is_corrected_before_ocr() {
    let harness = Harness::new(PipelineConfig::default());
    // After a -90 degree correction the page is PAGE_HEIGHT wide and
    // page_width(1) tall.
    let rotated_full = (PAGE_HEIGHT, page_width(1));
    let recognizer = ScriptedRecognizer::default().on_size(rotated_full, INVOICE_FULL, 0.9);
    let orientation = ScriptedOrientation {
        angles: HashMap::from([(page_width(1), Orientation::new(90.0, 0.93))]),
    };
    let processor = harness.processor(&recognizer, &orientation);

    let record = processor.process_page(1, page_image(1), false).unwrap();

    assert_eq!(record.rotation_applied, Some(-90));
    assert_eq!(record.document_type, "INVOICE");
    assert!(recognizer.calls.borrow().contains(&rotated_full));
}

#[test]
fn unsure_orientation_leaves_page_alone() {
    let harness = Harness::new(PipelineConfig::default());
    let recognizer = ScriptedRecognizer::default().on(1, Band::Full, INVOICE_FULL, 0.9);
    let orientation = ScriptedOrientation {
        angles: HashMap::from([(page_width(1), Orientation::new(180.0, 0.4))]),
    };
    let processor = harness.processor(&recognizer, &orientation);

    let record = processor.process_page(1, page_image(1), false).unwrap();

    assert_eq!(record.rotation_applied, None);
    assert!(recognizer.called(1, Band::Full));
}

// ============================================================================
// Whole documents
// ============================================================================

#[test]
fn five_page_document_yields_two_invoice_groups() {
    let harness = Harness::new(PipelineConfig {
        footer_hint: false,
        ..PipelineConfig::default()
    });
    let recognizer = ScriptedRecognizer::default()
        .on(1, Band::Full, INVOICE_FULL, 0.9)
        .on(2, Band::Header, INVOICE_HEADER, 0.9)
        .on(3, Band::Full, CERTIFICATE_FULL, 0.9)
        .on(4, Band::Full, INVOICE_FULL, 0.9)
        .on(5, Band::Full, INVOICE_FULL, 0.9);
    let processor = harness.processor(&recognizer, &UprightClassifier);

    let outcome = processor.process_document("batch.pdf", &FakeRenderer::pages(5));

    assert_eq!(outcome.total_pages, 5);
    assert_eq!(outcome.records.len(), 5);
    assert_eq!(outcome.roi_count, 1);
    assert_eq!(outcome.functional_pages(), 4);
    assert_eq!(outcome.non_functional_pages(), 1);

    assert_eq!(outcome.groups.len(), 2);
    assert_eq!(outcome.groups[0].doc_type, "INVOICE");
    assert_eq!(outcome.groups[0].pages, vec![1, 2]);
    assert_eq!(outcome.groups[1].doc_type, "INVOICE");
    assert_eq!(outcome.groups[1].pages, vec![4, 5]);
    assert!(outcome.groups.iter().all(|g| !g.pages.contains(&3)));
}

#[test]
fn failed_pages_are_skipped_and_processing_continues() {
    let harness = Harness::new(PipelineConfig::default());
    let recognizer = ScriptedRecognizer::default()
        .on(1, Band::Full, INVOICE_FULL, 0.9)
        .failing(3, Band::Full)
        .on(4, Band::Full, INVOICE_FULL, 0.9);
    let processor = harness.processor(&recognizer, &UprightClassifier);
    let renderer = FakeRenderer {
        broken: vec![2],
        ..FakeRenderer::pages(4)
    };

    let outcome = processor.process_document("partial.pdf", &renderer);

    let processed: Vec<u32> = outcome.records.iter().map(|r| r.page_number).collect();
    assert_eq!(processed, vec![1, 4]);
    let failed: Vec<u32> = outcome.failures.iter().map(|f| f.page_number).collect();
    assert_eq!(failed, vec![2, 3]);
    // The gap keeps pages 1 and 4 in separate documents.
    assert_eq!(outcome.groups.len(), 2);
}

#[test]
fn page_after_full_page_invoice_tries_footer_first() {
    let harness = Harness::new(PipelineConfig::default());
    let recognizer = ScriptedRecognizer::default()
        .on(1, Band::Full, INVOICE_FULL, 0.9)
        .on(2, Band::Footer, INVOICE_FOOTER, 0.9);
    let processor = harness.processor(&recognizer, &UprightClassifier);

    let outcome = processor.process_document("hint.pdf", &FakeRenderer::pages(2));

    assert!(recognizer.called(2, Band::Footer));
    assert!(!recognizer.called(2, Band::Header));
    let second = &outcome.records[1];
    assert!(second.used_roi);
    assert_eq!(second.roi_region, Some(RoiRegion::Footer));
    assert_eq!(outcome.groups.len(), 1);
    assert_eq!(outcome.groups[0].pages, vec![1, 2]);
}

#[test]
fn blank_pages_skip_ocr_when_detection_is_on() {
    let harness = Harness::new(PipelineConfig {
        detect_blank_pages: true,
        ..PipelineConfig::default()
    });
    let recognizer = ScriptedRecognizer::default().on(1, Band::Full, INVOICE_FULL, 0.9);
    let processor = harness.processor(&recognizer, &UprightClassifier);
    let renderer = FakeRenderer {
        blank: vec![2],
        ..FakeRenderer::pages(2)
    };

    let outcome = processor.process_document("blank.pdf", &renderer);

    assert_eq!(outcome.blank_pages(), 1);
    let blank = &outcome.records[1];
    assert!(blank.is_blank);
    assert!(blank.is_unknown());
    assert!(!recognizer.called(2, Band::Full));
    assert!(!recognizer.called(2, Band::Header));
}
