// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Report sinks — per-document JSON and text reports, and the batch CSV
// summary with one row per source PDF.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use pagesort_core::error::{PagesortError, Result};
use pagesort_core::types::{DocumentGroup, PageFailure, PageRecord};
use pagesort_document::{DocumentOutcome, GeneratedDocument};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Pages given their own column pair in the CSV summary.
pub const SUMMARY_PAGE_COLUMNS: u32 = 10;

const RULE_HEAVY: &str =
    "======================================================================";
const RULE_LIGHT: &str =
    "----------------------------------------------------------------------";

/// A page record with a bounded preview of its recognised text.
#[derive(Debug, Clone, Serialize)]
pub struct PageEntry {
    #[serde(flatten)]
    pub record: PageRecord,
    pub text_preview: String,
}

/// Everything reported for one processed PDF.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub pdf_name: String,
    pub pdf_path: PathBuf,
    /// SHA-256 of the source file.
    pub sha256: String,
    pub processed_at: DateTime<Utc>,
    pub total_pages: u32,
    pub functional_pages: usize,
    pub non_functional_pages: usize,
    pub blank_pages: usize,
    /// Pages decided from a header or footer band alone.
    pub roi_optimizations: usize,
    pub processing_seconds: f64,
    pub classifications: Vec<PageEntry>,
    pub document_groups: Vec<DocumentGroup>,
    pub generated_files: Vec<GeneratedDocument>,
    pub failed_pages: Vec<PageFailure>,
}

impl DocumentReport {
    pub fn new(
        outcome: DocumentOutcome,
        pdf_path: &Path,
        sha256: String,
        generated_files: Vec<GeneratedDocument>,
        preview_chars: usize,
    ) -> Self {
        let functional_pages = outcome.functional_pages();
        let non_functional_pages = outcome.non_functional_pages();
        let blank_pages = outcome.blank_pages();

        let classifications = outcome
            .records
            .into_iter()
            .map(|record| PageEntry {
                text_preview: record.text.chars().take(preview_chars).collect(),
                record,
            })
            .collect();

        Self {
            pdf_name: outcome.pdf_name,
            pdf_path: pdf_path.to_path_buf(),
            sha256,
            processed_at: Utc::now(),
            total_pages: outcome.total_pages,
            functional_pages,
            non_functional_pages,
            blank_pages,
            roi_optimizations: outcome.roi_count,
            processing_seconds: outcome.elapsed.as_secs_f64(),
            classifications,
            document_groups: outcome.groups,
            generated_files,
            failed_pages: outcome.failures,
        }
    }

    /// File name without its extension, used to name every output.
    pub fn stem(&self) -> &str {
        Path::new(&self.pdf_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.pdf_name)
    }

    fn record(&self, page_number: u32) -> Option<&PageRecord> {
        self.classifications
            .iter()
            .map(|entry| &entry.record)
            .find(|record| record.page_number == page_number)
    }
}

/// Paths written by [`ReportWriter::write`].
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub json: PathBuf,
    pub text: PathBuf,
}

/// Writes the JSON and text report of each document into one directory.
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[instrument(skip_all, fields(pdf = %report.pdf_name))]
    pub fn write(&self, report: &DocumentReport) -> Result<ReportFiles> {
        std::fs::create_dir_all(&self.dir)?;
        let stem = report.stem();

        let json = self.dir.join(format!("{stem}_classification.json"));
        std::fs::write(&json, serde_json::to_string_pretty(report)?)?;

        let text = self.dir.join(format!("{stem}_report.txt"));
        std::fs::write(&text, render_text(report))?;

        debug!(json = %json.display(), text = %text.display(), "Reports written");
        Ok(ReportFiles { json, text })
    }
}

/// Human-readable report for one document.
pub fn render_text(report: &DocumentReport) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_text(&mut out, report);
    out
}

fn write_text(out: &mut String, report: &DocumentReport) -> std::fmt::Result {
    writeln!(out, "{RULE_HEAVY}")?;
    writeln!(out, "CLASSIFICATION REPORT")?;
    writeln!(out, "{RULE_HEAVY}")?;
    writeln!(out)?;
    writeln!(out, "Document: {}", report.pdf_name)?;
    writeln!(out, "SHA-256: {}", report.sha256)?;
    writeln!(out, "Processed: {}", report.processed_at.to_rfc3339())?;
    writeln!(out, "Total pages: {}", report.total_pages)?;
    writeln!(out, "Functional: {}", report.functional_pages)?;
    writeln!(out, "Removed: {}", report.non_functional_pages)?;
    if report.blank_pages > 0 {
        writeln!(out, "Blank: {}", report.blank_pages)?;
    }
    writeln!(out, "Decided from header/footer: {}", report.roi_optimizations)?;
    writeln!(out, "Time: {:.2}s", report.processing_seconds)?;
    writeln!(out)?;

    writeln!(out, "{RULE_LIGHT}")?;
    writeln!(out, "CLASSIFICATION BY PAGE")?;
    writeln!(out, "{RULE_LIGHT}")?;
    writeln!(out)?;
    for entry in &report.classifications {
        let page = &entry.record;
        let status = if page.functional { "KEEP" } else { "REMOVE" };
        write!(out, "Page {}: {} - {}", page.page_number, page.document_type, status)?;
        if let Some(region) = page.roi_region {
            write!(out, " [{region} only]")?;
        }
        if let Some(degrees) = page.rotation_applied {
            write!(out, " [rotated {degrees}]")?;
        }
        if page.is_blank {
            write!(out, " [blank]")?;
        }
        writeln!(out)?;
        writeln!(out, "  Keywords: {}", page.keywords_found.join(", "))?;
        writeln!(out, "  Confidence: {:.1}%", page.ocr_confidence * 100.0)?;
        writeln!(out)?;
    }

    if !report.failed_pages.is_empty() {
        writeln!(out, "{RULE_LIGHT}")?;
        writeln!(out, "FAILED PAGES")?;
        writeln!(out, "{RULE_LIGHT}")?;
        writeln!(out)?;
        for failure in &report.failed_pages {
            writeln!(out, "Page {}: {}", failure.page_number, failure.reason)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{RULE_LIGHT}")?;
    writeln!(out, "DETECTED DOCUMENTS")?;
    writeln!(out, "{RULE_LIGHT}")?;
    writeln!(out)?;
    for (index, group) in report.document_groups.iter().enumerate() {
        writeln!(out, "{}. {}", index + 1, group.doc_type)?;
        writeln!(out, "   Pages: {} - {}", group.start_page, group.end_page)?;
        writeln!(out, "   Total: {} pages", group.page_count())?;
        let file = report
            .generated_files
            .iter()
            .find(|generated| generated.pages == group.pages);
        if let Some(file) = file {
            writeln!(out, "   File: {}", file.filename)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Batch summary CSV. Rows are appended, so one file can span several runs.
pub struct CsvSummary {
    path: PathBuf,
}

impl CsvSummary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row per report, writing the header first if the file is new
    /// or empty.
    #[instrument(skip_all, fields(path = %self.path.display(), rows = reports.len()))]
    pub fn append(&self, reports: &[DocumentReport]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let needs_header = std::fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(summary_header()).map_err(csv_error)?;
        }
        for report in reports {
            writer.write_record(summary_row(report)).map_err(csv_error)?;
        }
        writer.flush()?;

        info!("Summary updated");
        Ok(())
    }
}

fn csv_error(err: csv::Error) -> PagesortError {
    PagesortError::Report(format!("CSV summary: {err}"))
}

/// `Path`, `PDF_Name`, then `Page N` / `Confidence N` pairs.
pub fn summary_header() -> Vec<String> {
    let mut header = vec!["Path".to_string(), "PDF_Name".to_string()];
    for page in 1..=SUMMARY_PAGE_COLUMNS {
        header.push(format!("Page {page}"));
        header.push(format!("Confidence {page}"));
    }
    header
}

/// One summary row. Known types that are dropped from the output carry an
/// ` (x)` marker; pages with no record leave both cells empty.
pub fn summary_row(report: &DocumentReport) -> Vec<String> {
    let mut row = vec![
        report.pdf_path.display().to_string(),
        report.pdf_name.clone(),
    ];
    for page in 1..=SUMMARY_PAGE_COLUMNS {
        match report.record(page) {
            Some(record) => {
                row.push(page_label(record));
                row.push(format!("{:.1}%", record.ocr_confidence * 100.0));
            }
            None => {
                row.push(String::new());
                row.push(String::new());
            }
        }
    }
    row
}

fn page_label(record: &PageRecord) -> String {
    if !record.functional && !record.is_unknown() {
        format!("{} (x)", record.document_type)
    } else {
        record.document_type.clone()
    }
}
