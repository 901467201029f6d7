// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch orchestration — discovers the PDFs of an input directory and runs
// each one through the page pipeline, splitter and report writer on a rayon
// pool. Every document is an isolated unit: one that fails is recorded and
// the rest carry on.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use pagesort_classify::PageClassifier;
use pagesort_core::PipelineConfig;
use pagesort_core::error::{PagesortError, Result};
use pagesort_document::{
    DocumentSplitter, ExpandingRotator, OrientationClassifier, PageProcessor, PdfReader,
    TextRecognizer, UprightClassifier,
};
use rayon::prelude::*;
use tracing::{error, info, instrument, warn};

use crate::integrity::hash_file;
use crate::report::{DocumentReport, ReportWriter};

/// Where a batch writes its results.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Split PDFs go to `<output_dir>/<stem>/`.
    pub output_dir: PathBuf,
    /// Reports go to `<reports_dir>/<stem>/`.
    pub reports_dir: PathBuf,
    /// Write one PDF per detected document.
    pub split: bool,
}

/// A source PDF that produced no report.
#[derive(Debug, Clone)]
pub struct FailedDocument {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
pub struct BatchOutcome {
    /// Reports of successful documents, in discovery order.
    pub reports: Vec<DocumentReport>,
    pub failed: Vec<FailedDocument>,
    pub elapsed: Duration,
}

impl BatchOutcome {
    pub fn total_pages(&self) -> u64 {
        self.reports.iter().map(|r| u64::from(r.total_pages)).sum()
    }

    pub fn functional_pages(&self) -> usize {
        self.reports.iter().map(|r| r.functional_pages).sum()
    }

    pub fn generated_pdfs(&self) -> usize {
        self.reports.iter().map(|r| r.generated_files.len()).sum()
    }

    pub fn roi_pages(&self) -> usize {
        self.reports.iter().map(|r| r.roi_optimizations).sum()
    }

    /// Share of pages decided from a band alone, as a percentage.
    pub fn roi_percentage(&self) -> f64 {
        let total = self.total_pages();
        if total == 0 {
            0.0
        } else {
            self.roi_pages() as f64 * 100.0 / total as f64
        }
    }

    pub fn average_seconds(&self) -> f64 {
        let documents = self.reports.len() + self.failed.len();
        if documents == 0 {
            0.0
        } else {
            self.elapsed.as_secs_f64() / documents as f64
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn log_summary(&self) {
        info!(
            documents_ok = self.reports.len(),
            documents_failed = self.failed.len(),
            pages = self.total_pages(),
            functional_pages = self.functional_pages(),
            pdfs_generated = self.generated_pdfs(),
            roi_pages = self.roi_pages(),
            roi_percent = format_args!("{:.1}", self.roi_percentage()),
            total_secs = format_args!("{:.2}", self.elapsed.as_secs_f64()),
            avg_secs = format_args!("{:.2}", self.average_seconds()),
            "Batch complete"
        );
        for failed in &self.failed {
            warn!(pdf = %failed.path.display(), reason = %failed.reason, "Document failed");
        }
    }
}

/// Every `*.pdf` file directly inside `dir`, sorted by path.
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|err| {
        PagesortError::Config(format!("cannot read input directory {}: {}", dir.display(), err))
    })?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

/// Where each worker gets its page orientation classifier from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrientationSource {
    /// No model: every page is taken as scanned.
    Upright,
    /// PP-LCNet document orientation model (ONNX).
    Model(PathBuf),
}

impl OrientationSource {
    /// An explicit model wins; otherwise the model directory is searched for
    /// the conventional orientation model file.
    pub fn resolve(explicit: Option<&Path>, models_dir: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::Model(path.to_path_buf());
        }
        match models_dir.and_then(discover_orientation_model) {
            Some(path) => Self::Model(path),
            None => Self::Upright,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Model(path) if !path.is_file() => Err(PagesortError::Config(format!(
                "orientation model not found at {}",
                path.display()
            ))),
            _ => Ok(()),
        }
    }

    /// Load a classifier for one worker.
    pub fn build(&self) -> Result<Box<dyn OrientationClassifier>> {
        match self {
            Self::Upright => Ok(Box::new(UprightClassifier)),
            Self::Model(path) => load_orientation_model(path),
        }
    }
}

#[cfg(feature = "oar")]
fn discover_orientation_model(dir: &Path) -> Option<PathBuf> {
    pagesort_document::scan::oar::orientation_model_in(dir)
}

#[cfg(not(feature = "oar"))]
fn discover_orientation_model(_dir: &Path) -> Option<PathBuf> {
    None
}

#[cfg(feature = "oar")]
fn load_orientation_model(path: &Path) -> Result<Box<dyn OrientationClassifier>> {
    Ok(Box::new(pagesort_document::OarOrientationClassifier::new(path)?))
}

#[cfg(not(feature = "oar"))]
fn load_orientation_model(_path: &Path) -> Result<Box<dyn OrientationClassifier>> {
    Err(PagesortError::OcrUnavailable("oar"))
}

/// Runs a set of PDFs through the whole pipeline.
pub struct BatchRunner<'a> {
    config: &'a PipelineConfig,
    classifier: &'a PageClassifier,
    options: &'a BatchOptions,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        classifier: &'a PageClassifier,
        options: &'a BatchOptions,
    ) -> Self {
        Self {
            config,
            classifier,
            options,
        }
    }

    /// Process `pdfs` on `max_workers` threads.
    ///
    /// `make_recognizer` and `make_orientation` run once per worker thread;
    /// models are not shared between threads.
    pub fn run<R, O, F, G>(
        &self,
        pdfs: &[PathBuf],
        make_recognizer: F,
        make_orientation: G,
    ) -> Result<BatchOutcome>
    where
        R: TextRecognizer,
        O: OrientationClassifier,
        F: Fn() -> Result<R> + Sync + Send,
        G: Fn() -> Result<O> + Sync + Send,
    {
        let started = Instant::now();
        let workers = self.config.max_workers.max(1);
        info!(documents = pdfs.len(), workers, "Starting batch");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("pagesort-worker-{index}"))
            .build()
            .map_err(|err| PagesortError::Config(format!("cannot start worker pool: {err}")))?;

        let results: Vec<Result<DocumentReport>> = pool.install(|| {
            pdfs.par_iter()
                .map_init(
                    || (make_recognizer(), make_orientation()),
                    |engines, path| match engines {
                        (Ok(recognizer), Ok(orientation)) => {
                            self.process_pdf(path, &*recognizer, &*orientation)
                        }
                        (Err(err), _) => Err(PagesortError::OcrError(format!(
                            "recognizer unavailable: {err}"
                        ))),
                        (_, Err(err)) => Err(PagesortError::OcrError(format!(
                            "orientation classifier unavailable: {err}"
                        ))),
                    },
                )
                .collect()
        });

        let mut reports = Vec::new();
        let mut failed = Vec::new();
        for (path, result) in pdfs.iter().zip(results) {
            match result {
                Ok(report) => reports.push(report),
                Err(err) => {
                    error!(pdf = %path.display(), %err, "Document failed");
                    failed.push(FailedDocument {
                        path: path.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(BatchOutcome {
            reports,
            failed,
            elapsed: started.elapsed(),
        })
    }

    #[instrument(skip(self, recognizer, orientation), fields(pdf = %path.display()))]
    fn process_pdf(
        &self,
        path: &Path,
        recognizer: &dyn TextRecognizer,
        orientation: &dyn OrientationClassifier,
    ) -> Result<DocumentReport> {
        let pdf_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| pdf_name.clone());

        let sha256 = hash_file(path)?;
        let reader = PdfReader::open(path)?.with_dpi(self.config.render_dpi);

        let processor = PageProcessor::new(
            self.config,
            self.classifier,
            recognizer,
            orientation,
            &ExpandingRotator,
        );
        let outcome = processor.process_document(&pdf_name, &reader);

        let generated = if self.options.split {
            DocumentSplitter::new(self.options.output_dir.join(&stem)).split(
                &reader,
                &stem,
                &outcome.groups,
            )?
        } else {
            Vec::new()
        };

        let report = DocumentReport::new(
            outcome,
            path,
            sha256,
            generated,
            self.config.text_preview_chars,
        );
        ReportWriter::new(self.options.reports_dir.join(&stem)).write(&report)?;
        Ok(report)
    }
}
