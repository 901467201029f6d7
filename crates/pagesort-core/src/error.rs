// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagesort.

use thiserror::Error;

/// Top-level error type for all Pagesort operations.
#[derive(Debug, Error)]
pub enum PagesortError {
    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid document type profile: {0}")]
    InvalidProfile(String),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("page {page} could not be rendered: {reason}")]
    Render { page: u32, reason: String },

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("OCR failed: {0}")]
    OcrError(String),

    #[error("this build has no `{0}` OCR engine (enable the `{0}` feature)")]
    OcrUnavailable(&'static str),

    // -- Reporting --
    #[error("report generation failed: {0}")]
    Report(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagesortError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_error_mentions_page() {
        let err = PagesortError::Render {
            page: 4,
            reason: "no image XObject".into(),
        };
        assert_eq!(
            err.to_string(),
            "page 4 could not be rendered: no image XObject"
        );
    }

    #[test]
    fn unavailable_engine_names_feature() {
        assert_eq!(
            PagesortError::OcrUnavailable("oar").to_string(),
            "this build has no `oar` OCR engine (enable the `oar` feature)"
        );
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.pdf");
        let err: PagesortError = io_err.into();
        assert!(matches!(err, PagesortError::Io(_)));
    }
}
