// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document splitter — writes one PDF per document group.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pagesort_core::error::{PagesortError, Result};
use pagesort_core::types::DocumentGroup;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::pdf::reader::PdfReader;

/// One PDF written for a document group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDocument {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub pages: Vec<u32>,
    pub filename: String,
    pub path: PathBuf,
    pub page_count: usize,
}

/// Writes group PDFs into one output directory.
pub struct DocumentSplitter {
    output_dir: PathBuf,
}

impl DocumentSplitter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File names for `groups` of the source named `stem`:
    /// `<stem>_<type>.pdf`, then `<stem>_<type>_2.pdf`, `_3`, ... for later
    /// groups of the same type.
    pub fn file_names(stem: &str, groups: &[DocumentGroup]) -> Vec<String> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        groups
            .iter()
            .map(|group| {
                let doc_type = group.doc_type.to_lowercase();
                let count = seen.entry(doc_type.clone()).or_insert(0);
                *count += 1;
                if *count == 1 {
                    format!("{stem}_{doc_type}.pdf")
                } else {
                    format!("{stem}_{doc_type}_{count}.pdf")
                }
            })
            .collect()
    }

    /// Write one PDF per group, pages in their original order.
    ///
    /// A group that fails to extract or write is logged and left out of the
    /// result; the remaining groups are still written.
    #[instrument(skip_all, fields(stem = %stem, groups = groups.len()))]
    pub fn split(
        &self,
        reader: &PdfReader,
        stem: &str,
        groups: &[DocumentGroup],
    ) -> Result<Vec<GeneratedDocument>> {
        if groups.is_empty() {
            warn!("No document groups to write");
            return Ok(Vec::new());
        }

        std::fs::create_dir_all(&self.output_dir)?;

        let mut generated = Vec::with_capacity(groups.len());
        for (group, filename) in groups.iter().zip(Self::file_names(stem, groups)) {
            match self.write_group(reader, group, &filename) {
                Ok(document) => {
                    info!(
                        file = %document.filename,
                        first = group.start_page,
                        last = group.end_page,
                        pages = document.page_count,
                        "Document written"
                    );
                    generated.push(document);
                }
                Err(err) => error!(doc_type = %group.doc_type, %err, "Failed to write document"),
            }
        }

        info!(written = generated.len(), "Split complete");
        Ok(generated)
    }

    fn write_group(
        &self,
        reader: &PdfReader,
        group: &DocumentGroup,
        filename: &str,
    ) -> Result<GeneratedDocument> {
        let bytes = reader.extract_pages(&group.pages)?;
        let path = self.output_dir.join(filename);
        std::fs::write(&path, bytes).map_err(|err| {
            PagesortError::PdfError(format!("failed to write {}: {}", path.display(), err))
        })?;

        Ok(GeneratedDocument {
            doc_type: group.doc_type.clone(),
            pages: group.pages.clone(),
            filename: filename.to_string(),
            path,
            page_count: group.page_count(),
        })
    }
}
