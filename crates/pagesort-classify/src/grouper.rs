// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document grouper — splits the ordered page stream into output documents.

use pagesort_core::types::{DocumentGroup, PageRecord};
use tracing::debug;

/// Partition `records` (ascending page order) into maximal runs of consecutive
/// functional pages sharing one document type.
///
/// A non-functional page closes the open group without starting one. A gap in
/// page numbers (a page that failed and has no record) also closes the open
/// group, so every group's pages form a contiguous run.
pub fn group_pages(records: &[PageRecord]) -> Vec<DocumentGroup> {
    let mut groups: Vec<DocumentGroup> = Vec::new();
    let mut open = false;

    for record in records {
        if !record.functional {
            open = false;
            continue;
        }

        let extends = open
            && groups.last().is_some_and(|g| {
                g.doc_type == record.document_type && g.end_page + 1 == record.page_number
            });

        match groups.last_mut() {
            Some(group) if extends => group.push(record.page_number),
            _ => groups.push(DocumentGroup::new(&record.document_type, record.page_number)),
        }
        open = true;
    }

    debug!(pages = records.len(), groups = groups.len(), "Pages grouped");
    groups
}
