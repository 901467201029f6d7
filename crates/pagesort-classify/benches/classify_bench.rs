// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the pagesort-classify crate. Classification runs on
// every OCR pass (up to three per page), so its cost over the builtin profile
// table is the number worth watching.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use pagesort_classify::{PageClassifier, match_keywords};
use pagesort_core::{PipelineConfig, ProfileTable};

const INVOICE_PAGE: &str = "COMMERCIAL INVOICE\n\
    Invoice No: 2026-0413   Invoice Date: 12/03/2026\n\
    Bill To: Northwind Traders   Ship To: Rotterdam\n\
    Description          Quantity   Unit Price   Amount\n\
    Steel fittings       120        4.20         504.00\n\
    Subtotal 504.00  Tax 50.40  Total 554.40 (USD)\n\
    Payment Terms: net 30 days   Due Date: 11/04/2026";

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Full classification of a dense invoice page against the builtin table.
fn bench_classify_invoice(c: &mut Criterion) {
    let classifier = PageClassifier::new(&ProfileTable::builtin(), &PipelineConfig::default());

    c.bench_function("classify (builtin table, invoice page)", |b| {
        b.iter(|| black_box(classifier.classify(black_box(INVOICE_PAGE))));
    });
}

/// One-shot matching, which recompiles the keyword list on every call.
fn bench_match_keywords(c: &mut Criterion) {
    let keywords = ["invoice", "invoice no", "total", "tax", "amount", "due date", "$"];

    c.bench_function("match_keywords (7 keywords, uncompiled)", |b| {
        b.iter(|| black_box(match_keywords(black_box(INVOICE_PAGE), &keywords)));
    });
}

criterion_group!(benches, bench_classify_invoice, bench_match_keywords);
criterion_main!(benches);
