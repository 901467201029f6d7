// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — header/footer bands and canvas-expanding rotation.

pub mod processor;

pub use processor::{ExpandingRotator, ImageProcessor};
