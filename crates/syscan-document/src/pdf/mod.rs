// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page geometry, writing image documents, and reading them back.

pub mod layout;
pub mod reader;
pub mod writer;

pub use layout::{Placement, fit_to_page};
pub use reader::PdfReader;
pub use writer::PdfWriter;
