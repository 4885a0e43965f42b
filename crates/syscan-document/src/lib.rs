// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// syscan-document — Document processing for the SyScan scanning pipeline.
//
// Provides page image decoding and colour normalisation, A4 aspect-fit layout,
// PDF writing (JPEG pages) and reading, and the assembler that turns stored
// page images into one persisted document.

pub mod assemble;
pub mod image;
pub mod integrity;
pub mod pdf;

// Re-export the primary structs so callers can use `syscan_document::PdfReader` etc.
pub use assemble::DocumentAssembler;
pub use image::processor::ImageProcessor;
pub use pdf::layout::{Placement, fit_to_page};
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;
