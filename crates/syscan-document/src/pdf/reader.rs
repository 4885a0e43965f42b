// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open and inspect finished scan documents using the `lopdf`
// crate.

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use syscan_core::error::SyscanError;
use tracing::{debug, info, instrument};

/// Read-only view over an existing PDF.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SyscanError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            SyscanError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self { document })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, SyscanError> {
        let document = Document::load_mem(data).map_err(|err| {
            SyscanError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Width and height of page `page_number` (1-indexed) in points, taken
    /// from its /MediaBox.
    pub fn page_size_pt(&self, page_number: u32) -> Result<(f32, f32), SyscanError> {
        let page = self.page_dictionary(page_number)?;
        let media_box = page
            .get(b"MediaBox")
            .and_then(Object::as_array)
            .map_err(|err| pdf_error(page_number, "MediaBox", err))?;

        let coords = media_box
            .iter()
            .map(Object::as_float)
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|err| pdf_error(page_number, "MediaBox", err))?;

        match coords.as_slice() {
            [x0, y0, x1, y1] => Ok((x1 - x0, y1 - y0)),
            _ => Err(SyscanError::PdfError(format!(
                "page {page_number}: malformed MediaBox"
            ))),
        }
    }

    /// Pixel size of the first image XObject drawn on page `page_number`.
    pub fn page_image_size(&self, page_number: u32) -> Result<(i64, i64), SyscanError> {
        let page = self.page_dictionary(page_number)?;
        let resources = self
            .resolve(page.get(b"Resources").map_err(|err| pdf_error(page_number, "Resources", err))?)
            .and_then(|obj| obj.as_dict().map_err(|err| pdf_error(page_number, "Resources", err)))?;
        let xobjects = self
            .resolve(resources.get(b"XObject").map_err(|err| pdf_error(page_number, "XObject", err))?)
            .and_then(|obj| obj.as_dict().map_err(|err| pdf_error(page_number, "XObject", err)))?;

        let (_, first) = xobjects.iter().next().ok_or_else(|| {
            SyscanError::PdfError(format!("page {page_number}: no image on page"))
        })?;
        let stream = self
            .resolve(first)?
            .as_stream()
            .map_err(|err| pdf_error(page_number, "image", err))?;

        let width = stream
            .dict
            .get(b"Width")
            .and_then(Object::as_i64)
            .map_err(|err| pdf_error(page_number, "Width", err))?;
        let height = stream
            .dict
            .get(b"Height")
            .and_then(Object::as_i64)
            .map_err(|err| pdf_error(page_number, "Height", err))?;
        Ok((width, height))
    }

    // -- Helpers --------------------------------------------------------------

    fn page_dictionary(&self, page_number: u32) -> Result<&Dictionary, SyscanError> {
        let pages = self.document.get_pages();
        let page_id: ObjectId = *pages.get(&page_number).ok_or_else(|| {
            SyscanError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })?;
        self.document
            .get_dictionary(page_id)
            .map_err(|err| pdf_error(page_number, "page", err))
    }

    /// Follow a reference to the object it points at.
    fn resolve<'a>(&'a self, object: &'a Object) -> Result<&'a Object, SyscanError> {
        match object {
            Object::Reference(id) => self.document.get_object(*id).map_err(|err| {
                SyscanError::PdfError(format!("cannot resolve {:?}: {}", id, err))
            }),
            other => Ok(other),
        }
    }
}

fn pdf_error(page_number: u32, what: &str, err: lopdf::Error) -> SyscanError {
    SyscanError::PdfError(format!("page {page_number}: bad {what}: {err}"))
}
