// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembly — turn an ordered list of stored page images into one
// paginated PDF and persist it atomically.
//
// Per page: decode, normalise to RGB, aspect-fit onto the paper, re-encode as
// JPEG into a uniquely named scratch file, embed, and delete the scratch file.
// The scratch file is owned by a guard, so it is removed on every exit path,
// including a failure on a later page.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use syscan_core::error::SyscanError;
use syscan_core::{PaperSize, ScanConfig};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::image::processor::ImageProcessor;
use crate::pdf::layout::fit_to_page;
use crate::pdf::writer::PdfWriter;

/// Builds scan documents from page images.
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    paper_size: PaperSize,
    /// JPEG quality of embedded page images (1-100).
    jpeg_quality: u8,
    title: Option<String>,
}

impl DocumentAssembler {
    pub fn new(paper_size: PaperSize, jpeg_quality: u8) -> Self {
        Self {
            paper_size,
            jpeg_quality: jpeg_quality.clamp(1, 100),
            title: None,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.paper_size, config.effective_jpeg_quality())
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Build the document in memory, one page per entry of `pages`, in the
    /// given order. Scratch JPEGs are written to `scratch_dir`.
    ///
    /// Every failure is reported as [`SyscanError::Assembly`]; `pages` are
    /// never modified.
    #[instrument(skip_all, fields(pages = pages.len(), scratch = %scratch_dir.display()))]
    pub fn assemble(&self, pages: &[PathBuf], scratch_dir: &Path) -> Result<Vec<u8>, SyscanError> {
        let mut writer = PdfWriter::new(self.paper_size);
        if let Some(title) = &self.title {
            writer.set_title(title.clone());
        }

        for path in pages {
            self.append_page(&mut writer, path, scratch_dir)
                .map_err(|err| match err {
                    SyscanError::Assembly(_) => err,
                    other => SyscanError::Assembly(format!("{}: {}", path.display(), other)),
                })?;
        }

        let bytes = writer
            .finish()
            .map_err(|err| SyscanError::Assembly(err.to_string()))?;
        info!(pages = pages.len(), bytes = bytes.len(), "Document assembled");
        Ok(bytes)
    }

    fn append_page(
        &self,
        writer: &mut PdfWriter,
        path: &Path,
        scratch_dir: &Path,
    ) -> Result<(), SyscanError> {
        let page = ImageProcessor::open(path)?.normalize();
        let (width, height) = (page.width(), page.height());
        let placement = fit_to_page(width, height, self.paper_size)?;

        let scratch = ScratchFile::write(scratch_dir, &page.to_jpeg_bytes(self.jpeg_quality)?)?;
        let jpeg = std::fs::read(scratch.path())?;
        writer.add_jpeg_page(&jpeg, width, height, &placement)?;

        debug!(
            page = writer.page_count(),
            width,
            height,
            scale = placement.scale,
            "Page appended"
        );
        Ok(())
    }

    /// Write `bytes` to `<output_dir>/scan_<YYYYMMDD_HHMMSS>.pdf`.
    ///
    /// The bytes go to a hidden `.part` sibling first and are renamed into
    /// place, so the final path never holds a partial document. If the name
    /// is taken, `_2`, `_3`, ... is appended.
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len(), dir = %output_dir.display()))]
    pub fn persist(
        &self,
        bytes: &[u8],
        output_dir: &Path,
        created_at: &DateTime<Local>,
    ) -> Result<PathBuf, SyscanError> {
        let path = unique_output_path(output_dir, created_at);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let part = output_dir.join(format!(".{file_name}.part"));

        let written = std::fs::write(&part, bytes).and_then(|()| std::fs::rename(&part, &path));
        if let Err(err) = written {
            let _ = std::fs::remove_file(&part);
            return Err(SyscanError::Assembly(format!(
                "failed to write {}: {}",
                path.display(),
                err
            )));
        }

        info!(path = %path.display(), "Document persisted");
        Ok(path)
    }
}

/// `scan_<YYYYMMDD_HHMMSS>.pdf` for `created_at`.
pub fn document_file_name(created_at: &DateTime<Local>) -> String {
    format!("scan_{}.pdf", created_at.format("%Y%m%d_%H%M%S"))
}

fn unique_output_path(output_dir: &Path, created_at: &DateTime<Local>) -> PathBuf {
    let candidate = output_dir.join(document_file_name(created_at));
    if !candidate.exists() {
        return candidate;
    }
    let stem = format!("scan_{}", created_at.format("%Y%m%d_%H%M%S"));
    (2u32..)
        .map(|n| output_dir.join(format!("{stem}_{n}.pdf")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

// -- Scratch files ------------------------------------------------------------

/// A uniquely named lossy intermediate that is deleted when dropped.
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    fn write(dir: &Path, bytes: &[u8]) -> Result<Self, SyscanError> {
        let guard = Self {
            path: dir.join(format!("tmp_{}.jpg", Uuid::new_v4().simple())),
        };
        std::fs::write(&guard.path, bytes)?;
        Ok(guard)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Scratch file removed"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.path.display(), %err, "Scratch file left behind"),
        }
    }
}
