// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page geometry — aspect-fit a pixel image onto a fixed paper size and centre
// it. All lengths are millimetres measured from the top-left page corner.

use syscan_core::PaperSize;
use syscan_core::error::SyscanError;

/// Points per millimetre (1 in = 25.4 mm = 72 pt).
const PT_PER_MM: f64 = 72.0 / 25.4;

/// Where and how large one image lands on its page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Uniform scale in millimetres per pixel.
    pub scale: f64,
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

impl Placement {
    /// Offset of the image's lower edge from the bottom of the page, which is
    /// where PDF places its origin.
    pub fn bottom_offset_mm(&self, page_height_mm: f64) -> f64 {
        page_height_mm - self.y_mm - self.height_mm
    }
}

/// Scale an image of `width_px` x `height_px` uniformly so it fits entirely
/// inside `paper`, then centre it.
///
/// `scale = min(page_w / width_px, page_h / height_px)`; offsets are
/// `(page_w - scaled_w) / 2` and `(page_h - scaled_h) / 2`.
pub fn fit_to_page(width_px: u32, height_px: u32, paper: PaperSize) -> Result<Placement, SyscanError> {
    if width_px == 0 || height_px == 0 {
        return Err(SyscanError::ImageError(format!(
            "cannot place an empty image ({width_px}x{height_px})"
        )));
    }

    let (page_w, page_h) = paper.dimensions_mm();
    let (page_w, page_h) = (page_w as f64, page_h as f64);

    let scale = (page_w / width_px as f64).min(page_h / height_px as f64);
    // Rounding in the division can overshoot the page by an ulp.
    let width_mm = (width_px as f64 * scale).min(page_w);
    let height_mm = (height_px as f64 * scale).min(page_h);

    Ok(Placement {
        scale,
        x_mm: (page_w - width_mm) / 2.0,
        y_mm: (page_h - height_mm) / 2.0,
        width_mm,
        height_mm,
    })
}

/// Convert millimetres to PDF points.
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * PT_PER_MM
}
