// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode scanner frames and stored pages, normalise them to
// 8-bit RGB, and encode them losslessly (PNG) or lossily (JPEG). Operates on
// in-memory images using the `image` crate.

use std::path::Path;

use image::{DynamicImage, ImageFormat};
use syscan_core::error::SyscanError;
use tracing::{debug, info, instrument};

/// A single decoded page image.
///
/// ```ignore
/// let jpeg = ImageProcessor::open("pg_001.png")?
///     .normalize()
///     .to_jpeg_bytes(70)?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SyscanError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            SyscanError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        debug!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Decode raw encoded bytes (BMP frame from a scanner, PNG, JPEG, ...).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, SyscanError> {
        let img = image::load_from_memory(data).map_err(|err| {
            SyscanError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            color = ?img.color(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Convert any colour mode (palette, grey, 16-bit, alpha) to 8-bit RGB.
    pub fn normalize(self) -> Self {
        match self.image {
            DynamicImage::ImageRgb8(_) => self,
            other => {
                debug!(from = ?other.color(), "Normalising to RGB8");
                Self {
                    image: DynamicImage::ImageRgb8(other.to_rgb8()),
                }
            }
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as baseline RGB JPEG with the given quality
    /// (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, SyscanError> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder).map_err(|err| {
            SyscanError::ImageError(format!("JPEG encoding failed: {}", err))
        })?;
        Ok(buffer)
    }

    /// Write the image to `path` as PNG regardless of the path's extension.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), SyscanError> {
        self.image
            .save_with_format(path.as_ref(), ImageFormat::Png)
            .map_err(|err| {
                SyscanError::ImageError(format!(
                    "failed to save image to {}: {}",
                    path.as_ref().display(),
                    err
                ))
            })?;
        info!(path = %path.as_ref().display(), "Page image saved");
        Ok(())
    }
}
