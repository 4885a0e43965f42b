// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default root folder for per-device output.
pub const DEFAULT_BASE_DIR: &str = "scanners_SyScan";

/// Persistent scanning settings, passed explicitly to every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Root directory under which one folder per device is created.
    pub base_dir: PathBuf,
    /// Page size of the assembled document.
    pub paper_size: crate::PaperSize,
    /// Requested capture resolution. Devices may ignore it.
    pub resolution_dpi: u32,
    /// JPEG quality (1-100) of the images embedded in the document.
    pub jpeg_quality: u8,
    /// Device the driver preselects, if it is attached.
    pub preferred_device: Option<String>,
    /// When set, every subdirectory of this folder is exposed as a scanner
    /// whose "glass" yields the images it contains.
    pub image_source_dir: Option<PathBuf>,
}

impl ScanConfig {
    /// JPEG quality clamped to the range the encoder accepts.
    pub fn effective_jpeg_quality(&self) -> u8 {
        self.jpeg_quality.clamp(1, 100)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            paper_size: crate::PaperSize::A4,
            resolution_dpi: 300,
            jpeg_quality: 70,
            preferred_device: None,
            image_source_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: ScanConfig = serde_json::from_str(r#"{"jpeg_quality": 80}"#).unwrap();
        assert_eq!(config.jpeg_quality, 80);
        assert_eq!(config.resolution_dpi, 300);
        assert_eq!(config.base_dir, PathBuf::from(DEFAULT_BASE_DIR));
        assert_eq!(config.paper_size, crate::PaperSize::A4);
    }

    #[test]
    fn quality_is_clamped() {
        let config = ScanConfig {
            jpeg_quality: 0,
            ..ScanConfig::default()
        };
        assert_eq!(config.effective_jpeg_quality(), 1);
        let config = ScanConfig {
            jpeg_quality: 250,
            ..ScanConfig::default()
        };
        assert_eq!(config.effective_jpeg_quality(), 100);
    }
}
