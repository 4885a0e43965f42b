// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! SyScan — imaging subsystem abstractions.
//!
//! Defines the traits the capture pipeline consumes and picks a backend for
//! the running configuration.

pub mod folder;
pub mod stub;
pub mod traits;

#[cfg(windows)]
pub mod wia;

pub use traits::{ImagingSubsystem, ScanItem, ScannerConnection};

use syscan_core::ScanConfig;

/// Select the imaging backend for `config`.
///
/// RETURNS: the image-folder backend when `image_source_dir` is set,
/// otherwise the platform's native scanner stack (WIA on Windows). Where
/// there is none, or it cannot be started, the stub, which reports no
/// attached devices.
pub fn platform_bridge(config: &ScanConfig) -> Box<dyn ImagingSubsystem> {
    if let Some(dir) = &config.image_source_dir {
        tracing::info!(source = %dir.display(), "using image-folder scanner backend");
        return Box::new(folder::FolderBridge::new(dir.clone()));
    }
    native_bridge()
}

#[cfg(windows)]
fn native_bridge() -> Box<dyn ImagingSubsystem> {
    match wia::WiaBridge::new() {
        Ok(bridge) => Box::new(bridge),
        Err(err) => {
            tracing::warn!(error = %err, "WIA unavailable; no scanners will be listed");
            Box::new(stub::StubBridge)
        }
    }
}

#[cfg(not(windows))]
fn native_bridge() -> Box<dyn ImagingSubsystem> {
    // No native scanner stack is wired up outside Windows.
    Box::new(stub::StubBridge)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_source_dir_selects_folder_backend() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ScanConfig {
            image_source_dir: Some(tmp.path().to_path_buf()),
            ..ScanConfig::default()
        };
        assert_eq!(platform_bridge(&config).platform_name(), "Image folder");
    }

    #[cfg(windows)]
    #[test]
    fn windows_defaults_to_wia() {
        let name = platform_bridge(&ScanConfig::default()).platform_name().to_owned();
        // The stub only appears when the WIA service cannot be reached.
        assert!(name == "Windows Image Acquisition" || name == "Desktop (stub)", "{name}");
    }

    #[cfg(not(windows))]
    #[test]
    fn other_platforms_default_to_stub() {
        let bridge = platform_bridge(&ScanConfig::default());
        assert_eq!(bridge.platform_name(), "Desktop (stub)");
        assert!(bridge.enumerate().unwrap().is_empty());
    }
}
