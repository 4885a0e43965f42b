// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for platforms without a supported scanner stack.
//
// Enumeration reports no devices; connecting is `PlatformUnavailable`.

use syscan_core::error::{Result, SyscanError};
use syscan_core::types::DeviceInfo;

use crate::traits::*;

/// No-op subsystem returned when no backend is configured.
pub struct StubBridge;

impl ImagingSubsystem for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }

    fn enumerate(&self) -> Result<Vec<DeviceInfo>> {
        tracing::debug!("ImagingSubsystem::enumerate called on stub bridge");
        Ok(Vec::new())
    }

    fn connect(&self, device_id: &str) -> Result<Box<dyn ScannerConnection>> {
        tracing::warn!(device_id, "ImagingSubsystem::connect called on stub bridge");
        Err(SyscanError::PlatformUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_lists_nothing() {
        assert!(StubBridge.enumerate().unwrap().is_empty());
    }

    #[test]
    fn stub_cannot_connect() {
        assert!(matches!(
            StubBridge.connect("anything"),
            Err(SyscanError::PlatformUnavailable)
        ));
    }
}
