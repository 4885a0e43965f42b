// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Device registry — enumerate attached scanners, resolve a chosen name against
// a fresh enumeration, and open connections.
//
// Nothing is cached: a scanner listed a moment ago may have been unplugged by
// the time it is resolved or connected.

use syscan_bridge::{ImagingSubsystem, ScannerConnection};
use syscan_core::error::{Result, SyscanError};
use syscan_core::types::{DeviceHandle, DeviceInfo};
use tracing::{debug, info, instrument, warn};

/// Thin, stateless front of the imaging subsystem.
pub struct DeviceRegistry {
    subsystem: Box<dyn ImagingSubsystem>,
}

impl DeviceRegistry {
    pub fn new(subsystem: Box<dyn ImagingSubsystem>) -> Self {
        Self { subsystem }
    }

    /// Name of the backend in use.
    pub fn platform_name(&self) -> &str {
        self.subsystem.platform_name()
    }

    /// Devices attached right now. An empty list is not an error.
    #[instrument(skip(self), fields(backend = self.subsystem.platform_name()))]
    pub fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        let devices = self.subsystem.enumerate()?;
        info!(count = devices.len(), "scanners enumerated");
        Ok(devices)
    }

    /// Find the device called exactly `name` among those attached now.
    #[instrument(skip(self))]
    pub fn resolve(&self, name: &str) -> Result<DeviceHandle> {
        let found = self
            .subsystem
            .enumerate()?
            .into_iter()
            .find(|device| device.name == name);

        match found {
            Some(device) => {
                debug!(id = %device.id, "scanner resolved");
                Ok(device.into())
            }
            None => {
                warn!("scanner not attached");
                Err(SyscanError::DeviceNotFound(name.to_owned()))
            }
        }
    }

    /// Open a session with a resolved device. Every failure, whatever the
    /// backend reports, surfaces as [`SyscanError::DeviceConnection`].
    #[instrument(skip(self), fields(device = %handle.name))]
    pub fn connect(&self, handle: &DeviceHandle) -> Result<Box<dyn ScannerConnection>> {
        self.subsystem.connect(&handle.id).map_err(|err| match err {
            SyscanError::DeviceConnection(_) => err,
            other => SyscanError::DeviceConnection(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockScanner;

    #[test]
    fn empty_subsystem_lists_nothing() {
        let registry = DeviceRegistry::new(Box::new(syscan_bridge::stub::StubBridge));
        assert!(registry.list_devices().unwrap().is_empty());
    }

    #[test]
    fn resolve_requires_exact_name() {
        let scanner = MockScanner::new(&["HP ScanJet 2000", "Canon LiDE"]);
        let registry = DeviceRegistry::new(scanner.subsystem());

        assert_eq!(registry.resolve("Canon LiDE").unwrap().name, "Canon LiDE");
        assert!(matches!(
            registry.resolve("hp scanjet 2000"),
            Err(SyscanError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn unplugged_between_listing_and_resolving() {
        let scanner = MockScanner::new(&["HP ScanJet 2000"]);
        let registry = DeviceRegistry::new(scanner.subsystem());
        assert_eq!(registry.list_devices().unwrap().len(), 1);

        scanner.unplug("HP ScanJet 2000");
        assert!(matches!(
            registry.resolve("HP ScanJet 2000"),
            Err(SyscanError::DeviceNotFound(name)) if name == "HP ScanJet 2000"
        ));
    }

    #[test]
    fn connection_failures_are_normalised() {
        let scanner = MockScanner::new(&["Flatbed"]);
        let registry = DeviceRegistry::new(scanner.subsystem());
        let handle = registry.resolve("Flatbed").unwrap();

        scanner.fail_next_connect();
        assert!(matches!(
            registry.connect(&handle),
            Err(SyscanError::DeviceConnection(_))
        ));
        assert!(registry.connect(&handle).is_ok());

        let stub = DeviceRegistry::new(Box::new(syscan_bridge::stub::StubBridge));
        assert!(matches!(
            stub.connect(&handle),
            Err(SyscanError::DeviceConnection(_))
        ));
    }
}
