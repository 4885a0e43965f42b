// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the imaging subsystem.
//
// The shape mirrors how scanner stacks such as WIA expose devices: a manager
// enumerates device infos, a device info connects to a device, a device
// exposes items (scan sources), and an item carries properties and performs
// transfers.

use syscan_core::error::Result;
use syscan_core::types::{DeviceInfo, ItemProperty, TransferFormat};

/// Entry point to a platform's scanner stack.
///
/// Every call is blocking. Implementations must not cache enumeration
/// results: devices come and go between calls.
pub trait ImagingSubsystem {
    /// Human-readable backend name (e.g. "Image folder", "Desktop (stub)").
    fn platform_name(&self) -> &str;

    /// List the devices attached right now. No devices is `Ok(vec![])`.
    fn enumerate(&self) -> Result<Vec<DeviceInfo>>;

    /// Open a session with the device identified by `device_id`.
    fn connect(&self, device_id: &str) -> Result<Box<dyn ScannerConnection>>;
}

/// An open session with one physical device.
pub trait ScannerConnection {
    /// Scan sources exposed by the device. Flatbeds expose the glass first.
    fn items(&self) -> Result<Vec<Box<dyn ScanItem>>>;
}

/// A single scan source (flatbed glass, feeder, ...).
pub trait ScanItem {
    /// Write an item property. Devices may reject values or not know the
    /// property at all; callers decide whether that matters.
    fn set_property(&mut self, property: ItemProperty, value: i32) -> Result<()>;

    /// Acquire one frame and return it encoded in `format`.
    fn transfer(&mut self, format: TransferFormat) -> Result<Vec<u8>>;
}
