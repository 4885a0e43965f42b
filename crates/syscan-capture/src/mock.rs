// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scriptable imaging subsystem for tests: devices can be unplugged, and the
// next connect / transfer can be made to fail or properties rejected.
//
// Frame N (1-based, counting successful transfers) is a (10 + N) x 20 pixel
// BMP so tests can tell pages apart by width.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use syscan_bridge::traits::*;
use syscan_core::error::{Result, SyscanError};
use syscan_core::types::{DeviceInfo, ItemProperty, TransferFormat};

#[derive(Default)]
struct MockState {
    devices: Vec<DeviceInfo>,
    fail_connects: u32,
    fail_transfers: u32,
    reject_properties: bool,
    transfers: u32,
    accepted_properties: Vec<(ItemProperty, i32)>,
}

/// Test handle controlling the shared mock state.
#[derive(Clone, Default)]
pub struct MockScanner {
    state: Arc<Mutex<MockState>>,
}

impl MockScanner {
    pub fn new(names: &[&str]) -> Self {
        let scanner = Self::default();
        scanner.state.lock().unwrap().devices = names
            .iter()
            .enumerate()
            .map(|(n, name)| DeviceInfo {
                id: format!("mock-{n}"),
                name: (*name).to_owned(),
            })
            .collect();
        scanner
    }

    pub fn subsystem(&self) -> Box<dyn ImagingSubsystem> {
        Box::new(self.clone())
    }

    pub fn unplug(&self, name: &str) {
        self.state.lock().unwrap().devices.retain(|d| d.name != name);
    }

    pub fn fail_next_connect(&self) {
        self.state.lock().unwrap().fail_connects += 1;
    }

    pub fn fail_next_transfer(&self) {
        self.state.lock().unwrap().fail_transfers += 1;
    }

    pub fn reject_properties(&self) {
        self.state.lock().unwrap().reject_properties = true;
    }

    pub fn accepted_properties(&self) -> Vec<(ItemProperty, i32)> {
        self.state.lock().unwrap().accepted_properties.clone()
    }
}

impl ImagingSubsystem for MockScanner {
    fn platform_name(&self) -> &str {
        "Mock"
    }

    fn enumerate(&self) -> Result<Vec<DeviceInfo>> {
        Ok(self.state.lock().unwrap().devices.clone())
    }

    fn connect(&self, device_id: &str) -> Result<Box<dyn ScannerConnection>> {
        let mut state = self.state.lock().unwrap();
        if state.fail_connects > 0 {
            state.fail_connects -= 1;
            return Err(SyscanError::Bridge("device busy".into()));
        }
        if !state.devices.iter().any(|d| d.id == device_id) {
            return Err(SyscanError::DeviceConnection("device offline".into()));
        }
        Ok(Box::new(self.clone()))
    }
}

impl ScannerConnection for MockScanner {
    fn items(&self) -> Result<Vec<Box<dyn ScanItem>>> {
        Ok(vec![Box::new(self.clone())])
    }
}

impl ScanItem for MockScanner {
    fn set_property(&mut self, property: ItemProperty, value: i32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.reject_properties {
            return Err(SyscanError::Bridge(format!("{} not supported", property.name())));
        }
        state.accepted_properties.push((property, value));
        Ok(())
    }

    fn transfer(&mut self, format: TransferFormat) -> Result<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        if state.fail_transfers > 0 {
            state.fail_transfers -= 1;
            return Err(SyscanError::Bridge("paper jam".into()));
        }
        state.transfers += 1;

        let frame = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            10 + state.transfers,
            20,
            Rgb([255, 255, 255]),
        ));
        let target = match format {
            TransferFormat::Bmp => ImageFormat::Bmp,
            TransferFormat::Png => ImageFormat::Png,
        };
        let mut bytes = Vec::new();
        frame.write_to(&mut Cursor::new(&mut bytes), target).unwrap();
        Ok(bytes)
    }
}
