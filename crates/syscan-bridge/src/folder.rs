// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image-folder scanner backend.
//
// Every subdirectory of the configured source folder appears as one scanner
// named after the directory. Each transfer "scans" the next image file of that
// directory (sorted by filename) and hands it back re-encoded in the requested
// raster format, exactly as a real device would deliver a bitmap frame. Once
// the directory is exhausted the glass is empty and transfers fail.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::ImageFormat;
use syscan_core::error::{Result, SyscanError};
use syscan_core::types::{DeviceInfo, ItemProperty, TransferFormat};
use tracing::{debug, info, instrument, warn};

use crate::traits::*;

/// File extensions the backend treats as source pages.
const SOURCE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Highest resolution the virtual glass accepts.
const MAX_DPI: i32 = 2400;

/// Next-page cursor per device directory, shared by every connection so that
/// reconnecting between pages continues where the last transfer stopped.
type Cursors = Arc<Mutex<HashMap<PathBuf, usize>>>;

/// Scanner stack backed by directories of images.
pub struct FolderBridge {
    root: PathBuf,
    cursors: Cursors,
}

impl FolderBridge {
    /// Create a backend rooted at `root`. The directory need not exist yet;
    /// a missing root simply enumerates no devices.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cursors: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl ImagingSubsystem for FolderBridge {
    fn platform_name(&self) -> &str {
        "Image folder"
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    fn enumerate(&self) -> Result<Vec<DeviceInfo>> {
        if !self.root.is_dir() {
            debug!("source folder missing; no devices");
            return Ok(Vec::new());
        }

        let mut devices: Vec<DeviceInfo> = std::fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .map(|entry| DeviceInfo {
                id: entry.path().display().to_string(),
                name: entry.file_name().to_string_lossy().into_owned(),
            })
            .collect();
        devices.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(count = devices.len(), "folder devices enumerated");
        Ok(devices)
    }

    fn connect(&self, device_id: &str) -> Result<Box<dyn ScannerConnection>> {
        let dir = PathBuf::from(device_id);
        if !dir.is_dir() {
            return Err(SyscanError::DeviceConnection(format!(
                "device offline: {} is not reachable",
                dir.display()
            )));
        }
        info!(device = %dir.display(), "connected to folder scanner");
        Ok(Box::new(FolderConnection {
            dir,
            cursors: Arc::clone(&self.cursors),
        }))
    }
}

struct FolderConnection {
    dir: PathBuf,
    cursors: Cursors,
}

impl ScannerConnection for FolderConnection {
    fn items(&self) -> Result<Vec<Box<dyn ScanItem>>> {
        Ok(vec![Box::new(FolderItem {
            dir: self.dir.clone(),
            cursors: Arc::clone(&self.cursors),
            properties: HashMap::new(),
        })])
    }
}

/// The virtual flatbed glass.
struct FolderItem {
    dir: PathBuf,
    cursors: Cursors,
    properties: HashMap<ItemProperty, i32>,
}

impl ScanItem for FolderItem {
    fn set_property(&mut self, property: ItemProperty, value: i32) -> Result<()> {
        if !(1..=MAX_DPI).contains(&value) {
            return Err(SyscanError::Bridge(format!(
                "{} value {value} out of range",
                property.name()
            )));
        }
        self.properties.insert(property, value);
        Ok(())
    }

    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    fn transfer(&mut self, format: TransferFormat) -> Result<Vec<u8>> {
        let sources = source_images(&self.dir)?;

        let mut cursors = self
            .cursors
            .lock()
            .map_err(|_| SyscanError::Bridge("cursor lock poisoned".into()))?;
        let next = cursors.entry(self.dir.clone()).or_insert(0);

        let source = sources.get(*next).ok_or_else(|| {
            SyscanError::Bridge(format!(
                "no page on the glass: all {} images in {} were scanned",
                sources.len(),
                self.dir.display()
            ))
        })?;

        let img = image::open(source).map_err(|err| {
            SyscanError::Bridge(format!("failed to read {}: {err}", source.display()))
        })?;

        let target = match format {
            TransferFormat::Bmp => ImageFormat::Bmp,
            TransferFormat::Png => ImageFormat::Png,
        };
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), target)
            .map_err(|err| SyscanError::Bridge(format!("frame encoding failed: {err}")))?;

        if let Some(dpi) = self.properties.get(&ItemProperty::HorizontalResolution) {
            debug!(dpi, "resolution requested; folder frames are delivered as-is");
        }

        *next += 1;
        info!(
            source = %source.display(),
            bytes = buffer.len(),
            "frame transferred"
        );
        Ok(buffer)
    }
}

/// Image files in `dir`, sorted by filename.
fn source_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|err| {
            warn!(dir = %dir.display(), %err, "folder scanner vanished");
            SyscanError::Bridge(format!("cannot read {}: {err}", dir.display()))
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn seed_device(root: &Path, name: &str, pages: u32) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        for n in 0..pages {
            let img = RgbImage::from_pixel(8 + n, 6, Rgb([200, 10, 10]));
            img.save(dir.join(format!("{n:02}.png"))).unwrap();
        }
        dir
    }

    #[test]
    fn missing_root_has_no_devices() {
        let bridge = FolderBridge::new("/definitely/not/here");
        assert!(bridge.enumerate().unwrap().is_empty());
    }

    #[test]
    fn subdirectories_are_devices() {
        let tmp = tempfile::tempdir().unwrap();
        seed_device(tmp.path(), "Flatbed B", 1);
        seed_device(tmp.path(), "Flatbed A", 1);
        std::fs::write(tmp.path().join("notes.txt"), b"not a device").unwrap();

        let names: Vec<String> = FolderBridge::new(tmp.path())
            .enumerate()
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Flatbed A", "Flatbed B"]);
    }

    #[test]
    fn transfers_advance_across_reconnects_until_exhausted() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = seed_device(tmp.path(), "Glass", 2);
        let bridge = FolderBridge::new(tmp.path());
        let id = dir.display().to_string();

        for expected_width in [8u32, 9] {
            let conn = bridge.connect(&id).unwrap();
            let mut items = conn.items().unwrap();
            let frame = items[0].transfer(TransferFormat::Bmp).unwrap();
            let decoded = image::load_from_memory(&frame).unwrap();
            assert_eq!(decoded.width(), expected_width);
        }

        let conn = bridge.connect(&id).unwrap();
        let mut items = conn.items().unwrap();
        assert!(matches!(
            items[0].transfer(TransferFormat::Bmp),
            Err(SyscanError::Bridge(_))
        ));
    }

    #[test]
    fn out_of_range_resolution_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = seed_device(tmp.path(), "Glass", 1);
        let bridge = FolderBridge::new(tmp.path());
        let conn = bridge.connect(&dir.display().to_string()).unwrap();
        let mut items = conn.items().unwrap();
        assert!(items[0].set_property(ItemProperty::HorizontalResolution, 300).is_ok());
        assert!(items[0].set_property(ItemProperty::VerticalResolution, 9600).is_err());
    }

    #[test]
    fn unplugged_device_fails_to_connect() {
        let tmp = tempfile::tempdir().unwrap();
        let bridge = FolderBridge::new(tmp.path());
        let missing = tmp.path().join("gone").display().to_string();
        assert!(matches!(
            bridge.connect(&missing),
            Err(SyscanError::DeviceConnection(_))
        ));
    }
}
