// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// App services — configuration loading and construction of the scan service.

use std::path::{Path, PathBuf};

use syscan_capture::ScanService;
use syscan_core::ScanConfig;
use syscan_core::error::Result;
use tracing::{info, warn};

use super::data_dir;

/// Long-lived application state shared by the driver.
pub struct AppServices {
    data_dir: PathBuf,
    config: ScanConfig,
}

impl AppServices {
    /// Initialise from the platform data directory. Call once at startup.
    pub fn init() -> Self {
        Self::init_in(data_dir::data_dir())
    }

    /// Initialise from `dir`.
    ///
    /// A missing config file is created with defaults. An unreadable one is
    /// left untouched and defaults are used for this run.
    pub fn init_in(dir: PathBuf) -> Self {
        let path = dir.join(CONFIG_FILE);
        let config = if path.exists() {
            load_config(&dir).unwrap_or_else(|| {
                warn!(path = %path.display(), "config unreadable; using defaults");
                ScanConfig::default()
            })
        } else {
            let config = ScanConfig::default();
            match persist_config(&dir, &config) {
                Ok(()) => info!(path = %path.display(), "default config written"),
                Err(err) => warn!(error = %err, "could not write default config"),
            }
            config
        };

        info!(
            data_dir = %dir.display(),
            base_dir = %config.base_dir.display(),
            "app services initialised"
        );
        Self {
            data_dir: dir,
            config,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Update and persist the config.
    pub fn save_config(&mut self, config: ScanConfig) -> Result<()> {
        persist_config(&self.data_dir, &config)?;
        self.config = config;
        Ok(())
    }

    /// Make `device` the scanner offered first next time.
    ///
    /// The config file is only rewritten when the preference changes.
    pub fn remember_device(&mut self, device: &str) -> Result<()> {
        if self.config.preferred_device.as_deref() == Some(device) {
            return Ok(());
        }
        let config = ScanConfig {
            preferred_device: Some(device.to_owned()),
            ..self.config.clone()
        };
        self.save_config(config)?;
        info!(device, "preferred device updated");
        Ok(())
    }

    /// A scan service on the backend the config selects.
    pub fn scan_service(&self) -> ScanService {
        ScanService::from_config(self.config.clone())
    }
}

// -- Config file persistence -------------------------------------------------

const CONFIG_FILE: &str = "config.json";

fn load_config(data_dir: &Path) -> Option<ScanConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    serde_json::from_str(&data).ok()
}

fn persist_config(data_dir: &Path, config: &ScanConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_run_writes_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let services = AppServices::init_in(tmp.path().to_path_buf());
        assert_eq!(services.config(), &ScanConfig::default());
        assert_eq!(load_config(tmp.path()), Some(ScanConfig::default()));
    }

    #[test]
    fn saved_config_is_loaded_next_time() {
        let tmp = tempfile::tempdir().unwrap();
        let mut services = AppServices::init_in(tmp.path().to_path_buf());
        services
            .save_config(ScanConfig {
                preferred_device: Some("Canon LiDE".into()),
                jpeg_quality: 85,
                ..ScanConfig::default()
            })
            .unwrap();

        let reloaded = AppServices::init_in(tmp.path().to_path_buf());
        assert_eq!(reloaded.config().preferred_device.as_deref(), Some("Canon LiDE"));
        assert_eq!(reloaded.config().jpeg_quality, 85);
    }

    #[test]
    fn chosen_device_becomes_preferred() {
        let tmp = tempfile::tempdir().unwrap();
        let mut services = AppServices::init_in(tmp.path().to_path_buf());
        services.remember_device("Epson V39").unwrap();

        let reloaded = AppServices::init_in(tmp.path().to_path_buf());
        assert_eq!(reloaded.config().preferred_device.as_deref(), Some("Epson V39"));
        assert_eq!(reloaded.config().jpeg_quality, ScanConfig::default().jpeg_quality);
    }

    #[test]
    fn unchanged_preference_leaves_file_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let mut services = AppServices::init_in(tmp.path().to_path_buf());
        services.remember_device("Epson V39").unwrap();

        // Hand edits survive when the same device is chosen again.
        let path = tmp.path().join(CONFIG_FILE);
        let edited = std::fs::read_to_string(&path).unwrap() + "\n";
        std::fs::write(&path, &edited).unwrap();
        services.remember_device("Epson V39").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), edited);
    }

    #[test]
    fn broken_config_is_not_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "{ not json").unwrap();

        let services = AppServices::init_in(tmp.path().to_path_buf());
        assert_eq!(services.config(), &ScanConfig::default());
        assert_eq!(
            std::fs::read_to_string(tmp.path().join(CONFIG_FILE)).unwrap(),
            "{ not json"
        );
    }
}
