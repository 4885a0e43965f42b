// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan service — the command interface an interaction driver talks to.
//
// The driver owns every decision ("scan this page?", "another one?") and
// calls in here between prompts. Each call returns a value or a typed error
// and never blocks on user interaction itself.

use syscan_bridge::{ImagingSubsystem, platform_bridge};
use syscan_core::ScanConfig;
use syscan_core::error::{Result, SyscanError};
use syscan_core::types::{CleanupWarning, DeviceInfo, FinalizeOutcome, PageImage, SessionState};
use syscan_document::DocumentAssembler;
use tracing::info;

use crate::registry::DeviceRegistry;
use crate::session::CaptureSession;

/// Holds the configuration, the device registry and at most one session.
pub struct ScanService {
    config: ScanConfig,
    registry: DeviceRegistry,
    assembler: DocumentAssembler,
    session: Option<CaptureSession>,
}

impl ScanService {
    pub fn new(subsystem: Box<dyn ImagingSubsystem>, config: ScanConfig) -> Self {
        let assembler = DocumentAssembler::from_config(&config);
        Self {
            config,
            registry: DeviceRegistry::new(subsystem),
            assembler,
            session: None,
        }
    }

    /// Build the service on the backend selected by `config`.
    pub fn from_config(config: ScanConfig) -> Self {
        let subsystem = platform_bridge(&config);
        Self::new(subsystem, config)
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn platform_name(&self) -> &str {
        self.registry.platform_name()
    }

    pub fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        self.registry.list_devices()
    }

    /// The current (or last) session, if any.
    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    /// Begin a run against `device_name`.
    ///
    /// The device must be attached right now. A previous session must have
    /// been finalized or abandoned first.
    pub fn start_session(&mut self, device_name: Option<&str>) -> Result<&CaptureSession> {
        if let Some(state) = self.state().filter(|state| !state.is_terminal()) {
            return Err(SyscanError::InvalidState {
                operation: "start_session",
                state,
            });
        }

        let name = device_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(SyscanError::NoDeviceSelected)?;
        let handle = self.registry.resolve(name)?;

        let session = CaptureSession::start(Some(&handle.name), &self.config)?;
        info!(
            device = %handle.name,
            folder = %session.store().root().display(),
            "session started"
        );
        Ok(self.session.insert(session))
    }

    pub fn capture_one_page(&mut self) -> Result<PageImage> {
        let session = self.session.as_mut().ok_or(SyscanError::NoDeviceSelected)?;
        session.capture_one_page(&self.registry)
    }

    pub fn continue_scanning(&mut self) -> Result<()> {
        self.session
            .as_mut()
            .ok_or(SyscanError::NoDeviceSelected)?
            .continue_scanning()
    }

    /// Assemble the run's pages; the document is titled after the device.
    pub fn finalize(&mut self) -> Result<FinalizeOutcome> {
        let session = self.session.as_mut().ok_or(SyscanError::NoDeviceSelected)?;
        let mut assembler = self.assembler.clone();
        assembler.set_title(format!("{} scan", session.device_name()));
        session.finalize(&assembler)
    }

    pub fn abandon(&mut self) -> Result<Vec<CleanupWarning>> {
        self.session
            .as_mut()
            .ok_or(SyscanError::NoDeviceSelected)?
            .abandon()
    }

    /// Protocol state of the current session, `None` before the first one.
    pub fn state(&self) -> Option<SessionState> {
        self.session.as_ref().map(CaptureSession::state)
    }
}
