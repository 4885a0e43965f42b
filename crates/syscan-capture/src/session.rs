// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture session — one run against one scanner.
//
//   Idle ──capture──▶ AwaitingDecision ──continue──▶ Capturing ──capture──▶ ...
//     │                     │                            │
//     └────────finalize─────┴──────────finalize──────────┘──▶ Finalizing ──▶ Done
//
// Any non-terminal state may be abandoned. The session only remembers the
// device *name*: every capture resolves and connects afresh, so a scanner
// unplugged and replugged between pages is picked up again.
//
// The page counter advances only after a page has been written. A failed
// capture leaves the counter and the state exactly as they were, so the
// retry lands on the same index.

use chrono::Local;
use syscan_bridge::ScanItem;
use syscan_core::ScanConfig;
use syscan_core::error::{Result, SyscanError};
use syscan_core::types::{
    CleanupWarning, Document, FinalizeOutcome, ItemProperty, PageImage, SessionState,
    TransferFormat,
};
use syscan_document::DocumentAssembler;
use syscan_document::ImageProcessor;
use syscan_document::integrity::hash_bytes;
use tracing::{debug, info, instrument, warn};

use crate::registry::DeviceRegistry;
use crate::store::PageStore;

/// Per-run state: device, folders, next page index and protocol state.
#[derive(Debug)]
pub struct CaptureSession {
    device_name: String,
    store: PageStore,
    next_index: u32,
    resumed_pages: usize,
    resolution_dpi: u32,
    state: SessionState,
}

impl CaptureSession {
    /// Begin a run against `device_name`.
    ///
    /// Fails with [`SyscanError::NoDeviceSelected`] when no (or a blank)
    /// name is given. The device folders under `config.base_dir` are created
    /// or reused; pages left in the temp folder by an interrupted run are
    /// kept and numbering continues after them.
    #[instrument(skip(config), fields(base = %config.base_dir.display()))]
    pub fn start(device_name: Option<&str>, config: &ScanConfig) -> Result<Self> {
        let device_name = match device_name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => return Err(SyscanError::NoDeviceSelected),
        };

        let store = PageStore::open(&config.base_dir, &device_name)?;
        let leftovers = store.list_pages()?;
        let next_index = leftovers.last().map(|(index, _)| *index).unwrap_or(0) + 1;
        if !leftovers.is_empty() {
            info!(resumed = leftovers.len(), "resuming pages left by a previous run");
        }

        Ok(Self {
            device_name,
            store,
            next_index,
            resumed_pages: leftovers.len(),
            resolution_dpi: config.resolution_dpi,
            state: SessionState::Idle,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Index the next successful capture will receive.
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Pages found in the temp folder at start. They lead the document.
    pub fn resumed_pages(&self) -> usize {
        self.resumed_pages
    }

    pub fn store(&self) -> &PageStore {
        &self.store
    }

    /// Acquire one page from the device and store it losslessly.
    ///
    /// Legal in `Idle` and `Capturing`; success moves to `AwaitingDecision`.
    /// [`SyscanError::DeviceNotFound`] and [`SyscanError::DeviceConnection`]
    /// are returned as-is; every other failure becomes
    /// [`SyscanError::Capture`] for the page being acquired.
    #[instrument(skip(self, registry), fields(device = %self.device_name, page = self.next_index))]
    pub fn capture_one_page(&mut self, registry: &DeviceRegistry) -> Result<PageImage> {
        self.require(
            "capture_one_page",
            &[SessionState::Idle, SessionState::Capturing],
        )?;

        let previous = self.state;
        self.state = SessionState::Capturing;

        match self.acquire(registry, self.next_index) {
            Ok(page) => {
                self.next_index += 1;
                self.state = SessionState::AwaitingDecision;
                info!(
                    path = %page.path.display(),
                    width = page.width,
                    height = page.height,
                    "page captured"
                );
                Ok(page)
            }
            Err(err) => {
                self.state = previous;
                warn!(error = %err, "capture failed");
                Err(err)
            }
        }
    }

    /// The operator wants another page.
    pub fn continue_scanning(&mut self) -> Result<()> {
        self.require("continue_scanning", &[SessionState::AwaitingDecision])?;
        self.state = SessionState::Capturing;
        debug!(next = self.next_index, "continuing");
        Ok(())
    }

    /// Assemble every stored page into one document in the device folder.
    ///
    /// With no stored pages this is [`FinalizeOutcome::NothingToAssemble`]
    /// and no file is written. If assembly or persisting fails the pages
    /// stay on disk and the session returns to the state it was in. Cleanup
    /// problems after the document is written are reported inside the
    /// [`Document`], never as an error.
    #[instrument(skip(self, assembler), fields(device = %self.device_name))]
    pub fn finalize(&mut self, assembler: &DocumentAssembler) -> Result<FinalizeOutcome> {
        self.require(
            "finalize",
            &[
                SessionState::Idle,
                SessionState::Capturing,
                SessionState::AwaitingDecision,
            ],
        )?;

        let previous = self.state;
        self.state = SessionState::Finalizing;

        match self.assemble(assembler) {
            Ok(outcome) => {
                self.state = SessionState::Done;
                Ok(outcome)
            }
            Err(err) => {
                self.state = previous;
                warn!(error = %err, "finalize failed; pages kept");
                Err(err)
            }
        }
    }

    /// Give up on the run.
    ///
    /// The temp folder is removed if it holds no pages; captured pages are
    /// left where they are and a later run against the same device picks
    /// them up.
    #[instrument(skip(self), fields(device = %self.device_name))]
    pub fn abandon(&mut self) -> Result<Vec<CleanupWarning>> {
        if self.state.is_terminal() {
            return Err(self.invalid("abandon"));
        }

        let warnings = if self.store.list_pages()?.is_empty() {
            self.store.cleanup_temp_dir()
        } else {
            info!("captured pages kept for a later run");
            Vec::new()
        };
        self.state = SessionState::Abandoned;
        Ok(warnings)
    }

    // -- Internals ------------------------------------------------------------

    fn require(&self, operation: &'static str, allowed: &[SessionState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> SyscanError {
        SyscanError::InvalidState {
            operation,
            state: self.state,
        }
    }

    fn acquire(&self, registry: &DeviceRegistry, index: u32) -> Result<PageImage> {
        let capture_error = move |reason: String| SyscanError::Capture {
            page: index,
            reason,
        };

        let handle = registry.resolve(&self.device_name)?;
        let connection = registry.connect(&handle)?;
        let mut item = connection
            .items()
            .map_err(|err| capture_error(err.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| capture_error("device exposes no scan source".into()))?;

        self.request_resolution(item.as_mut());

        let raw = item
            .transfer(TransferFormat::Bmp)
            .map_err(|err| capture_error(err.to_string()))?;
        let frame = ImageProcessor::from_bytes(&raw).map_err(|err| capture_error(err.to_string()))?;

        std::fs::create_dir_all(self.store.temp_dir())
            .map_err(|err| capture_error(err.to_string()))?;
        let path = self.store.page_path(index);
        if let Err(err) = frame.save_png(&path) {
            let _ = std::fs::remove_file(&path);
            return Err(capture_error(err.to_string()));
        }

        Ok(PageImage {
            index,
            path,
            width: frame.width(),
            height: frame.height(),
        })
    }

    /// Ask for the configured resolution on both axes. Rejection is logged
    /// and the device keeps its default.
    fn request_resolution(&self, item: &mut dyn ScanItem) {
        let dpi = i32::try_from(self.resolution_dpi).unwrap_or(i32::MAX);
        for property in [
            ItemProperty::HorizontalResolution,
            ItemProperty::VerticalResolution,
        ] {
            if let Err(err) = item.set_property(property, dpi) {
                debug!(property = property.name(), dpi, error = %err, "resolution not applied");
            }
        }
    }

    fn assemble(&self, assembler: &DocumentAssembler) -> Result<FinalizeOutcome> {
        let pages: Vec<_> = self
            .store
            .list_pages()?
            .into_iter()
            .map(|(_, path)| path)
            .collect();

        if pages.is_empty() {
            for warning in self.store.cleanup_temp_dir() {
                warn!(%warning, "cleanup incomplete");
            }
            info!("nothing to assemble");
            return Ok(FinalizeOutcome::NothingToAssemble);
        }

        let bytes = assembler.assemble(&pages, self.store.temp_dir())?;
        let created_at = Local::now();
        let path = assembler.persist(&bytes, self.store.root(), &created_at)?;
        let sha256 = hash_bytes(&bytes);

        let mut warnings = self.store.remove_pages(&pages);
        warnings.extend(self.store.cleanup_temp_dir());
        for warning in &warnings {
            warn!(%warning, "cleanup incomplete");
        }

        info!(path = %path.display(), pages = pages.len(), "document finalized");
        Ok(FinalizeOutcome::Assembled(Document {
            path,
            page_count: pages.len(),
            created_at,
            sha256,
            warnings,
        }))
    }
}
