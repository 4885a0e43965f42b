// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the SyScan scanning pipeline.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A capture device as reported by the imaging subsystem.
///
/// Discovered fresh on every enumeration; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Subsystem-specific identifier used to open a connection.
    pub id: String,
    /// Human-chosen device name. This is the device's identity for the user
    /// and for the per-device output folder.
    pub name: String,
}

/// A device resolved by name against a fresh enumeration, ready to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    pub id: String,
    pub name: String,
}

impl From<DeviceInfo> for DeviceHandle {
    fn from(info: DeviceInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
        }
    }
}

/// Lifecycle states of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Started, no page captured yet.
    Idle,
    /// The driver asked for another page; the next capture may run.
    Capturing,
    /// A page was captured; waiting for "continue" or "finalize".
    AwaitingDecision,
    /// Document assembly in progress.
    Finalizing,
    /// Finalized (with or without a document).
    Done,
    /// The operator gave up on the run.
    Abandoned,
}

impl SessionState {
    /// Whether the session has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Abandoned)
    }
}

/// One successfully captured page, persisted losslessly in the page store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    /// 1-based acquisition index.
    pub index: u32,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// A temporary artifact that could not be removed. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl std::fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not remove {}: {}", self.path.display(), self.reason)
    }
}

/// The terminal artifact of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub path: PathBuf,
    pub page_count: usize,
    pub created_at: DateTime<Local>,
    /// SHA-256 of the persisted bytes, lowercase hex.
    pub sha256: String,
    /// Cleanup problems encountered after the document was persisted.
    pub warnings: Vec<CleanupWarning>,
}

/// Result of finalizing a session.
#[derive(Debug, Clone)]
pub enum FinalizeOutcome {
    /// A document was written.
    Assembled(Document),
    /// No pages were captured, so no document was created.
    NothingToAssemble,
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

/// Item properties a scan source may accept. Setting them is best-effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemProperty {
    /// Horizontal resolution in DPI.
    HorizontalResolution,
    /// Vertical resolution in DPI.
    VerticalResolution,
}

impl ItemProperty {
    /// Property name as published by the imaging subsystem.
    pub fn name(&self) -> &'static str {
        match self {
            Self::HorizontalResolution => "Horizontal Resolution",
            Self::VerticalResolution => "Vertical Resolution",
        }
    }
}

/// Raster formats a frame can be transferred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferFormat {
    /// Uncompressed Windows bitmap.
    Bmp,
    Png,
}

impl TransferFormat {
    /// Format GUID understood by WIA-style subsystems.
    pub fn format_id(&self) -> &'static str {
        match self {
            Self::Bmp => "{B96B3CAB-0728-11D3-9D7B-0000F81EF32E}",
            Self::Png => "{B96B3CAF-0728-11D3-9D7B-0000F81EF32E}",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_210_by_297() {
        assert_eq!(PaperSize::A4.dimensions_mm(), (210, 297));
    }

    #[test]
    fn terminal_states() {
        assert!(SessionState::Done.is_terminal());
        assert!(SessionState::Abandoned.is_terminal());
        assert!(!SessionState::AwaitingDecision.is_terminal());
        assert!(!SessionState::Idle.is_terminal());
    }

    #[test]
    fn resolution_property_names() {
        assert_eq!(
            ItemProperty::HorizontalResolution.name(),
            "Horizontal Resolution"
        );
        assert_eq!(ItemProperty::VerticalResolution.name(), "Vertical Resolution");
    }
}
