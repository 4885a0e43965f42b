// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for SyScan.

use thiserror::Error;

use crate::types::SessionState;

/// Top-level error type for all SyScan operations.
///
/// Every failure is scoped to the operation that produced it; nothing here is
/// process-fatal.
#[derive(Debug, Error)]
pub enum SyscanError {
    // -- Device errors --
    #[error("no scanner selected")]
    NoDeviceSelected,

    #[error("scanner not found: {0}")]
    DeviceNotFound(String),

    #[error("could not connect to scanner: {0}")]
    DeviceConnection(String),

    // -- Session errors --
    #[error("capture of page {page} failed: {reason}")]
    Capture { page: u32, reason: String },

    #[error("{operation} is not allowed while the session is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    // -- Document errors --
    #[error("document assembly failed: {0}")]
    Assembly(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("imaging subsystem error: {0}")]
    Bridge(String),

    #[error("no imaging subsystem available on this platform")]
    PlatformUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SyscanError>;
