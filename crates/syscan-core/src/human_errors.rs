// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the person standing at the scanner.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the interaction driver presents it.

use crate::error::SyscanError;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Glitch on the cable or in the driver; trying again usually works.
    Transient,
    /// The operator must do something first (pick a scanner, power it on).
    ActionRequired,
    /// Retrying will not help.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the operator should try (shown as body text).
    pub suggestion: String,
    /// Whether retrying the same operation makes sense.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `SyscanError` into a `HumanError`.
pub fn humanize_error(err: &SyscanError) -> HumanError {
    match err {
        SyscanError::NoDeviceSelected => HumanError {
            message: "No scanner selected.".into(),
            suggestion: "Choose a scanner from the list, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        SyscanError::DeviceNotFound(name) => HumanError {
            message: "The scanner is no longer available.".into(),
            suggestion: format!(
                "Check that \"{name}\" is switched on and its cable is plugged in, then search for scanners again."
            ),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        SyscanError::DeviceConnection(detail) => humanize_connection_error(detail),

        SyscanError::Capture { page, .. } => HumanError {
            message: format!("Page {page} could not be scanned."),
            suggestion: "Make sure the page is on the glass and the lid is closed, then scan the same page again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        SyscanError::InvalidState { .. } => HumanError {
            message: "That step can't be done right now.".into(),
            suggestion: "Finish or restart the current scan first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        SyscanError::Assembly(_) | SyscanError::PdfError(_) => HumanError {
            message: "The PDF could not be created.".into(),
            suggestion: "Your scanned pages are still saved. Check there is free disk space and try finishing again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        SyscanError::ImageError(_) => HumanError {
            message: "A scanned page could not be read.".into(),
            suggestion: "The image may be damaged. Try scanning that page again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        SyscanError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to save here.".into(),
                    suggestion: "Check the folder permissions or choose another output folder in the settings.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        SyscanError::Serialization(_) => HumanError {
            message: "The settings file could not be read.".into(),
            suggestion: "Default settings are being used. Delete the settings file to reset it.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        SyscanError::Bridge(_) => HumanError {
            message: "The scanner driver reported a problem.".into(),
            suggestion: "Try again. If this keeps happening, restart the scanner.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        SyscanError::PlatformUnavailable => HumanError {
            message: "Scanning isn't available on this computer.".into(),
            suggestion: "No supported imaging system was found.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

/// Parse driver-level connection failures into human-readable messages.
fn humanize_connection_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("busy") || lower.contains("in use") {
        HumanError {
            message: "The scanner is busy.".into(),
            suggestion: "Wait for the other program to finish with the scanner, then try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else if lower.contains("offline") || lower.contains("power") {
        HumanError {
            message: "The scanner appears to be turned off.".into(),
            suggestion: "Switch the scanner on, wait until it is ready, then try again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: "We couldn't talk to the scanner.".into(),
            suggestion: format!("Check the cable and try again. (Detail: {detail})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}
