// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// syscan-capture — Device registry, page store and capture session.
//
// `ScanService` is the command interface an interaction driver uses:
// list devices, start a session, capture pages, continue or finalize.

pub mod registry;
pub mod service;
pub mod session;
pub mod store;

#[cfg(test)]
mod mock;

pub use registry::DeviceRegistry;
pub use service::ScanService;
pub use session::CaptureSession;
pub use store::PageStore;
