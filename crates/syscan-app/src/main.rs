// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SyScan — flatbed scan-to-PDF
//
// Entry point. Initialises logging and configuration, then hands control to
// the dialog-driven operator loop.

mod driver;
mod services;

use driver::DialogOperator;
use services::app_services::AppServices;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("SyScan starting");

    let mut services = AppServices::init();
    let mut scan = services.scan_service();
    tracing::info!(backend = scan.platform_name(), "imaging backend selected");

    match driver::run(&mut scan, &mut DialogOperator) {
        Some(document) => tracing::info!(
            path = %document.path.display(),
            pages = document.page_count,
            sha256 = %document.sha256,
            "SyScan finished"
        ),
        None => tracing::info!("SyScan finished without a document"),
    }

    if let Some(device) = scan.session().map(|s| s.device_name().to_owned()) {
        if let Err(err) = services.remember_device(&device) {
            tracing::warn!(error = %err, "could not remember the chosen scanner");
        }
    }
}
