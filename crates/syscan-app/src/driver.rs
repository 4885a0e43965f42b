// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Interaction driver — asks the operator what to do next and calls the scan
// service accordingly. All prompts go through `Operator`, so the loop runs
// the same against native dialogs and against a scripted operator.

use syscan_capture::ScanService;
use syscan_core::error::SyscanError;
use syscan_core::human_errors::humanize_error;
use syscan_core::types::{Document, FinalizeOutcome};
use tracing::{error, info};

/// Something that can answer yes/no questions and show messages.
pub trait Operator {
    fn confirm(&mut self, title: &str, question: &str) -> bool;
    fn inform(&mut self, title: &str, message: &str);
    fn alert(&mut self, title: &str, message: &str);
}

/// Native message boxes.
pub struct DialogOperator;

impl Operator for DialogOperator {
    fn confirm(&mut self, title: &str, question: &str) -> bool {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Info)
            .set_title(title)
            .set_description(question)
            .set_buttons(rfd::MessageButtons::YesNo)
            .show()
            == rfd::MessageDialogResult::Yes
    }

    fn inform(&mut self, title: &str, message: &str) {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Info)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }

    fn alert(&mut self, title: &str, message: &str) {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

const TITLE: &str = "SyScan";

/// Run one scanning session from device choice to finished document.
///
/// Returns the document if one was written.
pub fn run(service: &mut ScanService, operator: &mut dyn Operator) -> Option<Document> {
    let devices = match service.list_devices() {
        Ok(devices) => devices,
        Err(err) => {
            report(operator, &err);
            return None;
        }
    };
    if devices.is_empty() {
        operator.alert(
            TITLE,
            "No scanner found.\n\nConnect a scanner, switch it on and start SyScan again.",
        );
        return None;
    }

    // Preferred device first, then the rest in enumeration order.
    let preferred = service.config().preferred_device.clone();
    let mut names: Vec<String> = devices.into_iter().map(|device| device.name).collect();
    if let Some(position) = preferred
        .as_deref()
        .and_then(|wanted| names.iter().position(|name| name == wanted))
    {
        let name = names.remove(position);
        names.insert(0, name);
    }

    let chosen = names
        .into_iter()
        .find(|name| operator.confirm(TITLE, &format!("Scan with \"{name}\"?")));
    let Some(device) = chosen else {
        info!("no scanner chosen");
        return None;
    };

    if let Err(err) = service.start_session(Some(&device)) {
        report(operator, &err);
        return None;
    }

    let resumed = service.session().map(|s| s.resumed_pages()).unwrap_or(0);
    if resumed > 0 {
        info!(resumed, "operator told about pages from an earlier run");
        operator.inform(
            TITLE,
            &format!(
                "{resumed} page(s) from an earlier, unfinished run were found.\n\n\
                 They will be placed at the start of this document."
            ),
        );
    }

    loop {
        let page = service.session().map(|s| s.next_index()).unwrap_or(1);
        let prompt = format!(
            "Place page {page} on the glass and press Yes to scan it.\n\nPress No to finish."
        );
        if !operator.confirm(TITLE, &prompt) {
            break;
        }

        match service.capture_one_page() {
            Ok(captured) => {
                let another = operator.confirm(
                    TITLE,
                    &format!("Page {} captured.\n\nScan another page?", captured.index),
                );
                if !another {
                    break;
                }
                if let Err(err) = service.continue_scanning() {
                    report(operator, &err);
                    break;
                }
            }
            Err(err) => report(operator, &err),
        }
    }

    match service.finalize() {
        Ok(FinalizeOutcome::Assembled(document)) => {
            let mut message = format!(
                "Saved {} page(s) to\n{}",
                document.page_count,
                document.path.display()
            );
            if !document.warnings.is_empty() {
                message.push_str(&format!(
                    "\n\n{} temporary file(s) could not be removed.",
                    document.warnings.len()
                ));
            }
            operator.inform(TITLE, &message);
            Some(document)
        }
        Ok(FinalizeOutcome::NothingToAssemble) => {
            operator.inform(TITLE, "No pages were scanned, so no document was created.");
            None
        }
        Err(err) => {
            report(operator, &err);
            None
        }
    }
}

fn report(operator: &mut dyn Operator, err: &SyscanError) {
    error!(error = %err, "operation failed");
    let human = humanize_error(err);
    operator.alert(TITLE, &format!("{}\n\n{}", human.message, human.suggestion));
}
