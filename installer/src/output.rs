//! Console reporting helpers.
//!
//! Progress and summaries go to an injected writer rather than straight
//! to the process stderr, so tests can capture everything the user would
//! see.

use crate::plan::RunReport;
use std::fmt::Display;
use std::io::Write;

/// Write one line to the sink, ignoring write failures.
pub fn write_line(sink: &mut dyn Write, message: impl Display) {
    if writeln!(sink, "{message}").is_err() {
        // Best-effort console reporting; nothing sensible to do here.
    }
}

/// Format the end-of-run summary.
#[must_use]
pub fn success_message(report: &RunReport) -> String {
    format!(
        "Provisioning complete: {} tool(s) installed, {} already present, {} step(s) run",
        report.tools_installed, report.tools_already_present, report.steps_completed
    )
}
