//! Console presentation of a setup run.

use super::setup::{SetupProgress, SetupReport};
use crate::backend::fetcher::{EntryOrigin, FetchResult};
use crate::backend::utils::formater::format_mebibytes;
use std::io::{self, Write};
use std::path::Path;

/// Status line text for a finished entry, e.g. `OK (30.71 MB)`.
pub fn status_text(origin: EntryOrigin, result: &FetchResult) -> String {
    match (&result.outcome, origin) {
        (Ok(bytes), _) => format!("OK ({})", format_mebibytes(*bytes)),
        (Err(e), EntryOrigin::Listed) => format!("FAILED ({})", e.short_reason()),
        (Err(e), EntryOrigin::Discovered) => format!("SKIP ({})", e.short_reason()),
    }
}

/// Writes per-file status lines as a setup progresses.
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Final lines after the run.
    pub fn summary(&mut self, report: &SetupReport) -> io::Result<()> {
        let failures = report.listed_failures();
        if failures == 0 {
            writeln!(self.out, "\nSetup complete!")?;
        } else {
            writeln!(
                self.out,
                "\nSetup finished with {failures} of {} listed files failing.",
                report
                    .entries
                    .iter()
                    .filter(|e| e.origin == EntryOrigin::Listed)
                    .count()
            )?;
        }
        writeln!(self.out, "Files saved to: {}", report.destination.display())?;
        self.out.flush()
    }

    // Console output is best effort; a closed stdout must not abort the run.
    fn emit(&mut self, args: std::fmt::Arguments<'_>) {
        let _ = self.out.write_fmt(args);
        let _ = self.out.flush();
    }
}

impl<W: Write> SetupProgress for ConsoleReporter<W> {
    fn destination_created(&mut self, path: &Path) {
        self.emit(format_args!("Created {} directory\n", path.display()));
    }

    fn group_started(&mut self, label: &str) {
        self.emit(format_args!("\n{label}:\n"));
    }

    fn discovery_started(&mut self) {
        self.emit(format_args!("\nChecking for additional chunk files...\n"));
    }

    fn discovery_failed(&mut self, reason: &str) {
        self.emit(format_args!("Could not auto-detect chunks: {reason}\n"));
    }

    fn entry_started(&mut self, file_name: &str) {
        self.emit(format_args!("Downloading {file_name}... "));
    }

    fn entry_finished(&mut self, origin: EntryOrigin, result: &FetchResult) {
        self.emit(format_args!("{}\n", status_text(origin, result)));
    }
}
