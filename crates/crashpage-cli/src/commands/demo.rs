//! Demo command - fails on purpose under the interactive runner

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::anyhow;
use crashpage_core::{ErrorReporter, ReporterConfig};

/// Run a job that fails with `message`, by returning an error or by
/// panicking, and let the reporter print the report
pub fn execute(config: ReporterConfig, panic: bool, message: &str) -> ExitCode {
    let reporter = Arc::new(ErrorReporter::new(config));
    reporter.initialize();

    reporter.run(|out| -> anyhow::Result<()> {
        writeln!(out, "Running demo job")?;
        if panic {
            fail_hard(message);
        }
        Err(anyhow!("{message}"))
    })
}

#[allow(clippy::panic)]
fn fail_hard(message: &str) -> ! {
    panic!("{message}")
}
