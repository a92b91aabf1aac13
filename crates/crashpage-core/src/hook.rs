//! Process-wide panic hook
//!
//! A caught unwind payload only carries the panic message. The hook records
//! the location and call stack on the panicking thread so whichever runner
//! catches the unwind can build a complete [`CapturedError`](crate::CapturedError).

use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, PanicHookInfo};
use std::path::PathBuf;

use tracing::error;

use crate::error::{capture_trace, panic_message, StackFrame};

/// What the hook saw at the moment of the last panic on this thread
#[derive(Debug, Clone)]
pub struct PanicRecord {
    /// Panic payload as text
    pub message: String,
    /// Source file of the panic location
    pub file: PathBuf,
    /// Line of the panic location
    pub line: u32,
    /// Stack at the time of the panic
    pub trace: Vec<StackFrame>,
}

impl PanicRecord {
    fn from_hook(info: &PanicHookInfo<'_>) -> Self {
        let (file, line) = info.location().map_or_else(
            || (PathBuf::from("<unknown>"), 0),
            |location| (PathBuf::from(location.file()), location.line()),
        );

        Self {
            message: panic_message(info.payload()),
            file,
            line,
            trace: capture_trace(&Backtrace::force_capture()),
        }
    }
}

thread_local! {
    static LAST_PANIC: RefCell<Option<PanicRecord>> = const { RefCell::new(None) };
}

/// Install the recording hook, replacing whatever hook was set before
pub fn install() {
    panic::set_hook(Box::new(|info| {
        let record = PanicRecord::from_hook(info);
        error!(
            file = %record.file.display(),
            line = record.line,
            "panic: {}",
            record.message
        );
        LAST_PANIC.with(|slot| {
            if let Ok(mut slot) = slot.try_borrow_mut() {
                *slot = Some(record);
            }
        });
    }));
}

/// Take the record of the last panic on this thread, if any
pub fn take_last_panic() -> Option<PanicRecord> {
    LAST_PANIC.with(|slot| slot.try_borrow_mut().ok().and_then(|mut slot| slot.take()))
}
