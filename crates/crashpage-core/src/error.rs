//! Captured errors and the reporting path's own error type
//!
//! A [`CapturedError`] is the snapshot the dispatcher renders: what failed,
//! where, and the call stack at the time. It is built once when the error
//! reaches the top of the call chain and is never modified afterwards.

use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt;
use std::io;
use std::panic::Location;
use std::path::{Path, PathBuf};

use crate::hook::PanicRecord;

/// Message shown in place of an empty error message
pub const EMPTY_MESSAGE: &str = "(null)";

/// Kind label used for panics, which carry no error type of their own
pub const PANIC_KIND: &str = "panic";

/// Errors raised inside the reporting path itself
///
/// None of these escape [`Dispatcher::handle_uncaught`](crate::Dispatcher::handle_uncaught);
/// they are logged and the report degrades instead.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Reading a file or writing the report failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The YAML configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    /// A template renderer gave up
    #[error("Template '{template}' failed: {message}")]
    Render { template: String, message: String },
}

/// A single frame of the captured call stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Demangled function path
    pub function: String,
    /// Source file, when the frame has debug info
    pub file: Option<PathBuf>,
    /// 1-based source line, when the frame has debug info
    pub line: Option<u32>,
}

impl StackFrame {
    /// Parse the text rendering of a [`Backtrace`] into frames.
    ///
    /// The format is one `N: function` line per frame, optionally followed by
    /// an `at file:line:column` line. Disabled or unsupported backtraces
    /// yield no frames.
    pub fn parse_backtrace(rendered: &str) -> Vec<StackFrame> {
        let mut frames: Vec<StackFrame> = Vec::new();

        for raw in rendered.lines() {
            let line = raw.trim();
            if let Some(location) = line.strip_prefix("at ") {
                if let Some(frame) = frames.last_mut() {
                    if frame.file.is_none() {
                        let (file, line) = split_location(location);
                        frame.file = Some(file);
                        frame.line = line;
                    }
                }
                continue;
            }

            let Some((index, function)) = line.split_once(": ") else {
                continue;
            };
            if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            frames.push(StackFrame {
                function: function.trim().to_string(),
                file: None,
                line: None,
            });
        }

        frames
    }

    /// Whether the frame belongs to the standard library or the panic
    /// machinery rather than to application code
    pub fn is_runtime_internal(&self) -> bool {
        const INTERNAL_PREFIXES: &[&str] = &[
            "std::",
            "core::",
            "alloc::",
            "<alloc::",
            "<core::",
            "<std::",
            "rust_begin_unwind",
            "__rust",
            "__libc",
            "_start",
            "crashpage_core::hook::",
            "crashpage_core::error::",
        ];
        INTERNAL_PREFIXES
            .iter()
            .any(|prefix| self.function.starts_with(prefix))
    }
}

/// Split `path:line:column` from the right, tolerating paths with colons.
fn split_location(location: &str) -> (PathBuf, Option<u32>) {
    let mut parts = location.rsplitn(3, ':');
    let last = parts.next().unwrap_or_default();
    let middle = parts.next();
    let rest = parts.next();

    match (middle, rest) {
        (Some(line), Some(path)) if line.parse::<u32>().is_ok() => {
            (PathBuf::from(path), line.parse().ok())
        }
        (Some(path), None) => (PathBuf::from(path), last.parse().ok()),
        (Some(line), Some(path)) => (PathBuf::from(format!("{path}:{line}")), last.parse().ok()),
        _ => (PathBuf::from(location), None),
    }
}

/// Capture the current call stack, dropping runtime frames
pub(crate) fn capture_trace(backtrace: &Backtrace) -> Vec<StackFrame> {
    StackFrame::parse_backtrace(&backtrace.to_string())
        .into_iter()
        .filter(|frame| !frame.is_runtime_internal())
        .collect()
}

/// An error that reached the top of the call chain unhandled
#[derive(Debug, Clone)]
pub struct CapturedError {
    kind: String,
    code: i64,
    message: String,
    file: PathBuf,
    line: u32,
    trace: Vec<StackFrame>,
}

impl CapturedError {
    /// Build a captured error from its parts. An empty message is replaced
    /// with [`EMPTY_MESSAGE`].
    pub fn new(
        kind: impl Into<String>,
        message: impl Into<String>,
        file: impl Into<PathBuf>,
        line: u32,
    ) -> Self {
        let message = message.into();
        Self {
            kind: kind.into(),
            code: 0,
            message: if message.is_empty() {
                EMPTY_MESSAGE.to_string()
            } else {
                message
            },
            file: file.into(),
            line,
            trace: Vec::new(),
        }
    }

    /// Attach a numeric error code
    #[must_use]
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    /// Attach a call stack
    #[must_use]
    pub fn with_trace(mut self, trace: Vec<StackFrame>) -> Self {
        self.trace = trace;
        self
    }

    /// Capture a returned error at the caller's location.
    ///
    /// The message includes the chain of sources, `outer: inner: root`.
    /// I/O errors contribute their OS error code.
    #[track_caller]
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        let location = Location::caller();
        let dynamic: &(dyn std::error::Error + 'static) = error;

        let mut message = error.to_string();
        let mut source = dynamic.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        let code = dynamic
            .downcast_ref::<io::Error>()
            .and_then(io::Error::raw_os_error)
            .map_or(0, i64::from);

        Self::new(std::any::type_name::<E>(), message, location.file(), location.line())
            .with_code(code)
            .with_trace(capture_trace(&Backtrace::capture()))
    }

    /// Capture any displayable error value at the caller's location
    #[track_caller]
    pub fn from_display<E>(error: &E) -> Self
    where
        E: fmt::Display + ?Sized,
    {
        let location = Location::caller();
        Self::new(
            std::any::type_name::<E>(),
            error.to_string(),
            location.file(),
            location.line(),
        )
        .with_trace(capture_trace(&Backtrace::capture()))
    }

    /// Capture a caught panic.
    ///
    /// The payload only carries the message; location and stack come from
    /// the record left by the panic hook on this thread, when there is one.
    pub fn from_panic(payload: &(dyn Any + Send), record: Option<PanicRecord>) -> Self {
        match record {
            Some(record) => Self::new(PANIC_KIND, record.message, record.file, record.line)
                .with_trace(record.trace),
            None => Self::new(PANIC_KIND, panic_message(payload), "<unknown>", 0),
        }
    }

    /// Classification label derived from the error's type
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Numeric error code, 0 when the error has none
    pub fn code(&self) -> i64 {
        self.code
    }

    /// The error message; never empty
    pub fn message(&self) -> &str {
        &self.message
    }

    /// File the error was raised in
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// 1-based line the error was raised on
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Call stack at the time of capture
    pub fn trace(&self) -> &[StackFrame] {
        &self.trace
    }
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {}:{}",
            self.kind,
            self.message,
            self.file.display(),
            self.line
        )
    }
}

/// Extract the message carried by a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_message_uses_placeholder() {
        let err = CapturedError::new("RuntimeError", "", "src/main.rs", 3);
        assert_eq!(err.message(), EMPTY_MESSAGE);

        let err = CapturedError::new("RuntimeError", "boom", "src/main.rs", 3);
        assert_eq!(err.message(), "boom");
    }

    #[test]
    fn test_from_error_collects_io_code_and_location() {
        let io_err = io::Error::from_raw_os_error(2);
        let err = CapturedError::from_error(&io_err);

        assert_eq!(err.kind(), "std::io::error::Error");
        assert_eq!(err.code(), 2);
        assert!(err.file().ends_with("error.rs"));
        assert!(err.line() > 0);
        assert!(!err.message().is_empty());
    }

    #[test]
    fn test_from_error_includes_source_chain() {
        #[derive(Debug, thiserror::Error)]
        #[error("could not load settings")]
        struct Outer(#[source] io::Error);

        let err = CapturedError::from_error(&Outer(io::Error::new(
            io::ErrorKind::NotFound,
            "settings.yaml missing",
        )));
        assert_eq!(err.message(), "could not load settings: settings.yaml missing");
        assert_eq!(err.code(), 0);
    }

    #[test]
    fn test_from_display_with_empty_text() {
        let err = CapturedError::from_display("");
        assert_eq!(err.message(), EMPTY_MESSAGE);
        assert_eq!(err.kind(), "str");
    }

    #[test]
    fn test_from_panic_without_record() {
        let payload: Box<dyn Any + Send> = Box::new("index out of bounds");
        let err = CapturedError::from_panic(payload.as_ref(), None);
        assert_eq!(err.kind(), PANIC_KIND);
        assert_eq!(err.message(), "index out of bounds");
        assert_eq!(err.line(), 0);

        let payload: Box<dyn Any + Send> = Box::new(String::new());
        let err = CapturedError::from_panic(payload.as_ref(), None);
        assert_eq!(err.message(), EMPTY_MESSAGE);
    }

    #[test]
    fn test_parse_backtrace() {
        let rendered = "   0: app::handlers::checkout\n             at ./src/handlers.rs:42:9\n   1: core::ops::function::FnOnce::call_once\n             at /rustc/abc/library/core/src/ops/function.rs:250:5\n   2: main\n";
        let frames = StackFrame::parse_backtrace(rendered);

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].function, "app::handlers::checkout");
        assert_eq!(frames[0].file.as_deref(), Some(Path::new("./src/handlers.rs")));
        assert_eq!(frames[0].line, Some(42));
        assert!(frames[1].is_runtime_internal());
        assert_eq!(frames[2].function, "main");
        assert_eq!(frames[2].file, None);
    }

    #[test]
    fn test_parse_disabled_backtrace() {
        assert!(StackFrame::parse_backtrace("disabled backtrace").is_empty());
    }

    #[test]
    fn test_split_location_windows_path() {
        let (file, line) = split_location(r"C:\src\main.rs:10:5");
        assert_eq!(file, PathBuf::from(r"C:\src\main.rs"));
        assert_eq!(line, Some(10));
    }
}
