//! Crashpage Core
//!
//! Last-resort reporting for errors that escape every other handler. The
//! crate is split along the two halves of a report:
//!
//! - **Dispatching**: [`ErrorReporter`] installs the panic hook and hands out
//!   one [`Dispatcher`] per run or request. The dispatcher classifies the
//!   execution context, picks a template, unwinds stray output buffers and
//!   writes exactly one page to the [`Output`].
//! - **Source excerpts**: [`highlight_file`] renders a highlighted,
//!   line-numbered window of the failing source file for the detailed page.
//!
//! Templates live behind the [`TemplateRenderer`] seam; [`BuiltinTemplates`]
//! provides the `cli/*` and `html/*` pages.

pub mod config;
pub mod context;
pub mod error;
pub mod excerpt;
pub mod hook;
pub mod html;
pub mod memory;
pub mod output;
pub mod paths;
pub mod reporter;
pub mod templates;

pub use config::ReporterConfig;
pub use context::{display_errors_enabled, ExecutionMode, RenderContext, RequestInfo};
pub use error::{CapturedError, ReportError, StackFrame, EMPTY_MESSAGE};
pub use excerpt::{highlight_file, highlight_file_with, Highlighter, SourceExcerpt, TokenHighlighter};
pub use memory::{describe_memory, peak_memory_usage};
pub use output::{CaptureScope, Output, StatusLine, UNCAUGHT_STATUS};
pub use paths::AppPaths;
pub use reporter::{Dispatcher, ErrorReporter, SHUTDOWN_EXIT_CODE, SHUTDOWN_MESSAGE};
pub use templates::{BuiltinTemplates, ErrorView, TemplateId, TemplateRenderer, TemplateVariant};

/// Version information for the crashpage-core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
