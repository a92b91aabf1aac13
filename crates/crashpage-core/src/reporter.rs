//! Uncaught-error dispatching
//!
//! One [`ErrorReporter`] is built at startup and shared behind an `Arc`.
//! Each run or request asks it for a [`Dispatcher`], which records the
//! output buffering level at that moment. When an error escapes, the
//! dispatcher is consumed by [`Dispatcher::handle_uncaught`]: it picks a
//! template, fixes up the output buffers and writes a single page.

use std::any::Any;
use std::fmt;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::config::ReporterConfig;
use crate::context::{ExecutionMode, RenderContext, RequestInfo};
use crate::error::{panic_message, CapturedError};
use crate::hook;
use crate::output::{Output, UNCAUGHT_STATUS};
use crate::templates::{BuiltinTemplates, ErrorView, TemplateId, TemplateRenderer, TemplateVariant};

/// Printed when the reporting path itself fails
pub const SHUTDOWN_MESSAGE: &str = "In Shutdown Handler";

/// Exit code used after [`SHUTDOWN_MESSAGE`]
pub const SHUTDOWN_EXIT_CODE: i32 = 255;

/// Shared reporting configuration and template renderer
pub struct ErrorReporter {
    config: ReporterConfig,
    renderer: Arc<dyn TemplateRenderer>,
}

impl fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(ReporterConfig::default())
    }
}

impl ErrorReporter {
    /// Reporter rendering with the [`BuiltinTemplates`]
    pub fn new(config: ReporterConfig) -> Self {
        Self::with_renderer(config, Arc::new(BuiltinTemplates))
    }

    /// Reporter rendering with a custom [`TemplateRenderer`]
    pub fn with_renderer(config: ReporterConfig, renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self { config, renderer }
    }

    /// Active configuration
    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    /// Register the process-wide panic hook.
    ///
    /// Calling this again replaces the previous registration.
    pub fn initialize(self: &Arc<Self>) {
        hook::install();
        debug!(
            display_errors = %self.config.display_errors,
            template_dir = %self.config.template_dir.display(),
            "uncaught error reporting installed"
        );
    }

    /// A dispatcher for one run or request writing to `output`
    pub fn dispatcher<W: Write>(&self, output: &Output<W>) -> Dispatcher<'_> {
        Dispatcher {
            reporter: self,
            ob_level: output.level(),
        }
    }

    /// Build a [`CapturedError`] from a caught unwind payload, using what the
    /// panic hook recorded on this thread
    pub fn capture_panic(payload: &(dyn Any + Send)) -> CapturedError {
        CapturedError::from_panic(payload, hook::take_last_panic())
    }

    /// Run `f` as the body of an interactive command.
    ///
    /// Output goes to stdout. An `Err` or a panic from `f` is reported with
    /// the `cli/*` templates and the run exits with code 1.
    #[track_caller]
    pub fn run<F, E>(&self, f: F) -> ExitCode
    where
        F: FnOnce(&mut Output<io::StdoutLock<'static>>) -> Result<(), E>,
        E: fmt::Display,
    {
        let mut output = Output::new(io::stdout().lock());
        let reported = self.run_with(&mut output, f);

        if let Err(err) = output.unwind_to(0).and_then(|()| output.flush()) {
            warn!(error = %err, "failed to flush output");
        }

        if reported {
            ExitCode::from(1)
        } else {
            ExitCode::SUCCESS
        }
    }

    /// Run `f` against `output`, reporting an `Err` or a panic into the same
    /// output. Returns whether an error was reported.
    ///
    /// A panic while the report itself is being written ends the process
    /// through [`handle_shutdown`](Self::handle_shutdown).
    #[track_caller]
    pub fn run_with<W, F, E>(&self, output: &mut Output<W>, f: F) -> bool
    where
        W: Write,
        F: FnOnce(&mut Output<W>) -> Result<(), E>,
        E: fmt::Display,
    {
        let dispatcher = self.dispatcher(output);

        let error = match panic::catch_unwind(AssertUnwindSafe(|| f(output))) {
            Ok(Ok(())) => return false,
            Ok(Err(err)) => CapturedError::from_display(&err),
            Err(payload) => Self::capture_panic(payload.as_ref()),
        };

        let dispatched = panic::catch_unwind(AssertUnwindSafe(|| {
            dispatcher.handle_uncaught(error, ExecutionMode::Interactive, output, None)
        }));
        if dispatched.is_err() {
            self.handle_shutdown();
        }
        true
    }

    /// Print [`SHUTDOWN_MESSAGE`] and end the process with
    /// [`SHUTDOWN_EXIT_CODE`]
    pub fn handle_shutdown(&self) -> ! {
        error!("error reporting failed, shutting down");
        let mut stdout = io::stdout();
        let _ = stdout.write_all(SHUTDOWN_MESSAGE.as_bytes());
        let _ = stdout.flush();
        std::process::exit(SHUTDOWN_EXIT_CODE)
    }
}

/// Handles at most one uncaught error for one run or request
#[derive(Debug)]
pub struct Dispatcher<'r> {
    reporter: &'r ErrorReporter,
    ob_level: usize,
}

impl Dispatcher<'_> {
    /// Output buffering level when the dispatcher was created
    pub fn ob_level(&self) -> usize {
        self.ob_level
    }

    /// Report `error` into `output` and return the template that was chosen.
    ///
    /// Renderer failures never propagate: whatever was rendered before the
    /// failure is written, or the generic page of the mode if nothing was.
    pub fn handle_uncaught<W: Write>(
        self,
        error: CapturedError,
        mode: ExecutionMode,
        output: &mut Output<W>,
        request: Option<&RequestInfo>,
    ) -> TemplateId {
        let config = self.reporter.config();
        let context = RenderContext::resolve(config, mode);
        let template = TemplateId::select(&context);

        error!(
            kind = error.kind(),
            code = error.code(),
            file = %error.file().display(),
            line = error.line(),
            template = %template,
            "uncaught error: {}",
            error.message()
        );

        if mode == ExecutionMode::Networked && !output.headers_sent() {
            output.set_status(UNCAUGHT_STATUS);
        }

        if output.level() > self.ob_level + 1 {
            if let Err(err) = output.unwind_to(self.ob_level) {
                warn!(error = %err, "failed to flush pending output");
            }
        }

        let view = ErrorView {
            error: &error,
            context: &context,
            request,
            config,
        };

        let mut page = {
            let mut scope = output.capture();
            let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
                self.reporter.renderer.render(&template, &view, &mut scope)
            }));
            match rendered {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(template = %template, error = %err, "error template failed"),
                Err(payload) => {
                    hook::take_last_panic();
                    warn!(
                        template = %template,
                        "error template panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
            scope.finish()
        };

        if page.is_empty() {
            let fallback = TemplateId::new(mode, TemplateVariant::Production);
            if let Err(err) = BuiltinTemplates.render(&fallback, &view, &mut page) {
                warn!(template = %fallback, error = %err, "fallback page failed");
            }
        }

        if let Err(err) = output.write_all(&page) {
            warn!(error = %err, "failed to write error page");
        }
        template
    }

    /// Print [`SHUTDOWN_MESSAGE`] and end the process
    pub fn handle_shutdown(self) -> ! {
        self.reporter.handle_shutdown()
    }
}
