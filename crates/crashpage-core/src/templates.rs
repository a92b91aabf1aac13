//! Error page templates
//!
//! The dispatcher only picks a [`TemplateId`] and assembles an
//! [`ErrorView`]; turning that into bytes is the job of a
//! [`TemplateRenderer`]. [`BuiltinTemplates`] ships the four standard pages:
//!
//! | id                     | audience                                   |
//! |------------------------|--------------------------------------------|
//! | `cli/error_exception`  | terminal, full details and backtrace       |
//! | `cli/production`       | terminal, one generic line                 |
//! | `html/error_exception` | browser, details plus source excerpts      |
//! | `html/production`      | browser, information-free page             |
//!
//! A generic page can be replaced without code: a file at
//! `{template_dir}/{id}`, e.g. `views/errors/html/production`, is sent
//! verbatim instead of the built-in `production` page.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::Utc;
use colored::Colorize;
use tracing::debug;

use crate::config::ReporterConfig;
use crate::context::{ExecutionMode, RenderContext, RequestInfo};
use crate::error::{CapturedError, ReportError};
use crate::excerpt::highlight_file;
use crate::html::escape;
use crate::memory::{describe_memory, peak_memory_usage};

/// Detailed or generic page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateVariant {
    /// Full details about the error
    ErrorException,
    /// Generic page without any error data
    Production,
}

impl TemplateVariant {
    /// File name of the variant
    pub fn name(self) -> &'static str {
        match self {
            TemplateVariant::ErrorException => "error_exception",
            TemplateVariant::Production => "production",
        }
    }
}

/// Identifies one template, e.g. `html/production`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateId {
    /// Selects the `cli/` or `html/` directory
    pub mode: ExecutionMode,
    /// Detailed or generic
    pub variant: TemplateVariant,
}

impl TemplateId {
    /// Template for `mode` and `variant`
    pub fn new(mode: ExecutionMode, variant: TemplateVariant) -> Self {
        Self { mode, variant }
    }

    /// The template a context calls for: the generic page when errors are
    /// not displayed, the detailed one otherwise
    pub fn select(context: &RenderContext) -> Self {
        let variant = if context.display_errors {
            TemplateVariant::ErrorException
        } else {
            TemplateVariant::Production
        };
        Self::new(context.mode, variant)
    }

    /// Path of the template below the template directory
    pub fn path(&self, template_dir: &std::path::Path) -> PathBuf {
        template_dir
            .join(self.mode.template_dir())
            .join(self.variant.name())
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.mode.template_dir(), self.variant.name())
    }
}

/// Everything a template gets to look at
#[derive(Debug, Clone, Copy)]
pub struct ErrorView<'a> {
    /// The error being reported
    pub error: &'a CapturedError,
    /// Mode and display setting it is reported under
    pub context: &'a RenderContext,
    /// Request being served, in networked mode
    pub request: Option<&'a RequestInfo>,
    /// Reporter configuration
    pub config: &'a ReporterConfig,
}

impl ErrorView<'_> {
    /// Displayed form of a failure path
    pub fn clean_path(&self, file: &std::path::Path) -> String {
        self.config.paths.clean_path(file)
    }

    /// Source excerpt around `line` of `file`, if the file can be read
    pub fn excerpt(&self, file: &std::path::Path, line: u32) -> Option<String> {
        let path = self.config.source_path(file);
        highlight_file(&path, line as usize, self.config.excerpt_lines)
    }
}

/// Renders error pages
pub trait TemplateRenderer: Send + Sync {
    /// Write the page `template` for `view` into `out`
    fn render(
        &self,
        template: &TemplateId,
        view: &ErrorView<'_>,
        out: &mut dyn Write,
    ) -> Result<(), ReportError>;
}

/// The pages compiled into the crate
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

impl TemplateRenderer for BuiltinTemplates {
    fn render(
        &self,
        template: &TemplateId,
        view: &ErrorView<'_>,
        out: &mut dyn Write,
    ) -> Result<(), ReportError> {
        if template.variant == TemplateVariant::Production {
            let custom = template.path(&view.context.template_dir);
            match std::fs::read(&custom) {
                Ok(page) => {
                    out.write_all(&page)?;
                    return Ok(());
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => debug!(path = %custom.display(), error = %err, "custom error page unreadable"),
            }
        }

        match (template.mode, template.variant) {
            (ExecutionMode::Interactive, TemplateVariant::ErrorException) => cli_exception(view, out)?,
            (ExecutionMode::Interactive, TemplateVariant::Production) => cli_production(out)?,
            (ExecutionMode::Networked, TemplateVariant::ErrorException) => html_exception(view, out)?,
            (ExecutionMode::Networked, TemplateVariant::Production) => html_production(out)?,
        }
        Ok(())
    }
}

fn cli_exception(view: &ErrorView<'_>, out: &mut dyn Write) -> io::Result<()> {
    let error = view.error;
    let heading = "An uncaught error was encountered";
    let label = |text: &'static str| -> String {
        if view.config.use_colors {
            text.bright_cyan().to_string()
        } else {
            text.to_string()
        }
    };

    writeln!(out)?;
    if view.config.use_colors {
        writeln!(out, "{}", heading.bright_red().bold())?;
    } else {
        writeln!(out, "{heading}")?;
    }
    writeln!(out)?;
    writeln!(out, "{}        {}", label("Type:"), error.kind())?;
    if error.code() != 0 {
        writeln!(out, "{}        {}", label("Code:"), error.code())?;
    }
    writeln!(out, "{}     {}", label("Message:"), error.message())?;
    writeln!(out, "{}    {}", label("Filename:"), view.clean_path(error.file()))?;
    writeln!(out, "{} {}", label("Line Number:"), error.line())?;

    if !error.trace().is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", label("Backtrace:"))?;
        for frame in error.trace() {
            match (&frame.file, frame.line) {
                (Some(file), Some(line)) => writeln!(out, "    {}:{line}", view.clean_path(file))?,
                (Some(file), None) => writeln!(out, "    {}", view.clean_path(file))?,
                _ => {}
            }
            writeln!(out, "    Function: {}", frame.function)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn cli_production(out: &mut dyn Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "The application hit an internal error and could not continue.")?;
    writeln!(out, "Enable display_errors to see the details.")
}

const PAGE_STYLE: &str = "
body { margin: 0; font-family: -apple-system, 'Segoe UI', Helvetica, Arial, sans-serif; color: #222; background: #fafafa; }
.container { max-width: 75rem; margin: 0 auto; padding: 1rem; }
.header { background: #811; color: #fff; }
.header h1 { margin: 0.5rem 0; }
.source { background: #343434; color: #c7c7c7; padding: 0.5rem 1rem; border-radius: 5px; overflow-x: auto; }
.source pre { margin: 0; }
.source span.line { display: block; }
.source span.highlight { background: #7d2c2c; color: #fff; }
.source span.number { color: #666; }
.trace li { margin-bottom: 1rem; }
.trace .args { color: #666; font-size: 0.9rem; }
table.request td { padding: 0.2rem 0.6rem; vertical-align: top; }
.footer { color: #777; border-top: 1px solid #ddd; font-size: 0.85rem; }
";

fn html_exception(view: &ErrorView<'_>, out: &mut dyn Write) -> io::Result<()> {
    let error = view.error;
    let title = escape(error.kind());

    writeln!(out, "<!doctype html>")?;
    writeln!(out, "<html lang=\"en\">")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"UTF-8\">")?;
    writeln!(out, "<meta name=\"robots\" content=\"noindex\">")?;
    writeln!(out, "<title>{title}</title>")?;
    writeln!(out, "<style>{PAGE_STYLE}</style>")?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;

    writeln!(out, "<div class=\"header\"><div class=\"container\">")?;
    if error.code() == 0 {
        writeln!(out, "<h1>{title}</h1>")?;
    } else {
        writeln!(out, "<h1>{title} #{}</h1>", error.code())?;
    }
    writeln!(out, "<p class=\"message\">{}</p>", escape(error.message()))?;
    writeln!(out, "</div></div>")?;

    writeln!(out, "<div class=\"container\">")?;
    writeln!(
        out,
        "<p><b>{}</b> at line <b>{}</b></p>",
        escape(&view.clean_path(error.file())),
        error.line()
    )?;
    if let Some(excerpt) = view.excerpt(error.file(), error.line()) {
        writeln!(out, "<div class=\"source\">{excerpt}</div>")?;
    }
    writeln!(out, "</div>")?;

    if !error.trace().is_empty() {
        writeln!(out, "<div class=\"container\">")?;
        writeln!(out, "<h2>Backtrace</h2>")?;
        writeln!(out, "<ol class=\"trace\">")?;
        for frame in error.trace() {
            writeln!(out, "<li>")?;
            writeln!(out, "<p><code>{}</code>", escape(&frame.function))?;
            if let Some(file) = &frame.file {
                let line = frame.line.map(|line| format!(":{line}")).unwrap_or_default();
                writeln!(out, "<br><span class=\"args\">{}{line}</span>", escape(&view.clean_path(file)))?;
            }
            writeln!(out, "</p>")?;
            if let (Some(file), Some(line)) = (&frame.file, frame.line) {
                if let Some(excerpt) = view.excerpt(file, line) {
                    writeln!(out, "<div class=\"source\">{excerpt}</div>")?;
                }
            }
            writeln!(out, "</li>")?;
        }
        writeln!(out, "</ol>")?;
        writeln!(out, "</div>")?;
    }

    if let Some(request) = view.request {
        writeln!(out, "<div class=\"container\">")?;
        writeln!(out, "<h2>Request</h2>")?;
        writeln!(
            out,
            "<p><code>{} {}</code></p>",
            escape(&request.method),
            escape(&request.uri)
        )?;
        if !request.headers.is_empty() {
            writeln!(out, "<table class=\"request\">")?;
            for (name, value) in &request.headers {
                writeln!(out, "<tr><td>{}</td><td>{}</td></tr>", escape(name), escape(value))?;
            }
            writeln!(out, "</table>")?;
        }
        writeln!(out, "</div>")?;
    }

    writeln!(out, "<div class=\"footer\"><div class=\"container\">")?;
    write!(
        out,
        "<p>Displayed at {} | crashpage {}",
        Utc::now().format("%H:%M:%S %Z"),
        crate::VERSION
    )?;
    if let Some(peak) = peak_memory_usage() {
        write!(out, " | peak memory {}", describe_memory(peak))?;
    }
    writeln!(out, "</p>")?;
    writeln!(out, "</div></div>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")
}

fn html_production(out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "<!doctype html>")?;
    writeln!(out, "<html lang=\"en\">")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"UTF-8\">")?;
    writeln!(out, "<meta name=\"robots\" content=\"noindex\">")?;
    writeln!(out, "<title>Something went wrong</title>")?;
    writeln!(out, "<style>{PAGE_STYLE}</style>")?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "<div class=\"container\">")?;
    writeln!(out, "<h1>Something went wrong</h1>")?;
    writeln!(
        out,
        "<p>The server could not finish your request. Please try again later.</p>"
    )?;
    writeln!(out, "</div>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StackFrame;
    use std::path::Path;

    fn context(mode: ExecutionMode, display_errors: bool) -> RenderContext {
        RenderContext {
            mode,
            display_errors,
            template_dir: PathBuf::from("views/errors"),
        }
    }

    fn render(id: TemplateId, error: &CapturedError, request: Option<&RequestInfo>) -> String {
        let config = ReporterConfig {
            use_colors: false,
            ..ReporterConfig::default()
        };
        let context = context(id.mode, id.variant == TemplateVariant::ErrorException);
        let view = ErrorView {
            error,
            context: &context,
            request,
            config: &config,
        };
        let mut out = Vec::new();
        BuiltinTemplates.render(&id, &view, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_select_variant_and_directory() {
        for (mode, dir) in [(ExecutionMode::Interactive, "cli"), (ExecutionMode::Networked, "html")] {
            let detailed = TemplateId::select(&context(mode, true));
            assert_eq!(detailed.to_string(), format!("{dir}/error_exception"));
            let generic = TemplateId::select(&context(mode, false));
            assert_eq!(generic.to_string(), format!("{dir}/production"));
        }
    }

    #[test]
    fn test_template_path() {
        let id = TemplateId::new(ExecutionMode::Networked, TemplateVariant::Production);
        assert_eq!(id.path(Path::new("views/errors")), PathBuf::from("views/errors/html/production"));
    }

    #[test]
    fn test_custom_production_page_replaces_builtin() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("html")).unwrap();
        std::fs::write(dir.path().join("html").join("production"), "<h1>Be right back</h1>").unwrap();

        let config = ReporterConfig {
            template_dir: dir.path().to_path_buf(),
            ..ReporterConfig::default()
        };
        let error = CapturedError::new("panic", "hidden", "src/a.rs", 1);
        let render_with = |mode| {
            let context = RenderContext::resolve(&config, mode);
            let view = ErrorView {
                error: &error,
                context: &context,
                request: None,
                config: &config,
            };
            let mut out = Vec::new();
            BuiltinTemplates
                .render(&TemplateId::select(&context), &view, &mut out)
                .unwrap();
            String::from_utf8(out).unwrap()
        };

        assert_eq!(render_with(ExecutionMode::Networked), "<h1>Be right back</h1>");
        // no cli/production file, so the terminal keeps the built-in line
        assert!(render_with(ExecutionMode::Interactive).contains("could not continue"));
    }

    #[test]
    fn test_cli_exception_lists_details() {
        let error = CapturedError::new("app::CartError", "cart is empty", "src/cart.rs", 12)
            .with_code(7)
            .with_trace(vec![StackFrame {
                function: "app::cart::checkout".to_string(),
                file: Some(PathBuf::from("src/cart.rs")),
                line: Some(12),
            }]);
        let page = render(
            TemplateId::new(ExecutionMode::Interactive, TemplateVariant::ErrorException),
            &error,
            None,
        );

        assert!(page.contains("An uncaught error was encountered"));
        assert!(page.contains("Type:        app::CartError"));
        assert!(page.contains("Code:        7"));
        assert!(page.contains("Message:     cart is empty"));
        assert!(page.contains("Filename:    src/cart.rs"));
        assert!(page.contains("Line Number: 12"));
        assert!(page.contains("    src/cart.rs:12\n    Function: app::cart::checkout"));
    }

    #[test]
    fn test_production_pages_hide_details() {
        let error = CapturedError::new("panic", "secret detail", "src/db.rs", 3);
        for mode in [ExecutionMode::Interactive, ExecutionMode::Networked] {
            let page = render(TemplateId::new(mode, TemplateVariant::Production), &error, None);
            assert!(!page.contains("secret detail"));
            assert!(!page.contains("src/db.rs"));
        }
    }

    #[test]
    fn test_html_exception_escapes_and_shows_request() {
        let error = CapturedError::new("panic", "<script>alert(1)</script>", "/nowhere/x.rs", 5);
        let request = RequestInfo {
            method: "GET".to_string(),
            uri: "/orders?id=<1>".to_string(),
            headers: vec![("host".to_string(), "shop.test".to_string())],
        };
        let page = render(
            TemplateId::new(ExecutionMode::Networked, TemplateVariant::ErrorException),
            &error,
            Some(&request),
        );

        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!page.contains("<script>"));
        assert!(page.contains("<code>GET /orders?id=&lt;1&gt;</code>"));
        assert!(page.contains("<td>host</td><td>shop.test</td>"));
        // unreadable source: the excerpt section is simply left out
        assert!(!page.contains("class=\"source\""));
    }

    #[test]
    fn test_html_exception_placeholder_message() {
        let error = CapturedError::new("panic", "", "/nowhere/x.rs", 5);
        let page = render(
            TemplateId::new(ExecutionMode::Networked, TemplateVariant::ErrorException),
            &error,
            None,
        );
        assert!(page.contains("<p class=\"message\">(null)</p>"));
    }
}
