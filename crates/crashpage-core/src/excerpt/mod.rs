//! Source excerpts for error pages
//!
//! [`highlight_file`] reads a source file, highlights it and renders a
//! window of lines around the failing one as a `<pre><code>` fragment:
//!
//! ```rust,no_run
//! use crashpage_core::highlight_file;
//! use std::path::Path;
//!
//! if let Some(html) = highlight_file(Path::new("src/main.rs"), 42, 15) {
//!     println!("{html}");
//! }
//! ```
//!
//! Each row is a `<span class="line">` carrying a fixed-width line number;
//! the failing row is drawn as plain text inside a `line highlight` box.
//! The fragment is always markup-balanced, no matter how the highlighter
//! spread its spans across lines. Every failure (missing file, unreadable
//! file, empty file) yields `None`; this code runs while an error is being
//! reported and must not raise one of its own.

mod balance;
mod highlighter;

pub use balance::{strip_tags, tag_tokens, TagBalance};
pub use highlighter::{extract_body, Highlighter, Palette, TokenHighlighter};

use std::path::Path;

use tracing::debug;

/// Lines shown when the caller does not ask for a specific window
pub const DEFAULT_EXCERPT_LINES: usize = 15;

/// Highlight `lines` rows of `path` around the 1-based `line` with the
/// default highlighter
pub fn highlight_file(path: &Path, line: usize, lines: usize) -> Option<String> {
    highlight_file_with(&TokenHighlighter::default(), path, line, lines)
}

/// Highlight `lines` rows of `path` around the 1-based `line`
pub fn highlight_file_with(
    highlighter: &dyn Highlighter,
    path: &Path,
    line: usize,
    lines: usize,
) -> Option<String> {
    if path.as_os_str().is_empty() {
        return None;
    }

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "source excerpt unavailable");
            return None;
        }
    };
    if bytes.is_empty() {
        return None;
    }

    let source = String::from_utf8_lossy(&bytes);
    Some(SourceExcerpt::build(highlighter, &source, line, lines).render())
}

/// Normalise `\r\n` and lone `\r` line endings to `\n`
pub fn normalize_newlines(source: &str) -> String {
    source.replace("\r\n", "\n").replace('\r', "\n")
}

/// A window of highlighted rows, ready to render
#[derive(Debug, Clone)]
pub struct SourceExcerpt {
    start: usize,
    requested: usize,
    target: usize,
    rows: Vec<(usize, String)>,
    carried: TagBalance,
}

impl SourceExcerpt {
    /// Highlight `source` and cut the window of `lines` rows around `line`.
    ///
    /// The window starts `lines / 2` rows above the target, clamped at the
    /// top of the file, and may be shorter at the bottom.
    pub fn build(highlighter: &dyn Highlighter, source: &str, line: usize, lines: usize) -> Self {
        let lines = lines.max(1);
        let normalized = normalize_newlines(source);
        let text = normalized.strip_suffix('\n').unwrap_or(&normalized);
        let highlighted = highlighter.highlight(text);
        let all: Vec<&str> = extract_body(&highlighted).split('\n').collect();

        let start = line.saturating_sub(lines / 2);

        // Spans opened above the window are still open when it begins.
        let mut carried = TagBalance::default();
        for row in all.iter().take(start) {
            carried.scan(row);
        }

        let rows = all
            .iter()
            .enumerate()
            .skip(start)
            .take(lines)
            .map(|(idx, row)| (idx + 1, (*row).to_string()))
            .collect();

        Self {
            start,
            requested: lines,
            target: line,
            rows,
            carried,
        }
    }

    /// 0-based index of the first row in the window
    pub fn start(&self) -> usize {
        self.start
    }

    /// Rows in the window as `(line number, highlighted markup)`
    pub fn rows(&self) -> &[(usize, String)] {
        &self.rows
    }

    /// Width of the line-number column, sized for the last line the
    /// requested window could reach
    pub fn number_width(&self) -> usize {
        self.start.saturating_add(self.requested).to_string().len()
    }

    /// Render the `<pre><code>` fragment
    pub fn render(&self) -> String {
        let width = self.number_width();
        let mut balance = self.carried.clone();
        let mut out = String::from("<pre><code>");
        out.push_str(&balance.reopen());

        for (number, row) in &self.rows {
            let rendered = if *number == self.target {
                // The highlight box shows plain text; the row's tags follow
                // it so spans opened or closed here stay in step.
                let tags: String = tag_tokens(row).collect();
                format!(
                    "<span class=\"line highlight\"><span class=\"number\">{number:>width$}</span> {}\n</span>{tags}",
                    strip_tags(row)
                )
            } else {
                format!("<span class=\"line\"><span class=\"number\">{number:>width$}</span> {row}\n")
            };
            out.push_str(&balance.scan(&rendered));
        }

        out.push_str(&balance.close_all());
        out.push_str("</code></pre>");
        out
    }
}
