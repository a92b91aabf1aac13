//! Markup tag bookkeeping for highlighted rows
//!
//! A highlighter is free to open a span on one line and close it several
//! lines later. [`TagBalance`] tracks which tags are open while rows are
//! emitted so the finished fragment can be closed off cleanly.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

#[allow(clippy::expect_used)]
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// Every markup tag in `row`, in order
pub fn tag_tokens(row: &str) -> impl Iterator<Item = &str> {
    TAG.find_iter(row).map(|m| m.as_str())
}

/// `row` with every markup tag removed
pub fn strip_tags(row: &str) -> Cow<'_, str> {
    TAG.replace_all(row, "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag<'a> {
    Open(&'a str),
    Close,
    Other,
}

fn classify(tag: &str) -> Tag<'_> {
    let inner = &tag[1..tag.len() - 1];
    if inner.starts_with('/') {
        return Tag::Close;
    }
    if inner.ends_with('/') || inner.starts_with('!') || inner.starts_with('?') {
        return Tag::Other;
    }
    let name_len = inner
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(inner.len());
    if name_len == 0 {
        Tag::Other
    } else {
        Tag::Open(&inner[..name_len])
    }
}

/// Stack of currently open tags
#[derive(Debug, Clone, Default)]
pub struct TagBalance {
    open: Vec<String>,
}

impl TagBalance {
    /// Account for every tag in `fragment` and return it with any closing
    /// tag that has nothing left to close removed.
    pub fn scan<'a>(&mut self, fragment: &'a str) -> Cow<'a, str> {
        let mut dropped: Vec<(usize, usize)> = Vec::new();

        for m in TAG.find_iter(fragment) {
            match classify(m.as_str()) {
                Tag::Open(_) => self.open.push(m.as_str().to_string()),
                Tag::Close => {
                    if self.open.pop().is_none() {
                        dropped.push((m.start(), m.end()));
                    }
                }
                Tag::Other => {}
            }
        }

        if dropped.is_empty() {
            return Cow::Borrowed(fragment);
        }

        let mut kept = String::with_capacity(fragment.len());
        let mut last = 0;
        for (start, end) in dropped {
            kept.push_str(&fragment[last..start]);
            last = end;
        }
        kept.push_str(&fragment[last..]);
        Cow::Owned(kept)
    }

    /// Number of tags still open
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// The opening tags of everything still open, outermost first
    pub fn reopen(&self) -> String {
        self.open.concat()
    }

    /// Closing tags for everything still open, innermost first
    pub fn close_all(&mut self) -> String {
        let mut out = String::new();
        while let Some(tag) = self.open.pop() {
            if let Tag::Open(name) = classify(&tag) {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
        out
    }
}
