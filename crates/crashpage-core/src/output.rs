//! Output buffering over the primary sink
//!
//! [`Output`] keeps a stack of in-memory capture buffers in front of the
//! real sink (stdout, a response body). Writes land in the innermost open
//! buffer, or in the sink when none is open. Once anything reaches the sink
//! the response head counts as sent and the status can no longer change.
//!
//! ```rust
//! use crashpage_core::Output;
//! use std::io::Write;
//!
//! let mut output = Output::new(Vec::new());
//! let mut scope = output.capture();
//! write!(scope, "captured").unwrap();
//! assert_eq!(scope.finish(), b"captured");
//! assert_eq!(output.level(), 0);
//! ```

use std::fmt;
use std::io::{self, Write};

/// An HTTP status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLine {
    /// e.g. `HTTP/1.1`
    pub protocol: &'static str,
    /// Numeric status
    pub code: u16,
    /// Reason phrase sent after the code
    pub reason: &'static str,
}

/// Status set on networked responses carrying an uncaught-error page.
///
/// Code 500 travels with the reason phrase "Unauthorized". Existing
/// clients match on this exact line, so it is kept as is.
pub const UNCAUGHT_STATUS: StatusLine = StatusLine {
    protocol: "HTTP/1.1",
    code: 500,
    reason: "Unauthorized",
};

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.protocol, self.code, self.reason)
    }
}

/// Buffered output in front of a primary sink
#[derive(Debug)]
pub struct Output<W: Write> {
    sink: W,
    buffers: Vec<Vec<u8>>,
    status: Option<StatusLine>,
    headers_sent: bool,
}

impl<W: Write> Output<W> {
    /// Unbuffered output writing straight to `sink`
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            buffers: Vec::new(),
            status: None,
            headers_sent: false,
        }
    }

    /// Number of open capture buffers
    pub fn level(&self) -> usize {
        self.buffers.len()
    }

    /// Open a new capture buffer
    pub fn begin(&mut self) {
        self.buffers.push(Vec::new());
    }

    /// Contents of the innermost buffer
    pub fn contents(&self) -> Option<&[u8]> {
        self.buffers.last().map(Vec::as_slice)
    }

    /// Close the innermost buffer, discarding it into the return value
    pub fn end_clean(&mut self) -> Option<Vec<u8>> {
        self.buffers.pop()
    }

    /// Close the innermost buffer, passing its contents outwards.
    ///
    /// Returns `false` when no buffer was open.
    pub fn end_flush(&mut self) -> io::Result<bool> {
        match self.buffers.pop() {
            Some(buffer) => {
                self.write_all(&buffer)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Flush and close buffers until only `level` remain
    pub fn unwind_to(&mut self, level: usize) -> io::Result<()> {
        while self.level() > level {
            self.end_flush()?;
        }
        Ok(())
    }

    /// Open a capture scope. Whatever the scope does not [`finish`](CaptureScope::finish)
    /// is discarded when it is dropped.
    pub fn capture(&mut self) -> CaptureScope<'_, W> {
        self.begin();
        let level = self.level();
        CaptureScope {
            output: self,
            level,
            finished: false,
        }
    }

    /// Whether anything has reached the primary sink
    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// Set the response status. Ignored once the head has been sent.
    pub fn set_status(&mut self, status: StatusLine) -> bool {
        if self.headers_sent {
            return false;
        }
        self.status = Some(status);
        true
    }

    /// Status line set so far, if any
    pub fn status(&self) -> Option<StatusLine> {
        self.status
    }

    /// The underlying sink
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Flush every open buffer into the sink and return it
    pub fn into_inner(mut self) -> io::Result<W> {
        self.unwind_to(0)?;
        self.sink.flush()?;
        Ok(self.sink)
    }
}

impl<W: Write> Write for Output<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(buffer) = self.buffers.last_mut() {
            buffer.extend_from_slice(buf);
            return Ok(buf.len());
        }
        let written = self.sink.write(buf)?;
        if written > 0 {
            self.headers_sent = true;
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

/// Guard over one capture buffer of an [`Output`]
#[derive(Debug)]
pub struct CaptureScope<'a, W: Write> {
    output: &'a mut Output<W>,
    level: usize,
    finished: bool,
}

impl<W: Write> CaptureScope<'_, W> {
    /// Close the scope and take what it captured. Buffers opened inside the
    /// scope and left open are folded into the result.
    pub fn finish(mut self) -> Vec<u8> {
        self.finished = true;
        let mut nested = Vec::new();
        while self.output.level() > self.level {
            if let Some(inner) = self.output.buffers.pop() {
                nested.splice(0..0, inner);
            }
        }
        let mut captured = self.output.buffers.pop().unwrap_or_default();
        captured.extend_from_slice(&nested);
        captured
    }

    /// The output behind this scope
    pub fn output(&mut self) -> &mut Output<W> {
        self.output
    }
}

impl<W: Write> Write for CaptureScope<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Write> Drop for CaptureScope<'_, W> {
    fn drop(&mut self) {
        if !self.finished {
            self.output.buffers.truncate(self.level - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbuffered_write_sends_headers() {
        let mut output = Output::new(Vec::new());
        assert!(output.set_status(UNCAUGHT_STATUS));
        output.write_all(b"body").unwrap();
        assert!(output.headers_sent());
        assert!(!output.set_status(StatusLine {
            protocol: "HTTP/1.1",
            code: 200,
            reason: "OK"
        }));
        assert_eq!(output.status(), Some(UNCAUGHT_STATUS));
        assert_eq!(output.get_ref(), b"body");
    }

    #[test]
    fn test_buffered_write_keeps_head_open() {
        let mut output = Output::new(Vec::new());
        output.begin();
        output.write_all(b"pending").unwrap();
        assert!(!output.headers_sent());
        assert_eq!(output.contents(), Some(&b"pending"[..]));
        assert_eq!(output.end_clean(), Some(b"pending".to_vec()));
        assert!(output.get_ref().is_empty());
    }

    #[test]
    fn test_unwind_flushes_outwards() {
        let mut output = Output::new(Vec::new());
        output.begin();
        output.write_all(b"a").unwrap();
        output.begin();
        output.write_all(b"b").unwrap();
        output.begin();
        output.write_all(b"c").unwrap();

        output.unwind_to(1).unwrap();
        assert_eq!(output.level(), 1);
        assert_eq!(output.contents(), Some(&b"abc"[..]));
        assert!(output.end_flush().unwrap());
        assert!(!output.end_flush().unwrap());
        assert_eq!(output.get_ref(), b"abc");
    }

    #[test]
    fn test_scope_finish_folds_nested_buffers() {
        let mut output = Output::new(Vec::new());
        let mut scope = output.capture();
        scope.write_all(b"outer ").unwrap();
        scope.output().begin();
        scope.write_all(b"inner").unwrap();
        assert_eq!(scope.finish(), b"outer inner");
        assert_eq!(output.level(), 0);
    }

    #[test]
    fn test_dropped_scope_discards() {
        let mut output = Output::new(Vec::new());
        output.begin();
        {
            let mut scope = output.capture();
            scope.write_all(b"lost").unwrap();
            scope.output().begin();
        }
        assert_eq!(output.level(), 1);
        assert_eq!(output.contents(), Some(&b""[..]));
    }

    #[test]
    fn test_status_line_display() {
        assert_eq!(UNCAUGHT_STATUS.to_string(), "HTTP/1.1 500 Unauthorized");
    }

    #[test]
    fn test_into_inner_flushes_everything() {
        let mut output = Output::new(Vec::new());
        output.begin();
        output.write_all(b"left open").unwrap();
        assert_eq!(output.into_inner().unwrap(), b"left open");
    }
}
