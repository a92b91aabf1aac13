//! Syntax highlighting for source excerpts
//!
//! The excerpt formatter treats highlighting as a collaborator: anything
//! that turns source text into HTML with inline spans will do. The default
//! [`TokenHighlighter`] is a small lexer for C-family sources (Rust first
//! among them) that colours comments, strings, literals and keywords.

use logos::Logos;
use std::fmt::Write;

use crate::html::escape;

/// Turns source text into highlighted HTML
pub trait Highlighter {
    /// Highlight `source`, returning the markup wrapped in a `<code>` element.
    /// Line breaks in the source stay `\n` in the output.
    fn highlight(&self, source: &str) -> String;
}

/// Strip the `<code>` wrapper a [`Highlighter`] puts around its output
pub fn extract_body(highlighted: &str) -> &str {
    let body = highlighted.trim();
    let body = body.strip_prefix("<code>").unwrap_or(body);
    body.strip_suffix("</code>").unwrap_or(body)
}

/// Colours used by [`TokenHighlighter`], as CSS `color` values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// Line and block comments
    pub comment: String,
    /// Identifiers, punctuation and anything unclassified
    pub default: String,
    /// Numbers, chars, lifetimes and the boolean literals
    pub literal: String,
    /// Reserved words
    pub keyword: String,
    /// String literals of every flavour
    pub string: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            comment: "#767a7e; font-style: italic".to_string(),
            default: "#c7c7c7".to_string(),
            literal: "#06B".to_string(),
            keyword: "#f1ce61".to_string(),
            string: "#869d6a".to_string(),
        }
    }
}

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "union", "unsafe", "use", "where", "while", "yield",
    // C family
    "case", "catch", "class", "default", "do", "function", "new", "null", "switch", "this",
    "throw", "try", "var", "void",
];

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    #[regex(r"[ \t\n\r\f]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    #[regex(r#""([^"\\]|\\.|\\\n)*""#)]
    Str,

    #[regex(r"'([^'\\\n]|\\[^\n][^'\n]*)'")]
    Char,

    #[regex(r"'[A-Za-z_][A-Za-z0-9_]*")]
    Lifetime,

    #[regex(r"#!?\[[^\]\n]*\]")]
    Attribute,

    #[regex(r"[0-9][0-9A-Za-z_]*(\.[0-9][0-9A-Za-z_]*)?")]
    Number,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Word,
}

/// Consume a block comment up to and including its `*/`, or to the end of
/// the input when it is never closed.
fn block_comment(lex: &mut logos::Lexer<Lexeme>) -> bool {
    let remainder = lex.remainder();
    let len = remainder.find("*/").map_or(remainder.len(), |end| end + 2);
    lex.bump(len);
    true
}

/// Lexer-driven highlighter for C-family sources
#[derive(Debug, Clone, Default)]
pub struct TokenHighlighter {
    palette: Palette,
}

impl TokenHighlighter {
    /// Highlighter painting with `palette`
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    /// Colours in use
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    fn color_of(&self, lexeme: Lexeme, text: &str) -> Option<&str> {
        match lexeme {
            Lexeme::LineComment | Lexeme::BlockComment => Some(&self.palette.comment),
            Lexeme::Str | Lexeme::Char => Some(&self.palette.string),
            Lexeme::Number | Lexeme::Lifetime | Lexeme::Attribute => Some(&self.palette.literal),
            Lexeme::Word if KEYWORDS.contains(&text) => Some(&self.palette.keyword),
            Lexeme::Word | Lexeme::Whitespace => None,
        }
    }
}

impl Highlighter for TokenHighlighter {
    fn highlight(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len() * 2);
        let _ = write!(out, "<code><span style=\"color: {}\">", self.palette.default);

        let mut lex = Lexeme::lexer(source);
        while let Some(result) = lex.next() {
            let text = lex.slice();
            let color = result.ok().and_then(|lexeme| self.color_of(lexeme, text));
            match color {
                Some(color) => {
                    let _ = write!(out, "<span style=\"color: {color}\">{}</span>", escape(text));
                }
                None => out.push_str(&escape(text)),
            }
        }

        out.push_str("</span></code>");
        out
    }
}
