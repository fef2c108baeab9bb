use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;
use std::io;
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Failures raised while executing a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("Undeclared variable '{name}'")]
    UndeclaredVariable { name: String },

    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Unknown operator '{operator}'")]
    UnknownOperator { operator: String },

    #[error("Unsupported construct: {construct}")]
    UnsupportedConstruct { construct: String },

    #[error("Integer overflow in {operation}")]
    IntegerOverflow { operation: String },

    #[error("Could not write program output: {reason}")]
    Output { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Runtime(RuntimeError),
}

/// A structured error produced by the parser or the evaluator.
///
/// The core never renders these itself: callers pick `Display`,
/// [`Diagnostic::render_plain`] or the `ariadne` based [`Diagnostic::report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub message: String,
    pub detail: Option<String>,
    pub hint: Option<String>,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, span: Option<Span>, message: String) -> Self {
        Self {
            kind,
            message,
            detail: None,
            hint: None,
            span,
        }
    }

    pub fn lexical_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Lexical, Some(span), message)
    }

    pub fn syntax_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Syntax, Some(span), message)
    }

    pub fn syntax_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::syntax_error(span, message).with_hint(help)
    }

    /// Builds a runtime diagnostic whose headline is the error's own message.
    pub fn runtime_error(error: RuntimeError, span: Option<Span>) -> Self {
        let message = error.to_string();
        Self::new(ErrorKind::Runtime(error), span, message)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self.kind, ErrorKind::Syntax | ErrorKind::Lexical)
    }

    pub fn runtime(&self) -> Option<&RuntimeError> {
        match &self.kind {
            ErrorKind::Runtime(error) => Some(error),
            _ => None,
        }
    }

    /// 1-based line and column of the span start, if there is one.
    pub fn line_col(&self, source: &str) -> Option<(usize, usize)> {
        let offset = self.span?.start.min(source.len());
        let before = source.get(..offset)?;
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Some((line, column))
    }

    /// Text rendering with the position resolved against `source`.
    pub fn render_plain(&self, source: &str) -> String {
        let (kind_str, _) = self.kind_label();
        let mut text = match self.line_col(source) {
            Some((line, column)) => {
                format!("[{}] {} (line {}, column {})", kind_str, self.message, line, column)
            }
            None => format!("[{}] {}", kind_str, self.message),
        };
        self.push_elaboration(&mut text);
        text
    }

    fn push_elaboration(&self, text: &mut String) {
        if let Some(ref detail) = self.detail {
            text.push_str("\n  → ");
            text.push_str(detail);
        }
        if let Some(ref hint) = self.hint {
            text.push_str("\n  💡 Hint: ");
            text.push_str(hint);
        }
    }

    fn kind_label(&self) -> (&'static str, Color) {
        match self.kind {
            ErrorKind::Lexical => ("Lexical Error", Color::Red),
            ErrorKind::Syntax => ("Syntax Error", Color::Yellow),
            ErrorKind::Runtime(_) => ("Runtime Error", Color::Magenta),
        }
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        if let Err(error) = self.write_report(source, filename, io::stderr()) {
            tracing::error!(%error, "failed to render diagnostic");
            eprintln!("{}", self.render_plain(source));
        }
    }

    /// Writes the annotated `ariadne` report to `out`.
    pub fn write_report<W: io::Write>(
        &self,
        source: &str,
        filename: Option<&str>,
        out: W,
    ) -> io::Result<()> {
        let filename = filename.unwrap_or("<repl>");
        let (kind_str, color) = self.kind_label();
        // Spans are byte offsets; ariadne counts characters.
        let offset = self.span.map_or(0, |span| char_offset(source, span.start));

        let mut report_builder = Report::<(&str, Range<usize>)>::build(ReportKind::Error, filename, offset)
            .with_message(format!("{}: {}", kind_str.fg(color), self.message));

        if let Some(span) = self.span {
            let end = char_offset(source, span.end).max(offset);
            let label_text = self.detail.as_deref().unwrap_or(&self.message);
            report_builder = report_builder.with_label(
                Label::new((filename, offset..end))
                    .with_message(label_text)
                    .with_color(color),
            );
        } else if let Some(ref detail) = self.detail {
            report_builder = report_builder.with_note(detail);
        }

        if let Some(ref help_text) = self.hint {
            report_builder =
                report_builder.with_help(format!("{}", help_text.fg(Color::Cyan)));
        }

        report_builder
            .finish()
            .write((filename, Source::from(source)), out)
    }
}

/// Character index of byte `offset`, clamped to the end of `source`.
fn char_offset(source: &str, offset: usize) -> usize {
    let offset = offset.min(source.len());
    match source.get(..offset) {
        Some(prefix) => prefix.chars().count(),
        None => source.char_indices().take_while(|(i, _)| *i < offset).count(),
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (kind_str, _) = self.kind_label();
        let mut text = format!("[{}] {}", kind_str, self.message);
        self.push_elaboration(&mut text);
        f.write_str(&text)
    }
}

impl std::error::Error for Diagnostic {}
