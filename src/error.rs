use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;
use std::io;
use thiserror::Error;

/// Character range into the source text, used to place report labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
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
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Parse,
    Runtime,
}

/// Where on the line a diagnostic points, rendered after "Error".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Nowhere,
    AtEnd,
    At(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Location::Nowhere => Ok(()),
            Location::AtEnd => write!(f, " at end"),
            Location::At(lexeme) => write!(f, " at '{}'", lexeme),
        }
    }
}

/// Output style for [`LoxError::report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DiagnosticStyle {
    /// Colored source excerpt with labels.
    #[default]
    Pretty,
    /// Single `[line N] Error: message` line.
    Plain,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("[line {line}] Error{location}: {message}")]
pub struct LoxError {
    pub kind: ErrorKind,
    pub span: Span,
    pub line: usize,
    pub location: Location,
    pub message: String,
    pub help: Option<String>,
}

impl LoxError {
    pub fn new(kind: ErrorKind, span: Span, line: usize, location: Location, message: String) -> Self {
        Self {
            kind,
            span,
            line,
            location,
            message,
            help: None,
        }
    }

    pub fn lex_error(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::Lex, span, line, Location::Nowhere, message)
    }

    pub fn parse_error(span: Span, line: usize, location: Location, message: String) -> Self {
        Self::new(ErrorKind::Parse, span, line, location, message)
    }

    pub fn runtime_error(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::Runtime, span, line, Location::Nowhere, message)
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Scan and parse errors; these keep a program from running at all.
    pub fn is_static(&self) -> bool {
        matches!(self.kind, ErrorKind::Lex | ErrorKind::Parse)
    }

    /// Writes the diagnostic to stderr in the requested style.
    pub fn report(&self, source: &str, filename: Option<&str>, style: DiagnosticStyle) -> io::Result<()> {
        match style {
            DiagnosticStyle::Plain => {
                eprintln!("{}", self);
                Ok(())
            }
            DiagnosticStyle::Pretty => self.report_pretty(source, filename),
        }
    }

    fn report_pretty(&self, source: &str, filename: Option<&str>) -> io::Result<()> {
        let filename = filename.unwrap_or("<repl>");

        let color = match self.kind {
            ErrorKind::Lex => Color::Red,
            ErrorKind::Parse => Color::Yellow,
            ErrorKind::Runtime => Color::Magenta,
        };

        let kind_str = match self.kind {
            ErrorKind::Lex => "Lexical Error",
            ErrorKind::Parse => "Parse Error",
            ErrorKind::Runtime => "Runtime Error",
        };

        // Spans at end of input may sit one past the last character.
        let len = source.chars().count();
        let end = self.span.end.min(len);
        let start = self.span.start.min(end);

        let mut report_builder = Report::build(ReportKind::Error, filename, start)
            .with_message(format!(
                "{}{}: {}",
                kind_str.fg(color),
                self.location,
                self.message
            ))
            .with_label(
                Label::new((filename, start..end))
                    .with_message(format!("line {}: {}", self.line, self.message))
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        report_builder
            .finish()
            .eprint((filename, Source::from(source)))
    }
}
