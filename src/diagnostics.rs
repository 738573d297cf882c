//! Turns front-end failures into reports for stderr.
//!
//! Tokenizer and parser errors carry a [`Position`] and are rendered against
//! the source with ariadne. I/O and internal errors have no location and are
//! printed as a header line plus notes.

use std::any::Any;
use std::fmt;
use std::io::IsTerminal;
use std::ops::Range;
use std::path::Path;

use ariadne::{sources, Config, Label, Report, ReportKind};

use crate::parser::ParseError;
use crate::tokenizer::{Position, SyntaxError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticStage {
    Tokenize,
    Parse,
    Io,
    Internal,
}

impl DiagnosticStage {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticStage::Tokenize => "CHEM-TOKENIZE-001",
            DiagnosticStage::Parse => "CHEM-PARSE-001",
            DiagnosticStage::Io => "CHEM-IO-001",
            DiagnosticStage::Internal => "CHEM-ICE-001",
        }
    }

    fn summary(self) -> &'static str {
        match self {
            DiagnosticStage::Tokenize => "tokenization failed",
            DiagnosticStage::Parse => "parsing failed",
            DiagnosticStage::Io => "i/o failed",
            DiagnosticStage::Internal => "internal compiler error",
        }
    }
}

impl fmt::Display for DiagnosticStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticStage::Tokenize => "tokenize",
            DiagnosticStage::Parse => "parse",
            DiagnosticStage::Io => "io",
            DiagnosticStage::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// An error that points at one place in the source file.
pub trait SourceError {
    const STAGE: DiagnosticStage;

    fn position(&self) -> Position;
    fn label(&self) -> String;
}

impl SourceError for SyntaxError {
    const STAGE: DiagnosticStage = DiagnosticStage::Tokenize;

    fn position(&self) -> Position {
        self.position
    }

    fn label(&self) -> String {
        self.message.clone()
    }
}

impl SourceError for ParseError {
    const STAGE: DiagnosticStage = DiagnosticStage::Parse;

    fn position(&self) -> Position {
        self.position
    }

    fn label(&self) -> String {
        format!("expected {}, found {}", self.expected, self.found)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceSnippet {
    pub file_id: String,
    pub text: String,
    pub span: Range<usize>,
    pub label: String,
}

#[derive(Clone, Debug)]
pub struct CompilerDiagnostic {
    pub stage: DiagnosticStage,
    pub message: String,
    pub snippet: Option<SourceSnippet>,
    pub notes: Vec<String>,
}

impl CompilerDiagnostic {
    pub fn new(stage: DiagnosticStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            snippet: None,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn code(&self) -> &'static str {
        self.stage.code()
    }

    pub fn from_source_error<E: SourceError>(source: &str, path: &Path, error: &E) -> Self {
        let position = error.position();
        let mut diagnostic = Self::new(E::STAGE, E::STAGE.summary()).with_note(format!(
            "at line {}, column {}",
            position.line, position.column
        ));
        diagnostic.snippet = Some(SourceSnippet {
            file_id: path.display().to_string(),
            text: source.to_string(),
            span: span_at(source, position),
            label: error.label(),
        });
        diagnostic
    }

    /// The outermost context becomes part of the message, inner causes become notes.
    pub fn from_io(error: &anyhow::Error) -> Self {
        let mut causes = error.chain();
        let message = match causes.next() {
            Some(primary) => format!("{}: {primary}", DiagnosticStage::Io.summary()),
            None => DiagnosticStage::Io.summary().to_string(),
        };
        causes.fold(Self::new(DiagnosticStage::Io, message), |diagnostic, cause| {
            diagnostic.with_note(format!("caused by: {cause}"))
        })
    }

    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let panic_message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => payload
                .downcast_ref::<&'static str>()
                .map_or("panic with non-string payload", |message| *message)
                .to_string(),
        };
        let stage = DiagnosticStage::Internal;
        Self::new(stage, stage.summary()).with_note(format!("panic: {panic_message}"))
    }

    pub fn render_plain(&self) -> String {
        self.render(false)
    }

    pub fn render_terminal_auto(&self) -> String {
        self.render(std::io::stderr().is_terminal())
    }

    fn header(&self) -> String {
        format!("error[{}:{}]: {}", self.stage, self.code(), self.message)
    }

    fn render(&self, use_color: bool) -> String {
        let Some(snippet) = &self.snippet else {
            return self.render_without_source();
        };

        let location = (snippet.file_id.clone(), snippet.span.clone());
        let mut report = Report::build(ReportKind::Error, location.clone())
            .with_code(self.code())
            .with_message(self.header())
            .with_config(Config::default().with_color(use_color))
            .with_label(Label::new(location).with_message(snippet.label.clone()));
        for note in &self.notes {
            report = report.with_note(note);
        }

        let mut output = Vec::new();
        let cache = sources([(snippet.file_id.clone(), snippet.text.clone())]);
        match report.finish().write(cache, &mut output) {
            Ok(()) => String::from_utf8_lossy(&output).trim_end().to_string(),
            Err(_) => self.render_without_source(),
        }
    }

    fn render_without_source(&self) -> String {
        std::iter::once(self.header())
            .chain(self.notes.iter().map(|note| format!("note: {note}")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for CompilerDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_plain())
    }
}

/// The char at `position`, or one byte past the end of input.
fn span_at(source: &str, position: Position) -> Range<usize> {
    let start = position.offset().min(source.len());
    let width = source[start..].chars().next().map_or(1, char::len_utf8);
    start..start + width
}
