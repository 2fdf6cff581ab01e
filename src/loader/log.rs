use std::{borrow::Cow, fmt::Display};

use crate::loader::Span;

/// Sink for diagnostics collected while loading definition files and while
/// scanning or parsing a source file.
///
/// Entries carry an optional byte span into the held source; rendering
/// quotes the offending line with a caret underneath.
pub struct Logs<'a> {
    file: String,
    src: Cow<'a, str>,
    logs: Vec<LogEntry>,
    has_error: bool,
}

impl<'a> Logs<'a> {
    pub fn new(file: impl Into<String>, src: impl Into<Cow<'a, str>>) -> Self {
        Self {
            file: file.into(),
            src: src.into(),
            logs: Vec::new(),
            has_error: false,
        }
    }

    pub fn contains_errors(&self) -> bool {
        self.has_error
    }

    pub fn emit(&mut self, entry: LogEntry) {
        self.has_error |= matches!(entry.level, LogLevel::Error);
        self.logs.push(entry);
    }

    pub fn emit_error(&mut self, msg: impl Into<String>, span: Span) {
        self.emit(LogEntry {
            message: msg.into(),
            span: Some(span),
            level: LogLevel::Error,
        });
    }

    pub fn emit_error_locless(&mut self, msg: impl Into<String>) {
        self.emit(LogEntry {
            message: msg.into(),
            span: None,
            level: LogLevel::Error,
        });
    }

    pub fn emit_warning(&mut self, msg: impl Into<String>, span: Span) {
        self.emit(LogEntry {
            message: msg.into(),
            span: Some(span),
            level: LogLevel::Warning,
        });
    }

    pub fn emit_warning_locless(&mut self, msg: impl Into<String>) {
        self.emit(LogEntry {
            message: msg.into(),
            span: None,
            level: LogLevel::Warning,
        });
    }

    pub fn emit_info(&mut self, msg: impl Into<String>, span: Span) {
        self.emit(LogEntry {
            message: msg.into(),
            span: Some(span),
            level: LogLevel::Info,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn displayable(&self) -> impl Iterator<Item = LogEntryDisplay<'_>> {
        self.logs.iter().map(|entry| LogEntryDisplay {
            file: &self.file,
            src: &self.src,
            entry,
        })
    }

    /// Detach the sink from the borrowed source so it can outlive it.
    pub fn into_owned(self) -> Logs<'static> {
        Logs {
            file: self.file,
            src: Cow::Owned(self.src.into_owned()),
            logs: self.logs,
            has_error: self.has_error,
        }
    }
}

pub enum LogLevel {
    Info,
    Warning,
    Error,
}

pub struct LogEntry {
    pub message: String,
    pub span: Option<Span>,
    pub level: LogLevel,
}

pub struct LogEntryDisplay<'a> {
    file: &'a str,
    src: &'a str,
    entry: &'a LogEntry,
}

impl<'a> Display for LogEntryDisplay<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        pub const RESET: &str = "\x1b[0;22m";
        pub const BOLD: &str = "\x1b[1m";
        pub const RED: &str = "\x1b[31m";
        pub const YELLOW: &str = "\x1b[33m";
        pub const CYAN: &str = "\x1b[36m";

        match self.entry.level {
            LogLevel::Info => write!(f, "{BOLD}{CYAN}info{RESET}{BOLD}: ")?,
            LogLevel::Warning => write!(f, "{BOLD}{YELLOW}warning{RESET}{BOLD}: ")?,
            LogLevel::Error => write!(f, "{BOLD}{RED}error{RESET}{BOLD}: ")?,
        }
        writeln!(f, "{}{RESET}", self.entry.message)?;

        if let Some(span) = self.entry.span {
            let at = span.0.min(self.src.len());
            let before = self.src.get(..at).unwrap_or("");
            let line_no = 1 + before.bytes().filter(|&b| b == b'\n').count();

            let start = before.rfind('\n').map(|v| v + 1).unwrap_or(0);
            let end = self
                .src
                .get(at..)
                .and_then(|s| s.find('\n'))
                .map(|v| v + at)
                .unwrap_or(self.src.len());

            let prefix = format!(" {}:{}: ", self.file, line_no);
            write!(f, "{BOLD}{CYAN}{prefix}{RESET}")?;
            for char in self.src.get(start..end).unwrap_or("").chars() {
                if char == '\t' {
                    write!(f, " ")?
                } else {
                    write!(f, "{char}")?
                }
            }
            writeln!(f)?;

            let col = self.src.get(start..at).unwrap_or("").chars().count();
            for _ in 0..prefix.chars().count() + col {
                write!(f, " ")?;
            }
            writeln!(f, "{BOLD}{RED}^{RESET}")?;
        }

        Ok(())
    }
}
