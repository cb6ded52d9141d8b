//! Terminal output for the envtel CLI
//!
//! Human mode prints marked status lines and aligned fields. JSON mode
//! reserves stdout for structured documents and reports problems on stderr
//! as one-line JSON objects.

use serde_json::{json, Value};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Success,
    Error,
    Warn,
    Info,
}

#[derive(Debug, PartialEq, Eq)]
enum Line {
    Stdout(String),
    Stderr(String),
}

/// Width of the label column in `field` lines, colon included.
const LABEL_WIDTH: usize = 13;

fn render(format: OutputFormat, level: Level, message: &str) -> Option<Line> {
    match (format, level) {
        (OutputFormat::Human, Level::Success) => Some(Line::Stdout(format!("\u{2713} {message}"))),
        (OutputFormat::Human, Level::Info) => Some(Line::Stdout(format!("  {message}"))),
        (OutputFormat::Human, Level::Error) => {
            Some(Line::Stderr(format!("\u{2717} Error: {message}")))
        }
        (OutputFormat::Human, Level::Warn) => {
            Some(Line::Stderr(format!("\u{26a0} Warning: {message}")))
        }
        (OutputFormat::Json, Level::Error) => Some(Line::Stderr(
            json!({ "success": false, "error": message }).to_string(),
        )),
        (OutputFormat::Json, Level::Warn) => Some(Line::Stderr(
            json!({ "level": "warning", "message": message }).to_string(),
        )),
        (OutputFormat::Json, Level::Success | Level::Info) => None,
    }
}

fn field_line(label: &str, value: &str) -> String {
    let label = format!("{label}:");
    format!("  {label:<LABEL_WIDTH$} {value}")
}

/// Printer bound to one output format.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn emit(&self, level: Level, message: &str) {
        match render(self.format, level, message) {
            Some(Line::Stdout(line)) => println!("{line}"),
            Some(Line::Stderr(line)) => eprintln!("{line}"),
            None => {}
        }
    }

    pub fn success(&self, message: &str) {
        self.emit(Level::Success, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    pub fn warn(&self, message: &str) {
        self.emit(Level::Warn, message);
    }

    pub fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    /// An aligned `label: value` line; human mode only.
    pub fn field(&self, label: &str, value: &str) {
        if !self.format.is_json() {
            println!("{}", field_line(label, value));
        }
    }

    /// A pretty-printed document; JSON mode only.
    pub fn print_json(&self, value: &Value) {
        if !self.format.is_json() {
            return;
        }
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(e) => self.error(&format!("Failed to serialize output: {e}")),
        }
    }
}
