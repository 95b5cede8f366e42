//! ## Status Lines
//!
//! Human-readable progress lines printed by the stages and the orchestrator, for example
//! `[INFO] Converting Parquet to CSV…`. They are the user-facing observability of the
//! pipeline and are written to a caller-supplied writer (stdout in the binaries), so tests can
//! capture them. Every line is mirrored to `tracing` for diagnostic logs.

use std::fmt;
use std::io::Write;

/// Severity tag of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Pipeline,
}

impl StatusLevel {
    pub fn tag(&self) -> &'static str {
        match self {
            StatusLevel::Info => "[INFO]",
            StatusLevel::Warn => "[WARN]",
            StatusLevel::Pipeline => "[PIPELINE]",
        }
    }
}

/// A single tagged status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub level: StatusLevel,
    pub message: String,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level.tag(), self.message)
    }
}

/// Writes a status line to `out`. Write errors are ignored; a closed stdout must not abort a stage.
pub fn emit(out: &mut (dyn Write + Send), level: StatusLevel, message: impl Into<String>) {
    let line = StatusLine {
        level,
        message: message.into(),
    };
    match level {
        StatusLevel::Warn => tracing::warn!(line = %line.message, "status"),
        _ => tracing::debug!(line = %line.message, "status"),
    }
    let _ = writeln!(out, "{}", line);
    let _ = out.flush();
}

pub fn info(out: &mut (dyn Write + Send), message: impl Into<String>) {
    emit(out, StatusLevel::Info, message);
}

pub fn warn(out: &mut (dyn Write + Send), message: impl Into<String>) {
    emit(out, StatusLevel::Warn, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_carry_their_tag() {
        let mut buf: Vec<u8> = Vec::new();
        info(&mut buf, "hello");
        warn(&mut buf, "careful");
        emit(&mut buf, StatusLevel::Pipeline, "Ingesting data…");
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "[INFO] hello\n[WARN] careful\n[PIPELINE] Ingesting data…\n"
        );
    }
}
