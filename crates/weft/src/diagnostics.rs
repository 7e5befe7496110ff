/*
 * diagnostics.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Non-fatal diagnostics collected during interpolation.

use std::fmt;

/// Stable diagnostic codes.
pub mod codes {
    /// Content marker names a record that does not exist.
    pub const MISSING_RECORD: &str = "W-1";
    /// Content marker produced no nodes.
    pub const EMPTY_IMPORT: &str = "W-2";
    /// Spread marker names a record that does not exist.
    pub const MISSING_SPREAD_RECORD: &str = "W-3";
    /// Content cannot be placed in element position.
    pub const UNSUPPORTED_CONTENT: &str = "W-4";
}

/// A warning about one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: &'static str,
    pub message: String,
    /// Id of the record (or marker) involved.
    pub record_id: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.code, self.message, self.record_id)
    }
}

/// Collector for diagnostics produced while interpolating one invocation.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a warning and log it.
    pub fn warn(&mut self, code: &'static str, record_id: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(code, record = record_id, "{}", message);
        self.diagnostics.push(Diagnostic {
            code,
            message,
            record_id: record_id.to_string(),
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
