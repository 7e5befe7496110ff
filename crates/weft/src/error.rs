/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for markup building and template interpolation.

use thiserror::Error;

/// Errors raised while turning marker-annotated markup into a tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarkupError {
    /// Syntax error reported by the markup reader.
    #[error("Markup syntax error at byte {position}: {message}")]
    Syntax { message: String, position: u64 },

    /// An end tag that does not close the innermost open element.
    #[error("Mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEndTag { expected: String, found: String },

    /// An end tag with no open element.
    #[error("Unexpected closing tag </{name}>")]
    UnexpectedEndTag { name: String },

    /// Input ended while elements were still open.
    #[error("Unexpected end of markup, expected closing tag </{expected}>")]
    UnexpectedEof { expected: String },
}

/// Errors that abort a template invocation.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A direct marker names a record id absent from the record database.
    #[error("No record `{id}` for attribute `{attribute}`")]
    RecordNotFound { id: String, attribute: String },

    /// The tree builder rejected the generated markup.
    #[error(transparent)]
    Markup(#[from] MarkupError),

    /// More interpolated values than interpolation points.
    #[error("{values} values supplied for {segments} literal segments")]
    TooManyValues { segments: usize, values: usize },

    /// A content marker produced no nodes while strict imports are enabled.
    #[error("Content marker `{id}` produced no nodes")]
    MissingImport { id: String },
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Result type for markup building.
pub type MarkupResult<T> = Result<T, MarkupError>;
