/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Post-construction interpolation.
//!
//! After the tree builder has turned the marker stream into a tree, two
//! passes resolve the markers against the record database:
//!
//! 1. [`attributes`]: upgrades plain attributes, expands spread markers and
//!    binds direct markers, element by element in document order.
//! 2. [`nodes`]: replaces content markers with imported nodes.

pub mod attributes;
pub mod nodes;

use crate::diagnostics::DiagnosticCollector;
use crate::options::TemplateOptions;
use crate::record::{IdAllocator, RecordDatabase};

pub use attributes::{TokenDiff, class_tokens, diff_tokens, interpolate_attributes};
pub use nodes::interpolate_nodes;

/// State threaded through both interpolation passes.
pub struct InterpolationContext<'a> {
    /// Records of the invocation being interpolated.
    pub records: &'a RecordDatabase,

    /// Id source for records synthesized from plain attributes.
    pub ids: &'a IdAllocator,

    pub options: &'a TemplateOptions,

    pub diagnostics: DiagnosticCollector,
}

impl<'a> InterpolationContext<'a> {
    pub fn new(
        records: &'a RecordDatabase,
        ids: &'a IdAllocator,
        options: &'a TemplateOptions,
    ) -> Self {
        Self {
            records,
            ids,
            options,
            diagnostics: DiagnosticCollector::new(),
        }
    }
}
