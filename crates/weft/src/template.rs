/*
 * template.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template invocation.

use crate::diagnostics::Diagnostic;
use crate::dom::{MarkupBuilder, Node, XmlMarkupBuilder};
use crate::error::TemplateResult;
use crate::interpolate::{InterpolationContext, interpolate_attributes, interpolate_nodes};
use crate::markers::build_marker_stream;
use crate::options::TemplateOptions;
use crate::record::{IdAllocator, RecordDatabase};
use crate::value::Value;

/// Literal segments of a tagged template.
///
/// A template with `n` segments has `n - 1` interpolation points; value `i`
/// goes between segment `i` and segment `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<String>,
}

impl Template {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Render with default options, the quick-xml builder and a fresh id
    /// allocator.
    pub fn render(&self, values: Vec<Value>) -> TemplateResult<TemplateInstance> {
        let options = TemplateOptions::default();
        let builder = XmlMarkupBuilder {
            trim_fragment_whitespace: options.trim_fragment_whitespace,
        };
        self.render_with(values, &options, &builder, &IdAllocator::default())
    }

    /// Render the template against `values`.
    ///
    /// # Errors
    ///
    /// Fails on markup the builder rejects, on a direct marker without a
    /// record, on more values than interpolation points, and on empty
    /// imports when `strict_imports` is set.
    ///
    /// Interpolation itself does not roll back: elements bound before a
    /// failing one keep their bindings. The partial tree is never returned,
    /// so this function then unsubscribes them instead of leaving them
    /// attached to reactive values the caller still holds.
    pub fn render_with(
        &self,
        values: Vec<Value>,
        options: &TemplateOptions,
        builder: &dyn MarkupBuilder,
        ids: &IdAllocator,
    ) -> TemplateResult<TemplateInstance> {
        let records = RecordDatabase::new();
        let stream = build_marker_stream(&self.segments, &values, &records)?;
        tracing::debug!(markers = stream.markers, "Built marker stream");

        let root = builder.build(&stream.markup)?;

        let mut ctx = InterpolationContext::new(&records, ids, options);
        let interpolated = interpolate_attributes(&root, &mut ctx)
            .and_then(|()| interpolate_nodes(&root, &mut ctx));
        let diagnostics = ctx.diagnostics.into_diagnostics();

        if let Err(err) = interpolated {
            let released = records.run_cleanups();
            tracing::debug!(released, error = %err, "Interpolation failed");
            return Err(err);
        }

        tracing::debug!(
            records = records.len(),
            diagnostics = diagnostics.len(),
            "Template rendered"
        );
        Ok(TemplateInstance {
            root,
            cleanup: Cleanup {
                records: records.clone(),
            },
            records,
            diagnostics,
        })
    }
}

/// Render `segments` interleaved with `values` using default settings.
///
/// ```rust
/// use weft::html;
///
/// let instance = html(&["<p class=\"", "\">", "</p>"], vec!["note".into(), "hi".into()]).unwrap();
/// assert_eq!(instance.root.to_markup(), r#"<p class="note">hi</p>"#);
/// ```
pub fn html(segments: &[&str], values: Vec<Value>) -> TemplateResult<TemplateInstance> {
    Template::new(segments.iter().copied()).render(values)
}

/// The result of one invocation: the interpolated tree, a cleanup callback
/// and the record database holding every binding.
#[derive(Debug, Clone)]
pub struct TemplateInstance {
    /// Fragment holding the top-level nodes.
    pub root: Node,

    pub cleanup: Cleanup,

    pub records: RecordDatabase,

    /// Non-fatal problems found while interpolating.
    pub diagnostics: Vec<Diagnostic>,
}

/// Unsubscribes every binding of an invocation.
///
/// Running it again is harmless: each handle runs at most once.
#[derive(Debug, Clone)]
pub struct Cleanup {
    records: RecordDatabase,
}

impl Cleanup {
    /// Run every registered unsubscribe handle. Returns how many ran.
    pub fn run(&self) -> usize {
        let count = self.records.run_cleanups();
        tracing::debug!(handles = count, "Cleanup ran");
        count
    }
}
