/*
 * nodes.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Content marker replacement.
//!
//! Each `<!--::i-->` comment is replaced by the nodes its record imports.
//! Nested template instances hand over their whole tree and have their
//! record database merged into the current one.

use crate::diagnostics::codes;
use crate::dom::{Node, NodeKind};
use crate::error::{TemplateError, TemplateResult};
use crate::interpolate::InterpolationContext;
use crate::record::{Record, is_marker};
use crate::value::Value;

/// Replace every content marker under `root` with imported nodes.
///
/// Markers are collected before any replacement, so markers inside imported
/// subtrees are never visited.
///
/// # Errors
///
/// With `strict_imports`, returns [`TemplateError::MissingImport`] when a
/// marker produces no nodes.
pub fn interpolate_nodes(root: &Node, ctx: &mut InterpolationContext<'_>) -> TemplateResult<()> {
    let markers: Vec<Node> = root
        .find_literal(is_marker)
        .into_iter()
        .filter(|n| n.kind() == NodeKind::Comment)
        .collect();

    for marker in &markers {
        let Some(id) = marker.literal() else {
            continue;
        };
        let Some(record) = ctx.records.get(&id) else {
            ctx.diagnostics
                .warn(codes::MISSING_RECORD, &id, "Content marker has no record");
            continue;
        };

        let mut imported = Vec::new();
        import_value(record.content(), &record, ctx, &mut imported);

        if imported.is_empty() {
            if ctx.options.strict_imports {
                return Err(TemplateError::MissingImport { id });
            }
            ctx.diagnostics
                .warn(codes::EMPTY_IMPORT, &id, "Content marker produced no nodes");
            continue;
        }

        tracing::debug!(record = %id, nodes = imported.len(), "Importing content");
        let mut anchor = marker.clone();
        for node in imported {
            anchor.insert_after(&node);
            anchor = node;
        }
    }

    for marker in markers {
        marker.detach();
    }
    Ok(())
}

/// Collect the nodes `value` contributes, in order.
fn import_value(
    value: &Value,
    record: &Record,
    ctx: &mut InterpolationContext<'_>,
    out: &mut Vec<Node>,
) {
    match value {
        Value::Undefined | Value::Null => {}
        Value::Template(instance) => {
            let moved = ctx.records.absorb(&instance.records);
            tracing::trace!(record = record.id(), records = moved, "Merged nested records");
            out.extend(instance.root.children());
        }
        Value::Node(node) => match node.kind() {
            NodeKind::Fragment => out.extend(node.children()),
            _ => out.push(node.clone()),
        },
        Value::Reactive(reactive) => {
            let text = Node::text(value.to_display_string().unwrap_or_default());
            let weak = text.downgrade();
            let handle = reactive.subscribe(move |v| {
                if let Some(text) = weak.upgrade() {
                    text.set_literal(v.to_display_string().unwrap_or_default());
                }
            });
            record.add_cleanup(handle);
            out.push(text);
        }
        Value::List(items) => {
            for item in items {
                import_value(item, record, ctx, out);
            }
        }
        Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Dimension { .. } => {
            if let Some(text) = value.to_display_string() {
                out.push(Node::text(text));
            }
        }
        Value::Map(_) | Value::Callable(_) => {
            ctx.diagnostics.warn(
                codes::UNSUPPORTED_CONTENT,
                record.id(),
                "Content cannot be placed in element position",
            );
        }
    }
}
