/*
 * attributes.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Attribute interpolation.
//!
//! Every element is visited once, in document order. Its attributes fall
//! into three groups:
//!
//! - **plain** attributes are upgraded: the literal value is parsed
//!   ([`parse_literal`]) and replaced by a fresh reactive value with its own
//!   record;
//! - **spread markers** (`::i=""`) expand a map record into one attribute
//!   per field, in field order, at the marker's position;
//! - **direct markers** (`name="::i"`) are bound according to the record's
//!   content type and the attribute role (style, class, generic).
//!
//! The attribute list is scanned once and the rewritten list is stored
//! before any binding runs, so bindings never observe a half-edited list.

use std::cell::RefCell;
use std::rc::Rc;

use crate::diagnostics::codes;
use crate::dom::{AttrValue, Attribute, Node, WeakNode};
use crate::error::{TemplateError, TemplateResult};
use crate::interpolate::InterpolationContext;
use crate::reactive::{Reactive, Unsubscribe};
use crate::record::{AttributeRole, ContentType, Placement, Record, is_marker, spread_field_id};
use crate::value::{Value, ValueMap, parse_literal};

/// Interpolate the attributes of every element under `root`.
///
/// # Errors
///
/// Returns [`TemplateError::RecordNotFound`] for a direct marker without a
/// record. Elements before the failing one keep their bindings; the failing
/// element is left untouched.
pub fn interpolate_attributes(root: &Node, ctx: &mut InterpolationContext<'_>) -> TemplateResult<()> {
    for element in root.elements() {
        interpolate_element(&element, ctx)?;
    }
    Ok(())
}

/// Planned treatment of one attribute.
enum Step {
    Keep(Attribute),
    Upgrade { name: String, literal: String },
    Spread { id: String, record: Option<Rc<Record>> },
    Direct { attribute: Attribute, record: Rc<Record> },
}

fn interpolate_element(node: &Node, ctx: &mut InterpolationContext<'_>) -> TemplateResult<()> {
    let attributes = node.attributes();
    if attributes.is_empty() {
        return Ok(());
    }

    // Resolve every marker before touching the node
    let mut steps = Vec::with_capacity(attributes.len());
    for attribute in attributes {
        let Some(text) = attribute.value.as_text().map(str::to_string) else {
            steps.push(Step::Keep(attribute));
            continue;
        };

        if is_marker(&attribute.name) {
            let record = ctx.records.get(&attribute.name);
            steps.push(Step::Spread {
                id: attribute.name,
                record,
            });
        } else if is_marker(&text) {
            let record = ctx
                .records
                .get(&text)
                .ok_or_else(|| TemplateError::RecordNotFound {
                    id: text.clone(),
                    attribute: attribute.name.clone(),
                })?;
            steps.push(Step::Direct { attribute, record });
        } else if ctx.options.upgrade_plain_attributes {
            steps.push(Step::Upgrade {
                name: attribute.name,
                literal: text,
            });
        } else {
            steps.push(Step::Keep(attribute));
        }
    }

    let mut rebuilt = Rebuilt::default();

    for step in steps {
        match step {
            Step::Keep(attribute) => rebuilt.place(attribute, None),

            Step::Upgrade { name, literal } => {
                let reactive = Reactive::with_id(ctx.ids.next_id(), parse_literal(&literal));
                ctx.records.insert(Record::new(
                    reactive.id(),
                    Value::Reactive(reactive.clone()),
                    Placement::AttributeValue {
                        attribute_name: name.clone(),
                    },
                ));
                rebuilt.place(Attribute::reactive(name, reactive), None);
            }

            Step::Spread { id, record: None } => {
                ctx.diagnostics
                    .warn(codes::MISSING_SPREAD_RECORD, &id, "Spread marker has no record");
            }

            Step::Spread {
                id,
                record: Some(record),
            } => match record.content().as_map() {
                Some(fields) => {
                    for (field, record) in expand_spread(&id, fields, ctx) {
                        rebuilt.place(Attribute::text(field, record.id()), Some(record));
                    }
                }
                None => {
                    tracing::debug!(record = %id, "Spread over non-map content dropped");
                }
            },

            Step::Direct { attribute, record } => rebuilt.place(attribute, Some(record)),
        }
    }

    let Rebuilt {
        attributes,
        bindings,
    } = rebuilt;
    node.set_attributes(attributes);

    for (name, record) in bindings {
        bind_attribute(node, &name, &record);
    }
    Ok(())
}

/// Rewritten attribute list of one element, with the binding owning each
/// marker attribute.
///
/// Names are unique: placing an attribute drops an earlier one with the
/// same name together with its binding, so the later one wins.
#[derive(Default)]
struct Rebuilt {
    attributes: Vec<Attribute>,
    bindings: Vec<(String, Rc<Record>)>,
}

impl Rebuilt {
    fn place(&mut self, attribute: Attribute, binding: Option<Rc<Record>>) {
        let name = attribute.name.clone();
        if self.attributes.iter().any(|a| a.name == name) {
            tracing::debug!(attribute = %name, "Earlier attribute with the same name replaced");
            self.attributes.retain(|a| a.name != name);
            self.bindings.retain(|(n, _)| *n != name);
        }
        self.attributes.push(attribute);
        if let Some(record) = binding {
            self.bindings.push((name, record));
        }
    }
}

/// Synthesize one record per spread field, in field order.
fn expand_spread(
    spread_id: &str,
    fields: &ValueMap,
    ctx: &InterpolationContext<'_>,
) -> Vec<(String, Rc<Record>)> {
    fields
        .iter()
        .map(|(field, value)| {
            let id = spread_field_id(spread_id, field);
            let content = match value {
                Value::Reactive(_) | Value::Callable(_) => value.clone(),
                other => Value::Reactive(Reactive::with_id(id.clone(), other.clone())),
            };
            let record = ctx.records.insert(Record::new(
                id,
                content,
                Placement::AttributeValue {
                    attribute_name: field.clone(),
                },
            ));
            (field.clone(), record)
        })
        .collect()
}

/// Bind one direct marker attribute according to content type and role.
fn bind_attribute(node: &Node, name: &str, record: &Rc<Record>) {
    let content_type = record.content_type();
    let role = AttributeRole::from_name(name);
    tracing::debug!(record = record.id(), attribute = name, ?content_type, ?role, "Binding attribute");

    match (content_type, role) {
        (ContentType::Reactive, AttributeRole::Style) => bind_reactive_style(node, name, record),
        (ContentType::List | ContentType::Reactive, AttributeRole::Class) => {
            bind_class_list(node, name, record)
        }
        (ContentType::Reactive, _) => bind_reactive_attribute(node, name, record),
        (ContentType::Map, AttributeRole::Style) => {
            node.remove_attribute(name);
            if let Some(map) = record.content().as_map() {
                for (property, value) in map {
                    if let Some(handle) = apply_style_entry(node, property, value) {
                        record.add_cleanup(handle);
                    }
                }
            }
        }
        (ContentType::Map, _) => {
            node.remove_attribute(name);
            if let Some(map) = record.content().as_map() {
                for (key, value) in map {
                    if let Value::Callable(handler) = value {
                        node.set_handler(key, handler.clone());
                    }
                }
            }
        }
        (ContentType::Callable, _) => {
            node.remove_attribute(name);
            if let Value::Callable(handler) = record.content() {
                node.set_handler(name, handler.clone());
            }
        }
        // Primitives, lists, nodes and nested templates: their string form
        _ => match record.content().to_display_string() {
            Some(text) => node.set_attribute(name, AttrValue::Text(text)),
            None => node.remove_attribute(name),
        },
    }
}

/// Keep the attribute equal to the string form of a reactive value.
fn bind_reactive_attribute(node: &Node, name: &str, record: &Rc<Record>) {
    let Some(reactive) = record.content().as_reactive() else {
        return;
    };
    if reactive.get().is_nullish() {
        node.remove_attribute(name);
    }

    let weak = node.downgrade();
    let attribute = name.to_string();
    let handle = reactive.subscribe(move |value| {
        let Some(node) = weak.upgrade() else {
            return;
        };
        match value.to_display_string() {
            Some(text) => node.set_attribute(&attribute, AttrValue::Text(text)),
            None => node.remove_attribute(&attribute),
        }
    });
    record.add_cleanup(handle);
}

/// Apply every emitted style map to the style surface.
///
/// Reactive entries are subscribed on their own; their subscriptions are
/// replaced on each emission of the outer value.
fn bind_reactive_style(node: &Node, name: &str, record: &Rc<Record>) {
    let Some(reactive) = record.content().as_reactive() else {
        return;
    };
    node.remove_attribute(name);

    let entries: Rc<RefCell<Vec<Unsubscribe>>> = Rc::default();
    let weak = node.downgrade();
    let current = Rc::clone(&entries);
    let handle = reactive.subscribe(move |value| {
        let Some(node) = weak.upgrade() else {
            return;
        };
        let previous = std::mem::take(&mut *current.borrow_mut());
        for handle in previous {
            handle.call();
        }
        if let Value::Map(map) = value {
            for (property, entry) in map {
                if let Some(handle) = apply_style_entry(&node, property, entry) {
                    current.borrow_mut().push(handle);
                }
            }
        }
    });
    record.add_cleanup(handle);
    record.add_cleanup(Unsubscribe::new(move || {
        let handles = std::mem::take(&mut *entries.borrow_mut());
        for handle in handles {
            handle.call();
        }
    }));
}

/// Set one style property; reactive values keep it updated.
fn apply_style_entry(node: &Node, property: &str, value: &Value) -> Option<Unsubscribe> {
    match value {
        Value::Reactive(reactive) => {
            let weak = node.downgrade();
            let property = property.to_string();
            Some(reactive.subscribe(move |v| set_style(&weak, &property, v)))
        }
        other => {
            set_style(&node.downgrade(), property, other);
            None
        }
    }
}

fn set_style(node: &WeakNode, property: &str, value: &Value) {
    let Some(node) = node.upgrade() else {
        return;
    };
    match value.to_display_string() {
        Some(text) => node.set_style_property(property, text),
        None => node.remove_style_property(property),
    }
}

/// Apply class tokens from each item of the record.
///
/// Static items are applied once. Reactive items keep their own applied
/// token set and apply only the difference on each emission.
fn bind_class_list(node: &Node, name: &str, record: &Rc<Record>) {
    node.remove_attribute(name);

    for item in record.items() {
        match item {
            Value::Reactive(reactive) => {
                let applied: RefCell<Vec<String>> = RefCell::new(Vec::new());
                let weak = node.downgrade();
                let handle = reactive.subscribe(move |value| {
                    let Some(node) = weak.upgrade() else {
                        return;
                    };
                    let expected = class_tokens(value);
                    let diff = diff_tokens(&applied.borrow(), &expected);
                    for token in &diff.removed {
                        node.remove_class(token);
                    }
                    for token in &diff.added {
                        node.add_class(token);
                    }
                    *applied.borrow_mut() = expected;
                });
                record.add_cleanup(handle);
            }
            other => {
                for token in class_tokens(&other) {
                    node.add_class(&token);
                }
            }
        }
    }
}

/// Normalize a value into distinct class tokens.
///
/// Strings split on whitespace, lists flatten, maps contribute the keys
/// whose values are truthy, reactive values contribute their current value.
pub fn class_tokens(value: &Value) -> Vec<String> {
    let mut tokens = Vec::new();
    collect_tokens(value, &mut tokens);
    tokens
}

fn collect_tokens(value: &Value, tokens: &mut Vec<String>) {
    let mut push = |token: &str| {
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    };
    match value {
        Value::String(s) => s.split_whitespace().for_each(&mut push),
        Value::Number(_) | Value::Dimension { .. } => {
            if let Some(text) = value.to_display_string() {
                push(&text);
            }
        }
        Value::Map(map) => {
            for (key, flag) in map {
                let on = match flag {
                    Value::Reactive(r) => r.get().is_truthy(),
                    other => other.is_truthy(),
                };
                if on {
                    key.split_whitespace().for_each(&mut push);
                }
            }
        }
        Value::List(items) => {
            for item in items {
                collect_tokens(item, tokens);
            }
        }
        Value::Reactive(r) => collect_tokens(&r.get(), tokens),
        _ => {}
    }
}

/// Tokens to add and remove to go from `current` to `expected`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

pub fn diff_tokens(current: &[String], expected: &[String]) -> TokenDiff {
    TokenDiff {
        added: expected
            .iter()
            .filter(|t| !current.contains(t))
            .cloned()
            .collect(),
        removed: current
            .iter()
            .filter(|t| !expected.contains(t))
            .cloned()
            .collect(),
    }
}
