/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Interpolated values.
//!
//! [`Value`] is the closed set of things a template can interpolate. Plain
//! data (primitives, maps, lists) sits next to handles with identity:
//! reactive values, callables, tree nodes and nested template instances.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::dom::Node;
use crate::reactive::Reactive;
use crate::template::TemplateInstance;

/// Insertion-ordered key/value structure.
pub type ValueMap = IndexMap<String, Value>;

/// A value interpolated into a template.
#[derive(Clone, Default)]
pub enum Value {
    /// No value at all. Contributes no marker when interpolated.
    #[default]
    Undefined,

    /// An explicit empty value.
    Null,

    Bool(bool),

    Number(f64),

    String(String),

    /// A number with a unit, e.g. the parsed form of `"50%"`.
    Dimension { value: f64, unit: String },

    /// An observable value.
    Reactive(Reactive),

    /// A key/value structure, enumerated in insertion order.
    Map(ValueMap),

    /// An ordered list.
    List(Vec<Value>),

    /// A callable, used as a live handler property.
    Callable(Callback),

    /// A tree node produced outside the template.
    Node(Node),

    /// A completed nested template invocation.
    Template(TemplateInstance),
}

impl Value {
    /// Build a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Build a map value from key/value pairs, keeping their order.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a list value.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    /// `true` for `Null` and `Undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    pub fn as_reactive(&self) -> Option<&Reactive> {
        match self {
            Value::Reactive(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness as used by the class token normalizer.
    ///
    /// `false`, `0`, `NaN`, the empty string, `Null` and `Undefined` are
    /// falsy. Everything else is truthy, including empty maps and lists.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// The string written into an attribute or text node.
    ///
    /// Returns `None` for `Null` and `Undefined`. Reactive values render
    /// their current value.
    pub fn to_display_string(&self) -> Option<String> {
        match self {
            Value::Undefined | Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(format_number(*n)),
            Value::String(s) => Some(s.clone()),
            Value::Dimension { value, unit } => Some(format!("{}{}", format_number(*value), unit)),
            Value::Reactive(r) => r.get().to_display_string(),
            Value::List(items) => Some(
                items
                    .iter()
                    .map(|v| v.to_display_string().unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            Value::Map(_) => Some("[object]".to_string()),
            Value::Callable(cb) => Some(format!("[callable {}]", cb.name())),
            Value::Node(node) => Some(node.to_markup()),
            Value::Template(instance) => Some(instance.root.to_markup()),
        }
    }

    /// Loose equality, used to suppress no-op reactive assignments.
    ///
    /// `Null` and `Undefined` equal each other and nothing else. Numbers,
    /// numeric strings and booleans compare numerically. Handles compare by
    /// identity, plain data structurally.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Bool(b), other) | (other, Value::Bool(b)) => {
                Value::Number(if *b { 1.0 } else { 0.0 }).loosely_equals(other)
            }
            (Value::Number(a), Value::String(s)) | (Value::String(s), Value::Number(a)) => {
                string_to_number(s).is_some_and(|n| n == *a)
            }
            _ => self == other,
        }
    }
}

/// Structural equality for data, identity for handles.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (
                Value::Dimension { value: a, unit: ua },
                Value::Dimension { value: b, unit: ub },
            ) => a == b && ua == ub,
            (Value::Reactive(a), Value::Reactive(b)) => a.ptr_eq(b),
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => a.ptr_eq(b),
            (Value::Node(a), Value::Node(b)) => a.ptr_eq(b),
            (Value::Template(a), Value::Template(b)) => a.root.ptr_eq(&b.root),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Dimension { value, unit } => write!(f, "Dimension({value}{unit})"),
            Value::Reactive(r) => fmt::Debug::fmt(r, f),
            Value::Map(m) => f.debug_map().entries(m.iter()).finish(),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Callable(cb) => fmt::Debug::fmt(cb, f),
            Value::Node(node) => write!(f, "Node({})", node.to_markup()),
            Value::Template(instance) => write!(f, "Template({})", instance.root.to_markup()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Reactive> for Value {
    fn from(r: Reactive) -> Self {
        Value::Reactive(r)
    }
}

impl From<Callback> for Value {
    fn from(cb: Callback) -> Self {
        Value::Callable(cb)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Node(node)
    }
}

impl From<TemplateInstance> for Value {
    fn from(instance: TemplateInstance) -> Self {
        Value::Template(instance)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(map)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

/// A callable value, invoked with an event payload.
#[derive(Clone)]
pub struct Callback {
    name: Rc<str>,
    func: Rc<dyn Fn(&Value)>,
}

impl Callback {
    pub fn new(name: impl Into<String>, func: impl Fn(&Value) + 'static) -> Self {
        Self {
            name: Rc::from(name.into()),
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, event: &Value) {
        (self.func)(event);
    }

    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({})", self.name)
    }
}

/// Parse a literal attribute value.
///
/// A numeric string becomes a number, a numeric string followed by `%`
/// becomes a percentage dimension, anything else stays a string.
pub fn parse_literal(text: &str) -> Value {
    if let Some(n) = string_to_number(text).filter(|_| !text.trim().is_empty()) {
        return Value::Number(n);
    }
    if let Some(stripped) = text.trim().strip_suffix('%') {
        if let Some(n) = string_to_number(stripped).filter(|_| !stripped.trim().is_empty()) {
            return Value::Dimension {
                value: n,
                unit: "%".to_string(),
            };
        }
    }
    Value::String(text.to_string())
}

/// Numeric conversion of a string, `None` if it is not a finite number.
///
/// The empty (or all-whitespace) string converts to `0`.
fn string_to_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    // Rust accepts spellings like "inf" and "NaN" that are not numeric literals here
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Format a number without a trailing `.0` for integral values.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal_number() {
        assert_eq!(parse_literal("200"), Value::Number(200.0));
        assert_eq!(parse_literal("-1.5"), Value::Number(-1.5));
    }

    #[test]
    fn test_parse_literal_percent() {
        assert_eq!(
            parse_literal("50%"),
            Value::Dimension {
                value: 50.0,
                unit: "%".to_string()
            }
        );
    }

    #[test]
    fn test_parse_literal_string() {
        assert_eq!(parse_literal("red"), Value::string("red"));
        assert_eq!(parse_literal(""), Value::string(""));
        assert_eq!(parse_literal("%"), Value::string("%"));
        assert_eq!(parse_literal("inf"), Value::string("inf"));
    }

    #[test]
    fn test_loose_equality() {
        assert!(Value::Null.loosely_equals(&Value::Undefined));
        assert!(!Value::Null.loosely_equals(&Value::Number(0.0)));
        assert!(Value::Number(5.0).loosely_equals(&Value::string("5")));
        assert!(Value::Bool(true).loosely_equals(&Value::Number(1.0)));
        assert!(!Value::string("a").loosely_equals(&Value::string("b")));
        assert!(!Value::Number(f64::NAN).loosely_equals(&Value::Number(f64::NAN)));
    }

    #[test]
    fn test_handles_compare_by_identity() {
        let a = Reactive::new(Value::Number(1.0));
        let b = Reactive::new(Value::Number(1.0));
        assert!(Value::from(a.clone()).loosely_equals(&Value::from(a)));
        assert!(!Value::from(b.clone()).loosely_equals(&Value::from(Reactive::new(1.into()))));
    }

    #[test]
    fn test_display_string() {
        assert_eq!(Value::Number(200.0).to_display_string().as_deref(), Some("200"));
        assert_eq!(Value::Number(0.5).to_display_string().as_deref(), Some("0.5"));
        assert_eq!(parse_literal("12%").to_display_string().as_deref(), Some("12%"));
        assert_eq!(Value::Null.to_display_string(), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("0").is_truthy());
        assert!(Value::list([]).is_truthy());
    }
}
