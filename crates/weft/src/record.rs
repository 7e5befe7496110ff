/*
 * record.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Content records and the per-invocation record database.
//!
//! A [`Record`] wraps one interpolated value together with where it landed
//! in the markup ([`Placement`]) and the unsubscribe handles of every
//! binding made for it. Records live in a [`RecordDatabase`] keyed by id:
//!
//! - slot records: `"::" + index`
//! - spread fields: `<spread id>-<field name>`
//! - upgraded plain attributes: ids from an [`IdAllocator`]

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::dom::NodeKind;
use crate::reactive::Unsubscribe;
use crate::value::Value;

/// Prefix shared by every marker token.
pub const MARKER_PREFIX: &str = "::";

/// Record id for the interpolation point at `index`.
pub fn slot_id(index: usize) -> String {
    format!("{}{}", MARKER_PREFIX, index)
}

/// Record id for one field of a spread record.
pub fn spread_field_id(spread_id: &str, field: &str) -> String {
    format!("{}-{}", spread_id, field)
}

/// `true` if `text` is a marker token.
pub fn is_marker(text: &str) -> bool {
    text.starts_with(MARKER_PREFIX)
}

/// Where an interpolated value landed syntactically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Right after `name=`: the value becomes that attribute's value.
    AttributeValue { attribute_name: String },

    /// Inside an open tag, not after `=`: the value spreads into attributes.
    AttributeDomain,

    /// Element content.
    ElementDomain,
}

impl Placement {
    pub fn attribute_name(&self) -> Option<&str> {
        match self {
            Placement::AttributeValue { attribute_name } => Some(attribute_name.as_str()),
            _ => None,
        }
    }

    /// Attribute role derived from the attribute name.
    pub fn role(&self) -> AttributeRole {
        self.attribute_name()
            .map_or(AttributeRole::Generic, AttributeRole::from_name)
    }
}

/// Attribute roles that get specialized binding behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeRole {
    Style,
    Class,
    Generic,
}

impl AttributeRole {
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("style") {
            AttributeRole::Style
        } else if name.eq_ignore_ascii_case("class") {
            AttributeRole::Class
        } else {
            AttributeRole::Generic
        }
    }
}

/// Type classification of record content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Undefined,
    Null,
    Bool,
    Number,
    String,
    Dimension,
    Reactive,
    Map,
    List,
    Callable,
    /// An external tree node, by node category.
    Node(NodeKind),
    Template,
}

impl ContentType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Undefined => ContentType::Undefined,
            Value::Null => ContentType::Null,
            Value::Bool(_) => ContentType::Bool,
            Value::Number(_) => ContentType::Number,
            Value::String(_) => ContentType::String,
            Value::Dimension { .. } => ContentType::Dimension,
            Value::Reactive(_) => ContentType::Reactive,
            Value::Map(_) => ContentType::Map,
            Value::List(_) => ContentType::List,
            Value::Callable(_) => ContentType::Callable,
            Value::Node(node) => ContentType::Node(node.kind()),
            Value::Template(_) => ContentType::Template,
        }
    }
}

/// One interpolated value plus its placement and cleanup handles.
pub struct Record {
    id: String,
    content: Value,
    placement: Placement,
    cleanups: RefCell<Vec<Unsubscribe>>,
}

impl Record {
    pub fn new(id: impl Into<String>, content: Value, placement: Placement) -> Self {
        Self {
            id: id.into(),
            content,
            placement,
            cleanups: RefCell::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn attribute_name(&self) -> Option<&str> {
        self.placement.attribute_name()
    }

    pub fn role(&self) -> AttributeRole {
        self.placement.role()
    }

    /// Type of the current content.
    pub fn content_type(&self) -> ContentType {
        ContentType::of(&self.content)
    }

    /// The content as a sequence: list elements, or the content itself once.
    pub fn items(&self) -> Vec<Value> {
        match &self.content {
            Value::List(items) => items.clone(),
            other => vec![other.clone()],
        }
    }

    /// The same content and placement under `id`, taking over every
    /// registered cleanup.
    fn renamed(&self, id: String) -> Record {
        Record {
            id,
            content: self.content.clone(),
            placement: self.placement.clone(),
            cleanups: RefCell::new(std::mem::take(&mut *self.cleanups.borrow_mut())),
        }
    }

    pub fn add_cleanup(&self, handle: Unsubscribe) {
        self.cleanups.borrow_mut().push(handle);
    }

    pub fn cleanup_count(&self) -> usize {
        self.cleanups.borrow().len()
    }

    /// Call and drop every registered unsubscribe handle.
    pub fn run_cleanups(&self) -> usize {
        let handles = std::mem::take(&mut *self.cleanups.borrow_mut());
        let count = handles.len();
        for handle in handles {
            handle.call();
        }
        count
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("content", &self.content)
            .field("placement", &self.placement)
            .field("cleanups", &self.cleanup_count())
            .finish()
    }
}

#[derive(Default)]
struct DatabaseInner {
    entries: IndexMap<String, Rc<Record>>,
    consumed: bool,
}

/// Ordered mapping from record id to record, owned by one invocation.
///
/// This is a shared handle: clones see the same entries. Merging moves all
/// entries into the receiver and leaves the donor empty and consumed.
#[derive(Clone, Default)]
pub struct RecordDatabase(Rc<RefCell<DatabaseInner>>);

impl RecordDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record under its id, returning the stored handle.
    pub fn insert(&self, record: Record) -> Rc<Record> {
        let record = Rc::new(record);
        let previous = self
            .0
            .borrow_mut()
            .entries
            .insert(record.id().to_string(), Rc::clone(&record));
        if previous.is_some() {
            tracing::warn!(id = record.id(), "Record id reused; previous record replaced");
        }
        record
    }

    pub fn get(&self, id: &str) -> Option<Rc<Record>> {
        self.0.borrow().entries.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.borrow().entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().entries.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.0.borrow().entries.keys().cloned().collect()
    }

    pub fn records(&self) -> Vec<Rc<Record>> {
        self.0.borrow().entries.values().cloned().collect()
    }

    /// `true` once this database has been merged into another one.
    pub fn is_consumed(&self) -> bool {
        self.0.borrow().consumed
    }

    pub fn ptr_eq(&self, other: &RecordDatabase) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Move every entry of `donor` into this database.
    ///
    /// Entries keep their order. An incoming id that already exists here is
    /// stored as `<id>#<n>` instead, and the stored record carries that id.
    /// The donor is left empty and marked consumed. Returns the number of
    /// entries moved.
    pub fn absorb(&self, donor: &RecordDatabase) -> usize {
        if self.ptr_eq(donor) {
            return 0;
        }
        let incoming = {
            let mut donor = donor.0.borrow_mut();
            donor.consumed = true;
            std::mem::take(&mut donor.entries)
        };

        let mut inner = self.0.borrow_mut();
        let count = incoming.len();
        for (id, record) in incoming {
            if !inner.entries.contains_key(&id) {
                inner.entries.insert(id, record);
                continue;
            }
            let mut n = 1;
            while inner.entries.contains_key(&format!("{}#{}", id, n)) {
                n += 1;
            }
            let renamed = format!("{}#{}", id, n);
            tracing::debug!(id = %id, renamed = %renamed, "Renaming merged record");
            let record = Rc::new(record.renamed(renamed.clone()));
            inner.entries.insert(renamed, record);
        }
        count
    }

    /// Run the cleanups of every record; returns how many handles ran.
    pub fn run_cleanups(&self) -> usize {
        self.records().iter().map(|r| r.run_cleanups()).sum()
    }
}

impl fmt::Debug for RecordDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("RecordDatabase")
            .field("entries", &inner.entries.keys().collect::<Vec<_>>())
            .field("consumed", &inner.consumed)
            .finish()
    }
}

/// Monotonic id source for synthesized records.
///
/// Clones share the counter, so one allocator can be passed to several
/// invocations to keep their synthesized ids distinct.
#[derive(Clone)]
pub struct IdAllocator {
    prefix: Rc<str>,
    next: Rc<Cell<u64>>,
}

impl IdAllocator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Rc::from(prefix.into()),
            next: Rc::new(Cell::new(0)),
        }
    }

    pub fn next_id(&self) -> String {
        let n = self.next.get();
        self.next.set(n + 1);
        format!("{}{}", self.prefix, n)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new("attr-")
    }
}

impl fmt::Debug for IdAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdAllocator")
            .field("prefix", &self.prefix)
            .field("next", &self.next.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Reactive;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_role_from_attribute_name() {
        let style = Placement::AttributeValue {
            attribute_name: "style".to_string(),
        };
        assert_eq!(style.role(), AttributeRole::Style);
        assert_eq!(AttributeRole::from_name("CLASS"), AttributeRole::Class);
        assert_eq!(AttributeRole::from_name("href"), AttributeRole::Generic);
        assert_eq!(Placement::ElementDomain.role(), AttributeRole::Generic);
    }

    #[test]
    fn test_content_type_follows_current_content() {
        let r = Reactive::new(Value::Number(1.0));
        let record = Record::new("::0", Value::from(r.clone()), Placement::ElementDomain);
        r.set("now a string");
        assert_eq!(record.content_type(), ContentType::Reactive);
        assert!(record.content().as_reactive().is_some_and(|c| c.ptr_eq(&r)));
    }

    #[test]
    fn test_items_of_list_and_scalar() {
        let list = Record::new("a", Value::list(["x".into(), "y".into()]), Placement::ElementDomain);
        assert_eq!(list.items().len(), 2);

        // Strings are yielded whole, not per character
        let scalar = Record::new("b", Value::string("xy"), Placement::ElementDomain);
        assert_eq!(scalar.items(), vec![Value::string("xy")]);
    }

    #[test]
    fn test_run_cleanups_once() {
        let calls = Rc::new(Cell::new(0));
        let record = Record::new("a", Value::Null, Placement::ElementDomain);
        let counter = Rc::clone(&calls);
        record.add_cleanup(Unsubscribe::new(move || counter.set(counter.get() + 1)));

        assert_eq!(record.run_cleanups(), 1);
        assert_eq!(record.run_cleanups(), 0);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_absorb_moves_entries_and_consumes_donor() {
        let parent = RecordDatabase::new();
        parent.insert(Record::new("::0", Value::Null, Placement::ElementDomain));

        let nested = RecordDatabase::new();
        nested.insert(Record::new("::0", Value::from(1), Placement::ElementDomain));
        nested.insert(Record::new("attr-0", Value::from(2), Placement::ElementDomain));

        assert_eq!(parent.absorb(&nested), 2);
        assert_eq!(parent.ids(), vec!["::0", "::0#1", "attr-0"]);
        for id in parent.ids() {
            assert_eq!(parent.get(&id).unwrap().id(), id);
        }
        assert!(nested.is_empty());
        assert!(nested.is_consumed());
        assert!(!parent.is_consumed());
    }

    #[test]
    fn test_renamed_record_keeps_content_and_cleanups() {
        let calls = Rc::new(Cell::new(0));
        let parent = RecordDatabase::new();
        parent.insert(Record::new("::0", Value::Null, Placement::ElementDomain));

        let nested = RecordDatabase::new();
        let record = nested.insert(Record::new("::0", Value::from("x"), Placement::ElementDomain));
        let counter = Rc::clone(&calls);
        record.add_cleanup(Unsubscribe::new(move || counter.set(counter.get() + 1)));
        parent.absorb(&nested);

        let merged = parent.get("::0#1").unwrap();
        assert_eq!(merged.content(), &Value::from("x"));
        assert_eq!(merged.cleanup_count(), 1);
        assert_eq!(parent.run_cleanups(), 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_id_allocator_is_shared_between_clones() {
        let ids = IdAllocator::default();
        let other = ids.clone();
        assert_eq!(ids.next_id(), "attr-0");
        assert_eq!(other.next_id(), "attr-1");
        assert_eq!(IdAllocator::new("x").next_id(), "x0");
    }
}
