//! Mutable node tree.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::reactive::Reactive;
use crate::value::{Callback, Value};

/// The category of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Container for top-level nodes, produced by the tree builder.
    Fragment,
    Element,
    Text,
    Comment,
}

/// The value carried by an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Literal text, as produced by the tree builder or written by a binding.
    Text(String),

    /// An upgraded attribute, observable by downstream consumers.
    Reactive(Reactive),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Reactive(_) => None,
        }
    }

    pub fn as_reactive(&self) -> Option<&Reactive> {
        match self {
            AttrValue::Reactive(r) => Some(r),
            AttrValue::Text(_) => None,
        }
    }

    /// Current string form; reactive attributes render their current value.
    pub fn render(&self) -> Option<String> {
        match self {
            AttrValue::Text(s) => Some(s.clone()),
            AttrValue::Reactive(r) => r.get().to_display_string(),
        }
    }
}

/// A name/value pair on an element.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
}

impl Attribute {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AttrValue::Text(value.into()),
        }
    }

    pub fn reactive(name: impl Into<String>, value: Reactive) -> Self {
        Self {
            name: name.into(),
            value: AttrValue::Reactive(value),
        }
    }
}

/// Element state: markup attributes plus the live surfaces bindings write to.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub name: String,

    /// Ordered markup attributes.
    pub attributes: Vec<Attribute>,

    /// Live style surface, property name to value.
    pub style: IndexMap<String, String>,

    /// Live class tokens, in application order.
    pub class_list: Vec<String>,

    /// Live handler properties. Not markup attributes.
    pub handlers: IndexMap<String, Callback>,
}

enum Content {
    Fragment,
    Element(Element),
    Text(String),
    Comment(String),
}

struct NodeData {
    parent: Option<Weak<RefCell<NodeData>>>,
    children: Vec<Node>,
    content: Content,
}

/// Shared handle to a tree node.
///
/// Children are owned by their parent; parents are referenced weakly.
/// Cloning the handle does not clone the node.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

/// Weak handle to a tree node, for closures that must not keep it alive.
#[derive(Clone)]
pub struct WeakNode(Weak<RefCell<NodeData>>);

impl WeakNode {
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }
}

impl Node {
    fn from_content(content: Content) -> Self {
        Node(Rc::new(RefCell::new(NodeData {
            parent: None,
            children: Vec::new(),
            content,
        })))
    }

    pub fn fragment() -> Self {
        Self::from_content(Content::Fragment)
    }

    pub fn element(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self::from_content(Content::Element(Element {
            name: name.into(),
            attributes,
            ..Element::default()
        }))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::from_content(Content::Text(text.into()))
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self::from_content(Content::Comment(text.into()))
    }

    pub fn kind(&self) -> NodeKind {
        match self.0.borrow().content {
            Content::Fragment => NodeKind::Fragment,
            Content::Element(_) => NodeKind::Element,
            Content::Text(_) => NodeKind::Text,
            Content::Comment(_) => NodeKind::Comment,
        }
    }

    pub fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Rc::downgrade(&self.0))
    }

    /// Element name, `None` for non-element nodes.
    pub fn name(&self) -> Option<String> {
        match &self.0.borrow().content {
            Content::Element(e) => Some(e.name.clone()),
            _ => None,
        }
    }

    /// Literal content of a text or comment node.
    pub fn literal(&self) -> Option<String> {
        match &self.0.borrow().content {
            Content::Text(s) | Content::Comment(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Replace the literal content of a text or comment node.
    pub fn set_literal(&self, text: impl Into<String>) {
        match &mut self.0.borrow_mut().content {
            Content::Text(s) | Content::Comment(s) => *s = text.into(),
            _ => {}
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let data = self.0.borrow();
        match &data.content {
            Content::Text(s) => s.clone(),
            Content::Comment(_) => String::new(),
            _ => data.children.iter().map(Node::text_content).collect(),
        }
    }

    // ---- Structure -------------------------------------------------------

    pub fn parent(&self) -> Option<Node> {
        self.0
            .borrow()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Node)
    }

    pub fn children(&self) -> Vec<Node> {
        self.0.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    /// Append `child` as the last child, detaching it from its current parent.
    pub fn append_child(&self, child: &Node) {
        child.detach();
        child.0.borrow_mut().parent = Some(Rc::downgrade(&self.0));
        self.0.borrow_mut().children.push(child.clone());
    }

    /// Insert `sibling` right after this node.
    ///
    /// Returns `false` (and does nothing) if this node has no parent.
    pub fn insert_after(&self, sibling: &Node) -> bool {
        if sibling.ptr_eq(self) {
            return false;
        }
        sibling.detach();
        let Some(parent) = self.parent() else {
            return false;
        };
        let Some(index) = parent.position_of(self) else {
            return false;
        };
        sibling.0.borrow_mut().parent = Some(Rc::downgrade(&parent.0));
        parent.0.borrow_mut().children.insert(index + 1, sibling.clone());
        true
    }

    /// Remove this node from its parent.
    pub fn detach(&self) {
        let parent = self.0.borrow_mut().parent.take().and_then(|w| w.upgrade());
        if let Some(parent) = parent {
            parent
                .borrow_mut()
                .children
                .retain(|c| !Rc::ptr_eq(&c.0, &self.0));
        }
    }

    fn position_of(&self, child: &Node) -> Option<usize> {
        self.0
            .borrow()
            .children
            .iter()
            .position(|c| c.ptr_eq(child))
    }

    /// This node and all descendants, in document order.
    pub fn descendants(&self) -> Vec<Node> {
        let mut out = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            out.push(node);
        }
        out
    }

    /// All element nodes in this subtree, in document order.
    pub fn elements(&self) -> Vec<Node> {
        self.descendants()
            .into_iter()
            .filter(Node::is_element)
            .collect()
    }

    /// Nodes in this subtree whose literal content satisfies `predicate`.
    pub fn find_literal(&self, predicate: impl Fn(&str) -> bool) -> Vec<Node> {
        self.descendants()
            .into_iter()
            .filter(|n| n.literal().is_some_and(|text| predicate(&text)))
            .collect()
    }

    // ---- Element surfaces ------------------------------------------------

    fn with_element<R>(&self, f: impl FnOnce(&Element) -> R) -> Option<R> {
        match &self.0.borrow().content {
            Content::Element(e) => Some(f(e)),
            _ => None,
        }
    }

    fn with_element_mut<R>(&self, f: impl FnOnce(&mut Element) -> R) -> Option<R> {
        match &mut self.0.borrow_mut().content {
            Content::Element(e) => Some(f(e)),
            _ => None,
        }
    }

    /// Snapshot of the element state.
    pub fn element_data(&self) -> Option<Element> {
        self.with_element(Clone::clone)
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        self.with_element(|e| e.attributes.clone())
            .unwrap_or_default()
    }

    pub fn set_attributes(&self, attributes: Vec<Attribute>) {
        self.with_element_mut(|e| e.attributes = attributes);
    }

    pub fn attribute(&self, name: &str) -> Option<AttrValue> {
        self.with_element(|e| {
            e.attributes
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.value.clone())
        })
        .flatten()
    }

    /// Set an attribute in place, or append it if absent.
    pub fn set_attribute(&self, name: &str, value: AttrValue) {
        self.with_element_mut(|e| {
            match e.attributes.iter_mut().find(|a| a.name == name) {
                Some(attr) => attr.value = value,
                None => e.attributes.push(Attribute {
                    name: name.to_string(),
                    value,
                }),
            }
        });
    }

    pub fn remove_attribute(&self, name: &str) {
        self.with_element_mut(|e| e.attributes.retain(|a| a.name != name));
    }

    /// Insert an attribute at `index`, clamped to the list length.
    pub fn insert_attribute(&self, index: usize, attribute: Attribute) {
        self.with_element_mut(|e| {
            let index = index.min(e.attributes.len());
            e.attributes.insert(index, attribute);
        });
    }

    pub fn remove_attribute_at(&self, index: usize) -> Option<Attribute> {
        self.with_element_mut(|e| {
            (index < e.attributes.len()).then(|| e.attributes.remove(index))
        })
        .flatten()
    }

    pub fn style_property(&self, property: &str) -> Option<String> {
        self.with_element(|e| e.style.get(property).cloned())
            .flatten()
    }

    pub fn set_style_property(&self, property: &str, value: impl Into<String>) {
        let value = value.into();
        self.with_element_mut(|e| e.style.insert(property.to_string(), value));
    }

    pub fn remove_style_property(&self, property: &str) {
        self.with_element_mut(|e| e.style.shift_remove(property));
    }

    pub fn class_list(&self) -> Vec<String> {
        self.with_element(|e| e.class_list.clone())
            .unwrap_or_default()
    }

    pub fn has_class(&self, token: &str) -> bool {
        self.with_element(|e| e.class_list.iter().any(|t| t == token))
            .unwrap_or(false)
    }

    pub fn add_class(&self, token: &str) {
        self.with_element_mut(|e| {
            if !e.class_list.iter().any(|t| t == token) {
                e.class_list.push(token.to_string());
            }
        });
    }

    pub fn remove_class(&self, token: &str) {
        self.with_element_mut(|e| e.class_list.retain(|t| t != token));
    }

    pub fn handler(&self, name: &str) -> Option<Callback> {
        self.with_element(|e| e.handlers.get(name).cloned())
            .flatten()
    }

    pub fn set_handler(&self, name: &str, handler: Callback) {
        self.with_element_mut(|e| e.handlers.insert(name.to_string(), handler));
    }

    /// Invoke the handler property `name`, if any. Returns whether one ran.
    pub fn dispatch(&self, name: &str, event: &Value) -> bool {
        match self.handler(name) {
            Some(handler) => {
                handler.call(event);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({:?}, {})", self.kind(), self.to_markup())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(nodes: &[Node]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| n.name().or_else(|| n.literal()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_insert_after_and_detach() {
        let root = Node::fragment();
        let a = Node::element("a", vec![]);
        let c = Node::element("c", vec![]);
        root.append_child(&a);
        root.append_child(&c);

        let b = Node::element("b", vec![]);
        assert!(a.insert_after(&b));
        assert_eq!(names(&root.children()), vec!["a", "b", "c"]);

        a.detach();
        assert_eq!(names(&root.children()), vec!["b", "c"]);
        assert!(a.parent().is_none());
    }

    #[test]
    fn test_insert_after_moves_existing_child() {
        let root = Node::fragment();
        let a = Node::element("a", vec![]);
        let b = Node::element("b", vec![]);
        let c = Node::element("c", vec![]);
        for n in [&a, &b, &c] {
            root.append_child(n);
        }
        c.insert_after(&a);
        assert_eq!(names(&root.children()), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_insert_after_without_parent() {
        let lone = Node::element("lone", vec![]);
        assert!(!lone.insert_after(&Node::text("x")));
    }

    #[test]
    fn test_descendants_document_order() {
        let root = Node::fragment();
        let div = Node::element("div", vec![]);
        let span = Node::element("span", vec![]);
        root.append_child(&div);
        div.append_child(&span);
        span.append_child(&Node::text("hi"));
        root.append_child(&Node::comment("note"));

        let order = names(&root.descendants()[1..]);
        assert_eq!(order, vec!["div", "span", "hi", "note"]);
        assert_eq!(root.elements().len(), 2);
        assert_eq!(root.find_literal(|t| t.starts_with("no")).len(), 1);
    }

    #[test]
    fn test_attribute_editing() {
        let el = Node::element("div", vec![Attribute::text("id", "x")]);
        el.set_attribute("title", AttrValue::Text("t".to_string()));
        el.insert_attribute(0, Attribute::text("first", ""));
        assert_eq!(
            el.attributes().iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
            vec!["first", "id", "title"]
        );

        el.remove_attribute("id");
        assert!(el.attribute("id").is_none());
        assert_eq!(el.remove_attribute_at(5), None);
        assert_eq!(el.remove_attribute_at(0).map(|a| a.name), Some("first".to_string()));
    }

    #[test]
    fn test_class_list_and_style() {
        let el = Node::element("div", vec![]);
        el.add_class("a");
        el.add_class("a");
        el.add_class("b");
        el.remove_class("a");
        assert_eq!(el.class_list(), vec!["b"]);

        el.set_style_property("color", "red");
        assert_eq!(el.style_property("color").as_deref(), Some("red"));
        el.remove_style_property("color");
        assert_eq!(el.style_property("color"), None);
    }

    #[test]
    fn test_text_node_has_no_element_surfaces() {
        let text = Node::text("hello");
        text.set_attribute("x", AttrValue::Text("y".to_string()));
        assert!(text.attributes().is_empty());
        assert_eq!(text.text_content(), "hello");
    }
}
