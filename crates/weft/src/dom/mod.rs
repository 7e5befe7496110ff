//! Mutable node tree and the markup builder that produces it.
//!
//! Interpolation works on this tree after it has been built:
//! - [`Node`]: shared handle to a fragment, element, text or comment node
//! - [`Element`]: attributes plus the live style, class and handler surfaces
//! - [`MarkupBuilder`]: markup text to tree, with [`XmlMarkupBuilder`] as the
//!   quick-xml backed default

pub mod builder;
pub mod node;
mod serialize;

pub use builder::{MarkupBuilder, XmlMarkupBuilder};
pub use node::{AttrValue, Attribute, Element, Node, NodeKind, WeakNode};
