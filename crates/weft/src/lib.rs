/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Tagged templates to live trees.
//!
//! A template is a sequence of literal markup segments with values between
//! them. Rendering produces a mutable node tree in which the values stay
//! bound: reactive values keep attributes, style properties, class tokens
//! and text up to date, callables become handler properties, and nested
//! template results are spliced in.
//!
//! # Pipeline
//!
//! 1. Every value is wrapped in a [`Record`] and classified by where it sits
//!    in the markup ([`decoder`]).
//! 2. Values are replaced by marker tokens ([`markers`]).
//! 3. The marker-annotated markup is built into a tree by a
//!    [`MarkupBuilder`].
//! 4. Attribute markers are bound, then content markers are replaced by
//!    imported nodes ([`interpolate`]).
//!
//! The result is a [`TemplateInstance`]: the tree, a [`Cleanup`] that
//! unsubscribes every binding, and the [`RecordDatabase`].
//!
//! # Example
//!
//! ```rust
//! use weft::{Reactive, Value, html};
//!
//! let count = Reactive::new(Value::from(1));
//! let instance = html(
//!     &["<p data-count=\"", "\">Count: ", "</p>"],
//!     vec![count.clone().into(), count.clone().into()],
//! )
//! .unwrap();
//! assert_eq!(instance.root.to_markup(), r#"<p data-count="1">Count: 1</p>"#);
//!
//! count.set(2);
//! assert_eq!(instance.root.to_markup(), r#"<p data-count="2">Count: 2</p>"#);
//!
//! instance.cleanup.run();
//! ```

pub mod decoder;
pub mod diagnostics;
pub mod dom;
pub mod error;
pub mod interpolate;
pub mod markers;
pub mod options;
pub mod reactive;
pub mod record;
pub mod template;
pub mod value;

// Re-export main types at crate root
pub use diagnostics::{Diagnostic, DiagnosticCollector};
pub use dom::{MarkupBuilder, Node, NodeKind, XmlMarkupBuilder};
pub use error::{MarkupError, MarkupResult, TemplateError, TemplateResult};
pub use options::TemplateOptions;
pub use reactive::{Reactive, Unsubscribe};
pub use record::{IdAllocator, Placement, Record, RecordDatabase};
pub use template::{Cleanup, Template, TemplateInstance, html};
pub use value::{Callback, Value, ValueMap};
