//! Markup-to-tree building.
//!
//! Template interpolation only needs *some* component that turns the
//! marker-annotated markup string into a mutable [`Node`] tree; that is the
//! [`MarkupBuilder`] trait. [`XmlMarkupBuilder`] is the default
//! implementation, built on [`quick_xml`]'s event reader.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, BytesText, Event};

use crate::dom::{Attribute, Node};
use crate::error::{MarkupError, MarkupResult};

/// Turns markup text into a tree rooted at a fragment node.
pub trait MarkupBuilder {
    fn build(&self, markup: &str) -> MarkupResult<Node>;
}

/// Well-formed markup builder backed by quick-xml.
///
/// Differences from a strict XML document parser:
/// - any number of top-level nodes is accepted (the result is a fragment);
/// - comments are kept as comment nodes;
/// - attribute names are kept whole (`::1` is a valid name) and valueless
///   attributes get an empty value.
///
/// # Example
///
/// ```rust
/// use weft::dom::{MarkupBuilder, XmlMarkupBuilder};
///
/// let root = XmlMarkupBuilder::default().build("<p>one</p><p>two</p>").unwrap();
/// assert_eq!(root.child_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct XmlMarkupBuilder {
    /// Drop whitespace-only text at the top level of the fragment.
    pub trim_fragment_whitespace: bool,
}

impl Default for XmlMarkupBuilder {
    fn default() -> Self {
        Self {
            trim_fragment_whitespace: true,
        }
    }
}

impl MarkupBuilder for XmlMarkupBuilder {
    fn build(&self, markup: &str) -> MarkupResult<Node> {
        let mut parser = XmlTreeParser::new(markup, self.trim_fragment_whitespace);
        parser.parse()
    }
}

/// Internal parser state.
struct XmlTreeParser<'a> {
    reader: Reader<&'a [u8]>,

    /// Fragment receiving top-level nodes.
    root: Node,

    /// Elements opened but not yet closed.
    stack: Vec<Node>,

    trim_fragment_whitespace: bool,
}

impl<'a> XmlTreeParser<'a> {
    fn new(source: &'a str, trim_fragment_whitespace: bool) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        Self {
            reader,
            root: Node::fragment(),
            stack: Vec::new(),
            trim_fragment_whitespace,
        }
    }

    fn parse(&mut self) -> MarkupResult<Node> {
        loop {
            let event_start = self.reader.buffer_position();

            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    let element = self.make_element(&e, event_start)?;
                    self.current().append_child(&element);
                    self.stack.push(element);
                }
                Ok(Event::End(e)) => {
                    let end_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    let node = self
                        .stack
                        .pop()
                        .ok_or_else(|| MarkupError::UnexpectedEndTag {
                            name: end_name.clone(),
                        })?;
                    let open_name = node.name().unwrap_or_default();
                    if open_name != end_name {
                        return Err(MarkupError::MismatchedEndTag {
                            expected: open_name,
                            found: end_name,
                        });
                    }
                }
                Ok(Event::Empty(e)) => {
                    let element = self.make_element(&e, event_start)?;
                    self.current().append_child(&element);
                }
                Ok(Event::Text(e)) => {
                    self.handle_text(e, event_start)?;
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(e.as_ref()).to_string();
                    self.current().append_child(&Node::text(text));
                }
                Ok(Event::Comment(e)) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                    self.current().append_child(&Node::comment(text));
                }
                Ok(Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {
                    // Not represented in the tree
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(MarkupError::Syntax {
                        message: e.to_string(),
                        position: self.reader.error_position(),
                    });
                }
            }
        }

        if let Some(node) = self.stack.last() {
            return Err(MarkupError::UnexpectedEof {
                expected: node.name().unwrap_or_default(),
            });
        }

        Ok(self.root.clone())
    }

    /// Innermost open element, or the fragment root.
    fn current(&self) -> Node {
        self.stack.last().unwrap_or(&self.root).clone()
    }

    fn handle_text(&mut self, e: BytesText<'_>, event_start: u64) -> MarkupResult<()> {
        let text = e.unescape().map_err(|err| MarkupError::Syntax {
            message: format!("Invalid text content: {}", err),
            position: event_start,
        })?;

        if self.stack.is_empty() && self.trim_fragment_whitespace && text.trim().is_empty() {
            return Ok(());
        }

        self.current().append_child(&Node::text(text.into_owned()));
        Ok(())
    }

    fn make_element(&self, e: &BytesStart<'_>, tag_start: u64) -> MarkupResult<Node> {
        let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let mut attributes = Vec::new();

        for attr_result in e.html_attributes() {
            let attr = attr_result.map_err(|err| MarkupError::Syntax {
                message: format!("Attribute error: {}", err),
                position: tag_start,
            })?;

            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value().map_err(|err| MarkupError::Syntax {
                message: format!("Invalid attribute value: {}", err),
                position: tag_start,
            })?;

            attributes.push(Attribute::text(key, value.into_owned()));
        }

        Ok(Node::element(name, attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{AttrValue, NodeKind};

    fn build(markup: &str) -> Node {
        XmlMarkupBuilder::default().build(markup).unwrap()
    }

    #[test]
    fn test_build_multiple_roots() {
        let root = build("<b>x</b><i>y</i>");
        assert_eq!(root.kind(), NodeKind::Fragment);
        let children = root.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name().as_deref(), Some("b"));
        assert_eq!(children[1].text_content(), "y");
    }

    #[test]
    fn test_build_keeps_comments() {
        let root = build("<p><!--::0--></p>");
        let comments = root.find_literal(|t| t.starts_with("::"));
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].kind(), NodeKind::Comment);
        assert_eq!(comments[0].literal().as_deref(), Some("::0"));
    }

    #[test]
    fn test_build_marker_attribute_names() {
        let root = build(r#"<div ::1="" class="::0"/>"#);
        let div = &root.children()[0];
        let attrs = div.attributes();
        assert_eq!(attrs[0].name, "::1");
        assert_eq!(attrs[0].value, AttrValue::Text(String::new()));
        assert_eq!(attrs[1].name, "class");
    }

    #[test]
    fn test_build_valueless_attribute() {
        let root = build("<input disabled/>");
        let input = &root.children()[0];
        assert_eq!(
            input.attribute("disabled"),
            Some(AttrValue::Text(String::new()))
        );
    }

    #[test]
    fn test_build_unescapes_text_and_attributes() {
        let root = build(r#"<a title="&lt;x&gt;">a &amp; b</a>"#);
        let a = &root.children()[0];
        assert_eq!(a.attribute("title"), Some(AttrValue::Text("<x>".to_string())));
        assert_eq!(a.text_content(), "a & b");
    }

    #[test]
    fn test_build_trims_top_level_whitespace() {
        let root = build("\n  <p> </p>\n");
        assert_eq!(root.child_count(), 1);
        // Whitespace inside elements is preserved
        assert_eq!(root.children()[0].text_content(), " ");

        let kept = XmlMarkupBuilder {
            trim_fragment_whitespace: false,
        }
        .build("\n<p/>\n")
        .unwrap();
        assert_eq!(kept.child_count(), 3);
    }

    #[test]
    fn test_build_mismatched_end_tag() {
        let err = XmlMarkupBuilder::default().build("<a></b>").unwrap_err();
        assert!(matches!(
            err,
            MarkupError::MismatchedEndTag { .. } | MarkupError::Syntax { .. }
        ));
    }

    #[test]
    fn test_build_unclosed_element() {
        let err = XmlMarkupBuilder::default().build("<a><b></b>").unwrap_err();
        assert!(matches!(
            err,
            MarkupError::UnexpectedEof { .. } | MarkupError::Syntax { .. }
        ));
    }
}
