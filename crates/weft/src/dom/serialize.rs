//! Markup serialization of a tree, for inspection and tests.

use crate::dom::{Node, NodeKind};

impl Node {
    /// Serialize this subtree back to markup.
    ///
    /// Reactive attributes render their current value. The live class list
    /// is merged into the `class` attribute and the live style surface is
    /// written as a `style` attribute. Handler properties are not markup and
    /// are omitted.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        write_node(self, &mut out);
        out
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node.kind() {
        NodeKind::Fragment => {
            for child in node.children() {
                write_node(&child, out);
            }
        }
        NodeKind::Text => out.push_str(&escape(&node.literal().unwrap_or_default(), false)),
        NodeKind::Comment => {
            out.push_str("<!--");
            out.push_str(&node.literal().unwrap_or_default());
            out.push_str("-->");
        }
        NodeKind::Element => write_element(node, out),
    }
}

fn write_element(node: &Node, out: &mut String) {
    let Some(element) = node.element_data() else {
        return;
    };

    out.push('<');
    out.push_str(&element.name);

    let mut wrote_class = false;
    for attr in &element.attributes {
        let mut value = attr.value.render().unwrap_or_default();
        if attr.name == "class" && !element.class_list.is_empty() {
            wrote_class = true;
            value = join_tokens(&value, &element.class_list);
        }
        write_attribute(out, &attr.name, &value);
    }
    if !wrote_class && !element.class_list.is_empty() {
        write_attribute(out, "class", &element.class_list.join(" "));
    }
    if !element.style.is_empty() {
        let style = element
            .style
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        write_attribute(out, "style", &style);
    }

    let children = node.children();
    if children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(value, true));
    out.push('"');
}

fn join_tokens(existing: &str, tokens: &[String]) -> String {
    let mut all: Vec<&str> = existing.split_whitespace().collect();
    for token in tokens {
        if !all.contains(&token.as_str()) {
            all.push(token);
        }
    }
    all.join(" ")
}

fn escape(text: &str, in_attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
