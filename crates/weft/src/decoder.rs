/*
 * decoder.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Placement classification from the literal text before an interpolation.
//!
//! Only the segment immediately preceding the interpolation point is
//! inspected, not the markup accumulated so far. A tag that opens in one
//! segment and receives a value two segments later is classified from the
//! later segment alone: with segments `<div a="`, `" ` and `>`, the second
//! value only sees `" ` and is classified as element content.

use crate::record::Placement;

/// Classify where a value following `segment` lands.
pub fn classify(segment: &str) -> Placement {
    let trimmed = segment.trim();
    let trimmed = trimmed.strip_suffix(['"', '\'']).unwrap_or(trimmed);
    let tail = trimmed.split_whitespace().next_back().unwrap_or("");

    if let Some(attribute_name) = tail.strip_suffix('=') {
        return Placement::AttributeValue {
            attribute_name: attribute_name.to_string(),
        };
    }

    // Unclosed open tag: a `<` with no `>` after it
    match segment.chars().rev().find(|c| matches!(c, '<' | '>')) {
        Some('<') => Placement::AttributeDomain,
        _ => Placement::ElementDomain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(name: &str) -> Placement {
        Placement::AttributeValue {
            attribute_name: name.to_string(),
        }
    }

    #[test]
    fn test_attribute_value_assignment() {
        assert_eq!(classify(r#"class=""#), attr("class"));
        assert_eq!(classify(r#"<div id="main" style=""#), attr("style"));
        assert_eq!(classify("<a href='"), attr("href"));
        assert_eq!(classify("<input value="), attr("value"));
    }

    #[test]
    fn test_attribute_domain() {
        assert_eq!(classify("<div "), Placement::AttributeDomain);
        assert_eq!(classify("<p>text</p><span id=\"a\" "), Placement::AttributeDomain);
    }

    #[test]
    fn test_element_domain() {
        assert_eq!(classify("<div>"), Placement::ElementDomain);
        assert_eq!(classify(""), Placement::ElementDomain);
        assert_eq!(classify("plain text "), Placement::ElementDomain);
        assert_eq!(classify("<ul><li>"), Placement::ElementDomain);
    }

    #[test]
    fn test_single_segment_scope() {
        // The open tag started in an earlier segment; only `" ` is visible here
        assert_eq!(classify("\" "), Placement::ElementDomain);
    }
}
