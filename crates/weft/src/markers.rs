/*
 * markers.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Marker stream construction.
//!
//! Literal segments are copied verbatim and every defined value is replaced
//! by a marker token that names its record:
//!
//! | placement | emitted |
//! |---|---|
//! | attribute value | `::i` (quotes come from the segments) |
//! | attribute domain | `::i=""` (spread marker) |
//! | element domain | `<!--::i-->` |

use crate::decoder::classify;
use crate::error::{TemplateError, TemplateResult};
use crate::record::{Placement, Record, RecordDatabase, slot_id};
use crate::value::Value;

/// Marker-annotated markup, ready for the tree builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerStream {
    pub markup: String,

    /// Number of markers emitted.
    pub markers: usize,
}

/// Interleave `segments` with markers for `values`, recording each value.
///
/// `values[i]` follows `segments[i]`. `Undefined` values emit nothing and
/// get no record.
///
/// # Errors
///
/// Returns [`TemplateError::TooManyValues`] if there are values without a
/// preceding segment.
pub fn build_marker_stream<S: AsRef<str>>(
    segments: &[S],
    values: &[Value],
    records: &RecordDatabase,
) -> TemplateResult<MarkerStream> {
    if values.len() > segments.len().saturating_sub(1) {
        return Err(TemplateError::TooManyValues {
            segments: segments.len(),
            values: values.len(),
        });
    }

    let mut markup = String::new();
    let mut markers = 0;

    for (i, segment) in segments.iter().enumerate() {
        let segment = segment.as_ref();
        markup.push_str(segment);

        let Some(value) = values.get(i) else {
            continue;
        };
        if matches!(value, Value::Undefined) {
            continue;
        }

        let id = slot_id(i);
        let placement = classify(segment);
        match &placement {
            Placement::AttributeValue { .. } => markup.push_str(&id),
            Placement::AttributeDomain => {
                markup.push_str(&id);
                markup.push_str("=\"\"");
            }
            Placement::ElementDomain => {
                markup.push_str("<!--");
                markup.push_str(&id);
                markup.push_str("-->");
            }
        }
        tracing::debug!(id = %id, placement = ?placement, "Recorded interpolation");
        records.insert(Record::new(id, value.clone(), placement));
        markers += 1;
    }

    Ok(MarkerStream { markup, markers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_marker_forms() {
        let records = RecordDatabase::new();
        let stream = build_marker_stream(
            &[r#"<div class=""#, r#""></div><p "#, ">", "</p>"],
            &[Value::from("a"), Value::map([("id", Value::from("x"))]), Value::from(1)],
            &records,
        )
        .unwrap();

        assert_eq!(
            stream.markup,
            r#"<div class="::0"></div><p ::1=""><!--::2--></p>"#
        );
        assert_eq!(stream.markers, 3);
        assert_eq!(records.ids(), vec!["::0", "::1", "::2"]);
    }

    #[test]
    fn test_undefined_values_emit_nothing() {
        let records = RecordDatabase::new();
        let stream = build_marker_stream(
            &["<p>", "", "</p>"],
            &[Value::Undefined, Value::Null],
            &records,
        )
        .unwrap();

        assert_eq!(stream.markup, "<p><!--::1--></p>");
        assert_eq!(stream.markers, 1);
        assert!(!records.contains("::0"));
        assert!(records.contains("::1"));
    }

    #[test]
    fn test_fewer_values_than_slots() {
        let records = RecordDatabase::new();
        let stream = build_marker_stream(&["<p>", "</p>"], &[], &records).unwrap();
        assert_eq!(stream.markup, "<p></p>");
        assert!(records.is_empty());
    }

    #[test]
    fn test_too_many_values() {
        let records = RecordDatabase::new();
        let err = build_marker_stream(&["<p/>"], &[Value::Null], &records).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::TooManyValues {
                segments: 1,
                values: 1
            }
        ));
    }
}
