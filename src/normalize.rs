//! Envelope handling for category listing payloads.
//!
//! The backend is inconsistent about how it wraps category arrays: the tree
//! endpoint returns a bare array while paginated listings wrap it in
//! `{"categories": [..]}` or `{"data": [..]}`. `normalize` accepts all three
//! and turns anything else into an empty list; `parse_categories` is the
//! strict counterpart for diagnostics.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{kind_of, ParseError};
use crate::tree::{CategoryArena, CategoryNode, StrictNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    Bare,
    Categories,
    Data,
}

/// The recognized envelope and the array it wraps.
pub fn unwrap_envelope(raw: &Value) -> Option<(Envelope, &Vec<Value>)> {
    if let Value::Array(items) = raw {
        return Some((Envelope::Bare, items));
    }
    let object = raw.as_object()?;
    if let Some(Value::Array(items)) = object.get("categories") {
        return Some((Envelope::Categories, items));
    }
    if let Some(Value::Array(items)) = object.get("data") {
        return Some((Envelope::Data, items));
    }
    None
}

pub fn detect_envelope(raw: &Value) -> Option<Envelope> {
    unwrap_envelope(raw).map(|(envelope, _)| envelope)
}

/// Lenient: unrecognized shapes yield no categories and malformed elements
/// are skipped.
pub fn normalize(raw: &Value) -> Vec<CategoryNode> {
    let Some((envelope, items)) = unwrap_envelope(raw) else {
        tracing::debug!(found = kind_of(raw), "unrecognized category payload, treating as empty");
        return Vec::new();
    };
    tracing::debug!(?envelope, count = items.len(), "normalizing category payload");

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match CategoryNode::deserialize(item) {
            Ok(node) => Some(node),
            Err(err) => {
                tracing::warn!(index, error = %err, "skipping malformed category");
                None
            }
        })
        .collect()
}

pub fn normalize_str(json: &str) -> Vec<CategoryNode> {
    match serde_json::from_str::<Value>(json) {
        Ok(raw) => normalize(&raw),
        Err(err) => {
            tracing::warn!(error = %err, "category payload is not valid JSON");
            Vec::new()
        }
    }
}

/// Strict: every element must deserialize and every name must be non-blank.
pub fn parse_categories(raw: &Value) -> Result<Vec<CategoryNode>, ParseError> {
    let (_, items) = unwrap_envelope(raw).ok_or(ParseError::UnrecognizedShape {
        found: kind_of(raw),
    })?;

    let nodes = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            StrictNode::deserialize(item)
                .map(|node| node.0)
                .map_err(|source| ParseError::InvalidNode { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let arena = CategoryArena::new(&nodes);
    if let Some(blank) = arena
        .slots()
        .iter()
        .find(|slot| slot.node.name.trim().is_empty())
    {
        return Err(ParseError::EmptyName {
            id: blank.node.id.clone(),
        });
    }
    Ok(nodes)
}

pub fn parse_categories_str(json: &str) -> Result<Vec<CategoryNode>, ParseError> {
    let raw: Value = serde_json::from_str(json)?;
    parse_categories(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!([
            {"id": "1", "name": "Electronics", "children": [{"id": "2", "name": "Phones"}]},
            {"id": "3", "name": "Clothing"}
        ])
    }

    #[test]
    fn test_bare_array_passes_through() {
        let nodes = normalize(&sample());
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].children[0].name, "Phones");
        assert_eq!(detect_envelope(&sample()), Some(Envelope::Bare));
    }

    #[test]
    fn test_envelopes_yield_same_nodes() {
        let bare = normalize(&sample());
        assert_eq!(normalize(&json!({"categories": sample()})), bare);
        assert_eq!(normalize(&json!({"data": sample(), "total": 2})), bare);
    }

    #[test]
    fn test_categories_wins_over_data() {
        let raw = json!({"categories": [{"id": "c", "name": "C"}], "data": [{"id": "d", "name": "D"}]});
        assert_eq!(detect_envelope(&raw), Some(Envelope::Categories));
        assert_eq!(normalize(&raw)[0].id, "c");
    }

    #[test]
    fn test_non_array_categories_falls_back_to_data() {
        let raw = json!({"categories": "nope", "data": [{"id": "d", "name": "D"}]});
        assert_eq!(detect_envelope(&raw), Some(Envelope::Data));
    }

    #[test]
    fn test_unknown_shapes_are_empty() {
        assert!(normalize(&Value::Null).is_empty());
        assert!(normalize(&json!({})).is_empty());
        assert!(normalize(&json!(42)).is_empty());
        assert!(normalize(&json!({"data": {"items": []}})).is_empty());
    }

    #[test]
    fn test_malformed_element_is_skipped() {
        let raw = json!([{"id": "1", "name": "Ok"}, {"name": "no id"}, 5]);
        let nodes = normalize(&raw);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, "1");
    }

    #[test]
    fn test_malformed_grandchild_drops_only_itself() {
        let raw = json!([
            {"id": "e", "name": "Electronics", "children": [
                {"id": "p", "name": "Phones"},
                {"name": "no id grandchild"}
            ]},
            {"id": "h", "name": "Home"}
        ]);
        let nodes = normalize(&raw);
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["e", "h"]);
        assert_eq!(nodes[0].children.len(), 1);
        assert_eq!(nodes[0].children[0].id, "p");
    }

    #[test]
    fn test_strict_rejects_malformed_grandchild() {
        let raw = json!([{"id": "e", "name": "E", "children": [{"name": "no id"}]}]);
        assert!(matches!(
            parse_categories(&raw),
            Err(ParseError::InvalidNode { index: 0, .. })
        ));
    }

    #[test]
    fn test_normalize_str_invalid_json_is_empty() {
        assert!(normalize_str("{not json").is_empty());
        assert_eq!(normalize_str(r#"{"data": [{"_id": "x", "name": "X"}]}"#).len(), 1);
    }

    #[test]
    fn test_strict_rejects_unknown_shape() {
        let err = parse_categories(&json!({"items": []})).unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedShape { .. }));
    }

    #[test]
    fn test_strict_reports_bad_index() {
        let err = parse_categories(&json!([{"id": "1", "name": "A"}, {"id": "2"}])).unwrap_err();
        assert!(matches!(err, ParseError::InvalidNode { index: 1, .. }));
    }

    #[test]
    fn test_strict_rejects_nested_blank_name() {
        let raw = json!([{"id": "1", "name": "A", "children": [{"id": "2", "name": "  "}]}]);
        match parse_categories(&raw) {
            Err(ParseError::EmptyName { id }) => assert_eq!(id, "2"),
            other => panic!("expected EmptyName, got {:?}", other),
        }
    }

    #[test]
    fn test_strict_str_reports_json_error() {
        assert!(matches!(parse_categories_str("["), Err(ParseError::Json(_))));
        assert_eq!(parse_categories_str(r#"{"categories": []}"#).unwrap().len(), 0);
    }
}
