use thiserror::Error;

/// Failures reported by the strict parsing path.
///
/// The lenient entry points (`normalize`, `normalize_str`) never surface
/// these; they degrade to an empty category list instead.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognized category payload: expected an array, {{\"categories\": [..]}} or {{\"data\": [..]}}, found {found}")]
    UnrecognizedShape { found: &'static str },

    #[error("category at index {index} is malformed: {source}")]
    InvalidNode {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("category '{id}' has a blank name")]
    EmptyName { id: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid category config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("path separator must not be empty")]
    EmptySeparator,

    #[error("max_depth must be at least 1")]
    ZeroDepth,
}

/// Short name of a JSON value's kind, used in error messages.
pub(crate) fn kind_of(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object without a categories/data array",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unrecognized_shape_message_names_kind() {
        let err = ParseError::UnrecognizedShape { found: kind_of(&json!(42)) };
        assert!(err.to_string().contains("found a number"));
    }

    #[test]
    fn test_invalid_node_keeps_source() {
        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = ParseError::InvalidNode { index: 3, source };
        assert!(err.to_string().starts_with("category at index 3"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
