use serde::de::DeserializeOwned;

/// JSON decode failure with the path of the offending node, e.g. `[3].rule.elements[0]`.
#[derive(Debug, thiserror::Error)]
#[error("at JSON path {path} → {message}")]
pub struct DecodeError {
    pub path: String,
    pub message: String,
}

impl DecodeError {
    fn from_tracked(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err.path().to_string();
        DecodeError { path, message: err.into_inner().to_string() }
    }
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, DecodeError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(DecodeError::from_tracked)
}

/// Same, for a document that was already parsed (e.g. after a jq filter).
pub fn from_value_with_path<T: DeserializeOwned>(
    value: serde_json::Value,
) -> Result<T, DecodeError> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(DecodeError::from_tracked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::RuleList;

    #[test]
    fn error_names_the_failing_node() {
        let src = r#"[{"rule": {"name": "x", "elements": [[
            {"element": {"num_val": {"hex": {"single": "G1"}}}}
        ]]}}]"#;
        let err = from_str_with_path::<RuleList>(src).unwrap_err();
        assert!(err.path.contains("elements"), "path was {}", err.path);
        assert!(err.message.contains("not a hex digit"));
    }
}
