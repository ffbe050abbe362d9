//! Argument normalization shared by the handlers.
//!
//! Models send optional arguments in every shape: missing, `null`, `""`,
//! or padded with whitespace. All of those mean "not given".

use anyhow::{bail, Result};
use cp_domain::tool::is_incomplete;
use serde_json::{Map, Value};

/// The argument object. `null` reads as no arguments; the incomplete
/// marker and non-object values are rejected.
pub fn object(args: &Value) -> Result<Map<String, Value>> {
    if is_incomplete(args) {
        bail!("arguments were incomplete and could not be parsed");
    }
    match args {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map.clone()),
        other => bail!("arguments must be a JSON object, got {other}"),
    }
}

/// A trimmed, non-blank string argument, or `None`.
pub fn optional(args: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => bail!("`{key}` must be a string, got {other}"),
    }
}

pub fn required(args: &Map<String, Value>, key: &str) -> Result<String> {
    match optional(args, key)? {
        Some(v) => Ok(v),
        None => bail!("`{key}` is required"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_null_and_blank_are_all_absent() {
        let args = object(&json!({"a": null, "b": "  ", "c": ""})).unwrap();
        for key in ["a", "b", "c", "missing"] {
            assert_eq!(optional(&args, key).unwrap(), None, "{key}");
        }
    }

    #[test]
    fn values_are_trimmed() {
        let args = object(&json!({"work_mode": " hybrid "})).unwrap();
        assert_eq!(optional(&args, "work_mode").unwrap().as_deref(), Some("hybrid"));
    }

    #[test]
    fn null_arguments_are_an_empty_object() {
        assert!(object(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn incomplete_marker_is_rejected() {
        let marker = json!({"raw": "{\"work_mo", "status": "incomplete"});
        assert!(object(&marker).is_err());
    }

    #[test]
    fn nested_values_are_malformed() {
        let args = object(&json!({"keyword": ["a", "b"]})).unwrap();
        assert!(optional(&args, "keyword").is_err());
        assert!(object(&json!("just text")).is_err());
    }

    #[test]
    fn required_rejects_blank() {
        let args = object(&json!({"query": " "})).unwrap();
        assert!(required(&args, "query").is_err());
    }
}
