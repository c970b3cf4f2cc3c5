//! The dynamic tree flowing between every stage, and the per-command result.
//!
//! Trees are `serde_json` values built with `preserve_order`, so mappings
//! keep insertion order and serialize in the order the device emitted them.

use serde_json::json;

pub use serde_json::{Map, Value as Tree};

/// Object map of a tree node.
pub type Node = Map<String, Tree>;

/// Raw payload handed to a parser.
///
/// Text payloads go to the field extractors, decoded payloads to the table
/// normalizer. The format is picked from the device configuration, never by
/// inspecting the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Free-text CLI screen output.
    Text(String),
    /// Vendor JSON already decoded into a tree.
    Decoded(Tree),
}

impl Payload {
    /// Decode a JSON response, keeping the raw text on failure.
    pub fn from_json(raw: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(raw).map(Payload::Decoded)
    }
}

/// Final per-command value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResult {
    /// Parsed or normalized data.
    Value(Tree),

    /// The command has no text parser for this OS family yet.
    Unsupported { command: String },

    /// Extraction, normalization or the device itself failed on this command.
    Failed { message: String, error: String },

    /// The response claimed to be JSON but did not decode.
    DecodeFailed { output: String, error: String },
}

impl ParsedResult {
    /// Scoped failure for `command` with the underlying detail.
    pub fn failed(command: &str, error: impl ToString) -> Self {
        ParsedResult::Failed {
            message: format!("Failed to parse the output from {command}"),
            error: error.to_string(),
        }
    }

    /// Check if the result carries data.
    pub fn is_value(&self) -> bool {
        matches!(self, ParsedResult::Value(_))
    }

    /// Borrow the data, if any.
    pub fn as_value(&self) -> Option<&Tree> {
        match self {
            ParsedResult::Value(tree) => Some(tree),
            _ => None,
        }
    }

    /// Render as a JSON-serializable tree; failures become placeholder maps.
    pub fn into_tree(self) -> Tree {
        match self {
            ParsedResult::Value(tree) => tree,
            ParsedResult::Unsupported { command } => json!({
                "msg": format!("Parser for {command} is not supported yet"),
            }),
            ParsedResult::Failed { message, error } => json!({
                "msg": message,
                "error": error,
            }),
            ParsedResult::DecodeFailed { output, error } => json!({
                "output": output,
                "error": error,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_from_json() {
        let payload = Payload::from_json(r#"{"b": 1, "a": 2}"#).unwrap();
        let Payload::Decoded(tree) = payload else {
            panic!("expected decoded payload");
        };
        let keys: Vec<&String> = tree.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["b", "a"]);

        assert!(Payload::from_json("% Invalid command at '^' marker.").is_err());
    }

    #[test]
    fn test_failure_placeholders() {
        let failed = ParsedResult::failed("show vlan", "Section 'VLAN' not found");
        assert_eq!(
            failed.into_tree(),
            json!({
                "msg": "Failed to parse the output from show vlan",
                "error": "Section 'VLAN' not found",
            })
        );

        let decode = ParsedResult::DecodeFailed {
            output: "garbage".into(),
            error: "The CLI output is not in JSON format.".into(),
        };
        assert_eq!(decode.into_tree()["output"], "garbage");

        let unsupported = ParsedResult::Unsupported {
            command: "show hsrp".into(),
        };
        assert!(!unsupported.is_value());
        assert!(unsupported.into_tree()["msg"].as_str().unwrap().contains("show hsrp"));
    }
}
