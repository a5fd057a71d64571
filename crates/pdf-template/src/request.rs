//! Validation of the `replacements` request body

use crate::replacement::ReplacementSet;
use crate::types::*;
use serde_json::Value;

const SEARCH_WORD: &str = "searchWord";
const REPLACE_WORD: &str = "replaceWord";

/// Parse a request body given as JSON text
pub fn parse_request_str(body: &str) -> Result<ReplacementSet> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| TemplateError::InvalidInput(format!("request body is not JSON: {}", e)))?;
    parse_request(&value)
}

/// Turn a request body into a replacement set.
///
/// Accepts `{"replacements": [...]}` or the bare array. Each element must be
/// an object with string `searchWord` and `replaceWord` fields. Elements with
/// an empty `searchWord` carry nothing to match and are skipped.
pub fn parse_request(body: &Value) -> Result<ReplacementSet> {
    let list = match body {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("replacements") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(TemplateError::InvalidInput(
                    "'replacements' must be an array".to_string(),
                ));
            }
            None => {
                return Err(TemplateError::InvalidInput(
                    "'replacements' is missing".to_string(),
                ));
            }
        },
        _ => {
            return Err(TemplateError::InvalidInput(
                "'replacements' must be an array".to_string(),
            ));
        }
    };

    let mut set = ReplacementSet::new();
    for (index, item) in list.iter().enumerate() {
        let Value::Object(entry) = item else {
            return Err(TemplateError::MalformedReplacement {
                index,
                reason: "entry is not an object".to_string(),
            });
        };
        let search = string_field(entry, SEARCH_WORD, index)?;
        let replace = string_field(entry, REPLACE_WORD, index)?;

        if search.is_empty() {
            log::warn!("Skipping replacement {} with empty {}", index, SEARCH_WORD);
            continue;
        }
        if set.insert(search, replace).is_some() {
            log::debug!("Token {:?} redefined by entry {}", search, index);
        }
    }

    Ok(set)
}

fn string_field<'a>(
    entry: &'a serde_json::Map<String, Value>,
    name: &str,
    index: usize,
) -> Result<&'a str> {
    match entry.get(name) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(TemplateError::MalformedReplacement {
            index,
            reason: format!("'{}' must be a string", name),
        }),
        None => Err(TemplateError::MalformedReplacement {
            index,
            reason: format!("'{}' is missing", name),
        }),
    }
}
