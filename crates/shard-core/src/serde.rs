//! Deterministic JSON and YAML helpers for reports and configuration.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::errors::{codes, ErrorInfo, ShardError};

fn serde_error(code: &str, err: impl ToString) -> ShardError {
    ShardError::Serde(ErrorInfo::new(code, err.to_string()))
}

/// Re-inserts every object's entries in key order, recursively.
fn sort_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (key, mut entry) in entries {
                sort_keys(&mut entry);
                map.insert(key, entry);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sort_keys),
        _ => {}
    }
}

/// Pretty-printed JSON with sorted object keys and a trailing newline, so
/// identical reports are byte-identical on disk.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, ShardError> {
    let mut tree = serde_json::to_value(value).map_err(|err| serde_error(codes::JSON_ENCODE, err))?;
    sort_keys(&mut tree);
    let mut bytes =
        serde_json::to_vec_pretty(&tree).map_err(|err| serde_error(codes::JSON_ENCODE, err))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decodes a JSON document, such as a stored merge report.
pub fn from_json_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, ShardError> {
    serde_json::from_slice(data).map_err(|err| serde_error(codes::JSON_DECODE, err))
}

/// Decodes a YAML document, such as a merge configuration.
pub fn from_yaml_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, ShardError> {
    serde_yaml::from_slice(data).map_err(|err| serde_error(codes::YAML_DECODE, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Unordered {
        zeta: u8,
        alpha: Vec<Nested>,
    }

    #[derive(Serialize)]
    struct Nested {
        y: u8,
        b: u8,
    }

    #[test]
    fn keys_are_sorted_at_every_depth() {
        let bytes = to_canonical_json_bytes(&Unordered {
            zeta: 1,
            alpha: vec![Nested { y: 2, b: 3 }],
        })
        .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.find("\"alpha\"").unwrap() < text.find("\"zeta\"").unwrap());
        assert!(text.find("\"b\"").unwrap() < text.find("\"y\"").unwrap());
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn decode_failures_carry_codes() {
        let err = from_yaml_slice::<Vec<u8>>(b"{ not: [yaml").unwrap_err();
        assert_eq!(err.code(), codes::YAML_DECODE);
        let err = from_json_slice::<u8>(b"\"text\"").unwrap_err();
        assert_eq!(err.code(), codes::JSON_DECODE);
    }
}
