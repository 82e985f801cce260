//! YAML parsing and emission for manifest documents
//!
//! Parses YAML into `serde_json::Value` so the rest of the crate works
//! against one untyped value model. Uses yaml-rust2 for parsing and
//! serde_yaml for emission.

use serde_json::{Map, Number, Value};
use yaml_rust2::{Yaml, YamlLoader};

use crate::{Error, Result};

/// Parse a YAML string into a `serde_json::Value`.
///
/// For multi-document input, returns only the first document.
/// Returns `Value::Null` for empty input.
pub fn parse_document(input: &str) -> Result<Value> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| Error::invalid_manifest(e.to_string()))?;
    match docs.into_iter().next() {
        Some(doc) => to_json(doc),
        None => Ok(Value::Null),
    }
}

/// Parse a multi-document YAML string into a Vec of `serde_json::Value`s.
///
/// Each document separated by `---` becomes a separate value.
pub fn parse_documents(input: &str) -> Result<Vec<Value>> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| Error::invalid_manifest(e.to_string()))?;
    docs.into_iter().map(to_json).collect()
}

/// Serialize a value back to a YAML document.
pub fn emit_document(value: &Value) -> Result<String> {
    Ok(serde_yaml::to_string(value)?)
}

/// Serialize values back to a `---`-separated multi-document manifest.
pub fn emit_documents(values: &[Value]) -> Result<String> {
    let docs = values
        .iter()
        .map(emit_document)
        .collect::<Result<Vec<_>>>()?;
    Ok(docs.join("---\n"))
}

fn to_json(yaml: Yaml) -> Result<Value> {
    match yaml {
        Yaml::Null => Ok(Value::Null),
        Yaml::Boolean(b) => Ok(Value::Bool(b)),
        Yaml::String(s) => Ok(Value::String(s)),
        Yaml::Integer(i) => Ok(Value::Number(i.into())),
        Yaml::Real(s) => {
            let f: f64 = s
                .parse()
                .map_err(|e: std::num::ParseFloatError| Error::invalid_manifest(e.to_string()))?;
            // Non-finite floats have no JSON representation.
            Ok(Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null))
        }
        Yaml::Array(seq) => {
            let mut values = Vec::with_capacity(seq.len());
            for item in seq {
                values.push(to_json(item)?);
            }
            Ok(Value::Array(values))
        }
        Yaml::Hash(hash) => {
            let mut map = Map::new();
            for (key, value) in hash {
                map.insert(scalar_key(key)?, to_json(value)?);
            }
            Ok(Value::Object(map))
        }
        Yaml::Alias(_) => Err(Error::invalid_manifest("YAML aliases not supported")),
        Yaml::BadValue => Err(Error::invalid_manifest("bad YAML value")),
    }
}

/// Manifest mapping keys must be scalars; other key shapes are rejected.
fn scalar_key(key: Yaml) -> Result<String> {
    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Real(r) => Ok(r),
        Yaml::Boolean(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        _ => Err(Error::invalid_manifest("unsupported YAML key type")),
    }
}
