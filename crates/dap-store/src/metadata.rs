//! `zarr.json` parsing and attribute conversion.

use std::path::Path;

use chrono::{DateTime, Utc};
use dap_protocol::{Attribute, DType, DatasetInfo, Values};
use serde::Deserialize;
use serde_json::{Map, Value};
use zarrs::array::DataType;

use crate::error::{Result, StoreError};

/// Metadata document name of every Zarr V3 node.
pub const METADATA_FILE: &str = "zarr.json";

/// Attribute holding dimension names in xarray-written stores.
pub const ARRAY_DIMENSIONS_ATTR: &str = "_ARRAY_DIMENSIONS";

/// Kind of a Zarr V3 node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Group,
    Array,
}

/// The parts of `zarr.json` the resolver needs.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeMetadata {
    pub node_type: NodeType,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub dimension_names: Option<Vec<Option<String>>>,
}

impl NodeMetadata {
    /// Read the node metadata in `dir`. `Ok(None)` when `dir` is not a
    /// Zarr node.
    pub fn read(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(METADATA_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::invalid_metadata(format!("{}: {}", path.display(), e)))
    }

    /// Dimension names of an array with `rank` dimensions.
    ///
    /// Taken from `dimension_names`, then the `_ARRAY_DIMENSIONS` attribute,
    /// then `dim_<i>` for anything still unnamed.
    pub fn dimension_names(&self, rank: usize) -> Vec<String> {
        let from_attr: Option<Vec<Option<String>>> = self
            .attributes
            .get(ARRAY_DIMENSIONS_ATTR)
            .and_then(Value::as_array)
            .map(|names| names.iter().map(|n| n.as_str().map(str::to_string)).collect());

        let declared = self
            .dimension_names
            .as_ref()
            .filter(|names| names.len() == rank && names.iter().any(Option::is_some))
            .or(from_attr.as_ref().filter(|names| names.len() == rank));

        (0..rank)
            .map(|i| {
                declared
                    .and_then(|names| names[i].clone())
                    .unwrap_or_else(|| format!("dim_{}", i))
            })
            .collect()
    }
}

/// Native dtype of a Zarr data type, if it has one.
pub fn dtype_of(data_type: &DataType) -> Option<DType> {
    match data_type {
        DataType::Int8 => Some(DType::Int8),
        DataType::UInt8 => Some(DType::UInt8),
        DataType::Int16 => Some(DType::Int16),
        DataType::UInt16 => Some(DType::UInt16),
        DataType::Int32 => Some(DType::Int32),
        DataType::UInt32 => Some(DType::UInt32),
        DataType::Int64 => Some(DType::Int64),
        DataType::UInt64 => Some(DType::UInt64),
        DataType::Float16 => Some(DType::Float16),
        DataType::Float32 => Some(DType::Float32),
        DataType::Float64 => Some(DType::Float64),
        DataType::Bool => Some(DType::Bool),
        DataType::String => Some(DType::String),
        _ => None,
    }
}

/// Split group attributes into the fixed info block and the rest.
pub fn split_info(attributes: &Map<String, Value>) -> (DatasetInfo, Vec<Attribute>) {
    let text = |key: &str| {
        attributes
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let info = DatasetInfo {
        conventions: text("Conventions"),
        version: text("version"),
        sensor: text("sensor"),
        source: text("source"),
        title: text("title"),
        institution: text("institution"),
        history: text("history"),
        references: text("references"),
        date: attributes
            .get("date")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc)),
    };

    let rest = attributes
        .iter()
        .filter(|(key, _)| !DatasetInfo::FIELD_NAMES.contains(&key.as_str()))
        .filter_map(|(key, value)| to_attribute(key, value))
        .collect();

    (info, rest)
}

/// Convert every convertible JSON attribute, preserving document order.
pub fn to_attributes(attributes: &Map<String, Value>) -> Vec<Attribute> {
    attributes
        .iter()
        .filter_map(|(key, value)| to_attribute(key, value))
        .collect()
}

/// Convert one JSON attribute.
///
/// Strings become text, numbers become `Int32` when every value is an
/// integer that fits and `Float64` otherwise. Lists and rectangular lists
/// of lists become 1-D and 2-D arrays. Anything else is skipped.
pub fn to_attribute(name: &str, value: &Value) -> Option<Attribute> {
    match value {
        Value::String(s) => Some(Attribute::text(name, s.as_str())),
        Value::Bool(b) => Attribute::scalar(name, Values::UInt8(vec![u8::from(*b)])).ok(),
        Value::Number(_) => Attribute::scalar(name, numbers(std::slice::from_ref(value))?).ok(),
        Value::Array(items) if items.iter().all(Value::is_array) && !items.is_empty() => {
            let rows: Vec<&Vec<Value>> = items.iter().filter_map(Value::as_array).collect();
            let width = rows[0].len();
            if rows.iter().any(|r| r.len() != width) {
                tracing::debug!("Skipping ragged attribute {}", name);
                return None;
            }
            let flat: Vec<Value> = rows.into_iter().flatten().cloned().collect();
            Attribute::array(name, numbers(&flat)?, vec![items.len(), width]).ok()
        }
        Value::Array(items) => Attribute::array(name, numbers(items)?, vec![items.len()]).ok(),
        _ => {
            tracing::debug!("Skipping attribute {} with unsupported JSON value", name);
            None
        }
    }
}

fn numbers(items: &[Value]) -> Option<Values> {
    let ints: Option<Vec<i32>> = items
        .iter()
        .map(|v| v.as_i64().and_then(|i| i32::try_from(i).ok()))
        .collect();
    if let Some(ints) = ints {
        return Some(Values::Int32(ints));
    }
    let floats: Option<Vec<f64>> = items.iter().map(Value::as_f64).collect();
    floats.map(Values::Float64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dap_protocol::AttrValue;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_dimension_names_precedence() {
        let meta: NodeMetadata = serde_json::from_value(json!({
            "node_type": "array",
            "dimension_names": ["time", null],
            "attributes": {"_ARRAY_DIMENSIONS": ["t", "x"]}
        }))
        .unwrap();
        assert_eq!(meta.dimension_names(2), vec!["time", "dim_1"]);

        let meta: NodeMetadata = serde_json::from_value(json!({
            "node_type": "array",
            "attributes": {"_ARRAY_DIMENSIONS": ["t", "x"]}
        }))
        .unwrap();
        assert_eq!(meta.dimension_names(2), vec!["t", "x"]);

        let meta: NodeMetadata =
            serde_json::from_value(json!({"node_type": "array"})).unwrap();
        assert_eq!(meta.dimension_names(3), vec!["dim_0", "dim_1", "dim_2"]);
    }

    #[test]
    fn test_split_info() {
        let attrs = map(json!({
            "title": "Forecast",
            "date": "2024-12-22T00:00:00Z",
            "date_iso": "2024-12-22T00:00:00Z",
            "comment": "synthetic",
            "Conventions": "CF-1.8"
        }));
        let (info, rest) = split_info(&attrs);
        assert_eq!(info.title, "Forecast");
        assert_eq!(info.conventions, "CF-1.8");
        assert!(info.date.is_some());
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].name, "comment");
    }

    #[test]
    fn test_numeric_attributes() {
        let attr = to_attribute("count", &json!(3)).unwrap();
        assert_eq!(attr.dap_type(), Some(dap_protocol::DapType::Int32));

        let attr = to_attribute("valid_range", &json!([200.0, 350.5])).unwrap();
        match attr.value {
            AttrValue::Numeric { values, shape } => {
                assert_eq!(values, Values::Float64(vec![200.0, 350.5]));
                assert_eq!(shape, vec![2]);
            }
            AttrValue::Text(_) => panic!("expected numeric"),
        }

        let attr = to_attribute("matrix", &json!([[1, 2], [3, 4]])).unwrap();
        match attr.value {
            AttrValue::Numeric { shape, .. } => assert_eq!(shape, vec![2, 2]),
            AttrValue::Text(_) => panic!("expected numeric"),
        }
    }

    #[test]
    fn test_unconvertible_attributes_skipped() {
        assert!(to_attribute("nested", &json!({"a": 1})).is_none());
        assert!(to_attribute("mixed", &json!([1, "a"])).is_none());
        assert!(to_attribute("ragged", &json!([[1, 2], [3]])).is_none());
    }
}
