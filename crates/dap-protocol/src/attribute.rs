//! Variable and dataset attributes.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::dtype::DapType;
use crate::errors::{DapError, DapResult};
use crate::values::Values;

/// Attribute value: a string, a numeric scalar, or a small numeric array.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    /// Numeric values with their shape; an empty shape is a scalar.
    Numeric { values: Values, shape: Vec<usize> },
}

/// A named attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
}

impl Attribute {
    /// String attribute.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AttrValue::Text(value.into()),
        }
    }

    /// Numeric scalar attribute. `values` must hold exactly one element.
    pub fn scalar(name: impl Into<String>, values: Values) -> DapResult<Self> {
        let name = name.into();
        if values.len() != 1 {
            return Err(DapError::Internal(format!(
                "scalar attribute {} holds {} values",
                name,
                values.len()
            )));
        }
        Ok(Self {
            name,
            value: AttrValue::Numeric {
                values,
                shape: Vec::new(),
            },
        })
    }

    /// Numeric array attribute of one or two dimensions.
    pub fn array(name: impl Into<String>, values: Values, shape: Vec<usize>) -> DapResult<Self> {
        let name = name.into();
        if shape.is_empty() || shape.len() > 2 {
            return Err(DapError::Internal(format!(
                "attribute {} must be 1-D or 2-D, got {} dimensions",
                name,
                shape.len()
            )));
        }
        if shape.iter().product::<usize>() != values.len() {
            return Err(DapError::Internal(format!(
                "attribute {} shape {:?} does not match {} values",
                name,
                shape,
                values.len()
            )));
        }
        Ok(Self {
            name,
            value: AttrValue::Numeric { values, shape },
        })
    }

    /// Attributes whose name starts with `_` are for internal use and never
    /// appear in text output.
    pub fn is_visible(&self) -> bool {
        !self.name.starts_with('_')
    }

    /// DAP2 type of a numeric attribute, `None` for text or unmappable values.
    pub fn dap_type(&self) -> Option<DapType> {
        match &self.value {
            AttrValue::Text(_) => None,
            AttrValue::Numeric { values, .. } => values.dtype().dap_type(),
        }
    }
}

/// Fixed global attribute block every served dataset carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetInfo {
    /// Published metadata convention, e.g. `CF-1.6`.
    pub conventions: String,
    pub version: String,
    pub sensor: String,
    pub source: String,
    pub title: String,
    pub institution: String,
    pub history: String,
    /// URL of the human-readable description of the dataset.
    pub references: String,
    pub date: Option<DateTime<Utc>>,
}

impl DatasetInfo {
    /// The block as ordinary attributes, in rendering order.
    ///
    /// The date appears twice: as `date` (days since 1970-01-01, Float64)
    /// and as `date_iso` (ISO-8601 text).
    pub fn to_attributes(&self) -> Vec<Attribute> {
        let mut attrs = vec![
            Attribute::text("Conventions", &self.conventions),
            Attribute::text("version", &self.version),
            Attribute::text("sensor", &self.sensor),
            Attribute::text("source", &self.source),
            Attribute::text("title", &self.title),
            Attribute::text("institution", &self.institution),
            Attribute::text("history", &self.history),
            Attribute::text("references", &self.references),
        ];

        if let Some(date) = self.date {
            let days = date.timestamp_millis() as f64 / 86_400_000.0;
            attrs.push(Attribute {
                name: "date".to_string(),
                value: AttrValue::Numeric {
                    values: Values::Float64(vec![days]),
                    shape: Vec::new(),
                },
            });
            attrs.push(Attribute::text(
                "date_iso",
                date.to_rfc3339_opts(SecondsFormat::Secs, true),
            ));
        }

        attrs
    }

    /// Names of the attributes this block owns.
    pub const FIELD_NAMES: [&'static str; 10] = [
        "Conventions",
        "version",
        "sensor",
        "source",
        "title",
        "institution",
        "history",
        "references",
        "date",
        "date_iso",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_underscore_attributes_hidden() {
        assert!(!Attribute::text("_FillValue", "x").is_visible());
        assert!(Attribute::text("units", "K").is_visible());
    }

    #[test]
    fn test_scalar_requires_single_value() {
        assert!(Attribute::scalar("a", Values::Int32(vec![1])).is_ok());
        assert!(Attribute::scalar("a", Values::Int32(vec![1, 2])).is_err());
    }

    #[test]
    fn test_array_shape_checked() {
        assert!(Attribute::array("a", Values::Float32(vec![1.0; 6]), vec![2, 3]).is_ok());
        assert!(Attribute::array("a", Values::Float32(vec![1.0; 6]), vec![4]).is_err());
        assert!(Attribute::array("a", Values::Float32(vec![1.0; 8]), vec![2, 2, 2]).is_err());
    }

    #[test]
    fn test_dataset_info_date_rendered_twice() {
        let info = DatasetInfo {
            date: Some(Utc.with_ymd_and_hms(1970, 1, 3, 12, 0, 0).unwrap()),
            ..Default::default()
        };
        let attrs = info.to_attributes();
        let date = attrs.iter().find(|a| a.name == "date").unwrap();
        assert_eq!(
            date.value,
            AttrValue::Numeric {
                values: Values::Float64(vec![2.5]),
                shape: Vec::new()
            }
        );
        let iso = attrs.iter().find(|a| a.name == "date_iso").unwrap();
        assert_eq!(iso.value, AttrValue::Text("1970-01-03T12:00:00Z".to_string()));
    }

    #[test]
    fn test_dataset_info_without_date() {
        let attrs = DatasetInfo::default().to_attributes();
        assert_eq!(attrs.len(), 8);
        assert_eq!(attrs[0].name, "Conventions");
    }
}
