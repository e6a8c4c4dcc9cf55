//! Native element types and their DAP2 encodings.
//!
//! Every native dtype that can be served maps to one of the seven DAP2 atomic
//! types. Each DAP2 type in turn has a text format (used by the DAS renderer)
//! and a fixed big-endian width (used by the DODS encoder).
//!
//! | Native | DAP2 | Format | Width |
//! |--------|------|--------|-------|
//! | uint8, int8 | `Byte` | `%d` | 1 |
//! | int16 | `Int16` | `%d` | 2 |
//! | uint16 | `UInt16` | `%d` | 2 |
//! | int32 | `Int32` | `%d` | 4 |
//! | uint32 | `UInt32` | `%d` | 4 |
//! | float32 | `Float32` | `%g` | 4 |
//! | float64, int64, datetime64 | `Float64` | `%g` | 8 |

use std::fmt;

/// Element type of an array or attribute as stored in the source dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float16,
    Float32,
    Float64,
    /// Nanoseconds since the Unix epoch.
    DateTime64,
    Bool,
    String,
}

impl DType {
    /// The DAP2 type this dtype is served as, or `None` when the dtype has
    /// no DAP2 representation and the variable must be left out.
    pub fn dap_type(&self) -> Option<DapType> {
        match self {
            DType::UInt8 | DType::Int8 => Some(DapType::Byte),
            DType::Int16 => Some(DapType::Int16),
            DType::UInt16 => Some(DapType::UInt16),
            DType::Int32 => Some(DapType::Int32),
            DType::UInt32 => Some(DapType::UInt32),
            DType::Float32 => Some(DapType::Float32),
            DType::Float64 | DType::Int64 | DType::DateTime64 => Some(DapType::Float64),
            DType::UInt64 | DType::Float16 | DType::Bool | DType::String => None,
        }
    }

    /// Conventional lower-case name (`float32`, `datetime64[ns]`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            DType::Int8 => "int8",
            DType::UInt8 => "uint8",
            DType::Int16 => "int16",
            DType::UInt16 => "uint16",
            DType::Int32 => "int32",
            DType::UInt32 => "uint32",
            DType::Int64 => "int64",
            DType::UInt64 => "uint64",
            DType::Float16 => "float16",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::DateTime64 => "datetime64[ns]",
            DType::Bool => "bool",
            DType::String => "string",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// DAP2 atomic types used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DapType {
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl DapType {
    /// Protocol type name as it appears in DAS and DDS text.
    pub fn name(&self) -> &'static str {
        match self {
            DapType::Byte => "Byte",
            DapType::Int16 => "Int16",
            DapType::UInt16 => "UInt16",
            DapType::Int32 => "Int32",
            DapType::UInt32 => "UInt32",
            DapType::Float32 => "Float32",
            DapType::Float64 => "Float64",
        }
    }

    /// Text format used for numeric attribute values.
    pub fn format(&self) -> NumericFormat {
        match self {
            DapType::Float32 | DapType::Float64 => NumericFormat::General,
            _ => NumericFormat::Decimal,
        }
    }

    /// Encoded width of one element in bytes.
    pub fn width(&self) -> usize {
        match self {
            DapType::Byte => 1,
            DapType::Int16 | DapType::UInt16 => 2,
            DapType::Int32 | DapType::UInt32 | DapType::Float32 => 4,
            DapType::Float64 => 8,
        }
    }
}

impl fmt::Display for DapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// printf-style numeric format tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericFormat {
    /// `%d`
    Decimal,
    /// `%g`
    General,
}

impl NumericFormat {
    /// Format an integral value.
    pub fn format_int(&self, value: i64) -> String {
        match self {
            NumericFormat::Decimal => value.to_string(),
            NumericFormat::General => format_general(value as f64),
        }
    }

    /// Format a floating point value.
    pub fn format_float(&self, value: f64) -> String {
        match self {
            NumericFormat::Decimal if value.is_finite() => (value.trunc() as i64).to_string(),
            _ => format_general(value),
        }
    }
}

/// Significant digits used by `%g`.
const GENERAL_PRECISION: i32 = 6;

/// Format a value like C's `%g`: six significant digits, trailing zeros
/// removed, scientific notation when the exponent is below -4 or at least 6.
pub fn format_general(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round to the target precision first; the exponent of the rounded value
    // decides between fixed and scientific notation.
    let sci = format!("{:.*e}", (GENERAL_PRECISION - 1) as usize, value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exponent < -4 || exponent >= GENERAL_PRECISION {
        let mantissa = strip_fraction_zeros(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (GENERAL_PRECISION - 1 - exponent).max(0) as usize;
        strip_fraction_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn strip_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
