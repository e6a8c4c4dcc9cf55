//! Typed element buffers.
//!
//! A [`Values`] buffer holds elements in their native dtype. Conversion to the
//! DAP2 wire type happens only when encoding, so sources never have to know
//! about the protocol.

use bytes::{BufMut, Bytes, BytesMut};

use crate::dtype::{DType, DapType, NumericFormat};
use crate::errors::{DapError, DapResult};

/// Elements of one native dtype, in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    /// Nanoseconds since the Unix epoch.
    DateTime64(Vec<i64>),
}

/// Apply the same expression to the vector inside every variant.
macro_rules! each_variant {
    ($values:expr, $v:ident => $body:expr) => {
        match $values {
            Values::Int8($v) => $body,
            Values::UInt8($v) => $body,
            Values::Int16($v) => $body,
            Values::UInt16($v) => $body,
            Values::Int32($v) => $body,
            Values::UInt32($v) => $body,
            Values::Int64($v) => $body,
            Values::Float32($v) => $body,
            Values::Float64($v) => $body,
            Values::DateTime64($v) => $body,
        }
    };
}

/// Build a new buffer of the same variant from an expression over the vector.
macro_rules! map_variant {
    ($values:expr, $v:ident => $body:expr) => {
        match $values {
            Values::Int8($v) => Values::Int8($body),
            Values::UInt8($v) => Values::UInt8($body),
            Values::Int16($v) => Values::Int16($body),
            Values::UInt16($v) => Values::UInt16($body),
            Values::Int32($v) => Values::Int32($body),
            Values::UInt32($v) => Values::UInt32($body),
            Values::Int64($v) => Values::Int64($body),
            Values::Float32($v) => Values::Float32($body),
            Values::Float64($v) => Values::Float64($body),
            Values::DateTime64($v) => Values::DateTime64($body),
        }
    };
}

impl Values {
    /// Number of elements.
    pub fn len(&self) -> usize {
        each_variant!(self, v => v.len())
    }

    /// True when the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Native dtype of the elements.
    pub fn dtype(&self) -> DType {
        match self {
            Values::Int8(_) => DType::Int8,
            Values::UInt8(_) => DType::UInt8,
            Values::Int16(_) => DType::Int16,
            Values::UInt16(_) => DType::UInt16,
            Values::Int32(_) => DType::Int32,
            Values::UInt32(_) => DType::UInt32,
            Values::Int64(_) => DType::Int64,
            Values::Float32(_) => DType::Float32,
            Values::Float64(_) => DType::Float64,
            Values::DateTime64(_) => DType::DateTime64,
        }
    }

    /// DAP2 wire type of the elements.
    pub fn dap_type(&self) -> DapType {
        match self {
            Values::Int8(_) | Values::UInt8(_) => DapType::Byte,
            Values::Int16(_) => DapType::Int16,
            Values::UInt16(_) => DapType::UInt16,
            Values::Int32(_) => DapType::Int32,
            Values::UInt32(_) => DapType::UInt32,
            Values::Float32(_) => DapType::Float32,
            Values::Float64(_) | Values::Int64(_) | Values::DateTime64(_) => DapType::Float64,
        }
    }

    /// Pick elements by flat index, keeping the dtype.
    pub fn gather(&self, indices: &[usize]) -> Values {
        map_variant!(self, v => indices.iter().map(|&i| v[i]).collect())
    }

    /// Append the elements of `other`, which must hold the same dtype.
    pub fn append(&mut self, other: Values) -> DapResult<()> {
        match (self, other) {
            (Values::Int8(a), Values::Int8(b)) => a.extend(b),
            (Values::UInt8(a), Values::UInt8(b)) => a.extend(b),
            (Values::Int16(a), Values::Int16(b)) => a.extend(b),
            (Values::UInt16(a), Values::UInt16(b)) => a.extend(b),
            (Values::Int32(a), Values::Int32(b)) => a.extend(b),
            (Values::UInt32(a), Values::UInt32(b)) => a.extend(b),
            (Values::Int64(a), Values::Int64(b)) => a.extend(b),
            (Values::Float32(a), Values::Float32(b)) => a.extend(b),
            (Values::Float64(a), Values::Float64(b)) => a.extend(b),
            (Values::DateTime64(a), Values::DateTime64(b)) => a.extend(b),
            (a, b) => {
                return Err(DapError::Internal(format!(
                    "cannot append {} values to {} values",
                    b.dtype(),
                    a.dtype()
                )))
            }
        }
        Ok(())
    }

    /// Encode every element big-endian at the width of its DAP2 type.
    ///
    /// `Byte` values are the raw bit pattern (int8 wraps to uint8); int64 and
    /// datetime64 widen to `Float64`.
    pub fn to_be_bytes(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.len() * self.dap_type().width());
        match self {
            Values::Int8(v) => v.iter().for_each(|&x| out.put_u8(x as u8)),
            Values::UInt8(v) => out.put_slice(v),
            Values::Int16(v) => v.iter().for_each(|&x| out.put_i16(x)),
            Values::UInt16(v) => v.iter().for_each(|&x| out.put_u16(x)),
            Values::Int32(v) => v.iter().for_each(|&x| out.put_i32(x)),
            Values::UInt32(v) => v.iter().for_each(|&x| out.put_u32(x)),
            Values::Int64(v) | Values::DateTime64(v) => {
                v.iter().for_each(|&x| out.put_f64(x as f64))
            }
            Values::Float32(v) => v.iter().for_each(|&x| out.put_f32(x)),
            Values::Float64(v) => v.iter().for_each(|&x| out.put_f64(x)),
        }
        out.freeze()
    }

    /// Render every element as text using `format`.
    pub fn format_each(&self, format: NumericFormat) -> Vec<String> {
        match self {
            Values::Int8(v) => v.iter().map(|&x| format.format_int(x as i64)).collect(),
            Values::UInt8(v) => v.iter().map(|&x| format.format_int(x as i64)).collect(),
            Values::Int16(v) => v.iter().map(|&x| format.format_int(x as i64)).collect(),
            Values::UInt16(v) => v.iter().map(|&x| format.format_int(x as i64)).collect(),
            Values::Int32(v) => v.iter().map(|&x| format.format_int(x as i64)).collect(),
            Values::UInt32(v) => v.iter().map(|&x| format.format_int(x as i64)).collect(),
            Values::Int64(v) | Values::DateTime64(v) => {
                v.iter().map(|&x| format.format_float(x as f64)).collect()
            }
            Values::Float32(v) => v.iter().map(|&x| format.format_float(x as f64)).collect(),
            Values::Float64(v) => v.iter().map(|&x| format.format_float(x)).collect(),
        }
    }
}
