//! Array source backed by a Zarr V3 array.
//!
//! A selection is read through `ArraySubset` bounding boxes, so only the
//! chunks intersecting a box are fetched and decoded. Strided dimensions are
//! split into one box per selected index.

use std::fmt;

use dap_protocol::source::check_selection;
use dap_protocol::{ArraySource, DType, DapResult, DimSlice, Values};
use zarrs::array::Array;
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use crate::error::StoreError;

/// Reads selections of one Zarr array.
pub struct ZarrArraySource {
    array: Array<FilesystemStore>,
    path: String,
    dtype: DType,
    shape: Vec<usize>,
}

impl ZarrArraySource {
    pub fn new(array: Array<FilesystemStore>, path: impl Into<String>, dtype: DType) -> Self {
        let shape = array.shape().iter().map(|&n| n as usize).collect();
        Self {
            array,
            path: path.into(),
            dtype,
            shape,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn retrieve(&self, subset: &ArraySubset) -> Result<Values, StoreError> {
        let read_err = |e: zarrs::array::ArrayError| {
            StoreError::read_failed(format!("{}: {}", self.path, e))
        };

        let values = match self.dtype {
            DType::Int8 => Values::Int8(
                self.array
                    .retrieve_array_subset_elements::<i8>(subset)
                    .map_err(read_err)?,
            ),
            DType::UInt8 => Values::UInt8(
                self.array
                    .retrieve_array_subset_elements::<u8>(subset)
                    .map_err(read_err)?,
            ),
            DType::Int16 => Values::Int16(
                self.array
                    .retrieve_array_subset_elements::<i16>(subset)
                    .map_err(read_err)?,
            ),
            DType::UInt16 => Values::UInt16(
                self.array
                    .retrieve_array_subset_elements::<u16>(subset)
                    .map_err(read_err)?,
            ),
            DType::Int32 => Values::Int32(
                self.array
                    .retrieve_array_subset_elements::<i32>(subset)
                    .map_err(read_err)?,
            ),
            DType::UInt32 => Values::UInt32(
                self.array
                    .retrieve_array_subset_elements::<u32>(subset)
                    .map_err(read_err)?,
            ),
            DType::Int64 => Values::Int64(
                self.array
                    .retrieve_array_subset_elements::<i64>(subset)
                    .map_err(read_err)?,
            ),
            DType::Float32 => Values::Float32(
                self.array
                    .retrieve_array_subset_elements::<f32>(subset)
                    .map_err(read_err)?,
            ),
            DType::Float64 => Values::Float64(
                self.array
                    .retrieve_array_subset_elements::<f64>(subset)
                    .map_err(read_err)?,
            ),
            other => {
                return Err(StoreError::read_failed(format!(
                    "{}: cannot read {} data",
                    self.path, other
                )))
            }
        };
        Ok(values)
    }
}

impl fmt::Debug for ZarrArraySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZarrArraySource")
            .field("path", &self.path)
            .field("dtype", &self.dtype)
            .field("shape", &self.shape)
            .finish()
    }
}

impl ZarrArraySource {
    /// Read a selection whose strided dimensions select at most one index
    /// each, as a single bounding box.
    fn read_box(&self, selection: &[DimSlice]) -> DapResult<Values> {
        let start: Vec<u64> = selection.iter().map(|s| s.start as u64).collect();
        let extent: Vec<u64> = selection
            .iter()
            .map(|s| s.last().map_or(0, |last| (last + 1 - s.start) as u64))
            .collect();

        let subset = ArraySubset::new_with_start_shape(start, extent)
            .map_err(|e| StoreError::read_failed(format!("{}: {}", self.path, e)))?;

        tracing::trace!("Reading {} box {:?}", self.path, subset);
        Ok(self.retrieve(&subset)?)
    }

    /// Split the selection on its outermost strided dimension and read each
    /// selected index on its own, so chunks between stride steps are never
    /// fetched.
    fn read_strided(&self, selection: &[DimSlice]) -> DapResult<Values> {
        let Some(dim) = selection.iter().position(|s| s.stride > 1 && s.count > 1) else {
            return self.read_box(selection);
        };

        let slice = selection[dim];
        let outer: usize = selection[..dim].iter().map(|s| s.count).product();
        let inner: usize = selection[dim + 1..].iter().map(|s| s.count).product();

        let mut sub = selection.to_vec();
        let mut joined: Option<Values> = None;
        for i in 0..slice.count {
            sub[dim] = DimSlice {
                start: slice.index(i),
                stride: 1,
                count: 1,
            };
            let part = self.read_strided(&sub)?;
            match joined.as_mut() {
                Some(values) => values.append(part)?,
                None => joined = Some(part),
            }
        }
        let joined = joined.ok_or_else(|| {
            StoreError::read_failed(format!("{}: empty strided selection", self.path))
        })?;

        if outer == 1 {
            return Ok(joined);
        }

        // Parts are laid out index by index; interleave them back into
        // row-major order of the selection.
        let part_len = outer * inner;
        let mut indices = Vec::with_capacity(joined.len());
        for o in 0..outer {
            for i in 0..slice.count {
                let base = i * part_len + o * inner;
                indices.extend(base..base + inner);
            }
        }
        Ok(joined.gather(&indices))
    }
}

impl ArraySource for ZarrArraySource {
    fn read(&self, selection: &[DimSlice]) -> DapResult<Values> {
        check_selection(&self.shape, selection)?;
        self.read_strided(selection)
    }
}
