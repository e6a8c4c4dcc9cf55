//! Array data sources and the dataset resolution interface.
//!
//! The protocol layer never owns dataset storage. Arrays carry an
//! [`ArraySource`] that reads a selection on demand, and a
//! [`DatasetResolver`] turns an object identifier into a data model tree.

use std::fmt;

use crate::errors::{DapError, DapResult};
use crate::model::{DatasetNode, Diagnostics};
use crate::projection::DimSlice;
use crate::values::Values;

/// Reads selections of one array.
///
/// Implementations return elements in row-major order of the selection and
/// must only touch the data needed for that selection.
pub trait ArraySource: Send + Sync + fmt::Debug {
    /// Read the elements selected by `selection`, one entry per dimension.
    fn read(&self, selection: &[DimSlice]) -> DapResult<Values>;
}

/// Maps object identifiers to datasets.
pub trait DatasetResolver: Send + Sync {
    /// Resolve `object_id` to a freshly built dataset tree.
    ///
    /// Variables that cannot be served are left out of the tree and reported
    /// in the returned diagnostics.
    fn resolve(&self, object_id: &str) -> DapResult<(DatasetNode, Diagnostics)>;
}

/// Array held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    shape: Vec<usize>,
    values: Values,
}

impl MemorySource {
    /// Wrap row-major `values` of the given shape.
    pub fn new(shape: Vec<usize>, values: Values) -> DapResult<Self> {
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(DapError::Internal(format!(
                "shape {:?} needs {} values, got {}",
                shape,
                expected,
                values.len()
            )));
        }
        Ok(Self { shape, values })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }
}

impl ArraySource for MemorySource {
    fn read(&self, selection: &[DimSlice]) -> DapResult<Values> {
        check_selection(&self.shape, selection)?;
        Ok(self.values.gather(&selection_indices(&self.shape, selection)))
    }
}

/// Verify that `selection` fits an array of `shape`.
pub fn check_selection(shape: &[usize], selection: &[DimSlice]) -> DapResult<()> {
    if selection.len() != shape.len() {
        return Err(DapError::Internal(format!(
            "selection has {} dimensions, array has {}",
            selection.len(),
            shape.len()
        )));
    }
    for (dim, (slice, &len)) in selection.iter().zip(shape).enumerate() {
        if let Some(last) = slice.last() {
            if last >= len {
                return Err(DapError::Internal(format!(
                    "selection {:?} exceeds dimension {} of size {}",
                    slice, dim, len
                )));
            }
        }
    }
    Ok(())
}

/// Flat row-major indices of every element in `selection`.
pub fn selection_indices(shape: &[usize], selection: &[DimSlice]) -> Vec<usize> {
    let total: usize = selection.iter().map(|s| s.count).product();
    let mut indices = Vec::with_capacity(total);
    if total == 0 {
        return indices;
    }

    // Row-major strides of the full array.
    let mut strides = vec![1usize; shape.len()];
    for d in (0..shape.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }

    let mut counter = vec![0usize; selection.len()];
    loop {
        indices.push(
            counter
                .iter()
                .zip(selection)
                .zip(&strides)
                .map(|((&i, s), &stride)| s.index(i) * stride)
                .sum(),
        );

        // Odometer increment, innermost dimension fastest.
        let mut d = selection.len();
        loop {
            if d == 0 {
                return indices;
            }
            d -= 1;
            counter[d] += 1;
            if counter[d] < selection[d].count {
                break;
            }
            counter[d] = 0;
        }
    }
}
