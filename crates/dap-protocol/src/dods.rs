//! DODS binary payload encoding.
//!
//! Every array is sent as an 8-byte header (the element count as a big-endian
//! u32, written twice) followed by its elements, big-endian, at the width of
//! the array's DAP2 type. Structures and sequences are the concatenation of
//! their children.
//!
//! [`DodsChunks`] produces the payload lazily, one chunk per call to `next`.
//! Multi-dimensional arrays are read one outer index at a time, so at most
//! one innermost slab is held in memory regardless of the array size.

use bytes::{BufMut, Bytes, BytesMut};

use crate::errors::{DapError, DapResult};
use crate::model::{ArrayNode, DatasetNode};
use crate::projection::DimSlice;

/// Separator between the DDS text and the binary payload of a `.dods` response.
pub const DATA_MARKER: &str = "\nData:\n";

/// Lazy, single-pass sequence of payload chunks for a dataset.
#[derive(Debug)]
pub struct DodsChunks {
    arrays: std::vec::IntoIter<ArrayNode>,
    current: Option<ArrayChunks>,
    failed: bool,
}

impl DodsChunks {
    /// Prepare the payload of `dataset`, which should already be projected.
    pub fn new(dataset: &DatasetNode) -> Self {
        let arrays: Vec<ArrayNode> = dataset.arrays().into_iter().cloned().collect();
        Self {
            arrays: arrays.into_iter(),
            current: None,
            failed: false,
        }
    }

    /// Drain the whole payload into one buffer.
    pub fn collect_bytes(self) -> DapResult<Vec<u8>> {
        let mut out = Vec::new();
        for chunk in self {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }
}

impl Iterator for DodsChunks {
    type Item = DapResult<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if self.current.is_none() {
                self.current = Some(ArrayChunks::new(self.arrays.next()?));
            }
            let current = self.current.as_mut()?;

            match current.next_chunk() {
                Some(Ok(chunk)) => return Some(Ok(chunk)),
                Some(Err(e)) => {
                    self.failed = true;
                    return Some(Err(e));
                }
                None => self.current = None,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Header,
    /// Whole selection in one chunk.
    Whole,
    /// One chunk per selected outer index. `next` walks every source index
    /// from the first to the last selected one.
    Rows { next: usize, last: usize },
    Done,
}

/// Chunk producer for one array.
#[derive(Debug)]
struct ArrayChunks {
    array: ArrayNode,
    selection: Vec<DimSlice>,
    stage: Stage,
    body: Stage,
}

impl ArrayChunks {
    fn new(array: ArrayNode) -> Self {
        let selection = array.selection().to_vec();
        let shape = array.effective_shape();
        // An unaddressable count fails in `header`, so nothing follows it.
        let count = array.effective_len().unwrap_or(0);

        let body = if count == 0 {
            Stage::Done
        } else if shape.len() <= 1 {
            Stage::Whole
        } else if shape[1..].contains(&1) {
            tracing::debug!(
                "{}: degenerate axis in {:?}, sending as one chunk",
                array.name(),
                shape
            );
            Stage::Whole
        } else if shape[0] <= 1 {
            Stage::Whole
        } else {
            let outer = selection[0];
            Stage::Rows {
                next: outer.start,
                last: outer.last().unwrap_or(outer.start),
            }
        };

        Self {
            array,
            selection,
            stage: Stage::Header,
            body,
        }
    }

    fn next_chunk(&mut self) -> Option<DapResult<Bytes>> {
        match self.stage {
            Stage::Header => {
                self.stage = self.body;
                Some(self.header())
            }
            Stage::Whole => {
                self.stage = Stage::Done;
                Some(self.read(&self.selection))
            }
            Stage::Rows { next, last } => {
                let outer = self.selection[0];
                let mut index = next;
                while index <= last {
                    let current = index;
                    index += 1;
                    // Indices between stride boundaries are walked but never read.
                    if (current - outer.start) % outer.stride != 0 {
                        continue;
                    }
                    self.stage = Stage::Rows { next: index, last };
                    let mut row = self.selection.clone();
                    row[0] = DimSlice {
                        start: current,
                        stride: 1,
                        count: 1,
                    };
                    return Some(self.read(&row));
                }
                self.stage = Stage::Done;
                None
            }
            Stage::Done => None,
        }
    }

    fn header(&self) -> DapResult<Bytes> {
        let len = self.array.effective_len()?;
        let count = u32::try_from(len).map_err(|_| {
            DapError::invalid_request(format!(
                "{} selects {} elements, more than a DODS response can carry",
                self.array.name(),
                len
            ))
        })?;
        let mut header = BytesMut::with_capacity(8);
        header.put_u32(count);
        header.put_u32(count);
        Ok(header.freeze())
    }

    fn read(&self, selection: &[DimSlice]) -> DapResult<Bytes> {
        let source = self.array.source().ok_or_else(|| {
            DapError::data_access(format!("{} has no data source", self.array.name()))
        })?;

        let expected: usize = selection.iter().map(|s| s.count).product();
        let values = source.read(selection)?;

        if values.len() != expected {
            return Err(DapError::data_access(format!(
                "{}: source returned {} elements, expected {}",
                self.array.name(),
                values.len(),
                expected
            )));
        }
        if values.dap_type() != self.array.dap_type() {
            return Err(DapError::data_access(format!(
                "{}: source returned {} data for a {} array",
                self.array.name(),
                values.dtype(),
                self.array.dtype()
            )));
        }

        Ok(values.to_be_bytes())
    }
}
