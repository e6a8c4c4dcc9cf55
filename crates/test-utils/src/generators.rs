//! Synthetic array sources.
//!
//! Values are generated on demand, so very large arrays can be declared
//! without allocating them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dap_protocol::source::{check_selection, selection_indices};
use dap_protocol::{ArraySource, DapResult, DimSlice, Values};

/// Float32 source whose element at a flat index equals that index.
///
/// Every call to `read` is counted, along with the largest number of
/// elements returned by a single read.
#[derive(Debug)]
pub struct CountingSource {
    shape: Vec<usize>,
    reads: Arc<AtomicUsize>,
    max_read: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(shape: Vec<usize>) -> Self {
        Self {
            shape,
            reads: Arc::new(AtomicUsize::new(0)),
            max_read: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of reads so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Largest element count returned by one read.
    pub fn max_read(&self) -> usize {
        self.max_read.load(Ordering::SeqCst)
    }

    /// Shared handle on the read counter.
    pub fn read_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }
}

impl ArraySource for CountingSource {
    fn read(&self, selection: &[DimSlice]) -> DapResult<Values> {
        check_selection(&self.shape, selection)?;
        let values: Vec<f32> = selection_indices(&self.shape, selection)
            .into_iter()
            .map(|i| i as f32)
            .collect();

        self.reads.fetch_add(1, Ordering::SeqCst);
        self.max_read.fetch_max(values.len(), Ordering::SeqCst);
        Ok(Values::Float32(values))
    }
}
