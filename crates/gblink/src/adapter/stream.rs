//! Streaming ingestion: external iterators and the proxy re-point protocol.
//!
//! Both streaming variants deliver data in batches of unknown total row
//! count. A batch borrows caller-owned memory for exactly one step; the
//! core copies it into the [`BatchAccumulator`] before asking for the next
//! one, since the caller may overwrite its buffer between callbacks.

use ndarray::Array2;

use super::{build_dataset, Adapter, AdapterError, ArrayAdapter, DenseAdapter};
use crate::data::Dataset;

/// One dense batch of rows borrowed from the caller.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    /// Row-major values, `num_row * num_col` long.
    pub values: &'a [f32],
    pub num_row: usize,
    pub num_col: usize,
}

/// Pull-based external iterator over batches of rows.
///
/// The contract mirrors the reset/next callback pair of the foreign
/// protocol: `reset` rewinds the caller's cursor, `next` populates a
/// transient buffer and returns it, or `None` when exhausted. The returned
/// batch is only valid until the following `next` or `reset` call.
pub trait DataIter {
    fn reset(&mut self);
    fn next(&mut self) -> Option<Batch<'_>>;
}

/// A batch owned by the core after the copy step.
#[derive(Debug, Clone, Default)]
struct OwnedBatch {
    values: Vec<f32>,
    num_row: usize,
    num_col: usize,
}

/// Proxy object re-pointed at new externally owned buffers between
/// iterator callbacks.
///
/// A proxy starts empty. `set_dense` copies the described buffer at set
/// time, which is the earliest point the contract allows and keeps the
/// slot free of caller lifetimes.
#[derive(Debug, Clone, Default)]
pub struct ProxySlot {
    batch: Option<OwnedBatch>,
}

impl ProxySlot {
    /// Point the proxy at an array-interface described buffer.
    pub fn set_dense(&mut self, descriptor: &str, buf: &[u8]) -> Result<(), AdapterError> {
        let adapter = ArrayAdapter::from_interface(descriptor, buf)?;
        let (num_row, num_col) = (adapter.num_rows(), adapter.num_cols());
        let mut values = vec![f32::NAN; num_row * num_col];
        for row in 0..num_row {
            let base = row * num_col;
            adapter.visit_row(row, &mut |col, value| values[base + col as usize] = value);
        }
        self.batch = Some(OwnedBatch { values, num_row, num_col });
        Ok(())
    }

    /// Point the proxy at a plain row-major slice.
    pub fn set_dense_values(
        &mut self,
        values: &[f32],
        num_row: usize,
        num_col: usize,
    ) -> Result<(), AdapterError> {
        // Reuse the dense adapter's dimension check.
        DenseAdapter::new(values, num_row, num_col)?;
        self.batch = Some(OwnedBatch { values: values.to_vec(), num_row, num_col });
        Ok(())
    }

    /// Whether the proxy currently holds a batch.
    pub fn is_filled(&self) -> bool {
        self.batch.is_some()
    }

    fn take(&mut self) -> Option<OwnedBatch> {
        self.batch.take()
    }
}

/// External driver of the proxy protocol.
///
/// `next` re-points `proxy` at fresh data and returns `true`, or returns
/// `false` when exhausted. The proxy's previous contents are consumed
/// before each call.
pub trait ProxyFeed {
    fn reset(&mut self);
    fn next(&mut self, proxy: &mut ProxySlot) -> bool;
}

/// Accumulates streamed batches into canonical dataset storage.
///
/// The column count is established by the first batch; later batches must
/// agree. Zero batches produce a valid empty dataset.
#[derive(Debug, Default)]
pub struct BatchAccumulator {
    values: Vec<f32>,
    num_row: usize,
    num_col: Option<usize>,
}

impl BatchAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy one batch into owned storage.
    pub fn push(&mut self, batch: Batch<'_>) -> Result<(), AdapterError> {
        DenseAdapter::new(batch.values, batch.num_row, batch.num_col)?;
        match self.num_col {
            None => self.num_col = Some(batch.num_col),
            Some(expected) if expected != batch.num_col => {
                return Err(AdapterError::BatchShape { expected, got: batch.num_col });
            }
            Some(_) => {}
        }
        self.values.extend_from_slice(batch.values);
        self.num_row += batch.num_row;
        Ok(())
    }

    /// Drain an external iterator to exhaustion.
    pub fn drain_iter(&mut self, iter: &mut dyn DataIter) -> Result<(), AdapterError> {
        iter.reset();
        while let Some(batch) = iter.next() {
            self.push(batch)?;
        }
        Ok(())
    }

    /// Drive the proxy protocol to exhaustion.
    pub fn drain_proxy(
        &mut self,
        feed: &mut dyn ProxyFeed,
        proxy: &mut ProxySlot,
    ) -> Result<(), AdapterError> {
        feed.reset();
        while feed.next(proxy) {
            let owned = proxy.take().ok_or(AdapterError::EmptyProxy)?;
            self.push(Batch {
                values: &owned.values,
                num_row: owned.num_row,
                num_col: owned.num_col,
            })?;
        }
        Ok(())
    }

    /// Materialize the accumulated rows, substituting the missing sentinel.
    pub fn finish(self, missing: f32, n_threads: usize) -> Result<Dataset, AdapterError> {
        let num_col = self.num_col.unwrap_or(0);
        if num_col == 0 {
            // Zero-column batches still contribute rows.
            return Ok(Dataset::from_values(Array2::from_elem(
                (self.num_row, 0),
                f32::NAN,
            )));
        }
        let adapter = DenseAdapter::new(&self.values, self.num_row, num_col)?;
        Ok(build_dataset(&adapter, missing, n_threads))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Iterator over a fixed set of chunks, re-using one scratch buffer the
    /// way a foreign caller would.
    struct ChunkedSource {
        chunks: Vec<Vec<f32>>,
        num_col: usize,
        cursor: usize,
        scratch: Vec<f32>,
    }

    impl DataIter for ChunkedSource {
        fn reset(&mut self) {
            self.cursor = 0;
        }

        fn next(&mut self) -> Option<Batch<'_>> {
            let chunk = self.chunks.get(self.cursor)?;
            self.cursor += 1;
            // Overwrite the shared scratch buffer, as an external caller
            // overwrites its transient buffer between callbacks.
            self.scratch.clear();
            self.scratch.extend_from_slice(chunk);
            Some(Batch {
                values: &self.scratch,
                num_row: self.scratch.len() / self.num_col,
                num_col: self.num_col,
            })
        }
    }

    #[test]
    fn iter_batches_accumulate() {
        let mut source = ChunkedSource {
            chunks: vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0]],
            num_col: 2,
            cursor: 0,
            scratch: Vec::new(),
        };
        let mut acc = BatchAccumulator::new();
        acc.drain_iter(&mut source).unwrap();
        let ds = acc.finish(f32::NAN, 1).unwrap();
        assert_eq!(ds.num_row(), 3);
        assert_eq!(ds.num_col(), 2);
        assert_eq!(ds.value(2, 1), 6.0);
    }

    #[test]
    fn empty_stream_yields_empty_dataset() {
        let mut source =
            ChunkedSource { chunks: vec![], num_col: 2, cursor: 0, scratch: Vec::new() };
        let mut acc = BatchAccumulator::new();
        acc.drain_iter(&mut source).unwrap();
        let ds = acc.finish(f32::NAN, 1).unwrap();
        assert_eq!(ds.num_row(), 0);
    }

    #[test]
    fn zero_column_batches_keep_their_rows() {
        let mut acc = BatchAccumulator::new();
        acc.push(Batch { values: &[], num_row: 2, num_col: 0 }).unwrap();
        acc.push(Batch { values: &[], num_row: 3, num_col: 0 }).unwrap();
        let ds = acc.finish(f32::NAN, 1).unwrap();
        assert_eq!(ds.num_row(), 5);
        assert_eq!(ds.num_col(), 0);
    }

    #[test]
    fn column_count_mismatch_is_rejected() {
        let mut acc = BatchAccumulator::new();
        acc.push(Batch { values: &[1.0, 2.0], num_row: 1, num_col: 2 }).unwrap();
        let err = acc
            .push(Batch { values: &[1.0, 2.0, 3.0], num_row: 1, num_col: 3 })
            .unwrap_err();
        assert!(matches!(err, AdapterError::BatchShape { expected: 2, got: 3 }));
    }

    #[test]
    fn proxy_protocol_round() {
        struct Feeder {
            remaining: usize,
        }
        impl ProxyFeed for Feeder {
            fn reset(&mut self) {
                self.remaining = 2;
            }
            fn next(&mut self, proxy: &mut ProxySlot) -> bool {
                if self.remaining == 0 {
                    return false;
                }
                self.remaining -= 1;
                let values = [self.remaining as f32, 10.0];
                proxy.set_dense_values(&values, 1, 2).unwrap();
                true
            }
        }

        let mut acc = BatchAccumulator::new();
        let mut proxy = ProxySlot::default();
        acc.drain_proxy(&mut Feeder { remaining: 0 }, &mut proxy).unwrap();
        let ds = acc.finish(f32::NAN, 1).unwrap();
        assert_eq!(ds.num_row(), 2);
        assert_eq!(ds.value(0, 0), 1.0);
        assert_eq!(ds.value(1, 0), 0.0);
        assert!(!proxy.is_filled());
    }
}
