//! Ingestion adapters: one uniform pull contract over six physical layouts.
//!
//! Every adapter presents the same interface: a row/column count and a lazy
//! per-row sequence of `(column, value)` pairs. [`build_dataset`] converts
//! any adapter into the canonical [`Dataset`] representation in a single
//! parallel fill pass.
//!
//! # Variants
//!
//! - [`DenseAdapter`]: row-major `&[f32]` buffer with explicit dimensions
//! - [`CsrAdapter`]: compressed-sparse-row pointer triple
//! - [`CscAdapter`]: compressed-sparse-column pointer triple (transposed to
//!   row order at construction)
//! - [`ArrayAdapter`]: JSON array-interface descriptor over a byte buffer
//! - [`DataIter`]: pull-based external iterator yielding borrowed batches
//! - [`ProxySlot`]: proxy object re-pointed at new buffers between
//!   iterator callbacks (see [`ProxyFeed`])
//!
//! # Validation
//!
//! Structural validation (index bounds, offset monotonicity, buffer sizes)
//! happens at adapter construction, so the fill pass itself is infallible
//! and can fan out over disjoint row ranges without error plumbing.
//!
//! # Missing values
//!
//! Cells equal to the caller's missing sentinel are substituted with NaN
//! during fill; cells never visited by a sparse adapter are missing by
//! construction, since the backing storage is initialized to NaN.

mod array;
mod dense;
mod sparse;
mod stream;

pub use array::ArrayAdapter;
pub use dense::DenseAdapter;
pub use sparse::{CscAdapter, CsrAdapter};
pub use stream::{Batch, BatchAccumulator, DataIter, ProxyFeed, ProxySlot};

use ndarray::{Array2, Axis};

use crate::data::Dataset;
use crate::parallel::run_with_threads;

/// Errors from adapter construction and streaming accumulation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdapterError {
    /// Buffer length does not match the declared dimensions.
    #[error("buffer holds {got} values, dimensions require {expected}")]
    SizeMismatch { expected: usize, got: usize },

    /// A column index exceeds the declared column count.
    #[error("column index {index} out of range for {num_col} columns")]
    ColumnOutOfRange { index: u32, num_col: usize },

    /// A row index exceeds the declared row count (CSC input).
    #[error("row index {index} out of range for {num_row} rows")]
    RowOutOfRange { index: u32, num_row: usize },

    /// The compressed offset array is malformed.
    #[error("bad offset array: {0}")]
    BadOffsets(&'static str),

    /// The array-interface descriptor is malformed or unsupported.
    #[error("bad array interface: {0}")]
    ArrayInterface(String),

    /// A streamed batch disagrees with earlier batches on column count.
    #[error("batch has {got} columns, stream established {expected}")]
    BatchShape { expected: usize, got: usize },

    /// The proxy was not re-pointed at data before the callback returned.
    #[error("proxy dataset holds no batch")]
    EmptyProxy,
}

/// Uniform pull interface over one physical data encoding.
///
/// `visit_row` reports every stored `(column, value)` entry of one row.
/// Implementations validate all indices at construction, so visiting never
/// fails.
pub trait Adapter {
    /// Number of rows. Known up front for every non-streaming variant.
    fn num_rows(&self) -> usize;

    /// Declared number of feature columns.
    fn num_cols(&self) -> usize;

    /// Visit every stored entry of row `row` in column order.
    fn visit_row(&self, row: usize, visit: &mut dyn FnMut(u32, f32));
}

/// Whether `value` matches the missing-value sentinel.
///
/// NaN cells are always missing, whatever the sentinel.
#[inline]
pub(crate) fn is_missing(value: f32, missing: f32) -> bool {
    value.is_nan() || value == missing
}

/// Rows per parallel fill chunk.
const FILL_CHUNK: usize = 256;

/// Convert any adapter into the canonical dataset representation.
///
/// Allocates `num_rows x num_cols` NaN-initialized storage and fills it in
/// one pass, substituting the missing sentinel. `n_threads` follows the
/// usual semantics (0 = auto, 1 = sequential). An adapter reporting zero
/// rows yields a valid empty dataset.
pub fn build_dataset<A>(adapter: &A, missing: f32, n_threads: usize) -> Dataset
where
    A: Adapter + Sync,
{
    let num_row = adapter.num_rows();
    let num_col = adapter.num_cols();
    let mut values = Array2::from_elem((num_row, num_col), f32::NAN);

    run_with_threads(n_threads, |par| {
        par.maybe_par_bridge_for_each(
            values
                .axis_chunks_iter_mut(Axis(0), FILL_CHUNK)
                .zip((0..num_row).step_by(FILL_CHUNK)),
            |(mut chunk, start)| {
                for (offset, mut out) in chunk.axis_iter_mut(Axis(0)).enumerate() {
                    adapter.visit_row(start + offset, &mut |col, value| {
                        if !is_missing(value, missing) {
                            out[col as usize] = value;
                        }
                    });
                }
            },
        )
    });

    Dataset::from_values(values)
}
