//! Compressed-sparse adapters over raw pointer triples.

use super::{Adapter, AdapterError};

/// Validate a compressed offset array against its entry buffers.
fn check_offsets(
    offsets: &[usize],
    num_entries: usize,
    indices_len: usize,
) -> Result<(), AdapterError> {
    if offsets.is_empty() {
        return Err(AdapterError::BadOffsets("offset array is empty"));
    }
    if offsets[0] != 0 {
        return Err(AdapterError::BadOffsets("offset array must start at 0"));
    }
    if offsets.windows(2).any(|w| w[0] > w[1]) {
        return Err(AdapterError::BadOffsets("offsets must be non-decreasing"));
    }
    if *offsets.last().unwrap_or(&0) != num_entries {
        return Err(AdapterError::BadOffsets("last offset does not match value count"));
    }
    if indices_len != num_entries {
        return Err(AdapterError::BadOffsets("index and value buffers differ in length"));
    }
    Ok(())
}

/// Adapter over a caller-owned CSR triple (`indptr`, column `indices`,
/// `values`) with a declared column count.
#[derive(Debug, Clone, Copy)]
pub struct CsrAdapter<'a> {
    indptr: &'a [usize],
    indices: &'a [u32],
    values: &'a [f32],
    num_col: usize,
}

impl<'a> CsrAdapter<'a> {
    pub fn new(
        indptr: &'a [usize],
        indices: &'a [u32],
        values: &'a [f32],
        num_col: usize,
    ) -> Result<Self, AdapterError> {
        check_offsets(indptr, values.len(), indices.len())?;
        if let Some(&bad) = indices.iter().find(|&&c| c as usize >= num_col) {
            return Err(AdapterError::ColumnOutOfRange { index: bad, num_col });
        }
        Ok(Self { indptr, indices, values, num_col })
    }
}

impl Adapter for CsrAdapter<'_> {
    fn num_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    fn num_cols(&self) -> usize {
        self.num_col
    }

    fn visit_row(&self, row: usize, visit: &mut dyn FnMut(u32, f32)) {
        let span = self.indptr[row]..self.indptr[row + 1];
        for (&col, &value) in self.indices[span.clone()].iter().zip(&self.values[span]) {
            visit(col, value);
        }
    }
}

/// Adapter over a caller-owned CSC triple (`colptr`, row `indices`,
/// `values`) with a declared row count.
///
/// Construction transposes the entries into row-major order once, so the
/// fill pass gets the same random row access as every other variant.
#[derive(Debug, Clone)]
pub struct CscAdapter {
    /// Row-major offsets after the transpose pass.
    indptr: Vec<usize>,
    indices: Vec<u32>,
    values: Vec<f32>,
    num_col: usize,
}

impl CscAdapter {
    pub fn new(
        colptr: &[usize],
        indices: &[u32],
        values: &[f32],
        num_row: usize,
    ) -> Result<Self, AdapterError> {
        check_offsets(colptr, values.len(), indices.len())?;
        if let Some(&bad) = indices.iter().find(|&&r| r as usize >= num_row) {
            return Err(AdapterError::RowOutOfRange { index: bad, num_row });
        }
        let num_col = colptr.len() - 1;

        // Counting sort by row: count, prefix-sum, scatter.
        let mut counts = vec![0usize; num_row + 1];
        for &r in indices {
            counts[r as usize + 1] += 1;
        }
        for i in 1..counts.len() {
            counts[i] += counts[i - 1];
        }
        let indptr = counts.clone();

        let mut out_indices = vec![0u32; values.len()];
        let mut out_values = vec![0f32; values.len()];
        let mut cursor = counts;
        for col in 0..num_col {
            for k in colptr[col]..colptr[col + 1] {
                let row = indices[k] as usize;
                let at = cursor[row];
                out_indices[at] = col as u32;
                out_values[at] = values[k];
                cursor[row] += 1;
            }
        }

        Ok(Self { indptr, indices: out_indices, values: out_values, num_col })
    }
}

impl Adapter for CscAdapter {
    fn num_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    fn num_cols(&self) -> usize {
        self.num_col
    }

    fn visit_row(&self, row: usize, visit: &mut dyn FnMut(u32, f32)) {
        let span = self.indptr[row]..self.indptr[row + 1];
        for (&col, &value) in self.indices[span.clone()].iter().zip(&self.values[span]) {
            visit(col, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(adapter: &impl Adapter, row: usize) -> Vec<(u32, f32)> {
        let mut out = Vec::new();
        adapter.visit_row(row, &mut |c, v| out.push((c, v)));
        out
    }

    #[test]
    fn csr_rows() {
        // [[1, _, 2], [_, 3, _]]
        let adapter =
            CsrAdapter::new(&[0, 2, 3], &[0, 2, 1], &[1.0, 2.0, 3.0], 3).unwrap();
        assert_eq!(adapter.num_rows(), 2);
        assert_eq!(collect(&adapter, 0), vec![(0, 1.0), (2, 2.0)]);
        assert_eq!(collect(&adapter, 1), vec![(1, 3.0)]);
    }

    #[test]
    fn csr_rejects_out_of_range_column() {
        let err = CsrAdapter::new(&[0, 1], &[3], &[1.0], 3).unwrap_err();
        assert!(matches!(err, AdapterError::ColumnOutOfRange { index: 3, num_col: 3 }));
    }

    #[test]
    fn csr_rejects_bad_offsets() {
        assert!(CsrAdapter::new(&[], &[], &[], 3).is_err());
        assert!(CsrAdapter::new(&[0, 2, 1], &[0, 1], &[1.0, 2.0], 3).is_err());
        assert!(CsrAdapter::new(&[0, 1], &[0, 1], &[1.0, 2.0], 3).is_err());
    }

    #[test]
    fn csc_transposes_to_rows() {
        // Same logical matrix as the CSR test, column-major:
        // col 0: row 0 -> 1, col 1: row 1 -> 3, col 2: row 0 -> 2
        let adapter =
            CscAdapter::new(&[0, 1, 2, 3], &[0, 1, 0], &[1.0, 3.0, 2.0], 2).unwrap();
        assert_eq!(adapter.num_rows(), 2);
        assert_eq!(adapter.num_cols(), 3);
        assert_eq!(collect(&adapter, 0), vec![(0, 1.0), (2, 2.0)]);
        assert_eq!(collect(&adapter, 1), vec![(1, 3.0)]);
    }

    #[test]
    fn csc_rejects_out_of_range_row() {
        let err = CscAdapter::new(&[0, 1], &[2], &[1.0], 2).unwrap_err();
        assert!(matches!(err, AdapterError::RowOutOfRange { index: 2, num_row: 2 }));
    }
}
