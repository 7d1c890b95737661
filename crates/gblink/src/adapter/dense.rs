//! Dense row-major buffer adapter.

use super::{Adapter, AdapterError};

/// Adapter over a caller-owned dense row-major f32 buffer.
#[derive(Debug, Clone, Copy)]
pub struct DenseAdapter<'a> {
    values: &'a [f32],
    num_row: usize,
    num_col: usize,
}

impl<'a> DenseAdapter<'a> {
    /// Wrap a row-major buffer with explicit dimensions.
    pub fn new(values: &'a [f32], num_row: usize, num_col: usize) -> Result<Self, AdapterError> {
        let expected = num_row
            .checked_mul(num_col)
            .ok_or(AdapterError::SizeMismatch { expected: usize::MAX, got: values.len() })?;
        if values.len() != expected {
            return Err(AdapterError::SizeMismatch { expected, got: values.len() });
        }
        Ok(Self { values, num_row, num_col })
    }
}

impl Adapter for DenseAdapter<'_> {
    fn num_rows(&self) -> usize {
        self.num_row
    }

    fn num_cols(&self) -> usize {
        self.num_col
    }

    fn visit_row(&self, row: usize, visit: &mut dyn FnMut(u32, f32)) {
        let start = row * self.num_col;
        for (col, &value) in self.values[start..start + self.num_col].iter().enumerate() {
            visit(col as u32, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_buffer_length() {
        assert!(matches!(
            DenseAdapter::new(&[1.0, 2.0, 3.0], 2, 2),
            Err(AdapterError::SizeMismatch { expected: 4, got: 3 })
        ));
    }

    #[test]
    fn visits_every_cell_in_order() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let adapter = DenseAdapter::new(&data, 2, 3).unwrap();
        let mut seen = Vec::new();
        adapter.visit_row(1, &mut |c, v| seen.push((c, v)));
        assert_eq!(seen, vec![(0, 4.0), (1, 5.0), (2, 6.0)]);
    }
}
