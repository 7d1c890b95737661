//! Array-interface adapter: a JSON descriptor over a borrowed byte buffer.
//!
//! The descriptor follows the `__array_interface__` convention (`shape`,
//! `typestr`, optional `strides` in bytes, `version`). The original
//! protocol smuggles a raw pointer through the descriptor's `data` field;
//! here the buffer is an explicit borrowed argument and the `data` field is
//! ignored, so ownership stays visible in the signature.

use serde::Deserialize;

use super::{Adapter, AdapterError};

#[derive(Debug, Deserialize)]
struct Interface {
    shape: Vec<usize>,
    typestr: String,
    #[serde(default)]
    strides: Option<Vec<usize>>,
    #[serde(default)]
    version: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Elem {
    F4,
    F8,
}

impl Elem {
    fn size(self) -> usize {
        match self {
            Elem::F4 => 4,
            Elem::F8 => 8,
        }
    }
}

/// Adapter over an arbitrary strided little-endian float buffer described
/// by a JSON array-interface document.
#[derive(Debug, Clone, Copy)]
pub struct ArrayAdapter<'a> {
    buf: &'a [u8],
    num_row: usize,
    num_col: usize,
    /// Byte strides per (row, column) step.
    row_stride: usize,
    col_stride: usize,
    elem: Elem,
}

fn bad(msg: impl Into<String>) -> AdapterError {
    AdapterError::ArrayInterface(msg.into())
}

impl<'a> ArrayAdapter<'a> {
    /// Parse a descriptor and bind it to a borrowed byte buffer.
    ///
    /// Accepts 1-D (treated as a single column) and 2-D shapes, and only
    /// little-endian `f4`/`f8` typestrs.
    pub fn from_interface(descriptor: &str, buf: &'a [u8]) -> Result<Self, AdapterError> {
        let iface: Interface =
            serde_json::from_str(descriptor).map_err(|e| bad(format!("invalid JSON: {e}")))?;

        if let Some(v) = iface.version {
            if v > 3 {
                return Err(bad(format!("unsupported interface version {v}")));
            }
        }

        let elem = match iface.typestr.as_str() {
            "<f4" | "=f4" => Elem::F4,
            "<f8" | "=f8" => Elem::F8,
            other => return Err(bad(format!("unsupported typestr {other:?}"))),
        };

        let (num_row, num_col) = match iface.shape.as_slice() {
            &[n] => (n, 1),
            &[r, c] => (r, c),
            other => return Err(bad(format!("unsupported shape rank {}", other.len()))),
        };

        let (row_stride, col_stride) = match (iface.shape.len(), iface.strides.as_deref()) {
            (_, None) => (num_col * elem.size(), elem.size()),
            (1, Some(&[s0])) => (s0, elem.size()),
            (2, Some(&[s0, s1])) => (s0, s1),
            _ => return Err(bad("strides rank does not match shape rank")),
        };

        if num_row > 0 && num_col > 0 {
            let last = (num_row - 1) * row_stride + (num_col - 1) * col_stride + elem.size();
            if last > buf.len() {
                return Err(AdapterError::SizeMismatch { expected: last, got: buf.len() });
            }
        }

        Ok(Self { buf, num_row, num_col, row_stride, col_stride, elem })
    }

    #[inline]
    fn read(&self, offset: usize) -> f32 {
        match self.elem {
            Elem::F4 => {
                let bytes: [u8; 4] = self.buf[offset..offset + 4].try_into().unwrap();
                f32::from_le_bytes(bytes)
            }
            Elem::F8 => {
                let bytes: [u8; 8] = self.buf[offset..offset + 8].try_into().unwrap();
                f64::from_le_bytes(bytes) as f32
            }
        }
    }
}

impl Adapter for ArrayAdapter<'_> {
    fn num_rows(&self) -> usize {
        self.num_row
    }

    fn num_cols(&self) -> usize {
        self.num_col
    }

    fn visit_row(&self, row: usize, visit: &mut dyn FnMut(u32, f32)) {
        let base = row * self.row_stride;
        for col in 0..self.num_col {
            visit(col as u32, self.read(base + col * self.col_stride));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn contiguous_f4() {
        let buf = f32_bytes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let adapter = ArrayAdapter::from_interface(
            r#"{"shape": [2, 3], "typestr": "<f4", "version": 3}"#,
            &buf,
        )
        .unwrap();
        assert_eq!(adapter.num_rows(), 2);
        assert_eq!(adapter.num_cols(), 3);
        let mut row = Vec::new();
        adapter.visit_row(1, &mut |c, v| row.push((c, v)));
        assert_eq!(row, vec![(0, 4.0), (1, 5.0), (2, 6.0)]);
    }

    #[test]
    fn strided_view_skips_columns() {
        // 2x4 buffer viewed as 2x2 taking every other column.
        let buf = f32_bytes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let adapter = ArrayAdapter::from_interface(
            r#"{"shape": [2, 2], "typestr": "<f4", "strides": [16, 8]}"#,
            &buf,
        )
        .unwrap();
        let mut row = Vec::new();
        adapter.visit_row(0, &mut |_, v| row.push(v));
        assert_eq!(row, vec![1.0, 3.0]);
    }

    #[test]
    fn f8_values_narrow_to_f32() {
        let buf: Vec<u8> = [1.5f64, 2.5].iter().flat_map(|v| v.to_le_bytes()).collect();
        let adapter =
            ArrayAdapter::from_interface(r#"{"shape": [2], "typestr": "<f8"}"#, &buf).unwrap();
        assert_eq!(adapter.num_cols(), 1);
        let mut seen = Vec::new();
        adapter.visit_row(0, &mut |_, v| seen.push(v));
        adapter.visit_row(1, &mut |_, v| seen.push(v));
        assert_eq!(seen, vec![1.5, 2.5]);
    }

    #[test]
    fn rejects_short_buffer_and_bad_typestr() {
        let buf = f32_bytes(&[1.0]);
        assert!(ArrayAdapter::from_interface(r#"{"shape": [2, 2], "typestr": "<f4"}"#, &buf)
            .is_err());
        assert!(ArrayAdapter::from_interface(r#"{"shape": [1], "typestr": ">f4"}"#, &buf)
            .is_err());
        assert!(ArrayAdapter::from_interface(r#"{"shape": [1], "typestr": "<i4"}"#, &buf)
            .is_err());
    }
}
