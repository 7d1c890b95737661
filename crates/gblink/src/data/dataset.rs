//! Dataset container with shared storage and row-index views.

use std::sync::Arc;

use ndarray::Array2;

use super::meta::{FieldName, MetaInfo};

/// Errors from dataset construction, field attachment, and slicing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DatasetError {
    /// The supplied field name is not one of the enumerated legal names.
    #[error("unknown field name: {0:?}")]
    UnknownField(String),

    /// A field of this name does not hold the requested value kind.
    #[error("field {field:?} does not hold {kind} values")]
    FieldType { field: &'static str, kind: &'static str },

    /// A row- or column-indexed field has the wrong length.
    #[error("field {field:?} has length {got}, expected {expected}")]
    LengthMismatch { field: &'static str, expected: usize, got: usize },

    /// Group sizes do not partition the rows exactly.
    #[error("group sizes sum to {total}, dataset has {num_row} rows")]
    GroupBoundary { total: u64, num_row: usize },

    /// A slice row index exceeds the dataset's row count.
    #[error("slice index {index} out of range for {num_row} rows")]
    RowOutOfRange { index: u32, num_row: usize },

    /// Slicing a dataset that holds a group partition without permission.
    #[error("slice does not support group structure")]
    GroupedSlice,
}

/// Immutable feature storage shared between a dataset and its views.
#[derive(Debug)]
pub(crate) struct Storage {
    /// Row-major feature values, `[num_row, num_col]`, NaN = missing.
    values: Array2<f32>,
}

/// The unit of input to training and prediction.
///
/// Feature values are owned by a [`Storage`] shared through an `Arc`; a
/// sliced dataset keeps only a row-index set into the same storage.
/// Metadata fields always describe the dataset's own (possibly sliced) row
/// count.
#[derive(Debug, Clone)]
pub struct Dataset {
    storage: Arc<Storage>,
    /// Row-index view into `storage`; `None` means the identity view.
    rows: Option<Arc<[u32]>>,
    info: MetaInfo,
}

impl Dataset {
    /// Construct a dataset owning its storage.
    pub(crate) fn from_values(values: Array2<f32>) -> Self {
        Self {
            storage: Arc::new(Storage { values }),
            rows: None,
            info: MetaInfo::default(),
        }
    }

    /// Number of rows visible through this dataset.
    pub fn num_row(&self) -> usize {
        match &self.rows {
            Some(rows) => rows.len(),
            None => self.storage.values.nrows(),
        }
    }

    /// Number of feature columns.
    pub fn num_col(&self) -> usize {
        self.storage.values.ncols()
    }

    /// Feature value at `(row, col)` through the view mapping. NaN = missing.
    #[inline]
    pub fn value(&self, row: usize, col: usize) -> f32 {
        let physical = match &self.rows {
            Some(rows) => rows[row] as usize,
            None => row,
        };
        self.storage.values[[physical, col]]
    }

    /// Metadata side table.
    pub fn info(&self) -> &MetaInfo {
        &self.info
    }

    /// Attach a row-indexed float field.
    pub fn set_float_field(&mut self, field: FieldName, values: &[f32]) -> Result<(), DatasetError> {
        self.info.set_float(field, values, self.num_row())
    }

    /// Borrow a row-indexed float field; `None` when never attached.
    pub fn float_field(&self, field: FieldName) -> Result<Option<&[f32]>, DatasetError> {
        self.info.float_field(field)
    }

    /// Attach a group partition from per-group sizes.
    pub fn set_group(&mut self, sizes: &[u32]) -> Result<(), DatasetError> {
        self.info.set_group(sizes, self.num_row())
    }

    /// The group boundary (prefix-sum) array; empty when no partition.
    pub fn group_ptr(&self) -> &[u32] {
        &self.info.group_ptr
    }

    /// Attach a column-indexed string field.
    pub fn set_str_field<S: AsRef<str>>(
        &mut self,
        field: FieldName,
        values: &[S],
    ) -> Result<(), DatasetError> {
        if values.len() != self.num_col() {
            return Err(DatasetError::LengthMismatch {
                field: field.as_str(),
                expected: self.num_col(),
                got: values.len(),
            });
        }
        let owned: Vec<String> = values.iter().map(|s| s.as_ref().to_owned()).collect();
        match field {
            FieldName::FeatureName => self.info.feature_names = Some(owned),
            FieldName::FeatureType => self.info.feature_types = Some(owned),
            other => return Err(DatasetError::FieldType { field: other.as_str(), kind: "string" }),
        }
        Ok(())
    }

    /// Borrow a column-indexed string field; empty slice when never attached.
    pub fn str_field(&self, field: FieldName) -> Result<&[String], DatasetError> {
        let slot = match field {
            FieldName::FeatureName => &self.info.feature_names,
            FieldName::FeatureType => &self.info.feature_types,
            other => return Err(DatasetError::FieldType { field: other.as_str(), kind: "string" }),
        };
        Ok(slot.as_deref().unwrap_or(&[]))
    }

    /// Build a row-index view of this dataset.
    ///
    /// The view shares feature storage and re-gathers row-indexed metadata
    /// for the selected rows. A dataset carrying a group partition cannot be
    /// sliced unless `allow_groups` is set; in that case the partition is
    /// dropped from the view, since an arbitrary row subset does not respect
    /// the original boundaries.
    pub fn slice(&self, rows: &[u32], allow_groups: bool) -> Result<Dataset, DatasetError> {
        if self.info.has_groups() && !allow_groups {
            return Err(DatasetError::GroupedSlice);
        }
        let num_row = self.num_row();
        for &r in rows {
            if r as usize >= num_row {
                return Err(DatasetError::RowOutOfRange { index: r, num_row });
            }
        }
        // Compose with an existing view so nested slices stay one hop from
        // the storage.
        let physical: Arc<[u32]> = match &self.rows {
            Some(parent) => rows.iter().map(|&r| parent[r as usize]).collect(),
            None => rows.into(),
        };

        let gather = |field: &Option<Vec<f32>>| -> Option<Vec<f32>> {
            field
                .as_ref()
                .map(|v| rows.iter().map(|&r| v[r as usize]).collect())
        };
        let info = MetaInfo {
            labels: gather(&self.info.labels),
            weights: gather(&self.info.weights),
            base_margin: gather(&self.info.base_margin),
            group_ptr: Vec::new(),
            feature_names: self.info.feature_names.clone(),
            feature_types: self.info.feature_types.clone(),
        };

        Ok(Dataset { storage: Arc::clone(&self.storage), rows: Some(physical), info })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Dataset {
        // 4 rows, 2 cols
        Dataset::from_values(array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0], [7.0, 8.0]])
    }

    #[test]
    fn counts_and_values() {
        let ds = sample();
        assert_eq!(ds.num_row(), 4);
        assert_eq!(ds.num_col(), 2);
        assert_eq!(ds.value(2, 1), 6.0);
    }

    #[test]
    fn slice_remaps_rows_and_meta() {
        let mut ds = sample();
        ds.set_float_field(FieldName::Label, &[10.0, 11.0, 12.0, 13.0]).unwrap();

        let view = ds.slice(&[3, 1], false).unwrap();
        assert_eq!(view.num_row(), 2);
        assert_eq!(view.value(0, 0), 7.0);
        assert_eq!(view.value(1, 0), 3.0);
        assert_eq!(
            view.float_field(FieldName::Label).unwrap().unwrap(),
            &[13.0, 11.0]
        );
    }

    #[test]
    fn nested_slice_composes() {
        let ds = sample();
        let v1 = ds.slice(&[3, 2, 1], false).unwrap();
        let v2 = v1.slice(&[2, 0], false).unwrap();
        assert_eq!(v2.value(0, 0), 3.0); // v1 row 2 = ds row 1
        assert_eq!(v2.value(1, 0), 7.0); // v1 row 0 = ds row 3
    }

    #[test]
    fn grouped_slice_needs_permission() {
        let mut ds = sample();
        ds.set_group(&[2, 2]).unwrap();
        assert!(matches!(ds.slice(&[0, 1], false), Err(DatasetError::GroupedSlice)));

        let view = ds.slice(&[0, 1], true).unwrap();
        assert!(!view.info().has_groups());
    }

    #[test]
    fn slice_index_out_of_range() {
        let ds = sample();
        assert!(matches!(
            ds.slice(&[4], false),
            Err(DatasetError::RowOutOfRange { index: 4, .. })
        ));
    }

    #[test]
    fn string_fields_are_column_indexed() {
        let mut ds = sample();
        ds.set_str_field(FieldName::FeatureName, &["a", "b"]).unwrap();
        assert_eq!(ds.str_field(FieldName::FeatureName).unwrap(), &["a", "b"]);
        assert!(ds.set_str_field(FieldName::FeatureName, &["a"]).is_err());
        // Unset fields read back empty, not as an error.
        assert!(ds.str_field(FieldName::FeatureType).unwrap().is_empty());
    }
}
