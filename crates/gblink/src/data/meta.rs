//! Named metadata fields attached to a dataset.

use std::str::FromStr;

use super::DatasetError;

/// Enumerated legal field names for dataset metadata.
///
/// Row-indexed numeric fields must have one value per row; `Group` is
/// group-indexed (one size per ranking group); the string fields are
/// column-indexed (one entry per feature).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldName {
    /// Training target, one f32 per row.
    Label,
    /// Sample weight, one f32 per row.
    Weight,
    /// Starting margin added to predictions, one f32 per row.
    BaseMargin,
    /// Ranking group sizes (u32), prefix-summed into a boundary array.
    Group,
    /// Per-feature display name.
    FeatureName,
    /// Per-feature type tag (e.g. "float", "int", "categorical").
    FeatureType,
}

impl FromStr for FieldName {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "label" => Ok(Self::Label),
            "weight" => Ok(Self::Weight),
            "base_margin" => Ok(Self::BaseMargin),
            "group" => Ok(Self::Group),
            "feature_name" => Ok(Self::FeatureName),
            "feature_type" => Ok(Self::FeatureType),
            other => Err(DatasetError::UnknownField(other.to_owned())),
        }
    }
}

impl FieldName {
    /// The canonical string spelling of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Weight => "weight",
            Self::BaseMargin => "base_margin",
            Self::Group => "group",
            Self::FeatureName => "feature_name",
            Self::FeatureType => "feature_type",
        }
    }
}

/// Side table of named fields attached to a [`Dataset`](super::Dataset).
///
/// Every row-indexed field's length matches `num_row`; the group boundary
/// array, when present, is a prefix sum ending at `num_row`.
#[derive(Debug, Clone, Default)]
pub struct MetaInfo {
    pub(crate) labels: Option<Vec<f32>>,
    pub(crate) weights: Option<Vec<f32>>,
    pub(crate) base_margin: Option<Vec<f32>>,
    /// Group boundaries: `group_ptr[k]..group_ptr[k+1]` is group `k`.
    /// Always starts at 0 and ends at `num_row` when non-empty.
    pub(crate) group_ptr: Vec<u32>,
    pub(crate) feature_names: Option<Vec<String>>,
    pub(crate) feature_types: Option<Vec<String>>,
}

impl MetaInfo {
    /// Whether a ranking-group partition is attached.
    pub fn has_groups(&self) -> bool {
        !self.group_ptr.is_empty()
    }

    /// Number of ranking groups (0 when no partition is attached).
    pub fn num_groups(&self) -> usize {
        self.group_ptr.len().saturating_sub(1)
    }

    /// Set a row-indexed float field, validating its length.
    pub(crate) fn set_float(
        &mut self,
        field: FieldName,
        values: &[f32],
        num_row: usize,
    ) -> Result<(), DatasetError> {
        if values.len() != num_row {
            return Err(DatasetError::LengthMismatch {
                field: field.as_str(),
                expected: num_row,
                got: values.len(),
            });
        }
        let slot = match field {
            FieldName::Label => &mut self.labels,
            FieldName::Weight => &mut self.weights,
            FieldName::BaseMargin => &mut self.base_margin,
            other => return Err(DatasetError::FieldType { field: other.as_str(), kind: "float" }),
        };
        *slot = Some(values.to_vec());
        Ok(())
    }

    /// Borrow a row-indexed float field, if set.
    pub(crate) fn float_field(&self, field: FieldName) -> Result<Option<&[f32]>, DatasetError> {
        match field {
            FieldName::Label => Ok(self.labels.as_deref()),
            FieldName::Weight => Ok(self.weights.as_deref()),
            FieldName::BaseMargin => Ok(self.base_margin.as_deref()),
            other => Err(DatasetError::FieldType { field: other.as_str(), kind: "float" }),
        }
    }

    /// Set the group partition from per-group sizes.
    ///
    /// Stores the prefix-sum boundary array. The sizes must sum to exactly
    /// `num_row`.
    pub(crate) fn set_group(&mut self, sizes: &[u32], num_row: usize) -> Result<(), DatasetError> {
        if sizes.is_empty() {
            self.group_ptr.clear();
            return Ok(());
        }
        let mut ptr = Vec::with_capacity(sizes.len() + 1);
        ptr.push(0u32);
        let mut acc = 0u64;
        for &size in sizes {
            acc += u64::from(size);
            if acc > num_row as u64 {
                return Err(DatasetError::GroupBoundary { total: acc, num_row });
            }
            ptr.push(acc as u32);
        }
        if acc != num_row as u64 {
            return Err(DatasetError::GroupBoundary { total: acc, num_row });
        }
        self.group_ptr = ptr;
        Ok(())
    }
}
