//! Dataset container and metadata fields.
//!
//! A [`Dataset`] is an immutable-after-construction tabular matrix of
//! `num_row x num_col` f32 feature values plus a [`MetaInfo`] side table of
//! named fields (labels, weights, ranking groups, feature names/types).
//!
//! # Missing Values
//!
//! Missing values are represented as `f32::NAN` in storage. Ingestion
//! adapters substitute the caller's missing-value sentinel with NaN during
//! the fill pass (see the [`adapter`](crate::adapter) module).
//!
//! # Views
//!
//! [`Dataset::slice`] produces a row-index view that shares the underlying
//! feature storage through an `Arc` rather than copying it. Slicing a
//! dataset that carries a ranking-group partition is rejected unless
//! explicitly permitted, since an arbitrary row subset does not respect
//! group boundaries.

mod dataset;
mod meta;

pub use dataset::{Dataset, DatasetError};
pub use meta::{FieldName, MetaInfo};
