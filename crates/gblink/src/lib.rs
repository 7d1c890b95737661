//! gblink: a foreign-call boundary for gradient boosting.
//!
//! The crate exposes a gradient-boosted linear learner behind the kind of
//! surface a language binding talks to: opaque handles instead of object
//! references, string-encoded parameters, JSON option documents, and
//! staged result buffers owned by the handle they were queried on.
//!
//! # Key Types
//!
//! - [`Bridge`] - The boundary surface; owns handles, config, and staging
//! - [`DatasetHandle`] / [`ModelHandle`] - Opaque never-reused ids
//! - [`Dataset`] - Materialized feature matrix with metadata fields
//! - [`Learner`] - The model object behind a [`ModelHandle`]
//! - [`BridgeError`] - The single error taxonomy crossing the boundary
//!
//! # Data Ingestion
//!
//! Six ingestion variants (dense, CSR, CSC, typed array-interface buffers,
//! batch iterators, and callback-driven proxies) all land in the same
//! canonical [`Dataset`] storage. See the [`adapter`] module.

pub mod adapter;
pub mod bridge;
pub mod config;
pub mod data;
pub mod error;
pub mod learner;
pub mod parallel;
pub mod persist;
pub mod predict;
pub mod registry;
pub mod staging;

// The boundary surface
pub use bridge::Bridge;
pub use error::BridgeError;
pub use registry::{DatasetHandle, ModelHandle};

// Data types
pub use adapter::{Batch, DataIter, ProxyFeed};
pub use data::{Dataset, DatasetError, FieldName};

// Model types
pub use learner::{Learner, LearnerError, Objective};

// Prediction options
pub use predict::{PredictKind, PredictOptions};

// Shared utilities
pub use parallel::Parallelism;
