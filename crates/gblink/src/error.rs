//! The single error type crossing the boundary.
//!
//! Every operation funnels its failures into [`BridgeError`]; callers see
//! one taxonomy regardless of which layer failed. The variants group into
//! handle errors, argument errors, configuration errors, data errors,
//! persistence errors, and unsupported-feature errors (which surface
//! through [`LearnerError::Unsupported`]).

use crate::adapter::AdapterError;
use crate::config::ConfigError;
use crate::data::DatasetError;
use crate::learner::LearnerError;
use crate::persist::{DeserializeError, SerializeError};
use crate::predict::PredictConfigError;

/// Boundary-level failure.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A null, freed, or foreign id where a live handle was required.
    #[error("invalid {0} handle")]
    BadHandle(&'static str),

    /// A structurally invalid argument outside any nested taxonomy.
    #[error("{0}")]
    BadArgument(String),

    /// The operation needs a materialized dataset but got a proxy.
    #[error("operation requires materialized data; proxy datasets only stage batches")]
    ProxyOnly,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Learner(#[from] LearnerError),

    #[error(transparent)]
    PredictConfig(#[from] PredictConfigError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Deserialize(#[from] DeserializeError),
}

/// Boundary result alias.
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
