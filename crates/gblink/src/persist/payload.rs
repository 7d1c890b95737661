//! Payload structures for the persistence formats.
//!
//! These structs are designed for serialization with Postcard and mirror the
//! runtime types in a compact, stable layout. The same structs back the JSON
//! document format, so both encodings round-trip through one schema.

use serde::{Deserialize, Serialize};

/// Version-tagged payload enum for forward compatibility.
///
/// New format versions add new variants rather than modifying existing ones,
/// so older readers detect unsupported versions by the enum discriminant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Payload {
    /// Version 1 payload format.
    V1(PayloadV1),
}

/// Version 1 payload structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadV1 {
    /// Model state: parameters, weights, attributes, feature info.
    pub model: ModelPayload,
    /// Trainer runtime state; present only in full checkpoints.
    pub trainer: Option<TrainerPayload>,
}

/// Learner parameters in wire form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamsPayload {
    /// Objective name (e.g. "reg:squarederror").
    pub objective: String,
    pub num_class: u32,
    pub learning_rate: f32,
    pub alpha: f32,
    pub lambda: f32,
    pub base_score: f32,
    pub seed: u64,
    pub feature_selector: String,
    /// Unrecognized parameters carried verbatim.
    pub extra: Vec<(String, String)>,
}

/// One boosted round: a `[groups, num_feature + 1]` weight-delta matrix,
/// row-major with the bias in the trailing column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationPayload {
    pub groups: u32,
    pub weights: Vec<f32>,
}

/// Model-only persistence payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPayload {
    pub params: ParamsPayload,
    pub num_feature: u32,
    pub iterations: Vec<IterationPayload>,
    /// Key-value attributes, sorted by key for deterministic output.
    pub attributes: Vec<(String, String)>,
    pub feature_names: Option<Vec<String>>,
    pub feature_types: Option<Vec<String>>,
}

/// Trainer runtime state beyond the model itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerPayload {
    /// Rounds completed in the interrupted training run.
    pub rounds_completed: u32,
    /// Feature-shuffle RNG word, if the selector has been used.
    pub rng_state: Option<u64>,
}
