//! Prediction modes, per-call options, and output shape calculation.

use serde_json::Value;

/// What a prediction call should produce.
///
/// The wire encoding is the integer accepted in the per-call JSON document
/// (`"type"`), kept stable for foreign callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictKind {
    /// Transformed output (e.g. probabilities).
    Value = 0,
    /// Raw, untransformed margin.
    Margin = 1,
    /// Per-feature contributions plus a trailing bias term.
    Contribution = 2,
    /// Approximate per-feature contributions.
    ApproxContribution = 3,
    /// Pairwise feature interactions.
    Interaction = 4,
    /// Approximate pairwise feature interactions.
    ApproxInteraction = 5,
    /// Index of the leaf hit in each tree.
    Leaf = 6,
}

impl PredictKind {
    /// Decode the wire integer.
    pub fn from_wire(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Value),
            1 => Some(Self::Margin),
            2 => Some(Self::Contribution),
            3 => Some(Self::ApproxContribution),
            4 => Some(Self::Interaction),
            5 => Some(Self::ApproxInteraction),
            6 => Some(Self::Leaf),
            _ => None,
        }
    }

    /// Either contribution variant.
    pub fn is_contribution(self) -> bool {
        matches!(self, Self::Contribution | Self::ApproxContribution)
    }

    /// Either interaction variant.
    pub fn is_interaction(self) -> bool {
        matches!(self, Self::Interaction | Self::ApproxInteraction)
    }
}

/// Options parsed from the per-call prediction document.
///
/// All fields default when absent. `cache_id` is reserved for future use
/// and must currently be zero.
#[derive(Debug, Clone, Copy)]
pub struct PredictOptions {
    pub kind: PredictKind,
    /// First boosting round included.
    pub iteration_begin: usize,
    /// One past the last round included; 0 means "all rounds".
    pub iteration_end: usize,
    /// Force full-rank output shape without dimension squeezing.
    pub strict_shape: bool,
    /// Prediction happens inside a training loop (e.g. DART dropout).
    pub training: bool,
}

/// Error from parsing the per-call prediction document.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PredictConfigError {
    #[error("prediction options must be a JSON object")]
    NotAnObject,
    #[error("unknown prediction type {0}")]
    UnknownKind(i64),
    #[error("option {key:?} has the wrong type")]
    WrongType { key: &'static str },
    #[error("cache_id is reserved and must be 0")]
    CacheId,
}

fn int_field(object: &Value, key: &'static str, default: i64) -> Result<i64, PredictConfigError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value.as_i64().ok_or(PredictConfigError::WrongType { key }),
    }
}

fn bool_field(object: &Value, key: &'static str) -> Result<bool, PredictConfigError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(value) => value.as_bool().ok_or(PredictConfigError::WrongType { key }),
    }
}

impl PredictOptions {
    /// Parse the per-call document, applying defaults for absent fields.
    pub fn from_document(document: &Value) -> Result<Self, PredictConfigError> {
        if !document.is_object() {
            return Err(PredictConfigError::NotAnObject);
        }
        let wire = int_field(document, "type", 0)?;
        let kind = PredictKind::from_wire(wire).ok_or(PredictConfigError::UnknownKind(wire))?;
        if int_field(document, "cache_id", 0)? != 0 {
            return Err(PredictConfigError::CacheId);
        }
        Ok(Self {
            kind,
            iteration_begin: int_field(document, "iteration_begin", 0)?.max(0) as usize,
            iteration_end: int_field(document, "iteration_end", 0)?.max(0) as usize,
            strict_shape: bool_field(document, "strict_shape")?,
            training: bool_field(document, "training")?,
        })
    }
}

/// Derive the output tensor's shape from prediction mode and counts.
///
/// `chunk` is the per-row output width (total outputs / rows), `groups`
/// the number of output groups, `rounds` the number of boosting rounds
/// included. Without `strict`, dimensions that would be 1 are squeezed
/// away; `strict` forces the full-rank shape but never changes which
/// elements are present.
pub fn calc_predict_shape(
    strict: bool,
    kind: PredictKind,
    rows: usize,
    cols: usize,
    chunk: usize,
    groups: usize,
    rounds: usize,
    shape: &mut Vec<u64>,
) {
    shape.clear();
    match kind {
        PredictKind::Value | PredictKind::Margin => {
            debug_assert!(rows == 0 || kind != PredictKind::Margin || chunk == groups);
            if chunk == 1 && !strict {
                shape.push(rows as u64);
            } else {
                shape.extend([rows as u64, groups as u64]);
            }
        }
        PredictKind::Contribution | PredictKind::ApproxContribution => {
            if groups == 1 && !strict {
                shape.extend([rows as u64, cols as u64 + 1]);
            } else {
                shape.extend([rows as u64, groups as u64, cols as u64 + 1]);
            }
        }
        PredictKind::Interaction | PredictKind::ApproxInteraction => {
            if groups == 1 && !strict {
                shape.extend([rows as u64, cols as u64 + 1, cols as u64 + 1]);
            } else {
                shape.extend([rows as u64, groups as u64, cols as u64 + 1, cols as u64 + 1]);
            }
        }
        PredictKind::Leaf => {
            if strict {
                let per_round = if rounds * groups == 0 { 0 } else { chunk / (rounds * groups) };
                shape.extend([rows as u64, rounds as u64, groups as u64, per_round as u64]);
            } else {
                shape.extend([rows as u64, chunk as u64]);
            }
        }
    }
}
