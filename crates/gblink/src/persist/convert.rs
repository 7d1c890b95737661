//! Conversion between the runtime [`Learner`] and the storage payloads.

use ndarray::Array2;

use super::native::DeserializeError;
use super::payload::{
    IterationPayload, ModelPayload, ParamsPayload, Payload, PayloadV1, TrainerPayload,
};
use crate::learner::{Learner, LearnerParams, Objective, SelectorKind};

fn params_to_payload(learner: &Learner) -> ParamsPayload {
    ParamsPayload {
        objective: learner.params.objective.as_str().to_owned(),
        num_class: learner.params.num_class,
        learning_rate: learner.params.learning_rate,
        alpha: learner.params.alpha,
        lambda: learner.params.lambda,
        base_score: learner.params.base_score,
        seed: learner.params.seed,
        feature_selector: learner.params.feature_selector.as_str().to_owned(),
        extra: learner
            .extra_params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

fn params_from_payload(payload: &ParamsPayload) -> Result<LearnerParams, DeserializeError> {
    Ok(LearnerParams {
        objective: Objective::parse(&payload.objective).ok_or_else(|| {
            DeserializeError::Document(format!("unknown objective {:?}", payload.objective))
        })?,
        num_class: payload.num_class,
        learning_rate: payload.learning_rate,
        alpha: payload.alpha,
        lambda: payload.lambda,
        base_score: payload.base_score,
        seed: payload.seed,
        feature_selector: SelectorKind::parse(&payload.feature_selector).ok_or_else(|| {
            DeserializeError::Document(format!(
                "unknown feature selector {:?}",
                payload.feature_selector
            ))
        })?,
    })
}

/// Capture a learner as a payload. `with_trainer` selects checkpoint
/// granularity.
pub fn learner_to_payload(learner: &Learner, with_trainer: bool) -> Payload {
    let model = ModelPayload {
        params: params_to_payload(learner),
        num_feature: learner.num_feature,
        iterations: learner
            .iterations
            .iter()
            .map(|deltas| IterationPayload {
                groups: deltas.nrows() as u32,
                weights: deltas.iter().copied().collect(),
            })
            .collect(),
        attributes: learner
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        feature_names: learner.feature_names.clone(),
        feature_types: learner.feature_types.clone(),
    };
    let trainer = with_trainer.then(|| TrainerPayload {
        rounds_completed: learner.trainer.rounds_completed,
        rng_state: learner.trainer.rng_state,
    });
    Payload::V1(PayloadV1 { model, trainer })
}

/// Rebuild a learner from a payload. Trainer state is restored when present
/// and zeroed otherwise.
pub fn learner_from_payload(payload: Payload) -> Result<Learner, DeserializeError> {
    let Payload::V1(v1) = payload;
    let model = v1.model;

    let mut learner = Learner::default();
    learner.params = params_from_payload(&model.params)?;
    learner.extra_params = model.params.extra.iter().cloned().collect();
    learner.num_feature = model.num_feature;
    learner.attributes = model.attributes.into_iter().collect();
    learner.feature_names = model.feature_names;
    learner.feature_types = model.feature_types;

    let cols = model.num_feature as usize + 1;
    learner.iterations = model
        .iterations
        .into_iter()
        .map(|iter| {
            let groups = iter.groups as usize;
            if iter.weights.len() != groups * cols {
                return Err(DeserializeError::Document(format!(
                    "iteration holds {} weights, expected {} x {}",
                    iter.weights.len(),
                    groups,
                    cols
                )));
            }
            Array2::from_shape_vec((groups, cols), iter.weights).map_err(|err| {
                DeserializeError::Document(format!("bad iteration shape: {err}"))
            })
        })
        .collect::<Result<_, _>>()?;

    if let Some(trainer) = v1.trainer {
        learner.trainer.rounds_completed = trainer.rounds_completed;
        learner.trainer.rng_state = trainer.rng_state;
    }
    Ok(learner)
}
