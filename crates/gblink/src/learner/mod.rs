//! The model object behind the boundary: parameters, attributes, boosted
//! iterations, and the train/predict operations.
//!
//! The backend is a gradient-boosted linear model: each round appends one
//! `[groups, num_feature + 1]` weight-delta matrix, so iteration-range
//! prediction is a sum of the rounds in range. Leaf-index and pairwise
//! interaction predictions need the tree backend and fail with a uniform
//! unsupported-feature error here.

mod linear;
mod params;

pub use params::{LearnerParams, Objective, SelectorKind};

use std::collections::BTreeMap;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::data::{Dataset, DatasetError, FieldName};
use crate::parallel::Parallelism;
use crate::predict::{PredictKind, PredictOptions};

/// Errors from learner configuration, training, and prediction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LearnerError {
    #[error("unknown learner parameter: {0:?}")]
    UnknownParam(String),

    #[error("cannot parse value {value:?} for parameter {name:?}")]
    InvalidParam { name: String, value: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidValue { name: &'static str, reason: &'static str },

    #[error("dataset has {got} features, model expects {expected}")]
    FeatureMismatch { expected: u32, got: usize },

    #[error("training dataset has no label field")]
    MissingLabels,

    #[error("gradient buffers hold {got} values, expected rows x groups = {expected}")]
    GradientLength { expected: usize, got: usize },

    #[error("iteration range {begin}..{end} out of bounds for {rounds} boosted rounds")]
    IterationRange { begin: usize, end: usize, rounds: usize },

    #[error("stored iterations were boosted with {stored} output groups, parameters now give {configured}")]
    GroupsChanged { stored: usize, configured: usize },

    #[error("feature info field {field:?} has length {got}, expected {expected}")]
    FeatureInfoLength { field: &'static str, expected: u32, got: usize },

    #[error("{0} is not supported by the linear backend")]
    Unsupported(&'static str),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Trainer-runtime state captured only by full checkpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TrainerState {
    /// RNG word for the shuffle feature selector; `None` until first used.
    pub rng_state: Option<u64>,
    /// Rounds completed in the current training run.
    pub rounds_completed: u32,
}

/// The mutable model object: parameter set, free-form attributes, feature
/// info, and zero or more boosted iterations.
#[derive(Debug, Clone, Default)]
pub struct Learner {
    pub(crate) params: LearnerParams,
    /// Unknown parameters retained when validation is off; round-tripped
    /// through the configuration document.
    pub(crate) extra_params: BTreeMap<String, String>,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) feature_names: Option<Vec<String>>,
    pub(crate) feature_types: Option<Vec<String>>,
    /// 0 until inferred from a dataset or a loaded model.
    pub(crate) num_feature: u32,
    pub(crate) iterations: Vec<Array2<f32>>,
    pub(crate) trainer: TrainerState,
    configured: bool,
}

impl Learner {
    /// Create a learner, inferring the feature count from the widest of
    /// the supplied datasets (zero datasets is legal; the count then
    /// resolves at first train or load).
    pub fn from_datasets<'a, I>(datasets: I) -> Self
    where
        I: IntoIterator<Item = &'a Dataset>,
    {
        let num_feature = datasets.into_iter().map(|d| d.num_col()).max().unwrap_or(0);
        Self { num_feature: num_feature as u32, ..Self::default() }
    }

    /// Apply one string-encoded parameter.
    ///
    /// With `strict` set, unknown names are fatal; otherwise they are
    /// retained verbatim and round-tripped through the configuration
    /// document. Any change re-opens parameter resolution.
    pub fn set_param(&mut self, name: &str, value: &str, strict: bool) -> Result<(), LearnerError> {
        match self.params.set(name, value) {
            Ok(()) => {
                self.configured = false;
                Ok(())
            }
            Err(LearnerError::UnknownParam(key)) if !strict => {
                self.extra_params.insert(key, value.to_owned());
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Validate and freeze parameter resolution. Idempotent; called
    /// implicitly by every operation that needs a configured learner.
    pub fn configure(&mut self) -> Result<(), LearnerError> {
        if self.configured {
            return Ok(());
        }
        self.params.validate()?;
        self.configured = true;
        Ok(())
    }

    /// Number of output groups (1 unless multi-class).
    pub fn groups(&self) -> usize {
        self.params.groups()
    }

    /// Number of input features the model is bound to (0 = unresolved).
    pub fn num_feature(&mut self) -> Result<u32, LearnerError> {
        self.configure()?;
        Ok(self.num_feature)
    }

    /// Number of boosted rounds.
    pub fn boosted_rounds(&mut self) -> Result<usize, LearnerError> {
        self.configure()?;
        Ok(self.iterations.len())
    }

    /// Stored iterations must agree with the configured group count;
    /// changing `objective` or `num_class` after boosting invalidates them.
    fn ensure_groups(&self) -> Result<(), LearnerError> {
        let configured = self.groups();
        for iteration in &self.iterations {
            if iteration.nrows() != configured {
                return Err(LearnerError::GroupsChanged {
                    stored: iteration.nrows(),
                    configured,
                });
            }
        }
        Ok(())
    }

    fn bind_features(&mut self, dataset: &Dataset) -> Result<(), LearnerError> {
        if self.num_feature == 0 {
            self.num_feature = dataset.num_col() as u32;
        } else if dataset.num_col() != self.num_feature as usize {
            return Err(LearnerError::FeatureMismatch {
                expected: self.num_feature,
                got: dataset.num_col(),
            });
        }
        Ok(())
    }

    /// Feature traversal order for one boosting round.
    fn feature_order(&mut self, round: u32) -> Vec<usize> {
        let n = self.num_feature as usize;
        let mut order: Vec<usize> = (0..n).collect();
        if self.params.feature_selector == SelectorKind::Shuffle {
            let seed = self
                .trainer
                .rng_state
                .unwrap_or(self.params.seed ^ u64::from(round));
            let mut rng = StdRng::seed_from_u64(seed);
            order.shuffle(&mut rng);
            self.trainer.rng_state = Some(rng.gen());
        }
        order
    }

    /// Append one boosting round with engine-computed gradients.
    pub fn update_one_iter(
        &mut self,
        round: u32,
        dataset: &Dataset,
        par: Parallelism,
    ) -> Result<(), LearnerError> {
        self.configure()?;
        self.ensure_groups()?;
        self.bind_features(dataset)?;
        let labels = dataset
            .float_field(FieldName::Label)?
            .ok_or(LearnerError::MissingLabels)?
            .to_vec();
        let weights = dataset.float_field(FieldName::Weight)?.map(<[f32]>::to_vec);

        let total = self.summed(0..self.iterations.len());
        let margins = linear::margin(dataset, &total, self.params.base_score, par);
        let (mut grad, hess) =
            linear::gradients(self.params.objective, &margins, &labels, weights.as_deref());

        let order = self.feature_order(round);
        let deltas = linear::boost_pass(dataset, &mut grad, &hess, &self.params, &order);
        self.iterations.push(deltas);
        self.trainer.rounds_completed += 1;
        Ok(())
    }

    /// Append one boosting round from caller-supplied gradients.
    ///
    /// `grad` and `hess` are row-major `[rows, groups]`.
    pub fn boost_one_iter(
        &mut self,
        dataset: &Dataset,
        grad: &[f32],
        hess: &[f32],
    ) -> Result<(), LearnerError> {
        self.configure()?;
        self.ensure_groups()?;
        self.bind_features(dataset)?;
        let expected = dataset.num_row() * self.groups();
        if grad.len() != expected || hess.len() != expected {
            return Err(LearnerError::GradientLength {
                expected,
                got: grad.len().max(hess.len()),
            });
        }
        let shape = (dataset.num_row(), self.groups());
        let mut grad = Array2::from_shape_vec(shape, grad.to_vec())
            .map_err(|_| LearnerError::GradientLength { expected, got: grad.len() })?;
        let hess = Array2::from_shape_vec(shape, hess.to_vec())
            .map_err(|_| LearnerError::GradientLength { expected, got: hess.len() })?;

        let order = self.feature_order(self.iterations.len() as u32);
        let deltas = linear::boost_pass(dataset, &mut grad, &hess, &self.params, &order);
        self.iterations.push(deltas);
        self.trainer.rounds_completed += 1;
        Ok(())
    }

    fn summed(&self, range: std::ops::Range<usize>) -> Array2<f32> {
        linear::summed_weights(
            &self.iterations,
            range,
            self.groups(),
            self.num_feature as usize,
        )
    }

    /// Resolve an option range against the boosted rounds (`end == 0`
    /// means "through the last round").
    fn resolve_range(&self, opts: &PredictOptions) -> Result<std::ops::Range<usize>, LearnerError> {
        let rounds = self.iterations.len();
        let end = if opts.iteration_end == 0 { rounds } else { opts.iteration_end };
        if opts.iteration_begin > end || end > rounds {
            return Err(LearnerError::IterationRange {
                begin: opts.iteration_begin,
                end,
                rounds,
            });
        }
        Ok(opts.iteration_begin..end)
    }

    /// Run prediction; returns the flat output buffer and the number of
    /// rounds covered (the shape calculation needs it).
    pub fn predict(
        &mut self,
        dataset: &Dataset,
        opts: &PredictOptions,
        par: Parallelism,
    ) -> Result<(Vec<f32>, usize), LearnerError> {
        self.configure()?;
        self.ensure_groups()?;
        if self.num_feature != 0 && dataset.num_col() != self.num_feature as usize {
            return Err(LearnerError::FeatureMismatch {
                expected: self.num_feature,
                got: dataset.num_col(),
            });
        }
        let range = self.resolve_range(opts)?;
        let rounds = range.len();
        let weights = linear::summed_weights(
            &self.iterations,
            range,
            self.groups(),
            dataset.num_col(),
        );

        let out = match opts.kind {
            PredictKind::Value | PredictKind::Margin => {
                let mut margins =
                    linear::margin(dataset, &weights, self.params.base_score, par);
                if opts.kind == PredictKind::Value {
                    linear::transform(self.params.objective, &mut margins);
                }
                margins.into_raw_vec_and_offset().0
            }
            PredictKind::Contribution | PredictKind::ApproxContribution => {
                linear::contributions(dataset, &weights, self.params.base_score)
            }
            PredictKind::Interaction | PredictKind::ApproxInteraction => {
                return Err(LearnerError::Unsupported("interaction contributions"));
            }
            PredictKind::Leaf => {
                return Err(LearnerError::Unsupported("leaf-index prediction"));
            }
        };
        Ok((out, rounds))
    }

    /// Derive a new learner holding rounds `begin..end` stepped by `step`
    /// (`end == 0` means "through the last round"). Parameters, attributes,
    /// and feature info carry over; trainer runtime state does not.
    pub fn slice(&mut self, begin: u32, end: u32, step: u32) -> Result<Learner, LearnerError> {
        self.configure()?;
        if step == 0 {
            return Err(LearnerError::InvalidValue {
                name: "step",
                reason: "must be at least 1",
            });
        }
        let rounds = self.iterations.len();
        let begin = begin as usize;
        let end = if end == 0 { rounds } else { end as usize };
        if begin >= end || end > rounds {
            return Err(LearnerError::IterationRange { begin, end, rounds });
        }
        let mut sliced = self.clone();
        sliced.iterations = self.iterations[begin..end]
            .iter()
            .step_by(step as usize)
            .cloned()
            .collect();
        sliced.trainer = TrainerState::default();
        Ok(sliced)
    }

    // ---- attributes ------------------------------------------------------

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Set an attribute; `None` deletes it.
    pub fn set_attr(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(v) => {
                self.attributes.insert(key.to_owned(), v.to_owned());
            }
            None => {
                self.attributes.remove(key);
            }
        }
    }

    pub fn attr_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    // ---- feature info ----------------------------------------------------

    /// Attach feature names or types; the field must be one of the two
    /// string fields and match the bound feature count.
    pub fn set_feature_info<S: AsRef<str>>(
        &mut self,
        field: FieldName,
        values: &[S],
    ) -> Result<(), LearnerError> {
        let slot = match field {
            FieldName::FeatureName => &mut self.feature_names,
            FieldName::FeatureType => &mut self.feature_types,
            other => {
                return Err(DatasetError::FieldType {
                    field: other.as_str(),
                    kind: "string",
                }
                .into())
            }
        };
        if self.num_feature != 0 && values.len() != self.num_feature as usize {
            return Err(LearnerError::FeatureInfoLength {
                field: field.as_str(),
                expected: self.num_feature,
                got: values.len(),
            });
        }
        *slot = Some(values.iter().map(|s| s.as_ref().to_owned()).collect());
        Ok(())
    }

    pub fn feature_info(&self, field: FieldName) -> Result<&[String], LearnerError> {
        let slot = match field {
            FieldName::FeatureName => &self.feature_names,
            FieldName::FeatureType => &self.feature_types,
            other => {
                return Err(DatasetError::FieldType {
                    field: other.as_str(),
                    kind: "string",
                }
                .into())
            }
        };
        Ok(slot.as_deref().unwrap_or(&[]))
    }

    /// Export the full learner configuration as one JSON document.
    pub fn save_config(&mut self) -> Result<serde_json::Value, LearnerError> {
        self.configure()?;
        let mut extra = serde_json::Map::new();
        for (k, v) in &self.extra_params {
            extra.insert(k.clone(), serde_json::Value::String(v.clone()));
        }
        Ok(serde_json::json!({
            "learner": {
                "objective": self.params.objective.as_str(),
                "num_class": self.params.num_class,
                "learning_rate": self.params.learning_rate,
                "alpha": self.params.alpha,
                "lambda": self.params.lambda,
                "base_score": self.params.base_score,
                "seed": self.params.seed,
                "feature_selector": self.params.feature_selector.as_str(),
                "extra": extra,
            }
        }))
    }

    /// Restore the learner configuration from a document produced by
    /// [`save_config`](Self::save_config).
    pub fn load_config(&mut self, document: &serde_json::Value) -> Result<(), LearnerError> {
        let learner = document.get("learner").and_then(|v| v.as_object()).ok_or(
            LearnerError::InvalidValue {
                name: "config",
                reason: "document has no learner object",
            },
        )?;
        for (key, value) in learner {
            if key == "extra" {
                if let Some(extras) = value.as_object() {
                    for (k, v) in extras {
                        if let Some(s) = v.as_str() {
                            self.extra_params.insert(k.clone(), s.to_owned());
                        }
                    }
                }
                continue;
            }
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            self.set_param(key, &text, false)?;
        }
        self.configure()
    }
}
