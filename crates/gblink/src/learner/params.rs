//! Typed learner parameters behind the string `set_param` surface.

use serde::{Deserialize, Serialize};

use super::LearnerError;

/// Training objective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// Squared-error regression.
    #[default]
    SquaredError,
    /// Binary logistic; outputs pass through a sigmoid.
    Logistic,
    /// Multi-class softmax probabilities; one output group per class.
    Softprob,
}

impl Objective {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SquaredError => "reg:squarederror",
            Self::Logistic => "binary:logistic",
            Self::Softprob => "multi:softprob",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "reg:squarederror" => Some(Self::SquaredError),
            "binary:logistic" => Some(Self::Logistic),
            "multi:softprob" => Some(Self::Softprob),
            _ => None,
        }
    }
}

/// Feature traversal order for the coordinate-descent pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorKind {
    /// Fixed 0..n order.
    #[default]
    Cyclic,
    /// Order reshuffled each round from the trainer RNG.
    Shuffle,
}

impl SelectorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cyclic => "cyclic",
            Self::Shuffle => "shuffle",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cyclic" => Some(Self::Cyclic),
            "shuffle" => Some(Self::Shuffle),
            _ => None,
        }
    }
}

/// The learner's parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerParams {
    pub objective: Objective,
    /// Number of classes; 0 or 1 means a single output group.
    pub num_class: u32,
    pub learning_rate: f32,
    /// L1 regularization on per-round weight deltas.
    pub alpha: f32,
    /// L2 regularization.
    pub lambda: f32,
    /// Global starting margin, applied to every output group.
    pub base_score: f32,
    pub seed: u64,
    pub feature_selector: SelectorKind,
}

impl Default for LearnerParams {
    fn default() -> Self {
        Self {
            objective: Objective::SquaredError,
            num_class: 0,
            learning_rate: 0.3,
            alpha: 0.0,
            lambda: 1.0,
            base_score: 0.5,
            seed: 0,
            feature_selector: SelectorKind::Cyclic,
        }
    }
}

fn parse<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, LearnerError> {
    value.parse().map_err(|_| LearnerError::InvalidParam {
        name: name.to_owned(),
        value: value.to_owned(),
    })
}

impl LearnerParams {
    /// Apply one string-encoded parameter. Unknown names are reported to
    /// the caller, which decides whether they are fatal.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), LearnerError> {
        let invalid = || LearnerError::InvalidParam {
            name: name.to_owned(),
            value: value.to_owned(),
        };
        match name {
            "objective" => self.objective = Objective::parse(value).ok_or_else(invalid)?,
            "num_class" => self.num_class = parse(name, value)?,
            "learning_rate" | "eta" => self.learning_rate = parse(name, value)?,
            "alpha" | "reg_alpha" => self.alpha = parse(name, value)?,
            "lambda" | "reg_lambda" => self.lambda = parse(name, value)?,
            "base_score" => self.base_score = parse(name, value)?,
            "seed" => self.seed = parse(name, value)?,
            "feature_selector" => {
                self.feature_selector = SelectorKind::parse(value).ok_or_else(invalid)?;
            }
            other => return Err(LearnerError::UnknownParam(other.to_owned())),
        }
        Ok(())
    }

    /// Validate the resolved parameter set.
    pub fn validate(&self) -> Result<(), LearnerError> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(LearnerError::InvalidValue {
                name: "learning_rate",
                reason: "must be a positive finite number",
            });
        }
        if self.alpha < 0.0 || self.lambda < 0.0 {
            return Err(LearnerError::InvalidValue {
                name: "alpha/lambda",
                reason: "regularization must be non-negative",
            });
        }
        match self.objective {
            Objective::Softprob if self.num_class < 2 => Err(LearnerError::InvalidValue {
                name: "num_class",
                reason: "multi:softprob requires num_class >= 2",
            }),
            Objective::SquaredError | Objective::Logistic if self.num_class > 1 => {
                Err(LearnerError::InvalidValue {
                    name: "num_class",
                    reason: "num_class > 1 requires a multi-class objective",
                })
            }
            _ => Ok(()),
        }
    }

    /// Number of output groups implied by the parameters.
    pub fn groups(&self) -> usize {
        self.num_class.max(1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_interface_with_aliases() {
        let mut params = LearnerParams::default();
        params.set("eta", "0.1").unwrap();
        assert_eq!(params.learning_rate, 0.1);
        params.set("objective", "binary:logistic").unwrap();
        assert_eq!(params.objective, Objective::Logistic);

        assert!(matches!(
            params.set("max_depth", "6"),
            Err(LearnerError::UnknownParam(_))
        ));
        assert!(matches!(
            params.set("eta", "fast"),
            Err(LearnerError::InvalidParam { .. })
        ));
    }

    #[test]
    fn validation_couples_objective_and_classes() {
        let mut params = LearnerParams::default();
        params.set("objective", "multi:softprob").unwrap();
        assert!(params.validate().is_err());
        params.set("num_class", "3").unwrap();
        params.validate().unwrap();
        assert_eq!(params.groups(), 3);

        params.set("objective", "reg:squarederror").unwrap();
        assert!(params.validate().is_err());
    }
}
