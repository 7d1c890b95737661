//! Global configuration coercion.
//!
//! The boundary accepts a schema-less JSON object and maps it onto the
//! engine's typed global parameters. Every leaf is first normalized to a
//! canonical string encoding (decimal integers, literal `true`/`false`,
//! shortest round-trippable f32 text), then validated against the
//! parameter registry. The inverse mapping decodes each parameter back to
//! its natural JSON type using an explicit kind tag, so
//! `get(set(d)) == d` holds bit-exactly for f32 leaves.
//!
//! A document naming any unknown parameter is rejected wholesale: every
//! offending key is reported in one error and no key from the document is
//! applied.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

/// Declared value kind of a registered parameter.
///
/// Dispatch on this tag replaces run-time type inspection of parameter
/// entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Float,
    Bool,
    Str,
}

impl ParamKind {
    fn name(self) -> &'static str {
        match self {
            ParamKind::Int => "integer",
            ParamKind::Float => "float",
            ParamKind::Bool => "boolean",
            ParamKind::Str => "string",
        }
    }
}

/// One registered global parameter: name, kind tag, default encoding.
struct ParamSpec {
    name: &'static str,
    kind: ParamKind,
    default: &'static str,
}

/// The engine's global parameter registry.
const GLOBAL_PARAMS: &[ParamSpec] = &[
    ParamSpec { name: "verbosity", kind: ParamKind::Int, default: "1" },
    ParamSpec { name: "nthread", kind: ParamKind::Int, default: "0" },
    ParamSpec { name: "validate_parameters", kind: ParamKind::Bool, default: "true" },
    ParamSpec { name: "default_missing", kind: ParamKind::Float, default: "NaN" },
];

/// Errors from configuration coercion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// The document's root is not a JSON object.
    #[error("configuration must be a flat JSON object")]
    NotAnObject,

    /// The document could not be parsed as JSON at all.
    #[error("malformed configuration document: {0}")]
    Malformed(String),

    /// One or more keys are not registered parameters. Aggregates every
    /// offender; nothing from the document was applied.
    #[error("unknown global parameters: {{ {} }}", .0.join(", "))]
    UnknownKeys(Vec<String>),

    /// A leaf value is not an integer, boolean, float, or string.
    #[error("parameter {key:?} has an unsupported value type")]
    UnsupportedValue { key: String },

    /// A leaf's canonical string does not parse as the declared kind.
    #[error("parameter {key:?}: cannot parse {value:?} as {kind}")]
    TypeMismatch { key: String, value: String, kind: &'static str },
}

/// Normalize one JSON leaf to its canonical string encoding.
///
/// Floats go through f32 and Rust's `Display`, which emits the shortest
/// decimal text that re-parses to the identical bit pattern. `null` stands
/// for a float NaN.
fn canonical_string(key: &str, value: &Value) -> Result<String, ConfigError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i.to_string())
            } else if let Some(f) = n.as_f64() {
                Ok(format!("{}", f as f32))
            } else {
                Err(ConfigError::UnsupportedValue { key: key.to_owned() })
            }
        }
        Value::Bool(true) => Ok("true".to_owned()),
        Value::Bool(false) => Ok("false".to_owned()),
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok("NaN".to_owned()),
        Value::Array(_) | Value::Object(_) => {
            Err(ConfigError::UnsupportedValue { key: key.to_owned() })
        }
    }
}

/// Check that a canonical string parses as the declared kind.
fn validate(key: &str, kind: ParamKind, value: &str) -> Result<(), ConfigError> {
    let ok = match kind {
        ParamKind::Int => value.parse::<i64>().is_ok(),
        ParamKind::Float => value.parse::<f32>().is_ok(),
        ParamKind::Bool => matches!(value, "true" | "false" | "1" | "0"),
        ParamKind::Str => true,
    };
    if ok {
        Ok(())
    } else {
        Err(ConfigError::TypeMismatch {
            key: key.to_owned(),
            value: value.to_owned(),
            kind: kind.name(),
        })
    }
}

/// Typed global parameters behind the coercion layer.
///
/// Values live in their canonical string encoding; typed accessors decode
/// on read. This object is owned by the bridge context rather than hiding
/// in ambient thread-local state.
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    values: BTreeMap<&'static str, String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        let values = GLOBAL_PARAMS
            .iter()
            .map(|spec| (spec.name, spec.default.to_owned()))
            .collect();
        Self { values }
    }
}

impl GlobalConfig {
    fn spec(name: &str) -> Option<&'static ParamSpec> {
        GLOBAL_PARAMS.iter().find(|spec| spec.name == name)
    }

    /// Apply a configuration document atomically.
    pub fn set(&mut self, document: &Value) -> Result<(), ConfigError> {
        let object = document.as_object().ok_or(ConfigError::NotAnObject)?;

        let unknown: Vec<String> = object
            .keys()
            .filter(|k| Self::spec(k).is_none())
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(ConfigError::UnknownKeys(unknown));
        }

        // Normalize and validate every entry before committing any.
        let mut staged: Vec<(&'static str, String)> = Vec::with_capacity(object.len());
        for (key, value) in object {
            let spec = Self::spec(key).ok_or_else(|| {
                // Unreachable after the unknown-key pass; keep the error
                // total rather than panicking.
                ConfigError::UnknownKeys(vec![key.clone()])
            })?;
            let canonical = canonical_string(key, value)?;
            validate(key, spec.kind, &canonical)?;
            staged.push((spec.name, canonical));
        }
        for (name, canonical) in staged {
            self.values.insert(name, canonical);
        }
        Ok(())
    }

    /// Parse and apply a configuration document from JSON text.
    pub fn set_str(&mut self, json: &str) -> Result<(), ConfigError> {
        let document: Value =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        self.set(&document)
    }

    /// Produce the document with every leaf at its natural JSON type.
    ///
    /// Float parameters holding NaN come back as `null`, since JSON has no
    /// NaN literal; `set` maps `null` back to NaN.
    pub fn get(&self) -> Value {
        let mut object = Map::new();
        for spec in GLOBAL_PARAMS {
            let raw = &self.values[spec.name];
            let value = match spec.kind {
                ParamKind::Int => {
                    Value::Number(Number::from(raw.parse::<i64>().unwrap_or_default()))
                }
                ParamKind::Float => {
                    let f = raw.parse::<f32>().unwrap_or(f32::NAN);
                    Number::from_f64(f64::from(f)).map_or(Value::Null, Value::Number)
                }
                ParamKind::Bool => Value::Bool(raw != "false" && raw != "0"),
                ParamKind::Str => Value::String(raw.clone()),
            };
            object.insert(spec.name.to_owned(), value);
        }
        Value::Object(object)
    }

    /// Log verbosity level.
    pub fn verbosity(&self) -> i64 {
        self.values["verbosity"].parse().unwrap_or(1)
    }

    /// Default worker count for calls that leave theirs unspecified.
    pub fn nthread(&self) -> usize {
        self.values["nthread"].parse::<i64>().unwrap_or(0).max(0) as usize
    }

    /// Whether unknown learner parameters are a hard error.
    pub fn validate_parameters(&self) -> bool {
        let raw = self.values["validate_parameters"].as_str();
        raw != "false" && raw != "0"
    }

    /// Missing sentinel applied when a per-call document omits `missing`.
    pub fn default_missing(&self) -> f32 {
        self.values["default_missing"].parse().unwrap_or(f32::NAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let config = GlobalConfig::default();
        assert_eq!(config.verbosity(), 1);
        assert_eq!(config.nthread(), 0);
        assert!(config.validate_parameters());
        assert!(config.default_missing().is_nan());
    }

    #[test]
    fn roundtrip_preserves_natural_types() {
        let mut config = GlobalConfig::default();
        config
            .set(&json!({
                "verbosity": 3,
                "validate_parameters": false,
                "default_missing": 0.25,
            }))
            .unwrap();

        let doc = config.get();
        assert_eq!(doc["verbosity"], json!(3));
        assert_eq!(doc["validate_parameters"], json!(false));
        assert_eq!(doc["default_missing"].as_f64().unwrap() as f32, 0.25f32);
    }

    #[test]
    fn float_roundtrip_is_bit_exact() {
        let mut config = GlobalConfig::default();
        for &f in &[0.1f32, 1e-7, 3.1415927, f32::MAX, f32::MIN_POSITIVE] {
            config.set(&json!({ "default_missing": f })).unwrap();
            let back = config.get()["default_missing"].as_f64().unwrap() as f32;
            assert_eq!(back.to_bits(), f.to_bits(), "{f} did not survive");
        }
    }

    #[test]
    fn nan_float_reads_back_as_null() {
        let mut config = GlobalConfig::default();
        config.set(&json!({ "default_missing": null })).unwrap();
        assert!(config.default_missing().is_nan());
        assert_eq!(config.get()["default_missing"], Value::Null);
    }

    #[test]
    fn unknown_keys_aggregate_and_nothing_applies() {
        let mut config = GlobalConfig::default();
        let err = config
            .set(&json!({ "verbosity": 2, "frobnicate": 1, "zzz": true }))
            .unwrap_err();
        match err {
            ConfigError::UnknownKeys(keys) => {
                assert_eq!(keys, vec!["frobnicate".to_owned(), "zzz".to_owned()]);
            }
            other => panic!("expected UnknownKeys, got {other:?}"),
        }
        // The known key in the rejected document must not have applied.
        assert_eq!(config.verbosity(), 1);
    }

    #[test]
    fn type_mismatch_is_reported() {
        let mut config = GlobalConfig::default();
        let err = config.set(&json!({ "verbosity": "loud" })).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
    }

    #[test]
    fn non_object_documents_are_rejected() {
        let mut config = GlobalConfig::default();
        assert!(matches!(config.set(&json!([1, 2])), Err(ConfigError::NotAnObject)));
        assert!(matches!(
            config.set(&json!({ "verbosity": {"nested": 1} })),
            Err(ConfigError::UnsupportedValue { .. })
        ));
        assert!(matches!(config.set_str("not json"), Err(ConfigError::Malformed(_))));
    }
}
