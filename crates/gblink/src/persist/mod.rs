//! Model persistence: a binary format and a JSON document format, at two
//! granularities.
//!
//! Model granularity captures what prediction needs; checkpoint granularity
//! additionally captures trainer runtime state so an interrupted training
//! run resumes exactly. File paths ending in `.json` select the document
//! format; anything else selects the binary format. Loading sniffs the
//! content instead of trusting the name: a buffer longer than two bytes
//! whose first non-whitespace byte is `{` is parsed as a document.

pub mod convert;
pub mod native;
pub mod payload;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use native::{
    DeserializeError, PayloadKind, SerializeError, CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR,
    MAGIC,
};

use crate::learner::Learner;
use payload::{ModelPayload, Payload, PayloadV1, TrainerPayload};

/// Requested encoding for buffer exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Document,
    Binary,
}

impl Format {
    /// Pick a format from a file path: `.json` means document.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Format::Document,
            _ => Format::Binary,
        }
    }
}

/// JSON document envelope. Shares the payload schema with the binary format.
#[derive(Debug, Serialize, Deserialize)]
struct Document {
    version: (u8, u8),
    kind: String,
    model: ModelPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    trainer: Option<TrainerPayload>,
}

fn kind_name(kind: PayloadKind) -> &'static str {
    match kind {
        PayloadKind::Model => "model",
        PayloadKind::Checkpoint => "checkpoint",
    }
}

/// True if the bytes look like a JSON document rather than a binary blob.
pub fn looks_like_document(bytes: &[u8]) -> bool {
    bytes.len() > 2
        && bytes
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|&b| b == b'{')
}

/// Export a learner to a byte buffer in the requested format.
pub fn save_to_buffer(
    learner: &Learner,
    kind: PayloadKind,
    format: Format,
) -> Result<Vec<u8>, SerializeError> {
    let with_trainer = kind == PayloadKind::Checkpoint;
    match format {
        Format::Binary => {
            let payload = convert::learner_to_payload(learner, with_trainer);
            native::encode(&payload, kind)
        }
        Format::Document => {
            let Payload::V1(v1) = convert::learner_to_payload(learner, with_trainer);
            let document = Document {
                version: (CURRENT_VERSION_MAJOR, CURRENT_VERSION_MINOR),
                kind: kind_name(kind).to_owned(),
                model: v1.model,
                trainer: v1.trainer,
            };
            Ok(serde_json::to_vec(&document)?)
        }
    }
}

/// Rebuild a learner from a buffer, sniffing the encoding.
///
/// `expected` guards against mixing granularities: loading a checkpoint blob
/// through the model path (or vice versa) is an error, matching the two
/// distinct restore operations.
pub fn load_from_buffer(
    bytes: &[u8],
    expected: PayloadKind,
) -> Result<Learner, DeserializeError> {
    let (payload, kind) = if looks_like_document(bytes) {
        let document: Document = serde_json::from_slice(bytes)
            .map_err(|err| DeserializeError::Document(err.to_string()))?;
        if document.version.0 != CURRENT_VERSION_MAJOR {
            return Err(DeserializeError::UnsupportedVersion {
                major: document.version.0,
                minor: document.version.1,
            });
        }
        let kind = match document.kind.as_str() {
            "model" => PayloadKind::Model,
            "checkpoint" => PayloadKind::Checkpoint,
            other => {
                return Err(DeserializeError::Document(format!(
                    "unknown document kind {other:?}"
                )))
            }
        };
        let payload = Payload::V1(PayloadV1 {
            model: document.model,
            trainer: document.trainer,
        });
        (payload, kind)
    } else {
        native::decode(bytes)?
    };

    if kind != expected {
        return Err(DeserializeError::WrongKind {
            expected: kind_name(expected),
            found: kind_name(kind),
        });
    }
    convert::learner_from_payload(payload)
}

/// Write a learner to a file; the extension picks the format.
pub fn save_to_file(
    learner: &Learner,
    path: &Path,
    kind: PayloadKind,
) -> Result<(), SerializeError> {
    let bytes = save_to_buffer(learner, kind, Format::for_path(path))?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Read a learner from a file, sniffing the encoding.
pub fn load_from_file(path: &Path, expected: PayloadKind) -> Result<Learner, DeserializeError> {
    let bytes = fs::read(path)?;
    load_from_buffer(&bytes, expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_picks_the_format() {
        assert_eq!(Format::for_path(Path::new("model.json")), Format::Document);
        assert_eq!(Format::for_path(Path::new("model.gblk")), Format::Binary);
        assert_eq!(Format::for_path(Path::new("model")), Format::Binary);
    }

    #[test]
    fn document_sniffing() {
        assert!(looks_like_document(b"  {\"version\": [1, 0]}"));
        assert!(!looks_like_document(b"{}"));
        assert!(!looks_like_document(&MAGIC));
    }

    #[test]
    fn buffer_roundtrip_both_formats() {
        let learner = Learner::default();
        for format in [Format::Binary, Format::Document] {
            let bytes = save_to_buffer(&learner, PayloadKind::Model, format).unwrap();
            let restored = load_from_buffer(&bytes, PayloadKind::Model).unwrap();
            assert_eq!(restored.num_feature, 0);
        }
    }

    #[test]
    fn granularities_do_not_mix() {
        let learner = Learner::default();
        let bytes = save_to_buffer(&learner, PayloadKind::Checkpoint, Format::Binary).unwrap();
        assert!(matches!(
            load_from_buffer(&bytes, PayloadKind::Model),
            Err(DeserializeError::WrongKind { .. })
        ));
    }
}
