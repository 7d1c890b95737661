//! Integration tests for model persistence across both formats and both
//! granularities: restored models must predict identically, and only full
//! checkpoints restore trainer runtime state.

use approx::assert_relative_eq;
use gblink::{Bridge, DatasetHandle, ModelHandle};

fn trained_model(bridge: &mut Bridge) -> (ModelHandle, DatasetHandle) {
    let values = [0.0f32, 1.0, 1.0, 0.0, 2.0, 1.0, 3.0, 0.0];
    let data = bridge.dataset_from_dense(&values, 4, 2, "{}").unwrap();
    bridge
        .dataset_set_float_field(data, "label", &[0.0, 2.0, 4.0, 6.0])
        .unwrap();
    let model = bridge.model_create(&[data]).unwrap();
    bridge.model_set_param(model, "eta", "0.5").unwrap();
    bridge.model_set_param(model, "base_score", "0").unwrap();
    for round in 0..5 {
        bridge.model_update_one_iter(model, round, data).unwrap();
    }
    bridge.model_set_attr(model, "note", Some("fitted")).unwrap();
    bridge
        .model_set_feature_info(model, "feature_name", &["x0", "x1"])
        .unwrap();
    (model, data)
}

fn predictions(bridge: &mut Bridge, model: ModelHandle, data: DatasetHandle) -> Vec<f32> {
    bridge.model_predict(model, data, "{}").unwrap().1.to_vec()
}

fn assert_same_predictions(left: &[f32], right: &[f32]) {
    assert_eq!(left.len(), right.len());
    for (l, r) in left.iter().zip(right) {
        assert_relative_eq!(*l, *r);
    }
}

#[test]
fn file_roundtrip_binary_and_document() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = Bridge::new();
    let (model, data) = trained_model(&mut bridge);
    let expected = predictions(&mut bridge, model, data);

    for name in ["model.gblk", "model.json"] {
        let path = dir.path().join(name);
        bridge.model_save(model, &path).unwrap();

        let restored = bridge.model_load(&path).unwrap();
        assert_same_predictions(&expected, &predictions(&mut bridge, restored, data));
        assert_eq!(bridge.model_boosted_rounds(restored).unwrap(), 5);
        assert_eq!(bridge.model_attr(restored, "note").unwrap(), Some("fitted"));
        assert_eq!(
            bridge.model_feature_info(restored, "feature_name").unwrap(),
            ["x0".to_owned(), "x1".to_owned()]
        );
    }
}

#[test]
fn json_file_is_an_actual_document() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = Bridge::new();
    let (model, _) = trained_model(&mut bridge);

    let path = dir.path().join("model.json");
    bridge.model_save(model, &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let document: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(document["kind"], "model");
    assert_eq!(document["model"]["num_feature"], 2);
}

#[test]
fn buffer_roundtrip_follows_the_format_config() {
    let mut bridge = Bridge::new();
    let (model, data) = trained_model(&mut bridge);
    let expected = predictions(&mut bridge, model, data);

    let json_bytes = bridge.model_save_to_buffer(model, "{}").unwrap().to_vec();
    assert_eq!(json_bytes[0], b'{');
    let binary_bytes = bridge
        .model_save_to_buffer(model, r#"{"format": "binary"}"#)
        .unwrap()
        .to_vec();
    assert_eq!(&binary_bytes[..4], b"GBLK");

    for bytes in [json_bytes, binary_bytes] {
        let restored = bridge.model_load_from_buffer(&bytes).unwrap();
        assert_same_predictions(&expected, &predictions(&mut bridge, restored, data));
    }
}

#[test]
fn garbage_buffers_are_rejected() {
    let mut bridge = Bridge::new();
    assert!(bridge.model_load_from_buffer(b"").is_err());
    assert!(bridge.model_load_from_buffer(b"{}").is_err());
    assert!(bridge.model_load_from_buffer(b"XXXXXXXXXXXXXXXXXXXX").is_err());
    assert!(bridge.model_load_from_buffer(br#"{"kind": "model"}"#).is_err());
}

#[test]
fn checkpoint_restores_but_model_blob_does_not_unserialize() {
    let mut bridge = Bridge::new();
    let (model, data) = trained_model(&mut bridge);
    let expected = predictions(&mut bridge, model, data);

    let checkpoint = bridge.model_serialize(model).unwrap().to_vec();
    let restored = bridge.model_unserialize(&checkpoint).unwrap();
    assert_same_predictions(&expected, &predictions(&mut bridge, restored, data));
    // Resuming training from the checkpoint keeps working.
    bridge.model_update_one_iter(restored, 5, data).unwrap();
    assert_eq!(bridge.model_boosted_rounds(restored).unwrap(), 6);

    // Granularities do not mix in either direction.
    let model_blob = bridge.model_save_to_buffer(model, r#"{"format": "binary"}"#).unwrap().to_vec();
    assert!(bridge.model_unserialize(&model_blob).is_err());
    assert!(bridge.model_load_from_buffer(&checkpoint).is_err());
}

#[test]
fn corrupted_binary_blob_fails_checksum() {
    let mut bridge = Bridge::new();
    let (model, _) = trained_model(&mut bridge);
    let mut bytes = bridge
        .model_save_to_buffer(model, r#"{"format": "binary"}"#)
        .unwrap()
        .to_vec();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    assert!(bridge.model_load_from_buffer(&bytes).is_err());
}
