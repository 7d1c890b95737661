//! The boundary surface: every operation a foreign caller reaches.
//!
//! A [`Bridge`] owns the handle registries, the global configuration, and a
//! staging area for global query results. Handles are opaque ids; each live
//! handle carries its own staging buffers, so results queried on one handle
//! stay valid while another handle is queried. Operations take `&mut self`:
//! the surface is single-threaded by construction, the same way the
//! underlying objects are not thread-safe.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::adapter::{
    self, ArrayAdapter, BatchAccumulator, CscAdapter, CsrAdapter, DataIter, DenseAdapter,
    ProxyFeed,
};
use crate::config::{ConfigError, GlobalConfig};
use crate::data::{Dataset, FieldName};
use crate::error::BridgeError;
use crate::learner::Learner;
use crate::parallel::run_with_threads;
use crate::persist::{self, Format, PayloadKind};
use crate::predict::{calc_predict_shape, PredictOptions};
use crate::registry::{
    DatasetEntry, DatasetHandle, DatasetState, ModelEntry, ModelHandle, Registry,
};
use crate::staging::ReturnBuffers;

type Result<T> = std::result::Result<T, BridgeError>;

/// Ingestion knobs shared by every dataset constructor.
struct IngestConfig {
    missing: f32,
    n_threads: usize,
}

/// Root object behind the boundary.
#[derive(Default)]
pub struct Bridge {
    datasets: Registry<DatasetEntry>,
    models: Registry<ModelEntry>,
    global: GlobalConfig,
    /// Staging for results not tied to any handle.
    buffers: ReturnBuffers,
}

impl Bridge {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- global configuration -------------------------------------------

    /// Apply a global configuration document. Rejection is atomic: if any
    /// key is unknown or any value malformed, nothing changes.
    pub fn set_global_config(&mut self, json: &str) -> Result<()> {
        self.global.set_str(json)?;
        Ok(())
    }

    /// Render the effective global configuration as a JSON string.
    pub fn get_global_config(&mut self) -> Result<&str> {
        let document = self.global.get();
        let text = serde_json::to_string(&document)
            .map_err(|err| ConfigError::Malformed(err.to_string()))?;
        Ok(self.buffers.stage_str(text))
    }

    /// Parse the per-ingest `{"missing": ..., "nthread": ...}` document.
    /// Absent keys fall back to the global defaults; JSON `null` for
    /// `missing` means NaN.
    fn ingest_config(&self, json: &str) -> Result<IngestConfig> {
        let document: Value = serde_json::from_str(json)
            .map_err(|err| ConfigError::Malformed(err.to_string()))?;
        let object = document.as_object().ok_or(ConfigError::NotAnObject)?;

        let missing = match object.get("missing") {
            None | Some(Value::Null) => self.global.default_missing(),
            Some(value) => value.as_f64().map(|v| v as f32).ok_or_else(|| {
                BridgeError::BadArgument(format!("missing must be a number, got {value}"))
            })?,
        };
        let n_threads = match object.get("nthread") {
            None | Some(Value::Null) => self.global.nthread(),
            Some(value) => value
                .as_i64()
                .filter(|&v| v >= 0)
                .map(|v| v as usize)
                .ok_or_else(|| {
                    BridgeError::BadArgument(format!(
                        "nthread must be a non-negative integer, got {value}"
                    ))
                })?,
        };
        Ok(IngestConfig { missing, n_threads })
    }

    /// Read an optional `missing` sentinel out of a config document,
    /// falling back to the global default. JSON `null` means NaN.
    fn missing_value(&self, document: &Value) -> Result<f32> {
        match document.get("missing") {
            None | Some(Value::Null) => Ok(self.global.default_missing()),
            Some(value) => value.as_f64().map(|v| v as f32).ok_or_else(|| {
                BridgeError::BadArgument(format!("missing must be a number, got {value}"))
            }),
        }
    }

    // ---- dataset handles -------------------------------------------------

    fn insert_dataset(&mut self, dataset: Dataset) -> DatasetHandle {
        DatasetHandle(self.datasets.insert(DatasetEntry::ready(Arc::new(dataset))))
    }

    fn dataset_entry(&self, handle: DatasetHandle) -> Result<&DatasetEntry> {
        self.datasets
            .get(handle.0)
            .ok_or(BridgeError::BadHandle("dataset"))
    }

    fn dataset_entry_mut(&mut self, handle: DatasetHandle) -> Result<&mut DatasetEntry> {
        self.datasets
            .get_mut(handle.0)
            .ok_or(BridgeError::BadHandle("dataset"))
    }

    /// Materialized data behind a handle; proxies are rejected.
    fn require_dataset(&self, handle: DatasetHandle) -> Result<Arc<Dataset>> {
        match &self.dataset_entry(handle)?.state {
            DatasetState::Ready(dataset) => Ok(Arc::clone(dataset)),
            DatasetState::Proxy(_) => Err(BridgeError::ProxyOnly),
        }
    }

    /// Ingest a dense row-major buffer.
    pub fn dataset_from_dense(
        &mut self,
        values: &[f32],
        num_row: usize,
        num_col: usize,
        config: &str,
    ) -> Result<DatasetHandle> {
        let cfg = self.ingest_config(config)?;
        let adapter = DenseAdapter::new(values, num_row, num_col)?;
        let dataset = adapter::build_dataset(&adapter, cfg.missing, cfg.n_threads);
        Ok(self.insert_dataset(dataset))
    }

    /// Ingest a CSR triple.
    pub fn dataset_from_csr(
        &mut self,
        indptr: &[usize],
        indices: &[u32],
        values: &[f32],
        num_col: usize,
        config: &str,
    ) -> Result<DatasetHandle> {
        let cfg = self.ingest_config(config)?;
        let adapter = CsrAdapter::new(indptr, indices, values, num_col)?;
        let dataset = adapter::build_dataset(&adapter, cfg.missing, cfg.n_threads);
        Ok(self.insert_dataset(dataset))
    }

    /// Ingest a CSC triple.
    pub fn dataset_from_csc(
        &mut self,
        colptr: &[usize],
        indices: &[u32],
        values: &[f32],
        num_row: usize,
        config: &str,
    ) -> Result<DatasetHandle> {
        let cfg = self.ingest_config(config)?;
        let adapter = CscAdapter::new(colptr, indices, values, num_row)?;
        let dataset = adapter::build_dataset(&adapter, cfg.missing, cfg.n_threads);
        Ok(self.insert_dataset(dataset))
    }

    /// Ingest a typed buffer described by an array-interface document.
    pub fn dataset_from_array(
        &mut self,
        descriptor: &str,
        buf: &[u8],
        config: &str,
    ) -> Result<DatasetHandle> {
        let cfg = self.ingest_config(config)?;
        let adapter = ArrayAdapter::from_interface(descriptor, buf)?;
        let dataset = adapter::build_dataset(&adapter, cfg.missing, cfg.n_threads);
        Ok(self.insert_dataset(dataset))
    }

    /// Ingest a batch stream, driving the iterator to exhaustion.
    pub fn dataset_from_iter(
        &mut self,
        iter: &mut dyn DataIter,
        config: &str,
    ) -> Result<DatasetHandle> {
        let cfg = self.ingest_config(config)?;
        let mut accumulator = BatchAccumulator::new();
        accumulator.drain_iter(iter)?;
        let dataset = accumulator.finish(cfg.missing, cfg.n_threads)?;
        Ok(self.insert_dataset(dataset))
    }

    /// Create an empty proxy for callback-driven streaming.
    pub fn proxy_create(&mut self) -> DatasetHandle {
        DatasetHandle(self.datasets.insert(DatasetEntry::proxy()))
    }

    /// Stage one dense batch on a proxy, replacing any previous batch.
    pub fn proxy_set_dense(
        &mut self,
        handle: DatasetHandle,
        descriptor: &str,
        buf: &[u8],
    ) -> Result<()> {
        match &mut self.dataset_entry_mut(handle)?.state {
            DatasetState::Proxy(slot) => {
                slot.set_dense(descriptor, buf)?;
                Ok(())
            }
            DatasetState::Ready(_) => {
                Err(BridgeError::BadArgument("handle is not a proxy".to_owned()))
            }
        }
    }

    /// Materialize a dataset by driving the proxy feed protocol: the feed
    /// stages batches on the proxy handle until it reports exhaustion.
    pub fn dataset_from_proxy(
        &mut self,
        feed: &mut dyn ProxyFeed,
        proxy: DatasetHandle,
        config: &str,
    ) -> Result<DatasetHandle> {
        let cfg = self.ingest_config(config)?;
        let slot = match &mut self.dataset_entry_mut(proxy)?.state {
            DatasetState::Proxy(slot) => slot,
            DatasetState::Ready(_) => {
                return Err(BridgeError::BadArgument("handle is not a proxy".to_owned()))
            }
        };
        let mut accumulator = BatchAccumulator::new();
        accumulator.drain_proxy(feed, slot)?;
        let dataset = accumulator.finish(cfg.missing, cfg.n_threads)?;
        Ok(self.insert_dataset(dataset))
    }

    /// Derive a dataset from a subset of another's rows. Group structure
    /// does not survive slicing unless explicitly permitted.
    pub fn dataset_slice(
        &mut self,
        handle: DatasetHandle,
        rows: &[u32],
        allow_groups: bool,
    ) -> Result<DatasetHandle> {
        let parent = self.require_dataset(handle)?;
        let sliced = parent.slice(rows, allow_groups)?;
        Ok(self.insert_dataset(sliced))
    }

    /// Release a dataset handle. The id is never reissued.
    pub fn dataset_free(&mut self, handle: DatasetHandle) -> Result<()> {
        self.datasets
            .remove(handle.0)
            .map(drop)
            .ok_or(BridgeError::BadHandle("dataset"))
    }

    pub fn dataset_num_row(&self, handle: DatasetHandle) -> Result<u64> {
        Ok(self.require_dataset(handle)?.num_row() as u64)
    }

    pub fn dataset_num_col(&self, handle: DatasetHandle) -> Result<u64> {
        Ok(self.require_dataset(handle)?.num_col() as u64)
    }

    /// Attach a float field (label, weight, base_margin).
    pub fn dataset_set_float_field(
        &mut self,
        handle: DatasetHandle,
        field: &str,
        values: &[f32],
    ) -> Result<()> {
        let field: FieldName = field.parse().map_err(BridgeError::Dataset)?;
        let entry = self.dataset_entry_mut(handle)?;
        match &mut entry.state {
            DatasetState::Ready(dataset) => {
                Arc::make_mut(dataset).set_float_field(field, values)?;
                Ok(())
            }
            DatasetState::Proxy(_) => Err(BridgeError::ProxyOnly),
        }
    }

    /// Attach the group partition from per-group sizes.
    pub fn dataset_set_uint_field(
        &mut self,
        handle: DatasetHandle,
        field: &str,
        values: &[u32],
    ) -> Result<()> {
        if field != "group" {
            let field: FieldName = field.parse().map_err(BridgeError::Dataset)?;
            return Err(BridgeError::Dataset(crate::data::DatasetError::FieldType {
                field: field.as_str(),
                kind: "unsigned",
            }));
        }
        let entry = self.dataset_entry_mut(handle)?;
        match &mut entry.state {
            DatasetState::Ready(dataset) => {
                Arc::make_mut(dataset).set_group(values)?;
                Ok(())
            }
            DatasetState::Proxy(_) => Err(BridgeError::ProxyOnly),
        }
    }

    /// Attach a string field (feature names or types).
    pub fn dataset_set_str_field(
        &mut self,
        handle: DatasetHandle,
        field: &str,
        values: &[&str],
    ) -> Result<()> {
        let field: FieldName = field.parse().map_err(BridgeError::Dataset)?;
        let entry = self.dataset_entry_mut(handle)?;
        match &mut entry.state {
            DatasetState::Ready(dataset) => {
                Arc::make_mut(dataset).set_str_field(field, values)?;
                Ok(())
            }
            DatasetState::Proxy(_) => Err(BridgeError::ProxyOnly),
        }
    }

    /// Read a float field; the result is staged on the handle and valid
    /// until the next query on it. Absent fields read as empty.
    pub fn dataset_float_field(
        &mut self,
        handle: DatasetHandle,
        field: &str,
    ) -> Result<&[f32]> {
        let field: FieldName = field.parse().map_err(BridgeError::Dataset)?;
        let entry = self.dataset_entry_mut(handle)?;
        let dataset = match &entry.state {
            DatasetState::Ready(dataset) => dataset,
            DatasetState::Proxy(_) => return Err(BridgeError::ProxyOnly),
        };
        let values = dataset.float_field(field)?.unwrap_or(&[]).to_vec();
        Ok(entry.buffers.stage_floats(values))
    }

    /// Read the group partition as cumulative offsets (staged).
    pub fn dataset_uint_field(
        &mut self,
        handle: DatasetHandle,
        field: &str,
    ) -> Result<&[u32]> {
        if field != "group_ptr" && field != "group" {
            let field: FieldName = field.parse().map_err(BridgeError::Dataset)?;
            return Err(BridgeError::Dataset(crate::data::DatasetError::FieldType {
                field: field.as_str(),
                kind: "unsigned",
            }));
        }
        let entry = self.dataset_entry_mut(handle)?;
        let dataset = match &entry.state {
            DatasetState::Ready(dataset) => dataset,
            DatasetState::Proxy(_) => return Err(BridgeError::ProxyOnly),
        };
        let values = dataset.group_ptr().to_vec();
        Ok(entry.buffers.stage_uints(values))
    }

    /// Read a string field (staged). Absent fields read as empty.
    pub fn dataset_str_field(
        &mut self,
        handle: DatasetHandle,
        field: &str,
    ) -> Result<&[String]> {
        let field: FieldName = field.parse().map_err(BridgeError::Dataset)?;
        let entry = self.dataset_entry_mut(handle)?;
        let dataset = match &entry.state {
            DatasetState::Ready(dataset) => dataset,
            DatasetState::Proxy(_) => return Err(BridgeError::ProxyOnly),
        };
        let values = dataset.str_field(field)?.to_vec();
        Ok(entry.buffers.stage_strings(values))
    }

    // ---- model handles ---------------------------------------------------

    fn insert_model(&mut self, learner: Learner) -> ModelHandle {
        ModelHandle(self.models.insert(ModelEntry::new(learner)))
    }

    fn model_entry_mut(&mut self, handle: ModelHandle) -> Result<&mut ModelEntry> {
        self.models
            .get_mut(handle.0)
            .ok_or(BridgeError::BadHandle("model"))
    }

    /// Create a model bound to zero or more datasets (the widest decides
    /// the feature count).
    pub fn model_create(&mut self, datasets: &[DatasetHandle]) -> Result<ModelHandle> {
        let mut resolved = Vec::with_capacity(datasets.len());
        for &handle in datasets {
            resolved.push(self.require_dataset(handle)?);
        }
        let learner = Learner::from_datasets(resolved.iter().map(Arc::as_ref));
        Ok(self.insert_model(learner))
    }

    /// Release a model handle.
    pub fn model_free(&mut self, handle: ModelHandle) -> Result<()> {
        self.models
            .remove(handle.0)
            .map(drop)
            .ok_or(BridgeError::BadHandle("model"))
    }

    /// Apply one string-encoded parameter. Unknown names are fatal only
    /// when global parameter validation is on.
    pub fn model_set_param(
        &mut self,
        handle: ModelHandle,
        name: &str,
        value: &str,
    ) -> Result<()> {
        let strict = self.global.validate_parameters();
        let entry = self.model_entry_mut(handle)?;
        entry.learner.set_param(name, value, strict)?;
        Ok(())
    }

    /// Run one boosting round with engine-computed gradients.
    pub fn model_update_one_iter(
        &mut self,
        handle: ModelHandle,
        round: u32,
        data: DatasetHandle,
    ) -> Result<()> {
        let n_threads = self.global.nthread();
        let dataset = self.require_dataset(data)?;
        let entry = self.model_entry_mut(handle)?;
        let learner = &mut entry.learner;
        run_with_threads(n_threads, |par| learner.update_one_iter(round, &dataset, par))?;
        Ok(())
    }

    /// Run one boosting round with caller-supplied gradients (row-major
    /// `[rows, groups]`).
    pub fn model_boost_one_iter(
        &mut self,
        handle: ModelHandle,
        data: DatasetHandle,
        grad: &[f32],
        hess: &[f32],
    ) -> Result<()> {
        let dataset = self.require_dataset(data)?;
        let entry = self.model_entry_mut(handle)?;
        entry.learner.boost_one_iter(&dataset, grad, hess)?;
        Ok(())
    }

    /// Predict under a JSON options document. Returns the output shape and
    /// the flat result, both staged on the model handle.
    pub fn model_predict(
        &mut self,
        handle: ModelHandle,
        data: DatasetHandle,
        config: &str,
    ) -> Result<(&[u64], &[f32])> {
        let document: Value = serde_json::from_str(config)
            .map_err(|err| ConfigError::Malformed(err.to_string()))?;
        let dataset = self.require_dataset(data)?;
        self.predict_with(handle, &dataset, &document)
    }

    /// Predict straight from a dense row-major buffer, skipping dataset
    /// registration. The config document carries the predict options plus
    /// an optional `missing` sentinel.
    pub fn model_predict_dense(
        &mut self,
        handle: ModelHandle,
        values: &[f32],
        num_row: usize,
        num_col: usize,
        config: &str,
    ) -> Result<(&[u64], &[f32])> {
        let document: Value = serde_json::from_str(config)
            .map_err(|err| ConfigError::Malformed(err.to_string()))?;
        let missing = self.missing_value(&document)?;
        let adapter = DenseAdapter::new(values, num_row, num_col)?;
        let dataset = adapter::build_dataset(&adapter, missing, self.global.nthread());
        self.predict_with(handle, &dataset, &document)
    }

    /// Predict straight from a CSR triple, skipping dataset registration.
    pub fn model_predict_csr(
        &mut self,
        handle: ModelHandle,
        indptr: &[usize],
        indices: &[u32],
        values: &[f32],
        num_col: usize,
        config: &str,
    ) -> Result<(&[u64], &[f32])> {
        let document: Value = serde_json::from_str(config)
            .map_err(|err| ConfigError::Malformed(err.to_string()))?;
        let missing = self.missing_value(&document)?;
        let adapter = CsrAdapter::new(indptr, indices, values, num_col)?;
        let dataset = adapter::build_dataset(&adapter, missing, self.global.nthread());
        self.predict_with(handle, &dataset, &document)
    }

    /// Shared predict path: run the learner, then stage shape and values
    /// on the model handle.
    fn predict_with(
        &mut self,
        handle: ModelHandle,
        dataset: &Dataset,
        document: &Value,
    ) -> Result<(&[u64], &[f32])> {
        let options = PredictOptions::from_document(document)?;
        let n_threads = self.global.nthread();
        let entry = self.model_entry_mut(handle)?;
        let learner = &mut entry.learner;
        let (out, rounds) =
            run_with_threads(n_threads, |par| learner.predict(dataset, &options, par))?;

        let rows = dataset.num_row();
        let groups = entry.learner.groups();
        let chunk = if rows == 0 { groups } else { out.len() / rows };
        entry.buffers.ret_floats = out;
        calc_predict_shape(
            options.strict_shape,
            options.kind,
            rows,
            dataset.num_col(),
            chunk,
            groups,
            rounds,
            &mut entry.buffers.ret_shape,
        );
        Ok((&entry.buffers.ret_shape, &entry.buffers.ret_floats))
    }

    /// Derive a new model from a sub-range of boosted rounds, the same way
    /// row slicing derives a dataset. `end == 0` means through the last
    /// round; `step` must be at least 1.
    pub fn model_slice(
        &mut self,
        handle: ModelHandle,
        begin: u32,
        end: u32,
        step: u32,
    ) -> Result<ModelHandle> {
        let sliced = self.model_entry_mut(handle)?.learner.slice(begin, end, step)?;
        Ok(self.insert_model(sliced))
    }

    // ---- model persistence ----------------------------------------------

    /// Save model-granularity state; a `.json` extension selects the
    /// document format.
    pub fn model_save(&mut self, handle: ModelHandle, path: &Path) -> Result<()> {
        let entry = self.model_entry_mut(handle)?;
        entry.learner.configure()?;
        persist::save_to_file(&entry.learner, path, PayloadKind::Model)?;
        Ok(())
    }

    /// Load model-granularity state, sniffing the encoding.
    pub fn model_load(&mut self, path: &Path) -> Result<ModelHandle> {
        let learner = persist::load_from_file(path, PayloadKind::Model)?;
        Ok(self.insert_model(learner))
    }

    /// Export model-granularity state to a staged buffer. The config
    /// selects the encoding: `{"format": "json"}` (default) or
    /// `{"format": "binary"}`.
    pub fn model_save_to_buffer(
        &mut self,
        handle: ModelHandle,
        config: &str,
    ) -> Result<&[u8]> {
        let document: Value = serde_json::from_str(config)
            .map_err(|err| ConfigError::Malformed(err.to_string()))?;
        let format = match document.get("format").and_then(Value::as_str) {
            None | Some("json") => Format::Document,
            Some("binary") => Format::Binary,
            Some(other) => {
                return Err(BridgeError::BadArgument(format!("unknown format {other:?}")))
            }
        };
        let entry = self.model_entry_mut(handle)?;
        entry.learner.configure()?;
        entry.buffers.ret_bytes =
            persist::save_to_buffer(&entry.learner, PayloadKind::Model, format)?;
        Ok(&entry.buffers.ret_bytes)
    }

    /// Import model-granularity state from a buffer, sniffing the encoding.
    pub fn model_load_from_buffer(&mut self, bytes: &[u8]) -> Result<ModelHandle> {
        let learner = persist::load_from_buffer(bytes, PayloadKind::Model)?;
        Ok(self.insert_model(learner))
    }

    /// Capture checkpoint-granularity state (model plus trainer runtime)
    /// into a staged binary buffer.
    pub fn model_serialize(&mut self, handle: ModelHandle) -> Result<&[u8]> {
        let entry = self.model_entry_mut(handle)?;
        entry.learner.configure()?;
        entry.buffers.ret_bytes =
            persist::save_to_buffer(&entry.learner, PayloadKind::Checkpoint, Format::Binary)?;
        Ok(&entry.buffers.ret_bytes)
    }

    /// Restore checkpoint-granularity state captured by
    /// [`model_serialize`](Self::model_serialize).
    pub fn model_unserialize(&mut self, bytes: &[u8]) -> Result<ModelHandle> {
        let learner = persist::load_from_buffer(bytes, PayloadKind::Checkpoint)?;
        Ok(self.insert_model(learner))
    }

    // ---- model attributes and feature info -------------------------------

    /// Read an attribute (staged). `None` means the key is absent.
    pub fn model_attr(&mut self, handle: ModelHandle, key: &str) -> Result<Option<&str>> {
        let entry = self.model_entry_mut(handle)?;
        match entry.learner.attr(key) {
            Some(value) => {
                let value = value.to_owned();
                Ok(Some(entry.buffers.stage_str(value)))
            }
            None => Ok(None),
        }
    }

    /// Set an attribute; `None` deletes it.
    pub fn model_set_attr(
        &mut self,
        handle: ModelHandle,
        key: &str,
        value: Option<&str>,
    ) -> Result<()> {
        self.model_entry_mut(handle)?.learner.set_attr(key, value);
        Ok(())
    }

    /// List attribute keys (staged).
    pub fn model_attr_names(&mut self, handle: ModelHandle) -> Result<&[String]> {
        let entry = self.model_entry_mut(handle)?;
        let names: Vec<String> = entry.learner.attr_names().map(str::to_owned).collect();
        Ok(entry.buffers.stage_strings(names))
    }

    /// Attach feature names or types to the model.
    pub fn model_set_feature_info(
        &mut self,
        handle: ModelHandle,
        field: &str,
        values: &[&str],
    ) -> Result<()> {
        let field: FieldName = field.parse().map_err(BridgeError::Dataset)?;
        self.model_entry_mut(handle)?
            .learner
            .set_feature_info(field, values)?;
        Ok(())
    }

    /// Read feature names or types (staged). Absent info reads as empty.
    pub fn model_feature_info(
        &mut self,
        handle: ModelHandle,
        field: &str,
    ) -> Result<&[String]> {
        let field: FieldName = field.parse().map_err(BridgeError::Dataset)?;
        let entry = self.model_entry_mut(handle)?;
        let values = entry.learner.feature_info(field)?.to_vec();
        Ok(entry.buffers.stage_strings(values))
    }

    pub fn model_num_feature(&mut self, handle: ModelHandle) -> Result<u64> {
        Ok(u64::from(self.model_entry_mut(handle)?.learner.num_feature()?))
    }

    pub fn model_boosted_rounds(&mut self, handle: ModelHandle) -> Result<u64> {
        Ok(self.model_entry_mut(handle)?.learner.boosted_rounds()? as u64)
    }

    /// Export the learner configuration document (staged).
    pub fn model_save_config(&mut self, handle: ModelHandle) -> Result<&str> {
        let entry = self.model_entry_mut(handle)?;
        let document = entry.learner.save_config()?;
        let text = serde_json::to_string(&document)
            .map_err(|err| ConfigError::Malformed(err.to_string()))?;
        Ok(entry.buffers.stage_str(text))
    }

    /// Restore the learner configuration from a document.
    pub fn model_load_config(&mut self, handle: ModelHandle, json: &str) -> Result<()> {
        let document: Value = serde_json::from_str(json)
            .map_err(|err| ConfigError::Malformed(err.to_string()))?;
        self.model_entry_mut(handle)?.learner.load_config(&document)?;
        Ok(())
    }
}
