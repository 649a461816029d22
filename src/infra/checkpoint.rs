// ============================================================
// Layer 6 — Checkpoint Writer / Reader
// ============================================================
// A checkpoint is one file holding both halves of a model:
//
//   input_size      784
//   output_size     10
//   hidden_layers   [512, 256, 128]
//   state_dict      { "hidden_layers.0.weight": {shape, values}, ... }
//
// Loading never takes the architecture from the caller: the
// reader rebuilds a fresh Classifier from the recorded widths
// and only then assigns the parameters. Loading into a model of
// another shape is exactly the mistake this file layout exists
// to prevent.
//
// Two encodings, picked by file extension:
//   .json          pretty JSON, for inspection
//   .ckpt / .bin   "FCK1" magic + u32 LE version + u32 LE flags,
//                  followed by the bincode-encoded record

use std::{
    fs,
    path::{Path, PathBuf},
};

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{
    architecture::Architecture,
    error::CheckpointError,
    state_dict::StateDict,
};
use crate::ml::model::{Classifier, ClassifierConfig};

type Result<T> = std::result::Result<T, CheckpointError>;

/// Magic bytes at the start of a binary checkpoint.
pub const BINARY_MAGIC: [u8; 4] = *b"FCK1";

/// Current binary layout version.
pub const BINARY_VERSION: u32 = 1;

const BINARY_HEADER_LEN: usize = 12;

/// On-disk encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckpointFormat {
    /// Magic-prefixed bincode. Compact, exact.
    #[default]
    Binary,

    /// Pretty-printed JSON. Larger, but readable and diffable.
    Json,
}

impl CheckpointFormat {
    /// - `.ckpt`, `.bin` -> Binary
    /// - `.json` -> Json
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "ckpt" | "bin" => Some(Self::Binary),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| CheckpointError::UnsupportedFormat(path.display().to_string()))
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for CheckpointFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Architecture metadata plus every learned parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub input_size:    usize,
    pub output_size:   usize,
    pub hidden_layers: Vec<usize>,
    pub state_dict:    StateDict,
}

impl Checkpoint {
    /// Bundle an architecture with a state dict, checking they agree.
    pub fn new(arch: Architecture, state_dict: StateDict) -> Result<Self> {
        let checkpoint = Self {
            input_size:    arch.input_size,
            output_size:   arch.output_size,
            hidden_layers: arch.hidden_layers,
            state_dict,
        };
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    /// Snapshot a live model. Widths come from the model's own layers.
    pub fn from_model<B: Backend>(model: &Classifier<B>) -> Result<Self> {
        let arch = model.architecture();
        arch.validate()?;
        Self::new(arch, model.state_dict()?)
    }

    pub fn architecture(&self) -> Architecture {
        Architecture::new(self.input_size, self.output_size, self.hidden_layers.clone())
    }

    /// Architecture is sane and the state dict matches it key-for-key.
    pub fn validate(&self) -> Result<()> {
        let arch = self.architecture();
        arch.validate()?;
        self.state_dict.check_against(&arch.expected_shapes())
    }

    /// Build a fresh model from the recorded architecture and load the
    /// recorded parameters into it.
    pub fn build_model<B: Backend>(&self, device: &B::Device) -> Result<Classifier<B>> {
        self.validate()?;
        let arch = self.architecture();
        let model = ClassifierConfig::from(&arch).init::<B>(device);
        model.with_state_dict(&self.state_dict)
    }

    // ── Encoding ──────────────────────────────────────────────────────────────

    pub fn to_bytes(&self, format: CheckpointFormat) -> Result<Vec<u8>> {
        match format {
            CheckpointFormat::Json => serde_json::to_vec_pretty(self)
                .map_err(|e| CheckpointError::Serialization(e.to_string())),
            CheckpointFormat::Binary => {
                let mut out = Vec::with_capacity(BINARY_HEADER_LEN);
                out.extend_from_slice(&BINARY_MAGIC);
                out.extend_from_slice(&BINARY_VERSION.to_le_bytes());
                out.extend_from_slice(&0u32.to_le_bytes());
                bincode::serialize_into(&mut out, self)
                    .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
                Ok(out)
            }
        }
    }

    /// Decode and validate a record. Missing fields, wrong types and a bad
    /// binary header are all `MalformedCheckpoint`.
    pub fn from_bytes(bytes: &[u8], format: CheckpointFormat) -> Result<Self> {
        let checkpoint: Self = match format {
            CheckpointFormat::Json => serde_json::from_slice(bytes)
                .map_err(|e| CheckpointError::malformed(e.to_string()))?,
            CheckpointFormat::Binary => {
                let payload = check_binary_header(bytes)?;
                bincode::deserialize(payload)
                    .map_err(|e| CheckpointError::malformed(e.to_string()))?
            }
        };
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    // ── Files ─────────────────────────────────────────────────────────────────

    /// Write to `path`, replacing anything already there. The encoding
    /// follows the extension.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = CheckpointFormat::from_path(path)?;
        self.validate()?;
        let bytes = self.to_bytes(format)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CheckpointError::io(parent, e))?;
        }
        fs::write(path, bytes).map_err(|e| CheckpointError::io(path, e))?;

        tracing::debug!("Wrote {} checkpoint '{}' ({})", format, path.display(), self.architecture());
        Ok(())
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = CheckpointFormat::from_path(path)?;
        let bytes = fs::read(path).map_err(|e| CheckpointError::io(path, e))?;
        Self::from_bytes(&bytes, format)
    }
}

fn check_binary_header(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() < BINARY_HEADER_LEN {
        return Err(CheckpointError::malformed(format!(
            "binary checkpoint is {} bytes, shorter than its {}-byte header",
            bytes.len(),
            BINARY_HEADER_LEN
        )));
    }
    if bytes[0..4] != BINARY_MAGIC {
        return Err(CheckpointError::malformed(format!(
            "bad magic {:?}, expected {:?}",
            &bytes[0..4],
            BINARY_MAGIC
        )));
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != BINARY_VERSION {
        return Err(CheckpointError::malformed(format!(
            "unsupported binary checkpoint version {version}"
        )));
    }
    Ok(&bytes[BINARY_HEADER_LEN..])
}

/// Save a trained model to `path`. Returns the path written.
pub fn save_checkpoint<B: Backend>(model: &Classifier<B>, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let checkpoint = Checkpoint::from_model(model)?;
    checkpoint.write(path)?;
    tracing::info!(
        "Saved checkpoint '{}' ({}, {} parameters)",
        path.display(),
        checkpoint.architecture(),
        checkpoint.architecture().parameter_count(),
    );
    Ok(path.to_path_buf())
}

/// Rebuild a model entirely from the checkpoint at `path`.
pub fn load_checkpoint<B: Backend>(path: impl AsRef<Path>, device: &B::Device) -> Result<Classifier<B>> {
    let path = path.as_ref();
    let checkpoint = Checkpoint::read(path)?;
    let model = checkpoint.build_model::<B>(device)?;
    tracing::info!("Loaded checkpoint '{}' ({})", path.display(), checkpoint.architecture());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state_dict::ParamTensor;
    use burn::{backend::NdArray, tensor::TensorData};

    type TestBackend = NdArray;

    fn model(input: usize, output: usize, hidden: &[usize]) -> Classifier<TestBackend> {
        ClassifierConfig::new(input, output, hidden.to_vec()).init(&Default::default())
    }

    fn sample_outputs(model: &Classifier<TestBackend>, input_size: usize) -> Vec<f32> {
        let values: Vec<f32> = (0..2 * input_size).map(|v| (v % 7) as f32 / 7.0 - 0.5).collect();
        let input = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(values, [2, input_size]),
            &Default::default(),
        );
        model.forward(input).into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(CheckpointFormat::from_extension("ckpt"), Some(CheckpointFormat::Binary));
        assert_eq!(CheckpointFormat::from_extension("BIN"), Some(CheckpointFormat::Binary));
        assert_eq!(CheckpointFormat::from_extension("json"), Some(CheckpointFormat::Json));
        assert_eq!(CheckpointFormat::from_extension("pth"), None);
    }

    #[test]
    fn format_from_path() {
        assert_eq!(CheckpointFormat::from_path(Path::new("a/model.json")).unwrap(), CheckpointFormat::Json);
        assert!(matches!(
            CheckpointFormat::from_path(Path::new("model")),
            Err(CheckpointError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn save_then_load_reproduces_record_bit_for_bit() {
        let tmp = tempfile::tempdir().unwrap();
        let original = model(784, 10, &[512, 256, 128]);
        let saved = Checkpoint::from_model(&original).unwrap();

        for name in ["model.ckpt", "model.json"] {
            let path = tmp.path().join(name);
            save_checkpoint(&original, &path).unwrap();

            let restored = load_checkpoint::<TestBackend>(&path, &Default::default()).unwrap();
            let again = Checkpoint::from_model(&restored).unwrap();

            assert_eq!(again.architecture(), saved.architecture(), "{name}");
            assert!(again.state_dict.bitwise_eq(&saved.state_dict), "{name}");
        }
    }

    #[test]
    fn reconstructed_output_layer_has_recorded_shapes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("model.ckpt");
        save_checkpoint(&model(784, 10, &[512, 256, 128]), &path).unwrap();

        let restored = load_checkpoint::<TestBackend>(&path, &Default::default()).unwrap();
        let dict = restored.state_dict().unwrap();

        assert_eq!(dict.get("output.weight").unwrap().shape, vec![10, 128]);
        assert_eq!(dict.get("output.bias").unwrap().shape, vec![10]);
    }

    #[test]
    fn hidden_widths_come_from_the_record() {
        let tmp = tempfile::tempdir().unwrap();
        for hidden in [vec![512, 256, 128], vec![400, 200, 100], vec![64]] {
            let path = tmp.path().join("widths.json");
            save_checkpoint(&model(784, 10, &hidden), &path).unwrap();

            let restored = load_checkpoint::<TestBackend>(&path, &Default::default()).unwrap();
            assert_eq!(restored.architecture().hidden_layers, hidden);
            assert_eq!(restored.state_dict().unwrap().len(), 2 * (hidden.len() + 1));
        }
    }

    #[test]
    fn restored_model_predicts_identically() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("small.ckpt");
        let original = model(12, 4, &[8, 6]);
        save_checkpoint(&original, &path).unwrap();

        let restored = load_checkpoint::<TestBackend>(&path, &Default::default()).unwrap();
        assert_eq!(sample_outputs(&restored, 12), sample_outputs(&original, 12));
    }

    #[test]
    fn loading_into_differently_shaped_model_fails() {
        let saved = Checkpoint::from_model(&model(784, 10, &[400, 200, 100])).unwrap();
        let wrong = model(784, 10, &[512, 256, 128]);

        let err = wrong.with_state_dict(&saved.state_dict).unwrap_err();
        assert!(matches!(err, CheckpointError::ShapeMismatch { .. }));
    }

    #[test]
    fn writer_rejects_models_without_hidden_layers() {
        let flat = model(4, 2, &[]);
        let err = Checkpoint::from_model(&flat).unwrap_err();
        assert!(matches!(err, CheckpointError::InvalidArchitecture(_)));
    }

    #[test]
    fn new_rejects_state_dict_for_other_architecture() {
        let dict = model(4, 2, &[3]).state_dict().unwrap();
        let err = Checkpoint::new(Architecture::new(4, 2, [5]), dict).unwrap_err();
        assert!(matches!(err, CheckpointError::ShapeMismatch { ref key, .. } if key == "hidden_layers.0.weight"));
    }

    #[test]
    fn missing_field_is_malformed() {
        let json = r#"{"input_size": 4, "output_size": 2, "state_dict": {}}"#;
        let err = Checkpoint::from_bytes(json.as_bytes(), CheckpointFormat::Json).unwrap_err();
        assert!(matches!(err, CheckpointError::MalformedCheckpoint(ref m) if m.contains("hidden_layers")));
    }

    #[test]
    fn wrong_field_type_is_malformed() {
        let json = r#"{"input_size": "784", "output_size": 2, "hidden_layers": [3], "state_dict": {}}"#;
        let err = Checkpoint::from_bytes(json.as_bytes(), CheckpointFormat::Json).unwrap_err();
        assert!(matches!(err, CheckpointError::MalformedCheckpoint(_)));
    }

    #[test]
    fn recorded_shape_disagreeing_with_record_is_rejected() {
        let mut checkpoint = Checkpoint::from_model(&model(4, 2, &[3])).unwrap();
        checkpoint
            .state_dict
            .insert("output.bias", ParamTensor::new([3], vec![0.0; 3]));
        let bytes = serde_json::to_vec(&checkpoint).unwrap();

        let err = Checkpoint::from_bytes(&bytes, CheckpointFormat::Json).unwrap_err();
        match err {
            CheckpointError::ShapeMismatch { key, expected, actual } => {
                assert_eq!(key, "output.bias");
                assert_eq!(expected, vec![2]);
                assert_eq!(actual, vec![3]);
            }
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn binary_header_is_checked() {
        let checkpoint = Checkpoint::from_model(&model(4, 2, &[3])).unwrap();
        let mut bytes = checkpoint.to_bytes(CheckpointFormat::Binary).unwrap();
        assert_eq!(&bytes[0..4], b"FCK1");

        let ok = Checkpoint::from_bytes(&bytes, CheckpointFormat::Binary).unwrap();
        assert!(ok.state_dict.bitwise_eq(&checkpoint.state_dict));

        bytes[4] = 9;
        assert!(matches!(
            Checkpoint::from_bytes(&bytes, CheckpointFormat::Binary),
            Err(CheckpointError::MalformedCheckpoint(ref m)) if m.contains("version 9")
        ));

        bytes[0] = b'X';
        assert!(Checkpoint::from_bytes(&bytes, CheckpointFormat::Binary).is_err());
        assert!(Checkpoint::from_bytes(&bytes[..5], CheckpointFormat::Binary).is_err());
    }

    #[test]
    fn truncated_binary_payload_is_malformed() {
        let checkpoint = Checkpoint::from_model(&model(4, 2, &[3])).unwrap();
        let bytes = checkpoint.to_bytes(CheckpointFormat::Binary).unwrap();
        let err = Checkpoint::from_bytes(&bytes[..bytes.len() - 3], CheckpointFormat::Binary).unwrap_err();
        assert!(matches!(err, CheckpointError::MalformedCheckpoint(_)));
    }

    #[test]
    fn non_finite_parameters_round_trip_in_both_encodings() {
        let tmp = tempfile::tempdir().unwrap();
        let mut checkpoint = Checkpoint::from_model(&model(4, 2, &[3])).unwrap();
        checkpoint
            .state_dict
            .insert("output.bias", ParamTensor::new([2], vec![f32::NAN, f32::INFINITY]));

        for name in ["diverged.json", "diverged.ckpt"] {
            let path = tmp.path().join(name);
            checkpoint.write(&path).unwrap();
            let read = Checkpoint::read(&path).unwrap();
            assert!(read.state_dict.bitwise_eq(&checkpoint.state_dict), "{name}");
        }
    }

    #[test]
    fn write_overwrites_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/dir/model.json");

        save_checkpoint(&model(4, 2, &[3]), &path).unwrap();
        save_checkpoint(&model(4, 2, &[7, 5]), &path).unwrap();

        let read = Checkpoint::read(&path).unwrap();
        assert_eq!(read.hidden_layers, vec![7, 5]);
    }

    #[test]
    fn unsupported_extension_is_rejected_before_writing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("model.pth");
        let err = save_checkpoint(&model(4, 2, &[3]), &path).unwrap_err();
        assert!(matches!(err, CheckpointError::UnsupportedFormat(_)));
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_checkpoint::<TestBackend>(tmp.path().join("nope.ckpt"), &Default::default()).unwrap_err();
        assert!(matches!(err, CheckpointError::Io { .. }));
    }

    #[test]
    fn json_record_uses_documented_field_names() {
        let checkpoint = Checkpoint::from_model(&model(4, 2, &[3])).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&checkpoint.to_bytes(CheckpointFormat::Json).unwrap()).unwrap();

        assert_eq!(value["input_size"], 4);
        assert_eq!(value["output_size"], 2);
        assert_eq!(value["hidden_layers"], serde_json::json!([3]));
        let keys: Vec<&String> = value["state_dict"].as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 4);
    }
}
