// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the IDX train split    (Layer 4 - data)
//   Step 2: Split train/validation      (Layer 4 - data)
//   Step 3: Build datasets              (Layer 4 - data)
//   Step 4: Save config + open metrics  (Layer 6 - infra)
//   Step 5: Run training loop           (Layer 5 - ml)
//   Step 6: Write the checkpoint        (Layer 6 - infra)
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::data::{
    dataset::ImageDataset,
    loader::IdxLoader,
    splitter::split_train_val,
};
use crate::domain::{
    image::{DatasetKind, Split},
    traits::ImageSource,
};
use crate::infra::{
    checkpoint::{save_checkpoint, CheckpointFormat},
    metrics::MetricsLogger,
};
use crate::ml::{evaluator::EvalReport, trainer::run_training};

/// File the training config is written to, next to the checkpoint.
pub const CONFIG_FILE: &str = "train_config.json";

// ─── Optimiser choice ────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    #[default]
    Adam,
    Sgd,
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adam => write!(f, "adam"),
            Self::Sgd => write!(f, "sgd"),
        }
    }
}

impl FromStr for OptimizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adam" => Ok(Self::Adam),
            "sgd" => Ok(Self::Sgd),
            other => Err(format!("unknown optimizer '{other}' (expected adam or sgd)")),
        }
    }
}

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Written as JSON beside the
// checkpoint so a run can be traced later; loading never needs it,
// the checkpoint carries its own architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:            String,
    pub dataset:             DatasetKind,
    pub checkpoint_path:     String,
    pub hidden_layers:       Vec<usize>,
    pub epochs:              usize,
    pub batch_size:          usize,
    pub lr:                  f64,
    pub optimizer:           OptimizerKind,
    pub dropout:             f64,
    pub validation_fraction: f64,
    pub print_every:         usize,
    pub seed:                u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:            "data/mnist".to_string(),
            dataset:             DatasetKind::Mnist,
            checkpoint_path:     "checkpoints/classifier.ckpt".to_string(),
            hidden_layers:       vec![512, 256, 128],
            epochs:              2,
            batch_size:          64,
            lr:                  1e-3,
            optimizer:           OptimizerKind::Adam,
            dropout:             0.5,
            validation_fraction: 0.1,
            print_every:         40,
            seed:                42,
        }
    }
}

impl TrainConfig {
    /// Directory that receives the checkpoint, config and metrics.
    pub fn output_dir(&self) -> PathBuf {
        Path::new(&self.checkpoint_path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::info!("Config saved → '{}'", path.display());
        Ok(path)
    }
}

/// What a finished run reports back to the CLI.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub checkpoint:      PathBuf,
    pub steps:           usize,
    pub last_validation: Option<EvalReport>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = &self.config;

        // Fail on a bad extension now rather than after training
        CheckpointFormat::from_path(Path::new(&cfg.checkpoint_path))?;

        // ── Step 1: Load the training split ──────────────────────────────────
        tracing::info!("Loading {} training images from '{}'", cfg.dataset, cfg.data_dir);
        let images = IdxLoader::new(&cfg.data_dir).load_split(Split::Train)?;

        // ── Step 2: Train / validation split ──────────────────────────────────
        let (train_images, val_images) =
            split_train_val(images, 1.0 - cfg.validation_fraction, cfg.seed);
        tracing::info!(
            "Split: {} train, {} validation",
            train_images.len(),
            val_images.len()
        );

        // ── Step 3: Build Burn datasets ───────────────────────────────────────
        let train_dataset = ImageDataset::new(train_images);
        let val_dataset   = ImageDataset::new(val_images);

        // ── Step 4: Config + metrics beside the checkpoint ────────────────────
        let out_dir = cfg.output_dir();
        cfg.save(&out_dir)?;
        let metrics = MetricsLogger::new(&out_dir)?;
        tracing::info!("Logging metrics to '{}'", metrics.csv_path().display());

        // ── Step 5: Run training loop (Layer 5) ───────────────────────────────
        let outcome = run_training(cfg, train_dataset, val_dataset, &metrics)?;

        // ── Step 6: Persist ───────────────────────────────────────────────────
        let checkpoint = save_checkpoint(&outcome.model, &cfg.checkpoint_path)
            .with_context(|| format!("Cannot save checkpoint '{}'", cfg.checkpoint_path))?;

        Ok(TrainSummary {
            checkpoint,
            steps:           outcome.steps,
            last_validation: outcome.last_validation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::idx::{encode_images, encode_labels};
    use crate::infra::checkpoint::Checkpoint;

    fn write_train_split(dir: &Path, n: usize) {
        let images: Vec<Vec<u8>> = (0..n)
            .map(|i| if i % 2 == 0 { vec![255, 255, 0, 0] } else { vec![0, 0, 255, 255] })
            .collect();
        let labels: Vec<u8> = (0..n).map(|i| (i % 2) as u8).collect();
        fs::write(dir.join("train-images-idx3-ubyte"), encode_images(2, 2, &images)).unwrap();
        fs::write(dir.join("train-labels-idx1-ubyte"), encode_labels(&labels)).unwrap();
    }

    #[test]
    fn optimizer_kind_parses() {
        assert_eq!("Adam".parse::<OptimizerKind>().unwrap(), OptimizerKind::Adam);
        assert_eq!("sgd".parse::<OptimizerKind>().unwrap(), OptimizerKind::Sgd);
        assert!("rmsprop".parse::<OptimizerKind>().is_err());
        assert_eq!(OptimizerKind::Sgd.to_string(), "sgd");
    }

    #[test]
    fn config_json_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            hidden_layers: vec![400, 200, 100],
            optimizer:     OptimizerKind::Sgd,
            ..TrainConfig::default()
        };
        let path = cfg.save(tmp.path()).unwrap();
        let loaded: TrainConfig = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(loaded.hidden_layers, vec![400, 200, 100]);
        assert_eq!(loaded.optimizer, OptimizerKind::Sgd);
        assert_eq!(loaded.dataset, DatasetKind::Mnist);
    }

    #[test]
    fn output_dir_defaults_to_current() {
        let cfg = TrainConfig { checkpoint_path: "model.json".into(), ..TrainConfig::default() };
        assert_eq!(cfg.output_dir(), PathBuf::from("."));
    }

    #[test]
    fn execute_writes_checkpoint_config_and_metrics() {
        let tmp = tempfile::tempdir().unwrap();
        write_train_split(tmp.path(), 20);
        let out = tmp.path().join("out");
        let ckpt = out.join("model.json");

        let cfg = TrainConfig {
            data_dir:            tmp.path().display().to_string(),
            checkpoint_path:     ckpt.display().to_string(),
            hidden_layers:       vec![6, 3],
            epochs:              1,
            batch_size:          4,
            validation_fraction: 0.2,
            print_every:         2,
            ..TrainConfig::default()
        };
        let summary = TrainUseCase::new(cfg).execute().unwrap();

        assert_eq!(summary.checkpoint, ckpt);
        // 16 training samples / 4 per batch
        assert_eq!(summary.steps, 4);
        assert!(out.join(CONFIG_FILE).exists());
        assert!(out.join("metrics.csv").exists());

        let saved = Checkpoint::read(&ckpt).unwrap();
        assert_eq!(saved.input_size, 4);
        assert_eq!(saved.output_size, 10);
        assert_eq!(saved.hidden_layers, vec![6, 3]);
    }

    #[test]
    fn execute_rejects_unknown_extension_before_loading() {
        let cfg = TrainConfig {
            data_dir:        "does/not/exist".into(),
            checkpoint_path: "model.pt".into(),
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(err.to_string().contains("unsupported"), "{err}");
    }
}
