// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Four subcommands: `train`, `evaluate`, `predict`, `inspect`.
//
// clap's derive macros generate help text, error messages for
// missing args, and type conversion (string → usize, f64, and
// anything implementing FromStr such as DatasetKind).
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::train_use_case::{OptimizerKind, TrainConfig};
use crate::domain::image::{DatasetKind, Split};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a classifier on IDX images and write a checkpoint
    Train(TrainArgs),

    /// Rebuild a model from a checkpoint and measure loss/accuracy
    Evaluate(EvaluateArgs),

    /// Classify one image from a dataset split
    Predict(PredictArgs),

    /// Print the architecture and parameter shapes stored in a checkpoint
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing the decompressed IDX files
    #[arg(long, default_value = "data/mnist")]
    pub data_dir: String,

    /// Dataset family: mnist or fashion-mnist
    #[arg(long, default_value_t = DatasetKind::Mnist)]
    pub dataset: DatasetKind,

    /// Output file; .ckpt/.bin for binary, .json for JSON
    #[arg(long, default_value = "checkpoints/classifier.ckpt")]
    pub checkpoint: String,

    /// Hidden layer widths, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = [512, 256, 128])]
    pub hidden_layers: Vec<usize>,

    #[arg(long, default_value_t = 2)]
    pub epochs: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// adam or sgd
    #[arg(long, default_value_t = OptimizerKind::Adam)]
    pub optimizer: OptimizerKind,

    /// Probability of zeroing a hidden activation during training
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    /// Fraction of the training split held out for validation
    #[arg(long, default_value_t = 0.1)]
    pub validation_fraction: f64,

    /// Run validation every N optimiser steps
    #[arg(long, default_value_t = 40)]
    pub print_every: usize,

    /// Seed for the train/validation split and batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Layer 1 → Layer 2 boundary: the application never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:            a.data_dir,
            dataset:             a.dataset,
            checkpoint_path:     a.checkpoint,
            hidden_layers:       a.hidden_layers,
            epochs:              a.epochs,
            batch_size:          a.batch_size,
            lr:                  a.lr,
            optimizer:           a.optimizer,
            dropout:             a.dropout,
            validation_fraction: a.validation_fraction,
            print_every:         a.print_every,
            seed:                a.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[arg(long)]
    pub checkpoint: PathBuf,

    #[arg(long, default_value = "data/mnist")]
    pub data_dir: PathBuf,

    /// train or test
    #[arg(long, default_value = "test")]
    pub split: Split,

    #[arg(long, default_value_t = 256)]
    pub batch_size: usize,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    #[arg(long)]
    pub checkpoint: PathBuf,

    #[arg(long, default_value = "data/mnist")]
    pub data_dir: PathBuf,

    /// Used only to name classes
    #[arg(long, default_value_t = DatasetKind::Mnist)]
    pub dataset: DatasetKind,

    #[arg(long, default_value = "test")]
    pub split: Split,

    /// Position of the image within the split
    #[arg(long, default_value_t = 0)]
    pub index: usize,

    /// How many classes to list
    #[arg(long, default_value_t = 3)]
    pub top_k: usize,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Checkpoint file to read
    pub checkpoint: PathBuf,
}
