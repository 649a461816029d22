// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records a row of training metrics to CSV every time the
// training loop runs a validation pass.
//
// Columns:
//   - epoch:          epoch the step belongs to (starts at 1)
//   - step:           global optimiser step count
//   - train_loss:     mean NLL loss over the steps since the last row
//   - val_loss:       mean NLL loss on the validation set
//   - val_accuracy:   fraction of validation images classified correctly
//
// Example CSV output:
//   epoch,step,train_loss,val_loss,val_accuracy
//   1,40,1.734210,0.912345,0.701200
//   1,80,0.845100,0.603300,0.801900
//
// If val_loss starts rising while train_loss keeps falling the
// network is overfitting; dropout and fewer epochs both help.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

const HEADER: &str = "epoch,step,train_loss,val_loss,val_accuracy";

/// One row of metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepMetrics {
    pub epoch:        usize,
    pub step:         usize,
    pub train_loss:   f64,
    pub val_loss:     f64,
    pub val_accuracy: f64,
}

impl StepMetrics {
    pub fn new(
        epoch:        usize,
        step:         usize,
        train_loss:   f64,
        val_loss:     f64,
        val_accuracy: f64,
    ) -> Self {
        Self { epoch, step, train_loss, val_loss, val_accuracy }
    }
}

/// Appends metrics rows to `{dir}/metrics.csv`.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the directory and write the CSV header if the file is new.
    /// An existing file is appended to, so repeated runs share one log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &StepMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{},{:.6},{:.6},{:.6}",
            m.epoch,
            m.step,
            m.train_loss,
            m.val_loss,
            m.val_accuracy,
        )?;

        tracing::debug!(
            "Logged step {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.step,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
