// ============================================================
// Layer 2 — Evaluate Use Case
// ============================================================
// Rebuilds a classifier from its checkpoint and measures loss
// and accuracy on a dataset split (the test split by default).

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::data::{
    dataset::ImageDataset,
    loader::{check_labels, IdxLoader},
    preprocessor::Normalizer,
};
use crate::domain::{image::Split, traits::ImageSource};
use crate::infra::checkpoint::load_checkpoint;
use crate::ml::{
    backend::{default_device, InnerBackend},
    evaluator::{batch_loader, evaluate, EvalReport},
};

pub struct EvaluateUseCase {
    checkpoint: PathBuf,
    data_dir:   PathBuf,
    split:      Split,
    batch_size: usize,
}

impl EvaluateUseCase {
    pub fn new(
        checkpoint: impl Into<PathBuf>,
        data_dir:   impl Into<PathBuf>,
        split:      Split,
        batch_size: usize,
    ) -> Self {
        Self {
            checkpoint: checkpoint.into(),
            data_dir:   data_dir.into(),
            split,
            batch_size,
        }
    }

    pub fn execute(&self) -> Result<EvalReport> {
        let device = default_device();
        let model = load_checkpoint::<InnerBackend>(&self.checkpoint, &device)
            .with_context(|| format!("Cannot load checkpoint '{}'", self.checkpoint.display()))?;

        let images = IdxLoader::new(&self.data_dir).load_split(self.split)?;
        let arch = model.architecture();
        check_labels(&images, arch.output_size)
            .with_context(|| format!("Labels don't fit checkpoint '{}'", self.checkpoint.display()))?;
        if let Some(first) = images.first() {
            let expected = arch.input_size;
            anyhow::ensure!(
                first.input_size() == expected,
                "Images have {} pixels but the checkpoint expects {}",
                first.input_size(),
                expected
            );
        }

        let loader = batch_loader::<InnerBackend>(
            ImageDataset::new(images),
            self.batch_size,
            Normalizer::default(),
            device,
            None,
        );
        let report = evaluate(&model, loader.as_ref());

        tracing::info!(
            "Evaluated {} {} images: loss={:.4}, accuracy={:.4}",
            report.samples,
            self.split.name(),
            report.loss,
            report.accuracy,
        );
        Ok(report)
    }
}
