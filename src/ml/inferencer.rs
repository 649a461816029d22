// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Loads a checkpoint (architecture rebuilt from the record) and
// classifies single images. Runs on the inner backend, so no
// autodiff graph is recorded; dropout is inactive outside of
// autodiff training.

use anyhow::{Context, Result};
use burn::prelude::*;
use std::path::Path;

use crate::data::{batcher::ImageBatcher, preprocessor::Normalizer};
use crate::domain::{architecture::Architecture, image::LabeledImage};
use crate::infra::checkpoint::load_checkpoint;
use crate::ml::backend::{default_device, Device, InnerBackend};
use crate::ml::model::Classifier;

/// One ranked class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScore {
    pub class:       usize,
    pub probability: f32,
}

pub struct Inferencer {
    model:   Classifier<InnerBackend>,
    batcher: ImageBatcher<InnerBackend>,
}

impl Inferencer {
    pub fn new(model: Classifier<InnerBackend>, device: Device) -> Self {
        Self {
            model,
            batcher: ImageBatcher::new(device, Normalizer::default()),
        }
    }

    pub fn from_checkpoint(path: impl AsRef<Path>) -> Result<Self> {
        let path   = path.as_ref();
        let device = default_device();
        let model  = load_checkpoint::<InnerBackend>(path, &device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;
        Ok(Self::new(model, device))
    }

    pub fn architecture(&self) -> Architecture {
        self.model.architecture()
    }

    /// Class probabilities for one image.
    pub fn probabilities(&self, image: &LabeledImage) -> Result<Vec<f32>> {
        let expected = self.architecture().input_size;
        anyhow::ensure!(
            image.input_size() == expected,
            "Image has {} pixels but the model expects {}",
            image.input_size(),
            expected
        );

        let input = self.batcher.images(std::slice::from_ref(image));
        self.model
            .probabilities(input)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read model output: {e:?}"))
    }

    /// The `k` most likely classes, best first.
    pub fn predict(&self, image: &LabeledImage, k: usize) -> Result<Vec<ClassScore>> {
        let probs = self.probabilities(image)?;
        let top = top_k(&probs, k);
        if let Some(best) = top.first() {
            tracing::debug!("Predicted class {} (p={:.4})", best.class, best.probability);
        }
        Ok(top)
    }
}

/// Indices of the `k` largest probabilities, descending. Ties keep the
/// lower class index first.
pub fn top_k(probs: &[f32], k: usize) -> Vec<ClassScore> {
    let mut scores: Vec<ClassScore> = probs
        .iter()
        .enumerate()
        .map(|(class, &probability)| ClassScore { class, probability })
        .collect();
    scores.sort_by(|a, b| b.probability.total_cmp(&a.probability).then(a.class.cmp(&b.class)));
    scores.truncate(k);
    scores
}
