// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Picks one image out of a dataset split by index and asks a
// reloaded classifier for its top-k classes.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::data::loader::IdxLoader;
use crate::domain::{
    image::{DatasetKind, Split},
    traits::ImageSource,
};
use crate::ml::inferencer::Inferencer;

/// A ranked class with its human-readable name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedScore {
    pub class:       usize,
    pub name:        String,
    pub probability: f32,
}

#[derive(Debug, Clone)]
pub struct Prediction {
    pub index:      usize,
    pub true_label: usize,
    pub true_name:  String,
    pub top:        Vec<NamedScore>,
}

impl Prediction {
    pub fn is_correct(&self) -> bool {
        self.top.first().is_some_and(|best| best.class == self.true_label)
    }
}

pub struct PredictUseCase {
    inferencer: Inferencer,
    data_dir:   PathBuf,
    dataset:    DatasetKind,
}

impl PredictUseCase {
    pub fn new(checkpoint: impl Into<PathBuf>, data_dir: impl Into<PathBuf>, dataset: DatasetKind) -> Result<Self> {
        let checkpoint: PathBuf = checkpoint.into();
        let inferencer = Inferencer::from_checkpoint(&checkpoint)?;
        Ok(Self { inferencer, data_dir: data_dir.into(), dataset })
    }

    pub fn predict(&self, split: Split, index: usize, top_k: usize) -> Result<Prediction> {
        let images = IdxLoader::new(&self.data_dir).load_split(split)?;
        let image = images
            .get(index)
            .with_context(|| format!("Index {index} out of range ({} images in {} split)", images.len(), split.name()))?;

        let top = self
            .inferencer
            .predict(image, top_k)?
            .into_iter()
            .map(|score| NamedScore {
                class:       score.class,
                name:        self.dataset.class_name(score.class),
                probability: score.probability,
            })
            .collect();

        let true_label = image.label as usize;
        Ok(Prediction {
            index,
            true_label,
            true_name: self.dataset.class_name(true_label),
            top,
        })
    }
}
